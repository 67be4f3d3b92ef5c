pub mod addresses;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod products;
