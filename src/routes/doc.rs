use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
        admin::{AuditLogList, InventoryAdjustRequest, InventoryAdjustment, LowStockQuery},
        cart::{AddToCartRequest, CartLine, CartView},
        catalog::FeaturedCatalog,
        orders::{CancelOrderRequest, CreateOrderRequest, OrderDetail, OrderList, UpdateOrderStatusRequest},
        products::{ProductDetail, ProductList},
    },
    entity::order_status::OrderStatus,
    models::{Address, AuditLog, InventoryLog, Order, OrderItem, Product, ProductImage, StatusChange},
    response::{ApiResponse, ErrorData, Meta},
    routes::{addresses, admin, cart, catalog, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        catalog::featured,
        cart::get_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        addresses::list_addresses,
        addresses::create_address,
        addresses::get_default_address,
        addresses::get_address,
        addresses::update_address,
        addresses::delete_address,
        orders::create_order,
        orders::list_my_orders,
        orders::get_order,
        orders::cancel_order,
        admin::list_all_orders,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_audit_logs,
        admin::refresh_catalog
    ),
    components(
        schemas(
            Product,
            ProductImage,
            Address,
            Order,
            OrderItem,
            OrderStatus,
            StatusChange,
            InventoryLog,
            AuditLog,
            ProductList,
            ProductDetail,
            FeaturedCatalog,
            AddToCartRequest,
            CartLine,
            CartView,
            CreateAddressRequest,
            UpdateAddressRequest,
            AddressList,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            CancelOrderRequest,
            OrderDetail,
            OrderList,
            LowStockQuery,
            InventoryAdjustRequest,
            InventoryAdjustment,
            AuditLogList,
            params::Pagination,
            params::OrderListQuery,
            params::OrderSortBy,
            params::SortOrder,
            Meta,
            ErrorData,
            ApiResponse<ProductDetail>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<InventoryAdjustment>,
            ApiResponse<AuditLogList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Product endpoints"),
        (name = "Catalog", description = "Cached catalog for advisory features"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Addresses", description = "Saved shipping addresses"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
