use serde::Serialize;
use utoipa::ToSchema;

/// Paging block of the envelope. List endpoints fill all three fields;
/// single-resource endpoints send it empty.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// Envelope shared by every JSON response, success or failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorData {
    pub error: String,
}

impl ApiResponse<ErrorData> {
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            data: Some(ErrorData {
                error: message.clone(),
            }),
            message,
            meta: Some(Meta::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_repeats_message_in_data() {
        let body = serde_json::to_value(ApiResponse::failure("Not Found: Order 1")).unwrap();
        assert_eq!(body["message"], "Not Found: Order 1");
        assert_eq!(body["data"]["error"], "Not Found: Order 1");
        assert!(body["meta"]["page"].is_null());
    }

    #[test]
    fn list_meta_carries_paging() {
        let body = serde_json::to_value(ApiResponse::success(
            "Ok",
            vec![1, 2],
            Some(Meta::new(2, 20, 42)),
        ))
        .unwrap();
        assert_eq!(body["meta"]["page"], 2);
        assert_eq!(body["meta"]["total"], 42);
        assert_eq!(body["data"], serde_json::json!([1, 2]));
    }
}
