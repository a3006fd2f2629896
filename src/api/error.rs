use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::order::OrderError;

// Client mistakes and inventory rejections are 4xx. An unreachable
// inventory service is 503 so callers know to retry later.
impl ResponseError for OrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            _ if self.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            OrderError::InvalidOrder(_)
            | OrderError::IllegalTransition { .. }
            | OrderError::ValidationFailed(_)
            | OrderError::InventoryReturnFailure(_) => StatusCode::BAD_REQUEST,
            OrderError::OrderNotFound { .. } | OrderError::AddressNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            OrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string()
        }))
    }
}
