//! Order domain errors

use crate::orders::storage::StorageError;
use shared::order::OrderStatus;

/// Errors produced by order actions and the manager.
///
/// The taxonomy mirrors what callers can act on: validation and conflicts
/// are user-correctable, `InvalidTransition` names both ends of the rejected
/// edge, and storage failures surface as `Storage` (mapped to 500).
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("{0}")]
    Conflict(String),

    #[error("Store is not accepting orders: {0}")]
    StoreClosed(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<OrderError> for crate::utils::AppError {
    fn from(err: OrderError) -> Self {
        use crate::utils::AppError;
        match err {
            OrderError::Validation(msg) => AppError::Validation(msg),
            OrderError::OrderNotFound(id) => AppError::NotFound(format!("Order {id} not found")),
            OrderError::ProductNotFound(id) => {
                AppError::NotFound(format!("Product {id} not found"))
            }
            OrderError::VoucherNotFound(code) => {
                AppError::NotFound(format!("Voucher {code} not found"))
            }
            OrderError::Forbidden(msg) => AppError::Forbidden(msg),
            OrderError::InvalidTransition { from, to } => AppError::InvalidTransition { from, to },
            OrderError::Conflict(msg) => AppError::Conflict(msg),
            OrderError::StoreClosed(msg) => AppError::StoreClosed(msg),
            OrderError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}
