//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Forbidden`] thrown when the caller does not own the resource.
//! - [`KeyNotFound`] thrown when an item are not found.
//! - [`InsufficientPoints`] thrown when a voucher costs more than the balance.
//!
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InsufficientPoints`]: EngineError::InsufficientPoints
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotRecycler(String),
    #[error("Not enough points: balance is {balance}, voucher costs {cost}")]
    InsufficientPoints { balance: i64, cost: i64 },
    #[error("Voucher unavailable: {0}")]
    VoucherUnavailable(String),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::NotRecycler(a), Self::NotRecycler(b)) => a == b,
            (
                Self::InsufficientPoints {
                    balance: a,
                    cost: c,
                },
                Self::InsufficientPoints {
                    balance: b,
                    cost: d,
                },
            ) => a == b && c == d,
            (Self::VoucherUnavailable(a), Self::VoucherUnavailable(b)) => a == b,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
