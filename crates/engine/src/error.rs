//! The module contains the error the engine can throw.
//!
//! The errors fall in four families:
//!
//! - [`KeyNotFound`] thrown when an item is missing or owned by someone else.
//! - validation errors ([`InvalidAmount`], [`InvalidName`], [`InvalidKind`],
//!   [`InvalidDate`], [`InvalidRange`], [`InvalidId`]).
//! - [`ImmutableField`] thrown when an update tries to change a field that is
//!   fixed after creation, and [`ExistingKey`] for uniqueness conflicts.
//! - [`Database`] for persistence failures, propagated unchanged.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`InvalidKind`]: EngineError::InvalidKind
//!  [`InvalidDate`]: EngineError::InvalidDate
//!  [`InvalidRange`]: EngineError::InvalidRange
//!  [`InvalidId`]: EngineError::InvalidId
//!  [`ImmutableField`]: EngineError::ImmutableField
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid kind: {0}")]
    InvalidKind(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("\"{0}\" cannot be changed after creation")]
    ImmutableField(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` for the validation family (bad caller input).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InvalidName(_)
                | Self::InvalidKind(_)
                | Self::InvalidDate(_)
                | Self::InvalidRange(_)
                | Self::InvalidId(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidKind(a), Self::InvalidKind(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidRange(a), Self::InvalidRange(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::ImmutableField(a), Self::ImmutableField(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
