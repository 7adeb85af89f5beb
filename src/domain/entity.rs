//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.
//! All entities must have a unique ID and be thread-safe.

use serde::{Deserialize, Serialize};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + std::hash::Hash + std::fmt::Display + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;

    /// Short name used in error messages ("item", "item set", ...)
    fn kind() -> &'static str;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainError {
    NotFound(String),
    InvalidInput(String),
    Conflict(String),
    PermissionDenied(String),
    Internal(String),
}

impl DomainError {
    /// Not-found error naming the missing entity and its id
    pub fn not_found<T: Entity>(id: T::Id) -> Self {
        DomainError::NotFound(format!("{} {} not found", T::kind(), id))
    }

    /// HTTP-equivalent status a request handler reports for this error
    pub fn status_code(&self) -> u16 {
        match self {
            DomainError::NotFound(_) => 404,
            DomainError::InvalidInput(_) => 400,
            DomainError::Conflict(_) => 409,
            DomainError::PermissionDenied(_) => 403,
            DomainError::Internal(_) => 500,
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Reject amounts that would break the non-negative quantity invariant
pub fn validate_amount(amount: f64) -> DomainResult<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(DomainError::InvalidInput(format!(
            "amount must be a non-negative number, got {}",
            amount
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DomainError::NotFound("x".into()).status_code(), 404);
        assert_eq!(DomainError::Conflict("x".into()).status_code(), 409);
        assert_eq!(DomainError::PermissionDenied("x".into()).status_code(), 403);
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(0.0), Ok(0.0));
        assert_eq!(validate_amount(2.5), Ok(2.5));
        assert!(validate_amount(-1.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }
}
