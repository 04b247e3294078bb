//! Unified error handling for the reconciliation layer.
//!
//! Expected conditions - a duplicate membership, a delete target that already
//! vanished - are *not* errors here; they surface as
//! [`crate::collections::MutationOutcome`] variants. Only blocked actions and
//! transport failures become a [`StoreError`].

use thiserror::Error;

use crate::remote::RemoteError;

/// Failures surfaced to callers of the collection stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The action needs a signed-in shopper. No remote call was attempted.
    #[error("sign in required")]
    AuthenticationRequired,

    /// The remote store could not be reached or answered unexpectedly.
    /// The local snapshot is left untouched.
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(#[from] RemoteError),
}

/// Result type alias for [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::AuthenticationRequired;
        assert_eq!(err.to_string(), "sign in required");

        let err = StoreError::RemoteUnavailable(RemoteError::MissingData);
        assert!(err.to_string().starts_with("remote store unavailable"));
    }

    #[test]
    fn test_remote_error_converts() {
        fn fails() -> Result<()> {
            Err(RemoteError::MissingData)?
        }
        assert!(matches!(fails(), Err(StoreError::RemoteUnavailable(_))));
    }
}
