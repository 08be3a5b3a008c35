//! Common error types used across the workspace.

/// Base error for bridge operations.
///
/// Each layer defines its own typed errors and converts into this via
/// `#[from]` or [`BridgeError::store`]. No error in the bridge is fatal:
/// callers log and degrade rather than crash.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A payload could not be serialized or parsed.
    #[error("serialization error")]
    Serialization(#[from] serde_json::Error),

    /// The persisted configuration store failed.
    #[error("config store error")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A referenced device does not exist on the hub.
    #[error("device {id} not found")]
    DeviceNotFound {
        /// The hub device id that failed to resolve.
        id: u32,
    },

    /// The transport rejected or dropped a publish.
    #[error("publish failed: {reason}")]
    Publish {
        /// Transport-specific failure description.
        reason: String,
    },
}

impl BridgeError {
    /// Wrap an adapter-specific store error.
    #[must_use]
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_device_not_found_with_id() {
        let err = BridgeError::DeviceNotFound { id: 42 };
        assert_eq!(err.to_string(), "device 42 not found");
    }

    #[test]
    fn should_convert_serde_errors() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: BridgeError = serde_err.into();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }

    #[test]
    fn should_wrap_store_errors_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = BridgeError::store(io_err);
        assert_eq!(err.to_string(), "config store error");
        assert!(std::error::Error::source(&err).is_some());
    }
}
