use thiserror::Error;

/// Top-level error type for the MedBridge system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for
/// MedBridgeError` so the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MedBridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MedBridgeError {
    fn from(err: toml::de::Error) -> Self {
        MedBridgeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MedBridgeError {
    fn from(err: toml::ser::Error) -> Self {
        MedBridgeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MedBridgeError {
    fn from(err: serde_json::Error) -> Self {
        MedBridgeError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for MedBridge operations.
pub type Result<T> = std::result::Result<T, MedBridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MedBridgeError::Connection("token fetch failed".to_string());
        assert_eq!(err.to_string(), "Connection error: token fetch failed");

        let err = MedBridgeError::Protocol("missing type tag".to_string());
        assert_eq!(err.to_string(), "Protocol error: missing type tag");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: MedBridgeError = io_err.into();
        assert!(matches!(err, MedBridgeError::Io(_)));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let bad = "languages = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad);
        let err: MedBridgeError = parsed.unwrap_err().into();
        assert!(matches!(err, MedBridgeError::Config(_)));
    }

    #[test]
    fn test_serde_json_error_maps_to_serialization() {
        let parsed: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{ nope }");
        let err: MedBridgeError = parsed.unwrap_err().into();
        assert!(matches!(err, MedBridgeError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io: std::result::Result<i32, std::io::Error> = Ok(1);
            let _ = io?;
            Ok("ok".to_string())
        }
        assert_eq!(inner().unwrap(), "ok");
    }
}
