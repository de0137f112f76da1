//! Connection-level error codes reported by the gateway client.
//!
//! Codes follow the familiar socket error names (`ECONNRESET`, `ETIMEDOUT`)
//! so that operators can match log lines against system documentation.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};

/// Classified gateway/client error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientErrorCode {
    /// `ECONNRESET`: the peer closed the connection.
    ConnectionReset,
    /// `ETIMEDOUT`: the connection timed out.
    TimedOut,
    /// Anything else, carrying the raw code.
    Other(String),
}

impl ClientErrorCode {
    /// Map a raw code string to a named variant.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "ECONNRESET" => Self::ConnectionReset,
            "ETIMEDOUT" => Self::TimedOut,
            other => Self::Other(other.to_string()),
        }
    }

    /// Map an I/O error kind, as surfaced by the websocket layer.
    pub fn from_io_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
                Self::ConnectionReset
            }
            ErrorKind::TimedOut => Self::TimedOut,
            other => Self::Other(format!("{:?}", other)),
        }
    }

    /// Raw code string.
    pub fn as_raw(&self) -> &str {
        match self {
            Self::ConnectionReset => "ECONNRESET",
            Self::TimedOut => "ETIMEDOUT",
            Self::Other(raw) => raw,
        }
    }

    /// Transient errors are recovered by the client's own reconnect logic.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionReset | Self::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_known_codes() {
        assert_eq!(
            ClientErrorCode::from_raw("ECONNRESET"),
            ClientErrorCode::ConnectionReset
        );
        assert_eq!(ClientErrorCode::from_raw("ETIMEDOUT"), ClientErrorCode::TimedOut);
    }

    #[test]
    fn test_from_raw_unknown_code_is_preserved() {
        let code = ClientErrorCode::from_raw("EACCES");
        assert_eq!(code, ClientErrorCode::Other("EACCES".to_string()));
        assert_eq!(code.as_raw(), "EACCES");
        assert!(!code.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        assert!(ClientErrorCode::ConnectionReset.is_transient());
        assert!(ClientErrorCode::TimedOut.is_transient());
        assert!(!ClientErrorCode::Other("4004".to_string()).is_transient());
    }

    #[test]
    fn test_from_io_kind() {
        assert_eq!(
            ClientErrorCode::from_io_kind(ErrorKind::ConnectionReset),
            ClientErrorCode::ConnectionReset
        );
        assert_eq!(
            ClientErrorCode::from_io_kind(ErrorKind::BrokenPipe),
            ClientErrorCode::ConnectionReset
        );
        assert_eq!(
            ClientErrorCode::from_io_kind(ErrorKind::TimedOut),
            ClientErrorCode::TimedOut
        );
        assert!(!ClientErrorCode::from_io_kind(ErrorKind::PermissionDenied).is_transient());
    }

    #[test]
    fn test_as_raw_roundtrip() {
        for raw in ["ECONNRESET", "ETIMEDOUT"] {
            assert_eq!(ClientErrorCode::from_raw(raw).as_raw(), raw);
        }
    }
}
