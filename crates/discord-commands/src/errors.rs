//! Discord-specific error handling for the bot.
//!
//! Classifies serenity errors so that handler failures are logged at the
//! right level, and maps client errors onto gateway error events.

use std::time::Duration;

use discord_types::{ClientErrorCode, ClientErrorEvent};
use serenity::http::HttpError;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Failures raised by the bot itself rather than by Discord.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Cannot reply to a member join event (user {0})")]
    NoMessage(u64),

    #[error("User {user_id} is not a member of guild {guild_id}")]
    NotAMember { guild_id: u64, user_id: u64 },

    #[error("Channel {0} is unavailable")]
    ChannelUnavailable(u64),
}

/// A failed Discord API call, as seen in logs.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFailure {
    pub operation: String,
    /// 0 when the request never got a response.
    pub http_status: u16,
    /// Discord JSON error code, 0 when absent.
    pub code: isize,
    pub message: String,
}

/// Result of classifying a Discord API error.
#[derive(Debug)]
pub enum ErrorOutcome {
    /// Rate limited; the request may be retried after this duration.
    Retry(Duration),
    /// The request was rejected and will fail again as is.
    Permanent(ApiFailure),
    /// Server-side or network failure.
    Transient(ApiFailure),
}

/// Classify a serenity `Error` and return the appropriate `ErrorOutcome`.
pub fn classify(operation: &str, err: &serenity::Error) -> ErrorOutcome {
    match err {
        serenity::Error::Http(http_err) => classify_http(operation, http_err),
        _ => {
            debug!("Non-HTTP serenity error on '{}': {}", operation, err);
            ErrorOutcome::Transient(make_failure(operation, 0, 0, &err.to_string()))
        }
    }
}

/// Log a serenity error at the appropriate level.
///
/// - Permanent errors → `error!`
/// - Rate-limited → `warn!`
/// - Transient errors → `warn!`
pub fn log_error(operation: &str, context: &str, err: &serenity::Error) {
    log_outcome(context, classify(operation, err));
}

/// Log a pre-classified `ErrorOutcome` at the appropriate level.
pub fn log_outcome(context: &str, outcome: ErrorOutcome) {
    match outcome {
        ErrorOutcome::Permanent(failure) => {
            error!(
                "{} [HTTP {} / code {}]: {}",
                context, failure.http_status, failure.code, failure.message
            );
        }
        ErrorOutcome::Transient(failure) => {
            warn!(
                "{} [HTTP {} / code {}]: {}",
                context, failure.http_status, failure.code, failure.message
            );
        }
        ErrorOutcome::Retry(dur) => {
            warn!("{}: rate limited, retry after {:?}", context, dur);
        }
    }
}

/// Map an error that ended the gateway client onto an error event.
pub fn client_error_event(err: &serenity::Error) -> ClientErrorEvent {
    let code = match err {
        serenity::Error::Io(io_err) => ClientErrorCode::from_io_kind(io_err.kind()),
        serenity::Error::Gateway(_) => ClientErrorCode::Other("gateway".to_string()),
        serenity::Error::Http(_) => ClientErrorCode::Other("http".to_string()),
        _ => ClientErrorCode::Other("client".to_string()),
    };
    ClientErrorEvent::new(code, err.to_string())
}

fn classify_http(operation: &str, http_err: &HttpError) -> ErrorOutcome {
    match http_err {
        HttpError::UnsuccessfulRequest(resp) => {
            let status = resp.status_code.as_u16();
            let failure = make_failure(operation, status, resp.error.code, &resp.error.message);
            classify_status(failure)
        }

        // Network / request-level failures (not Discord API errors)
        _ => {
            debug!("Network-level HTTP error on '{}': {}", operation, http_err);
            ErrorOutcome::Transient(make_failure(operation, 0, 0, &http_err.to_string()))
        }
    }
}

fn classify_status(failure: ApiFailure) -> ErrorOutcome {
    match failure.http_status {
        // Real value is in the JSON body; a second is conservative.
        429 => ErrorOutcome::Retry(Duration::from_secs(1)),
        400..=499 => ErrorOutcome::Permanent(failure),
        _ => ErrorOutcome::Transient(failure),
    }
}

fn make_failure(operation: &str, http_status: u16, code: isize, message: &str) -> ApiFailure {
    ApiFailure {
        operation: operation.to_string(),
        http_status,
        code,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // We can't easily construct serenity HTTP errors in unit tests without a
    // live HTTP client, so we test the status classification directly.

    #[test]
    fn test_command_error_display() {
        assert_eq!(
            CommandError::NoMessage(42).to_string(),
            "Cannot reply to a member join event (user 42)"
        );
        assert_eq!(
            CommandError::NotAMember {
                guild_id: 500,
                user_id: 42
            }
            .to_string(),
            "User 42 is not a member of guild 500"
        );
        assert_eq!(
            CommandError::ChannelUnavailable(11).to_string(),
            "Channel 11 is unavailable"
        );
    }

    #[test]
    fn test_rate_limit_is_retry() {
        let outcome = classify_status(make_failure("client_reaction_add", 429, 0, "slow down"));
        assert!(matches!(outcome, ErrorOutcome::Retry(d) if d == Duration::from_secs(1)));
    }

    #[test]
    fn test_missing_permissions_is_permanent() {
        let outcome = classify_status(make_failure(
            "client_reaction_add",
            403,
            50013,
            "Missing Permissions",
        ));
        match outcome {
            ErrorOutcome::Permanent(failure) => {
                assert_eq!(failure.operation, "client_reaction_add");
                assert_eq!(failure.code, 50013);
                assert_eq!(failure.http_status, 403);
            }
            other => panic!("expected permanent, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_message_is_permanent() {
        let outcome = classify_status(make_failure("x", 404, 10008, "Unknown Message"));
        assert!(matches!(outcome, ErrorOutcome::Permanent(_)));
    }

    #[test]
    fn test_server_error_is_transient() {
        let outcome = classify_status(make_failure("x", 503, 130000, "API overloaded"));
        assert!(matches!(outcome, ErrorOutcome::Transient(_)));
    }

    #[test]
    fn test_io_reset_maps_to_transient_event() {
        let err = serenity::Error::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset));
        let event = client_error_event(&err);
        assert_eq!(event.code, ClientErrorCode::ConnectionReset);
        assert!(event.code.is_transient());
    }

    #[test]
    fn test_other_errors_map_to_other_code() {
        let err = serenity::Error::Other("boom");
        let event = client_error_event(&err);
        assert_eq!(event.code, ClientErrorCode::Other("client".to_string()));
        assert!(!event.code.is_transient());
        assert_eq!(event.message, "boom");
    }

    #[test]
    fn test_non_http_error_classifies_transient() {
        let err = serenity::Error::Other("boom");
        assert!(matches!(classify("x", &err), ErrorOutcome::Transient(_)));
    }
}
