//! Error taxonomy and provider-failure classification.
//!
//! Every raw failure coming back from a ledger provider is mapped to a
//! canonical [`ErrorKind`] before anything else in the core looks at it.
//! Classification is a pure function: no state, no I/O, same input always
//! yields the same kind.
//!
//! Matching order (priority matters — providers sometimes emit generic
//! messages alongside specific codes):
//! 1. exact numeric code against the known table
//! 2. substring heuristics on the message
//! 3. fallback to `Unknown`, original message preserved

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// EIP-1193 user rejection code.
pub const CODE_USER_REJECTED: i64 = 4001;
/// JSON-RPC insufficient-funds code emitted by most EVM nodes.
pub const CODE_INSUFFICIENT_FUNDS: i64 = -32000;
/// JSON-RPC internal node error.
pub const CODE_INTERNAL_ERROR: i64 = -32603;

/// Raw, unclassified failure as received from a ledger provider.
///
/// This is the only error shape allowed to cross the `ChainClient`
/// boundary; callers never interpret it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    /// Provider-specific numeric code, when one was present.
    pub code: Option<i64>,
    /// Original provider message, verbatim.
    pub message: String,
}

impl ProviderFailure {
    /// Create a failure from a code and message.
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a code-less failure from a message alone.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "provider error {code}: {}", self.message),
            None => write!(f, "provider error: {}", self.message),
        }
    }
}

/// Canonical error taxonomy.
///
/// The `#[error]` strings are the human-readable reasons shown to the
/// user; the UI never needs to inspect raw provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The user declined the operation in their wallet.
    #[error("Transaction rejected by user")]
    UserRejected,
    /// The account cannot cover the operation.
    #[error("Insufficient funds for transaction")]
    InsufficientFunds,
    /// Transport or node-side failure; expected to succeed on retry.
    #[error("Network error, please try again")]
    NetworkError,
    /// The call exceeded the configured deadline.
    #[error("Request timed out, please try again")]
    Timeout,
    /// Connected chain is not in the supported set.
    #[error("Please switch to a supported network")]
    UnsupportedChain,
    /// Client-side rejection; never reached the ledger.
    #[error("Invalid request")]
    Validation,
    /// Anything the table and heuristics could not place.
    #[error("Transaction failed")]
    Unknown,
}

impl ErrorKind {
    /// Whether a failure of this kind is expected to succeed on retry.
    ///
    /// Non-transient kinds reflect a decision external to this system
    /// (user rejection, insufficient funds) and must not be retried.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::NetworkError | Self::Timeout)
    }
}

/// A classified failure: canonical kind plus the original provider
/// code/message for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorClassification {
    /// Canonical kind.
    pub kind: ErrorKind,
    /// Original provider code, if any.
    pub code: Option<i64>,
    /// Original provider message, never discarded.
    pub message: String,
}

impl ErrorClassification {
    /// Classify a raw provider failure.
    pub fn classify(failure: &ProviderFailure) -> Self {
        let kind = match failure.code {
            Some(CODE_USER_REJECTED) => ErrorKind::UserRejected,
            Some(CODE_INSUFFICIENT_FUNDS) => ErrorKind::InsufficientFunds,
            Some(CODE_INTERNAL_ERROR) => ErrorKind::NetworkError,
            _ => classify_message(&failure.message),
        };
        Self {
            kind,
            code: failure.code,
            message: failure.message.clone(),
        }
    }

    /// Build a client-side validation failure (never reached the ledger).
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            code: None,
            message: message.into(),
        }
    }

    /// Build a timeout classification for a call that exceeded its deadline.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            code: None,
            message: message.into(),
        }
    }

    /// Build an `Unknown` classification, preserving the message.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            code: None,
            message: message.into(),
        }
    }

    /// Human-readable reason for the user-facing surface.
    ///
    /// Derived from the kind; `Unknown` falls through to the original
    /// message so nothing is silently swallowed.
    pub fn reason(&self) -> String {
        match self.kind {
            ErrorKind::Unknown if !self.message.is_empty() => self.message.clone(),
            kind => kind.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Substring heuristics, applied only when no known code matched.
fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    if lower.contains("network") {
        ErrorKind::NetworkError
    } else if lower.contains("timed out") || lower.contains("timeout") {
        ErrorKind::Timeout
    } else if lower.contains("support") {
        ErrorKind::UnsupportedChain
    } else {
        ErrorKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_to_table_entries() {
        let rejected = ProviderFailure::new(Some(4001), "denied");
        assert_eq!(
            ErrorClassification::classify(&rejected).kind,
            ErrorKind::UserRejected
        );

        let funds = ProviderFailure::new(Some(-32000), "gas too low");
        assert_eq!(
            ErrorClassification::classify(&funds).kind,
            ErrorKind::InsufficientFunds
        );

        let internal = ProviderFailure::new(Some(-32603), "internal error");
        assert_eq!(
            ErrorClassification::classify(&internal).kind,
            ErrorKind::NetworkError
        );
    }

    #[test]
    fn test_code_takes_priority_over_message() {
        // A specific code alongside a generic "network" message must win.
        let failure = ProviderFailure::new(Some(4001), "network connection dropped");
        assert_eq!(
            ErrorClassification::classify(&failure).kind,
            ErrorKind::UserRejected
        );
    }

    #[test]
    fn test_message_heuristics() {
        let net = ProviderFailure::message("Network unreachable");
        assert_eq!(
            ErrorClassification::classify(&net).kind,
            ErrorKind::NetworkError
        );

        let timeout = ProviderFailure::message("request timed out after 30s");
        assert_eq!(
            ErrorClassification::classify(&timeout).kind,
            ErrorKind::Timeout
        );

        let chain = ProviderFailure::message("chain 80001 is not supported");
        assert_eq!(
            ErrorClassification::classify(&chain).kind,
            ErrorKind::UnsupportedChain
        );
    }

    #[test]
    fn test_unknown_preserves_original_message() {
        let failure = ProviderFailure::message("execution reverted: paused");
        let classified = ErrorClassification::classify(&failure);
        assert_eq!(classified.kind, ErrorKind::Unknown);
        assert_eq!(classified.message, "execution reverted: paused");
        assert_eq!(classified.reason(), "execution reverted: paused");
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::NetworkError.is_transient());
        assert!(ErrorKind::Timeout.is_transient());
        assert!(!ErrorKind::UserRejected.is_transient());
        assert!(!ErrorKind::InsufficientFunds.is_transient());
        assert!(!ErrorKind::Validation.is_transient());
        assert!(!ErrorKind::Unknown.is_transient());
    }

    #[test]
    fn test_reason_uses_kind_message_for_known_kinds() {
        let failure = ProviderFailure::new(Some(4001), "raw wallet payload");
        let classified = ErrorClassification::classify(&failure);
        assert_eq!(classified.reason(), "Transaction rejected by user");
    }
}
