//! Outbound gateway contract.
//!
//! The chat platform's request/response surface, reduced to the four
//! primitives the controller needs. The platform adapter implements this
//! trait; the controller never sees the wire protocol.
//!
//! Error classification matters more than the calls themselves: the
//! controller's retry and state-machine decisions are driven entirely by
//! [`GatewayError::is_transient`] and the unknown-action case.

use async_trait::async_trait;
use std::time::Duration;

use herald_core::ActionId;

use crate::content::ReplyContent;

/// The result type for gateway calls.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Errors reported by the chat gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The action no longer exists on the platform side, or its response
    /// channel has expired. Permanent; retrying is guaranteed to fail.
    #[error("unknown action: {action_id}")]
    UnknownAction {
        /// The identifier the platform rejected.
        action_id: String,
    },

    /// The bot lacks permission for the attempted delivery. Permanent.
    #[error("access denied: {message}")]
    AccessDenied {
        /// Platform-supplied detail.
        message: String,
    },

    /// The platform asked us to slow down. Transient.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// How long the platform asked us to wait.
        retry_after: Duration,
    },

    /// The call failed in transit (connection reset, 5xx, timeout).
    /// Transient.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GatewayError {
    /// Creates a transport error from a message.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error with a source cause.
    #[must_use]
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if retrying the call once may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transport { .. })
    }

    /// Returns true if the platform reports the action as gone/expired.
    #[must_use]
    pub fn is_unknown_action(&self) -> bool {
        matches!(self, Self::UnknownAction { .. })
    }

    /// Stable label for metrics and logs.
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Self::UnknownAction { .. } => "unknown_action",
            Self::AccessDenied { .. } => "access_denied",
            Self::RateLimited { .. } => "rate_limited",
            Self::Transport { .. } => "transport",
        }
    }
}

/// The four outbound primitives of the chat platform.
///
/// Platform semantics the controller relies on:
///
/// - `acknowledge` succeeds only if the action has not already been
///   acknowledged and has not yet expired.
/// - `edit` is valid only after a successful deferred acknowledgment.
/// - `follow_up` is valid only after a successful direct acknowledgment and
///   produces an additional message rather than editing the first.
#[async_trait]
pub trait ResponseGateway: Send + Sync + 'static {
    /// Sends the first, direct reply to an action.
    async fn acknowledge(
        &self,
        id: &ActionId,
        content: &ReplyContent,
        ephemeral: bool,
    ) -> GatewayResult<()>;

    /// Sends a placeholder acknowledgment, buying time for the real content.
    async fn acknowledge_deferred(&self, id: &ActionId, ephemeral: bool) -> GatewayResult<()>;

    /// Replaces the placeholder of a deferred acknowledgment.
    async fn edit(&self, id: &ActionId, content: &ReplyContent) -> GatewayResult<()>;

    /// Sends an additional message after a direct acknowledgment.
    async fn follow_up(
        &self,
        id: &ActionId,
        content: &ReplyContent,
        ephemeral: bool,
    ) -> GatewayResult<()>;
}
