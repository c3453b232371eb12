//! Inbound action tracking.
//!
//! A [`PendingAction`] represents one inbound request from the chat gateway,
//! from arrival through acknowledgment to a terminal outcome. Actions are
//! in-memory only: they are created when the gateway delivers the event,
//! mutated exclusively by the response controller, and evicted a grace
//! period after reaching a terminal state. Nothing here is ever persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use herald_core::ActionId;

/// The kind of inbound action, as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// A slash command invocation.
    Command,
    /// A button press on a previously sent message.
    ButtonPress,
    /// A selection from a dropdown menu.
    MenuSelect,
    /// A modal form submission.
    FormSubmit,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command => write!(f, "COMMAND"),
            Self::ButtonPress => write!(f, "BUTTON_PRESS"),
            Self::MenuSelect => write!(f, "MENU_SELECT"),
            Self::FormSubmit => write!(f, "FORM_SUBMIT"),
        }
    }
}

/// Action state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionState {
    /// Arrived, no acknowledgment attempt yet.
    Pending,
    /// Directly acknowledged; a follow-up message may still be sent.
    Acknowledged,
    /// Placeholder accepted; real content to follow via an edit.
    Deferred,
    /// Final content delivered (or no further update was needed).
    Completed,
    /// The deadline passed before any acknowledgment attempt.
    Expired,
    /// An unrecoverable external error occurred.
    Failed,
}

impl ActionState {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired | Self::Failed)
    }

    /// Returns true if the transition from self to target is valid.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        match self {
            Self::Pending => matches!(
                target,
                Self::Acknowledged | Self::Deferred | Self::Expired | Self::Failed
            ),
            Self::Acknowledged | Self::Deferred => {
                matches!(target, Self::Completed | Self::Failed)
            }
            Self::Completed | Self::Expired | Self::Failed => false,
        }
    }
}

impl Default for ActionState {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Acknowledged => write!(f, "ACKNOWLEDGED"),
            Self::Deferred => write!(f, "DEFERRED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// One inbound action and its lifecycle timestamps.
///
/// Mutated only by the response controller, under the registry's lock.
/// Callers outside the controller only ever see cloned snapshots.
#[derive(Debug, Clone)]
pub struct PendingAction {
    /// Gateway-assigned identifier, unique per action.
    pub id: ActionId,
    /// What kind of interaction produced this action.
    pub kind: ActionKind,
    /// When the action arrived (clock-sourced at registration).
    pub received_at: DateTime<Utc>,
    /// Current state.
    pub state: ActionState,
    /// Whether an acknowledgment attempt has been claimed.
    ///
    /// Set before the outbound call is made, under the registry lock, so
    /// that at most one acknowledgment is ever attempted per action.
    pub ack_attempted: bool,
    /// When the acknowledgment succeeded, if it did.
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// When the action reached a terminal state, if it has.
    pub completed_at: Option<DateTime<Utc>>,
}

impl PendingAction {
    /// Creates a new pending action received at the given instant.
    #[must_use]
    pub fn new(id: ActionId, kind: ActionKind, received_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind,
            received_at,
            state: ActionState::Pending,
            ack_attempted: false,
            acknowledged_at: None,
            completed_at: None,
        }
    }

    /// Returns the elapsed time between arrival and `now`, saturating to
    /// zero for clock skew.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.received_at)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }
}
