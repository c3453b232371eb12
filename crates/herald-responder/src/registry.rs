//! The in-memory action table.
//!
//! All mutation of action state happens here, under one mutex, so the
//! at-most-one-acknowledgment invariant and the state machine validation
//! have a single enforcement point. The controller drops the lock before
//! every gateway call; the claim/resolve split below is what keeps the
//! invariant across that gap.
//!
//! Terminal actions linger for a grace period (so late lookups fail
//! politely instead of mysteriously) and are then swept. Sweeping is lazy:
//! it runs on registration and on demand, never from a per-action timer.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use herald_core::ActionId;

use crate::action::{ActionState, PendingAction};

/// Lifetime counters for the response controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponderStats {
    /// Actions registered since startup.
    pub registered: u64,
    /// Direct acknowledgments delivered.
    pub acknowledged: u64,
    /// Deferred acknowledgments delivered.
    pub deferred: u64,
    /// Actions that reached `Completed`.
    pub completed: u64,
    /// Actions that expired before any attempt.
    pub expired: u64,
    /// Actions that failed on an external error.
    pub failed: u64,
    /// Actions currently in the table (any state).
    pub active: usize,
}

/// Outcome of attempting to claim the acknowledgment of an action.
#[derive(Debug)]
pub(crate) enum AckClaim {
    /// The claim succeeded; the caller owns the single outbound attempt.
    Claimed {
        /// Elapsed time since arrival at the moment of the claim.
        elapsed: Duration,
    },
    /// The action is not in `Pending`, or an attempt was already claimed.
    NotPending {
        /// The state observed under the lock.
        state: ActionState,
    },
    /// The cutoff passed; the action was transitioned to `Expired`.
    Expired,
    /// No action with this id is registered.
    Unknown,
}

/// How the single acknowledgment attempt ended.
#[derive(Debug, Clone, Copy)]
pub(crate) enum AckOutcome {
    /// Direct reply delivered.
    Direct,
    /// Placeholder delivered; content to follow via an edit.
    Deferred,
    /// The gateway reported the action gone/expired.
    GatewayExpired,
    /// Any other gateway error.
    Failed,
}

/// The delivery mechanism implied by the action's current state.
#[derive(Debug, Clone, Copy)]
pub(crate) enum UpdateRoute {
    /// Deferred acknowledgment: replace the placeholder in place.
    Edit,
    /// Direct acknowledgment: send an additional message.
    FollowUp,
    /// No delivery possible; log and return false.
    Silent {
        /// The observed state, if the action is known at all.
        state: Option<ActionState>,
    },
}

#[derive(Debug, Default)]
struct Inner {
    actions: HashMap<ActionId, PendingAction>,
    stats: ResponderStats,
}

/// The action table. One per controller.
#[derive(Debug, Default)]
pub(crate) struct ActionRegistry {
    inner: Mutex<Inner>,
}

impl ActionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly arrived action.
    ///
    /// Rejects duplicate ids: the gateway guarantees uniqueness, so a
    /// duplicate means the adapter delivered the same event twice.
    pub(crate) fn register(&self, action: PendingAction) -> herald_core::Result<()> {
        let mut inner = self.lock();
        if inner.actions.contains_key(&action.id) {
            return Err(herald_core::Error::PreconditionFailed {
                message: format!("action {} is already registered", action.id),
            });
        }
        inner.stats.registered += 1;
        inner.actions.insert(action.id.clone(), action);
        Ok(())
    }

    /// Returns a snapshot of the action, if registered.
    pub(crate) fn get(&self, id: &ActionId) -> Option<PendingAction> {
        self.lock().actions.get(id).cloned()
    }

    /// Claims the one acknowledgment attempt for this action.
    ///
    /// Performs the lazy expiry check: past `cutoff` the action expires
    /// here, with no attempt ever made.
    pub(crate) fn claim_ack(
        &self,
        id: &ActionId,
        now: DateTime<Utc>,
        cutoff: Duration,
    ) -> AckClaim {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let Some(action) = inner.actions.get_mut(id) else {
            return AckClaim::Unknown;
        };

        if action.state != ActionState::Pending || action.ack_attempted {
            return AckClaim::NotPending {
                state: action.state,
            };
        }

        let elapsed = action.elapsed(now);
        if elapsed >= cutoff {
            Self::transition(&mut inner.stats, Some(action), ActionState::Expired, now);
            return AckClaim::Expired;
        }

        action.ack_attempted = true;
        AckClaim::Claimed { elapsed }
    }

    /// Records how the claimed acknowledgment attempt ended.
    pub(crate) fn resolve_ack(&self, id: &ActionId, now: DateTime<Utc>, outcome: AckOutcome) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let target = match outcome {
            AckOutcome::Direct => ActionState::Acknowledged,
            AckOutcome::Deferred => ActionState::Deferred,
            AckOutcome::GatewayExpired => ActionState::Expired,
            AckOutcome::Failed => ActionState::Failed,
        };
        if let Some(action) = inner.actions.get_mut(id) {
            if matches!(outcome, AckOutcome::Direct | AckOutcome::Deferred) {
                action.acknowledged_at = Some(now);
            }
            Self::transition(&mut inner.stats, Some(action), target, now);
        }
    }

    /// Determines the delivery mechanism for an update.
    pub(crate) fn update_route(&self, id: &ActionId) -> UpdateRoute {
        let inner = self.lock();
        match inner.actions.get(id).map(|a| a.state) {
            Some(ActionState::Deferred) => UpdateRoute::Edit,
            Some(ActionState::Acknowledged) => UpdateRoute::FollowUp,
            other => UpdateRoute::Silent { state: other },
        }
    }

    /// Records the outcome of an update delivery.
    pub(crate) fn resolve_update(&self, id: &ActionId, now: DateTime<Utc>, success: bool) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let target = if success {
            ActionState::Completed
        } else {
            ActionState::Failed
        };
        Self::transition(&mut inner.stats, inner.actions.get_mut(id), target, now);
    }

    /// Marks an acknowledged action completed with no further update.
    pub(crate) fn complete(&self, id: &ActionId, now: DateTime<Utc>) -> bool {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.actions.get(id).map(|a| a.state) {
            Some(ActionState::Acknowledged) => {
                Self::transition(
                    &mut inner.stats,
                    inner.actions.get_mut(id),
                    ActionState::Completed,
                    now,
                );
                true
            }
            _ => false,
        }
    }

    /// Evicts terminal actions whose grace period has elapsed.
    ///
    /// Returns the number of actions removed.
    pub(crate) fn sweep(&self, now: DateTime<Utc>, grace: Duration) -> usize {
        let mut inner = self.lock();
        let before = inner.actions.len();
        inner.actions.retain(|_, action| {
            if !action.state.is_terminal() {
                return true;
            }
            match action.completed_at {
                Some(at) => (now - at).to_std().unwrap_or(Duration::ZERO) < grace,
                None => true,
            }
        });
        before - inner.actions.len()
    }

    /// Returns a snapshot of the lifetime counters.
    pub(crate) fn stats(&self) -> ResponderStats {
        let inner = self.lock();
        ResponderStats {
            active: inner.actions.len(),
            ..inner.stats
        }
    }

    /// Applies a validated state transition, maintaining timestamps and
    /// counters. An invalid transition is a controller bug; it is logged
    /// and dropped rather than corrupting the table.
    fn transition(
        stats: &mut ResponderStats,
        action: Option<&mut PendingAction>,
        target: ActionState,
        now: DateTime<Utc>,
    ) {
        let Some(action) = action else {
            return;
        };
        if !action.state.can_transition_to(target) {
            tracing::error!(
                action_id = %action.id,
                from = %action.state,
                to = %target,
                "invalid action state transition, ignoring"
            );
            return;
        }
        action.state = target;
        if target.is_terminal() {
            action.completed_at = Some(now);
        }
        match target {
            ActionState::Acknowledged => stats.acknowledged += 1,
            ActionState::Deferred => stats.deferred += 1,
            ActionState::Completed => stats.completed += 1,
            ActionState::Expired => stats.expired += 1,
            ActionState::Failed => stats.failed += 1,
            ActionState::Pending => {}
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic while holding it; the table is
        // plain data, so continuing with it is safe.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    fn action(id: &str, received_at: DateTime<Utc>) -> PendingAction {
        PendingAction::new(id.parse().unwrap(), ActionKind::Command, received_at)
    }

    #[test]
    fn duplicate_registration_rejected() {
        let registry = ActionRegistry::new();
        let now = Utc::now();
        registry.register(action("1", now)).unwrap();
        assert!(registry.register(action("1", now)).is_err());
        assert_eq!(registry.stats().registered, 1);
    }

    #[test]
    fn claim_is_exclusive() {
        let registry = ActionRegistry::new();
        let now = Utc::now();
        registry.register(action("1", now)).unwrap();

        let id: ActionId = "1".parse().unwrap();
        let cutoff = Duration::from_millis(2500);
        assert!(matches!(
            registry.claim_ack(&id, now, cutoff),
            AckClaim::Claimed { .. }
        ));
        // Second claim must not get through, even before resolution.
        assert!(matches!(
            registry.claim_ack(&id, now, cutoff),
            AckClaim::NotPending { .. }
        ));
    }

    #[test]
    fn claim_past_cutoff_expires() {
        let registry = ActionRegistry::new();
        let received = Utc::now();
        registry.register(action("1", received)).unwrap();

        let id: ActionId = "1".parse().unwrap();
        let later = received + chrono::Duration::milliseconds(2600);
        assert!(matches!(
            registry.claim_ack(&id, later, Duration::from_millis(2500)),
            AckClaim::Expired
        ));
        let snapshot = registry.get(&id).unwrap();
        assert_eq!(snapshot.state, ActionState::Expired);
        assert!(!snapshot.ack_attempted);
        assert_eq!(registry.stats().expired, 1);
    }

    #[test]
    fn sweep_evicts_only_aged_terminal_actions() {
        let registry = ActionRegistry::new();
        let now = Utc::now();
        registry.register(action("done", now)).unwrap();
        registry.register(action("live", now)).unwrap();

        let done: ActionId = "done".parse().unwrap();
        registry.claim_ack(&done, now, Duration::from_millis(2500));
        registry.resolve_ack(&done, now, AckOutcome::Direct);
        registry.complete(&done, now);

        let grace = Duration::from_secs(5);
        // Inside the grace period nothing goes.
        assert_eq!(registry.sweep(now + chrono::Duration::seconds(2), grace), 0);
        // Past it, only the terminal action goes.
        assert_eq!(registry.sweep(now + chrono::Duration::seconds(6), grace), 1);
        assert!(registry.get(&done).is_none());
        assert!(registry.get(&"live".parse().unwrap()).is_some());
    }

    #[test]
    fn update_routes_follow_state() {
        let registry = ActionRegistry::new();
        let now = Utc::now();
        registry.register(action("d", now)).unwrap();
        registry.register(action("a", now)).unwrap();

        let deferred: ActionId = "d".parse().unwrap();
        let acked: ActionId = "a".parse().unwrap();
        let cutoff = Duration::from_millis(2500);

        registry.claim_ack(&deferred, now, cutoff);
        registry.resolve_ack(&deferred, now, AckOutcome::Deferred);
        registry.claim_ack(&acked, now, cutoff);
        registry.resolve_ack(&acked, now, AckOutcome::Direct);

        assert!(matches!(registry.update_route(&deferred), UpdateRoute::Edit));
        assert!(matches!(registry.update_route(&acked), UpdateRoute::FollowUp));
        assert!(matches!(
            registry.update_route(&"missing".parse().unwrap()),
            UpdateRoute::Silent { state: None }
        ));
    }

    #[test]
    fn counters_track_outcomes() {
        let registry = ActionRegistry::new();
        let now = Utc::now();
        let cutoff = Duration::from_millis(2500);

        for (id, outcome) in [("1", AckOutcome::Direct), ("2", AckOutcome::Deferred)] {
            registry.register(action(id, now)).unwrap();
            let id: ActionId = id.parse().unwrap();
            registry.claim_ack(&id, now, cutoff);
            registry.resolve_ack(&id, now, outcome);
        }
        registry.resolve_update(&"2".parse().unwrap(), now, true);

        let stats = registry.stats();
        assert_eq!(stats.registered, 2);
        assert_eq!(stats.acknowledged, 1);
        assert_eq!(stats.deferred, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.active, 2);
    }
}
