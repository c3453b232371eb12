//! The response controller.
//!
//! Owns the lifecycle of every inbound action from arrival through its
//! single acknowledgment attempt to an optional follow-up delivery. The
//! guiding rule is **tiered degradation**: a direct reply is cheapest and
//! is preferred; past the defer threshold the controller buys time with a
//! placeholder acknowledgment instead, because a timely deferral can still
//! be completed minutes later while a late direct reply fails outright.
//! Past the expiry cutoff nothing is attempted at all - the gateway is
//! guaranteed to reject it.
//!
//! Constructed once at process start and shared via `Arc`; there is no
//! global instance.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use tokio::time::{sleep, timeout};
use tracing::Instrument;

use herald_core::{ActionId, Clock};

use crate::action::{ActionKind, PendingAction};
use crate::config::ResponderConfig;
use crate::content::{ReplyContent, ReplyOptions};
use crate::gateway::ResponseGateway;
use crate::metrics::{labels, names};
use crate::registry::{AckClaim, AckOutcome, ActionRegistry, ResponderStats, UpdateRoute};

/// Boxed error type for business-logic operations run under the controller.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Options for [`ResponseController::run_with_budget`].
#[derive(Debug, Clone)]
pub struct BudgetOptions {
    /// Content for the initial acknowledgment (ignored by the gateway when
    /// the deferred tier is chosen).
    pub placeholder: ReplyContent,
    /// Content delivered when the fast operation errors or times out.
    pub error_content: ReplyContent,
    /// Delivery options applied to every message of this exchange.
    pub reply: ReplyOptions,
}

impl Default for BudgetOptions {
    fn default() -> Self {
        Self {
            placeholder: ReplyContent::text("Working on it..."),
            error_content: ReplyContent::text(
                "Something went wrong while processing your request. Please try again.",
            ),
            reply: ReplyOptions::default(),
        }
    }
}

/// Deadline-bounded acknowledgment state machine over the gateway.
///
/// One instance per process, shared by the business layer. All action-state
/// mutation happens inside [`ActionRegistry`] under a single lock; gateway
/// calls happen with the lock released.
pub struct ResponseController {
    gateway: Arc<dyn ResponseGateway>,
    clock: Arc<dyn Clock>,
    config: ResponderConfig,
    registry: ActionRegistry,
}

impl std::fmt::Debug for ResponseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResponseController {
    /// Creates a controller over the given gateway and clock.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the configuration thresholds are
    /// inconsistent (see [`ResponderConfig::validate`]).
    pub fn new(
        gateway: Arc<dyn ResponseGateway>,
        clock: Arc<dyn Clock>,
        config: ResponderConfig,
    ) -> herald_core::Result<Self> {
        config.validate()?;
        Ok(Self {
            gateway,
            clock,
            config,
            registry: ActionRegistry::new(),
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Registers a freshly arrived action.
    ///
    /// Called by the gateway adapter the moment the event is delivered;
    /// `received_at` is stamped here, so registration must not be delayed
    /// behind other work. Registration also sweeps terminal actions whose
    /// grace period has elapsed.
    ///
    /// # Errors
    ///
    /// Returns `Error::PreconditionFailed` if the id is already registered.
    #[tracing::instrument(skip(self), fields(action_id = %id, kind = %kind))]
    pub fn register(&self, id: ActionId, kind: ActionKind) -> herald_core::Result<()> {
        let now = self.clock.now();
        let swept = self.registry.sweep(now, self.config.eviction_grace);
        if swept > 0 {
            tracing::debug!(swept, "evicted terminal actions");
        }
        self.registry.register(PendingAction::new(id, kind, now))
    }

    /// Attempts the single acknowledgment of an action.
    ///
    /// Chooses the tier from elapsed time: direct reply below the defer
    /// threshold, placeholder deferral above it (or when forced). Past the
    /// expiry cutoff the action expires and **no gateway call is made** -
    /// the attempt would be guaranteed to fail, and retrying after expiry
    /// is pointless by construction.
    ///
    /// Returns `true` only if the gateway accepted the acknowledgment.
    #[tracing::instrument(skip(self, content, options), fields(action_id = %id))]
    pub async fn acknowledge(
        &self,
        id: &ActionId,
        content: &ReplyContent,
        options: ReplyOptions,
    ) -> bool {
        let now = self.clock.now();
        let claim = self.registry.claim_ack(id, now, self.config.expiry_cutoff());
        match claim {
            AckClaim::Unknown => {
                tracing::warn!("acknowledge for unregistered action");
                false
            }
            AckClaim::NotPending { state } => {
                tracing::warn!(%state, "acknowledge skipped, action is not pending");
                false
            }
            AckClaim::Expired => {
                tracing::warn!(
                    cutoff_ms = self.config.expiry_cutoff().as_millis() as u64,
                    "action expired before acknowledgment attempt"
                );
                counter!(names::ACTIONS_TOTAL, labels::STATE => "expired").increment(1);
                false
            }
            AckClaim::Claimed { elapsed } => {
                let defer = options.force_defer || elapsed > self.config.defer_threshold;
                let result = if defer {
                    self.gateway.acknowledge_deferred(id, options.ephemeral).await
                } else {
                    self.gateway.acknowledge(id, content, options.ephemeral).await
                };
                let resolved_at = self.clock.now();

                match result {
                    Ok(()) => {
                        let (outcome, mode) = if defer {
                            (AckOutcome::Deferred, "deferred")
                        } else {
                            (AckOutcome::Direct, "direct")
                        };
                        self.registry.resolve_ack(id, resolved_at, outcome);
                        counter!(names::ACKS_TOTAL, labels::MODE => mode).increment(1);
                        tracing::debug!(
                            mode,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "acknowledged"
                        );
                        true
                    }
                    Err(err) => {
                        counter!(names::GATEWAY_ERRORS_TOTAL, labels::CLASS => err.class())
                            .increment(1);
                        if err.is_unknown_action() {
                            // Our clock said we had time; the platform
                            // disagreed. Platform wins.
                            tracing::warn!("gateway reports action gone, marking expired");
                            self.registry.resolve_ack(id, resolved_at, AckOutcome::GatewayExpired);
                            counter!(names::ACTIONS_TOTAL, labels::STATE => "expired").increment(1);
                        } else {
                            tracing::error!(error = %err, "acknowledgment failed");
                            self.registry.resolve_ack(id, resolved_at, AckOutcome::Failed);
                            counter!(names::ACTIONS_TOTAL, labels::STATE => "failed").increment(1);
                        }
                        false
                    }
                }
            }
        }
    }

    /// Delivers final content to an already-acknowledged action.
    ///
    /// The mechanism follows the state: an in-place edit for a deferred
    /// acknowledgment, a follow-up message for a direct one. When the
    /// action is expired, failed, or unknown there is nothing to correct,
    /// so the call logs and returns `false` without raising.
    #[tracing::instrument(skip(self, content, options), fields(action_id = %id))]
    pub async fn update(
        &self,
        id: &ActionId,
        content: &ReplyContent,
        options: ReplyOptions,
    ) -> bool {
        match self.registry.update_route(id) {
            UpdateRoute::Silent { state } => {
                tracing::warn!(?state, "update dropped, no deliverable acknowledgment");
                counter!(names::UPDATES_TOTAL, labels::RESULT => "silent").increment(1);
                false
            }
            UpdateRoute::Edit => self.deliver_update(id, content, options, true).await,
            UpdateRoute::FollowUp => self.deliver_update(id, content, options, false).await,
        }
    }

    /// Marks a directly-acknowledged action completed with no further
    /// update. Returns `false` if the action is not in `Acknowledged`.
    pub fn complete(&self, id: &ActionId) -> bool {
        let done = self.registry.complete(id, self.clock.now());
        if done {
            counter!(names::ACTIONS_TOTAL, labels::STATE => "completed").increment(1);
        }
        done
    }

    /// Acknowledges, runs the fast operation under the fast budget, and
    /// delivers its result; the slow operation (if any) runs in the
    /// background, decoupled from the deadline.
    ///
    /// The background task carries its own error boundary: its failures are
    /// logged and counted, and never surface to the caller's acknowledgment.
    /// Once started it is not cancellable and runs to completion.
    ///
    /// Returns `true` only if the acknowledged conversation reached a
    /// success update.
    #[tracing::instrument(skip_all, fields(action_id = %id))]
    pub async fn run_with_budget<F, S>(
        &self,
        id: &ActionId,
        options: BudgetOptions,
        fast: F,
        slow: Option<S>,
    ) -> bool
    where
        F: Future<Output = std::result::Result<ReplyContent, BoxError>> + Send,
        S: Future<Output = std::result::Result<(), BoxError>> + Send + 'static,
    {
        if !self.acknowledge(id, &options.placeholder, options.reply).await {
            tracing::debug!("initial acknowledgment failed, skipping operation");
            return false;
        }

        let updated = match timeout(self.config.fast_budget, fast).await {
            Ok(Ok(content)) => self.update(id, &content, options.reply).await,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "fast operation failed");
                self.update(id, &options.error_content, options.reply).await;
                false
            }
            Err(_) => {
                tracing::warn!(
                    budget_ms = self.config.fast_budget.as_millis() as u64,
                    "fast operation timed out"
                );
                self.update(id, &options.error_content, options.reply).await;
                false
            }
        };

        if let Some(slow) = slow {
            let span = herald_core::observability::responder_span("background", id.as_str());
            tokio::spawn(
                async move {
                    if let Err(err) = slow.await {
                        counter!(names::BACKGROUND_FAILURES_TOTAL).increment(1);
                        tracing::warn!(error = %err, "background operation failed");
                    }
                }
                .instrument(span),
            );
        }

        updated
    }

    /// Returns a snapshot of an action's current state, if registered.
    #[must_use]
    pub fn snapshot(&self, id: &ActionId) -> Option<PendingAction> {
        self.registry.get(id)
    }

    /// Returns the lifetime counters.
    #[must_use]
    pub fn stats(&self) -> ResponderStats {
        self.registry.stats()
    }

    /// Evicts terminal actions whose grace period has elapsed.
    ///
    /// Eviction also happens lazily on registration; this entry point is
    /// for hosts that want a periodic sweep.
    pub fn sweep_expired(&self) -> usize {
        self.registry.sweep(self.clock.now(), self.config.eviction_grace)
    }

    /// Sends one update, retrying a transient failure exactly once after a
    /// fixed delay. Permanent failures and exhausted retries move the
    /// action to `Failed`.
    async fn deliver_update(
        &self,
        id: &ActionId,
        content: &ReplyContent,
        options: ReplyOptions,
        edit: bool,
    ) -> bool {
        let mut retried = false;
        loop {
            let result = if edit {
                self.gateway.edit(id, content).await
            } else {
                self.gateway.follow_up(id, content, options.ephemeral).await
            };

            match result {
                Ok(()) => {
                    self.registry.resolve_update(id, self.clock.now(), true);
                    counter!(names::UPDATES_TOTAL, labels::RESULT => "success").increment(1);
                    counter!(names::ACTIONS_TOTAL, labels::STATE => "completed").increment(1);
                    return true;
                }
                Err(err) if err.is_transient() && !retried => {
                    retried = true;
                    tracing::warn!(error = %err, "transient update failure, retrying once");
                    sleep(self.config.retry_delay).await;
                }
                Err(err) => {
                    counter!(names::GATEWAY_ERRORS_TOTAL, labels::CLASS => err.class())
                        .increment(1);
                    counter!(names::UPDATES_TOTAL, labels::RESULT => "failure").increment(1);
                    counter!(names::ACTIONS_TOTAL, labels::STATE => "failed").increment(1);
                    tracing::error!(error = %err, edit, "update delivery failed");
                    self.registry.resolve_update(id, self.clock.now(), false);
                    return false;
                }
            }
        }
    }
}
