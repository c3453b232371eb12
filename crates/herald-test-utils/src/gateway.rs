//! Scripted gateway for controller tests.
//!
//! Records every outbound call with its simulated timestamp and lets tests
//! script classified failures for upcoming calls. The recording is what
//! makes the at-most-one-acknowledgment and zero-calls-after-expiry
//! properties directly assertable.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use herald_core::{ActionId, Clock};
use herald_responder::gateway::{GatewayError, GatewayResult, ResponseGateway};
use herald_responder::ReplyContent;

/// Which gateway primitive was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayCallKind {
    /// Direct first reply.
    Acknowledge,
    /// Placeholder acknowledgment.
    AcknowledgeDeferred,
    /// In-place edit of a deferred acknowledgment.
    Edit,
    /// Additional message after a direct acknowledgment.
    FollowUp,
}

impl GatewayCallKind {
    /// Returns true for the two acknowledgment primitives.
    #[must_use]
    pub fn is_acknowledgment(self) -> bool {
        matches!(self, Self::Acknowledge | Self::AcknowledgeDeferred)
    }
}

/// One recorded outbound call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The primitive invoked.
    pub kind: GatewayCallKind,
    /// The action it addressed.
    pub action_id: ActionId,
    /// Text content, if the call carried content.
    pub text: Option<String>,
    /// Ephemeral flag, if the call carried one.
    pub ephemeral: Option<bool>,
    /// Simulated timestamp of the call.
    pub at: DateTime<Utc>,
}

#[derive(Default)]
struct Script {
    calls: Vec<RecordedCall>,
    failures: VecDeque<GatewayError>,
}

/// In-memory gateway that records calls and injects scripted failures.
///
/// Failures queued with [`ScriptedGateway::fail_next`] are consumed one per
/// outbound call, in order; once the queue is empty every call succeeds.
pub struct ScriptedGateway {
    clock: Arc<dyn Clock>,
    script: Mutex<Script>,
}

impl ScriptedGateway {
    /// Creates a gateway stamping calls with the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            script: Mutex::new(Script::default()),
        }
    }

    /// Queues a failure for the next outbound call.
    pub fn fail_next(&self, error: GatewayError) {
        self.script.lock().expect("lock").failures.push_back(error);
    }

    /// Returns all recorded calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().expect("lock").calls.clone()
    }

    /// Returns the total number of outbound calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.script.lock().expect("lock").calls.len()
    }

    /// Returns the number of acknowledgment attempts for an action.
    #[must_use]
    pub fn ack_attempts(&self, id: &ActionId) -> usize {
        self.script
            .lock()
            .expect("lock")
            .calls
            .iter()
            .filter(|call| call.kind.is_acknowledgment() && &call.action_id == id)
            .count()
    }

    fn record(
        &self,
        kind: GatewayCallKind,
        id: &ActionId,
        content: Option<&ReplyContent>,
        ephemeral: Option<bool>,
    ) -> GatewayResult<()> {
        let mut script = self.script.lock().expect("lock");
        script.calls.push(RecordedCall {
            kind,
            action_id: id.clone(),
            text: content.and_then(|c| c.text.clone()),
            ephemeral,
            at: self.clock.now(),
        });
        match script.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResponseGateway for ScriptedGateway {
    async fn acknowledge(
        &self,
        id: &ActionId,
        content: &ReplyContent,
        ephemeral: bool,
    ) -> GatewayResult<()> {
        self.record(GatewayCallKind::Acknowledge, id, Some(content), Some(ephemeral))
    }

    async fn acknowledge_deferred(&self, id: &ActionId, ephemeral: bool) -> GatewayResult<()> {
        self.record(GatewayCallKind::AcknowledgeDeferred, id, None, Some(ephemeral))
    }

    async fn edit(&self, id: &ActionId, content: &ReplyContent) -> GatewayResult<()> {
        self.record(GatewayCallKind::Edit, id, Some(content), None)
    }

    async fn follow_up(
        &self,
        id: &ActionId,
        content: &ReplyContent,
        ephemeral: bool,
    ) -> GatewayResult<()> {
        self.record(GatewayCallKind::FollowUp, id, Some(content), Some(ephemeral))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulatedClock;

    #[tokio::test]
    async fn records_calls_with_timestamps() {
        let clock = SimulatedClock::shared();
        let gateway = ScriptedGateway::new(clock.clone());
        let id: ActionId = "1".parse().unwrap();

        gateway
            .acknowledge(&id, &ReplyContent::text("hi"), true)
            .await
            .unwrap();
        clock.advance(std::time::Duration::from_millis(300));
        gateway.edit(&id, &ReplyContent::text("done")).await.unwrap();

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].kind, GatewayCallKind::Acknowledge);
        assert_eq!(calls[0].text.as_deref(), Some("hi"));
        assert_eq!((calls[1].at - calls[0].at).num_milliseconds(), 300);
        assert_eq!(gateway.ack_attempts(&id), 1);
    }

    #[tokio::test]
    async fn scripted_failures_consume_in_order() {
        let gateway = ScriptedGateway::new(SimulatedClock::shared());
        let id: ActionId = "1".parse().unwrap();
        gateway.fail_next(GatewayError::UnknownAction {
            action_id: "1".into(),
        });

        let first = gateway.acknowledge_deferred(&id, true).await;
        assert!(matches!(first, Err(GatewayError::UnknownAction { .. })));

        let second = gateway.acknowledge_deferred(&id, true).await;
        assert!(second.is_ok());
        assert_eq!(gateway.call_count(), 2);
    }
}
