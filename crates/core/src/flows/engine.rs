use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::flows::states::{DialogEvent, DialogPhase, DialogStep, TransitionOutcome};

/// Drives the BookFlight dialog between its two phases.
#[derive(Clone, Debug, Default)]
pub struct FlowEngine;

impl FlowEngine {
    pub fn apply(
        &self,
        current: &DialogPhase,
        event: &DialogEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_book_flight(current, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &DialogPhase,
        event: &DialogEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "flow.transition_applied",
                        AuditCategory::Flow,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "flow.transition_rejected",
                        AuditCategory::Flow,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {phase:?} using event {event:?}")]
    InvalidTransition { phase: DialogPhase, event: DialogEvent },
}

fn transition_book_flight(
    current: &DialogPhase,
    event: &DialogEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use DialogEvent::{FulfillmentRequested, SlotRejected, SlotsAccepted};
    use DialogPhase::{Eliciting, Fulfilling};
    use DialogStep::{CloseFulfilled, DelegateToEngine, ElicitSlot, PersistBooking};

    let (to, steps) = match (current, event) {
        (Eliciting, SlotRejected(slot)) => (Eliciting, vec![ElicitSlot(*slot)]),
        (Eliciting, SlotsAccepted) => (Eliciting, vec![DelegateToEngine]),
        (Fulfilling, FulfillmentRequested) => (Fulfilling, vec![PersistBooking, CloseFulfilled]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                phase: current.clone(),
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.clone(), to, event: event.clone(), steps })
}
