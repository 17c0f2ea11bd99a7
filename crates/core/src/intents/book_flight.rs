use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink,
};
use crate::dialog::{
    close, delegate, elicit_slot, DialogResponse, FulfillmentState, Message, SlotValidator,
    ValidationResult,
};
use crate::domain::booking::BookingRecord;
use crate::domain::intent::{IntentRequest, BOOK_FLIGHT_INTENT};
use crate::domain::slots::{SlotName, SlotSet};
use crate::errors::{ApplicationError, DomainError};
use crate::flows::{DialogEvent, DialogPhase, DialogStep, FlowEngine};
use crate::gateway::{NotificationChannel, PersistenceGateway};
use crate::intents::{IntentHandler, TurnContext};

const ACTOR: &str = "book-flight";

/// Handles BookFlight turns: validates on dialog turns, persists on fulfillment.
pub struct BookFlightHandler {
    gateway: Arc<dyn PersistenceGateway>,
    notifier: Arc<dyn NotificationChannel>,
    audit: Arc<dyn AuditSink>,
    validator: SlotValidator,
    flow: FlowEngine,
}

impl BookFlightHandler {
    pub fn new<G, N>(gateway: G, notifier: N) -> Self
    where
        G: PersistenceGateway + 'static,
        N: NotificationChannel + 'static,
    {
        Self {
            gateway: Arc::new(gateway),
            notifier: Arc::new(notifier),
            audit: Arc::new(TracingAuditSink),
            validator: SlotValidator,
            flow: FlowEngine,
        }
    }

    pub fn with_audit_sink<S>(mut self, sink: S) -> Self
    where
        S: AuditSink + 'static,
    {
        self.audit = Arc::new(sink);
        self
    }

    /// Sends an operator alert through the injected channel.
    pub async fn alert_admin(&self, subject: &str, message: &str) -> Result<(), ApplicationError> {
        self.notifier.publish(subject, message).await
    }

    async fn persist(
        &self,
        slots: &SlotSet,
        audit: &AuditContext,
    ) -> Result<BookingRecord, ApplicationError> {
        let record = BookingRecord::from_slots(slots)?;
        let audit = audit.with_booking(record.id.clone());

        match self.gateway.save(&record).await {
            Ok(booking_id) => {
                info!(
                    event_name = "booking.persisted",
                    correlation_id = %audit.correlation_id,
                    booking_id = %booking_id,
                    "flight booking recorded"
                );
                self.audit.emit(AuditEvent::new(
                    &audit,
                    "booking.persisted",
                    AuditCategory::Persistence,
                    AuditOutcome::Success,
                ));
                Ok(record)
            }
            Err(failure) => {
                error!(
                    event_name = "booking.persist_failed",
                    correlation_id = %audit.correlation_id,
                    booking_id = %record.id,
                    error = %failure,
                    "flight booking could not be recorded"
                );
                self.audit.emit(
                    AuditEvent::new(
                        &audit,
                        "booking.persist_failed",
                        AuditCategory::Persistence,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("error", failure.to_string()),
                );
                Err(failure)
            }
        }
    }
}

#[async_trait]
impl IntentHandler for BookFlightHandler {
    fn intent_name(&self) -> &str {
        BOOK_FLIGHT_INTENT
    }

    async fn handle(
        &self,
        request: &IntentRequest,
        ctx: &TurnContext,
    ) -> Result<DialogResponse, ApplicationError> {
        let phase = DialogPhase::from(request.invocation_source);
        let session = request.session();
        let mut slots = request.current_intent.slots.clone();
        let audit =
            AuditContext::new(None, request.user_id.clone(), ctx.correlation_id.clone(), ACTOR);

        debug!(
            event_name = "dialog.turn.received",
            correlation_id = %ctx.correlation_id,
            invocation_source = ?request.invocation_source,
            "book flight turn received"
        );

        let mut validation = ValidationResult::valid();
        let event = match phase {
            DialogPhase::Eliciting => {
                validation = self.validator.validate(&slots);
                debug!(
                    event_name = "dialog.slots.validated",
                    correlation_id = %ctx.correlation_id,
                    is_valid = validation.is_valid,
                    violated_slot = ?validation.violated_slot,
                    "slot validation finished"
                );
                match (validation.is_valid, validation.violated_slot) {
                    (false, Some(slot)) => DialogEvent::SlotRejected(slot),
                    _ => DialogEvent::SlotsAccepted,
                }
            }
            DialogPhase::Fulfilling => DialogEvent::FulfillmentRequested,
        };

        let outcome = self
            .flow
            .apply_with_audit(&phase, &event, self.audit.as_ref(), &audit)
            .map_err(DomainError::from)?;

        let mut response = None;
        for step in outcome.steps {
            match step {
                DialogStep::ElicitSlot(slot) => {
                    slots.clear(slot);
                    let message = validation
                        .message
                        .clone()
                        .unwrap_or_else(|| Message::plain(format!("Please provide {slot}.")));
                    response = Some(elicit_slot(
                        session.clone(),
                        request.intent_name(),
                        slots.clone(),
                        slot,
                        message,
                    ));
                }
                DialogStep::DelegateToEngine => {
                    response = Some(delegate(session.clone(), slots.clone()));
                }
                DialogStep::PersistBooking => {
                    self.persist(&slots, &audit).await?;
                }
                DialogStep::CloseFulfilled => {
                    let content = format!(
                        "Thanks {} {}, we have recorded your booking request",
                        slots.get(SlotName::PassengerFirstName).unwrap_or_default(),
                        slots.get(SlotName::PassengerLastName).unwrap_or_default(),
                    );
                    response = Some(close(
                        session.clone(),
                        FulfillmentState::Fulfilled,
                        Message::plain(content),
                    ));
                }
            }
        }

        response.ok_or_else(|| {
            ApplicationError::Configuration(format!(
                "dialog flow produced no response for {phase:?}"
            ))
        })
    }
}
