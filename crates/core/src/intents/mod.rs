//! Intent routing.
//!
//! The dispatcher owns one handler per intent name. Turns for any other
//! intent are refused with `DomainError::UnsupportedIntent`; no dialog action
//! is produced for them.

pub mod book_flight;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::dialog::DialogResponse;
use crate::domain::intent::IntentRequest;
use crate::errors::{ApplicationError, DomainError};
use crate::gateway::{NotificationChannel, PersistenceGateway};

pub use book_flight::BookFlightHandler;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnContext {
    pub correlation_id: String,
}

impl TurnContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into() }
    }
}

impl Default for TurnContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[async_trait]
pub trait IntentHandler: Send + Sync {
    fn intent_name(&self) -> &str;
    async fn handle(
        &self,
        request: &IntentRequest,
        ctx: &TurnContext,
    ) -> Result<DialogResponse, ApplicationError>;
}

#[derive(Default)]
pub struct IntentDispatcher {
    handlers: HashMap<String, Arc<dyn IntentHandler>>,
}

impl IntentDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher serving the BookFlight intent.
    pub fn book_flight<G, N>(gateway: G, notifier: N) -> Self
    where
        G: PersistenceGateway + 'static,
        N: NotificationChannel + 'static,
    {
        let mut dispatcher = Self::new();
        dispatcher.register(BookFlightHandler::new(gateway, notifier));
        dispatcher
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: IntentHandler + 'static,
    {
        self.handlers.insert(handler.intent_name().to_owned(), Arc::new(handler));
    }

    pub fn supports(&self, intent_name: &str) -> bool {
        self.handlers.contains_key(intent_name)
    }

    pub async fn dispatch(
        &self,
        request: &IntentRequest,
        ctx: &TurnContext,
    ) -> Result<DialogResponse, ApplicationError> {
        let intent_name = request.intent_name();
        debug!(
            event_name = "dialog.turn.dispatched",
            correlation_id = %ctx.correlation_id,
            user_id = request.user_id.as_deref().unwrap_or("unknown"),
            intent_name = %intent_name,
            "dispatching intent turn"
        );

        let Some(handler) = self.handlers.get(intent_name) else {
            let intent_name = intent_name.to_owned();
            return Err(DomainError::UnsupportedIntent { intent_name }.into());
        };

        handler.handle(request, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{IntentDispatcher, IntentHandler, TurnContext};
    use crate::dialog::{close, DialogResponse, FulfillmentState, Message};
    use crate::domain::booking::fixtures::complete_slots;
    use crate::domain::intent::{BotIdentity, CurrentIntent, IntentRequest, InvocationSource};
    use crate::domain::slots::SessionAttributes;
    use crate::errors::{ApplicationError, DomainError};
    use crate::gateway::{InMemoryGateway, InMemoryNotificationChannel};

    fn turn(intent_name: &str, source: InvocationSource) -> IntentRequest {
        IntentRequest {
            bot: BotIdentity { name: "FlightBooker".to_owned(), ..BotIdentity::default() },
            user_id: None,
            invocation_source: source,
            current_intent: CurrentIntent {
                name: intent_name.to_owned(),
                slots: complete_slots("Business"),
                confirmation_status: None,
            },
            session_attributes: None,
            input_transcript: None,
            message_version: None,
        }
    }

    struct GreetingHandler;

    #[async_trait]
    impl IntentHandler for GreetingHandler {
        fn intent_name(&self) -> &str {
            "Greeting"
        }

        async fn handle(
            &self,
            _request: &IntentRequest,
            _ctx: &TurnContext,
        ) -> Result<DialogResponse, ApplicationError> {
            Ok(close(SessionAttributes::new(), FulfillmentState::Fulfilled, Message::plain("hi")))
        }
    }

    #[tokio::test]
    async fn book_flight_turns_are_routed() {
        let gateway = Arc::new(InMemoryGateway::default());
        let dispatcher =
            IntentDispatcher::book_flight(gateway.clone(), InMemoryNotificationChannel::default());

        let request = turn("BookFlight", InvocationSource::FulfillmentCodeHook);
        let response = dispatcher
            .dispatch(&request, &TurnContext::default())
            .await
            .expect("book flight is supported");

        assert_eq!(response.dialog_action.kind(), "Close");
        assert_eq!(gateway.records().len(), 1);
        assert!(dispatcher.supports("BookFlight"));
    }

    #[tokio::test]
    async fn unknown_intent_is_a_fatal_error() {
        let gateway = Arc::new(InMemoryGateway::default());
        let dispatcher =
            IntentDispatcher::book_flight(gateway.clone(), InMemoryNotificationChannel::default());

        let request = turn("CancelFlight", InvocationSource::DialogCodeHook);
        let error = dispatcher
            .dispatch(&request, &TurnContext::default())
            .await
            .expect_err("unsupported intent");

        assert_eq!(
            error,
            ApplicationError::Domain(DomainError::UnsupportedIntent {
                intent_name: "CancelFlight".to_owned()
            })
        );
        assert!(gateway.records().is_empty());
    }

    #[tokio::test]
    async fn registered_handlers_are_selected_by_intent_name() {
        let mut dispatcher = IntentDispatcher::new();
        dispatcher.register(GreetingHandler);

        let response = dispatcher
            .dispatch(&turn("Greeting", InvocationSource::DialogCodeHook), &TurnContext::default())
            .await
            .expect("greeting is registered");

        assert_eq!(response.dialog_action.kind(), "Close");
        assert!(!dispatcher.supports("BookFlight"));
    }
}
