//! HTTP entry point for dialog code hook turns.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use flightbook_core::dialog::DialogResponse;
use flightbook_core::domain::intent::IntentRequest;
use flightbook_core::errors::{ApplicationError, InterfaceError};
use flightbook_core::gateway::NotificationChannel;
use flightbook_core::intents::{IntentDispatcher, TurnContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct FulfillmentRouteState {
    pub dispatcher: Arc<IntentDispatcher>,
    pub notifier: Arc<dyn NotificationChannel>,
    pub subject_prefix: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

pub fn router(state: FulfillmentRouteState) -> Router {
    Router::new().route("/v1/fulfillment", post(fulfill)).with_state(state)
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub async fn fulfill(
    State(state): State<FulfillmentRouteState>,
    headers: HeaderMap,
    payload: Result<Json<IntentRequest>, JsonRejection>,
) -> Result<Json<DialogResponse>, (StatusCode, Json<ErrorBody>)> {
    let ctx = TurnContext::new(correlation_id(&headers));
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(
                event_name = "dialog.turn.rejected",
                correlation_id = %ctx.correlation_id,
                error = %rejection.body_text(),
                "fulfillment turn could not be decoded"
            );
            return Err(error_response(InterfaceError::BadRequest {
                message: format!("invalid dialog turn: {}", rejection.body_text()),
                correlation_id: ctx.correlation_id,
            }));
        }
    };
    debug!(
        event_name = "dialog.turn.received",
        correlation_id = %ctx.correlation_id,
        bot_name = %request.bot.name,
        invocation_source = ?request.invocation_source,
        "fulfillment turn received"
    );

    match state.dispatcher.dispatch(&request, &ctx).await {
        Ok(response) => {
            info!(
                event_name = "dialog.turn.completed",
                correlation_id = %ctx.correlation_id,
                intent_name = %request.intent_name(),
                dialog_action = response.dialog_action.kind(),
                "fulfillment turn completed"
            );
            Ok(Json(response))
        }
        Err(failure) => {
            error!(
                event_name = "dialog.turn.failed",
                correlation_id = %ctx.correlation_id,
                intent_name = %request.intent_name(),
                error = %failure,
                "fulfillment turn failed"
            );
            if failure.is_infrastructure() {
                alert_admin(&state, &ctx, &request, &failure).await;
            }
            Err(error_response(failure.into_interface(ctx.correlation_id)))
        }
    }
}

async fn alert_admin(
    state: &FulfillmentRouteState,
    ctx: &TurnContext,
    request: &IntentRequest,
    failure: &ApplicationError,
) {
    let subject = format!("{} {} turn failed", state.subject_prefix, request.intent_name());
    let message = format!(
        "correlation_id={} user_id={} error={failure}",
        ctx.correlation_id,
        request.user_id.as_deref().unwrap_or("unknown"),
    );

    if let Err(alert_error) = state.notifier.publish(&subject, &message).await {
        warn!(
            event_name = "notify.alert_failed",
            correlation_id = %ctx.correlation_id,
            error = %alert_error,
            "admin alert could not be delivered"
        );
    }
}

pub fn error_response(error: InterfaceError) -> (StatusCode, Json<ErrorBody>) {
    let (status, kind) = match &error {
        InterfaceError::BadRequest { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
        InterfaceError::ServiceUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
        }
        InterfaceError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    let message = match &error {
        InterfaceError::BadRequest { message, .. } => message.clone(),
        _ => error.user_message().to_owned(),
    };

    (
        status,
        Json(ErrorBody {
            error: kind.to_owned(),
            message,
            correlation_id: error.correlation_id().to_owned(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use flightbook_core::errors::ApplicationError;
    use flightbook_core::gateway::{
        InMemoryGateway, InMemoryNotificationChannel, NotificationChannel,
    };
    use flightbook_core::intents::IntentDispatcher;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, ErrorBody, FulfillmentRouteState, CORRELATION_HEADER};

    struct BrokenChannel;

    #[async_trait]
    impl NotificationChannel for BrokenChannel {
        async fn publish(&self, _subject: &str, _message: &str) -> Result<(), ApplicationError> {
            Err(ApplicationError::Integration("webhook unreachable".to_owned()))
        }
    }

    fn state(
        gateway: InMemoryGateway,
        notifier: Arc<dyn NotificationChannel>,
    ) -> FulfillmentRouteState {
        FulfillmentRouteState {
            dispatcher: Arc::new(IntentDispatcher::book_flight(gateway, notifier.clone())),
            notifier,
            subject_prefix: "[flightbook]".to_owned(),
        }
    }

    fn complete_slots(seat_type: &str) -> Value {
        json!({
            "FlightOut": "2026-11-20",
            "FlightBack": "2026-11-27",
            "FromAirportCode": "EWR",
            "ToAirportCode": "ORD",
            "SeatTypes": seat_type,
            "NumberofCheckedBags": "1",
            "PassengerFirstName": "Mara",
            "PassengerLastName": "Quist",
            "PassengerDOB": "1979-08-05",
            "PassengerEmailAddress": "mara.quist@example.com",
            "PassengerPhone": "9735550182"
        })
    }

    fn event(intent: &str, source: &str, seat_type: &str) -> Value {
        json!({
            "messageVersion": "1.0",
            "invocationSource": source,
            "userId": "user-42",
            "bot": { "name": "FlightBooker", "alias": "$LATEST", "version": "$LATEST" },
            "currentIntent": {
                "name": intent,
                "slots": complete_slots(seat_type),
                "confirmationStatus": "None"
            },
            "sessionAttributes": { "channel": "web" }
        })
    }

    async fn post(
        state: FulfillmentRouteState,
        body: Value,
        correlation_id: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/fulfillment")
            .header("content-type", "application/json");
        if let Some(id) = correlation_id {
            builder = builder.header(CORRELATION_HEADER, id);
        }
        let response = router(state)
            .oneshot(builder.body(Body::from(body.to_string())).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn dialog_turn_with_valid_seat_delegates() {
        let gateway = InMemoryGateway::default();
        let notifier = Arc::new(InMemoryNotificationChannel::default());
        let request = event("BookFlight", "DialogCodeHook", "Business");
        let (status, body) = post(state(gateway.clone(), notifier), request, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dialogAction"]["type"], "Delegate");
        assert_eq!(body["sessionAttributes"]["channel"], "web");
        assert!(gateway.records().is_empty());
    }

    #[tokio::test]
    async fn dialog_turn_with_unknown_seat_elicits_again() {
        let notifier = Arc::new(InMemoryNotificationChannel::default());
        let (status, body) = post(
            state(InMemoryGateway::default(), notifier),
            event("BookFlight", "DialogCodeHook", "Premium"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dialogAction"]["type"], "ElicitSlot");
        assert_eq!(body["dialogAction"]["slotToElicit"], "SeatTypes");
        assert_eq!(body["dialogAction"]["slots"]["SeatTypes"], Value::Null);
    }

    #[tokio::test]
    async fn fulfillment_turn_persists_and_closes() {
        let gateway = InMemoryGateway::default();
        let notifier = Arc::new(InMemoryNotificationChannel::default());
        let (status, body) = post(
            state(gateway.clone(), notifier),
            event("BookFlight", "FulfillmentCodeHook", "Economy"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dialogAction"]["type"], "Close");
        assert_eq!(body["dialogAction"]["fulfillmentState"], "Fulfilled");
        assert_eq!(gateway.records().len(), 1);
        assert_eq!(gateway.records()[0].checked_bags, 1);
    }

    #[tokio::test]
    async fn unsupported_intent_is_bad_request_with_correlation_id() {
        let notifier = Arc::new(InMemoryNotificationChannel::default());
        let (status, body) = post(
            state(InMemoryGateway::default(), notifier.clone()),
            event("CancelFlight", "DialogCodeHook", "Economy"),
            Some("corr-123"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_value(body).expect("error body");
        assert_eq!(body.error, "bad_request");
        assert_eq!(body.correlation_id, "corr-123");
        assert!(body.message.contains("CancelFlight"));
        assert!(notifier.published().is_empty());
    }

    #[tokio::test]
    async fn undecodable_turn_uses_error_body_with_correlation_id() {
        let gateway = InMemoryGateway::default();
        let notifier = Arc::new(InMemoryNotificationChannel::default());
        let request = event("BookFlight", "Other", "Economy");

        let (status, body) =
            post(state(gateway.clone(), notifier.clone()), request, Some("c-1")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_value(body).expect("error body");
        assert_eq!(body.error, "bad_request");
        assert_eq!(body.correlation_id, "c-1");
        assert!(body.message.contains("invalid dialog turn"));
        assert!(gateway.records().is_empty());
        assert!(notifier.published().is_empty());
    }

    #[tokio::test]
    async fn turn_without_json_content_type_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/fulfillment")
            .body(Body::from(event("BookFlight", "DialogCodeHook", "Economy").to_string()))
            .expect("request");
        let notifier = Arc::new(InMemoryNotificationChannel::default());
        let response = router(state(InMemoryGateway::default(), notifier))
            .oneshot(request)
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: ErrorBody = serde_json::from_slice(&bytes).expect("error body");
        assert!(!body.correlation_id.is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_is_unavailable_and_alerts_admins() {
        let notifier = Arc::new(InMemoryNotificationChannel::default());
        let (status, body) = post(
            state(InMemoryGateway::failing("disk full"), notifier.clone()),
            event("BookFlight", "FulfillmentCodeHook", "Economy"),
            Some("corr-456"),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "service_unavailable");
        assert!(!body["message"].as_str().unwrap_or_default().contains("disk full"));

        let published = notifier.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].subject, "[flightbook] BookFlight turn failed");
        assert!(published[0].message.contains("corr-456"));
        assert!(published[0].message.contains("disk full"));
    }

    #[tokio::test]
    async fn alert_delivery_failure_keeps_turn_error() {
        let (status, body) = post(
            state(InMemoryGateway::failing("disk full"), Arc::new(BrokenChannel)),
            event("BookFlight", "FulfillmentCodeHook", "Economy"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "service_unavailable");
        assert!(!body["correlation_id"].as_str().unwrap_or_default().is_empty());
    }
}
