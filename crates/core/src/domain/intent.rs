use serde::{Deserialize, Serialize};

use crate::domain::slots::{SessionAttributes, SlotSet};

pub const BOOK_FLIGHT_INTENT: &str = "BookFlight";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationSource {
    DialogCodeHook,
    FulfillmentCodeHook,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentIntent {
    pub name: String,
    #[serde(default)]
    pub slots: SlotSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_status: Option<String>,
}

/// One dialog turn as delivered by the conversational agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub bot: BotIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub invocation_source: InvocationSource,
    pub current_intent: CurrentIntent,
    #[serde(default)]
    pub session_attributes: Option<SessionAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_version: Option<String>,
}

impl IntentRequest {
    pub fn intent_name(&self) -> &str {
        &self.current_intent.name
    }

    /// Session attributes, empty when the caller sent none.
    pub fn session(&self) -> SessionAttributes {
        self.session_attributes.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{IntentRequest, InvocationSource};
    use crate::domain::slots::SlotName;

    #[test]
    fn decodes_dialog_engine_event() {
        let request: IntentRequest = serde_json::from_value(json!({
            "messageVersion": "1.0",
            "invocationSource": "DialogCodeHook",
            "userId": "user-1",
            "sessionAttributes": null,
            "bot": { "name": "FlightBooker", "alias": "$LATEST", "version": "$LATEST" },
            "outputDialogMode": "Text",
            "currentIntent": {
                "name": "BookFlight",
                "slots": { "SeatTypes": "Business", "PassengerPhone": null },
                "confirmationStatus": "None"
            },
            "inputTranscript": "business please"
        }))
        .expect("event should decode");

        assert_eq!(request.invocation_source, InvocationSource::DialogCodeHook);
        assert_eq!(request.intent_name(), "BookFlight");
        assert_eq!(request.current_intent.slots.get(SlotName::SeatTypes), Some("Business"));
        assert!(request.session().is_empty());
        assert_eq!(request.bot.name, "FlightBooker");
    }

    #[test]
    fn rejects_unknown_invocation_source() {
        let result = serde_json::from_value::<IntentRequest>(json!({
            "invocationSource": "SomethingElse",
            "bot": { "name": "FlightBooker" },
            "currentIntent": { "name": "BookFlight", "slots": {} }
        }));

        assert!(result.is_err());
    }
}
