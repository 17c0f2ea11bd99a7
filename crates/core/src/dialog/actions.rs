//! Response envelopes returned to the dialog engine.
//!
//! The constructors here do no validation; they only shape the reply.

use serde::{Deserialize, Serialize};

use crate::domain::slots::{SessionAttributes, SlotName, SlotSet};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    PlainText,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content_type: ContentType,
    pub content: String,
}

impl Message {
    pub fn plain(content: impl Into<String>) -> Self {
        Self { content_type: ContentType::PlainText, content: content.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentState {
    Fulfilled,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum DialogAction {
    ElicitSlot { intent_name: String, slots: SlotSet, slot_to_elicit: SlotName, message: Message },
    ConfirmIntent { intent_name: String, slots: SlotSet, message: Message },
    Delegate { slots: SlotSet },
    Close { fulfillment_state: FulfillmentState, message: Message },
}

impl DialogAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ElicitSlot { .. } => "ElicitSlot",
            Self::ConfirmIntent { .. } => "ConfirmIntent",
            Self::Delegate { .. } => "Delegate",
            Self::Close { .. } => "Close",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogResponse {
    pub session_attributes: SessionAttributes,
    pub dialog_action: DialogAction,
}

pub fn elicit_slot(
    session_attributes: SessionAttributes,
    intent_name: impl Into<String>,
    slots: SlotSet,
    slot_to_elicit: SlotName,
    message: Message,
) -> DialogResponse {
    DialogResponse {
        session_attributes,
        dialog_action: DialogAction::ElicitSlot {
            intent_name: intent_name.into(),
            slots,
            slot_to_elicit,
            message,
        },
    }
}

pub fn confirm_intent(
    session_attributes: SessionAttributes,
    intent_name: impl Into<String>,
    slots: SlotSet,
    message: Message,
) -> DialogResponse {
    DialogResponse {
        session_attributes,
        dialog_action: DialogAction::ConfirmIntent {
            intent_name: intent_name.into(),
            slots,
            message,
        },
    }
}

pub fn delegate(session_attributes: SessionAttributes, slots: SlotSet) -> DialogResponse {
    DialogResponse { session_attributes, dialog_action: DialogAction::Delegate { slots } }
}

pub fn close(
    session_attributes: SessionAttributes,
    fulfillment_state: FulfillmentState,
    message: Message,
) -> DialogResponse {
    DialogResponse {
        session_attributes,
        dialog_action: DialogAction::Close { fulfillment_state, message },
    }
}
