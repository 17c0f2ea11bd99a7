use serde::{Deserialize, Serialize};

use crate::dialog::actions::Message;
use crate::domain::booking::SeatClass;
use crate::domain::slots::{SlotName, SlotSet};

pub const SEAT_CLASS_REPROMPT: &str = "I did not recognize that Class Seat type.  Which class seat will be selected for this flight? (Economy, Economy Plus, Business, First) ";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violated_slot: Option<SlotName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self { is_valid: true, violated_slot: None, message: None }
    }

    pub fn invalid(slot: SlotName, message: impl Into<String>) -> Self {
        Self { is_valid: false, violated_slot: Some(slot), message: Some(Message::plain(message)) }
    }
}

/// Checks slot values on dialog turns.
///
/// Only the seat class is checked. Absent slots are never an error here; the
/// dialog engine elicits them on its own.
#[derive(Clone, Debug, Default)]
pub struct SlotValidator;

impl SlotValidator {
    pub fn validate(&self, slots: &SlotSet) -> ValidationResult {
        validate(slots)
    }
}

pub fn validate(slots: &SlotSet) -> ValidationResult {
    match slots.get(SlotName::SeatTypes) {
        Some(seat_type) if !seat_type.is_empty() && SeatClass::parse(seat_type).is_none() => {
            ValidationResult::invalid(SlotName::SeatTypes, SEAT_CLASS_REPROMPT)
        }
        _ => ValidationResult::valid(),
    }
}
