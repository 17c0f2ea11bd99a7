use serde::{Deserialize, Serialize};

use crate::domain::intent::InvocationSource;
use crate::domain::slots::SlotName;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogPhase {
    Eliciting,
    Fulfilling,
}

impl From<InvocationSource> for DialogPhase {
    fn from(source: InvocationSource) -> Self {
        match source {
            InvocationSource::DialogCodeHook => Self::Eliciting,
            InvocationSource::FulfillmentCodeHook => Self::Fulfilling,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogEvent {
    SlotsAccepted,
    SlotRejected(SlotName),
    FulfillmentRequested,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogStep {
    ElicitSlot(SlotName),
    DelegateToEngine,
    PersistBooking,
    CloseFulfilled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: DialogPhase,
    pub to: DialogPhase,
    pub event: DialogEvent,
    pub steps: Vec<DialogStep>,
}
