use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Slots of the BookFlight intent, serialized under their dialog-engine names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotName {
    FlightOut,
    FlightBack,
    FromAirportCode,
    ToAirportCode,
    SeatTypes,
    #[serde(rename = "NumberofCheckedBags")]
    NumberOfCheckedBags,
    PassengerFirstName,
    PassengerLastName,
    #[serde(rename = "PassengerDOB")]
    PassengerDob,
    PassengerEmailAddress,
    PassengerPhone,
}

impl SlotName {
    pub const BOOK_FLIGHT: [SlotName; 11] = [
        SlotName::FlightOut,
        SlotName::FlightBack,
        SlotName::FromAirportCode,
        SlotName::ToAirportCode,
        SlotName::SeatTypes,
        SlotName::NumberOfCheckedBags,
        SlotName::PassengerFirstName,
        SlotName::PassengerLastName,
        SlotName::PassengerDob,
        SlotName::PassengerEmailAddress,
        SlotName::PassengerPhone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlightOut => "FlightOut",
            Self::FlightBack => "FlightBack",
            Self::FromAirportCode => "FromAirportCode",
            Self::ToAirportCode => "ToAirportCode",
            Self::SeatTypes => "SeatTypes",
            Self::NumberOfCheckedBags => "NumberofCheckedBags",
            Self::PassengerFirstName => "PassengerFirstName",
            Self::PassengerLastName => "PassengerLastName",
            Self::PassengerDob => "PassengerDOB",
            Self::PassengerEmailAddress => "PassengerEmailAddress",
            Self::PassengerPhone => "PassengerPhone",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::BOOK_FLIGHT.into_iter().find(|slot| slot.as_str() == raw)
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot values for the current turn, keyed by wire name, in arrival order.
///
/// Keys the dialog engine sends that are not BookFlight slots are kept so they
/// round-trip back to the engine unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotSet(IndexMap<String, Option<String>>);

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `slot`, or `None` when the key is absent or explicitly null.
    pub fn get(&self, slot: SlotName) -> Option<&str> {
        self.0.get(slot.as_str()).and_then(|value| value.as_deref())
    }

    pub fn set(&mut self, slot: SlotName, value: impl Into<String>) {
        self.0.insert(slot.as_str().to_owned(), Some(value.into()));
    }

    /// Nulls the slot so the dialog engine elicits it again.
    pub fn clear(&mut self, slot: SlotName) {
        self.0.insert(slot.as_str().to_owned(), None);
    }

    pub fn with(mut self, slot: SlotName, value: impl Into<String>) -> Self {
        self.set(slot, value);
        self
    }

    pub fn missing(&self, required: &[SlotName]) -> Vec<SlotName> {
        required.iter().copied().filter(|slot| self.get(*slot).is_none()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_deref()))
    }
}

/// Caller-owned session state. Passed back exactly as received.
pub type SessionAttributes = BTreeMap<String, String>;
