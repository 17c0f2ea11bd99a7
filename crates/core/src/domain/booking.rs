use std::fmt;

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::slots::{SlotName, SlotSet};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub Uuid);

impl BookingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatClass {
    Economy,
    EconomyPlus,
    Business,
    FirstClass,
}

impl SeatClass {
    pub const ALL: [SeatClass; 4] =
        [SeatClass::Economy, SeatClass::EconomyPlus, SeatClass::Business, SeatClass::FirstClass];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::EconomyPlus => "economy plus",
            Self::Business => "business",
            Self::FirstClass => "first class",
        }
    }

    /// Case-insensitive match against the offered seat classes.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.to_lowercase();
        Self::ALL.into_iter().find(|class| class.as_str() == lowered)
    }
}

/// A completed flight booking, built once on the fulfillment turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: BookingId,
    pub flight_out: String,
    pub flight_back: String,
    pub from_airport_code: String,
    pub to_airport_code: String,
    pub seat_type: String,
    pub checked_bags: u32,
    pub passenger_first_name: String,
    pub passenger_last_name: String,
    pub passenger_dob: String,
    pub passenger_email: String,
    pub passenger_phone: String,
    pub recorded_at: DateTime<FixedOffset>,
}

impl BookingRecord {
    /// Builds a record with a fresh id. Every BookFlight slot must be present.
    ///
    /// The seat type is taken as given; it is checked on dialog turns only.
    pub fn from_slots(slots: &SlotSet) -> Result<Self, DomainError> {
        let missing = slots.missing(&SlotName::BOOK_FLIGHT);
        if !missing.is_empty() {
            return Err(DomainError::IncompleteBooking { missing });
        }

        let value = |slot: SlotName| slots.get(slot).unwrap_or_default().to_owned();
        let bags_raw = value(SlotName::NumberOfCheckedBags);
        let checked_bags = bags_raw.trim().parse::<u32>().map_err(|_| {
            DomainError::InvalidSlotValue { slot: SlotName::NumberOfCheckedBags, value: bags_raw }
        })?;

        Ok(Self {
            id: BookingId::generate(),
            flight_out: value(SlotName::FlightOut),
            flight_back: value(SlotName::FlightBack),
            from_airport_code: value(SlotName::FromAirportCode),
            to_airport_code: value(SlotName::ToAirportCode),
            seat_type: value(SlotName::SeatTypes),
            checked_bags,
            passenger_first_name: value(SlotName::PassengerFirstName),
            passenger_last_name: value(SlotName::PassengerLastName),
            passenger_dob: value(SlotName::PassengerDob),
            passenger_email: value(SlotName::PassengerEmailAddress),
            passenger_phone: value(SlotName::PassengerPhone),
            recorded_at: Local::now().fixed_offset(),
        })
    }

    pub fn passenger_full_name(&self) -> String {
        format!("{} {}", self.passenger_first_name, self.passenger_last_name)
    }
}
