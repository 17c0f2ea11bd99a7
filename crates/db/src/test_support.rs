use flightbook_core::domain::booking::BookingRecord;
use flightbook_core::domain::slots::{SlotName, SlotSet};

pub fn complete_slots(seat_type: &str) -> SlotSet {
    SlotSet::new()
        .with(SlotName::FlightOut, "2026-12-18")
        .with(SlotName::FlightBack, "2027-01-03")
        .with(SlotName::FromAirportCode, "BOS")
        .with(SlotName::ToAirportCode, "SFO")
        .with(SlotName::SeatTypes, seat_type)
        .with(SlotName::NumberOfCheckedBags, "2")
        .with(SlotName::PassengerFirstName, "Rui")
        .with(SlotName::PassengerLastName, "Okafor")
        .with(SlotName::PassengerDob, "1984-02-29")
        .with(SlotName::PassengerEmailAddress, "rui.okafor@example.com")
        .with(SlotName::PassengerPhone, "2125550147")
}

pub fn sample_record(seat_type: &str) -> BookingRecord {
    match BookingRecord::from_slots(&complete_slots(seat_type)) {
        Ok(record) => record,
        Err(error) => panic!("fixture slots must build a record: {error}"),
    }
}
