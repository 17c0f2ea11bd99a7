use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use flightbook_core::domain::booking::{BookingId, BookingRecord};
use flightbook_core::errors::ApplicationError;
use flightbook_core::gateway::PersistenceGateway;

use crate::blob::BlobStore;
use crate::repositories::BookingRepository;

pub const DEFAULT_KEY_PREFIX: &str = "flight";

/// JSON copy of a booking as written to the blob store. Every value is a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDocument {
    #[serde(rename = "flightOut")]
    pub flight_out: String,
    #[serde(rename = "flightBack")]
    pub flight_back: String,
    #[serde(rename = "fromAirportcode")]
    pub from_airport_code: String,
    #[serde(rename = "toAirportcode")]
    pub to_airport_code: String,
    #[serde(rename = "seatTypes")]
    pub seat_types: String,
    #[serde(rename = "numberofCheckedBags")]
    pub number_of_checked_bags: String,
    #[serde(rename = "passengerFNAME")]
    pub passenger_first_name: String,
    #[serde(rename = "passengerLNAME")]
    pub passenger_last_name: String,
    #[serde(rename = "passengerDOB")]
    pub passenger_dob: String,
    #[serde(rename = "passengerEmailAddress")]
    pub passenger_email_address: String,
    #[serde(rename = "passengerPhone")]
    pub passenger_phone: String,
}

impl From<&BookingRecord> for BookingDocument {
    fn from(record: &BookingRecord) -> Self {
        Self {
            flight_out: record.flight_out.clone(),
            flight_back: record.flight_back.clone(),
            from_airport_code: record.from_airport_code.clone(),
            to_airport_code: record.to_airport_code.clone(),
            seat_types: record.seat_type.clone(),
            number_of_checked_bags: record.checked_bags.to_string(),
            passenger_first_name: record.passenger_first_name.clone(),
            passenger_last_name: record.passenger_last_name.clone(),
            passenger_dob: record.passenger_dob.clone(),
            passenger_email_address: record.passenger_email.clone(),
            passenger_phone: record.passenger_phone.clone(),
        }
    }
}

/// Writes the structured row first, then the JSON copy. The two writes are not
/// atomic: a blob failure leaves the row in place.
pub struct StoreBackedGateway {
    bookings: Arc<dyn BookingRepository>,
    blobs: Arc<dyn BlobStore>,
    key_prefix: String,
}

impl StoreBackedGateway {
    pub fn new<R, B>(bookings: R, blobs: B) -> Self
    where
        R: BookingRepository + 'static,
        B: BlobStore + 'static,
    {
        Self {
            bookings: Arc::new(bookings),
            blobs: Arc::new(blobs),
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
        }
    }

    pub fn from_shared(bookings: Arc<dyn BookingRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { bookings, blobs, key_prefix: DEFAULT_KEY_PREFIX.to_owned() }
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn blob_key(&self, id: &BookingId) -> String {
        format!("{}/{}.json", self.key_prefix, id)
    }
}

#[async_trait]
impl PersistenceGateway for StoreBackedGateway {
    async fn save(&self, record: &BookingRecord) -> Result<BookingId, ApplicationError> {
        self.bookings.save(record).await.map_err(|e| {
            error!(
                event_name = "persistence.row_write_failed",
                booking_id = %record.id,
                error = %e,
                "booking row write failed"
            );
            ApplicationError::Persistence(format!("booking row write failed: {e}"))
        })?;
        debug!(
            event_name = "persistence.row_written",
            booking_id = %record.id,
            "booking row written"
        );

        let key = self.blob_key(&record.id);
        let body = serde_json::to_vec(&BookingDocument::from(record)).map_err(|e| {
            ApplicationError::Persistence(format!("booking document encoding failed: {e}"))
        })?;
        self.blobs.put(&key, &body).await.map_err(|e| {
            error!(
                event_name = "persistence.blob_write_failed",
                booking_id = %record.id,
                blob_key = %key,
                error = %e,
                "booking blob write failed"
            );
            ApplicationError::Persistence(format!("booking blob write failed: {e}"))
        })?;
        debug!(
            event_name = "persistence.blob_written",
            booking_id = %record.id,
            blob_key = %key,
            "booking blob written"
        );

        Ok(record.id.clone())
    }
}
