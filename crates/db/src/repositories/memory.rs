use std::collections::HashMap;

use tokio::sync::RwLock;

use flightbook_core::domain::booking::{BookingId, BookingRecord};

use super::{BookingRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<BookingId, BookingRecord>>,
}

#[async_trait::async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<BookingRecord>, RepositoryError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(id).cloned())
    }

    async fn save(&self, record: &BookingRecord) -> Result<(), RepositoryError> {
        let mut bookings = self.bookings.write().await;
        bookings.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.bookings.read().await.len() as u64)
    }
}
