use async_trait::async_trait;
use thiserror::Error;

use flightbook_core::domain::booking::{BookingId, BookingRecord};

pub mod booking;
pub mod memory;

pub use booking::SqlBookingRepository;
pub use memory::InMemoryBookingRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<BookingRecord>, RepositoryError>;
    /// Inserts the record, or replaces the row already stored under its id.
    async fn save(&self, record: &BookingRecord) -> Result<(), RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}
