//! Outbound collaborators of the booking handler.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::booking::{BookingId, BookingRecord};
use crate::errors::ApplicationError;

/// Durable storage for completed bookings.
///
/// Implementations write the structured record and the blob copy in sequence;
/// no atomicity is promised across the two.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn save(&self, record: &BookingRecord) -> Result<BookingId, ApplicationError>;
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), ApplicationError>;
}

#[async_trait]
impl<T> PersistenceGateway for Arc<T>
where
    T: PersistenceGateway + ?Sized,
{
    async fn save(&self, record: &BookingRecord) -> Result<BookingId, ApplicationError> {
        (**self).save(record).await
    }
}

#[async_trait]
impl<T> NotificationChannel for Arc<T>
where
    T: NotificationChannel + ?Sized,
{
    async fn publish(&self, subject: &str, message: &str) -> Result<(), ApplicationError> {
        (**self).publish(subject, message).await
    }
}

#[derive(Clone, Default)]
pub struct InMemoryGateway {
    records: Arc<Mutex<Vec<BookingRecord>>>,
    failure: Option<String>,
}

impl InMemoryGateway {
    /// A gateway whose every save fails with the given persistence message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { records: Arc::default(), failure: Some(message.into()) }
    }

    pub fn records(&self) -> Vec<BookingRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn save(&self, record: &BookingRecord) -> Result<BookingId, ApplicationError> {
        if let Some(message) = &self.failure {
            return Err(ApplicationError::Persistence(message.clone()));
        }
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
        Ok(record.id.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedNotification {
    pub subject: String,
    pub message: String,
}

#[derive(Clone, Default)]
pub struct InMemoryNotificationChannel {
    published: Arc<Mutex<Vec<PublishedNotification>>>,
}

impl InMemoryNotificationChannel {
    pub fn published(&self) -> Vec<PublishedNotification> {
        match self.published.lock() {
            Ok(published) => published.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl NotificationChannel for InMemoryNotificationChannel {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), ApplicationError> {
        let notification =
            PublishedNotification { subject: subject.to_owned(), message: message.to_owned() };
        match self.published.lock() {
            Ok(mut published) => published.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
        Ok(())
    }
}
