pub mod blob;
pub mod connection;
pub mod gateway;
pub mod migrations;
pub mod repositories;

pub use blob::{BlobStore, BlobStoreError, FsBlobStore, InMemoryBlobStore};
pub use connection::{connect, connect_with_settings, ping, DbPool};
pub use gateway::{BookingDocument, StoreBackedGateway};
pub use repositories::{
    BookingRepository, InMemoryBookingRepository, RepositoryError, SqlBookingRepository,
};

#[cfg(test)]
pub(crate) mod test_support;
