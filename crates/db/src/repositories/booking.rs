use chrono::DateTime;
use sqlx::Row;
use uuid::Uuid;

use flightbook_core::domain::booking::{BookingId, BookingRecord};

use super::{BookingRepository, RepositoryError};
use crate::DbPool;

pub struct SqlBookingRepository {
    pool: DbPool,
}

impl SqlBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(result: Result<T, sqlx::Error>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_booking(row: &sqlx::sqlite::SqliteRow) -> Result<BookingRecord, RepositoryError> {
    let id: String = decode(row.try_get("id"))?;
    let checked_bags: i64 = decode(row.try_get("checked_bags"))?;
    let recorded_at: String = decode(row.try_get("recorded_at"))?;

    let id = Uuid::parse_str(&id)
        .map_err(|e| RepositoryError::Decode(format!("booking id `{id}`: {e}")))?;
    let checked_bags = u32::try_from(checked_bags).map_err(|_| {
        RepositoryError::Decode(format!("checked_bags out of range: {checked_bags}"))
    })?;
    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
        .map_err(|e| RepositoryError::Decode(format!("recorded_at `{recorded_at}`: {e}")))?;

    Ok(BookingRecord {
        id: BookingId(id),
        flight_out: decode(row.try_get("flight_out"))?,
        flight_back: decode(row.try_get("flight_back"))?,
        from_airport_code: decode(row.try_get("from_airport_code"))?,
        to_airport_code: decode(row.try_get("to_airport_code"))?,
        seat_type: decode(row.try_get("seat_type"))?,
        checked_bags,
        passenger_first_name: decode(row.try_get("passenger_first_name"))?,
        passenger_last_name: decode(row.try_get("passenger_last_name"))?,
        passenger_dob: decode(row.try_get("passenger_dob"))?,
        passenger_email: decode(row.try_get("passenger_email"))?,
        passenger_phone: decode(row.try_get("passenger_phone"))?,
        recorded_at,
    })
}

#[async_trait::async_trait]
impl BookingRepository for SqlBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<BookingRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, flight_out, flight_back, from_airport_code, to_airport_code, seat_type,
                    checked_bags, passenger_first_name, passenger_last_name, passenger_dob,
                    passenger_email, passenger_phone, recorded_at
             FROM flight_booking WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: &BookingRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO flight_booking (id, flight_out, flight_back, from_airport_code,
                                         to_airport_code, seat_type, checked_bags,
                                         passenger_first_name, passenger_last_name, passenger_dob,
                                         passenger_email, passenger_phone, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 flight_out = excluded.flight_out,
                 flight_back = excluded.flight_back,
                 from_airport_code = excluded.from_airport_code,
                 to_airport_code = excluded.to_airport_code,
                 seat_type = excluded.seat_type,
                 checked_bags = excluded.checked_bags,
                 passenger_first_name = excluded.passenger_first_name,
                 passenger_last_name = excluded.passenger_last_name,
                 passenger_dob = excluded.passenger_dob,
                 passenger_email = excluded.passenger_email,
                 passenger_phone = excluded.passenger_phone,
                 recorded_at = excluded.recorded_at",
        )
        .bind(record.id.to_string())
        .bind(&record.flight_out)
        .bind(&record.flight_back)
        .bind(&record.from_airport_code)
        .bind(&record.to_airport_code)
        .bind(&record.seat_type)
        .bind(i64::from(record.checked_bags))
        .bind(&record.passenger_first_name)
        .bind(&record.passenger_last_name)
        .bind(&record.passenger_dob)
        .bind(&record.passenger_email)
        .bind(&record.passenger_phone)
        .bind(record.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM flight_booking").fetch_one(&self.pool).await?;
        u64::try_from(count).map_err(|_| RepositoryError::Decode(format!("negative count {count}")))
    }
}
