//! Repository for `bookings`, `guests` and `additional_services`.

use bookops_core::reminders::CANCELLED_BOOKING_STATUSES;
use bookops_core::types::DbId;
use chrono::NaiveDate;
use sqlx::PgExecutor;

use crate::models::booking::{ActiveBooking, AdditionalService, Booking, Guest};

/// Column list for `bookings` SELECT queries.
const COLUMNS: &str = "\
    id::BIGINT AS id, \
    reservierungsnummer::TEXT AS reservierungsnummer, \
    checkin_date::DATE AS checkin_date, \
    checkout_date::DATE AS checkout_date, \
    anzahl_naechte::BIGINT AS anzahl_naechte, \
    COALESCE(grundpreis, 0)::FLOAT8 AS grundpreis, \
    COALESCE(services_preis, 0)::FLOAT8 AS services_preis, \
    COALESCE(rabatt_preis, 0)::FLOAT8 AS rabatt_preis, \
    COALESCE(gesamtpreis, 0)::FLOAT8 AS gesamtpreis, \
    guest_id::BIGINT AS guest_id, \
    room_id::BIGINT AS room_id, \
    status::TEXT AS status";

pub struct BookingRepo;

impl BookingRepo {
    pub async fn find<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// The lowest-id booking that is not cancelled, with its guest's name.
    pub async fn first_active<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Option<ActiveBooking>, sqlx::Error> {
        let cancelled: Vec<String> = CANCELLED_BOOKING_STATUSES
            .iter()
            .map(|s| s.to_string())
            .collect();
        sqlx::query_as::<_, ActiveBooking>(
            "SELECT b.id::BIGINT AS id, \
                    b.checkin_date::DATE AS checkin_date, \
                    b.status::TEXT AS status, \
                    g.id::BIGINT AS guest_id, \
                    g.vorname::TEXT AS vorname, \
                    g.nachname::TEXT AS nachname \
             FROM bookings b \
             JOIN guests g ON b.guest_id = g.id \
             WHERE COALESCE(b.status, '') <> ALL($1) \
             ORDER BY b.id \
             LIMIT 1",
        )
        .bind(cancelled)
        .fetch_optional(executor)
        .await
    }

    /// The lowest booking id, used to attach a throwaway reminder when firing
/// triggers.
    pub async fn first_id<'e, E: PgExecutor<'e>>(executor: E) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id::BIGINT FROM bookings ORDER BY id LIMIT 1")
            .fetch_optional(executor)
            .await
    }

    /// Move a booking's check-in date. Returns the number of rows updated.
    pub async fn set_checkin_date<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        checkin_date: NaiveDate,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE bookings SET checkin_date = $2 WHERE id = $1")
            .bind(id)
            .bind(checkin_date)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn guest<'e, E: PgExecutor<'e>>(
        executor: E,
        guest_id: DbId,
    ) -> Result<Option<Guest>, sqlx::Error> {
        sqlx::query_as::<_, Guest>(
            "SELECT id::BIGINT AS id, \
                    vorname::TEXT AS vorname, \
                    nachname::TEXT AS nachname, \
                    COALESCE(dpolg_mitglied, FALSE) AS dpolg_mitglied \
             FROM guests WHERE id = $1",
        )
        .bind(guest_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn services<'e, E: PgExecutor<'e>>(
        executor: E,
        booking_id: DbId,
    ) -> Result<Vec<AdditionalService>, sqlx::Error> {
        sqlx::query_as::<_, AdditionalService>(
            "SELECT service_name::TEXT AS service_name, \
                    price_type::TEXT AS price_type, \
                    original_value::FLOAT8 AS original_value, \
                    COALESCE(calculated_price, 0)::FLOAT8 AS calculated_price \
             FROM additional_services \
             WHERE booking_id = $1 \
             ORDER BY id",
        )
        .bind(booking_id)
        .fetch_all(executor)
        .await
    }
}
