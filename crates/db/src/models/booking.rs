//! Booking, guest and additional-service rows.

use bookops_core::pricing::BookingPrices;
use bookops_core::types::DbId;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A booking with its price breakdown.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub reservierungsnummer: Option<String>,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub anzahl_naechte: Option<i64>,
    pub grundpreis: f64,
    pub services_preis: f64,
    pub rabatt_preis: f64,
    pub gesamtpreis: f64,
    pub guest_id: Option<DbId>,
    pub room_id: Option<DbId>,
    pub status: Option<String>,
}

impl Booking {
    pub fn prices(&self) -> BookingPrices {
        BookingPrices {
            grundpreis: self.grundpreis,
            services_preis: self.services_preis,
            rabatt_preis: self.rabatt_preis,
            gesamtpreis: self.gesamtpreis,
        }
    }
}

/// A non-cancelled booking joined with its guest's name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActiveBooking {
    pub id: DbId,
    pub checkin_date: NaiveDate,
    pub status: Option<String>,
    pub guest_id: DbId,
    pub vorname: Option<String>,
    pub nachname: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Guest {
    pub id: DbId,
    pub vorname: Option<String>,
    pub nachname: Option<String>,
    pub dpolg_mitglied: bool,
}

/// A service line booked on top of the room price.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdditionalService {
    pub service_name: String,
    pub price_type: Option<String>,
    pub original_value: Option<f64>,
    pub calculated_price: f64,
}
