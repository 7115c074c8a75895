//! Discount rows and the stale-amount projection used by the repair command.

use bookops_core::pricing::{DiscountInput, DiscountKind};
use bookops_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Discount {
    pub id: DbId,
    pub booking_id: DbId,
    pub discount_name: String,
    pub discount_type: String,
    pub discount_value: f64,
    pub calculated_amount: Option<f64>,
}

impl Discount {
    pub fn kind(&self) -> DiscountKind {
        DiscountKind::from_db(&self.discount_type)
    }

    pub fn to_input(&self) -> DiscountInput {
        DiscountInput {
            id: self.id,
            kind: self.kind(),
            value: self.discount_value,
            calculated_amount: self.calculated_amount,
        }
    }
}

/// A discount whose stored `calculated_amount` no longer matches the amount
/// recomputed from its booking's current prices.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutdatedDiscount {
    pub id: DbId,
    pub booking_id: DbId,
    pub discount_name: String,
    pub discount_type: String,
    pub discount_value: f64,
    pub old_calculated: f64,
    pub grundpreis: f64,
    pub services_preis: f64,
    pub new_calculated: f64,
}

impl OutdatedDiscount {
    pub fn difference(&self) -> f64 {
        (self.old_calculated - self.new_calculated).abs()
    }
}
