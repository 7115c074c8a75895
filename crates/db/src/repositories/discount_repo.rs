//! Repository for the `discounts` table.

use bookops_core::pricing::{AMOUNT_TOLERANCE, DISCOUNT_TYPE_PERCENT};
use bookops_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::discount::{Discount, OutdatedDiscount};

/// Column list for `discounts` SELECT queries.
const COLUMNS: &str = "\
    id::BIGINT AS id, \
    booking_id::BIGINT AS booking_id, \
    discount_name::TEXT AS discount_name, \
    discount_type::TEXT AS discount_type, \
    discount_value::FLOAT8 AS discount_value, \
    calculated_amount::FLOAT8 AS calculated_amount";

/// The discount amount recomputed from the joined booking's prices. `$1` is
/// the percent discount type.
const EXPECTED_AMOUNT: &str = "\
    CASE WHEN d.discount_type = $1 \
         THEN (COALESCE(b.grundpreis, 0) + COALESCE(b.services_preis, 0))::FLOAT8 \
              * (d.discount_value::FLOAT8 / 100.0) \
         ELSE d.discount_value::FLOAT8 \
    END";

pub struct DiscountRepo;

impl DiscountRepo {
    pub async fn for_booking<'e, E: PgExecutor<'e>>(
        executor: E,
        booking_id: DbId,
    ) -> Result<Vec<Discount>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM discounts WHERE booking_id = $1 ORDER BY id");
        sqlx::query_as::<_, Discount>(&query)
            .bind(booking_id)
            .fetch_all(executor)
            .await
    }

    /// Discounts whose stored, non-NULL `calculated_amount` is off by more
    /// than the tolerance, ordered by booking then discount.
    pub async fn outdated<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Vec<OutdatedDiscount>, sqlx::Error> {
        let query = format!(
            "SELECT d.id::BIGINT AS id, \
                    d.booking_id::BIGINT AS booking_id, \
                    d.discount_name::TEXT AS discount_name, \
                    d.discount_type::TEXT AS discount_type, \
                    d.discount_value::FLOAT8 AS discount_value, \
                    d.calculated_amount::FLOAT8 AS old_calculated, \
                    COALESCE(b.grundpreis, 0)::FLOAT8 AS grundpreis, \
                    COALESCE(b.services_preis, 0)::FLOAT8 AS services_preis, \
                    {EXPECTED_AMOUNT} AS new_calculated \
             FROM discounts d \
             JOIN bookings b ON d.booking_id = b.id \
             WHERE d.calculated_amount IS NOT NULL \
               AND ABS(d.calculated_amount::FLOAT8 - {EXPECTED_AMOUNT}) > $2 \
             ORDER BY d.booking_id, d.id"
        );
        sqlx::query_as::<_, OutdatedDiscount>(&query)
            .bind(DISCOUNT_TYPE_PERCENT)
            .bind(AMOUNT_TOLERANCE)
            .fetch_all(executor)
            .await
    }

    pub async fn update_calculated_amount<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        amount: f64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE discounts SET calculated_amount = $2 WHERE id = $1")
            .bind(id)
            .bind(amount)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
