//! Discount and booking price arithmetic.
//!
//! A discount row caches its monetary effect in `calculated_amount`. That
//! cache goes stale whenever the owning booking's base or service price
//! changes without the discount being recomputed. The functions here
//! recompute the expected value and compare it with what is stored.

use crate::types::DbId;

/// Maximum absolute difference (in currency units) at which two amounts are
/// considered equal.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// The `discount_type` value that denotes a percentage discount.
pub const DISCOUNT_TYPE_PERCENT: &str = "percent";

// ---------------------------------------------------------------------------
// Discount kind
// ---------------------------------------------------------------------------

/// How a discount's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountKind {
    /// `discount_value` is a percentage of base plus service price.
    Percent,
    /// `discount_value` is the amount itself.
    Fixed,
}

impl DiscountKind {
    /// Parse the `discount_type` column. Anything other than `percent` is a
    /// fixed amount.
    pub fn from_db(discount_type: &str) -> Self {
        if discount_type == DISCOUNT_TYPE_PERCENT {
            Self::Percent
        } else {
            Self::Fixed
        }
    }
}

/// Recompute the amount a discount should carry for the given booking prices.
pub fn expected_discount_amount(
    kind: DiscountKind,
    value: f64,
    grundpreis: f64,
    services_preis: f64,
) -> f64 {
    match kind {
        DiscountKind::Percent => (grundpreis + services_preis) * (value / 100.0),
        DiscountKind::Fixed => value,
    }
}

/// Whether two amounts agree within [`AMOUNT_TOLERANCE`].
pub fn amounts_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= AMOUNT_TOLERANCE
}

// ---------------------------------------------------------------------------
// Booking prices
// ---------------------------------------------------------------------------

/// The price breakdown stored on a booking row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingPrices {
    pub grundpreis: f64,
    pub services_preis: f64,
    pub rabatt_preis: f64,
    pub gesamtpreis: f64,
}

impl BookingPrices {
    /// Base plus services minus discounts.
    pub fn expected_total(&self) -> f64 {
        self.grundpreis + self.services_preis - self.rabatt_preis
    }

    /// Whether the stored `gesamtpreis` equals [`expected_total`](Self::expected_total).
    pub fn total_is_consistent(&self) -> bool {
        amounts_match(self.expected_total(), self.gesamtpreis)
    }
}

// ---------------------------------------------------------------------------
// Discount audit
// ---------------------------------------------------------------------------

/// The inputs needed to audit one discount row.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountInput {
    pub id: DbId,
    pub kind: DiscountKind,
    pub value: f64,
    pub calculated_amount: Option<f64>,
}

/// Verdict for a single discount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscountVerdict {
    /// Stored amount matches the recomputed one.
    Correct { amount: f64 },
    /// Stored amount differs by more than the tolerance.
    Mismatch { stored: f64, expected: f64 },
    /// No amount is stored.
    Missing { expected: f64 },
}

impl DiscountVerdict {
    /// The amount this discount contributes to the booking's discount sum.
    ///
    /// A stored amount counts as stored, even when stale; a missing one counts
    /// with its recomputed value.
    pub fn effective_amount(&self) -> f64 {
        match *self {
            Self::Correct { amount } => amount,
            Self::Mismatch { stored, .. } => stored,
            Self::Missing { expected } => expected,
        }
    }

    pub fn expected(&self) -> f64 {
        match *self {
            Self::Correct { amount } => amount,
            Self::Mismatch { expected, .. } | Self::Missing { expected } => expected,
        }
    }
}

/// Classify one discount against the booking prices.
pub fn check_discount(input: &DiscountInput, prices: &BookingPrices) -> DiscountVerdict {
    let expected = expected_discount_amount(
        input.kind,
        input.value,
        prices.grundpreis,
        prices.services_preis,
    );
    match input.calculated_amount {
        None => DiscountVerdict::Missing { expected },
        Some(stored) if amounts_match(stored, expected) => {
            DiscountVerdict::Correct { amount: stored }
        }
        Some(stored) => DiscountVerdict::Mismatch { stored, expected },
    }
}

/// Result of auditing every discount of one booking.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountAudit {
    pub verdicts: Vec<(DbId, DiscountVerdict)>,
    /// Sum of [`DiscountVerdict::effective_amount`] over all discounts.
    pub discount_sum: f64,
    /// Whether `discount_sum` matches the booking's `rabatt_preis`.
    pub sum_matches_booking: bool,
}

impl DiscountAudit {
    pub fn has_problems(&self) -> bool {
        !self.sum_matches_booking
            || self
                .verdicts
                .iter()
                .any(|(_, v)| !matches!(v, DiscountVerdict::Correct { .. }))
    }
}

/// Audit all discounts of a booking.
pub fn audit_discounts(prices: &BookingPrices, discounts: &[DiscountInput]) -> DiscountAudit {
    let verdicts: Vec<(DbId, DiscountVerdict)> = discounts
        .iter()
        .map(|d| (d.id, check_discount(d, prices)))
        .collect();
    let discount_sum = verdicts.iter().map(|(_, v)| v.effective_amount()).sum();
    DiscountAudit {
        sum_matches_booking: amounts_match(discount_sum, prices.rabatt_preis),
        verdicts,
        discount_sum,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(grund: f64, services: f64, rabatt: f64, gesamt: f64) -> BookingPrices {
        BookingPrices {
            grundpreis: grund,
            services_preis: services,
            rabatt_preis: rabatt,
            gesamtpreis: gesamt,
        }
    }

    fn discount(id: DbId, kind: DiscountKind, value: f64, stored: Option<f64>) -> DiscountInput {
        DiscountInput {
            id,
            kind,
            value,
            calculated_amount: stored,
        }
    }

    #[test]
    fn discount_kind_only_recognises_percent() {
        assert_eq!(DiscountKind::from_db("percent"), DiscountKind::Percent);
        assert_eq!(DiscountKind::from_db("fixed"), DiscountKind::Fixed);
        assert_eq!(DiscountKind::from_db("Percent"), DiscountKind::Fixed);
        assert_eq!(DiscountKind::from_db(""), DiscountKind::Fixed);
    }

    #[test]
    fn percent_discount_applies_to_base_plus_services() {
        let amount = expected_discount_amount(DiscountKind::Percent, 10.0, 200.0, 50.0);
        assert!(amounts_match(amount, 25.0));
    }

    #[test]
    fn fixed_discount_ignores_prices() {
        let amount = expected_discount_amount(DiscountKind::Fixed, 15.0, 200.0, 50.0);
        assert_eq!(amount, 15.0);
    }

    #[test]
    fn tolerance_is_inclusive() {
        assert!(amounts_match(10.0, 10.01));
        assert!(amounts_match(10.01, 10.0));
        assert!(!amounts_match(10.0, 10.02));
    }

    #[test]
    fn total_consistency() {
        assert!(prices(200.0, 50.0, 25.0, 225.0).total_is_consistent());
        assert!(!prices(200.0, 50.0, 25.0, 250.0).total_is_consistent());
    }

    #[test]
    fn stale_percent_discount_is_a_mismatch() {
        // Base price moved from 200 to 300 but the cached 10% stayed at 20.
        let p = prices(300.0, 0.0, 20.0, 280.0);
        let verdict = check_discount(&discount(1, DiscountKind::Percent, 10.0, Some(20.0)), &p);
        match verdict {
            DiscountVerdict::Mismatch { stored, expected } => {
                assert_eq!(stored, 20.0);
                assert!(amounts_match(expected, 30.0));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_amount_counts_with_expected_value() {
        let p = prices(100.0, 0.0, 10.0, 90.0);
        let audit = audit_discounts(&p, &[discount(7, DiscountKind::Percent, 10.0, None)]);
        assert_eq!(audit.verdicts.len(), 1);
        assert!(matches!(audit.verdicts[0].1, DiscountVerdict::Missing { .. }));
        assert!(audit.sum_matches_booking);
        assert!(audit.has_problems());
    }

    #[test]
    fn consistent_booking_has_no_problems() {
        let p = prices(200.0, 50.0, 40.0, 210.0);
        let audit = audit_discounts(
            &p,
            &[
                discount(1, DiscountKind::Percent, 10.0, Some(25.0)),
                discount(2, DiscountKind::Fixed, 15.0, Some(15.0)),
            ],
        );
        assert!(amounts_match(audit.discount_sum, 40.0));
        assert!(audit.sum_matches_booking);
        assert!(!audit.has_problems());
    }

    #[test]
    fn sum_mismatch_is_reported_even_when_rows_are_correct() {
        let p = prices(200.0, 0.0, 50.0, 150.0);
        let audit = audit_discounts(&p, &[discount(1, DiscountKind::Fixed, 15.0, Some(15.0))]);
        assert!(!audit.sum_matches_booking);
        assert!(audit.has_problems());
    }

    #[test]
    fn no_discounts_sum_to_zero() {
        let audit = audit_discounts(&prices(100.0, 0.0, 0.0, 100.0), &[]);
        assert_eq!(audit.discount_sum, 0.0);
        assert!(audit.sum_matches_booking);
    }
}
