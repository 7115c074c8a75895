use std::io::Write;

use bookops_core::error::CoreError;
use bookops_core::pricing::{audit_discounts, DiscountVerdict};
use bookops_core::types::DbId;
use bookops_db::models::discount::Discount;
use bookops_db::repositories::{BookingRepo, DiscountRepo, ReminderRepo};
use bookops_db::DbPool;

use crate::error::OpsError;
use crate::report::{truncate, Report};

// ---------------------------------------------------------------------------
// debug booking
// ---------------------------------------------------------------------------

/// Price breakdown of one booking, with every discount recomputed.
///
/// Fails when the stored total, a discount amount, or the discount sum is
/// inconsistent.
pub async fn booking<W: Write>(
    pool: &DbPool,
    id: DbId,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    let booking = BookingRepo::find(pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "booking",
            id,
        })?;

    report.title(&format!("Booking {id}: price breakdown"))?;

    report.section("BOOKING:")?;
    report.detail(&format!("ID: {}", booking.id))?;
    report.detail(&format!(
        "Reservation number: {}",
        booking.reservierungsnummer.as_deref().unwrap_or("-")
    ))?;
    let nights = booking
        .anzahl_naechte
        .map(|n| n.to_string())
        .unwrap_or_else(|| "?".to_string());
    report.detail(&format!(
        "Period: {} to {} ({nights} nights)",
        booking.checkin_date, booking.checkout_date
    ))?;
    report.detail(&format!(
        "Guest ID: {}, Room ID: {}",
        display_id(booking.guest_id),
        display_id(booking.room_id)
    ))?;

    let prices = booking.prices();
    report.section("PRICES IN BOOKINGS:")?;
    report.detail(&format!("grundpreis:     {:>10.2} EUR", prices.grundpreis))?;
    report.detail(&format!("services_preis: {:>10.2} EUR", prices.services_preis))?;
    report.detail(&format!("rabatt_preis:   {:>10.2} EUR", -prices.rabatt_preis))?;
    report.detail(&format!("gesamtpreis:    {:>10.2} EUR", prices.gesamtpreis))?;
    report.detail(&format!(
        "{:.2} + {:.2} - {:.2} = {:.2} EUR",
        prices.grundpreis,
        prices.services_preis,
        prices.rabatt_preis,
        prices.expected_total()
    ))?;

    let mut problems = Vec::new();
    if prices.total_is_consistent() {
        report.ok("Total is consistent")?;
    } else {
        report.error("Total does not match its parts")?;
        problems.push("gesamtpreis inconsistent".to_string());
    }

    let discounts = DiscountRepo::for_booking(pool, id).await?;
    report.section("DISCOUNTS:")?;
    if discounts.is_empty() {
        report.info("No discounts")?;
    } else {
        let inputs: Vec<_> = discounts.iter().map(Discount::to_input).collect();
        let audit = audit_discounts(&prices, &inputs);

        for (discount, (_, verdict)) in discounts.iter().zip(&audit.verdicts) {
            print_discount(discount, verdict, report)?;
        }

        report.blank()?;
        report.detail(&format!("Sum of discounts:        {:.2} EUR", audit.discount_sum))?;
        report.detail(&format!("rabatt_preis in booking: {:.2} EUR", prices.rabatt_preis))?;
        if audit.sum_matches_booking {
            report.ok("Discount sum is consistent")?;
        } else {
            report.error(&format!(
                "Discount sum differs by {:.2} EUR",
                (audit.discount_sum - prices.rabatt_preis).abs()
            ))?;
        }
        if audit.has_problems() {
            problems.push("discount amounts inconsistent".to_string());
        }
    }

    if let Some(guest_id) = booking.guest_id {
        if let Some(guest) = BookingRepo::guest(pool, guest_id).await? {
            report.section("GUEST:")?;
            report.detail(&format!("ID: {}", guest.id))?;
            report.detail(&format!(
                "Name: {} {}",
                guest.vorname.as_deref().unwrap_or_default(),
                guest.nachname.as_deref().unwrap_or_default()
            ))?;
            report.detail(&format!(
                "DPolG member: {}",
                if guest.dpolg_mitglied { "yes" } else { "no" }
            ))?;
        }
    }

    let services = BookingRepo::services(pool, id).await?;
    report.section("SERVICES:")?;
    if services.is_empty() {
        report.info("No services")?;
    }
    for service in &services {
        let original = service
            .original_value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        report.detail(&format!(
            "- {}: {}, {original} -> {:.2} EUR",
            service.service_name,
            service.price_type.as_deref().unwrap_or("-"),
            service.calculated_price
        ))?;
    }
    report.rule()?;

    if problems.is_empty() {
        Ok(())
    } else {
        Err(OpsError::CheckFailed(format!(
            "booking {id}: {}",
            problems.join("; ")
        )))
    }
}

fn display_id(id: Option<DbId>) -> String {
    id.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_discount<W: Write>(
    discount: &Discount,
    verdict: &DiscountVerdict,
    report: &mut Report<W>,
) -> std::io::Result<()> {
    report.detail(&format!("ID: {}", discount.id))?;
    report.detail(&format!("   Name: '{}'", discount.discount_name))?;
    report.detail(&format!(
        "   Type: {}, Value: {}",
        discount.discount_type, discount.discount_value
    ))?;
    match *verdict {
        DiscountVerdict::Correct { amount } => {
            report.detail(&format!("   calculated_amount: {amount:.2}"))?;
            report.ok("Correct")
        }
        DiscountVerdict::Mismatch { stored, expected } => {
            report.detail(&format!("   calculated_amount: {stored:.2}"))?;
            report.detail(&format!("   Expected: {expected:.2}"))?;
            report.warn(&format!(
                "Differs by {:.2} EUR (stored {stored:.2}, should be {expected:.2})",
                (stored - expected).abs()
            ))
        }
        DiscountVerdict::Missing { expected } => {
            report.detail("   calculated_amount: NULL")?;
            report.warn(&format!("calculated_amount is NULL, should be {expected:.2}"))
        }
    }
}

// ---------------------------------------------------------------------------
// debug reminders
// ---------------------------------------------------------------------------

/// Reminder counts as the application's badge shows them, plus the latest rows.
pub async fn reminders<W: Write>(
    pool: &DbPool,
    limit: u32,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    let counts = ReminderRepo::counts(pool).await?;
    report.line(&format!("Total reminders: {}", counts.total))?;
    report.line(&format!("Active reminders (badge count): {}", counts.active))?;
    report.line(&format!("Completed reminders: {}", counts.completed))?;

    report.section(&format!("Latest {limit} reminders:"))?;
    for reminder in ReminderRepo::latest(pool, i64::from(limit)).await? {
        let created = reminder
            .created_on
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        report.detail(&format!(
            "#{}: {} - {} (created: {created})",
            reminder.id,
            truncate(&reminder.title, 50),
            reminder.status()
        ))?;
    }
    Ok(())
}
