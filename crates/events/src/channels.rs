//! Table-to-channel routing for change notifications.
//!
//! The routing lives twice: in [`channel_for_table`] for events published
//! from this tool, and in the PL/pgSQL body of [`NOTIFY_TABLE_CHANGE_FUNCTION`]
//! for events raised by row triggers. The tests keep the two in step.

pub const BOOKING_CHANNEL: &str = "booking_changes";
pub const GUEST_CHANNEL: &str = "guest_changes";
pub const ROOM_CHANNEL: &str = "room_changes";
pub const REMINDER_CHANNEL: &str = "reminder_changes";
/// Channel for every table without a dedicated one.
pub const FALLBACK_CHANNEL: &str = "table_changes";

/// Every channel the trigger function may notify on.
pub const CHANNELS: &[&str] = &[
    BOOKING_CHANNEL,
    GUEST_CHANNEL,
    ROOM_CHANNEL,
    REMINDER_CHANNEL,
    FALLBACK_CHANNEL,
];

/// Name of the trigger function the change triggers call.
pub const NOTIFY_FUNCTION_NAME: &str = "notify_table_change";

/// The channel a change on `table` is announced on.
pub fn channel_for_table(table: &str) -> &'static str {
    match table {
        "bookings" => BOOKING_CHANNEL,
        "guests" => GUEST_CHANNEL,
        "rooms" => ROOM_CHANNEL,
        "reminders" => REMINDER_CHANNEL,
        _ => FALLBACK_CHANNEL,
    }
}

/// Canonical definition of `notify_table_change()`, including the
/// `reminders` branch.
pub const NOTIFY_TABLE_CHANGE_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION notify_table_change()
RETURNS TRIGGER AS $$
DECLARE
    notification json;
BEGIN
    notification = json_build_object(
        'table', TG_TABLE_NAME,
        'action', TG_OP,
        'id', COALESCE(NEW.id, OLD.id),
        'timestamp', NOW()
    );

    IF TG_TABLE_NAME = 'bookings' THEN
        PERFORM pg_notify('booking_changes', notification::text);
    ELSIF TG_TABLE_NAME = 'guests' THEN
        PERFORM pg_notify('guest_changes', notification::text);
    ELSIF TG_TABLE_NAME = 'rooms' THEN
        PERFORM pg_notify('room_changes', notification::text);
    ELSIF TG_TABLE_NAME = 'reminders' THEN
        PERFORM pg_notify('reminder_changes', notification::text);
    ELSE
        PERFORM pg_notify('table_changes', notification::text);
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;
"#;
