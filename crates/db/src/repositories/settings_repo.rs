//! Repository for the single-row `notification_settings` table.

use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};

use crate::models::settings::SettingValue;
use crate::repositories::quote_ident;

/// Primary key of the only settings row.
pub const SETTINGS_ROW_ID: i64 = 1;

pub struct NotificationSettingsRepo;

impl NotificationSettingsRepo {
    /// Current values of the given columns, rendered as text.
    ///
    /// Returns `None` when the settings row does not exist.
    pub async fn values<'e, E: PgExecutor<'e>>(
        executor: E,
        columns: &[&str],
    ) -> Result<Option<Vec<SettingValue>>, sqlx::Error> {
        if columns.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let select = columns
            .iter()
            .map(|c| format!("{}::TEXT", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!("SELECT {select} FROM notification_settings WHERE id = $1");

        let row: Option<PgRow> = sqlx::query(&query)
            .bind(SETTINGS_ROW_ID)
            .fetch_optional(executor)
            .await?;

        row.map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    Ok(SettingValue {
                        column: column.to_string(),
                        value: row.try_get::<Option<String>, _>(i)?,
                    })
                })
                .collect::<Result<Vec<_>, sqlx::Error>>()
        })
        .transpose()
    }
}
