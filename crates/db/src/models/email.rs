//! E-mail templates and scheduled e-mails.

use bookops_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailTemplate {
    pub template_name: String,
    pub subject: String,
    pub is_active: bool,
}

/// A `(booking_id, template_name, status)` group with more than one row.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct DuplicateEmailGroup {
    pub booking_id: DbId,
    pub template_name: String,
    pub status: String,
    pub count: i64,
}
