//! Repositories for `email_templates` and `scheduled_emails`.

use sqlx::PgExecutor;

use crate::models::email::{DuplicateEmailGroup, EmailTemplate};

// ---------------------------------------------------------------------------
// EmailTemplateRepo
// ---------------------------------------------------------------------------

pub struct EmailTemplateRepo;

impl EmailTemplateRepo {
    /// All templates ordered by name.
    pub async fn list<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<EmailTemplate>, sqlx::Error> {
        sqlx::query_as::<_, EmailTemplate>(
            "SELECT template_name::TEXT AS template_name, \
                    COALESCE(subject, '')::TEXT AS subject, \
                    COALESCE(is_active, FALSE) AS is_active \
             FROM email_templates \
             ORDER BY template_name",
        )
        .fetch_all(executor)
        .await
    }

    pub async fn exists<'e, E: PgExecutor<'e>>(
        executor: E,
        template_name: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM email_templates WHERE template_name = $1)",
        )
        .bind(template_name)
        .fetch_one(executor)
        .await
    }
}

// ---------------------------------------------------------------------------
// ScheduledEmailRepo
// ---------------------------------------------------------------------------

pub struct ScheduledEmailRepo;

impl ScheduledEmailRepo {
    /// Groups of `(booking_id, template_name, status)` with more than one row.
    pub async fn duplicate_groups<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Vec<DuplicateEmailGroup>, sqlx::Error> {
        sqlx::query_as::<_, DuplicateEmailGroup>(
            "SELECT booking_id::BIGINT AS booking_id, \
                    template_name::TEXT AS template_name, \
                    status::TEXT AS status, \
                    COUNT(*) AS count \
             FROM scheduled_emails \
             GROUP BY booking_id, template_name, status \
             HAVING COUNT(*) > 1 \
             ORDER BY booking_id, template_name, status",
        )
        .fetch_all(executor)
        .await
    }

    pub async fn count_with_template<'e, E: PgExecutor<'e>>(
        executor: E,
        template_name: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM scheduled_emails WHERE template_name = $1")
            .bind(template_name)
            .fetch_one(executor)
            .await
    }
}
