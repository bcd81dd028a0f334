use super::ISentReminderRepo;
use crate::repos::shared::postgres::{create_schema, execute_statements, table};
use billing_scheduler_domain::{ReminderStatus, SentReminder, TenantScope, ID};
use chrono::{DateTime, Utc};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::{error, warn};

pub struct PostgresSentReminderRepo {
    pool: PgPool,
}

impl PostgresSentReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SentReminderRaw {
    reminder_uid: Uuid,
    tenant_uid: Uuid,
    document_uid: Uuid,
    rule_uid: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    email_log_id: Option<String>,
    error: Option<String>,
}

impl From<SentReminderRaw> for SentReminder {
    fn from(e: SentReminderRaw) -> Self {
        let status = e.status.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown status: {} on sent reminder: {}",
                e.status, e.reminder_uid
            );
            ReminderStatus::Failed
        });
        Self {
            id: e.reminder_uid.into(),
            tenant_id: e.tenant_uid.into(),
            document_id: e.document_uid.into(),
            rule_id: e.rule_uid.into(),
            status,
            created_at: e.created_at,
            sent_at: e.sent_at,
            email_log_id: e.email_log_id,
            error: e.error,
        }
    }
}

#[async_trait::async_trait]
impl ISentReminderRepo for PostgresSentReminderRepo {
    async fn ensure_schema(&self, tenant: &TenantScope) -> anyhow::Result<()> {
        let reminders = table(tenant, "sent_reminders");
        let statements = vec![
            create_schema(tenant),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    reminder_uid UUID PRIMARY KEY,
                    tenant_uid UUID NOT NULL,
                    document_uid UUID NOT NULL,
                    rule_uid UUID NOT NULL,
                    status TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    sent_at TIMESTAMPTZ,
                    email_log_id TEXT,
                    error TEXT
                )
                "#,
                reminders
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS sent_reminders_sent_once_idx ON {} (document_uid, rule_uid) WHERE status = 'SENT'",
                reminders
            ),
        ];
        execute_statements(&self.pool, &statements).await
    }

    async fn insert(&self, tenant: &TenantScope, reminder: &SentReminder) -> anyhow::Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {}
            (reminder_uid, tenant_uid, document_uid, rule_uid, status, created_at, sent_at, email_log_id, error)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
            table(tenant, "sent_reminders")
        );
        sqlx::query(&sql)
            .bind(*reminder.id.inner_ref())
            .bind(*reminder.tenant_id.inner_ref())
            .bind(*reminder.document_id.inner_ref())
            .bind(*reminder.rule_id.inner_ref())
            .bind(reminder.status.as_str())
            .bind(reminder.created_at)
            .bind(reminder.sent_at)
            .bind(&reminder.email_log_id)
            .bind(&reminder.error)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    "Unable to insert sent reminder: {:?}. DB returned error: {:?}",
                    reminder, e
                );
                e
            })?;
        Ok(())
    }

    async fn update_status(
        &self,
        tenant: &TenantScope,
        reminder_id: &ID,
        status: ReminderStatus,
        sent_at: Option<DateTime<Utc>>,
        email_log_id: Option<String>,
        error: Option<String>,
    ) -> anyhow::Result<()> {
        let sql = format!(
            r#"
            UPDATE {}
            SET status = $3,
            sent_at = $4,
            email_log_id = $5,
            error = $6
            WHERE reminder_uid = $1 AND tenant_uid = $2
            "#,
            table(tenant, "sent_reminders")
        );
        let updated = sqlx::query(&sql)
            .bind(*reminder_id.inner_ref())
            .bind(*tenant.tenant_id.inner_ref())
            .bind(status.as_str())
            .bind(sent_at)
            .bind(email_log_id)
            .bind(error)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    "Unable to set status: {} on sent reminder: {}. DB returned error: {:?}",
                    status.as_str(),
                    reminder_id,
                    e
                );
                e
            })?
            .rows_affected();
        if updated == 0 {
            return Err(anyhow::Error::msg(format!(
                "Sent reminder: {} was not found",
                reminder_id
            )));
        }
        Ok(())
    }

    async fn exists_sent(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
        rule_id: &ID,
    ) -> anyhow::Result<bool> {
        let sql = format!(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM {}
                WHERE tenant_uid = $1 AND document_uid = $2 AND rule_uid = $3 AND status = 'SENT'
            )
            "#,
            table(tenant, "sent_reminders")
        );
        let (exists,): (bool,) = sqlx::query_as(&sql)
            .bind(*tenant.tenant_id.inner_ref())
            .bind(*document_id.inner_ref())
            .bind(*rule_id.inner_ref())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_by_document(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
    ) -> anyhow::Result<Vec<SentReminder>> {
        let sql = format!(
            r#"
            SELECT * FROM {}
            WHERE tenant_uid = $1 AND document_uid = $2
            ORDER BY created_at ASC
            "#,
            table(tenant, "sent_reminders")
        );
        let rows: Vec<SentReminderRaw> = sqlx::query_as(&sql)
            .bind(*tenant.tenant_id.inner_ref())
            .bind(*document_id.inner_ref())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| row.into()).collect())
    }
}
