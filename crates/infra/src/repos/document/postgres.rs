use super::IDocumentRepo;
use crate::repos::shared::postgres::table;
use billing_scheduler_domain::{
    DeliveryStatus, Document, DocumentStatus, DocumentType, ReminderCandidate, TenantScope, ID,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::{error, warn};

/// Works on the `invoices` and `contacts` tables of the tenant schema. Those
/// tables are created and migrated by the back office, not by this service.
pub struct PostgresDocumentRepo {
    pool: PgPool,
}

impl PostgresDocumentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CandidateRaw {
    invoice_uid: Uuid,
    tenant_uid: Uuid,
    contact_uid: Uuid,
    invoice_number: String,
    document_type: String,
    status: String,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    currency: String,
    total: Decimal,
    amount_paid: Decimal,
    recurring_schedule_uid: Option<Uuid>,
    email_sent_at: Option<DateTime<Utc>>,
    email_status: Option<String>,
    email_log_id: Option<String>,
    contact_name: Option<String>,
    contact_email: Option<String>,
}

impl From<CandidateRaw> for ReminderCandidate {
    fn from(e: CandidateRaw) -> Self {
        let status = e.status.parse().unwrap_or_else(|_| {
            warn!("Unknown status: {} on invoice: {}", e.status, e.invoice_uid);
            DocumentStatus::Unpaid
        });
        let document = Document {
            id: e.invoice_uid.into(),
            tenant_id: e.tenant_uid.into(),
            contact_id: e.contact_uid.into(),
            number: e.invoice_number,
            document_type: e.document_type.parse().unwrap_or(DocumentType::Invoice),
            status,
            issue_date: e.issue_date,
            due_date: e.due_date,
            currency: e.currency,
            total: e.total,
            amount_paid: e.amount_paid,
            recurring_schedule_id: e.recurring_schedule_uid.map(ID::from),
            email_sent_at: e.email_sent_at,
            email_status: e.email_status.and_then(|status| status.parse().ok()),
            email_log_id: e.email_log_id,
        };
        Self {
            document,
            contact_name: e.contact_name.unwrap_or_default(),
            contact_email: e.contact_email,
        }
    }
}

#[async_trait::async_trait]
impl IDocumentRepo for PostgresDocumentRepo {
    async fn find_reminder_candidates(
        &self,
        tenant: &TenantScope,
        due_date: NaiveDate,
        statuses: &[DocumentStatus],
    ) -> anyhow::Result<Vec<ReminderCandidate>> {
        let sql = format!(
            r#"
            SELECT i.*, c.name AS contact_name, c.email AS contact_email
            FROM {invoices} AS i
            LEFT JOIN {contacts} AS c ON c.contact_uid = i.contact_uid
            WHERE i.tenant_uid = $1
            AND i.due_date = $2
            AND i.status = ANY($3)
            AND i.document_type = 'INVOICE'
            AND i.total - i.amount_paid > 0
            ORDER BY i.invoice_number ASC
            "#,
            invoices = table(tenant, "invoices"),
            contacts = table(tenant, "contacts")
        );
        let statuses = statuses
            .iter()
            .map(|status| status.as_str().to_string())
            .collect::<Vec<_>>();
        let rows: Vec<CandidateRaw> = sqlx::query_as(&sql)
            .bind(*tenant.tenant_id.inner_ref())
            .bind(due_date)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    "Unable to query reminder candidates due: {} for tenant: {}. DB returned error: {:?}",
                    due_date, tenant.tenant_id, e
                );
                e
            })?;
        Ok(rows.into_iter().map(|row| row.into()).collect())
    }

    async fn update_delivery_status(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
        sent_at: Option<DateTime<Utc>>,
        status: DeliveryStatus,
        email_log_id: Option<String>,
    ) -> anyhow::Result<()> {
        let sql = format!(
            r#"
            UPDATE {}
            SET email_sent_at = COALESCE($3, email_sent_at),
            email_status = $4,
            email_log_id = COALESCE($5, email_log_id)
            WHERE invoice_uid = $1 AND tenant_uid = $2
            "#,
            table(tenant, "invoices")
        );
        let updated = sqlx::query(&sql)
            .bind(*document_id.inner_ref())
            .bind(*tenant.tenant_id.inner_ref())
            .bind(sent_at)
            .bind(status.as_str())
            .bind(email_log_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(anyhow::Error::msg(format!(
                "Document: {} was not found",
                document_id
            )));
        }
        Ok(())
    }
}
