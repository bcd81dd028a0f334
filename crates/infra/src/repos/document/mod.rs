mod postgres;

use billing_scheduler_domain::{DeliveryStatus, DocumentStatus, ReminderCandidate, TenantScope, ID};
use chrono::{DateTime, NaiveDate, Utc};
pub use postgres::PostgresDocumentRepo;

/// Read and delivery status access to the documents owned by the back office
#[async_trait::async_trait]
pub trait IDocumentRepo: Send + Sync {
    /// Invoices with the given due date and one of the given statuses that
    /// still have an outstanding amount, joined with their contact
    async fn find_reminder_candidates(
        &self,
        tenant: &TenantScope,
        due_date: NaiveDate,
        statuses: &[DocumentStatus],
    ) -> anyhow::Result<Vec<ReminderCandidate>>;
    async fn update_delivery_status(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
        sent_at: Option<DateTime<Utc>>,
        status: DeliveryStatus,
        email_log_id: Option<String>,
    ) -> anyhow::Result<()>;
}
