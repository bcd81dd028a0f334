mod inmemory;
mod postgres;

use billing_scheduler_domain::{ReminderStatus, SentReminder, TenantScope, ID};
use chrono::{DateTime, Utc};
pub use inmemory::InMemorySentReminderRepo;
pub use postgres::PostgresSentReminderRepo;

/// The dedup ledger of reminder deliveries
#[async_trait::async_trait]
pub trait ISentReminderRepo: Send + Sync {
    async fn ensure_schema(&self, tenant: &TenantScope) -> anyhow::Result<()>;
    async fn insert(&self, tenant: &TenantScope, reminder: &SentReminder) -> anyhow::Result<()>;
    /// Moves a ledger row to its final status. Marking a row as `Sent` fails
    /// when another `Sent` row already exists for the same document and rule.
    async fn update_status(
        &self,
        tenant: &TenantScope,
        reminder_id: &ID,
        status: ReminderStatus,
        sent_at: Option<DateTime<Utc>>,
        email_log_id: Option<String>,
        error: Option<String>,
    ) -> anyhow::Result<()>;
    /// Whether the (document, rule) pair has already been reminded
    async fn exists_sent(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
        rule_id: &ID,
    ) -> anyhow::Result<bool>;
    async fn find_by_document(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
    ) -> anyhow::Result<Vec<SentReminder>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 6, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn failed_rows_do_not_count_as_sent() {
        let repo = InMemorySentReminderRepo::new();
        let tenant = TenantScope::new(ID::new(), "acme").unwrap();
        let document_id = ID::new();
        let rule_id = ID::new();

        let attempt = SentReminder::pending(
            tenant.tenant_id.clone(),
            document_id.clone(),
            rule_id.clone(),
            now(),
        );
        repo.insert(&tenant, &attempt).await.unwrap();
        assert!(!repo.exists_sent(&tenant, &document_id, &rule_id).await.unwrap());

        repo.update_status(
            &tenant,
            &attempt.id,
            ReminderStatus::Failed,
            None,
            None,
            Some("send email: smtp down".into()),
        )
        .await
        .unwrap();
        assert!(!repo.exists_sent(&tenant, &document_id, &rule_id).await.unwrap());

        let retry = SentReminder::pending(
            tenant.tenant_id.clone(),
            document_id.clone(),
            rule_id.clone(),
            now(),
        );
        repo.insert(&tenant, &retry).await.unwrap();
        repo.update_status(
            &tenant,
            &retry.id,
            ReminderStatus::Sent,
            Some(now()),
            Some("log-1".into()),
            None,
        )
        .await
        .unwrap();
        assert!(repo.exists_sent(&tenant, &document_id, &rule_id).await.unwrap());

        let rows = repo.find_by_document(&tenant, &document_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, ReminderStatus::Failed);
        assert_eq!(rows[1].email_log_id, Some("log-1".into()));
    }

    #[tokio::test]
    async fn rejects_second_sent_row_for_pair() {
        let repo = InMemorySentReminderRepo::new();
        let tenant = TenantScope::new(ID::new(), "acme").unwrap();
        let document_id = ID::new();
        let rule_id = ID::new();

        let first = SentReminder::pending(
            tenant.tenant_id.clone(),
            document_id.clone(),
            rule_id.clone(),
            now(),
        );
        let second = SentReminder::pending(
            tenant.tenant_id.clone(),
            document_id.clone(),
            rule_id.clone(),
            now(),
        );
        repo.insert(&tenant, &first).await.unwrap();
        repo.insert(&tenant, &second).await.unwrap();

        assert!(repo
            .update_status(&tenant, &first.id, ReminderStatus::Sent, Some(now()), None, None)
            .await
            .is_ok());
        assert!(repo
            .update_status(&tenant, &second.id, ReminderStatus::Sent, Some(now()), None, None)
            .await
            .is_err());
    }
}
