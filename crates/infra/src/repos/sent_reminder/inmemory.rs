use super::ISentReminderRepo;
use crate::repos::shared::inmemory_repo::*;
use billing_scheduler_domain::{ReminderStatus, SentReminder, TenantScope, ID};
use chrono::{DateTime, Utc};
use std::sync::Mutex;

pub struct InMemorySentReminderRepo {
    reminders: Mutex<Vec<SentReminder>>,
}

impl InMemorySentReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemorySentReminderRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ISentReminderRepo for InMemorySentReminderRepo {
    async fn ensure_schema(&self, _tenant: &TenantScope) -> anyhow::Result<()> {
        Ok(())
    }

    async fn insert(&self, _tenant: &TenantScope, reminder: &SentReminder) -> anyhow::Result<()> {
        insert(reminder, &self.reminders);
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
        let reminder = find(tenant, reminder_id, &self.reminders).ok_or_else(|| {
            anyhow::Error::msg(format!("Sent reminder: {} was not found", reminder_id))
        })?;
        if status == ReminderStatus::Sent
            && self
                .exists_sent(tenant, &reminder.document_id, &reminder.rule_id)
                .await?
        {
            return Err(anyhow::Error::msg(format!(
                "Document: {} was already reminded by rule: {}",
                reminder.document_id, reminder.rule_id
            )));
        }

        update(tenant, reminder_id, &self.reminders, |reminder| {
            reminder.status = status;
            reminder.sent_at = sent_at;
            reminder.email_log_id = email_log_id;
            reminder.error = error;
        });
        Ok(())
    }

    async fn exists_sent(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
        rule_id: &ID,
    ) -> anyhow::Result<bool> {
        let sent = find_by(tenant, &self.reminders, |reminder| {
            reminder.document_id == *document_id
                && reminder.rule_id == *rule_id
                && reminder.status == ReminderStatus::Sent
        });
        Ok(!sent.is_empty())
    }

    async fn find_by_document(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
    ) -> anyhow::Result<Vec<SentReminder>> {
        Ok(find_by(tenant, &self.reminders, |reminder| {
            reminder.document_id == *document_id
        }))
    }
}
