mod document;
mod reminder_rule;
mod schedule;
mod sent_reminder;
mod shared;

pub use document::{IDocumentRepo, PostgresDocumentRepo};
pub use reminder_rule::{IReminderRuleRepo, InMemoryReminderRuleRepo, PostgresReminderRuleRepo};
pub use schedule::{
    IRecurringScheduleRepo, InMemoryRecurringScheduleRepo, PostgresRecurringScheduleRepo,
};
pub use sent_reminder::{ISentReminderRepo, InMemorySentReminderRepo, PostgresSentReminderRepo};

use billing_scheduler_domain::TenantScope;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub schedules: Arc<dyn IRecurringScheduleRepo>,
    pub reminder_rules: Arc<dyn IReminderRuleRepo>,
    pub sent_reminders: Arc<dyn ISentReminderRepo>,
    pub documents: Arc<dyn IDocumentRepo>,
}

impl Repos {
    pub async fn create_postgres(
        connection_string: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");
        Ok(Self {
            schedules: Arc::new(PostgresRecurringScheduleRepo::new(pool.clone())),
            reminder_rules: Arc::new(PostgresReminderRuleRepo::new(pool.clone())),
            sent_reminders: Arc::new(PostgresSentReminderRepo::new(pool.clone())),
            documents: Arc::new(PostgresDocumentRepo::new(pool)),
        })
    }

    /// The document repo is backed by whatever also backs the document
    /// service, so that created documents can be selected for reminders.
    pub fn create_inmemory(documents: Arc<dyn IDocumentRepo>) -> Self {
        Self {
            schedules: Arc::new(InMemoryRecurringScheduleRepo::new()),
            reminder_rules: Arc::new(InMemoryReminderRuleRepo::new()),
            sent_reminders: Arc::new(InMemorySentReminderRepo::new()),
            documents,
        }
    }

    /// Creates the tables owned by this service in the schema of the tenant
    pub async fn ensure_schema(&self, tenant: &TenantScope) -> anyhow::Result<()> {
        self.schedules.ensure_schema(tenant).await?;
        self.reminder_rules.ensure_schema(tenant).await?;
        self.sent_reminders.ensure_schema(tenant).await?;
        Ok(())
    }
}
