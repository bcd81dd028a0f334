mod inmemory;
mod postgres;

use billing_scheduler_domain::{ReminderRule, TenantScope, ID};
pub use inmemory::InMemoryReminderRuleRepo;
pub use postgres::PostgresReminderRuleRepo;

#[async_trait::async_trait]
pub trait IReminderRuleRepo: Send + Sync {
    async fn ensure_schema(&self, tenant: &TenantScope) -> anyhow::Result<()>;
    async fn insert(&self, tenant: &TenantScope, rule: &ReminderRule) -> anyhow::Result<()>;
    async fn save(&self, tenant: &TenantScope, rule: &ReminderRule) -> anyhow::Result<()>;
    async fn find(&self, tenant: &TenantScope, rule_id: &ID) -> anyhow::Result<Option<ReminderRule>>;
    async fn find_by_tenant(&self, tenant: &TenantScope) -> anyhow::Result<Vec<ReminderRule>>;
    /// Active rules ordered by trigger type and then days offset
    async fn find_active(&self, tenant: &TenantScope) -> anyhow::Result<Vec<ReminderRule>>;
    async fn delete(&self, tenant: &TenantScope, rule_id: &ID) -> anyhow::Result<Option<ReminderRule>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_scheduler_domain::TriggerType;
    use chrono::{TimeZone, Utc};

    fn rule(tenant: &TenantScope, trigger: TriggerType, offset: i32) -> ReminderRule {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        ReminderRule::new(
            tenant.tenant_id.clone(),
            format!("{} {}", trigger, offset),
            trigger,
            offset,
            now,
        )
    }

    #[tokio::test]
    async fn create_and_delete() {
        let repo = InMemoryReminderRuleRepo::new();
        let tenant = TenantScope::new(ID::new(), "acme").unwrap();
        let other_tenant = TenantScope::new(ID::new(), "globex").unwrap();
        let rule = rule(&tenant, TriggerType::AfterDue, 7);

        assert!(repo.insert(&tenant, &rule).await.is_ok());
        assert_eq!(repo.find(&tenant, &rule.id).await.unwrap(), Some(rule.clone()));
        assert!(repo.find(&other_tenant, &rule.id).await.unwrap().is_none());
        assert!(repo.delete(&other_tenant, &rule.id).await.unwrap().is_none());

        assert_eq!(repo.delete(&tenant, &rule.id).await.unwrap(), Some(rule.clone()));
        assert!(repo.find(&tenant, &rule.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn finds_active_rules_in_order() {
        let repo = InMemoryReminderRuleRepo::new();
        let tenant = TenantScope::new(ID::new(), "acme").unwrap();
        let late = rule(&tenant, TriggerType::AfterDue, 14);
        let early = rule(&tenant, TriggerType::AfterDue, 7);
        let before = rule(&tenant, TriggerType::BeforeDue, 3);
        let mut paused = rule(&tenant, TriggerType::OnDue, 0);
        paused.is_active = false;
        for rule in &[&late, &early, &before, &paused] {
            repo.insert(&tenant, rule).await.unwrap();
        }

        let active = repo.find_active(&tenant).await.unwrap();
        let ids = active.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids, vec![before.id, early.id, late.id]);
        assert_eq!(repo.find_by_tenant(&tenant).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn save_requires_existing_rule() {
        let repo = InMemoryReminderRuleRepo::new();
        let tenant = TenantScope::new(ID::new(), "acme").unwrap();
        let mut rule = rule(&tenant, TriggerType::OnDue, 0);
        assert!(repo.save(&tenant, &rule).await.is_err());

        repo.insert(&tenant, &rule).await.unwrap();
        rule.name = "Due today".into();
        assert!(repo.save(&tenant, &rule).await.is_ok());
        assert_eq!(
            repo.find(&tenant, &rule.id).await.unwrap().unwrap().name,
            "Due today"
        );
    }
}
