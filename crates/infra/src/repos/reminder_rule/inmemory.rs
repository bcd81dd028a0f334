use super::IReminderRuleRepo;
use crate::repos::shared::inmemory_repo::*;
use billing_scheduler_domain::{ReminderRule, TenantScope, TriggerType, ID};
use std::sync::Mutex;

pub struct InMemoryReminderRuleRepo {
    rules: Mutex<Vec<ReminderRule>>,
}

impl InMemoryReminderRuleRepo {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryReminderRuleRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn trigger_order(trigger: &TriggerType) -> u8 {
    match trigger {
        TriggerType::BeforeDue => 0,
        TriggerType::OnDue => 1,
        TriggerType::AfterDue => 2,
    }
}

#[async_trait::async_trait]
impl IReminderRuleRepo for InMemoryReminderRuleRepo {
    async fn ensure_schema(&self, _tenant: &TenantScope) -> anyhow::Result<()> {
        Ok(())
    }

    async fn insert(&self, _tenant: &TenantScope, rule: &ReminderRule) -> anyhow::Result<()> {
        insert(rule, &self.rules);
        Ok(())
    }

    async fn save(&self, _tenant: &TenantScope, rule: &ReminderRule) -> anyhow::Result<()> {
        if !save(rule, &self.rules) {
            return Err(anyhow::Error::msg(format!(
                "Reminder rule: {} was not found",
                rule.id
            )));
        }
        Ok(())
    }

    async fn find(&self, tenant: &TenantScope, rule_id: &ID) -> anyhow::Result<Option<ReminderRule>> {
        Ok(find(tenant, rule_id, &self.rules))
    }

    async fn find_by_tenant(&self, tenant: &TenantScope) -> anyhow::Result<Vec<ReminderRule>> {
        Ok(find_by(tenant, &self.rules, |_| true))
    }

    async fn find_active(&self, tenant: &TenantScope) -> anyhow::Result<Vec<ReminderRule>> {
        let mut rules = find_by(tenant, &self.rules, |rule| rule.is_active);
        rules.sort_by_key(|rule| (trigger_order(&rule.trigger_type), rule.days_offset));
        Ok(rules)
    }

    async fn delete(&self, tenant: &TenantScope, rule_id: &ID) -> anyhow::Result<Option<ReminderRule>> {
        Ok(delete(tenant, rule_id, &self.rules))
    }
}
