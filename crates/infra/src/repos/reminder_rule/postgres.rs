use super::IReminderRuleRepo;
use crate::repos::shared::postgres::{create_schema, execute_statements, table};
use billing_scheduler_domain::{ReminderRule, TemplateType, TenantScope, TriggerType, ID};
use chrono::{DateTime, Utc};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::{error, warn};

pub struct PostgresReminderRuleRepo {
    pool: PgPool,
}

impl PostgresReminderRuleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRuleRaw {
    rule_uid: Uuid,
    tenant_uid: Uuid,
    name: String,
    trigger_type: String,
    days_offset: i32,
    template_type: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReminderRuleRaw> for ReminderRule {
    fn from(e: ReminderRuleRaw) -> Self {
        let trigger_type = e.trigger_type.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown trigger type: {} on reminder rule: {}",
                e.trigger_type, e.rule_uid
            );
            TriggerType::AfterDue
        });
        let template_type = e.template_type.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown template type: {} on reminder rule: {}",
                e.template_type, e.rule_uid
            );
            TemplateType::PaymentReminder
        });
        Self {
            id: e.rule_uid.into(),
            tenant_id: e.tenant_uid.into(),
            name: e.name,
            trigger_type,
            days_offset: e.days_offset,
            template_type,
            is_active: e.is_active,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[async_trait::async_trait]
impl IReminderRuleRepo for PostgresReminderRuleRepo {
    async fn ensure_schema(&self, tenant: &TenantScope) -> anyhow::Result<()> {
        let statements = vec![
            create_schema(tenant),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    rule_uid UUID PRIMARY KEY,
                    tenant_uid UUID NOT NULL,
                    name TEXT NOT NULL,
                    trigger_type TEXT NOT NULL,
                    days_offset INTEGER NOT NULL CHECK (days_offset >= 0),
                    template_type TEXT NOT NULL,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                )
                "#,
                table(tenant, "reminder_rules")
            ),
        ];
        execute_statements(&self.pool, &statements).await
    }

    async fn insert(&self, tenant: &TenantScope, rule: &ReminderRule) -> anyhow::Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {}
            (rule_uid, tenant_uid, name, trigger_type, days_offset, template_type, is_active, created_at, updated_at)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
            table(tenant, "reminder_rules")
        );
        sqlx::query(&sql)
            .bind(*rule.id.inner_ref())
            .bind(*rule.tenant_id.inner_ref())
            .bind(&rule.name)
            .bind(rule.trigger_type.as_str())
            .bind(rule.days_offset)
            .bind(rule.template_type.as_str())
            .bind(rule.is_active)
            .bind(rule.created_at)
            .bind(rule.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    "Unable to insert reminder rule: {:?}. DB returned error: {:?}",
                    rule, e
                );
                e
            })?;
        Ok(())
    }

    async fn save(&self, tenant: &TenantScope, rule: &ReminderRule) -> anyhow::Result<()> {
        let sql = format!(
            r#"
            UPDATE {}
            SET name = $3,
            trigger_type = $4,
            days_offset = $5,
            template_type = $6,
            is_active = $7,
            updated_at = $8
            WHERE rule_uid = $1 AND tenant_uid = $2
            "#,
            table(tenant, "reminder_rules")
        );
        let updated = sqlx::query(&sql)
            .bind(*rule.id.inner_ref())
            .bind(*tenant.tenant_id.inner_ref())
            .bind(&rule.name)
            .bind(rule.trigger_type.as_str())
            .bind(rule.days_offset)
            .bind(rule.template_type.as_str())
            .bind(rule.is_active)
            .bind(rule.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    "Unable to save reminder rule: {:?}. DB returned error: {:?}",
                    rule, e
                );
                e
            })?
            .rows_affected();
        if updated == 0 {
            return Err(anyhow::Error::msg(format!(
                "Reminder rule: {} was not found",
                rule.id
            )));
        }
        Ok(())
    }

    async fn find(&self, tenant: &TenantScope, rule_id: &ID) -> anyhow::Result<Option<ReminderRule>> {
        let sql = format!(
            "SELECT * FROM {} WHERE rule_uid = $1 AND tenant_uid = $2",
            table(tenant, "reminder_rules")
        );
        let rule: Option<ReminderRuleRaw> = sqlx::query_as(&sql)
            .bind(*rule_id.inner_ref())
            .bind(*tenant.tenant_id.inner_ref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(rule.map(|rule| rule.into()))
    }

    async fn find_by_tenant(&self, tenant: &TenantScope) -> anyhow::Result<Vec<ReminderRule>> {
        let sql = format!(
            "SELECT * FROM {} WHERE tenant_uid = $1 ORDER BY created_at ASC",
            table(tenant, "reminder_rules")
        );
        let rules: Vec<ReminderRuleRaw> = sqlx::query_as(&sql)
            .bind(*tenant.tenant_id.inner_ref())
            .fetch_all(&self.pool)
            .await?;
        Ok(rules.into_iter().map(|rule| rule.into()).collect())
    }

    async fn find_active(&self, tenant: &TenantScope) -> anyhow::Result<Vec<ReminderRule>> {
        let sql = format!(
            r#"
            SELECT * FROM {}
            WHERE tenant_uid = $1 AND is_active
            ORDER BY CASE trigger_type
                WHEN 'BEFORE_DUE' THEN 0
                WHEN 'ON_DUE' THEN 1
                ELSE 2
            END, days_offset ASC
            "#,
            table(tenant, "reminder_rules")
        );
        let rules: Vec<ReminderRuleRaw> = sqlx::query_as(&sql)
            .bind(*tenant.tenant_id.inner_ref())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    "Unable to query active reminder rules for tenant: {}. DB returned error: {:?}",
                    tenant.tenant_id, e
                );
                e
            })?;
        Ok(rules.into_iter().map(|rule| rule.into()).collect())
    }

    async fn delete(&self, tenant: &TenantScope, rule_id: &ID) -> anyhow::Result<Option<ReminderRule>> {
        let sql = format!(
            "DELETE FROM {} WHERE rule_uid = $1 AND tenant_uid = $2 RETURNING *",
            table(tenant, "reminder_rules")
        );
        let rule: Option<ReminderRuleRaw> = sqlx::query_as(&sql)
            .bind(*rule_id.inner_ref())
            .bind(*tenant.tenant_id.inner_ref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(rule.map(|rule| rule.into()))
    }
}
