use super::IRecurringScheduleRepo;
use crate::repos::shared::postgres::{create_schema, execute_statements, table};
use billing_scheduler_domain::{
    DocumentType, Frequency, RecurringSchedule, ScheduleLine, ScheduleNotificationSettings,
    TemplateType, TenantScope, ID,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Uuid, FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::{error, warn};

pub struct PostgresRecurringScheduleRepo {
    pool: PgPool,
}

impl PostgresRecurringScheduleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ScheduleRaw {
    schedule_uid: Uuid,
    tenant_uid: Uuid,
    contact_uid: Uuid,
    name: String,
    document_type: String,
    currency: String,
    frequency: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    next_generation_date: NaiveDate,
    payment_terms_days: i32,
    reference: Option<String>,
    notes: Option<String>,
    is_active: bool,
    last_generated_at: Option<DateTime<Utc>>,
    generated_count: i64,
    send_on_generation: bool,
    template_type: String,
    recipient_email: Option<String>,
    attach_document: bool,
    email_subject: Option<String>,
    email_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ScheduleLineRaw {
    line_uid: Uuid,
    schedule_uid: Uuid,
    position: i32,
    description: String,
    quantity: Decimal,
    unit: Option<String>,
    unit_price: Decimal,
    discount_percent: Decimal,
    vat_rate: Decimal,
    account_uid: Option<Uuid>,
    product_uid: Option<Uuid>,
}

impl From<ScheduleLineRaw> for ScheduleLine {
    fn from(e: ScheduleLineRaw) -> Self {
        Self {
            id: e.line_uid.into(),
            position: e.position,
            description: e.description,
            quantity: e.quantity,
            unit: e.unit,
            unit_price: e.unit_price,
            discount_percent: e.discount_percent,
            vat_rate: e.vat_rate,
            account_id: e.account_uid.map(ID::from),
            product_id: e.product_uid.map(ID::from),
        }
    }
}

impl ScheduleRaw {
    fn into_schedule(self, lines: Vec<ScheduleLine>) -> RecurringSchedule {
        let template_type = self.template_type.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown template type: {} on schedule: {}",
                self.template_type, self.schedule_uid
            );
            TemplateType::RecurringInvoice
        });
        let document_type = self.document_type.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown document type: {} on schedule: {}",
                self.document_type, self.schedule_uid
            );
            DocumentType::Invoice
        });
        RecurringSchedule {
            id: self.schedule_uid.into(),
            tenant_id: self.tenant_uid.into(),
            contact_id: self.contact_uid.into(),
            name: self.name,
            document_type,
            currency: self.currency,
            frequency: Frequency::from_stored(&self.frequency),
            start_date: self.start_date,
            end_date: self.end_date,
            next_generation_date: self.next_generation_date,
            payment_terms_days: self.payment_terms_days,
            reference: self.reference,
            notes: self.notes,
            is_active: self.is_active,
            last_generated_at: self.last_generated_at,
            generated_count: self.generated_count,
            notification: ScheduleNotificationSettings {
                send_on_generation: self.send_on_generation,
                template_type,
                recipient_email: self.recipient_email,
                attach_document: self.attach_document,
                subject: self.email_subject,
                message: self.email_message,
            },
            lines,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn schema_statements(tenant: &TenantScope) -> Vec<String> {
    let schedules = table(tenant, "recurring_schedules");
    let lines = table(tenant, "recurring_schedule_lines");
    vec![
        create_schema(tenant),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {schedules} (
                schedule_uid UUID PRIMARY KEY,
                tenant_uid UUID NOT NULL,
                contact_uid UUID NOT NULL,
                name TEXT NOT NULL,
                document_type TEXT NOT NULL,
                currency TEXT NOT NULL,
                frequency TEXT NOT NULL,
                start_date DATE NOT NULL,
                end_date DATE,
                next_generation_date DATE NOT NULL,
                payment_terms_days INTEGER NOT NULL CHECK (payment_terms_days >= 0),
                reference TEXT,
                notes TEXT,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                last_generated_at TIMESTAMPTZ,
                generated_count BIGINT NOT NULL DEFAULT 0,
                send_on_generation BOOLEAN NOT NULL DEFAULT FALSE,
                template_type TEXT NOT NULL,
                recipient_email TEXT,
                attach_document BOOLEAN NOT NULL DEFAULT TRUE,
                email_subject TEXT,
                email_message TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                CHECK (end_date IS NULL OR end_date >= start_date)
            )
            "#,
            schedules = schedules
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS recurring_schedules_due_idx ON {} (tenant_uid, next_generation_date) WHERE is_active",
            schedules
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {lines} (
                line_uid UUID PRIMARY KEY,
                schedule_uid UUID NOT NULL REFERENCES {schedules} (schedule_uid) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                description TEXT NOT NULL,
                quantity NUMERIC NOT NULL CHECK (quantity > 0),
                unit TEXT,
                unit_price NUMERIC NOT NULL CHECK (unit_price >= 0),
                discount_percent NUMERIC NOT NULL DEFAULT 0,
                vat_rate NUMERIC NOT NULL DEFAULT 0,
                account_uid UUID,
                product_uid UUID
            )
            "#,
            lines = lines,
            schedules = schedules
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS recurring_schedule_lines_schedule_idx ON {} (schedule_uid)",
            lines
        ),
    ]
}

impl PostgresRecurringScheduleRepo {
    async fn insert_lines(
        tx: &mut Transaction<'_, Postgres>,
        tenant: &TenantScope,
        schedule_id: &ID,
        lines: &[ScheduleLine],
    ) -> anyhow::Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {}
            (line_uid, schedule_uid, position, description, quantity, unit, unit_price,
             discount_percent, vat_rate, account_uid, product_uid)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
            table(tenant, "recurring_schedule_lines")
        );
        for line in lines {
            sqlx::query(&sql)
                .bind(*line.id.inner_ref())
                .bind(*schedule_id.inner_ref())
                .bind(line.position)
                .bind(&line.description)
                .bind(line.quantity)
                .bind(&line.unit)
                .bind(line.unit_price)
                .bind(line.discount_percent)
                .bind(line.vat_rate)
                .bind(line.account_id.as_ref().map(|id| *id.inner_ref()))
                .bind(line.product_id.as_ref().map(|id| *id.inner_ref()))
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    async fn lines_by_schedule(
        &self,
        tenant: &TenantScope,
        schedule_ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, Vec<ScheduleLine>>> {
        let sql = format!(
            r#"
            SELECT * FROM {}
            WHERE schedule_uid = ANY($1)
            ORDER BY position ASC
            "#,
            table(tenant, "recurring_schedule_lines")
        );
        let rows: Vec<ScheduleLineRaw> = sqlx::query_as(&sql)
            .bind(schedule_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut lines: HashMap<Uuid, Vec<ScheduleLine>> = HashMap::new();
        for row in rows {
            lines.entry(row.schedule_uid).or_default().push(row.into());
        }
        Ok(lines)
    }
}

#[async_trait::async_trait]
impl IRecurringScheduleRepo for PostgresRecurringScheduleRepo {
    async fn ensure_schema(&self, tenant: &TenantScope) -> anyhow::Result<()> {
        execute_statements(&self.pool, &schema_statements(tenant)).await
    }

    async fn insert(
        &self,
        tenant: &TenantScope,
        schedule: &RecurringSchedule,
    ) -> anyhow::Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {}
            (schedule_uid, tenant_uid, contact_uid, name, document_type, currency, frequency,
             start_date, end_date, next_generation_date, payment_terms_days, reference, notes,
             is_active, last_generated_at, generated_count, send_on_generation, template_type,
             recipient_email, attach_document, email_subject, email_message, created_at, updated_at)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                   $18, $19, $20, $21, $22, $23, $24)
            "#,
            table(tenant, "recurring_schedules")
        );
        let mut tx = self.pool.begin().await?;
        sqlx::query(&sql)
            .bind(*schedule.id.inner_ref())
            .bind(*schedule.tenant_id.inner_ref())
            .bind(*schedule.contact_id.inner_ref())
            .bind(&schedule.name)
            .bind(schedule.document_type.as_str())
            .bind(&schedule.currency)
            .bind(schedule.frequency.as_str())
            .bind(schedule.start_date)
            .bind(schedule.end_date)
            .bind(schedule.next_generation_date)
            .bind(schedule.payment_terms_days)
            .bind(&schedule.reference)
            .bind(&schedule.notes)
            .bind(schedule.is_active)
            .bind(schedule.last_generated_at)
            .bind(schedule.generated_count)
            .bind(schedule.notification.send_on_generation)
            .bind(schedule.notification.template_type.as_str())
            .bind(&schedule.notification.recipient_email)
            .bind(schedule.notification.attach_document)
            .bind(&schedule.notification.subject)
            .bind(&schedule.notification.message)
            .bind(schedule.created_at)
            .bind(schedule.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(
                    "Unable to insert recurring schedule: {:?}. DB returned error: {:?}",
                    schedule, e
                );
                e
            })?;
        Self::insert_lines(&mut tx, tenant, &schedule.id, &schedule.lines).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save(&self, tenant: &TenantScope, schedule: &RecurringSchedule) -> anyhow::Result<()> {
        let sql = format!(
            r#"
            UPDATE {}
            SET contact_uid = $3,
            name = $4,
            document_type = $5,
            currency = $6,
            frequency = $7,
            start_date = $8,
            end_date = $9,
            next_generation_date = $10,
            payment_terms_days = $11,
            reference = $12,
            notes = $13,
            is_active = $14,
            send_on_generation = $15,
            template_type = $16,
            recipient_email = $17,
            attach_document = $18,
            email_subject = $19,
            email_message = $20,
            updated_at = $21
            WHERE schedule_uid = $1 AND tenant_uid = $2
            "#,
            table(tenant, "recurring_schedules")
        );
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(&sql)
            .bind(*schedule.id.inner_ref())
            .bind(*tenant.tenant_id.inner_ref())
            .bind(*schedule.contact_id.inner_ref())
            .bind(&schedule.name)
            .bind(schedule.document_type.as_str())
            .bind(&schedule.currency)
            .bind(schedule.frequency.as_str())
            .bind(schedule.start_date)
            .bind(schedule.end_date)
            .bind(schedule.next_generation_date)
            .bind(schedule.payment_terms_days)
            .bind(&schedule.reference)
            .bind(&schedule.notes)
            .bind(schedule.is_active)
            .bind(schedule.notification.send_on_generation)
            .bind(schedule.notification.template_type.as_str())
            .bind(&schedule.notification.recipient_email)
            .bind(schedule.notification.attach_document)
            .bind(&schedule.notification.subject)
            .bind(&schedule.notification.message)
            .bind(schedule.updated_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(anyhow::Error::msg(format!(
                "Recurring schedule: {} was not found",
                schedule.id
            )));
        }

        let delete_lines = format!(
            "DELETE FROM {} WHERE schedule_uid = $1",
            table(tenant, "recurring_schedule_lines")
        );
        sqlx::query(&delete_lines)
            .bind(*schedule.id.inner_ref())
            .execute(&mut *tx)
            .await?;
        Self::insert_lines(&mut tx, tenant, &schedule.id, &schedule.lines).await?;

        tx.commit().await.map_err(|e| {
            error!(
                "Unable to save recurring schedule: {:?}. DB returned error: {:?}",
                schedule, e
            );
            e
        })?;
        Ok(())
    }

    async fn find(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
    ) -> anyhow::Result<Option<RecurringSchedule>> {
        let sql = format!(
            r#"
            SELECT * FROM {}
            WHERE schedule_uid = $1 AND tenant_uid = $2
            "#,
            table(tenant, "recurring_schedules")
        );
        let raw: Option<ScheduleRaw> = sqlx::query_as(&sql)
            .bind(*schedule_id.inner_ref())
            .bind(*tenant.tenant_id.inner_ref())
            .fetch_optional(&self.pool)
            .await?;
        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let lines = self.find_lines(tenant, schedule_id).await?;
        Ok(Some(raw.into_schedule(lines)))
    }

    async fn find_by_tenant(&self, tenant: &TenantScope) -> anyhow::Result<Vec<RecurringSchedule>> {
        let sql = format!(
            r#"
            SELECT * FROM {}
            WHERE tenant_uid = $1
            ORDER BY next_generation_date ASC
            "#,
            table(tenant, "recurring_schedules")
        );
        let rows: Vec<ScheduleRaw> = sqlx::query_as(&sql)
            .bind(*tenant.tenant_id.inner_ref())
            .fetch_all(&self.pool)
            .await?;
        let ids = rows.iter().map(|row| row.schedule_uid).collect::<Vec<_>>();
        let mut lines = self.lines_by_schedule(tenant, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let schedule_lines = lines.remove(&row.schedule_uid).unwrap_or_default();
                row.into_schedule(schedule_lines)
            })
            .collect())
    }

    async fn delete(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
    ) -> anyhow::Result<Option<RecurringSchedule>> {
        let schedule = match self.find(tenant, schedule_id).await? {
            Some(schedule) => schedule,
            None => return Ok(None),
        };
        // Lines are removed by the foreign key cascade
        let sql = format!(
            r#"
            DELETE FROM {}
            WHERE schedule_uid = $1 AND tenant_uid = $2
            "#,
            table(tenant, "recurring_schedules")
        );
        let deleted = sqlx::query(&sql)
            .bind(*schedule_id.inner_ref())
            .bind(*tenant.tenant_id.inner_ref())
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Ok(None);
        }
        Ok(Some(schedule))
    }

    async fn insert_line(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
        line: &ScheduleLine,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_lines(&mut tx, tenant, schedule_id, std::slice::from_ref(line)).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_lines(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
    ) -> anyhow::Result<Vec<ScheduleLine>> {
        let mut lines = self
            .lines_by_schedule(tenant, &[*schedule_id.inner_ref()])
            .await?;
        Ok(lines.remove(schedule_id.inner_ref()).unwrap_or_default())
    }

    async fn delete_lines(&self, tenant: &TenantScope, schedule_id: &ID) -> anyhow::Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE schedule_uid = $1",
            table(tenant, "recurring_schedule_lines")
        );
        let deleted = sqlx::query(&sql)
            .bind(*schedule_id.inner_ref())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    async fn set_active(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
        is_active: bool,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let sql = format!(
            r#"
            UPDATE {}
            SET is_active = $3,
            updated_at = $4
            WHERE schedule_uid = $1 AND tenant_uid = $2
            "#,
            table(tenant, "recurring_schedules")
        );
        let updated = sqlx::query(&sql)
            .bind(*schedule_id.inner_ref())
            .bind(*tenant.tenant_id.inner_ref())
            .bind(is_active)
            .bind(updated_at)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(updated > 0)
    }

    async fn find_due_ids(&self, tenant: &TenantScope, as_of: NaiveDate) -> anyhow::Result<Vec<ID>> {
        let sql = format!(
            r#"
            SELECT schedule_uid FROM {}
            WHERE tenant_uid = $1
            AND is_active
            AND next_generation_date <= $2
            AND (end_date IS NULL OR end_date >= $2)
            ORDER BY next_generation_date ASC
            "#,
            table(tenant, "recurring_schedules")
        );
        let ids: Vec<(Uuid,)> = sqlx::query_as(&sql)
            .bind(*tenant.tenant_id.inner_ref())
            .bind(as_of)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    "Unable to query due schedules for tenant: {}. DB returned error: {:?}",
                    tenant.tenant_id, e
                );
                e
            })?;
        Ok(ids.into_iter().map(|(id,)| id.into()).collect())
    }

    async fn update_after_generation(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
        next_generation_date: NaiveDate,
        generated_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let sql = format!(
            r#"
            UPDATE {}
            SET next_generation_date = $3,
            last_generated_at = $4,
            generated_count = generated_count + 1,
            updated_at = $4
            WHERE schedule_uid = $1 AND tenant_uid = $2
            "#,
            table(tenant, "recurring_schedules")
        );
        let updated = sqlx::query(&sql)
            .bind(*schedule_id.inner_ref())
            .bind(*tenant.tenant_id.inner_ref())
            .bind(next_generation_date)
            .bind(generated_at)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(anyhow::Error::msg(format!(
                "Recurring schedule: {} was not found",
                schedule_id
            )));
        }
        Ok(())
    }
}
