mod inmemory;
mod postgres;

use billing_scheduler_domain::{RecurringSchedule, ScheduleLine, TenantScope, ID};
use chrono::{DateTime, NaiveDate, Utc};
pub use inmemory::InMemoryRecurringScheduleRepo;
pub use postgres::PostgresRecurringScheduleRepo;

#[async_trait::async_trait]
pub trait IRecurringScheduleRepo: Send + Sync {
    /// Creates the storage for the tenant if it does not exist yet
    async fn ensure_schema(&self, tenant: &TenantScope) -> anyhow::Result<()>;
    /// Inserts the schedule together with its lines
    async fn insert(&self, tenant: &TenantScope, schedule: &RecurringSchedule)
        -> anyhow::Result<()>;
    /// Updates the schedule and replaces all of its lines. Either everything
    /// is stored or nothing is.
    async fn save(&self, tenant: &TenantScope, schedule: &RecurringSchedule) -> anyhow::Result<()>;
    async fn find(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
    ) -> anyhow::Result<Option<RecurringSchedule>>;
    async fn find_by_tenant(&self, tenant: &TenantScope) -> anyhow::Result<Vec<RecurringSchedule>>;
    /// Deletes the schedule and its lines
    async fn delete(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
    ) -> anyhow::Result<Option<RecurringSchedule>>;
    async fn insert_line(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
        line: &ScheduleLine,
    ) -> anyhow::Result<()>;
    async fn find_lines(&self, tenant: &TenantScope, schedule_id: &ID)
        -> anyhow::Result<Vec<ScheduleLine>>;
    async fn delete_lines(&self, tenant: &TenantScope, schedule_id: &ID) -> anyhow::Result<u64>;
    /// Pauses or resumes a schedule. Returns false if it does not exist.
    async fn set_active(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
        is_active: bool,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
    /// Ids of the active schedules with `next_generation_date <= as_of` whose
    /// end date is absent or not before `as_of`
    async fn find_due_ids(&self, tenant: &TenantScope, as_of: NaiveDate) -> anyhow::Result<Vec<ID>>;
    /// Moves the schedule to its next cycle after a document was generated
    /// and increments `generated_count`, in a single write.
    async fn update_after_generation(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
        next_generation_date: NaiveDate,
        generated_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_scheduler_domain::{Frequency, ScheduleLineInput};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn tenant() -> TenantScope {
        TenantScope::new(ID::new(), "acme").unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule(tenant: &TenantScope, start: NaiveDate) -> RecurringSchedule {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut schedule = RecurringSchedule::new(
            tenant.tenant_id.clone(),
            ID::new(),
            Frequency::Monthly,
            start,
            now,
        );
        schedule.name = "Maintenance".into();
        schedule.set_lines(vec![ScheduleLineInput {
            description: "Maintenance".into(),
            quantity: Decimal::ONE,
            unit: None,
            unit_price: Decimal::from(100),
            discount_percent: Decimal::ZERO,
            vat_rate: Decimal::from(21),
            account_id: None,
            product_id: None,
        }]);
        schedule
    }

    #[tokio::test]
    async fn create_and_delete() {
        let repo = InMemoryRecurringScheduleRepo::new();
        let tenant = tenant();
        let schedule = schedule(&tenant, date(2025, 1, 15));

        assert!(repo.insert(&tenant, &schedule).await.is_ok());

        let res = repo.find(&tenant, &schedule.id).await.unwrap();
        assert_eq!(res, Some(schedule.clone()));
        assert_eq!(repo.find_by_tenant(&tenant).await.unwrap().len(), 1);

        // Other tenants do not see it
        let other = TenantScope::new(ID::new(), "other").unwrap();
        assert!(repo.find(&other, &schedule.id).await.unwrap().is_none());

        let deleted = repo.delete(&tenant, &schedule.id).await.unwrap();
        assert_eq!(deleted, Some(schedule.clone()));
        assert!(repo.find(&tenant, &schedule.id).await.unwrap().is_none());
        assert!(repo.find_lines(&tenant, &schedule.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finds_due_ids() {
        let repo = InMemoryRecurringScheduleRepo::new();
        let tenant = tenant();
        let as_of = date(2025, 1, 16);

        let due = schedule(&tenant, date(2025, 1, 15));
        let not_yet = schedule(&tenant, date(2025, 1, 17));
        let mut ended = schedule(&tenant, date(2025, 1, 1));
        ended.end_date = Some(date(2025, 1, 10));
        let mut paused = schedule(&tenant, date(2025, 1, 1));
        paused.is_active = false;
        let mut ends_today = schedule(&tenant, date(2025, 1, 1));
        ends_today.end_date = Some(as_of);

        for s in &[&due, &not_yet, &ended, &paused, &ends_today] {
            repo.insert(&tenant, s).await.unwrap();
        }

        let mut ids = repo.find_due_ids(&tenant, as_of).await.unwrap();
        ids.sort();
        let mut expected = vec![due.id.clone(), ends_today.id.clone()];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn updates_after_generation() {
        let repo = InMemoryRecurringScheduleRepo::new();
        let tenant = tenant();
        let schedule = schedule(&tenant, date(2025, 1, 15));
        repo.insert(&tenant, &schedule).await.unwrap();

        let generated_at = Utc.with_ymd_and_hms(2025, 1, 16, 8, 0, 0).unwrap();
        repo.update_after_generation(&tenant, &schedule.id, date(2025, 2, 15), generated_at)
            .await
            .unwrap();

        let stored = repo.find(&tenant, &schedule.id).await.unwrap().unwrap();
        assert_eq!(stored.next_generation_date, date(2025, 2, 15));
        assert_eq!(stored.last_generated_at, Some(generated_at));
        assert_eq!(stored.generated_count, 1);

        assert!(repo
            .update_after_generation(&tenant, &ID::new(), date(2025, 2, 15), generated_at)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn replaces_lines_on_save() {
        let repo = InMemoryRecurringScheduleRepo::new();
        let tenant = tenant();
        let mut schedule = schedule(&tenant, date(2025, 1, 15));
        repo.insert(&tenant, &schedule).await.unwrap();

        let mut line = schedule.lines[0].clone();
        line.id = ID::new();
        line.description = "Extra".into();
        schedule.lines = vec![line];
        repo.save(&tenant, &schedule).await.unwrap();

        let lines = repo.find_lines(&tenant, &schedule.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].description, "Extra");

        assert_eq!(repo.delete_lines(&tenant, &schedule.id).await.unwrap(), 1);
        repo.insert_line(&tenant, &schedule.id, &schedule.lines[0])
            .await
            .unwrap();
        assert_eq!(repo.find_lines(&tenant, &schedule.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pauses_and_resumes() {
        let repo = InMemoryRecurringScheduleRepo::new();
        let tenant = tenant();
        let schedule = schedule(&tenant, date(2025, 1, 15));
        repo.insert(&tenant, &schedule).await.unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();

        assert!(repo.set_active(&tenant, &schedule.id, false, now).await.unwrap());
        let stored = repo.find(&tenant, &schedule.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.lines, schedule.lines);

        assert!(repo.set_active(&tenant, &schedule.id, true, now).await.unwrap());
        assert!(!repo.set_active(&tenant, &ID::new(), true, now).await.unwrap());
    }
}
