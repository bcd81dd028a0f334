use super::IRecurringScheduleRepo;
use crate::repos::shared::inmemory_repo::*;
use billing_scheduler_domain::{RecurringSchedule, ScheduleLine, TenantScope, ID};
use chrono::{DateTime, NaiveDate, Utc};

pub struct InMemoryRecurringScheduleRepo {
    schedules: std::sync::Mutex<Vec<RecurringSchedule>>,
}

impl InMemoryRecurringScheduleRepo {
    pub fn new() -> Self {
        Self {
            schedules: std::sync::Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryRecurringScheduleRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(schedule_id: &ID) -> anyhow::Error {
    anyhow::Error::msg(format!("Recurring schedule: {} was not found", schedule_id))
}

#[async_trait::async_trait]
impl IRecurringScheduleRepo for InMemoryRecurringScheduleRepo {
    async fn ensure_schema(&self, _tenant: &TenantScope) -> anyhow::Result<()> {
        Ok(())
    }

    async fn insert(
        &self,
        _tenant: &TenantScope,
        schedule: &RecurringSchedule,
    ) -> anyhow::Result<()> {
        insert(schedule, &self.schedules);
        Ok(())
    }

    async fn save(&self, _tenant: &TenantScope, schedule: &RecurringSchedule) -> anyhow::Result<()> {
        if save(schedule, &self.schedules) {
            Ok(())
        } else {
            Err(not_found(&schedule.id))
        }
    }

    async fn find(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
    ) -> anyhow::Result<Option<RecurringSchedule>> {
        Ok(find(tenant, schedule_id, &self.schedules))
    }

    async fn find_by_tenant(&self, tenant: &TenantScope) -> anyhow::Result<Vec<RecurringSchedule>> {
        Ok(find_by(tenant, &self.schedules, |_| true))
    }

    async fn delete(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
    ) -> anyhow::Result<Option<RecurringSchedule>> {
        Ok(delete(tenant, schedule_id, &self.schedules))
    }

    async fn insert_line(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
        line: &ScheduleLine,
    ) -> anyhow::Result<()> {
        if update(tenant, schedule_id, &self.schedules, |schedule| {
            schedule.lines.push(line.clone())
        }) {
            Ok(())
        } else {
            Err(not_found(schedule_id))
        }
    }

    async fn find_lines(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
    ) -> anyhow::Result<Vec<ScheduleLine>> {
        Ok(find(tenant, schedule_id, &self.schedules)
            .map(|schedule| schedule.lines)
            .unwrap_or_default())
    }

    async fn delete_lines(&self, tenant: &TenantScope, schedule_id: &ID) -> anyhow::Result<u64> {
        let mut deleted = 0;
        update(tenant, schedule_id, &self.schedules, |schedule| {
            deleted = schedule.lines.len() as u64;
            schedule.lines.clear();
        });
        Ok(deleted)
    }

    async fn set_active(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
        is_active: bool,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        Ok(update(tenant, schedule_id, &self.schedules, |schedule| {
            schedule.is_active = is_active;
            schedule.updated_at = updated_at;
        }))
    }

    async fn find_due_ids(&self, tenant: &TenantScope, as_of: NaiveDate) -> anyhow::Result<Vec<ID>> {
        let mut due = find_by(tenant, &self.schedules, |schedule| schedule.is_due(as_of));
        due.sort_by(|s1, s2| s1.next_generation_date.cmp(&s2.next_generation_date));
        Ok(due.into_iter().map(|schedule| schedule.id).collect())
    }

    async fn update_after_generation(
        &self,
        tenant: &TenantScope,
        schedule_id: &ID,
        next_generation_date: NaiveDate,
        generated_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let updated = update(tenant, schedule_id, &self.schedules, |schedule| {
            schedule.next_generation_date = next_generation_date;
            schedule.last_generated_at = Some(generated_at);
            schedule.generated_count += 1;
            schedule.updated_at = generated_at;
        });
        if updated {
            Ok(())
        } else {
            Err(not_found(schedule_id))
        }
    }
}
