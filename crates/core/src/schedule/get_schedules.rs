use crate::shared::{
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{RecurringSchedule, TenantScope};
use billing_scheduler_infra::BillingContext;

/// All schedules of a tenant ordered by their next generation date
#[derive(Debug)]
pub struct GetSchedulesUseCase {
    pub tenant: TenantScope,
}

#[async_trait::async_trait]
impl UseCase for GetSchedulesUseCase {
    type Response = Vec<RecurringSchedule>;

    type Errors = CollaboratorError;

    const NAME: &'static str = "GetSchedules";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        let mut schedules = call(
            ctx,
            "find schedules",
            ctx.repos.schedules.find_by_tenant(&self.tenant),
        )
        .await?;
        schedules.sort_by_key(|schedule| schedule.next_generation_date);
        Ok(schedules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::testing::{date, insert_schedule, setup};

    #[tokio::test]
    async fn lists_schedules_by_next_date() {
        let test = setup();
        let later = insert_schedule(&test, &test.contact.id, date(2025, 3, 1)).await;
        let sooner = insert_schedule(&test, &test.contact.id, date(2025, 2, 1)).await;

        let mut usecase = GetSchedulesUseCase {
            tenant: test.tenant.clone(),
        };
        let schedules = usecase.execute(&test.ctx).await.unwrap();
        let ids = schedules.into_iter().map(|s| s.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![sooner.id, later.id]);
    }
}
