use crate::shared::{
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{ReminderRule, TenantScope};
use billing_scheduler_infra::BillingContext;

#[derive(Debug)]
pub struct GetReminderRulesUseCase {
    pub tenant: TenantScope,
    pub active_only: bool,
}

#[async_trait::async_trait]
impl UseCase for GetReminderRulesUseCase {
    type Response = Vec<ReminderRule>;

    type Errors = CollaboratorError;

    const NAME: &'static str = "GetReminderRules";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        if self.active_only {
            call(
                ctx,
                "find active reminder rules",
                ctx.repos.reminder_rules.find_active(&self.tenant),
            )
            .await
        } else {
            call(
                ctx,
                "find reminder rules",
                ctx.repos.reminder_rules.find_by_tenant(&self.tenant),
            )
            .await
        }
    }
}
