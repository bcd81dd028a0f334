use crate::error::BillingError;
use crate::shared::{
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{ReminderRule, TenantScope, ID};
use billing_scheduler_infra::BillingContext;
use thiserror::Error;

#[derive(Debug)]
pub struct DeleteReminderRuleUseCase {
    pub tenant: TenantScope,
    pub rule_id: ID,
}

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("The reminder rule with id: {0}, was not found.")]
    NotFound(ID),
    #[error(transparent)]
    StorageError(#[from] CollaboratorError),
}

impl From<UseCaseError> for BillingError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(_) => Self::NotFound(e.to_string()),
            UseCaseError::StorageError(_) => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for DeleteReminderRuleUseCase {
    type Response = ReminderRule;

    type Errors = UseCaseError;

    const NAME: &'static str = "DeleteReminderRule";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        call(
            ctx,
            "delete reminder rule",
            ctx.repos.reminder_rules.delete(&self.tenant, &self.rule_id),
        )
        .await?
        .ok_or_else(|| UseCaseError::NotFound(self.rule_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::testing::setup;
    use billing_scheduler_domain::TriggerType;

    #[tokio::test]
    async fn deletes_rule() {
        let test = setup();
        let rule = ReminderRule::new(
            test.tenant.tenant_id.clone(),
            "On due".into(),
            TriggerType::OnDue,
            0,
            test.ctx.sys.now(),
        );
        test.ctx
            .repos
            .reminder_rules
            .insert(&test.tenant, &rule)
            .await
            .unwrap();

        let mut usecase = DeleteReminderRuleUseCase {
            tenant: test.tenant.clone(),
            rule_id: rule.id.clone(),
        };
        assert_eq!(usecase.execute(&test.ctx).await.unwrap(), rule);
        assert!(matches!(
            usecase.execute(&test.ctx).await,
            Err(UseCaseError::NotFound(_))
        ));
    }
}
