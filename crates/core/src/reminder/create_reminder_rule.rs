use crate::error::BillingError;
use crate::shared::{
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{
    ReminderRule, ReminderRuleValidationError, TemplateType, TenantScope, TriggerType,
};
use billing_scheduler_infra::BillingContext;
use thiserror::Error;

#[derive(Debug)]
pub struct CreateReminderRuleUseCase {
    pub tenant: TenantScope,
    pub name: String,
    /// e.g. "AFTER_DUE"
    pub trigger_type: String,
    pub days_offset: i32,
    /// Defaults by trigger type when absent
    pub template_type: Option<String>,
}

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("Invalid trigger type: `{0}`")]
    InvalidTriggerType(String),
    #[error("Invalid template type: `{0}`")]
    InvalidTemplateType(String),
    #[error(transparent)]
    InvalidRule(#[from] ReminderRuleValidationError),
    #[error(transparent)]
    StorageError(#[from] CollaboratorError),
}

impl From<UseCaseError> for BillingError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError(_) => Self::InternalError,
            _ => Self::BadClientData(e.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl UseCase for CreateReminderRuleUseCase {
    type Response = ReminderRule;

    type Errors = UseCaseError;

    const NAME: &'static str = "CreateReminderRule";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        let trigger_type = self
            .trigger_type
            .parse::<TriggerType>()
            .map_err(|_| UseCaseError::InvalidTriggerType(self.trigger_type.clone()))?;

        let mut rule = ReminderRule::new(
            self.tenant.tenant_id.clone(),
            self.name.trim().to_string(),
            trigger_type,
            self.days_offset,
            ctx.sys.now(),
        );
        if let Some(template_type) = &self.template_type {
            rule.template_type = template_type
                .parse::<TemplateType>()
                .map_err(|_| UseCaseError::InvalidTemplateType(template_type.clone()))?;
        }
        rule.validate()?;

        call(
            ctx,
            "insert reminder rule",
            ctx.repos.reminder_rules.insert(&self.tenant, &rule),
        )
        .await?;

        Ok(rule)
    }
}
