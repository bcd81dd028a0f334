use crate::error::BillingError;
use crate::shared::{
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{
    ReminderRule, ReminderRuleValidationError, TemplateType, TenantScope, TriggerType, ID,
};
use billing_scheduler_infra::BillingContext;
use thiserror::Error;

/// Updates the given fields of a reminder rule
#[derive(Debug)]
pub struct UpdateReminderRuleUseCase {
    pub tenant: TenantScope,
    pub rule_id: ID,
    pub name: Option<String>,
    pub trigger_type: Option<String>,
    pub days_offset: Option<i32>,
    pub template_type: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateReminderRuleUseCase {
    pub fn new(tenant: TenantScope, rule_id: ID) -> Self {
        Self {
            tenant,
            rule_id,
            name: None,
            trigger_type: None,
            days_offset: None,
            template_type: None,
            is_active: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("The reminder rule with id: {0}, was not found.")]
    NotFound(ID),
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
            UseCaseError::NotFound(_) => Self::NotFound(e.to_string()),
            UseCaseError::StorageError(_) => Self::InternalError,
            _ => Self::BadClientData(e.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl UseCase for UpdateReminderRuleUseCase {
    type Response = ReminderRule;

    type Errors = UseCaseError;

    const NAME: &'static str = "UpdateReminderRule";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        let mut rule = call(
            ctx,
            "find reminder rule",
            ctx.repos.reminder_rules.find(&self.tenant, &self.rule_id),
        )
        .await?
        .ok_or_else(|| UseCaseError::NotFound(self.rule_id.clone()))?;

        if let Some(name) = &self.name {
            rule.name = name.trim().to_string();
        }
        if let Some(trigger_type) = &self.trigger_type {
            rule.trigger_type = trigger_type
                .parse::<TriggerType>()
                .map_err(|_| UseCaseError::InvalidTriggerType(trigger_type.clone()))?;
        }
        if let Some(days_offset) = self.days_offset {
            rule.days_offset = days_offset;
        }
        if let Some(template_type) = &self.template_type {
            rule.template_type = template_type
                .parse::<TemplateType>()
                .map_err(|_| UseCaseError::InvalidTemplateType(template_type.clone()))?;
        }
        if let Some(is_active) = self.is_active {
            rule.is_active = is_active;
        }
        rule.validate()?;
        rule.updated_at = ctx.sys.now();

        call(
            ctx,
            "save reminder rule",
            ctx.repos.reminder_rules.save(&self.tenant, &rule),
        )
        .await?;

        Ok(rule)
    }
}
