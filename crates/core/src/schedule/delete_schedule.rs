use crate::error::BillingError;
use crate::shared::{
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{RecurringSchedule, TenantScope, ID};
use billing_scheduler_infra::BillingContext;
use thiserror::Error;

/// Deletes a schedule together with its lines
#[derive(Debug)]
pub struct DeleteScheduleUseCase {
    pub tenant: TenantScope,
    pub schedule_id: ID,
}

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("The schedule with id: {0}, was not found.")]
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
impl UseCase for DeleteScheduleUseCase {
    type Response = RecurringSchedule;

    type Errors = UseCaseError;

    const NAME: &'static str = "DeleteSchedule";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        call(
            ctx,
            "delete schedule",
            ctx.repos.schedules.delete(&self.tenant, &self.schedule_id),
        )
        .await?
        .ok_or_else(|| UseCaseError::NotFound(self.schedule_id.clone()))
    }
}
