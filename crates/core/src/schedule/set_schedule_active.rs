use crate::error::BillingError;
use crate::shared::{
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{TenantScope, ID};
use billing_scheduler_infra::BillingContext;
use thiserror::Error;

/// Pauses or resumes a schedule. Nothing but the active flag changes, so a
/// resumed schedule continues from its stored next generation date.
#[derive(Debug)]
pub struct SetScheduleActiveUseCase {
    pub tenant: TenantScope,
    pub schedule_id: ID,
    pub is_active: bool,
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
impl UseCase for SetScheduleActiveUseCase {
    type Response = ();

    type Errors = UseCaseError;

    const NAME: &'static str = "SetScheduleActive";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        let updated = call(
            ctx,
            "set schedule active",
            ctx.repos.schedules.set_active(
                &self.tenant,
                &self.schedule_id,
                self.is_active,
                ctx.sys.now(),
            ),
        )
        .await?;
        if !updated {
            return Err(UseCaseError::NotFound(self.schedule_id.clone()));
        }
        Ok(())
    }
}
