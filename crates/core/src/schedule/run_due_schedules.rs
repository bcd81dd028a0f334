use super::generate_document::GenerateDocumentUseCase;
use crate::error::BillingError;
use crate::shared::{
    cancellation::RunCancellation,
    collaborator::{call, CollaboratorError},
    usecase::{execute, UseCase},
};
use billing_scheduler_domain::{GenerationFailure, GenerationResult, TenantScope};
use billing_scheduler_infra::BillingContext;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

/// Generates a document for every schedule of the tenant that is due at
/// `as_of`. A failing schedule is reported in the result and does not stop
/// the run.
#[derive(Debug)]
pub struct RunDueSchedulesUseCase {
    pub tenant: TenantScope,
    pub as_of: DateTime<Utc>,
    pub cancellation: RunCancellation,
}

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("Unable to query due schedules, {0}")]
    QueryDue(CollaboratorError),
}

impl From<UseCaseError> for BillingError {
    fn from(_: UseCaseError) -> Self {
        Self::InternalError
    }
}

#[async_trait::async_trait]
impl UseCase for RunDueSchedulesUseCase {
    type Response = GenerationResult;

    type Errors = UseCaseError;

    const NAME: &'static str = "RunDueSchedules";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        let due_ids = call(
            ctx,
            "find due schedules",
            ctx.repos
                .schedules
                .find_due_ids(&self.tenant, self.as_of.date_naive()),
        )
        .await
        .map_err(UseCaseError::QueryDue)?;

        let mut result = GenerationResult {
            due: due_ids.len(),
            ..Default::default()
        };
        for schedule_id in due_ids {
            if self.cancellation.is_cancelled() {
                result.cancelled = true;
                break;
            }

            let usecase = GenerateDocumentUseCase {
                tenant: self.tenant.clone(),
                schedule_id: schedule_id.clone(),
                as_of: self.as_of,
            };
            match execute(usecase, ctx).await {
                Ok(outcome) => result.generated.push(outcome),
                Err(e) => result.failed.push(GenerationFailure {
                    schedule_id,
                    error: e.to_string(),
                }),
            }
        }

        info!(
            "Generation run for tenant: {} as of: {} finished. Due: {}, generated: {}, failed: {}, notifications not sent: {}",
            self.tenant.tenant_id,
            self.as_of,
            result.due,
            result.generated_count(),
            result.failed_count(),
            result.notifications_not_sent()
        );
        Ok(result)
    }
}
