use crate::error::BillingError;
use crate::notification::{DispatchRequest, NotificationDispatcher};
use crate::shared::{
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{
    effective_quantity, CreateDocumentRequest, DeliveryStatus, DispatchOutcome, DispatchStatus,
    Document, DocumentLineRequest, GenerationOutcome, RecurringSchedule, TenantScope, ID,
};
use billing_scheduler_infra::BillingContext;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;
use tracing::{info, warn};

/// Generates the next document of a schedule and moves the schedule to its
/// next cycle.
///
/// The schedule is only advanced after the document was created, so a
/// failed attempt is retried for the same date by the next run. Emailing
/// the document is best effort and never fails the generation.
#[derive(Debug)]
pub struct GenerateDocumentUseCase {
    pub tenant: TenantScope,
    pub schedule_id: ID,
    /// Issue date of the document and generation time of the schedule
    pub as_of: DateTime<Utc>,
}

#[derive(Error, Debug, PartialEq)]
pub enum UseCaseError {
    #[error("The schedule with id: {0}, was not found.")]
    NotFound(ID),
    #[error("The schedule with id: {0}, is not active.")]
    NotActive(ID),
    #[error("Payment terms of {0} days put the due date out of range")]
    DueDateOutOfRange(i32),
    #[error(transparent)]
    StorageError(CollaboratorError),
    #[error(transparent)]
    CreateDocument(CollaboratorError),
    #[error("document {number} was created but the schedule was not advanced, {source}")]
    AdvanceSchedule {
        number: String,
        source: CollaboratorError,
    },
}

impl From<UseCaseError> for BillingError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(_) => Self::NotFound(e.to_string()),
            UseCaseError::NotActive(_) => Self::Conflict(e.to_string()),
            UseCaseError::DueDateOutOfRange(_) => Self::BadClientData(e.to_string()),
            UseCaseError::StorageError(_)
            | UseCaseError::CreateDocument(_)
            | UseCaseError::AdvanceSchedule { .. } => Self::InternalError,
        }
    }
}

fn document_request(
    schedule: &RecurringSchedule,
    issue_date: NaiveDate,
) -> Result<CreateDocumentRequest, UseCaseError> {
    let due_date = issue_date
        .checked_add_signed(Duration::days(schedule.payment_terms_days as i64))
        .ok_or(UseCaseError::DueDateOutOfRange(schedule.payment_terms_days))?;
    Ok(CreateDocumentRequest {
        contact_id: schedule.contact_id.clone(),
        document_type: schedule.document_type,
        issue_date,
        due_date,
        currency: schedule.currency.clone(),
        reference: schedule.reference.clone(),
        notes: schedule.notes.clone(),
        lines: schedule
            .lines
            .iter()
            .map(|line| DocumentLineRequest {
                description: line.description.clone(),
                quantity: effective_quantity(line.quantity),
                unit: line.unit.clone(),
                unit_price: line.unit_price,
                discount_percent: line.discount_percent,
                vat_rate: line.vat_rate,
                account_id: line.account_id.clone(),
                product_id: line.product_id.clone(),
            })
            .collect(),
        recurring_schedule_id: Some(schedule.id.clone()),
    })
}

fn delivery_status(outcome: &DispatchOutcome) -> DeliveryStatus {
    match outcome.status {
        DispatchStatus::Sent => DeliveryStatus::Sent,
        DispatchStatus::Failed => DeliveryStatus::Failed,
        DispatchStatus::Skipped | DispatchStatus::NoConfig => DeliveryStatus::Skipped,
    }
}

impl GenerateDocumentUseCase {
    async fn notify(
        &self,
        ctx: &BillingContext,
        schedule: &RecurringSchedule,
        document: Document,
    ) -> DispatchOutcome {
        let document_id = document.id.clone();
        let request = DispatchRequest::for_generated(schedule, document);
        let outcome = NotificationDispatcher::dispatch(ctx, &self.tenant, &request).await;

        let sent_at = if outcome.sent { Some(ctx.sys.now()) } else { None };
        if let Err(e) = call(
            ctx,
            "update delivery status",
            ctx.repos.documents.update_delivery_status(
                &self.tenant,
                &document_id,
                sent_at,
                delivery_status(&outcome),
                outcome.log_id.clone(),
            ),
        )
        .await
        {
            warn!(
                "Unable to store delivery status of document: {}. Error: {}",
                document_id, e
            );
        }
        outcome
    }
}

#[async_trait::async_trait]
impl UseCase for GenerateDocumentUseCase {
    type Response = GenerationOutcome;

    type Errors = UseCaseError;

    const NAME: &'static str = "GenerateDocument";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        let schedule = call(
            ctx,
            "find schedule",
            ctx.repos.schedules.find(&self.tenant, &self.schedule_id),
        )
        .await
        .map_err(UseCaseError::StorageError)?
        .ok_or_else(|| UseCaseError::NotFound(self.schedule_id.clone()))?;
        if !schedule.is_active {
            return Err(UseCaseError::NotActive(schedule.id));
        }

        let request = document_request(&schedule, self.as_of.date_naive())?;
        let document = call(
            ctx,
            "create document",
            ctx.services.documents.create(&self.tenant, &request),
        )
        .await
        .map_err(UseCaseError::CreateDocument)?;

        let next_generation_date = schedule.frequency.advance(schedule.next_generation_date);
        call(
            ctx,
            "update schedule",
            ctx.repos.schedules.update_after_generation(
                &self.tenant,
                &schedule.id,
                next_generation_date,
                self.as_of,
            ),
        )
        .await
        .map_err(|source| UseCaseError::AdvanceSchedule {
            number: document.number.clone(),
            source,
        })?;
        info!(
            "Generated document: {} for schedule: {}, next generation date: {}",
            document.number, schedule.id, next_generation_date
        );

        let mut outcome = GenerationOutcome {
            schedule_id: schedule.id.clone(),
            document_id: document.id.clone(),
            document_number: document.number.clone(),
            next_generation_date,
            notification: None,
        };
        if schedule.notification.send_on_generation {
            outcome.notification = Some(self.notify(ctx, &schedule, document).await);
        }

        Ok(outcome)
    }
}
