use crate::error::BillingError;
use crate::shared::{
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{
    DocumentType, Frequency, RecurringSchedule, ScheduleLineInput, ScheduleNotificationSettings,
    ScheduleValidationError, TenantScope, ID,
};
use billing_scheduler_infra::BillingContext;
use chrono::NaiveDate;
use thiserror::Error;

/// Updates the given fields of a schedule. Lines, when given, replace all
/// existing lines.
#[derive(Debug)]
pub struct UpdateScheduleUseCase {
    pub tenant: TenantScope,
    pub schedule_id: ID,
    pub contact_id: Option<ID>,
    pub name: Option<String>,
    pub document_type: Option<DocumentType>,
    pub currency: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
    /// `Some(None)` removes the end date
    pub end_date: Option<Option<NaiveDate>>,
    pub payment_terms_days: Option<i32>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub notification: Option<ScheduleNotificationSettings>,
    pub lines: Option<Vec<ScheduleLineInput>>,
}

impl UpdateScheduleUseCase {
    /// An update that changes nothing
    pub fn new(tenant: TenantScope, schedule_id: ID) -> Self {
        Self {
            tenant,
            schedule_id,
            contact_id: None,
            name: None,
            document_type: None,
            currency: None,
            frequency: None,
            start_date: None,
            end_date: None,
            payment_terms_days: None,
            reference: None,
            notes: None,
            notification: None,
            lines: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("The schedule with id: {0}, was not found.")]
    NotFound(ID),
    #[error("Invalid frequency: `{0}`")]
    InvalidFrequency(String),
    #[error(transparent)]
    InvalidSchedule(#[from] ScheduleValidationError),
    #[error(transparent)]
    StorageError(#[from] CollaboratorError),
}

impl From<UseCaseError> for BillingError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(_) => Self::NotFound(e.to_string()),
            UseCaseError::InvalidFrequency(_) | UseCaseError::InvalidSchedule(_) => {
                Self::BadClientData(e.to_string())
            }
            UseCaseError::StorageError(_) => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for UpdateScheduleUseCase {
    type Response = RecurringSchedule;

    type Errors = UseCaseError;

    const NAME: &'static str = "UpdateSchedule";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        let mut schedule = call(
            ctx,
            "find schedule",
            ctx.repos.schedules.find(&self.tenant, &self.schedule_id),
        )
        .await?
        .ok_or_else(|| UseCaseError::NotFound(self.schedule_id.clone()))?;

        if let Some(frequency) = &self.frequency {
            schedule.frequency = frequency
                .parse::<Frequency>()
                .map_err(|_| UseCaseError::InvalidFrequency(frequency.clone()))?;
        }
        if let Some(contact_id) = &self.contact_id {
            schedule.contact_id = contact_id.clone();
        }
        if let Some(name) = &self.name {
            schedule.name = name.trim().to_string();
        }
        if let Some(document_type) = self.document_type {
            schedule.document_type = document_type;
        }
        if let Some(currency) = &self.currency {
            schedule.currency = currency.trim().to_uppercase();
        }
        if let Some(start_date) = self.start_date {
            schedule.start_date = start_date;
            // A schedule that never generated anything starts over
            if schedule.generated_count == 0 {
                schedule.next_generation_date = start_date;
            }
        }
        if let Some(end_date) = self.end_date {
            schedule.end_date = end_date;
        }
        if let Some(payment_terms_days) = self.payment_terms_days {
            schedule.payment_terms_days = payment_terms_days;
        }
        if let Some(reference) = &self.reference {
            schedule.reference = Some(reference.clone());
        }
        if let Some(notes) = &self.notes {
            schedule.notes = Some(notes.clone());
        }
        if let Some(notification) = &self.notification {
            schedule.notification = notification.clone();
        }
        if let Some(lines) = &self.lines {
            schedule.set_lines(lines.clone());
        }
        schedule.updated_at = ctx.sys.now();
        schedule.validate()?;

        call(
            ctx,
            "save schedule",
            ctx.repos.schedules.save(&self.tenant, &schedule),
        )
        .await?;

        Ok(schedule)
    }
}
