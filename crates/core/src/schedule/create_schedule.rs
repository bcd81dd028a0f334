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

#[derive(Debug)]
pub struct CreateScheduleUseCase {
    pub tenant: TenantScope,
    pub contact_id: ID,
    pub name: String,
    pub document_type: DocumentType,
    pub currency: String,
    /// Frequency as given by the client, e.g. "MONTHLY"
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub payment_terms_days: i32,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub notification: ScheduleNotificationSettings,
    pub lines: Vec<ScheduleLineInput>,
}

#[derive(Error, Debug)]
pub enum UseCaseError {
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
            UseCaseError::InvalidFrequency(_) | UseCaseError::InvalidSchedule(_) => {
                Self::BadClientData(e.to_string())
            }
            UseCaseError::StorageError(_) => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for CreateScheduleUseCase {
    type Response = RecurringSchedule;

    type Errors = UseCaseError;

    const NAME: &'static str = "CreateSchedule";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        let frequency = self
            .frequency
            .parse::<Frequency>()
            .map_err(|_| UseCaseError::InvalidFrequency(self.frequency.clone()))?;

        let mut schedule = RecurringSchedule::new(
            self.tenant.tenant_id.clone(),
            self.contact_id.clone(),
            frequency,
            self.start_date,
            ctx.sys.now(),
        );
        schedule.name = self.name.trim().to_string();
        schedule.document_type = self.document_type;
        schedule.currency = self.currency.trim().to_uppercase();
        schedule.end_date = self.end_date;
        schedule.payment_terms_days = self.payment_terms_days;
        schedule.reference = self.reference.clone();
        schedule.notes = self.notes.clone();
        schedule.notification = self.notification.clone();
        schedule.set_lines(self.lines.clone());
        schedule.validate()?;

        call(
            ctx,
            "insert schedule",
            ctx.repos.schedules.insert(&self.tenant, &schedule),
        )
        .await?;

        Ok(schedule)
    }
}
