mod directory;
mod document;
mod frequency;
pub mod interest;
mod notification;
mod reminder;
mod report;
mod schedule;
mod shared;
mod tenant;

pub use directory::{Contact, TenantProfile, TenantSettings};
pub use document::{
    CreateDocumentRequest, DeliveryStatus, Document, DocumentLineRequest, DocumentStatus,
    DocumentType, InvalidEnumValue, ReminderCandidate,
};
pub use frequency::{advance, Frequency, InvalidFrequencyError};
pub use notification::{
    DispatchOutcome, DispatchStatus, EmailAttachment, InvalidTemplateTypeError, RenderedMessage,
    SendEmailRequest, Template, TemplateData, TemplateType,
};
pub use reminder::{
    ReminderRule, ReminderRuleValidationError, ReminderStatus, SentReminder, TriggerType,
};
pub use report::{
    GenerationFailure, GenerationOutcome, GenerationResult, ReminderRunResult, RuleRunSummary,
};
pub use schedule::{
    effective_quantity, RecurringSchedule, ScheduleLine, ScheduleLineInput,
    ScheduleNotificationSettings, ScheduleValidationError,
};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use tenant::{InvalidTenantScope, TenantScope};
