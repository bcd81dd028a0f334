use crate::{
    document::{DocumentStatus, InvalidEnumValue},
    notification::TemplateType,
    shared::entity::{Entity, ID},
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// When a `ReminderRule` fires relative to the due date of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    BeforeDue,
    OnDue,
    AfterDue,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeDue => "BEFORE_DUE",
            Self::OnDue => "ON_DUE",
            Self::AfterDue => "AFTER_DUE",
        }
    }

    /// The due date a document must have to be selected at `as_of`.
    /// The offset is ignored for `OnDue`. `None` when the date is out of
    /// the supported range.
    pub fn target_due_date(&self, as_of: NaiveDate, days_offset: i32) -> Option<NaiveDate> {
        let offset = Duration::days(days_offset as i64);
        match self {
            Self::BeforeDue => as_of.checked_add_signed(offset),
            Self::OnDue => Some(as_of),
            Self::AfterDue => as_of.checked_sub_signed(offset),
        }
    }

    /// Document statuses that are eligible for a reminder
    pub fn candidate_statuses(&self) -> Vec<DocumentStatus> {
        match self {
            Self::BeforeDue | Self::OnDue => {
                vec![DocumentStatus::Unpaid, DocumentStatus::PartiallyPaid]
            }
            Self::AfterDue => vec![
                DocumentStatus::Unpaid,
                DocumentStatus::PartiallyPaid,
                DocumentStatus::Overdue,
            ],
        }
    }
}

impl Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BEFORE_DUE" => Ok(Self::BeforeDue),
            "ON_DUE" => Ok(Self::OnDue),
            "AFTER_DUE" => Ok(Self::AfterDue),
            _ => Err(InvalidEnumValue {
                kind: "trigger type",
                value: s.to_string(),
            }),
        }
    }
}

/// A tenant defined rule for sending payment reminders, e.g.
/// "7 days after the due date".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRule {
    pub id: ID,
    pub tenant_id: ID,
    pub name: String,
    pub trigger_type: TriggerType,
    pub days_offset: i32,
    pub template_type: TemplateType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Error, Debug, PartialEq)]
pub enum ReminderRuleValidationError {
    #[error("A name is required")]
    MissingName,
    #[error("Days offset can not be negative, got: {0}")]
    NegativeDaysOffset(i32),
    #[error("Days offset can not be more than 3650 days, got: {0}")]
    DaysOffsetTooLarge(i32),
}

impl ReminderRule {
    /// Ten years
    pub const MAX_DAYS_OFFSET: i32 = 3650;

    pub fn new(
        tenant_id: ID,
        name: String,
        trigger_type: TriggerType,
        days_offset: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        let template_type = match trigger_type {
            TriggerType::AfterDue => TemplateType::OverdueNotice,
            _ => TemplateType::PaymentReminder,
        };
        Self {
            id: Default::default(),
            tenant_id,
            name,
            trigger_type,
            days_offset,
            template_type,
            is_active: true,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn validate(&self) -> Result<(), ReminderRuleValidationError> {
        if self.name.trim().is_empty() {
            return Err(ReminderRuleValidationError::MissingName);
        }
        if self.days_offset < 0 {
            return Err(ReminderRuleValidationError::NegativeDaysOffset(
                self.days_offset,
            ));
        }
        if self.days_offset > Self::MAX_DAYS_OFFSET {
            return Err(ReminderRuleValidationError::DaysOffsetTooLarge(
                self.days_offset,
            ));
        }
        Ok(())
    }

    pub fn target_due_date(&self, as_of: NaiveDate) -> Option<NaiveDate> {
        self.trigger_type.target_due_date(as_of, self.days_offset)
    }
}

impl Entity for ReminderRule {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Status of a reminder delivery for a (document, rule) pair.
///
/// `Sent` is terminal. `Failed` rows do not block a new attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Failed,
    Canceled,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl FromStr for ReminderStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "SENT" => Ok(Self::Sent),
            "FAILED" => Ok(Self::Failed),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(InvalidEnumValue {
                kind: "reminder status",
                value: s.to_string(),
            }),
        }
    }
}

/// Ledger entry for one reminder attempt. A `Sent` entry for a
/// (document, rule) pair prevents the pair from being reminded again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentReminder {
    pub id: ID,
    pub tenant_id: ID,
    pub document_id: ID,
    pub rule_id: ID,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub email_log_id: Option<String>,
    pub error: Option<String>,
}

impl SentReminder {
    pub fn pending(tenant_id: ID, document_id: ID, rule_id: ID, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Default::default(),
            tenant_id,
            document_id,
            rule_id,
            status: ReminderStatus::Pending,
            created_at,
            sent_at: None,
            email_log_id: None,
            error: None,
        }
    }
}

impl Entity for SentReminder {
    fn id(&self) -> &ID {
        &self.id
    }
}
