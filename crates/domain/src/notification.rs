use crate::shared::entity::ID;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// Selects which email template is used for a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateType {
    Invoice,
    RecurringInvoice,
    PaymentReminder,
    OverdueNotice,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid template type: `{0}`")]
pub struct InvalidTemplateTypeError(pub String);

impl TemplateType {
    /// Template used when the configured one does not exist for a tenant.
    /// Only the document generation path falls back to it.
    pub const FALLBACK: TemplateType = TemplateType::Invoice;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "INVOICE",
            Self::RecurringInvoice => "RECURRING_INVOICE",
            Self::PaymentReminder => "PAYMENT_REMINDER",
            Self::OverdueNotice => "OVERDUE_NOTICE",
        }
    }
}

impl Display for TemplateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemplateType {
    type Err = InvalidTemplateTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INVOICE" => Ok(Self::Invoice),
            "RECURRING_INVOICE" => Ok(Self::RecurringInvoice),
            "PAYMENT_REMINDER" => Ok(Self::PaymentReminder),
            "OVERDUE_NOTICE" => Ok(Self::OverdueNotice),
            _ => Err(InvalidTemplateTypeError(s.to_string())),
        }
    }
}

/// A tenant owned email template as stored by the notification service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: ID,
    pub template_type: TemplateType,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}

/// Values a template is rendered with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateData {
    pub company_name: String,
    pub contact_name: String,
    pub document_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub due_date: NaiveDate,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendEmailRequest {
    pub template_type: TemplateType,
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub attachments: Vec<EmailAttachment>,
    /// The document this email is about
    pub related_id: Option<ID>,
}

/// Result of one pass through the notification pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchStatus {
    Sent,
    Failed,
    Skipped,
    NoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub sent: bool,
    pub status: DispatchStatus,
    /// Log identifier returned by the notification service
    pub log_id: Option<String>,
    /// Failure reason, or a diagnostic note when the email was sent in a
    /// degraded form (e.g. without its attachment)
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn sent(log_id: String, note: Option<String>) -> Self {
        Self {
            sent: true,
            status: DispatchStatus::Sent,
            log_id: Some(log_id),
            error: note,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            sent: false,
            status: DispatchStatus::Failed,
            log_id: None,
            error: Some(error),
        }
    }

    pub fn skipped(reason: &str) -> Self {
        Self {
            sent: false,
            status: DispatchStatus::Skipped,
            log_id: None,
            error: Some(reason.to_string()),
        }
    }

    pub fn no_config() -> Self {
        Self {
            sent: false,
            status: DispatchStatus::NoConfig,
            log_id: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_types_round_trip_through_their_names() {
        for t in &[
            TemplateType::Invoice,
            TemplateType::RecurringInvoice,
            TemplateType::PaymentReminder,
            TemplateType::OverdueNotice,
        ] {
            assert_eq!(t.as_str().parse::<TemplateType>(), Ok(*t));
        }
        assert!("WELCOME".parse::<TemplateType>().is_err());
    }
}
