use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Invoice,
    Proforma,
    CreditNote,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid {kind}: `{value}`")]
pub struct InvalidEnumValue {
    pub kind: &'static str,
    pub value: String,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "INVOICE",
            Self::Proforma => "PROFORMA",
            Self::CreditNote => "CREDIT_NOTE",
        }
    }
}

impl FromStr for DocumentType {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INVOICE" => Ok(Self::Invoice),
            "PROFORMA" => Ok(Self::Proforma),
            "CREDIT_NOTE" => Ok(Self::CreditNote),
            _ => Err(InvalidEnumValue {
                kind: "document type",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    Unpaid,
    PartiallyPaid,
    Paid,
    Overdue,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Unpaid => "UNPAID",
            Self::PartiallyPaid => "PARTIALLY_PAID",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "UNPAID" => Ok(Self::Unpaid),
            "PARTIALLY_PAID" => Ok(Self::PartiallyPaid),
            "PAID" => Ok(Self::Paid),
            "OVERDUE" => Ok(Self::Overdue),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(InvalidEnumValue {
                kind: "document status",
                value: s.to_string(),
            }),
        }
    }
}

/// Email delivery status persisted on a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    Skipped,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "SENT" => Ok(Self::Sent),
            "FAILED" => Ok(Self::Failed),
            "SKIPPED" => Ok(Self::Skipped),
            _ => Err(InvalidEnumValue {
                kind: "delivery status",
                value: s.to_string(),
            }),
        }
    }
}

/// A customer facing billing document, e.g. an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: ID,
    pub tenant_id: ID,
    pub contact_id: ID,
    pub number: String,
    pub document_type: DocumentType,
    pub status: DocumentStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub recurring_schedule_id: Option<ID>,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub email_status: Option<DeliveryStatus>,
    pub email_log_id: Option<String>,
}

impl Document {
    pub fn outstanding(&self) -> Decimal {
        self.total - self.amount_paid
    }
}

impl Entity for Document {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Request handed to the document creation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub contact_id: ID,
    pub document_type: DocumentType,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<DocumentLineRequest>,
    pub recurring_schedule_id: Option<ID>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLineRequest {
    pub description: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub vat_rate: Decimal,
    pub account_id: Option<ID>,
    pub product_id: Option<ID>,
}

/// An open document selected by a reminder rule together with the contact
/// it should be sent to
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderCandidate {
    pub document: Document,
    pub contact_name: String,
    pub contact_email: Option<String>,
}

impl ReminderCandidate {
    /// Non blank email address of the contact
    pub fn email(&self) -> Option<&str> {
        self.contact_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outstanding_is_total_minus_paid() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let document = Document {
            id: ID::new(),
            tenant_id: ID::new(),
            contact_id: ID::new(),
            number: "2025-001".into(),
            document_type: DocumentType::Invoice,
            status: DocumentStatus::PartiallyPaid,
            issue_date: date,
            due_date: date,
            currency: "EUR".into(),
            total: Decimal::new(12100, 2),
            amount_paid: Decimal::new(2100, 2),
            recurring_schedule_id: None,
            email_sent_at: None,
            email_status: None,
            email_log_id: None,
        };
        assert_eq!(document.outstanding(), Decimal::from(100));

        let candidate = ReminderCandidate {
            document,
            contact_name: "Jane".into(),
            contact_email: Some("  ".into()),
        };
        assert_eq!(candidate.email(), None);
    }
}
