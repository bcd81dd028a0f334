use crate::{
    document::DocumentType,
    frequency::Frequency,
    notification::TemplateType,
    shared::entity::{Entity, ID},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A template for documents that are generated periodically for a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringSchedule {
    pub id: ID,
    pub tenant_id: ID,
    /// The customer the generated documents are addressed to
    pub contact_id: ID,
    pub name: String,
    pub document_type: DocumentType,
    pub currency: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// The next date this schedule is due. Only advanced after a
    /// document was created successfully.
    pub next_generation_date: NaiveDate,
    pub payment_terms_days: i32,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub last_generated_at: Option<DateTime<Utc>>,
    /// Number of documents generated so far
    pub generated_count: i64,
    pub notification: ScheduleNotificationSettings,
    pub lines: Vec<ScheduleLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleNotificationSettings {
    pub send_on_generation: bool,
    pub template_type: TemplateType,
    /// Overrides the email address of the contact
    pub recipient_email: Option<String>,
    pub attach_document: bool,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl Default for ScheduleNotificationSettings {
    fn default() -> Self {
        Self {
            send_on_generation: false,
            template_type: TemplateType::RecurringInvoice,
            recipient_email: None,
            attach_document: true,
            subject: None,
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleLine {
    pub id: ID,
    pub position: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub vat_rate: Decimal,
    pub account_id: Option<ID>,
    pub product_id: Option<ID>,
}

/// Client provided values for a `ScheduleLine`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleLineInput {
    pub description: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_percent: Decimal,
    #[serde(default)]
    pub vat_rate: Decimal,
    #[serde(default)]
    pub account_id: Option<ID>,
    #[serde(default)]
    pub product_id: Option<ID>,
}

impl ScheduleLine {
    /// Builds a line from client input. A zero quantity means "one unit".
    pub fn from_input(input: ScheduleLineInput, position: i32) -> Self {
        Self {
            id: Default::default(),
            position,
            description: input.description.trim().to_string(),
            quantity: effective_quantity(input.quantity),
            unit: input.unit,
            unit_price: input.unit_price,
            discount_percent: input.discount_percent,
            vat_rate: input.vat_rate,
            account_id: input.account_id,
            product_id: input.product_id,
        }
    }
}

/// Quantity used for a line, where zero is read as one
pub fn effective_quantity(quantity: Decimal) -> Decimal {
    if quantity.is_zero() {
        Decimal::ONE
    } else {
        quantity
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ScheduleValidationError {
    #[error("A name is required")]
    MissingName,
    #[error("A contact is required")]
    MissingContact,
    #[error("A currency is required")]
    MissingCurrency,
    #[error("Payment terms can not be negative, got: {0}")]
    NegativePaymentTerms(i32),
    #[error("Payment terms can not be more than 3650 days, got: {0}")]
    PaymentTermsTooLong(i32),
    #[error("End date: {end} is before start date: {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("At least one line is required")]
    NoLines,
    #[error("Line {0} has an empty description")]
    EmptyLineDescription(usize),
    #[error("Line {0} must have a quantity greater than zero")]
    NonPositiveQuantity(usize),
    #[error("Line {0} has a negative unit price")]
    NegativeUnitPrice(usize),
    #[error("Line {0} has a discount outside of 0-100%")]
    InvalidDiscount(usize),
    #[error("Line {0} has a negative VAT rate")]
    NegativeVatRate(usize),
}

impl RecurringSchedule {
    /// Ten years
    pub const MAX_PAYMENT_TERMS_DAYS: i32 = 3650;

    pub fn new(
        tenant_id: ID,
        contact_id: ID,
        frequency: Frequency,
        start_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Default::default(),
            tenant_id,
            contact_id,
            name: String::new(),
            document_type: DocumentType::Invoice,
            currency: "EUR".into(),
            frequency,
            start_date,
            end_date: None,
            next_generation_date: start_date,
            payment_terms_days: 14,
            reference: None,
            notes: None,
            is_active: true,
            last_generated_at: None,
            generated_count: 0,
            notification: Default::default(),
            lines: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn set_lines(&mut self, lines: Vec<ScheduleLineInput>) {
        self.lines = lines
            .into_iter()
            .enumerate()
            .map(|(pos, line)| ScheduleLine::from_input(line, pos as i32))
            .collect();
    }

    /// Whether a document should be generated for this schedule at `as_of`
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.is_active
            && self.next_generation_date <= as_of
            && self.end_date.map(|end| end >= as_of).unwrap_or(true)
    }

    pub fn validate(&self) -> Result<(), ScheduleValidationError> {
        if self.name.trim().is_empty() {
            return Err(ScheduleValidationError::MissingName);
        }
        if self.contact_id.inner_ref().is_nil() {
            return Err(ScheduleValidationError::MissingContact);
        }
        if self.currency.trim().is_empty() {
            return Err(ScheduleValidationError::MissingCurrency);
        }
        if self.payment_terms_days < 0 {
            return Err(ScheduleValidationError::NegativePaymentTerms(
                self.payment_terms_days,
            ));
        }
        if self.payment_terms_days > Self::MAX_PAYMENT_TERMS_DAYS {
            return Err(ScheduleValidationError::PaymentTermsTooLong(
                self.payment_terms_days,
            ));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ScheduleValidationError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        if self.lines.is_empty() {
            return Err(ScheduleValidationError::NoLines);
        }
        for (i, line) in self.lines.iter().enumerate() {
            let line_no = i + 1;
            if line.description.trim().is_empty() {
                return Err(ScheduleValidationError::EmptyLineDescription(line_no));
            }
            if line.quantity <= Decimal::ZERO {
                return Err(ScheduleValidationError::NonPositiveQuantity(line_no));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(ScheduleValidationError::NegativeUnitPrice(line_no));
            }
            if line.discount_percent < Decimal::ZERO || line.discount_percent > Decimal::ONE_HUNDRED
            {
                return Err(ScheduleValidationError::InvalidDiscount(line_no));
            }
            if line.vat_rate < Decimal::ZERO {
                return Err(ScheduleValidationError::NegativeVatRate(line_no));
            }
        }
        Ok(())
    }
}

impl Entity for RecurringSchedule {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(description: &str, quantity: i64, unit_price: i64) -> ScheduleLineInput {
        ScheduleLineInput {
            description: description.into(),
            quantity: Decimal::from(quantity),
            unit: None,
            unit_price: Decimal::from(unit_price),
            discount_percent: Decimal::ZERO,
            vat_rate: Decimal::from(21),
            account_id: None,
            product_id: None,
        }
    }

    fn schedule() -> RecurringSchedule {
        let mut schedule = RecurringSchedule::new(
            ID::new(),
            ID::new(),
            Frequency::Monthly,
            date(2025, 1, 15),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        );
        schedule.name = "Hosting".into();
        schedule.set_lines(vec![line("Hosting", 1, 50)]);
        schedule
    }

    #[test]
    fn new_schedule_starts_at_start_date() {
        let schedule = schedule();
        assert_eq!(schedule.next_generation_date, date(2025, 1, 15));
        assert_eq!(schedule.generated_count, 0);
        assert!(schedule.is_active);
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn zero_quantity_defaults_to_one() {
        let mut schedule = schedule();
        schedule.set_lines(vec![line("Support", 0, 10), line("Licenses", 3, 10)]);
        assert_eq!(schedule.lines[0].quantity, Decimal::ONE);
        assert_eq!(schedule.lines[1].quantity, Decimal::from(3));
        assert_eq!(schedule.lines[1].position, 1);
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_schedules() {
        let mut s = schedule();
        s.name = " ".into();
        assert_eq!(s.validate(), Err(ScheduleValidationError::MissingName));

        let mut s = schedule();
        s.payment_terms_days = -1;
        assert_eq!(
            s.validate(),
            Err(ScheduleValidationError::NegativePaymentTerms(-1))
        );

        let mut s = schedule();
        s.payment_terms_days = i32::MAX;
        assert_eq!(
            s.validate(),
            Err(ScheduleValidationError::PaymentTermsTooLong(i32::MAX))
        );

        let mut s = schedule();
        s.end_date = Some(date(2025, 1, 1));
        assert!(matches!(
            s.validate(),
            Err(ScheduleValidationError::EndBeforeStart { .. })
        ));

        let mut s = schedule();
        s.lines.clear();
        assert_eq!(s.validate(), Err(ScheduleValidationError::NoLines));

        let mut s = schedule();
        s.set_lines(vec![line("", 1, 1)]);
        assert_eq!(
            s.validate(),
            Err(ScheduleValidationError::EmptyLineDescription(1))
        );

        let mut s = schedule();
        s.set_lines(vec![line("a", 1, 1), line("b", -2, 1)]);
        assert_eq!(
            s.validate(),
            Err(ScheduleValidationError::NonPositiveQuantity(2))
        );

        let mut s = schedule();
        s.set_lines(vec![line("a", 1, -1)]);
        assert_eq!(s.validate(), Err(ScheduleValidationError::NegativeUnitPrice(1)));
    }

    #[test]
    fn end_date_equal_to_start_is_allowed() {
        let mut s = schedule();
        s.end_date = Some(s.start_date);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn due_check() {
        let mut s = schedule();
        assert!(!s.is_due(date(2025, 1, 14)));
        assert!(s.is_due(date(2025, 1, 15)));
        assert!(s.is_due(date(2025, 1, 16)));

        s.end_date = Some(date(2025, 1, 15));
        assert!(!s.is_due(date(2025, 1, 16)));

        s.end_date = None;
        s.is_active = false;
        assert!(!s.is_due(date(2025, 1, 16)));
    }
}
