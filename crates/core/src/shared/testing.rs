use billing_scheduler_domain::{
    Contact, Document, DocumentStatus, DocumentType, Frequency, RecurringSchedule,
    ScheduleLineInput, TemplateType, TenantProfile, TenantScope, TenantSettings, ID,
};
use billing_scheduler_infra::{BillingContext, InMemoryCollaborators, StaticTimeSys};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct TestContext {
    pub ctx: BillingContext,
    pub fakes: InMemoryCollaborators,
    pub tenant: TenantScope,
    pub contact: Contact,
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(y: i32, m: u32, d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hour, 0, 0).unwrap()
}

/// Tenant "Acme" with one contact and templates for every notification
/// type, on a clock fixed at 2025-01-16 08:00 UTC
pub fn setup() -> TestContext {
    let fakes = InMemoryCollaborators::new();
    let mut ctx = BillingContext::create_inmemory(&fakes);
    ctx.sys = Arc::new(StaticTimeSys::at(time(2025, 1, 16, 8)));

    let tenant = TenantScope::new(ID::new(), "acme").unwrap();
    fakes.back_office.add_tenant(TenantProfile {
        id: tenant.tenant_id.clone(),
        name: "Acme".into(),
        settings: TenantSettings::default(),
    });
    let contact = Contact {
        id: ID::new(),
        name: "Jane Doe".into(),
        email: Some("jane@example.com".into()),
    };
    fakes
        .back_office
        .add_contact(&tenant.tenant_id, contact.clone());
    for template_type in &[
        TemplateType::Invoice,
        TemplateType::RecurringInvoice,
        TemplateType::PaymentReminder,
        TemplateType::OverdueNotice,
    ] {
        fakes
            .notifications
            .add_template(&tenant.tenant_id, *template_type);
    }

    TestContext {
        ctx,
        fakes,
        tenant,
        contact,
    }
}

pub fn line_input(description: &str, quantity: i64, unit_price: i64) -> ScheduleLineInput {
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

/// Stores a valid monthly schedule for the contact
pub async fn insert_schedule(
    test: &TestContext,
    contact_id: &ID,
    next_generation_date: NaiveDate,
) -> RecurringSchedule {
    let mut schedule = RecurringSchedule::new(
        test.tenant.tenant_id.clone(),
        contact_id.clone(),
        Frequency::Monthly,
        next_generation_date,
        time(2025, 1, 1, 0),
    );
    schedule.name = "Hosting".into();
    schedule.set_lines(vec![line_input("Hosting", 1, 100)]);
    test.ctx
        .repos
        .schedules
        .insert(&test.tenant, &schedule)
        .await
        .unwrap();
    schedule
}

/// Stores an unpaid invoice of 121.00 for the contact
pub fn insert_invoice(test: &TestContext, contact_id: &ID, due_date: NaiveDate) -> Document {
    let document = Document {
        id: ID::new(),
        tenant_id: test.tenant.tenant_id.clone(),
        contact_id: contact_id.clone(),
        number: format!("INV-{}", due_date),
        document_type: DocumentType::Invoice,
        status: DocumentStatus::Unpaid,
        issue_date: due_date,
        due_date,
        currency: "EUR".into(),
        total: Decimal::new(12100, 2),
        amount_paid: Decimal::ZERO,
        recurring_schedule_id: None,
        email_sent_at: None,
        email_status: None,
        email_log_id: None,
    };
    test.fakes.back_office.add_document(document.clone());
    document
}
