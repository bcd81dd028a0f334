use super::utils::time;
use billing_scheduler_domain::{Contact, TemplateType, TenantProfile, TenantScope, TenantSettings, ID};
use billing_scheduler_infra::{BillingContext, InMemoryCollaborators, StaticTimeSys};
use std::sync::Arc;

pub struct TestApp {
    pub ctx: BillingContext,
    pub fakes: InMemoryCollaborators,
    pub tenant: TenantScope,
    pub contact: Contact,
}

impl TestApp {
    /// Moves the clock of the context
    pub fn set_time(&mut self, now: chrono::DateTime<chrono::Utc>) {
        self.ctx.sys = Arc::new(StaticTimeSys::at(now));
    }
}

/// In memory application with one tenant and one contact, with every
/// notification template available
pub async fn spawn_app() -> TestApp {
    let fakes = InMemoryCollaborators::new();
    let mut ctx = BillingContext::create_inmemory(&fakes);
    ctx.sys = Arc::new(StaticTimeSys::at(time(2025, 1, 16, 8)));

    let tenant = TenantScope::new(ID::new(), "integration").unwrap();
    ctx.repos
        .ensure_schema(&tenant)
        .await
        .expect("In memory schema to be created");
    ctx.config.tenants = vec![tenant.clone()];

    fakes.back_office.add_tenant(TenantProfile {
        id: tenant.tenant_id.clone(),
        name: "Integration Ltd".into(),
        settings: TenantSettings::default(),
    });
    let contact = Contact {
        id: ID::new(),
        name: "John Smith".into(),
        email: Some("john@example.com".into()),
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

    TestApp {
        ctx,
        fakes,
        tenant,
        contact,
    }
}
