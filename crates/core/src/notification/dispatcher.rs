use crate::shared::collaborator::call;
use billing_scheduler_domain::{
    Contact, DispatchOutcome, Document, EmailAttachment, ReminderCandidate, ReminderRule,
    RecurringSchedule, SendEmailRequest, Template, TemplateData, TemplateType, TenantProfile,
    TenantScope, TenantSettings,
};
use billing_scheduler_infra::{BillingContext, INotificationService};
use tracing::{info, warn};

/// How a missing template is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateLookup {
    /// Use the `TemplateType::FALLBACK` template instead. Used when
    /// documents are generated.
    FallbackToDefault,
    /// Fail the notification. Used for reminders.
    Strict,
}

/// A notification about a single document
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub document: Document,
    pub template_type: TemplateType,
    pub lookup: TemplateLookup,
    /// Known recipient. Looked up in the contact directory when absent.
    pub contact: Option<Contact>,
    /// Overrides the email address of the contact
    pub recipient_email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub attach_document: bool,
}

impl DispatchRequest {
    pub fn for_generated(schedule: &RecurringSchedule, document: Document) -> Self {
        let settings = &schedule.notification;
        Self {
            document,
            template_type: settings.template_type,
            lookup: TemplateLookup::FallbackToDefault,
            contact: None,
            recipient_email: settings.recipient_email.clone(),
            subject: settings.subject.clone(),
            message: settings.message.clone(),
            attach_document: settings.attach_document,
        }
    }

    pub fn for_reminder(rule: &ReminderRule, candidate: &ReminderCandidate) -> Self {
        let contact = Contact {
            id: candidate.document.contact_id.clone(),
            name: candidate.contact_name.clone(),
            email: candidate.email().map(String::from),
        };
        Self {
            document: candidate.document.clone(),
            template_type: rule.template_type,
            lookup: TemplateLookup::Strict,
            contact: Some(contact),
            recipient_email: None,
            subject: None,
            message: None,
            attach_document: true,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Emails a document to its contact: template lookup, render, optional pdf
/// attachment and send. Never fails, every problem ends up in the returned
/// `DispatchOutcome`.
pub struct NotificationDispatcher;

impl NotificationDispatcher {
    #[tracing::instrument(
        name = "Dispatching notification",
        skip(ctx, tenant, request),
        fields(document = %request.document.id, template = %request.template_type)
    )]
    pub async fn dispatch(
        ctx: &BillingContext,
        tenant: &TenantScope,
        request: &DispatchRequest,
    ) -> DispatchOutcome {
        let notifications = match &ctx.services.notifications {
            Some(notifications) => notifications.as_ref(),
            None => return DispatchOutcome::no_config(),
        };

        let profile = match Self::tenant_profile(ctx, tenant).await {
            Ok(profile) => profile,
            Err(e) => return DispatchOutcome::failed(e),
        };
        let contact = match &request.contact {
            Some(contact) => Some(contact.clone()),
            None => match Self::contact(ctx, tenant, request).await {
                Ok(contact) => contact,
                Err(e) => return DispatchOutcome::failed(e),
            },
        };
        let to_email = match non_blank(request.recipient_email.as_deref()).or_else(|| {
            contact
                .as_ref()
                .and_then(|contact| non_blank(contact.email.as_deref()))
        }) {
            Some(email) => email.to_string(),
            None => return DispatchOutcome::skipped("no recipient email available"),
        };
        let to_name = contact.map(|contact| contact.name).unwrap_or_default();

        let template =
            match Self::template(ctx, notifications, tenant, request.template_type, request.lookup)
                .await
            {
                Ok(template) => template,
                Err(e) => return DispatchOutcome::failed(e),
            };

        let data = TemplateData {
            company_name: profile.name.clone(),
            contact_name: to_name.clone(),
            document_number: request.document.number.clone(),
            amount: request.document.outstanding(),
            currency: request.document.currency.clone(),
            due_date: request.document.due_date,
            message: request.message.clone().unwrap_or_default(),
        };
        let mut rendered = match call(
            ctx,
            "render template",
            notifications.render(&template, &data),
        )
        .await
        {
            Ok(rendered) => rendered,
            Err(e) => return DispatchOutcome::failed(e.to_string()),
        };
        if let Some(subject) = non_blank(request.subject.as_deref()) {
            rendered.subject = subject.to_string();
        }

        let mut attachments = Vec::new();
        let mut note = None;
        if request.attach_document && ctx.config.attachments_enabled {
            if let Some(attachment_service) = &ctx.services.attachments {
                match call(
                    ctx,
                    "generate attachment",
                    attachment_service.generate(tenant, &request.document, &profile.settings),
                )
                .await
                {
                    Ok(content) => attachments.push(EmailAttachment {
                        filename: format!("{}.pdf", request.document.number),
                        content_type: "application/pdf".into(),
                        content,
                    }),
                    Err(e) => {
                        warn!(
                            "Sending document: {} without attachment. Error: {}",
                            request.document.id, e
                        );
                        note = Some(format!("sent without attachment, {}", e));
                    }
                }
            }
        }

        let email = SendEmailRequest {
            template_type: template.template_type,
            to_email,
            to_name,
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
            attachments,
            related_id: Some(request.document.id.clone()),
        };
        match call(ctx, "send email", notifications.send(tenant, &email)).await {
            Ok(log_id) => {
                info!(
                    "Sent document: {} to: {} with log id: {}",
                    request.document.number, email.to_email, log_id
                );
                DispatchOutcome::sent(log_id, note)
            }
            Err(e) => DispatchOutcome::failed(e.to_string()),
        }
    }

    /// Display data of the tenant. Without a tenant directory the email is
    /// sent with blank company details.
    async fn tenant_profile(
        ctx: &BillingContext,
        tenant: &TenantScope,
    ) -> Result<TenantProfile, String> {
        let tenants = match &ctx.services.tenants {
            Some(tenants) => tenants,
            None => {
                return Ok(TenantProfile {
                    id: tenant.tenant_id.clone(),
                    name: String::new(),
                    settings: TenantSettings::default(),
                })
            }
        };
        call(ctx, "get tenant", tenants.get(&tenant.tenant_id))
            .await
            .map_err(|e| {
                warn!("Unable to resolve tenant: {}. Error: {}", tenant.tenant_id, e);
                e.to_string()
            })
    }

    async fn contact(
        ctx: &BillingContext,
        tenant: &TenantScope,
        request: &DispatchRequest,
    ) -> Result<Option<Contact>, String> {
        let contacts = match &ctx.services.contacts {
            Some(contacts) => contacts,
            None => return Ok(None),
        };
        let contact_id = &request.document.contact_id;
        call(ctx, "get contact", contacts.get(tenant, contact_id))
            .await
            .map(Some)
            .map_err(|e| {
                warn!("Unable to resolve contact: {}. Error: {}", contact_id, e);
                e.to_string()
            })
    }

    async fn template(
        ctx: &BillingContext,
        notifications: &dyn INotificationService,
        tenant: &TenantScope,
        template_type: TemplateType,
        lookup: TemplateLookup,
    ) -> Result<Template, String> {
        let requested = call(
            ctx,
            "get template",
            notifications.get_template(tenant, template_type),
        )
        .await;
        let requested_error = match requested {
            Ok(Some(template)) => return Ok(template),
            Ok(None) => format!("get template: no {} template", template_type),
            Err(e) => e.to_string(),
        };
        if lookup == TemplateLookup::Strict || template_type == TemplateType::FALLBACK {
            return Err(requested_error);
        }

        info!(
            "Falling back to the {} template. {}",
            TemplateType::FALLBACK,
            requested_error
        );
        match call(
            ctx,
            "get template",
            notifications.get_template(tenant, TemplateType::FALLBACK),
        )
        .await
        {
            Ok(Some(template)) => Ok(template),
            Ok(None) => Err(format!(
                "get template: no {} or {} template",
                template_type,
                TemplateType::FALLBACK
            )),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::testing::{date, insert_invoice, setup};
    use billing_scheduler_domain::{DispatchStatus, ID};

    fn request(document: Document, lookup: TemplateLookup) -> DispatchRequest {
        DispatchRequest {
            document,
            template_type: TemplateType::RecurringInvoice,
            lookup,
            contact: None,
            recipient_email: None,
            subject: None,
            message: Some("Thanks!".into()),
            attach_document: true,
        }
    }

    #[tokio::test]
    async fn sends_rendered_email_with_attachment() {
        let test = setup();
        let document = insert_invoice(&test, &test.contact.id, date(2025, 1, 30));

        let outcome = NotificationDispatcher::dispatch(
            &test.ctx,
            &test.tenant,
            &request(document.clone(), TemplateLookup::FallbackToDefault),
        )
        .await;

        assert!(outcome.sent);
        assert_eq!(outcome.status, DispatchStatus::Sent);
        assert_eq!(outcome.log_id, Some("log-1".into()));
        assert!(outcome.error.is_none());

        let sent = test.fakes.notifications.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_email, "jane@example.com");
        assert_eq!(sent[0].to_name, "Jane Doe");
        assert_eq!(sent[0].subject, format!("{} from Acme", document.number));
        assert!(sent[0].text.contains("121.00 EUR"));
        assert!(sent[0].text.contains("Thanks!"));
        assert_eq!(sent[0].attachments.len(), 1);
        assert_eq!(sent[0].related_id, Some(document.id));
    }

    #[tokio::test]
    async fn sends_without_attachment_when_generation_fails() {
        let test = setup();
        test.fakes.attachments.fail(true);
        let document = insert_invoice(&test, &test.contact.id, date(2025, 1, 30));

        let outcome = NotificationDispatcher::dispatch(
            &test.ctx,
            &test.tenant,
            &request(document, TemplateLookup::FallbackToDefault),
        )
        .await;

        assert!(outcome.sent);
        assert_eq!(outcome.status, DispatchStatus::Sent);
        let note = outcome.error.unwrap();
        assert!(note.contains("generate attachment"));
        assert!(test.fakes.notifications.sent()[0].attachments.is_empty());
    }

    #[tokio::test]
    async fn no_config_without_notification_service() {
        let mut test = setup();
        test.ctx.services.notifications = None;
        let document = insert_invoice(&test, &test.contact.id, date(2025, 1, 30));

        let outcome = NotificationDispatcher::dispatch(
            &test.ctx,
            &test.tenant,
            &request(document, TemplateLookup::FallbackToDefault),
        )
        .await;

        assert!(!outcome.sent);
        assert_eq!(outcome.status, DispatchStatus::NoConfig);
    }

    #[tokio::test]
    async fn skips_without_recipient_email() {
        let test = setup();
        let contact = Contact {
            id: ID::new(),
            name: "No Mail".into(),
            email: Some("   ".into()),
        };
        test.fakes
            .back_office
            .add_contact(&test.tenant.tenant_id, contact.clone());
        let document = insert_invoice(&test, &contact.id, date(2025, 1, 30));

        let outcome = NotificationDispatcher::dispatch(
            &test.ctx,
            &test.tenant,
            &request(document, TemplateLookup::FallbackToDefault),
        )
        .await;

        assert_eq!(outcome.status, DispatchStatus::Skipped);
        assert_eq!(outcome.error, Some("no recipient email available".into()));
        assert!(test.fakes.notifications.sent().is_empty());
    }

    #[tokio::test]
    async fn directory_errors_fail_the_dispatch() {
        let test = setup();
        let unknown_contact = ID::new();
        let document = insert_invoice(&test, &unknown_contact, date(2025, 1, 30));

        let outcome = NotificationDispatcher::dispatch(
            &test.ctx,
            &test.tenant,
            &request(document.clone(), TemplateLookup::FallbackToDefault),
        )
        .await;
        assert_eq!(outcome.status, DispatchStatus::Failed);
        assert_eq!(
            outcome.error,
            Some(format!("get contact: Contact: {} was not found", unknown_contact))
        );

        let known = insert_invoice(&test, &test.contact.id, date(2025, 1, 30));
        let other_tenant = TenantScope::new(ID::new(), "globex").unwrap();
        let outcome = NotificationDispatcher::dispatch(
            &test.ctx,
            &other_tenant,
            &DispatchRequest {
                contact: Some(test.contact.clone()),
                ..request(known, TemplateLookup::FallbackToDefault)
            },
        )
        .await;
        assert_eq!(outcome.status, DispatchStatus::Failed);
        assert!(outcome.error.unwrap().starts_with("get tenant: "));
        assert!(test.fakes.notifications.sent().is_empty());
    }

    #[tokio::test]
    async fn recipient_override_and_subject_override() {
        let test = setup();
        let document = insert_invoice(&test, &test.contact.id, date(2025, 1, 30));
        let mut request = request(document, TemplateLookup::FallbackToDefault);
        request.recipient_email = Some("billing@example.com".into());
        request.subject = Some("Your monthly invoice".into());

        let outcome = NotificationDispatcher::dispatch(&test.ctx, &test.tenant, &request).await;

        assert!(outcome.sent);
        let sent = test.fakes.notifications.sent();
        assert_eq!(sent[0].to_email, "billing@example.com");
        assert_eq!(sent[0].subject, "Your monthly invoice");
    }

    #[tokio::test]
    async fn render_and_send_errors_fail_the_dispatch() {
        let test = setup();
        let document = insert_invoice(&test, &test.contact.id, date(2025, 1, 30));

        test.fakes.notifications.fail_render(true);
        let outcome = NotificationDispatcher::dispatch(
            &test.ctx,
            &test.tenant,
            &request(document.clone(), TemplateLookup::FallbackToDefault),
        )
        .await;
        assert_eq!(outcome.status, DispatchStatus::Failed);
        assert!(outcome.error.unwrap().starts_with("render template"));

        test.fakes.notifications.fail_render(false);
        test.fakes.notifications.fail_send(true);
        let outcome = NotificationDispatcher::dispatch(
            &test.ctx,
            &test.tenant,
            &request(document, TemplateLookup::FallbackToDefault),
        )
        .await;
        assert_eq!(outcome.status, DispatchStatus::Failed);
        assert_eq!(
            outcome.error,
            Some("send email: smtp connection refused".into())
        );
    }

    // Generation and reminders deliberately differ on a missing template
    #[tokio::test]
    async fn missing_template_falls_back_on_generation_path() {
        let test = setup();
        test.fakes
            .notifications
            .remove_template(&test.tenant.tenant_id, TemplateType::RecurringInvoice);
        let document = insert_invoice(&test, &test.contact.id, date(2025, 1, 30));

        let outcome = NotificationDispatcher::dispatch(
            &test.ctx,
            &test.tenant,
            &request(document, TemplateLookup::FallbackToDefault),
        )
        .await;

        assert!(outcome.sent);
        assert_eq!(
            test.fakes.notifications.sent()[0].template_type,
            TemplateType::Invoice
        );
    }

    #[tokio::test]
    async fn missing_template_fails_on_reminder_path() {
        let test = setup();
        test.fakes
            .notifications
            .remove_template(&test.tenant.tenant_id, TemplateType::RecurringInvoice);
        let document = insert_invoice(&test, &test.contact.id, date(2025, 1, 30));

        let outcome = NotificationDispatcher::dispatch(
            &test.ctx,
            &test.tenant,
            &request(document, TemplateLookup::Strict),
        )
        .await;

        assert!(!outcome.sent);
        assert_eq!(outcome.status, DispatchStatus::Failed);
        assert_eq!(
            outcome.error,
            Some("get template: no RECURRING_INVOICE template".into())
        );
        assert!(test.fakes.notifications.sent().is_empty());
    }
}
