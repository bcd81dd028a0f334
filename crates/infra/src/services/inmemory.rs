use super::{
    IAttachmentService, IContactDirectory, IDocumentService, INotificationService,
    ITenantDirectory,
};
use crate::repos::IDocumentRepo;
use billing_scheduler_domain::{
    Contact, CreateDocumentRequest, DeliveryStatus, Document, DocumentStatus, RenderedMessage,
    ReminderCandidate, SendEmailRequest, Template, TemplateData, TemplateType, TenantProfile,
    TenantScope, TenantSettings, ID,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

/// In memory stand in for the billing back office. Documents created through
/// it are visible to the reminder candidate queries, and its tenants and
/// contacts back the directories.
pub struct InMemoryBackOffice {
    tenants: Mutex<Vec<TenantProfile>>,
    contacts: Mutex<Vec<(ID, Contact)>>,
    documents: Mutex<Vec<Document>>,
    /// Document creation fails for these contacts
    failing_contacts: Mutex<Vec<ID>>,
    /// Candidate queries fail for these due dates
    failing_due_dates: Mutex<Vec<NaiveDate>>,
    create_delay: Mutex<Option<Duration>>,
    fail_delivery_status: AtomicBool,
    created: AtomicUsize,
}

impl InMemoryBackOffice {
    pub fn new() -> Self {
        Self {
            tenants: Mutex::new(Vec::new()),
            contacts: Mutex::new(Vec::new()),
            documents: Mutex::new(Vec::new()),
            failing_contacts: Mutex::new(Vec::new()),
            failing_due_dates: Mutex::new(Vec::new()),
            create_delay: Mutex::new(None),
            fail_delivery_status: AtomicBool::new(false),
            created: AtomicUsize::new(0),
        }
    }

    /// Adds the tenant, replacing an existing profile with the same id
    pub fn add_tenant(&self, tenant: TenantProfile) {
        let mut tenants = self.tenants.lock().unwrap();
        tenants.retain(|existing| existing.id != tenant.id);
        tenants.push(tenant);
    }

    pub fn add_contact(&self, tenant_id: &ID, contact: Contact) {
        self.contacts
            .lock()
            .unwrap()
            .push((tenant_id.clone(), contact));
    }

    pub fn add_document(&self, document: Document) {
        self.documents.lock().unwrap().push(document);
    }

    pub fn documents(&self, tenant_id: &ID) -> Vec<Document> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .filter(|doc| doc.tenant_id == *tenant_id)
            .cloned()
            .collect()
    }

    pub fn fail_create_for(&self, contact_id: &ID) {
        self.failing_contacts.lock().unwrap().push(contact_id.clone());
    }

    pub fn fail_candidates_due(&self, due_date: NaiveDate) {
        self.failing_due_dates.lock().unwrap().push(due_date);
    }

    pub fn delay_create(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_delivery_status(&self, fail: bool) {
        self.fail_delivery_status.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryBackOffice {
    fn default() -> Self {
        Self::new()
    }
}

fn line_total(request: &CreateDocumentRequest) -> Decimal {
    let hundred = Decimal::from(100);
    let total: Decimal = request
        .lines
        .iter()
        .map(|line| {
            let net = line.quantity * line.unit_price * (hundred - line.discount_percent) / hundred;
            net * (hundred + line.vat_rate) / hundred
        })
        .sum();
    total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[async_trait::async_trait]
impl IDocumentService for InMemoryBackOffice {
    async fn create(
        &self,
        tenant: &TenantScope,
        request: &CreateDocumentRequest,
    ) -> anyhow::Result<Document> {
        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self
            .failing_contacts
            .lock()
            .unwrap()
            .contains(&request.contact_id)
        {
            return Err(anyhow::Error::msg(format!(
                "contact: {} can not be invoiced",
                request.contact_id
            )));
        }

        let sequence = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let document = Document {
            id: ID::new(),
            tenant_id: tenant.tenant_id.clone(),
            contact_id: request.contact_id.clone(),
            number: format!("{}-{:04}", request.issue_date.year(), sequence),
            document_type: request.document_type,
            status: DocumentStatus::Unpaid,
            issue_date: request.issue_date,
            due_date: request.due_date,
            currency: request.currency.clone(),
            total: line_total(request),
            amount_paid: Decimal::ZERO,
            recurring_schedule_id: request.recurring_schedule_id.clone(),
            email_sent_at: None,
            email_status: None,
            email_log_id: None,
        };
        self.add_document(document.clone());
        Ok(document)
    }

    async fn find(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
    ) -> anyhow::Result<Option<Document>> {
        Ok(self
            .documents(&tenant.tenant_id)
            .into_iter()
            .find(|doc| doc.id == *document_id))
    }
}

#[async_trait::async_trait]
impl IDocumentRepo for InMemoryBackOffice {
    async fn find_reminder_candidates(
        &self,
        tenant: &TenantScope,
        due_date: NaiveDate,
        statuses: &[DocumentStatus],
    ) -> anyhow::Result<Vec<ReminderCandidate>> {
        if self.failing_due_dates.lock().unwrap().contains(&due_date) {
            return Err(anyhow::Error::msg("candidate query timed out"));
        }
        let contacts = self.contacts.lock().unwrap();
        let candidates = self
            .documents(&tenant.tenant_id)
            .into_iter()
            .filter(|doc| {
                doc.due_date == due_date
                    && doc.document_type == billing_scheduler_domain::DocumentType::Invoice
                    && statuses.contains(&doc.status)
                    && doc.outstanding() > Decimal::ZERO
            })
            .map(|document| {
                let contact = contacts
                    .iter()
                    .find(|(tenant_id, contact)| {
                        *tenant_id == tenant.tenant_id && contact.id == document.contact_id
                    })
                    .map(|(_, contact)| contact.clone());
                ReminderCandidate {
                    document,
                    contact_name: contact
                        .as_ref()
                        .map(|c| c.name.clone())
                        .unwrap_or_default(),
                    contact_email: contact.and_then(|c| c.email),
                }
            })
            .collect();
        Ok(candidates)
    }

    async fn update_delivery_status(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
        sent_at: Option<DateTime<Utc>>,
        status: DeliveryStatus,
        email_log_id: Option<String>,
    ) -> anyhow::Result<()> {
        if self.fail_delivery_status.load(Ordering::SeqCst) {
            return Err(anyhow::Error::msg("document store unavailable"));
        }
        let mut documents = self.documents.lock().unwrap();
        let document = documents
            .iter_mut()
            .find(|doc| doc.id == *document_id && doc.tenant_id == tenant.tenant_id)
            .ok_or_else(|| anyhow::Error::msg(format!("Document: {} was not found", document_id)))?;
        if sent_at.is_some() {
            document.email_sent_at = sent_at;
        }
        document.email_status = Some(status);
        if email_log_id.is_some() {
            document.email_log_id = email_log_id;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ITenantDirectory for InMemoryBackOffice {
    async fn get(&self, tenant_id: &ID) -> anyhow::Result<TenantProfile> {
        self.tenants
            .lock()
            .unwrap()
            .iter()
            .find(|tenant| tenant.id == *tenant_id)
            .cloned()
            .ok_or_else(|| anyhow::Error::msg(format!("Tenant: {} was not found", tenant_id)))
    }
}

#[async_trait::async_trait]
impl IContactDirectory for InMemoryBackOffice {
    async fn get(&self, tenant: &TenantScope, contact_id: &ID) -> anyhow::Result<Contact> {
        self.contacts
            .lock()
            .unwrap()
            .iter()
            .find(|(tenant_id, contact)| {
                *tenant_id == tenant.tenant_id && contact.id == *contact_id
            })
            .map(|(_, contact)| contact.clone())
            .ok_or_else(|| anyhow::Error::msg(format!("Contact: {} was not found", contact_id)))
    }
}

/// Sent emails are recorded instead of delivered
pub struct InMemoryNotificationService {
    templates: Mutex<HashMap<(ID, TemplateType), Template>>,
    sent: Mutex<Vec<(ID, SendEmailRequest)>>,
    fail_render: AtomicBool,
    fail_send: AtomicBool,
    failing_recipients: Mutex<Vec<String>>,
}

impl InMemoryNotificationService {
    pub fn new() -> Self {
        Self {
            templates: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            fail_render: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            failing_recipients: Mutex::new(Vec::new()),
        }
    }

    /// Adds a template with placeholders for every `TemplateData` field
    pub fn add_template(&self, tenant_id: &ID, template_type: TemplateType) {
        let template = Template {
            id: ID::new(),
            template_type,
            subject: "{{document_number}} from {{company_name}}".into(),
            body_html: "<p>Dear {{contact_name}}, {{amount}} {{currency}} is due {{due_date}}. {{message}}</p>".into(),
            body_text: "Dear {{contact_name}}, {{amount}} {{currency}} is due {{due_date}}. {{message}}".into(),
        };
        self.templates
            .lock()
            .unwrap()
            .insert((tenant_id.clone(), template_type), template);
    }

    pub fn remove_template(&self, tenant_id: &ID, template_type: TemplateType) {
        self.templates
            .lock()
            .unwrap()
            .remove(&(tenant_id.clone(), template_type));
    }

    pub fn sent(&self) -> Vec<SendEmailRequest> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, email)| email.clone())
            .collect()
    }

    pub fn fail_render(&self, fail: bool) {
        self.fail_render.store(fail, Ordering::SeqCst);
    }

    pub fn fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn fail_send_to(&self, email: &str) {
        self.failing_recipients.lock().unwrap().push(email.to_string());
    }
}

impl Default for InMemoryNotificationService {
    fn default() -> Self {
        Self::new()
    }
}

fn fill(text: &str, data: &TemplateData) -> String {
    text.replace("{{company_name}}", &data.company_name)
        .replace("{{contact_name}}", &data.contact_name)
        .replace("{{document_number}}", &data.document_number)
        .replace("{{amount}}", &data.amount.to_string())
        .replace("{{currency}}", &data.currency)
        .replace("{{due_date}}", &data.due_date.to_string())
        .replace("{{message}}", &data.message)
}

#[async_trait::async_trait]
impl INotificationService for InMemoryNotificationService {
    async fn get_template(
        &self,
        tenant: &TenantScope,
        template_type: TemplateType,
    ) -> anyhow::Result<Option<Template>> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .get(&(tenant.tenant_id.clone(), template_type))
            .cloned())
    }

    async fn render(
        &self,
        template: &Template,
        data: &TemplateData,
    ) -> anyhow::Result<RenderedMessage> {
        if self.fail_render.load(Ordering::SeqCst) {
            return Err(anyhow::Error::msg(format!(
                "template: {} has a syntax error",
                template.id
            )));
        }
        Ok(RenderedMessage {
            subject: fill(&template.subject, data),
            html: fill(&template.body_html, data),
            text: fill(&template.body_text, data),
        })
    }

    async fn send(&self, tenant: &TenantScope, email: &SendEmailRequest) -> anyhow::Result<String> {
        if self.fail_send.load(Ordering::SeqCst)
            || self
                .failing_recipients
                .lock()
                .unwrap()
                .contains(&email.to_email)
        {
            return Err(anyhow::Error::msg("smtp connection refused"));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((tenant.tenant_id.clone(), email.clone()));
        Ok(format!("log-{}", sent.len()))
    }
}

pub struct InMemoryAttachmentService {
    failing: AtomicBool,
}

impl InMemoryAttachmentService {
    pub fn new() -> Self {
        Self {
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryAttachmentService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IAttachmentService for InMemoryAttachmentService {
    async fn generate(
        &self,
        _tenant: &TenantScope,
        document: &Document,
        _settings: &TenantSettings,
    ) -> anyhow::Result<Vec<u8>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::Error::msg("pdf renderer crashed"));
        }
        Ok(format!("%PDF-1.4 {}", document.number).into_bytes())
    }
}
