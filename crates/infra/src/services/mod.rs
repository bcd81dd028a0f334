mod billing_api;
mod inmemory;

use billing_scheduler_domain::{
    Contact, CreateDocumentRequest, Document, RenderedMessage, SendEmailRequest, Template,
    TemplateData, TemplateType, TenantProfile, TenantScope, TenantSettings, ID,
};
use std::sync::Arc;

pub use billing_api::BillingApiClient;
pub use inmemory::{InMemoryAttachmentService, InMemoryBackOffice, InMemoryNotificationService};

/// Creates customer facing documents. Computes totals and numbers.
#[async_trait::async_trait]
pub trait IDocumentService: Send + Sync {
    async fn create(
        &self,
        tenant: &TenantScope,
        request: &CreateDocumentRequest,
    ) -> anyhow::Result<Document>;
    async fn find(&self, tenant: &TenantScope, document_id: &ID)
        -> anyhow::Result<Option<Document>>;
}

#[async_trait::async_trait]
pub trait INotificationService: Send + Sync {
    /// Returns `None` when the tenant has no template of this type
    async fn get_template(
        &self,
        tenant: &TenantScope,
        template_type: TemplateType,
    ) -> anyhow::Result<Option<Template>>;
    async fn render(
        &self,
        template: &Template,
        data: &TemplateData,
    ) -> anyhow::Result<RenderedMessage>;
    /// Sends the email and returns the id of the email log entry
    async fn send(&self, tenant: &TenantScope, email: &SendEmailRequest) -> anyhow::Result<String>;
}

/// Renders documents to pdf
#[async_trait::async_trait]
pub trait IAttachmentService: Send + Sync {
    async fn generate(
        &self,
        tenant: &TenantScope,
        document: &Document,
        settings: &TenantSettings,
    ) -> anyhow::Result<Vec<u8>>;
}

#[async_trait::async_trait]
pub trait ITenantDirectory: Send + Sync {
    async fn get(&self, tenant_id: &ID) -> anyhow::Result<TenantProfile>;
}

#[async_trait::async_trait]
pub trait IContactDirectory: Send + Sync {
    async fn get(&self, tenant: &TenantScope, contact_id: &ID) -> anyhow::Result<Contact>;
}

/// The external collaborators. Only the document service is required,
/// the others are optional capabilities that callers check for.
#[derive(Clone)]
pub struct Services {
    pub documents: Arc<dyn IDocumentService>,
    pub notifications: Option<Arc<dyn INotificationService>>,
    pub attachments: Option<Arc<dyn IAttachmentService>>,
    pub tenants: Option<Arc<dyn ITenantDirectory>>,
    pub contacts: Option<Arc<dyn IContactDirectory>>,
}

impl Services {
    pub fn new(documents: Arc<dyn IDocumentService>) -> Self {
        Self {
            documents,
            notifications: None,
            attachments: None,
            tenants: None,
            contacts: None,
        }
    }
}
