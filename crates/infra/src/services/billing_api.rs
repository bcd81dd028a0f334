use super::{
    IAttachmentService, IContactDirectory, IDocumentService, INotificationService,
    ITenantDirectory,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use billing_scheduler_domain::{
    Contact, CreateDocumentRequest, Document, RenderedMessage, SendEmailRequest, Template,
    TemplateData, TemplateType, TenantProfile, TenantScope, TenantSettings, ID,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Client for the REST api of the billing back office
pub struct BillingApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl BillingApiClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = Client::new();

        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderTemplateRequest<'a> {
    template: &'a Template,
    data: &'a TemplateData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAttachmentBody<'a> {
    filename: &'a str,
    content_type: &'a str,
    /// Base64 encoded content
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody<'a> {
    template_type: TemplateType,
    to_email: &'a str,
    to_name: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    attachments: Vec<EmailAttachmentBody<'a>>,
    related_id: Option<&'a ID>,
}

impl<'a> From<&'a SendEmailRequest> for SendEmailBody<'a> {
    fn from(e: &'a SendEmailRequest) -> Self {
        Self {
            template_type: e.template_type,
            to_email: &e.to_email,
            to_name: &e.to_name,
            subject: &e.subject,
            html: &e.html,
            text: &e.text,
            attachments: e
                .attachments
                .iter()
                .map(|attachment| EmailAttachmentBody {
                    filename: &attachment.filename,
                    content_type: &attachment.content_type,
                    content: STANDARD.encode(&attachment.content),
                })
                .collect(),
            related_id: e.related_id.as_ref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailResponse {
    log_id: String,
}

impl BillingApiClient {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("authorization", format!("Bearer {}", self.api_key))
    }

    async fn send_request(&self, request: RequestBuilder, method: &str) -> anyhow::Result<Response> {
        match self.authorized(request).send().await {
            Ok(res) => res.error_for_status().map_err(|e| {
                error!(
                    "[Unexpected Response] Billing API {} error. Error message: {:?}",
                    method, e
                );
                anyhow::Error::new(e)
            }),
            Err(e) => {
                error!(
                    "[Network Error] Billing API {} error. Error message: {:?}",
                    method, e
                );
                Err(anyhow::Error::new(e))
            }
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        body: &impl Serialize,
        path: String,
    ) -> anyhow::Result<T> {
        let res = self
            .send_request(self.client.post(&self.url(&path)).json(body), "POST")
            .await?;
        res.json::<T>().await.map_err(|e| {
            error!(
                "[Unexpected Response] Billing API POST error. Error message: {:?}",
                e
            );
            anyhow::Error::new(e)
        })
    }

    /// GET where a 404 response is returned as `None`
    async fn get_optional<T: for<'de> Deserialize<'de>>(
        &self,
        path: String,
    ) -> anyhow::Result<Option<T>> {
        let request = self.authorized(self.client.get(&self.url(&path)));
        let res = match request.send().await {
            Ok(res) => res,
            Err(e) => {
                error!(
                    "[Network Error] Billing API GET error. Error message: {:?}",
                    e
                );
                return Err(anyhow::Error::new(e));
            }
        };
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = res.error_for_status().map_err(|e| {
            error!(
                "[Unexpected Response] Billing API GET error. Error message: {:?}",
                e
            );
            anyhow::Error::new(e)
        })?;
        res.json::<T>().await.map(Some).map_err(|e| {
            error!(
                "[Unexpected Response] Billing API GET error. Error message: {:?}",
                e
            );
            anyhow::Error::new(e)
        })
    }
}

#[async_trait::async_trait]
impl IDocumentService for BillingApiClient {
    async fn create(
        &self,
        tenant: &TenantScope,
        request: &CreateDocumentRequest,
    ) -> anyhow::Result<Document> {
        self.post(request, format!("tenants/{}/documents", tenant.tenant_id))
            .await
            .map_err(|e| {
                error!(
                    "Failed to create document for tenant: {} with request: {:?}. Error message: {:?}",
                    tenant.tenant_id, request, e
                );
                e
            })
    }

    async fn find(
        &self,
        tenant: &TenantScope,
        document_id: &ID,
    ) -> anyhow::Result<Option<Document>> {
        self.get_optional(format!(
            "tenants/{}/documents/{}",
            tenant.tenant_id, document_id
        ))
        .await
    }
}

#[async_trait::async_trait]
impl INotificationService for BillingApiClient {
    async fn get_template(
        &self,
        tenant: &TenantScope,
        template_type: TemplateType,
    ) -> anyhow::Result<Option<Template>> {
        self.get_optional(format!(
            "tenants/{}/email-templates/{}",
            tenant.tenant_id,
            template_type.as_str()
        ))
        .await
    }

    async fn render(
        &self,
        template: &Template,
        data: &TemplateData,
    ) -> anyhow::Result<RenderedMessage> {
        self.post(
            &RenderTemplateRequest { template, data },
            "email-templates/render".into(),
        )
        .await
    }

    async fn send(&self, tenant: &TenantScope, email: &SendEmailRequest) -> anyhow::Result<String> {
        let body = SendEmailBody::from(email);
        let res: SendEmailResponse = self
            .post(&body, format!("tenants/{}/emails", tenant.tenant_id))
            .await
            .map_err(|e| {
                error!(
                    "Failed to send email of type: {} to: {}. Error message: {:?}",
                    email.template_type, email.to_email, e
                );
                e
            })?;
        Ok(res.log_id)
    }
}

#[async_trait::async_trait]
impl IAttachmentService for BillingApiClient {
    async fn generate(
        &self,
        tenant: &TenantScope,
        document: &Document,
        settings: &TenantSettings,
    ) -> anyhow::Result<Vec<u8>> {
        let path = format!("tenants/{}/documents/{}/pdf", tenant.tenant_id, document.id);
        let res = self
            .send_request(self.client.post(&self.url(&path)).json(settings), "POST")
            .await?;
        let bytes = res.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl ITenantDirectory for BillingApiClient {
    async fn get(&self, tenant_id: &ID) -> anyhow::Result<TenantProfile> {
        self.get_optional::<TenantProfile>(format!("tenants/{}", tenant_id))
            .await?
            .ok_or_else(|| anyhow::Error::msg(format!("Tenant: {} was not found", tenant_id)))
    }
}

#[async_trait::async_trait]
impl IContactDirectory for BillingApiClient {
    async fn get(&self, tenant: &TenantScope, contact_id: &ID) -> anyhow::Result<Contact> {
        self.get_optional::<Contact>(format!(
            "tenants/{}/contacts/{}",
            tenant.tenant_id, contact_id
        ))
        .await?
        .ok_or_else(|| anyhow::Error::msg(format!("Contact: {} was not found", contact_id)))
    }
}
