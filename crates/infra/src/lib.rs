mod config;
mod repos;
mod services;
mod system;

pub use config::Config;
pub use repos::*;
pub use services::*;
use std::sync::Arc;
pub use system::{ISys, RealSys, StaticTimeSys};
use tracing::info;

#[derive(Clone)]
pub struct BillingContext {
    pub repos: Repos,
    pub services: Services,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

/// Handles to the in memory collaborators behind a context created by
/// `BillingContext::create_inmemory`, used to seed data and inject failures.
#[derive(Clone)]
pub struct InMemoryCollaborators {
    pub back_office: Arc<InMemoryBackOffice>,
    pub notifications: Arc<InMemoryNotificationService>,
    pub attachments: Arc<InMemoryAttachmentService>,
}

impl InMemoryCollaborators {
    pub fn new() -> Self {
        Self {
            back_office: Arc::new(InMemoryBackOffice::new()),
            notifications: Arc::new(InMemoryNotificationService::new()),
            attachments: Arc::new(InMemoryAttachmentService::new()),
        }
    }
}

impl Default for InMemoryCollaborators {
    fn default() -> Self {
        Self::new()
    }
}

impl BillingContext {
    async fn create(params: ContextParams) -> Self {
        let config = Config::new();
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let services = create_api_services(&config);
        Self {
            repos,
            services,
            config,
            sys: Arc::new(RealSys {}),
        }
    }

    /// Context with every repository and collaborator in memory and all
    /// optional capabilities present
    pub fn create_inmemory(collaborators: &InMemoryCollaborators) -> Self {
        let back_office = collaborators.back_office.clone();
        let services = Services {
            documents: back_office.clone(),
            notifications: Some(collaborators.notifications.clone()),
            attachments: Some(collaborators.attachments.clone()),
            tenants: Some(back_office.clone()),
            contacts: Some(back_office.clone()),
        };
        Self {
            repos: Repos::create_inmemory(back_office),
            services,
            config: Config::new(),
            sys: Arc::new(RealSys {}),
        }
    }
}

fn create_api_services(config: &Config) -> Services {
    let base_url = config
        .billing_api_url
        .clone()
        .unwrap_or_else(|| panic!("BILLING_API_URL env var to be present."));
    let api = Arc::new(BillingApiClient::new(
        base_url,
        config.billing_api_key.clone(),
    ));

    let mut services = Services::new(api.clone());
    services.tenants = Some(api.clone());
    services.contacts = Some(api.clone());
    if config.notifications_enabled {
        services.notifications = Some(api.clone());
    } else {
        info!("Notifications are disabled, documents and reminders will not be emailed.");
    }
    if config.attachments_enabled {
        services.attachments = Some(api);
    }
    services
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> BillingContext {
    BillingContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}
