mod telemetry;

use billing_scheduler_core::{start_generation_job, start_reminder_job, RunCancellation};
use billing_scheduler_infra::setup_context;
use telemetry::{get_subscriber, init_subscriber};
use tracing::{error, info};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber("billing_scheduler".into(), "info".into());
    init_subscriber(subscriber);

    let context = setup_context().await;

    for tenant in &context.config.tenants {
        if let Err(e) = context.repos.ensure_schema(tenant).await {
            error!(
                "Unable to prepare the schema: {} of tenant: {}. Error: {:?}",
                tenant.schema(),
                tenant.tenant_id,
                e
            );
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("schema {} is not ready", tenant.schema()),
            ));
        }
    }
    info!(
        "Starting the job schedulers for {} tenants",
        context.config.tenants.len()
    );

    let cancellation = RunCancellation::new();
    let generation = start_generation_job(context.clone(), cancellation.clone());
    let reminders = start_reminder_job(context, cancellation.clone());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down, runs stop before their next item");
    cancellation.cancel();
    for job in vec![generation, reminders] {
        if let Err(e) = job.await {
            error!("Job scheduler did not stop cleanly. Error: {:?}", e);
        }
    }
    Ok(())
}
