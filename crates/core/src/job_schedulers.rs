use crate::{
    reminder::run_due_reminders::RunDueRemindersUseCase,
    schedule::run_due_schedules::RunDueSchedulesUseCase,
    shared::{cancellation::RunCancellation, usecase::execute},
};
use billing_scheduler_infra::BillingContext;
use std::time::Duration;
use tokio::{
    task::JoinHandle,
    time::{interval, sleep},
};
use tracing::{error, info, info_span, warn};
use tracing_futures::Instrument;

/// Seconds from `now_ts` (millis) until `secs_before_min` seconds before the
/// next whole minute
pub fn get_start_delay(now_ts: usize, secs_before_min: usize) -> usize {
    let secs_to_next_minute = 60 - (now_ts / 1000) % 60;
    if secs_to_next_minute > secs_before_min {
        secs_to_next_minute - secs_before_min
    } else {
        secs_to_next_minute + (60 - secs_before_min)
    }
}

fn start_delay(ctx: &BillingContext) -> Duration {
    let now = ctx.sys.get_timestamp_millis().max(0) as usize;
    Duration::from_secs(get_start_delay(now, 0) as u64)
}

/// Runs the due schedules of every configured tenant periodically until
/// cancelled. A run in progress stops before its next schedule.
pub fn start_generation_job(ctx: BillingContext, cancellation: RunCancellation) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = sleep(start_delay(&ctx)) => (),
            _ = cancellation.cancelled() => return,
        }
        let mut ticks = interval(ctx.config.generation_job_interval);
        loop {
            tokio::select! {
                _ = ticks.tick() => (),
                _ = cancellation.cancelled() => break,
            }
            run_generation(&ctx, &cancellation)
                .instrument(info_span!("Generation job"))
                .await;
        }
        info!("Generation job stopped");
    })
}

pub fn start_reminder_job(ctx: BillingContext, cancellation: RunCancellation) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = sleep(start_delay(&ctx)) => (),
            _ = cancellation.cancelled() => return,
        }
        let mut ticks = interval(ctx.config.reminder_job_interval);
        loop {
            tokio::select! {
                _ = ticks.tick() => (),
                _ = cancellation.cancelled() => break,
            }
            run_reminders(&ctx, &cancellation)
                .instrument(info_span!("Reminder job"))
                .await;
        }
        info!("Reminder job stopped");
    })
}

async fn run_generation(ctx: &BillingContext, cancellation: &RunCancellation) {
    for tenant in &ctx.config.tenants {
        if cancellation.is_cancelled() {
            return;
        }
        let usecase = RunDueSchedulesUseCase {
            tenant: tenant.clone(),
            as_of: ctx.sys.now(),
            cancellation: cancellation.clone(),
        };
        match execute(usecase, ctx).await {
            Ok(result) => {
                for e in result.errors() {
                    warn!("Tenant: {}, {}", tenant.tenant_id, e);
                }
            }
            Err(e) => error!(
                "Generation run for tenant: {} failed. Error: {:?}",
                tenant.tenant_id, e
            ),
        }
    }
}

async fn run_reminders(ctx: &BillingContext, cancellation: &RunCancellation) {
    for tenant in &ctx.config.tenants {
        if cancellation.is_cancelled() {
            return;
        }
        let usecase = RunDueRemindersUseCase {
            tenant: tenant.clone(),
            as_of: ctx.sys.now(),
            cancellation: cancellation.clone(),
        };
        match execute(usecase, ctx).await {
            Ok(result) => {
                for e in &result.errors {
                    warn!("Tenant: {}, {}", tenant.tenant_id, e);
                }
            }
            Err(e) => error!(
                "Reminder run for tenant: {} failed. Error: {:?}",
                tenant.tenant_id, e
            ),
        }
    }
}
