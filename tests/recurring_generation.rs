mod helpers;

use billing_scheduler_core::{
    execute,
    schedule::{
        create_schedule::CreateScheduleUseCase, get_schedule::GetScheduleUseCase,
        run_due_schedules::RunDueSchedulesUseCase, set_schedule_active::SetScheduleActiveUseCase,
    },
    RunCancellation,
};
use billing_scheduler_domain::{
    DeliveryStatus, DispatchStatus, DocumentType, RecurringSchedule, ScheduleNotificationSettings,
    TemplateType,
};
use chrono::{DateTime, NaiveDate, Utc};
use helpers::{
    setup::{spawn_app, TestApp},
    utils::{date, line, time},
};
use rust_decimal::Decimal;

async fn create_schedule(app: &TestApp, start_date: NaiveDate) -> RecurringSchedule {
    let usecase = CreateScheduleUseCase {
        tenant: app.tenant.clone(),
        contact_id: app.contact.id.clone(),
        name: "Support contract".into(),
        document_type: DocumentType::Invoice,
        currency: "EUR".into(),
        frequency: "MONTHLY".into(),
        start_date,
        end_date: None,
        payment_terms_days: 14,
        reference: Some("PO-1".into()),
        notes: None,
        notification: ScheduleNotificationSettings {
            send_on_generation: true,
            ..Default::default()
        },
        lines: vec![line("Support", 0, 100, 21), line("Hosting", 2, 25, 21)],
    };
    execute(usecase, &app.ctx)
        .await
        .expect("Schedule to be created")
}

fn run(app: &TestApp, as_of: DateTime<Utc>) -> RunDueSchedulesUseCase {
    RunDueSchedulesUseCase {
        tenant: app.tenant.clone(),
        as_of,
        cancellation: RunCancellation::new(),
    }
}

#[tokio::test]
async fn generates_emails_and_advances_monthly_schedule() {
    let app = spawn_app().await;
    let schedule = create_schedule(&app, date(2025, 1, 15)).await;

    let result = execute(run(&app, time(2025, 1, 16, 8)), &app.ctx)
        .await
        .unwrap();

    assert_eq!(result.due, 1);
    assert_eq!(result.generated_count(), 1);
    assert_eq!(result.notifications_not_sent(), 0);
    let generated = &result.generated[0];
    assert_eq!(generated.next_generation_date, date(2025, 2, 15));
    assert_eq!(
        generated.notification.as_ref().map(|n| n.status),
        Some(DispatchStatus::Sent)
    );

    let documents = app.fakes.back_office.documents(&app.tenant.tenant_id);
    assert_eq!(documents.len(), 1);
    let document = &documents[0];
    assert_eq!(document.id, generated.document_id);
    assert_eq!(document.issue_date, date(2025, 1, 16));
    assert_eq!(document.due_date, date(2025, 1, 30));
    // Zero quantity is billed as one unit: (100 + 2 * 25) * 1.21
    assert_eq!(document.total, Decimal::new(18150, 2));
    assert_eq!(document.email_status, Some(DeliveryStatus::Sent));
    assert!(document.email_log_id.is_some());

    let sent = app.fakes.notifications.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template_type, TemplateType::RecurringInvoice);
    assert_eq!(sent[0].to_email, "john@example.com");
    assert_eq!(sent[0].attachments.len(), 1);

    let stored = execute(
        GetScheduleUseCase {
            tenant: app.tenant.clone(),
            schedule_id: schedule.id.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();
    assert_eq!(stored.generated_count, 1);
    assert_eq!(stored.next_generation_date, date(2025, 2, 15));
    assert!(stored.last_generated_at.is_some());
}

#[tokio::test]
async fn month_end_start_date_spills_into_next_month() {
    let mut app = spawn_app().await;
    create_schedule(&app, date(2025, 1, 31)).await;
    app.set_time(time(2025, 1, 31, 6));

    let first = execute(run(&app, time(2025, 1, 31, 6)), &app.ctx)
        .await
        .unwrap();
    assert_eq!(first.generated[0].next_generation_date, date(2025, 3, 3));

    // Not due again in February
    let february = execute(run(&app, time(2025, 2, 28, 6)), &app.ctx)
        .await
        .unwrap();
    assert_eq!(february.due, 0);

    app.set_time(time(2025, 3, 3, 6));
    let march = execute(run(&app, time(2025, 3, 3, 6)), &app.ctx)
        .await
        .unwrap();
    assert_eq!(march.generated_count(), 1);
    assert_eq!(march.generated[0].next_generation_date, date(2025, 4, 3));
    assert_eq!(app.fakes.back_office.documents(&app.tenant.tenant_id).len(), 2);
}

#[tokio::test]
async fn paused_schedule_is_not_generated() {
    let app = spawn_app().await;
    let schedule = create_schedule(&app, date(2025, 1, 15)).await;
    execute(
        SetScheduleActiveUseCase {
            tenant: app.tenant.clone(),
            schedule_id: schedule.id.clone(),
            is_active: false,
        },
        &app.ctx,
    )
    .await
    .unwrap();

    let result = execute(run(&app, time(2025, 1, 16, 8)), &app.ctx)
        .await
        .unwrap();

    assert_eq!(result.due, 0);
    assert!(app
        .fakes
        .back_office
        .documents(&app.tenant.tenant_id)
        .is_empty());
}

#[tokio::test]
async fn email_failure_is_reported_but_document_is_kept() {
    let app = spawn_app().await;
    create_schedule(&app, date(2025, 1, 15)).await;
    app.fakes.notifications.fail_send(true);

    let result = execute(run(&app, time(2025, 1, 16, 8)), &app.ctx)
        .await
        .unwrap();

    assert_eq!(result.generated_count(), 1);
    assert_eq!(result.failed_count(), 0);
    assert_eq!(result.notifications_not_sent(), 1);
    let documents = app.fakes.back_office.documents(&app.tenant.tenant_id);
    assert_eq!(documents[0].email_status, Some(DeliveryStatus::Failed));
}
