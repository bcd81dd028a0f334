use billing_scheduler_domain::ScheduleLineInput;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(y: i32, m: u32, d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hour, 0, 0).unwrap()
}

pub fn line(description: &str, quantity: i64, unit_price: i64, vat_rate: i64) -> ScheduleLineInput {
    ScheduleLineInput {
        description: description.into(),
        quantity: Decimal::from(quantity),
        unit: Some("pcs".into()),
        unit_price: Decimal::from(unit_price),
        discount_percent: Decimal::ZERO,
        vat_rate: Decimal::from(vat_rate),
        account_id: None,
        product_id: None,
    }
}
