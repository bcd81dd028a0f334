use crate::shared::entity::ID;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display data of the tenant issuing documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantProfile {
    pub id: ID,
    pub name: String,
    #[serde(default)]
    pub settings: TenantSettings,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TenantSettings {
    pub email: Option<String>,
    pub vat_number: Option<String>,
    pub iban: Option<String>,
    pub logo_url: Option<String>,
    /// Yearly interest rate in percent charged on overdue documents
    pub interest_rate: Option<Decimal>,
}

/// A customer of a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ID,
    pub name: String,
    pub email: Option<String>,
}
