use crate::shared::entity::ID;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const MAX_SCHEMA_LEN: usize = 63;

/// The tenant a run or request is executed for, together with the storage
/// namespace (a PostgreSQL schema) holding that tenant's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantScope {
    pub tenant_id: ID,
    schema: String,
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidTenantScope {
    #[error("Schema name: `{0}` is not a valid identifier")]
    Schema(String),
    #[error("Tenant entry: `{0}` should be formatted as <tenant_id>:<schema>")]
    Malformed(String),
}

impl TenantScope {
    pub fn new(tenant_id: ID, schema: &str) -> Result<Self, InvalidTenantScope> {
        if !is_valid_schema_name(schema) {
            return Err(InvalidTenantScope::Schema(schema.to_string()));
        }
        Ok(Self {
            tenant_id,
            schema: schema.to_string(),
        })
    }

    /// Schema name, guaranteed to be a plain lowercase SQL identifier
    pub fn schema(&self) -> &str {
        &self.schema
    }
}

fn is_valid_schema_name(schema: &str) -> bool {
    let mut chars = schema.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => (),
        _ => return false,
    }
    schema.len() <= MAX_SCHEMA_LEN
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl FromStr for TenantScope {
    type Err = InvalidTenantScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.trim().splitn(2, ':').collect::<Vec<_>>();
        if parts.len() != 2 {
            return Err(InvalidTenantScope::Malformed(s.to_string()));
        }
        let tenant_id = parts[0]
            .parse::<ID>()
            .map_err(|_| InvalidTenantScope::Malformed(s.to_string()))?;
        Self::new(tenant_id, parts[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for schema in &["tenant_1", "_acme", "a"] {
            assert!(TenantScope::new(ID::new(), schema).is_ok());
        }
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        for schema in &["", "1tenant", "Tenant", "acme; drop table x", "a-b", "a.b"] {
            assert!(TenantScope::new(ID::new(), schema).is_err());
        }
    }

    #[test]
    fn parses_tenant_entries() {
        let id = ID::new();
        let scope = format!("{}:acme", id).parse::<TenantScope>().unwrap();
        assert_eq!(scope.tenant_id, id);
        assert_eq!(scope.schema(), "acme");

        assert!("acme".parse::<TenantScope>().is_err());
        assert!("nope:acme".parse::<TenantScope>().is_err());
    }
}
