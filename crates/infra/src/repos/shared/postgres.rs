use billing_scheduler_domain::TenantScope;
use sqlx::PgPool;
use tracing::error;

/// Schema qualified name of a table in the namespace of the tenant.
///
/// The schema name is validated by `TenantScope` to be a plain identifier,
/// which is what makes interpolating it into the statement safe.
pub fn table(tenant: &TenantScope, name: &str) -> String {
    format!("\"{}\".{}", tenant.schema(), name)
}

/// Runs DDL statements one by one
pub async fn execute_statements(pool: &PgPool, statements: &[String]) -> anyhow::Result<()> {
    for statement in statements {
        sqlx::query(statement).execute(pool).await.map_err(|e| {
            error!(
                "Unable to execute schema statement: {}. DB returned error: {:?}",
                statement, e
            );
            e
        })?;
    }
    Ok(())
}

pub fn create_schema(tenant: &TenantScope) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS \"{}\"", tenant.schema())
}
