use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{info, warn};

use crate::app_config::BusinessRules;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Merge operator overrides from the business_rules table over the file
    /// defaults. Values are stored as text and parsed per key.
    pub async fn fetch_business_rules(
        &self,
        defaults: BusinessRules,
    ) -> Result<BusinessRules, sqlx::Error> {
        #[derive(sqlx::FromRow)]
        struct RuleRow {
            rule_key: String,
            rule_value: String,
        }

        let rows: Vec<RuleRow> =
            sqlx::query_as("SELECT rule_key, rule_value FROM business_rules")
                .fetch_all(&self.pool)
                .await?;

        let mut rules = defaults;

        for row in rows {
            match row.rule_key.as_str() {
                "seat_hold_seconds" => match row.rule_value.parse::<u64>() {
                    Ok(v) => rules.seat_hold_seconds = v,
                    Err(_) => warn!("Ignoring malformed seat_hold_seconds: {}", row.rule_value),
                },
                "max_seats_per_session" => match row.rule_value.parse::<i64>() {
                    Ok(v) => rules.max_seats_per_session = v,
                    Err(_) => warn!(
                        "Ignoring malformed max_seats_per_session: {}",
                        row.rule_value
                    ),
                },
                "sweep_interval_seconds" => match row.rule_value.parse::<u64>() {
                    Ok(v) => rules.sweep_interval_seconds = v,
                    Err(_) => warn!(
                        "Ignoring malformed sweep_interval_seconds: {}",
                        row.rule_value
                    ),
                },
                _ => {}
            }
        }

        Ok(rules)
    }
}
