use mongodb::bson::doc;
use mongodb::{Client, options::ClientOptions};
use tracing::info;

use super::MongoConfig;
use crate::common::{DatabaseError, DatabaseResult, RetryConfig, retry_if};

/// Connect using a [`MongoConfig`] and verify the deployment answers `ping`
///
/// # Example
/// ```ignore
/// use database::mongodb::{MongoConfig, connect_from_config};
///
/// let config = MongoConfig::with_database("mongodb://localhost:27017", "events");
/// let client = connect_from_config(&config).await?;
/// ```
pub async fn connect_from_config(config: &MongoConfig) -> DatabaseResult<Client> {
    info!(
        url = %config.redacted_url(),
        database = %config.database,
        "Attempting to connect to MongoDB"
    );

    let mut options = ClientOptions::parse(&config.url).await?;

    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(config.connect_timeout);
    options.server_selection_timeout = Some(config.server_selection_timeout);
    options.app_name = config.app_name.clone();

    let client = Client::with_options(options)?;

    client
        .database(&config.database)
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!(
        max_pool_size = config.max_pool_size,
        "Successfully connected to MongoDB"
    );
    Ok(client)
}

/// Connect with defaults for everything but the URL
pub async fn connect(url: &str) -> DatabaseResult<Client> {
    connect_from_config(&MongoConfig::new(url)).await
}

/// Connect from config, retrying transient failures with exponential backoff
///
/// Without an explicit policy, `config.connect_retries` bounds the retries.
/// Permanent failures such as a malformed URL fail on the first attempt.
///
/// # Example
/// ```ignore
/// use database::mongodb::{MongoConfig, connect_from_config_with_retry};
/// use database::common::RetryConfig;
///
/// let config = MongoConfig::from_env()?;
/// let client = connect_from_config_with_retry(&config, Some(RetryConfig::new().with_max_retries(5))).await?;
/// ```
pub async fn connect_from_config_with_retry(
    config: &MongoConfig,
    retry_config: Option<RetryConfig>,
) -> DatabaseResult<Client> {
    let policy = retry_config
        .unwrap_or_else(|| RetryConfig::new().with_max_retries(config.connect_retries));

    retry_if(
        || connect_from_config(config),
        DatabaseError::is_transient,
        policy,
    )
    .await
}
