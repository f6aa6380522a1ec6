//! S3-compatible object storage backend (Cloudflare R2, MinIO, AWS S3).

use async_trait::async_trait;
use aws_sdk_s3::config::{
    BehaviorVersion, Builder as S3ConfigBuilder, Credentials, Region, SharedCredentialsProvider,
};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

use super::{MatchStore, StorageError};
use crate::config::AppConfig;
use crate::models::MatchHistory;

/// Connection parameters for the object store.
#[derive(Clone)]
pub struct ObjectStoreSettings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

impl std::fmt::Debug for ObjectStoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

impl ObjectStoreSettings {
    /// Pull the R2 settings out of the application config.
    pub fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        let required = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| StorageError::InvalidConfig(format!("{} is required", name)))
        };

        Ok(Self {
            endpoint: required(&config.r2_endpoint, "R2_ENDPOINT")?,
            access_key: required(&config.r2_access_key, "R2_ACCESS_KEY")?,
            secret_key: required(&config.r2_secret_key, "R2_SECRET_KEY")?,
            bucket: required(&config.r2_bucket, "R2_BUCKET")?,
            region: config.r2_region.clone(),
        })
    }

    fn create_client(&self) -> S3Client {
        let creds = Credentials::new(
            &self.access_key,
            &self.secret_key,
            None,
            None,
            "aoe4-ledger-static",
        );

        let config = S3ConfigBuilder::new()
            .endpoint_url(&self.endpoint)
            .credentials_provider(SharedCredentialsProvider::new(creds))
            .region(Region::new(self.region.clone()))
            .force_path_style(true)
            .behavior_version(BehaviorVersion::latest())
            .build();

        S3Client::from_conf(config)
    }
}

#[derive(Clone, Debug)]
pub struct ObjectStore {
    client: S3Client,
    bucket: String,
}

impl ObjectStore {
    pub fn new(settings: ObjectStoreSettings) -> Self {
        Self {
            client: settings.create_client(),
            bucket: settings.bucket,
        }
    }
}

#[async_trait]
impl MatchStore for ObjectStore {
    fn name(&self) -> &'static str {
        "object"
    }

    async fn load(&self, key: &str) -> Result<MatchHistory, StorageError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|service_err| service_err.is_no_such_key())
                {
                    debug!("No stored history at {}/{}", self.bucket, key);
                    return Ok(MatchHistory::new());
                }
                return Err(StorageError::ObjectStore(
                    DisplayErrorContext(&err).to_string(),
                ));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::ObjectStore(e.to_string()))?
            .into_bytes();

        let history: MatchHistory = serde_json::from_slice(&bytes)?;
        debug!(
            "Loaded {} matches from {}/{}",
            history.len(),
            self.bucket,
            key
        );
        Ok(history)
    }

    async fn save(&self, key: &str, history: &MatchHistory) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(history)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(json))
            .send()
            .await
            .map_err(|e| StorageError::ObjectStore(DisplayErrorContext(&e).to_string()))?;

        debug!(
            "Saved {} matches to {}/{}",
            history.len(),
            self.bucket,
            key
        );
        Ok(())
    }
}
