//! Environment configuration for different deployment stages

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use tracing::Level;

const DEFAULT_PORT: u16 = 8091;
const DEFAULT_REGION: &str = "us-east-1";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Reads a required variable, falling back to `default` in development
    fn var_or_dev_default(&self, name: &str, default: &str) -> String {
        match self {
            Self::Production | Self::Staging => env::var(name)
                .unwrap_or_else(|_| panic!("{name} environment variable is not set")),
            Self::Development => env::var(name).unwrap_or_else(|_| default.to_string()),
        }
    }

    /// Returns the S3 bucket name videos are promoted to
    ///
    /// # Panics
    ///
    /// Panics outside development if `S3_BUCKET_NAME` is not set
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        self.var_or_dev_default("S3_BUCKET_NAME", "tubely-videos")
    }

    /// Returns the region of the S3 bucket
    #[must_use]
    pub fn s3_region(&self) -> String {
        env::var("S3_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string())
    }

    /// Returns the `DynamoDB` table holding video records
    ///
    /// # Panics
    ///
    /// Panics outside development if `VIDEOS_TABLE_NAME` is not set
    #[must_use]
    pub fn videos_table_name(&self) -> String {
        self.var_or_dev_default("VIDEOS_TABLE_NAME", "tubely-videos")
    }

    /// Directory thumbnails are promoted to and served from
    #[must_use]
    pub fn asset_root(&self) -> PathBuf {
        env::var("ASSET_ROOT").map_or_else(|_| PathBuf::from("./assets"), PathBuf::from)
    }

    /// Directory uploads are staged in before promotion
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        env::var("STAGING_DIR").map_or_else(
            |_| env::temp_dir().join("tubely-staging"),
            PathBuf::from,
        )
    }

    /// Externally reachable origin used to build thumbnail URLs
    ///
    /// # Panics
    ///
    /// Panics outside development if `PUBLIC_BASE_URL` is not set
    #[must_use]
    pub fn public_base_url(&self) -> String {
        let fallback = format!("http://localhost:{}", self.port());
        self.var_or_dev_default("PUBLIC_BASE_URL", &fallback)
    }

    /// Secret used to verify access tokens
    ///
    /// # Panics
    ///
    /// Panics outside development if `JWT_SECRET` is not set
    #[must_use]
    pub fn jwt_secret(&self) -> String {
        self.var_or_dev_default("JWT_SECRET", "tubely-development-secret")
    }

    /// Port the HTTP server listens on
    #[must_use]
    pub fn port(&self) -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        // Videos go to S3 in a single request, so the operation budget covers a full
        // 1 GiB transfer
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(15 * 60))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder().region(Region::new(self.s3_region()));

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Default log level when `RUST_LOG` is not set
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development => Level::DEBUG,
            })
    }
}
