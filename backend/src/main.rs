use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use backend::{
    jwt::JwtVerifier,
    server,
    types::Environment,
    upload::{AssetPipeline, LocalAssetStore, S3AssetStore, StagingWriter},
};
use backend_storage::video::VideoStorage;
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // Configure logging format based on environment
    // Use JSON format for staging/production (Datadog), regular format for development
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();
    match environment {
        Environment::Production | Environment::Staging => {
            fmt().json().with_env_filter(filter).init();
        }
        Environment::Development => {
            fmt().with_env_filter(filter).init();
        }
    }

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let dynamodb_client = Arc::new(DynamoDbClient::new(&environment.aws_config().await));

    let video_storage = Arc::new(VideoStorage::new(
        dynamodb_client,
        environment.videos_table_name(),
    ));
    let thumbnail_store = Arc::new(LocalAssetStore::new(
        environment.asset_root(),
        &environment.public_base_url(),
    ));
    let video_store = Arc::new(S3AssetStore::new(
        s3_client,
        environment.s3_bucket(),
        environment.s3_region(),
    ));

    let pipeline = Arc::new(AssetPipeline::new(
        video_storage,
        StagingWriter::new(environment.staging_dir()),
        thumbnail_store,
        video_store,
    ));
    let jwt_verifier = Arc::new(JwtVerifier::new(&environment.jwt_secret()));

    server::start(environment, pipeline, jwt_verifier).await
}
