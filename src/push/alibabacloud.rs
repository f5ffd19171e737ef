//! `push alibabacloud`: upload to OSS, prepare RAM, import into ECS.

use std::time::Duration;

use url::Url;

use crate::config::{AlibabaCloudConfig, parse_endpoint};
use crate::error::PushError;
use crate::models::image::{ImportImageRequest, ImportedImage};
use crate::services::ecs_service::{self, EcsClient};
use crate::services::oss_service::{self, OssClient, OssEndpoint};
use crate::services::ram_service::{self, RAM_DEFAULT_ENDPOINT, RamClient};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Clients for the three services a push talks to.
pub struct AlibabaCloud {
    pub oss: OssClient,
    pub ram: RamClient,
    pub ecs: EcsClient,
}

impl AlibabaCloud {
    /// Build signed clients for the configured region and endpoints.
    pub fn new(config: &AlibabaCloudConfig) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .build()?;

        let oss_endpoint = match parse_endpoint(config.endpoints.oss_endpoint.as_deref())? {
            Some(base) => OssEndpoint::PathStyle(base),
            None => OssEndpoint::Regional,
        };
        let ram_endpoint = endpoint_or(
            config.endpoints.ram_endpoint.as_deref(),
            RAM_DEFAULT_ENDPOINT,
        )?;
        let ecs_endpoint = endpoint_or(
            config.endpoints.ecs_endpoint.as_deref(),
            &ecs_service::default_endpoint(&config.region),
        )?;

        Ok(Self {
            oss: OssClient::new(
                http.clone(),
                oss_endpoint,
                &config.region,
                config.credentials.clone(),
            ),
            ram: RamClient::new(http.clone(), ram_endpoint, config.credentials.clone()),
            ecs: EcsClient::new(http, ecs_endpoint, config.credentials.clone()),
        })
    }
}

fn endpoint_or(value: Option<&str>, default: &str) -> Result<Url, PushError> {
    let raw = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => default,
    };
    Url::parse(raw).map_err(|source| PushError::InvalidEndpoint {
        endpoint: raw.to_string(),
        source,
    })
}

/// Push the image described by `config` to Alibaba Cloud.
///
/// # Process
///
/// 1. Upload the file to the OSS bucket under `config.name`
/// 2. Ensure the ECS image import role and policy exist in RAM
/// 3. Import the object as an ECS image and set its NVMe flag
///
/// The first failing step aborts the push; nothing is rolled back.
pub async fn push_alibabacloud(config: &AlibabaCloudConfig) -> Result<ImportedImage, PushError> {
    let cloud = AlibabaCloud::new(config)?;

    let size =
        oss_service::upload_to_oss(&cloud.oss, &config.bucket, &config.name, &config.path).await?;

    ram_service::config_ram_policy(&cloud.ram).await?;

    let request = ImportImageRequest {
        region_id: config.region.clone(),
        image_name: config.name.clone(),
        description: config.description.clone(),
        boot_mode: config.boot_mode,
        oss_bucket: config.bucket.clone(),
        oss_object: config.name.clone(),
        disk_image_size: config.size_gb,
    };
    let image = ecs_service::create_ecs_image(&cloud.ecs, &request, config.nvme).await?;

    tracing::info!(
        bytes = size,
        image_id = %image.image_id,
        "Pushed {} to oss://{}/{}",
        config.path.display(),
        config.bucket,
        config.name
    );
    Ok(image)
}
