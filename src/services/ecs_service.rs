//! ECS service: registers an uploaded OSS object as a custom image.

use std::collections::BTreeMap;

use url::Url;

use crate::error::{PushError, ResultExt};
use crate::models::image::{ImportImageRequest, ImportedImage, NvmeSupport};
use crate::services::rpc_client::RpcClient;
use crate::services::signer::Credentials;

pub const ECS_API_VERSION: &str = "2014-05-26";

/// Regional ECS endpoint, e.g. `https://ecs.cn-hangzhou.aliyuncs.com`.
pub fn default_endpoint(region: &str) -> String {
    format!("https://ecs.{}.aliyuncs.com", region)
}

#[derive(Debug, Clone)]
pub struct EcsClient {
    rpc: RpcClient,
}

impl EcsClient {
    pub fn new(http: reqwest::Client, endpoint: Url, credentials: Credentials) -> Self {
        Self {
            rpc: RpcClient::new(http, endpoint, "ECS", ECS_API_VERSION, credentials),
        }
    }

    pub async fn import_image(
        &self,
        request: &ImportImageRequest,
    ) -> Result<ImportedImage, PushError> {
        self.rpc
            .call("ImportImage", &import_image_params(request))
            .await
    }

    pub async fn modify_image_attribute(
        &self,
        region_id: &str,
        image_id: &str,
        nvme: NvmeSupport,
    ) -> Result<(), PushError> {
        let mut params = BTreeMap::new();
        params.insert("RegionId".to_string(), region_id.to_string());
        params.insert("ImageId".to_string(), image_id.to_string());
        params.insert("Features.NvmeSupport".to_string(), nvme.as_str().to_string());
        self.rpc
            .call::<serde_json::Value>("ModifyImageAttribute", &params)
            .await?;
        Ok(())
    }
}

/// Flatten an import request into RPC parameters.
///
/// The single disk mapping is encoded as the first element of the
/// `DiskDeviceMapping` repeat list.
fn import_image_params(request: &ImportImageRequest) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("RegionId".to_string(), request.region_id.clone());
    params.insert("ImageName".to_string(), request.image_name.clone());
    params.insert("Description".to_string(), request.description.clone());
    params.insert("BootMode".to_string(), request.boot_mode.as_str().to_string());
    params.insert(
        "DiskDeviceMapping.1.OSSBucket".to_string(),
        request.oss_bucket.clone(),
    );
    params.insert(
        "DiskDeviceMapping.1.OSSObject".to_string(),
        request.oss_object.clone(),
    );
    params.insert(
        "DiskDeviceMapping.1.DiskImageSize".to_string(),
        request.disk_image_size.to_string(),
    );
    params
}

/// Import the object as an ECS image, then set its NVMe feature flag.
///
/// # Returns
///
/// The image and import task identifiers reported by `ImportImage`.
/// The import itself continues asynchronously on the ECS side.
pub async fn create_ecs_image(
    ecs: &EcsClient,
    request: &ImportImageRequest,
    nvme: NvmeSupport,
) -> Result<ImportedImage, PushError> {
    tracing::debug!("Creating ECS image from OSS image {}", request.oss_object);

    let image = ecs
        .import_image(request)
        .await
        .context("Failed to create ECS image")?;

    ecs.modify_image_attribute(&request.region_id, &image.image_id, nvme)
        .await
        .context("Failed to modify ECS image")?;

    tracing::info!(
        image_id = %image.image_id,
        task_id = %image.task_id,
        "ECS image {} created",
        request.image_name
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::image::BootMode;

    #[test]
    fn import_params_flatten_the_disk_mapping() {
        let request = ImportImageRequest {
            region_id: "cn-shanghai".to_string(),
            image_name: "linuxkit.raw".to_string(),
            description: "Created by imgpush".to_string(),
            boot_mode: BootMode::Uefi,
            oss_bucket: "images".to_string(),
            oss_object: "linuxkit.raw".to_string(),
            disk_image_size: 40,
        };

        let params = import_image_params(&request);
        assert_eq!(params["BootMode"], "UEFI");
        assert_eq!(params["DiskDeviceMapping.1.OSSBucket"], "images");
        assert_eq!(params["DiskDeviceMapping.1.OSSObject"], "linuxkit.raw");
        assert_eq!(params["DiskDeviceMapping.1.DiskImageSize"], "40");
        assert_eq!(params["RegionId"], "cn-shanghai");
        assert_eq!(params.len(), 7);
    }

    #[test]
    fn regional_endpoint() {
        assert_eq!(
            default_endpoint("eu-central-1"),
            "https://ecs.eu-central-1.aliyuncs.com"
        );
    }
}
