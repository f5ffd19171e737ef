//! ECS image registration model.

use serde::Deserialize;

/// Firmware the imported image boots with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    Bios,
    Uefi,
}

impl BootMode {
    pub fn from_uefi_flag(uefi: bool) -> Self {
        if uefi { BootMode::Uefi } else { BootMode::Bios }
    }

    /// Value of the `BootMode` parameter of `ImportImage`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BootMode::Bios => "BIOS",
            BootMode::Uefi => "UEFI",
        }
    }
}

/// Whether the image ships an NVMe driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvmeSupport {
    Supported,
    Unsupported,
}

impl NvmeSupport {
    pub fn from_nvme_flag(nvme: bool) -> Self {
        if nvme {
            NvmeSupport::Supported
        } else {
            NvmeSupport::Unsupported
        }
    }

    /// Value of the `Features.NvmeSupport` parameter of `ModifyImageAttribute`.
    pub fn as_str(&self) -> &'static str {
        match self {
            NvmeSupport::Supported => "supported",
            NvmeSupport::Unsupported => "unsupported",
        }
    }
}

/// Parameters of an `ImportImage` call with a single system disk.
#[derive(Debug, Clone)]
pub struct ImportImageRequest {
    pub region_id: String,
    pub image_name: String,
    pub description: String,
    pub boot_mode: BootMode,
    pub oss_bucket: String,
    pub oss_object: String,
    /// Size of the system disk in GB
    pub disk_image_size: u32,
}

/// Body of a successful `ImportImage` response.
///
/// # Example
///
/// ```json
/// {
///   "RequestId": "C8B26B44-0189-443E-9816-D951F596B2A1",
///   "ImageId": "m-bp1g7004ksh0oeuc****",
///   "TaskId": "t-bp1g7004ksh0oeuc****",
///   "RegionId": "cn-hangzhou"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ImportedImage {
    pub image_id: String,
    #[serde(default)]
    pub task_id: String,
}
