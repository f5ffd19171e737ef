//! Command line definition.
//!
//! ```text
//! imgpush [--verbose] push <PROVIDER> [FLAGS] <PATH>
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{AlibabaCloudConfig, Endpoints};
use crate::error::PushError;
use crate::models::image::{BootMode, NvmeSupport};
use crate::services::signer::Credentials;

pub const ACCESS_KEY_ID_VAR: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ACCESS_KEY_SECRET_VAR: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
pub const REGION_ID_VAR: &str = "ALIBABA_CLOUD_REGION_ID";

/// Push built VM images to cloud providers.
#[derive(Debug, Parser)]
#[command(name = "imgpush", version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Push a VM image to a cloud provider.
    Push(PushArgs),
}

#[derive(Debug, Args)]
#[command(arg_required_else_help = true)]
pub struct PushArgs {
    #[command(subcommand)]
    pub provider: PushProvider,
}

/// Supported providers. Please keep in alphabetical order.
#[derive(Debug, Subcommand)]
pub enum PushProvider {
    /// Push image to Alibaba Cloud.
    ///
    /// The image is uploaded to OSS and an ECS image is created from it.
    #[command(name = "alibabacloud")]
    AlibabaCloud(AlibabaCloudArgs),
}

#[derive(Debug, Clone, Args)]
pub struct AlibabaCloudArgs {
    /// Full path of the image to push.
    pub path: PathBuf,

    /// Upload timeout in seconds.
    #[arg(long, default_value_t = 600)]
    pub timeout: u64,

    /// Overrides the name used to identify the file in OSS and the VM image.
    /// Defaults to the base of PATH.
    #[arg(long)]
    pub name: Option<String>,

    /// Enable UEFI boot mode.
    #[arg(long)]
    pub uefi: bool,

    /// Indicate NVMe driver is supported.
    #[arg(long)]
    pub nvme: bool,

    /// Image size in GB.
    #[arg(long, default_value_t = 20)]
    pub size: u32,

    /// Description of the ECS image.
    #[arg(long, default_value = "Created by imgpush")]
    pub description: String,

    /// Alibaba Cloud Access Key ID. *Required*
    #[arg(long, env = "ALIBABA_CLOUD_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,

    /// Alibaba Cloud Access Key Secret. *Required*
    #[arg(long, env = "ALIBABA_CLOUD_ACCESS_KEY_SECRET", hide_env_values = true)]
    pub access_key_secret: Option<String>,

    /// Alibaba Cloud Region ID. *Required*
    #[arg(long, env = "ALIBABA_CLOUD_REGION_ID")]
    pub region_id: Option<String>,

    /// OSS Bucket to upload to. *Required*
    #[arg(long)]
    pub bucket: Option<String>,
}

/// Treat `Some("")` like `None`.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Flag value, or the environment variable when the flag is unset or empty.
///
/// clap only consults the variable when the flag is absent, so an explicit
/// `--flag ""` would otherwise hide it.
fn flag_or_env<F>(flag: Option<String>, var: &str, env: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(flag).or_else(|| non_empty(env(var)))
}

/// Object and image name derived from the last component of `path`.
pub fn default_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

impl AlibabaCloudArgs {
    /// Validate the flags and resolve defaults.
    ///
    /// # Errors
    ///
    /// Checked in order, returning the first failure:
    /// - access key ID, access key secret, region or bucket missing
    /// - size of zero
    /// - no usable name given or derivable from PATH
    pub fn into_config(self, endpoints: Endpoints) -> Result<AlibabaCloudConfig, PushError> {
        self.into_config_with(endpoints, |var| std::env::var(var).ok())
    }

    /// Like `into_config`, reading environment fallbacks through `env`.
    pub fn into_config_with<F>(
        self,
        endpoints: Endpoints,
        env: F,
    ) -> Result<AlibabaCloudConfig, PushError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_key_id = flag_or_env(self.access_key_id, ACCESS_KEY_ID_VAR, &env)
            .ok_or_else(|| {
                PushError::MissingOption(format!(
                    "Missing required flag --access-key-id, both environment variable {} and flag are not set",
                    ACCESS_KEY_ID_VAR
                ))
            })?;
        let access_key_secret = flag_or_env(self.access_key_secret, ACCESS_KEY_SECRET_VAR, &env)
            .ok_or_else(|| {
                PushError::MissingOption(format!(
                    "Missing required flag --access-key-secret, both environment variable {} and flag are not set",
                    ACCESS_KEY_SECRET_VAR
                ))
            })?;
        let region = flag_or_env(self.region_id, REGION_ID_VAR, &env).ok_or_else(|| {
            PushError::MissingOption("Missing required flag --region-id".to_string())
        })?;
        let bucket = non_empty(self.bucket)
            .ok_or_else(|| PushError::MissingOption("Missing required flag --bucket".to_string()))?;

        if self.size == 0 {
            return Err(PushError::InvalidOption {
                flag: "--size",
                reason: "image size must be at least 1 GB".to_string(),
            });
        }

        let name = match non_empty(self.name) {
            Some(name) => name,
            None => default_name(&self.path).ok_or_else(|| PushError::InvalidOption {
                flag: "--name",
                reason: format!(
                    "cannot derive a name from {}, pass --name",
                    self.path.display()
                ),
            })?,
        };

        Ok(AlibabaCloudConfig {
            credentials: Credentials {
                access_key_id,
                access_key_secret,
            },
            region,
            bucket,
            name,
            path: self.path,
            timeout: Duration::from_secs(self.timeout),
            size_gb: self.size,
            boot_mode: BootMode::from_uefi_flag(self.uefi),
            nvme: NvmeSupport::from_nvme_flag(self.nvme),
            description: self.description,
            endpoints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AlibabaCloudArgs {
        AlibabaCloudArgs {
            path: PathBuf::from("/build/linuxkit-efi.raw"),
            timeout: 600,
            name: None,
            uefi: false,
            nvme: false,
            size: 20,
            description: "Created by imgpush".to_string(),
            access_key_id: Some("AKID".to_string()),
            access_key_secret: Some("SECRET".to_string()),
            region_id: Some("cn-hangzhou".to_string()),
            bucket: Some("images".to_string()),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn missing(args: AlibabaCloudArgs) -> String {
        args.into_config_with(Endpoints::default(), no_env)
            .unwrap_err()
            .to_string()
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "imgpush",
            "push",
            "alibabacloud",
            "--access-key-id",
            "AKID",
            "--access-key-secret",
            "SECRET",
            "--region-id",
            "cn-beijing",
            "--bucket",
            "images",
            "--name",
            "custom",
            "--size",
            "40",
            "--timeout",
            "30",
            "--uefi",
            "--nvme",
            "/build/linuxkit.raw",
        ])
        .unwrap();

        let Command::Push(PushArgs {
            provider: PushProvider::AlibabaCloud(args),
        }) = cli.command;
        let config = args.into_config(Endpoints::default()).unwrap();

        assert_eq!(config.region, "cn-beijing");
        assert_eq!(config.name, "custom");
        assert_eq!(config.size_gb, 40);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.boot_mode, BootMode::Uefi);
        assert_eq!(config.nvme, NvmeSupport::Supported);
        assert!(!cli.verbose);
    }

    #[test]
    fn path_is_required() {
        assert!(Cli::try_parse_from(["imgpush", "push", "alibabacloud"]).is_err());
        assert!(
            Cli::try_parse_from(["imgpush", "push", "alibabacloud", "a.raw", "b.raw"]).is_err()
        );
    }

    #[test]
    fn defaults() {
        let config = args().into_config(Endpoints::default()).unwrap();
        assert_eq!(config.name, "linuxkit-efi.raw");
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert_eq!(config.size_gb, 20);
        assert_eq!(config.boot_mode, BootMode::Bios);
        assert_eq!(config.nvme, NvmeSupport::Unsupported);
    }

    #[test]
    fn missing_credentials_name_flag_and_variable() {
        let err = missing(AlibabaCloudArgs {
            access_key_id: None,
            ..args()
        });
        assert!(err.contains("--access-key-id"));
        assert!(err.contains(ACCESS_KEY_ID_VAR));

        let err = missing(AlibabaCloudArgs {
            access_key_secret: Some(String::new()),
            ..args()
        });
        assert!(err.contains("--access-key-secret"));
        assert!(err.contains(ACCESS_KEY_SECRET_VAR));
    }

    #[test]
    fn validation_order() {
        let err = missing(AlibabaCloudArgs {
            access_key_id: None,
            region_id: None,
            bucket: None,
            ..args()
        });
        assert!(err.contains("--access-key-id"));

        let err = missing(AlibabaCloudArgs {
            region_id: None,
            bucket: None,
            ..args()
        });
        assert_eq!(err, "Missing required flag --region-id");

        let err = missing(AlibabaCloudArgs {
            bucket: Some(" ".to_string()),
            ..args()
        });
        assert_eq!(err, "Missing required flag --bucket");
    }

    #[test]
    fn rejects_zero_size() {
        let err = missing(AlibabaCloudArgs { size: 0, ..args() });
        assert!(err.contains("--size"));
    }

    #[test]
    fn name_must_be_derivable() {
        let err = missing(AlibabaCloudArgs {
            path: PathBuf::from("/"),
            ..args()
        });
        assert!(err.contains("--name"));

        let config = AlibabaCloudArgs {
            path: PathBuf::from("/"),
            name: Some("root.raw".to_string()),
            ..args()
        }
        .into_config(Endpoints::default())
        .unwrap();
        assert_eq!(config.name, "root.raw");
    }

    #[test]
    fn empty_flags_fall_back_to_the_environment() {
        let env = |var: &str| match var {
            ACCESS_KEY_ID_VAR => Some("ENVAKID".to_string()),
            ACCESS_KEY_SECRET_VAR => Some("ENVSECRET".to_string()),
            REGION_ID_VAR => Some("cn-shenzhen".to_string()),
            _ => None,
        };

        let config = AlibabaCloudArgs {
            access_key_id: Some(String::new()),
            access_key_secret: Some(" ".to_string()),
            region_id: Some(String::new()),
            ..args()
        }
        .into_config_with(Endpoints::default(), env)
        .unwrap();
        assert_eq!(config.credentials.access_key_id, "ENVAKID");
        assert_eq!(config.credentials.access_key_secret, "ENVSECRET");
        assert_eq!(config.region, "cn-shenzhen");

        // A non-empty flag still wins
        let config = args().into_config_with(Endpoints::default(), env).unwrap();
        assert_eq!(config.credentials.access_key_id, "AKID");
        assert_eq!(config.region, "cn-hangzhou");
    }

    #[test]
    fn empty_flag_and_empty_variable_is_missing() {
        let err = AlibabaCloudArgs {
            access_key_id: Some(String::new()),
            ..args()
        }
        .into_config_with(Endpoints::default(), |_: &str| Some(String::new()))
        .unwrap_err();
        assert!(err.to_string().contains("--access-key-id"));
    }
}
