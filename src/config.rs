//! Push configuration.
//!
//! Flags and their environment fallbacks are parsed by clap (see `cli`).
//! Endpoint overrides have no flags; they are read with the `envy` crate
//! from `ALIBABA_CLOUD_*` variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::PushError;
use crate::models::image::{BootMode, NvmeSupport};
use crate::services::signer::Credentials;

/// Optional endpoint overrides loaded from environment variables.
///
/// # Environment Variables
///
/// - `ALIBABA_CLOUD_OSS_ENDPOINT`: base URL for OSS, objects go to `<base>/<bucket>/<key>`
/// - `ALIBABA_CLOUD_ECS_ENDPOINT`: base URL for ECS, defaults to the regional endpoint
/// - `ALIBABA_CLOUD_RAM_ENDPOINT`: base URL for RAM, defaults to `https://ram.aliyuncs.com`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Endpoints {
    pub oss_endpoint: Option<String>,
    pub ecs_endpoint: Option<String>,
    pub ram_endpoint: Option<String>,
}

impl Endpoints {
    /// Load overrides from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if `.env` files should be honoured.
    pub fn from_env() -> Result<Self, envy::Error> {
        Self::from_vars(std::env::vars())
    }

    /// Load overrides from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed("ALIBABA_CLOUD_").from_iter(vars)
    }
}

/// Parse an endpoint override, treating an empty value as unset.
pub fn parse_endpoint(value: Option<&str>) -> Result<Option<Url>, PushError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Url::parse(raw)
            .map(Some)
            .map_err(|source| PushError::InvalidEndpoint {
                endpoint: raw.to_string(),
                source,
            }),
    }
}

/// Fully validated settings for `push alibabacloud`.
#[derive(Debug, Clone)]
pub struct AlibabaCloudConfig {
    pub credentials: Credentials,
    pub region: String,
    pub bucket: String,
    /// OSS object key and ECS image name
    pub name: String,
    pub path: PathBuf,
    pub timeout: Duration,
    /// Disk image size in GB
    pub size_gb: u32,
    pub boot_mode: BootMode,
    pub nvme: NvmeSupport,
    pub description: String,
    pub endpoints: Endpoints,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn endpoints_default_to_none() {
        let endpoints = Endpoints::from_vars(vars(&[("PATH", "/usr/bin")])).unwrap();
        assert!(endpoints.oss_endpoint.is_none());
        assert!(endpoints.ecs_endpoint.is_none());
        assert!(endpoints.ram_endpoint.is_none());
    }

    #[test]
    fn endpoints_read_prefixed_variables() {
        let endpoints = Endpoints::from_vars(vars(&[
            ("ALIBABA_CLOUD_OSS_ENDPOINT", "http://127.0.0.1:9000"),
            ("ALIBABA_CLOUD_RAM_ENDPOINT", "https://ram.example.internal"),
            ("ALIBABA_CLOUD_ACCESS_KEY_ID", "ignored"),
        ]))
        .unwrap();
        assert_eq!(endpoints.oss_endpoint.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(
            endpoints.ram_endpoint.as_deref(),
            Some("https://ram.example.internal")
        );
        assert!(endpoints.ecs_endpoint.is_none());
    }

    #[test]
    fn endpoint_parsing() {
        assert!(parse_endpoint(None).unwrap().is_none());
        assert!(parse_endpoint(Some("  ")).unwrap().is_none());
        assert_eq!(
            parse_endpoint(Some("http://localhost:8080")).unwrap().unwrap().as_str(),
            "http://localhost:8080/"
        );
        assert!(matches!(
            parse_endpoint(Some("not a url")),
            Err(PushError::InvalidEndpoint { .. })
        ));
    }
}
