//! OSS (Object Storage Service) upload of local image files.
//!
//! Objects are sent with a single signed `PUT`, streaming the file body.
//! OSS caps a single PutObject at 5 GiB, so larger files are rejected
//! before any bytes are sent.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use url::Url;

use crate::error::{PushError, ResultExt};
use crate::services::signer::{self, Credentials, UNSIGNED_PAYLOAD};

/// Largest object accepted by a single PutObject request.
pub const MAX_PUT_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Where OSS requests are sent.
#[derive(Debug, Clone)]
pub enum OssEndpoint {
    /// `https://<bucket>.oss-<region>.aliyuncs.com/<key>`
    Regional,
    /// `<base>/<bucket>/<key>`, for private endpoints and local fakes
    PathStyle(Url),
}

#[derive(Debug, Clone)]
pub struct OssClient {
    http: reqwest::Client,
    endpoint: OssEndpoint,
    region: String,
    credentials: Credentials,
}

impl OssClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: OssEndpoint,
        region: &str,
        credentials: Credentials,
    ) -> Self {
        Self {
            http,
            endpoint,
            region: region.to_string(),
            credentials,
        }
    }

    /// URL an object is written to.
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, PushError> {
        let key = signer::percent_encode(key, true);
        let raw = match &self.endpoint {
            OssEndpoint::Regional => {
                format!("https://{}.oss-{}.aliyuncs.com/{}", bucket, self.region, key)
            }
            OssEndpoint::PathStyle(base) => format!(
                "{}/{}/{}",
                base.as_str().trim_end_matches('/'),
                bucket,
                key
            ),
        };
        Url::parse(&raw).map_err(|source| PushError::InvalidEndpoint {
            endpoint: raw,
            source,
        })
    }

    /// Upload `file` as `bucket/key`.
    ///
    /// # Headers Sent
    ///
    /// - `Content-Type: application/octet-stream`
    /// - `Content-Length: <size>`
    /// - `x-oss-date`, `x-oss-content-sha256: UNSIGNED-PAYLOAD`
    /// - `Authorization: OSS4-HMAC-SHA256 ...`
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        file: tokio::fs::File,
        size: u64,
    ) -> Result<(), PushError> {
        if size > MAX_PUT_OBJECT_SIZE {
            return Err(PushError::ObjectTooLarge {
                size,
                limit: MAX_PUT_OBJECT_SIZE,
            });
        }

        let url = self.object_url(bucket, key)?;
        let now = Utc::now();

        let mut headers = BTreeMap::new();
        headers.insert(
            "content-type".to_string(),
            "application/octet-stream".to_string(),
        );
        headers.insert("content-length".to_string(), size.to_string());
        headers.insert(
            "x-oss-content-sha256".to_string(),
            UNSIGNED_PAYLOAD.to_string(),
        );
        headers.insert("x-oss-date".to_string(), signer::oss_timestamp(now));

        let canonical_uri = format!("/{}/{}", bucket, signer::percent_encode(key, true));
        let authorization = signer::oss_v4_authorization(
            &self.credentials,
            &self.region,
            "PUT",
            &canonical_uri,
            &headers,
            now,
        );

        let mut request = self
            .http
            .put(url)
            .header("Authorization", authorization)
            .body(reqwest::Body::from(file));
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(PushError::Api {
            service: "OSS",
            code: xml_field(&body, "Code")
                .map(str::to_string)
                .unwrap_or_else(|| status.as_u16().to_string()),
            message: xml_field(&body, "Message")
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string()),
            request_id: xml_field(&body, "RequestId").unwrap_or_default().to_string(),
        })
    }
}

/// Text of the first `<tag>...</tag>` element in an OSS error document.
fn xml_field<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].trim())
}

/// Upload the image at `path` to `bucket` under `name`.
///
/// # Returns
///
/// The number of bytes uploaded.
///
/// # Errors
///
/// - `FileOpen`: the file could not be opened or its size read
/// - `error uploading to OSS`: size limit, transport or OSS API failure
pub async fn upload_to_oss(
    oss: &OssClient,
    bucket: &str,
    name: &str,
    path: &Path,
) -> Result<u64, PushError> {
    tracing::debug!("Uploading {} to OSS", path.display());

    let file_error = |source: std::io::Error| PushError::FileOpen {
        path: path.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(file_error)?;
    let size = file.metadata().await.map_err(file_error)?.len();

    oss.put_object(bucket, name, file, size)
        .await
        .context("error uploading to OSS")?;

    tracing::debug!("Uploaded {} ({} bytes) to OSS", path.display(), size);
    Ok(size)
}
