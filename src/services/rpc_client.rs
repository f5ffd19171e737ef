//! Client for RPC-style Alibaba Cloud OpenAPI services (ECS, RAM).
//!
//! Every call is a signed `POST /` with the action parameters in the query
//! string and an empty body. Successful responses are JSON documents;
//! failures carry a JSON error body with `Code`, `Message` and `RequestId`.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::error::PushError;
use crate::services::signer::{self, Credentials};

/// Error document returned by OpenAPI services.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ApiErrorBody {
    code: String,
    message: String,
    request_id: String,
}

/// Signed client bound to one service endpoint and API version.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    service: &'static str,
    version: &'static str,
    credentials: Credentials,
}

impl RpcClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: Url,
        service: &'static str,
        version: &'static str,
        credentials: Credentials,
    ) -> Self {
        Self {
            http,
            endpoint,
            service,
            version,
            credentials,
        }
    }

    /// Invoke `action` with `params` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// - `Http`: the request could not be sent or the body not read
    /// - `Api`: the service answered with a non-2xx status
    /// - `Decode`: the success body did not match `T`
    pub async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<T, PushError> {
        let query = signer::canonical_query(params);
        let payload_hash = signer::sha256_hex(b"");

        let mut signed = BTreeMap::new();
        signed.insert("host".to_string(), host_header(&self.endpoint));
        signed.insert("x-acs-action".to_string(), action.to_string());
        signed.insert("x-acs-version".to_string(), self.version.to_string());
        signed.insert("x-acs-date".to_string(), signer::acs_timestamp(Utc::now()));
        signed.insert(
            "x-acs-signature-nonce".to_string(),
            Uuid::new_v4().to_string(),
        );
        signed.insert("x-acs-content-sha256".to_string(), payload_hash.clone());

        let authorization =
            signer::acs3_authorization(&self.credentials, "POST", &query, &signed, &payload_hash);

        let mut url = self.endpoint.clone();
        url.set_path("/");
        url.set_query(if query.is_empty() { None } else { Some(&query) });

        tracing::debug!(service = self.service, action, "Calling {}", url.host_str().unwrap_or(""));

        // reqwest derives Host from the URL, which matches the signed value
        let mut request = self
            .http
            .post(url)
            .header("Authorization", authorization)
            .header("Accept", "application/json");
        for (name, value) in signed.iter().filter(|(name, _)| name.as_str() != "host") {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(self.api_error(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn api_error(&self, status: reqwest::StatusCode, body: &str) -> PushError {
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
        PushError::Api {
            service: self.service,
            code: if parsed.code.is_empty() {
                status.as_u16().to_string()
            } else {
                parsed.code
            },
            message: if parsed.message.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                parsed.message
            },
            request_id: parsed.request_id,
        }
    }
}

/// `host[:port]` as reqwest will send it.
pub fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RpcClient {
        RpcClient::new(
            reqwest::Client::new(),
            Url::parse("https://ram.aliyuncs.com").unwrap(),
            "RAM",
            "2015-05-01",
            Credentials {
                access_key_id: "AKID".to_string(),
                access_key_secret: "SECRET".to_string(),
            },
        )
    }

    #[test]
    fn host_header_includes_non_default_ports() {
        assert_eq!(
            host_header(&Url::parse("https://ecs.cn-hangzhou.aliyuncs.com").unwrap()),
            "ecs.cn-hangzhou.aliyuncs.com"
        );
        assert_eq!(
            host_header(&Url::parse("http://127.0.0.1:8080/").unwrap()),
            "127.0.0.1:8080"
        );
    }

    #[test]
    fn api_errors_use_the_error_document() {
        let body = r#"{"RequestId":"req-9","HostId":"ram.aliyuncs.com","Code":"EntityNotExist.Role","Message":"The role not exists: AliyunECSImageImportDefaultRole"}"#;
        let err = client().api_error(reqwest::StatusCode::NOT_FOUND, body);
        match err {
            PushError::Api {
                service,
                code,
                request_id,
                ..
            } => {
                assert_eq!(service, "RAM");
                assert_eq!(code, "EntityNotExist.Role");
                assert_eq!(request_id, "req-9");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn api_errors_fall_back_to_the_status() {
        let err = client().api_error(reqwest::StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.api_code(), Some("502"));
        assert!(err.to_string().contains("Bad Gateway"));
    }
}
