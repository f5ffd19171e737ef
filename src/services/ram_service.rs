//! RAM service: makes sure ECS is allowed to import images from OSS.
//!
//! Image import runs as the `AliyunECSImageImportDefaultRole` service role,
//! which needs the `AliyunECSImageImportRolePolicy` system policy attached.
//! Both are created on first use and left alone afterwards.

use std::collections::BTreeMap;

use url::Url;

use crate::error::{PushError, ResultExt};
use crate::models::ram::{
    IMAGE_IMPORT_POLICY, IMAGE_IMPORT_ROLE, IMAGE_IMPORT_TRUST_POLICY, PoliciesForRole,
    ROLE_NOT_FOUND, RoleResponse,
};
use crate::services::rpc_client::RpcClient;
use crate::services::signer::Credentials;

pub const RAM_API_VERSION: &str = "2015-05-01";
pub const RAM_DEFAULT_ENDPOINT: &str = "https://ram.aliyuncs.com";

/// Typed wrapper over the RAM actions used by the push flow.
#[derive(Debug, Clone)]
pub struct RamClient {
    rpc: RpcClient,
}

impl RamClient {
    pub fn new(http: reqwest::Client, endpoint: Url, credentials: Credentials) -> Self {
        Self {
            rpc: RpcClient::new(http, endpoint, "RAM", RAM_API_VERSION, credentials),
        }
    }

    pub async fn get_role(&self, role_name: &str) -> Result<RoleResponse, PushError> {
        self.rpc.call("GetRole", &role_params(role_name)).await
    }

    pub async fn create_role(
        &self,
        role_name: &str,
        assume_role_policy_document: &str,
    ) -> Result<RoleResponse, PushError> {
        let mut params = role_params(role_name);
        params.insert(
            "AssumeRolePolicyDocument".to_string(),
            assume_role_policy_document.to_string(),
        );
        self.rpc.call("CreateRole", &params).await
    }

    pub async fn list_policies_for_role(
        &self,
        role_name: &str,
    ) -> Result<PoliciesForRole, PushError> {
        self.rpc
            .call("ListPoliciesForRole", &role_params(role_name))
            .await
    }

    pub async fn attach_policy_to_role(
        &self,
        policy_type: &str,
        policy_name: &str,
        role_name: &str,
    ) -> Result<(), PushError> {
        let mut params = role_params(role_name);
        params.insert("PolicyType".to_string(), policy_type.to_string());
        params.insert("PolicyName".to_string(), policy_name.to_string());
        self.rpc
            .call::<serde_json::Value>("AttachPolicyToRole", &params)
            .await?;
        Ok(())
    }
}

fn role_params(role_name: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("RoleName".to_string(), role_name.to_string());
    params
}

/// Ensure the image import role exists and has the import policy attached.
///
/// # Process
///
/// 1. Look the role up; create it only when RAM reports `EntityNotExist.Role`
/// 2. List the role's policies; stop if the import policy is already there
/// 3. Attach the import system policy
///
/// # Errors
///
/// Any RAM failure other than the missing role is returned with the name of
/// the step that failed.
pub async fn config_ram_policy(ram: &RamClient) -> Result<(), PushError> {
    match ram.get_role(IMAGE_IMPORT_ROLE).await {
        Ok(found) => tracing::debug!("RAM role {} exists", found.role.role_name),
        Err(e) if e.api_code() == Some(ROLE_NOT_FOUND) => {
            tracing::info!("Creating RAM role {}", IMAGE_IMPORT_ROLE);
            ram.create_role(IMAGE_IMPORT_ROLE, IMAGE_IMPORT_TRUST_POLICY)
                .await
                .context("Failed to create RAM role")?;
        }
        Err(e) => return Err(e).context("Failed to get RAM role"),
    }

    let policies = ram
        .list_policies_for_role(IMAGE_IMPORT_ROLE)
        .await
        .context("Failed to list policies for role")?;
    if policies.contains(IMAGE_IMPORT_POLICY) {
        tracing::debug!("Policy {} already attached", IMAGE_IMPORT_POLICY);
        return Ok(());
    }

    tracing::info!(
        "Attaching policy {} to RAM role {}",
        IMAGE_IMPORT_POLICY,
        IMAGE_IMPORT_ROLE
    );
    ram.attach_policy_to_role("System", IMAGE_IMPORT_POLICY, IMAGE_IMPORT_ROLE)
        .await
        .context("Failed to attach policy to role")
}
