//! RAM (Resource Access Management) response models.
//!
//! Only the fields the push flow reads are modelled; everything else in
//! the response documents is ignored.

use serde::Deserialize;

/// Service role ECS assumes to read the uploaded object.
pub const IMAGE_IMPORT_ROLE: &str = "AliyunECSImageImportDefaultRole";

/// System policy granting the role access to OSS for image import.
pub const IMAGE_IMPORT_POLICY: &str = "AliyunECSImageImportRolePolicy";

/// Trust policy letting the ECS service assume the import role.
pub const IMAGE_IMPORT_TRUST_POLICY: &str = r#"{
  "Statement": [
    {
      "Action": "sts:AssumeRole",
      "Effect": "Allow",
      "Principal": {
        "Service": [
          "ecs.aliyuncs.com"
        ]
      }
    }
  ],
  "Version": "1"
}"#;

/// Error code RAM returns from `GetRole` when the role does not exist.
pub const ROLE_NOT_FOUND: &str = "EntityNotExist.Role";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub role_name: String,
}

/// Body of `GetRole` and `CreateRole` responses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleResponse {
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    pub policy_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policies {
    #[serde(default)]
    pub policy: Vec<Policy>,
}

/// Body of a `ListPoliciesForRole` response.
///
/// # Example
///
/// ```json
/// {
///   "RequestId": "7B8A4E7D-6CFF-471D-84DF-195A7A241ECB",
///   "Policies": {
///     "Policy": [
///       { "PolicyName": "AliyunECSImageImportRolePolicy", "PolicyType": "System" }
///     ]
///   }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PoliciesForRole {
    #[serde(default)]
    pub policies: Policies,
}

impl PoliciesForRole {
    pub fn contains(&self, policy_name: &str) -> bool {
        self.policies
            .policy
            .iter()
            .any(|p| p.policy_name == policy_name)
    }
}
