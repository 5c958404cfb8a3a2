use std::collections::BTreeMap;

use serde_json::Value;

/// The record returned by `GET /version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct Version {
    pub Version: String,
    pub ApiVersion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub MinAPIVersion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub GitCommit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub GoVersion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub Os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub Arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub KernelVersion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub Experimental: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub BuildTime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub Platform: Option<Platform>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub Components: Vec<Component>,
    /// Whatever else the daemon reported, kept as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct Platform {
    pub Name: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One engine component (`Engine`, `containerd`, `runc`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct Component {
    pub Name: String,
    pub Version: String,
    /// Free-form, and differs per component.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub Details: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
