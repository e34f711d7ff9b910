use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Upload options did not have the shape their provider requires.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("upload options must be of type {expected}, not {found}")]
pub struct ShapeError {
    pub expected: &'static str,
    pub found: String,
}

impl ShapeError {
    pub fn missing(expected: &'static str) -> Self {
        Self { expected, found: "missing".to_string() }
    }
}

// ---- Guards ----

fn array_field(options: &JsonValue, field: &str) -> bool {
    options.get(field).is_some_and(JsonValue::is_array)
}

fn string_field(options: &JsonValue, field: &str) -> bool {
    options.get(field).is_some_and(JsonValue::is_string)
}

pub fn is_aws_upload_request_options(options: &JsonValue) -> bool {
    array_field(options, "share_with_accounts") && array_field(options, "share_with_sources")
}

pub fn is_gcp_upload_request_options(options: &JsonValue) -> bool {
    array_field(options, "share_with_accounts") && options.get("share_with_sources").is_none()
}

pub fn is_azure_upload_request_options(options: &JsonValue) -> bool {
    string_field(options, "resource_group")
}

pub fn is_oci_upload_status(options: &JsonValue) -> bool {
    string_field(options, "url")
}

pub fn is_awss3_upload_status(options: &JsonValue) -> bool {
    string_field(options, "url")
}

/// Short description of a JSON value's shape for error messages.
pub fn describe_shape(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "missing".to_string(),
        JsonValue::Bool(_) => "boolean".to_string(),
        JsonValue::Number(_) => "number".to_string(),
        JsonValue::String(_) => "string".to_string(),
        JsonValue::Array(_) => "array".to_string(),
        JsonValue::Object(map) => {
            let fields: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with fields [{}]", fields.join(", "))
        }
    }
}

// ---- Variants ----

/// A provider-specific upload options shape with its runtime guard.
pub trait UploadVariant: DeserializeOwned {
    const EXPECTED: &'static str;

    fn matches(options: &JsonValue) -> bool;

    /// Validate, then read. Never yields a partially populated value.
    fn narrow(options: &JsonValue) -> Result<Self, ShapeError> {
        if !Self::matches(options) {
            return Err(ShapeError { expected: Self::EXPECTED, found: describe_shape(options) });
        }
        serde_json::from_value(options.clone())
            .map_err(|e| ShapeError { expected: Self::EXPECTED, found: e.to_string() })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AwsUploadRequestOptions {
    pub share_with_accounts: Vec<String>,
    pub share_with_sources: Vec<String>,
}

impl UploadVariant for AwsUploadRequestOptions {
    const EXPECTED: &'static str = "AwsUploadRequestOptions";

    fn matches(options: &JsonValue) -> bool {
        is_aws_upload_request_options(options)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GcpUploadRequestOptions {
    pub share_with_accounts: Vec<String>,
}

impl UploadVariant for GcpUploadRequestOptions {
    const EXPECTED: &'static str = "GcpUploadRequestOptions";

    fn matches(options: &JsonValue) -> bool {
        is_gcp_upload_request_options(options)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AzureUploadRequestOptions {
    pub resource_group: String,
    #[serde(default)]
    pub image_name: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
}

impl UploadVariant for AzureUploadRequestOptions {
    const EXPECTED: &'static str = "AzureUploadRequestOptions";

    fn matches(options: &JsonValue) -> bool {
        is_azure_upload_request_options(options)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OciUploadStatus {
    pub url: String,
}

impl UploadVariant for OciUploadStatus {
    const EXPECTED: &'static str = "OciUploadStatus";

    fn matches(options: &JsonValue) -> bool {
        is_oci_upload_status(options)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AwsS3UploadStatus {
    pub url: String,
}

impl UploadVariant for AwsS3UploadStatus {
    const EXPECTED: &'static str = "Awss3UploadStatus";

    fn matches(options: &JsonValue) -> bool {
        is_awss3_upload_status(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn describe_lists_object_fields() {
        let v = json!({"share_with_accounts": [], "region": "us-east-1"});
        assert_eq!(describe_shape(&v), "object with fields [region, share_with_accounts]");
        assert_eq!(describe_shape(&JsonValue::Null), "missing");
    }

    #[test]
    fn narrow_rejects_non_string_accounts() {
        let v = json!({"share_with_accounts": [1, 2]});
        let err = GcpUploadRequestOptions::narrow(&v).unwrap_err();
        assert_eq!(err.expected, "GcpUploadRequestOptions");
    }
}
