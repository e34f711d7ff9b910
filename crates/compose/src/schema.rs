use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub type ComposeId = Uuid;
pub type BlueprintId = Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ImageType {
    Aws,
    Ami,
    Azure,
    Gcp,
    GuestImage,
    ImageInstaller,
    Vsphere,
    VsphereOva,
    Wsl,
    EdgeCommit,
    EdgeInstaller,
    RhelEdgeCommit,
    RhelEdgeInstaller,
    Vhd,
    Oci,
    /// Any image type this client does not know about yet.
    #[serde(other)]
    Unrecognized,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Aws => "aws",
            ImageType::Ami => "ami",
            ImageType::Azure => "azure",
            ImageType::Gcp => "gcp",
            ImageType::GuestImage => "guest-image",
            ImageType::ImageInstaller => "image-installer",
            ImageType::Vsphere => "vsphere",
            ImageType::VsphereOva => "vsphere-ova",
            ImageType::Wsl => "wsl",
            ImageType::EdgeCommit => "edge-commit",
            ImageType::EdgeInstaller => "edge-installer",
            ImageType::RhelEdgeCommit => "rhel-edge-commit",
            ImageType::RhelEdgeInstaller => "rhel-edge-installer",
            ImageType::Vhd => "vhd",
            ImageType::Oci => "oci",
            ImageType::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Architecture {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "aarch64")]
    Aarch64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum UploadType {
    #[serde(rename = "aws")]
    Aws,
    #[serde(rename = "aws.s3")]
    AwsS3,
    #[serde(rename = "gcp")]
    Gcp,
    #[serde(rename = "azure")]
    Azure,
    #[serde(rename = "oci.objectstorage")]
    OciObjectStorage,
    #[serde(other, rename = "unrecognized")]
    Unrecognized,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadRequest {
    #[serde(rename = "type")]
    pub kind: UploadType,
    #[serde(default)]
    pub options: JsonValue, // shape depends on the provider, see `upload`
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageRequest {
    pub architecture: Architecture,
    pub image_type: ImageType,
    pub upload_request: UploadRequest,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComposeRequest {
    pub distribution: String,
    #[serde(default)]
    pub image_name: Option<String>,
    pub image_requests: Vec<ImageRequest>,
}

/// One image-build job. The UI never mutates these; it only projects them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Compose {
    pub id: ComposeId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub image_name: Option<String>,
    pub request: ComposeRequest,
    #[serde(default)]
    pub blueprint_id: Option<BlueprintId>,
    #[serde(default)]
    pub blueprint_version: Option<i32>,
}

impl Compose {
    /// Composes carry exactly one image request in current usage.
    pub fn image_request(&self) -> Option<&ImageRequest> {
        self.request.image_requests.first()
    }

    pub fn display_name(&self) -> String {
        self.image_name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

// ---- Status (polled) ----

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Success,
    Failure,
    Pending,
    Building,
    Uploading,
    Registering,
    // older servers still report "running"
    Running,
    #[serde(other)]
    Unknown,
}

impl BuildStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Failure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Success => "success",
            BuildStatus::Failure => "failure",
            BuildStatus::Pending => "pending",
            BuildStatus::Building => "building",
            BuildStatus::Uploading => "uploading",
            BuildStatus::Registering => "registering",
            BuildStatus::Running => "running",
            BuildStatus::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadStatus {
    pub status: String,
    #[serde(rename = "type")]
    pub kind: UploadType,
    #[serde(default)]
    pub options: JsonValue,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComposeFailure {
    pub id: i64,
    pub reason: String,
    #[serde(default)]
    pub details: Option<JsonValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ImageStatus {
    pub status: BuildStatus,
    #[serde(default)]
    pub upload_status: Option<UploadStatus>,
    #[serde(default)]
    pub error: Option<ComposeFailure>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComposeStatus {
    pub image_status: ImageStatus,
}

impl ComposeStatus {
    pub fn status(&self) -> BuildStatus {
        self.image_status.status
    }

    pub fn is_success(&self) -> bool {
        self.image_status.status == BuildStatus::Success
    }

    /// Upload status options, treating an explicit `null` like an absent payload.
    pub fn upload_options(&self) -> Option<&JsonValue> {
        self.image_status
            .upload_status
            .as_ref()
            .map(|u| &u.options)
            .filter(|o| !o.is_null())
    }
}

// ---- Blueprints ----

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlueprintItem {
    pub id: BlueprintId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: i32,
    #[serde(default)]
    pub last_modified_at: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListMeta {
    pub count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlueprintsResponse {
    #[serde(default)]
    pub data: Vec<BlueprintItem>,
    #[serde(default)]
    pub meta: ListMeta,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComposesResponse {
    #[serde(default)]
    pub data: Vec<Compose>,
    #[serde(default)]
    pub meta: ListMeta,
}

/// Version of the blueprint `id` within a search result, if listed.
pub fn blueprint_version(items: &[BlueprintItem], id: BlueprintId) -> Option<i32> {
    items.iter().find(|b| b.id == id).map(|b| b.version)
}
