use compose::{
    Architecture, AwsS3UploadStatus, AwsUploadRequestOptions, AzureUploadRequestOptions, Compose,
    ComposeId, ComposeStatus, GcpUploadRequestOptions, ImageRequest, ImageType,
    OciUploadStatus, ShapeError, UploadStatus, UploadVariant,
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::error::LifecycleError;
use crate::expiry::Expiry;
use crate::ports::{ModuleState, RowContext, StatusSnapshot};
use crate::provider::{ActionFamily, Provider};

pub const OCI_LAUNCH_DOCS_URL: &str = concat!(
    "https://docs.redhat.com/en/documentation/red_hat_insights/1-latest/html/",
    "creating_customized_images_by_using_insights_image_builder/index"
);

pub const OCI_IMPORT_STEPS: [&str; 3] = [
    "Go to \"Compute\" in Oracle Cloud and choose \"Custom Images\".",
    "Click on \"Import image\", choose \"Import from an object storage URL\".",
    concat!(
        "Choose \"Import from an object storage URL\" and paste the URL in the ",
        "\"Object Storage URL\" field. The image type has to be set to QCOW2 and the launch ",
        "mode should be paravirtualized."
    ),
];

/// Why a launch action is shown disabled.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LaunchBlocker {
    NotBuilt,
    ProvisioningUnavailable,
    WizardPending,
    WizardFailed { error: LifecycleError },
    PermissionsLoading,
    NoAccess,
}

/// What the provisioning wizard is opened with.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LaunchTarget {
    pub name: String,
    pub id: ComposeId,
    pub architecture: Architecture,
    pub provider: Provider,
    pub source_ids: Option<Vec<String>>,
    pub account_ids: Option<Vec<String>>,
    pub upload_options: JsonValue,
    pub upload_status: Option<UploadStatus>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct OutdatedTooltip {
    pub header: &'static str,
    pub body: &'static str,
}

impl Default for OutdatedTooltip {
    fn default() -> Self {
        Self {
            header: "A newer version is available",
            body: "This image can be launched, but it is not the latest version.",
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ObjectStorageLink {
    pub url: String,
    pub enabled: bool,
    pub steps: [&'static str; 3],
    pub docs_url: &'static str,
}

/// The single action a compose row offers.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RowAction {
    Loading,
    Disabled { blocker: LaunchBlocker },
    LaunchAvailable { target: LaunchTarget },
    LaunchTooltipOutdated { target: LaunchTarget, tooltip: OutdatedTooltip },
    LinkAvailable { link: ObjectStorageLink },
    LinkPending,
    LinkError { error: LifecycleError },
    DownloadDisabled { label: String, extension: &'static str },
    DownloadEnabled { label: String, extension: &'static str, url: String },
    RecreateOffered { path: String },
    Error { error: LifecycleError },
}

impl RowAction {
    pub fn label(&self) -> String {
        match self {
            RowAction::Loading | RowAction::Error { .. } => String::new(),
            RowAction::Disabled { .. }
            | RowAction::LaunchAvailable { .. }
            | RowAction::LaunchTooltipOutdated { .. } => "Launch".to_string(),
            RowAction::LinkAvailable { .. }
            | RowAction::LinkPending
            | RowAction::LinkError { .. } => "Image link".to_string(),
            RowAction::DownloadDisabled { label, .. }
            | RowAction::DownloadEnabled { label, .. } => label.clone(),
            RowAction::RecreateOffered { .. } => "Recreate image".to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            RowAction::LaunchAvailable { .. }
            | RowAction::LaunchTooltipOutdated { .. }
            | RowAction::DownloadEnabled { .. }
            | RowAction::RecreateOffered { .. } => true,
            RowAction::LinkAvailable { link } => link.enabled,
            RowAction::Loading
            | RowAction::Disabled { .. }
            | RowAction::LinkPending
            | RowAction::LinkError { .. }
            | RowAction::DownloadDisabled { .. }
            | RowAction::Error { .. } => false,
        }
    }
}

pub fn file_extension(image_type: ImageType) -> &'static str {
    match image_type {
        ImageType::GuestImage => ".qcow2",
        ImageType::ImageInstaller => ".iso",
        ImageType::Vsphere => ".vmdk",
        ImageType::VsphereOva => ".ova",
        ImageType::Wsl => ".tar.gz",
        ImageType::Aws
        | ImageType::Ami
        | ImageType::Azure
        | ImageType::Gcp
        | ImageType::EdgeCommit
        | ImageType::EdgeInstaller
        | ImageType::RhelEdgeCommit
        | ImageType::RhelEdgeInstaller
        | ImageType::Vhd
        | ImageType::Oci
        | ImageType::Unrecognized => "",
    }
}

pub fn download_label(extension: &str) -> String {
    if extension.is_empty() {
        "Download".to_string()
    } else {
        format!("Download ({extension})")
    }
}

/// Decide the row's action. Failures become `RowAction::Error`, never a panic.
pub fn resolve_action(
    compose: &Compose,
    snapshot: &StatusSnapshot,
    expiry: Option<Expiry>,
    ctx: &RowContext,
) -> RowAction {
    match try_resolve(compose, snapshot, expiry, ctx) {
        Ok(action) => action,
        Err(error) => {
            warn!(compose_id = %compose.id, %error, "compose action unavailable");
            RowAction::Error { error }
        }
    }
}

fn try_resolve(
    compose: &Compose,
    snapshot: &StatusSnapshot,
    expiry: Option<Expiry>,
    ctx: &RowContext,
) -> Result<RowAction, LifecycleError> {
    let request = compose
        .image_request()
        .ok_or(LifecycleError::MissingImageRequest { compose_id: compose.id })?;
    let is_expired = expiry.is_some_and(|e| e.is_expired);

    match ActionFamily::of(request.image_type) {
        ActionFamily::Launch(provider) => resolve_launch(compose, request, provider, snapshot, ctx),
        ActionFamily::ObjectStorageLink => resolve_link(compose, snapshot, is_expired),
        ActionFamily::Download => resolve_download(request, snapshot, is_expired),
        ActionFamily::Unsupported => {
            Err(LifecycleError::UnsupportedImageType { image_type: request.image_type })
        }
    }
}

// ---- Launch (aws / azure / gcp) ----

struct ShareTargets {
    account_ids: Option<Vec<String>>,
    source_ids: Option<Vec<String>>,
}

impl ShareTargets {
    fn for_provider(provider: Provider, options: &JsonValue) -> Result<Self, ShapeError> {
        Ok(match provider {
            Provider::Aws => {
                let o = AwsUploadRequestOptions::narrow(options)?;
                Self {
                    account_ids: Some(o.share_with_accounts),
                    source_ids: Some(o.share_with_sources),
                }
            }
            Provider::Gcp => {
                let o = GcpUploadRequestOptions::narrow(options)?;
                Self { account_ids: Some(o.share_with_accounts), source_ids: None }
            }
            Provider::Azure => {
                AzureUploadRequestOptions::narrow(options)?;
                Self { account_ids: None, source_ids: None }
            }
        })
    }
}

fn disabled(blocker: LaunchBlocker) -> Result<RowAction, LifecycleError> {
    Ok(RowAction::Disabled { blocker })
}

fn resolve_launch(
    compose: &Compose,
    request: &ImageRequest,
    provider: Provider,
    snapshot: &StatusSnapshot,
    ctx: &RowContext,
) -> Result<RowAction, LifecycleError> {
    let Some(status) = snapshot.data.as_ref() else {
        return Ok(RowAction::Loading);
    };
    if !status.is_success() {
        return disabled(LaunchBlocker::NotBuilt);
    }

    // validate before anything reads the options
    let options = &request.upload_request.options;
    let shares = ShareTargets::for_provider(provider, options)?;

    if !ctx.provisioning_enabled {
        return disabled(LaunchBlocker::ProvisioningUnavailable);
    }
    match &ctx.wizard {
        ModuleState::Loaded => {}
        ModuleState::Pending => return disabled(LaunchBlocker::WizardPending),
        ModuleState::Failed { reason } => {
            let error = LifecycleError::ModuleLoadFailure { reason: reason.clone() };
            return disabled(LaunchBlocker::WizardFailed { error });
        }
    }
    match ctx.permissions.allows(provider) {
        Some(true) => {}
        Some(false) => return disabled(LaunchBlocker::NoAccess),
        None => return disabled(LaunchBlocker::PermissionsLoading),
    }

    let target = LaunchTarget {
        name: compose.display_name(),
        id: compose.id,
        architecture: request.architecture.clone(),
        provider,
        source_ids: shares.source_ids,
        account_ids: shares.account_ids,
        upload_options: options.clone(),
        upload_status: status.image_status.upload_status.clone(),
    };

    // Only a known, different version counts as outdated.
    match ctx.selected_blueprint_version {
        Some(latest) if compose.blueprint_version != Some(latest) => {
            Ok(RowAction::LaunchTooltipOutdated { target, tooltip: OutdatedTooltip::default() })
        }
        _ => Ok(RowAction::LaunchAvailable { target }),
    }
}

// ---- Link (oci) / Download (file artifacts) ----

/// Status options may be absent until the build succeeds; after that they must be present.
fn upload_status_options<T: UploadVariant>(
    status: &ComposeStatus,
) -> Result<Option<T>, ShapeError> {
    match status.upload_options() {
        Some(options) => T::narrow(options).map(Some),
        None if status.is_success() => Err(ShapeError::missing(T::EXPECTED)),
        None => Ok(None),
    }
}

fn resolve_link(
    compose: &Compose,
    snapshot: &StatusSnapshot,
    is_expired: bool,
) -> Result<RowAction, LifecycleError> {
    if is_expired {
        return Ok(RowAction::RecreateOffered { path: format!("imagewizard/{}", compose.id) });
    }
    // driven by the link fetch, not by the build status
    if snapshot.is_error {
        return Ok(RowAction::LinkError { error: LifecycleError::LinkFetchError });
    }
    let Some(status) = snapshot.data.as_ref() else {
        return Ok(RowAction::Loading);
    };
    let options = upload_status_options::<OciUploadStatus>(status)?;
    if snapshot.is_fetching {
        return Ok(RowAction::LinkPending);
    }

    Ok(RowAction::LinkAvailable {
        link: ObjectStorageLink {
            url: options.map(|o| o.url).unwrap_or_default(),
            enabled: status.is_success(),
            steps: OCI_IMPORT_STEPS,
            docs_url: OCI_LAUNCH_DOCS_URL,
        },
    })
}

fn resolve_download(
    request: &ImageRequest,
    snapshot: &StatusSnapshot,
    is_expired: bool,
) -> Result<RowAction, LifecycleError> {
    let Some(status) = snapshot.data.as_ref() else {
        return Ok(RowAction::Loading);
    };
    let extension = file_extension(request.image_type);
    let label = download_label(extension);

    let options = upload_status_options::<AwsS3UploadStatus>(status)?;
    match options {
        Some(o) if status.is_success() && !is_expired => {
            Ok(RowAction::DownloadEnabled { label, extension, url: o.url })
        }
        _ => Ok(RowAction::DownloadDisabled { label, extension }),
    }
}
