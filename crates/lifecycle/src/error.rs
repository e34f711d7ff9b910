use compose::{ComposeId, ImageType, ShapeError};
use serde::Serialize;
use thiserror::Error;

const LINK_FETCH_MESSAGE: &str =
    "The link to launch the image could not be loaded. Please refresh the page and try again.";

/// Everything here is contained to a single row.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleError {
    #[error("unknown compose status: {status}")]
    UnknownStatus { status: String },

    #[error("upload options must be of type {expected}, not {found}")]
    OptionsShapeMismatch { expected: &'static str, found: String },

    #[error("provisioning wizard failed to load: {reason}")]
    ModuleLoadFailure { reason: String },

    #[error("{}", LINK_FETCH_MESSAGE)]
    LinkFetchError,

    #[error("image type {image_type} has no supported action")]
    UnsupportedImageType { image_type: ImageType },

    #[error("compose {compose_id} has no image request")]
    MissingImageRequest { compose_id: ComposeId },
}

impl From<ShapeError> for LifecycleError {
    fn from(e: ShapeError) -> Self {
        LifecycleError::OptionsShapeMismatch { expected: e.expected, found: e.found }
    }
}
