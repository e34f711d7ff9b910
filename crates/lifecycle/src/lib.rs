//! Lifecycle projection for image-builder composes.
//!
//! Turns a compose, its latest polled status and a handful of externally
//! supplied facts into what one images-table row shows: a status badge and
//! exactly one action.

mod action;
mod error;
mod expiry;
mod ports;
mod provider;
mod row;
mod status;

pub use action::{
    download_label, file_extension, resolve_action, LaunchBlocker, LaunchTarget, ObjectStorageLink,
    OutdatedTooltip, RowAction, OCI_IMPORT_STEPS, OCI_LAUNCH_DOCS_URL,
};
pub use error::LifecycleError;
pub use expiry::{compute_expiry, Expiry, ExpiryPolicy, ExpiryWindow};
pub use ports::{
    ModuleState, PermissionProvider, PermissionSnapshot, RowContext, StatusSnapshot, WizardProvider,
};
pub use provider::{classify_provider, ActionFamily, Provider};
pub use row::{display_state, project_row, RowView};
pub use status::{render, LifecycleState, StatusIcon, StatusLine, Tone};
