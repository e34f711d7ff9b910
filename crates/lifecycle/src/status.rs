use compose::BuildStatus;
use serde::Serialize;
use tracing::debug;

use crate::error::LifecycleError;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusIcon {
    CheckCircle,
    ExclamationCircle,
    ExclamationTriangle,
    InProgress,
    Pending,
    Off,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Error,
    Pending,
    Expiring,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct StatusLine {
    pub icon: StatusIcon,
    pub tone: Option<Tone>,
    pub text: String,
}

impl StatusLine {
    fn new(icon: StatusIcon, tone: Option<Tone>, text: impl Into<String>) -> Self {
        Self { icon, tone, text: text.into() }
    }
}

/// Displayed lifecycle of a compose. `Expiring` and `Expired` are never
/// reported by the server; they are derived from the expiry window.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleState {
    Success,
    Failure,
    Pending,
    Building,
    Running,
    Uploading,
    Registering,
    Expiring { remaining_hours: u32 },
    Expired,
}

impl LifecycleState {
    /// Ordered status lines for the badge. One line per state today.
    pub fn lines(&self) -> Vec<StatusLine> {
        let line = match self {
            LifecycleState::Success => {
                StatusLine::new(StatusIcon::CheckCircle, Some(Tone::Success), "Ready")
            }
            LifecycleState::Failure => StatusLine::new(
                StatusIcon::ExclamationCircle,
                Some(Tone::Error),
                "Image build failed",
            ),
            LifecycleState::Pending => {
                StatusLine::new(StatusIcon::Pending, None, "Image build is pending")
            }
            LifecycleState::Building | LifecycleState::Running => StatusLine::new(
                StatusIcon::InProgress,
                Some(Tone::Pending),
                "Image build in progress",
            ),
            LifecycleState::Uploading => StatusLine::new(
                StatusIcon::InProgress,
                Some(Tone::Pending),
                "Image upload in progress",
            ),
            LifecycleState::Registering => StatusLine::new(
                StatusIcon::InProgress,
                Some(Tone::Pending),
                "Cloud registration in progress",
            ),
            LifecycleState::Expiring { remaining_hours } => StatusLine::new(
                StatusIcon::ExclamationTriangle,
                Some(Tone::Expiring),
                format!("Expires in {} {}", remaining_hours, hours_unit(*remaining_hours)),
            ),
            LifecycleState::Expired => StatusLine::new(StatusIcon::Off, None, "Expired"),
        };
        vec![line]
    }

    /// Parse a status label. `expiring` needs the remaining hours.
    pub fn parse(status: &str, remaining_hours: Option<u32>) -> Result<Self, LifecycleError> {
        let state = match status {
            "success" => LifecycleState::Success,
            "failure" => LifecycleState::Failure,
            "pending" => LifecycleState::Pending,
            "building" => LifecycleState::Building,
            "running" => LifecycleState::Running,
            "uploading" => LifecycleState::Uploading,
            "registering" => LifecycleState::Registering,
            "expired" => LifecycleState::Expired,
            "expiring" => match remaining_hours {
                Some(remaining_hours) => LifecycleState::Expiring { remaining_hours },
                None => return Err(LifecycleError::UnknownStatus { status: status.to_string() }),
            },
            other => return Err(LifecycleError::UnknownStatus { status: other.to_string() }),
        };
        Ok(state)
    }
}

impl TryFrom<BuildStatus> for LifecycleState {
    type Error = LifecycleError;

    fn try_from(status: BuildStatus) -> Result<Self, Self::Error> {
        match status {
            BuildStatus::Success => Ok(LifecycleState::Success),
            BuildStatus::Failure => Ok(LifecycleState::Failure),
            BuildStatus::Pending => Ok(LifecycleState::Pending),
            BuildStatus::Building => Ok(LifecycleState::Building),
            BuildStatus::Running => Ok(LifecycleState::Running),
            BuildStatus::Uploading => Ok(LifecycleState::Uploading),
            BuildStatus::Registering => Ok(LifecycleState::Registering),
            BuildStatus::Unknown => {
                Err(LifecycleError::UnknownStatus { status: status.as_str().to_string() })
            }
        }
    }
}

fn hours_unit(n: u32) -> &'static str {
    if n == 1 {
        "hour"
    } else {
        "hours"
    }
}

/// Status lines for a raw status label. Unknown labels render nothing.
pub fn render(status: &str, remaining_hours: Option<u32>) -> Vec<StatusLine> {
    match LifecycleState::parse(status, remaining_hours) {
        Ok(state) => state.lines(),
        Err(error) => {
            debug!(%error, "status not rendered");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_and_building_render_the_same() {
        assert_eq!(render("running", None), render("building", None));
    }

    #[test]
    fn expiring_without_hours_renders_nothing() {
        assert!(render("expiring", None).is_empty());
    }
}
