use compose::ImageType;
use serde::{Deserialize, Serialize};

/// Cloud providers whose images can be launched straight from the table.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "azure" => Ok(Provider::Azure),
            "gcp" => Ok(Provider::Gcp),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// `None` for everything that is delivered as a file or link.
/// Unrecognized image types never alias to a real provider.
pub fn classify_provider(image_type: ImageType) -> Option<Provider> {
    match image_type {
        ImageType::Aws | ImageType::Ami => Some(Provider::Aws),
        ImageType::Azure => Some(Provider::Azure),
        ImageType::Gcp => Some(Provider::Gcp),
        ImageType::GuestImage
        | ImageType::ImageInstaller
        | ImageType::Vsphere
        | ImageType::VsphereOva
        | ImageType::Wsl
        | ImageType::EdgeCommit
        | ImageType::EdgeInstaller
        | ImageType::RhelEdgeCommit
        | ImageType::RhelEdgeInstaller
        | ImageType::Vhd
        | ImageType::Oci
        | ImageType::Unrecognized => None,
    }
}

/// Which kind of action a row offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionFamily {
    Launch(Provider),
    /// OCI: copy an object-storage link.
    ObjectStorageLink,
    Download,
    Unsupported,
}

impl ActionFamily {
    pub fn of(image_type: ImageType) -> Self {
        // OCI has no provider but its own path; check before the download fallthrough.
        if image_type == ImageType::Oci {
            return ActionFamily::ObjectStorageLink;
        }
        if image_type == ImageType::Unrecognized {
            return ActionFamily::Unsupported;
        }
        match classify_provider(image_type) {
            Some(provider) => ActionFamily::Launch(provider),
            None => ActionFamily::Download,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ami_is_aws() {
        assert_eq!(classify_provider(ImageType::Ami), classify_provider(ImageType::Aws));
    }

    #[test]
    fn oci_gets_link_family() {
        assert_eq!(classify_provider(ImageType::Oci), None);
        assert_eq!(ActionFamily::of(ImageType::Oci), ActionFamily::ObjectStorageLink);
        assert_eq!(ActionFamily::of(ImageType::Wsl), ActionFamily::Download);
        assert_eq!(ActionFamily::of(ImageType::Unrecognized), ActionFamily::Unsupported);
    }
}
