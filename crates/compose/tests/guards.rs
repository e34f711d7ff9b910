use compose::*;
use serde_json::json;

fn compose_json(image_type: &str, options: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "5f9b7a0e-3a43-4a2e-9f59-3c6d2c0b6d11",
        "created_at": "2024-03-01T10:00:00Z",
        "image_name": "web-base",
        "blueprint_id": "0c2b1f6e-8c69-4f2b-a3c6-6f1b2d3e4a5b",
        "blueprint_version": 3,
        "request": {
            "distribution": "rhel-9",
            "image_requests": [{
                "architecture": "x86_64",
                "image_type": image_type,
                "upload_request": { "type": "aws", "options": options }
            }]
        }
    })
}

#[test]
fn test_compose_deserializes_from_api_payload() {
    let raw = compose_json("guest-image", json!({}));
    let compose: Compose = serde_json::from_value(raw).unwrap();

    let req = compose.image_request().unwrap();
    assert_eq!(req.image_type, ImageType::GuestImage);
    assert_eq!(req.architecture, Architecture::X86_64);
    assert_eq!(compose.blueprint_version, Some(3));
    assert_eq!(compose.display_name(), "web-base");
}

#[test]
fn test_unknown_image_type_does_not_fail_listing() {
    let raw = compose_json("raspberry-pi", json!({}));
    let compose: Compose = serde_json::from_value(raw).unwrap();
    assert_eq!(compose.image_request().unwrap().image_type, ImageType::Unrecognized);
}

#[test]
fn test_status_payload_with_running_and_unknown() {
    let running: ComposeStatus =
        serde_json::from_value(json!({"image_status": {"status": "running"}})).unwrap();
    assert_eq!(running.status(), BuildStatus::Running);
    assert!(!running.status().is_terminal());

    let odd: ComposeStatus =
        serde_json::from_value(json!({"image_status": {"status": "paused"}})).unwrap();
    assert_eq!(odd.status(), BuildStatus::Unknown);
}

#[test]
fn test_upload_options_null_is_absent() {
    let status: ComposeStatus = serde_json::from_value(json!({
        "image_status": {
            "status": "building",
            "upload_status": {"status": "pending", "type": "aws.s3", "options": null}
        }
    }))
    .unwrap();
    assert!(status.upload_options().is_none());
}

#[test]
fn test_aws_guard_requires_both_arrays() {
    let full = json!({"share_with_accounts": ["123456789012"], "share_with_sources": ["12"]});
    let partial = json!({"share_with_accounts": ["123456789012"]});

    assert!(is_aws_upload_request_options(&full));
    assert!(!is_aws_upload_request_options(&partial));

    let err = AwsUploadRequestOptions::narrow(&partial).unwrap_err();
    assert_eq!(err.expected, "AwsUploadRequestOptions");
    assert_eq!(err.found, "object with fields [share_with_accounts]");
}

#[test]
fn test_aws_and_gcp_guards_are_exclusive() {
    let aws = json!({"share_with_accounts": ["a"], "share_with_sources": ["s"]});
    let gcp = json!({"share_with_accounts": ["user:alice@example.com"]});

    assert!(is_aws_upload_request_options(&aws) && !is_gcp_upload_request_options(&aws));
    assert!(is_gcp_upload_request_options(&gcp) && !is_aws_upload_request_options(&gcp));
}

#[test]
fn test_url_guards() {
    let link = json!({"url": "https://objectstorage.example.com/p/abc/image.qcow2"});
    assert!(is_oci_upload_status(&link));
    assert!(is_awss3_upload_status(&link));
    assert_eq!(
        AwsS3UploadStatus::narrow(&link).unwrap().url,
        "https://objectstorage.example.com/p/abc/image.qcow2"
    );

    let not_a_link = json!({"url": 42});
    let err = OciUploadStatus::narrow(&not_a_link).unwrap_err();
    assert_eq!(
        err.to_string(),
        "upload options must be of type OciUploadStatus, not object with fields [url]"
    );
}

#[test]
fn test_azure_guard() {
    let ok = json!({"resource_group": "images", "source_id": "7"});
    assert_eq!(
        AzureUploadRequestOptions::narrow(&ok).unwrap().source_id.as_deref(),
        Some("7")
    );
    assert!(!is_azure_upload_request_options(&json!({"share_with_accounts": []})));
}

#[test]
fn test_blueprint_version_lookup() {
    let resp: BlueprintsResponse = serde_json::from_value(json!({
        "data": [
            {"id": "0c2b1f6e-8c69-4f2b-a3c6-6f1b2d3e4a5b", "name": "web", "version": 4},
            {"id": "9d7a54e4-1b0f-4c53-9a53-54c7f2f0a111", "name": "db", "version": 1}
        ],
        "meta": {"count": 2}
    }))
    .unwrap();

    let id = "0c2b1f6e-8c69-4f2b-a3c6-6f1b2d3e4a5b".parse().unwrap();
    assert_eq!(blueprint_version(&resp.data, id), Some(4));
    assert_eq!(blueprint_version(&resp.data, uuid::Uuid::nil()), None);
}
