use super::*;
use crate::indexer::{DocumentFormat, FileStatus};

#[test]
fn test_chat_request_defaults_to_rag() {
    let req: ChatRequest = serde_json::from_str(r#"{"message":"hello"}"#).unwrap();
    assert_eq!(req.message, "hello");
    assert!(req.use_rag);
}

#[test]
fn test_chat_request_without_rag() {
    let req: ChatRequest =
        serde_json::from_str(r#"{"message":"hello","use_rag":false}"#).unwrap();
    assert!(!req.use_rag);
}

#[test]
fn test_file_upload_filename_optional() {
    let upload: FileUpload = serde_json::from_str(r#"{"path":"/tmp/a.pdf"}"#).unwrap();
    assert_eq!(upload.path, "/tmp/a.pdf");
    assert!(upload.filename.is_none());
}

#[test]
fn test_upload_request_deserialization() {
    let req: UploadRequest = serde_json::from_str(
        r#"{"files":[{"path":"/tmp/x","filename":"report.docx"},{"path":"/tmp/notes.txt"}]}"#,
    )
    .unwrap();
    assert_eq!(req.files.len(), 2);
    assert_eq!(req.files[0].filename.as_deref(), Some("report.docx"));
}

#[test]
fn test_upload_response_serialization() {
    let response = UploadResponse {
        files: vec![
            FileOutcome {
                filename: "a.txt".to_string(),
                format: DocumentFormat::Text,
                status: FileStatus::Loaded {
                    documents: 1,
                    characters: 42,
                },
            },
            FileOutcome {
                filename: "b.docx".to_string(),
                format: DocumentFormat::Docx,
                status: FileStatus::Failed {
                    reason: "bad zip".to_string(),
                },
            },
        ],
        new_chunks: 1,
        total_chunks: 3,
        filenames: vec!["a.txt".to_string()],
        duration_ms: 12,
    };

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["files"][0]["status"], "loaded");
    assert_eq!(json["files"][0]["characters"], 42);
    assert_eq!(json["files"][1]["status"], "failed");
    assert_eq!(json["files"][1]["format"], "docx");
    assert_eq!(json["total_chunks"], 3);
}

#[test]
fn test_clear_response() {
    let response = ClearResponse {
        success: true,
        message: "Cleared".to_string(),
    };
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"success\":true"));
}

#[test]
fn test_empty_requests_deserialize() {
    let _: ClearRequest = serde_json::from_str("{}").unwrap();
    let _: StatusRequest = serde_json::from_str("{}").unwrap();
}

#[test]
fn test_schemas_generate() {
    let schema = schemars::schema_for!(UploadRequest);
    let json = serde_json::to_string(&schema).unwrap();
    assert!(json.contains("files"));

    let schema = schemars::schema_for!(ChatRequest);
    let json = serde_json::to_string(&schema).unwrap();
    assert!(json.contains("use_rag"));
}

#[test]
fn test_upload_request_validate_empty() {
    let req = UploadRequest { files: vec![] };
    assert!(req.validate().is_err());
}

#[test]
fn test_upload_request_validate_blank_filename() {
    let req = UploadRequest {
        files: vec![FileUpload {
            path: "/tmp/a.txt".to_string(),
            filename: Some("  ".to_string()),
        }],
    };
    let err = req.validate().unwrap_err();
    assert!(err.contains("files[0].filename"));
}

#[test]
fn test_upload_request_validate_ok() {
    let req = UploadRequest {
        files: vec![FileUpload {
            path: "/tmp/a.txt".to_string(),
            filename: None,
        }],
    };
    assert!(req.validate().is_ok());
}

#[test]
fn test_chat_request_validate_blank_message() {
    let req = ChatRequest {
        message: " \n".to_string(),
        use_rag: true,
    };
    assert!(req.validate().is_err());
}
