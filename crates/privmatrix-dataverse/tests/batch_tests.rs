//! `$batch` submission tests: part layout, headers, and failure surfacing.

mod common;

use common::*;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use privmatrix_engine::{
    AccessControlService, BatchOperation, GrantedPrivilege, PrivilegeDepth, ServiceError,
};

fn sample_operations() -> Vec<BatchOperation> {
    vec![
        BatchOperation::RemovePrivilege {
            role_id: Uuid::from_u128(9),
            privilege_id: Uuid::from_u128(1),
        },
        BatchOperation::AddPrivileges {
            role_id: Uuid::from_u128(9),
            privileges: vec![
                GrantedPrivilege {
                    privilege_id: Uuid::from_u128(2),
                    depth: PrivilegeDepth::Basic,
                },
                GrantedPrivilege {
                    privilege_id: Uuid::from_u128(3),
                    depth: PrivilegeDepth::Global,
                },
            ],
        },
        BatchOperation::RemovePrivilege {
            role_id: Uuid::from_u128(10),
            privilege_id: Uuid::from_u128(4),
        },
    ]
}

#[tokio::test]
async fn one_call_carries_one_part_per_operation() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{API_PATH}/$batch")))
        .and(header("Prefer", "odata.continue-on-error"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let operations = sample_operations();
    let outcome = service.execute_batch(&operations, true).await.unwrap();
    assert_eq!(outcome.operations_submitted, 3);

    let requests = server.received_requests().await.unwrap();
    let batch_request = requests
        .iter()
        .find(|request| request.url.path().ends_with("/$batch"))
        .expect("a $batch request was sent");

    let body = String::from_utf8(batch_request.body.clone()).unwrap();
    assert_eq!(body.matches("Content-Type: application/http").count(), 3);
    assert_eq!(body.matches("POST ").count(), 3);
    assert!(body.contains("Microsoft.Dynamics.CRM.AddPrivilegesRole"));
    assert!(body.contains("Microsoft.Dynamics.CRM.RemovePrivilegeRole"));
    assert!(body.contains(r#""Depth":"Basic""#));

    // The payload boundary matches the declared content type.
    let content_type = batch_request
        .headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .expect("content type present");
    let boundary = content_type
        .split("boundary=")
        .nth(1)
        .expect("boundary declared");
    assert!(body.contains(&format!("--{boundary}\r\n")));
    assert!(body.ends_with(&format!("--{boundary}--\r\n")));
}

#[tokio::test]
async fn disabling_continue_on_error_drops_the_preference_header() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{API_PATH}/$batch")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    service
        .execute_batch(&sample_operations(), false)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let batch_request = requests
        .iter()
        .find(|request| request.url.path().ends_with("/$batch"))
        .unwrap();
    assert!(!batch_request.headers.contains_key("prefer"));
}

#[tokio::test]
async fn an_empty_operation_list_issues_no_request() {
    let server = MockServer::start().await;

    let service = service_for(&server);
    let outcome = service.execute_batch(&[], true).await.unwrap();
    assert_eq!(outcome.operations_submitted, 0);

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn a_failed_batch_call_surfaces_the_service_error() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{API_PATH}/$batch")))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": "0x80048d19", "message": "malformed batch payload" }
        })))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let err = service
        .execute_batch(&sample_operations(), true)
        .await
        .unwrap_err();
    match err {
        ServiceError::Api { code, .. } => assert_eq!(code, "0x80048d19"),
        other => panic!("expected Api error, got {other:?}"),
    }
}
