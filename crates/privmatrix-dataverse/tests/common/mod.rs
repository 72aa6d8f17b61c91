//! Common test utilities for privmatrix-dataverse integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use privmatrix_dataverse::{DataverseConfig, DataverseCredentials, DataverseService};

/// Tenant used by every test configuration.
pub const TENANT: &str = "test-tenant";
/// Web API path prefix under the mock server.
pub const API_PATH: &str = "/api/data/v9.2";

/// Builds a service pointed at the mock server for both auth and data.
pub fn service_for(server: &MockServer) -> DataverseService {
    let config = DataverseConfig::builder()
        .resource_url(server.uri())
        .authority(server.uri())
        .tenant_id(TENANT)
        .max_retries(2)
        .build()
        .unwrap();
    let credentials = DataverseCredentials {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string().into(),
    };
    DataverseService::new(config, credentials).unwrap()
}

/// A deterministic record id.
pub fn uid(seed: u128) -> String {
    Uuid::from_u128(seed).to_string()
}

/// Mock `OAuth2` token response.
pub fn token_response(access_token: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in
    })
}

/// Mounts the `OAuth2` token endpoint.
pub async fn mock_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_response("mock-access-token", 3600)),
        )
        .mount(server)
        .await;
}

/// Wraps items in an `OData` page.
pub fn odata_page(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut response = json!({ "value": items });
    if let Some(link) = next_link {
        response["@odata.nextLink"] = json!(link);
    }
    response
}

/// A business-unit record.
pub fn business_unit(seed: u128, name: &str) -> Value {
    json!({ "businessunitid": uid(seed), "name": name })
}

/// A role record.
pub fn role(seed: u128, name: &str) -> Value {
    json!({ "roleid": uid(seed), "name": name })
}

/// An entity definition with an optional localized label.
pub fn entity_definition(logical_name: &str, label: Option<&str>) -> Value {
    match label {
        Some(label) => json!({
            "LogicalName": logical_name,
            "DisplayName": { "UserLocalizedLabel": { "Label": label } }
        }),
        None => json!({ "LogicalName": logical_name, "DisplayName": null }),
    }
}

/// An entity definition projected to its privilege list.
pub fn privileges_envelope(logical_name: &str, entries: &[(&str, u128)]) -> Value {
    let privileges: Vec<Value> = entries
        .iter()
        .map(|(privilege_type, seed)| {
            json!({ "PrivilegeId": uid(*seed), "PrivilegeType": privilege_type })
        })
        .collect();
    json!({ "LogicalName": logical_name, "Privileges": privileges })
}
