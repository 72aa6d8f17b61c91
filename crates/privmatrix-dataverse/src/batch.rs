//! `$batch` payload construction for privilege add/remove operations.
//!
//! Every operation travels as its own part, outside any change set, so the
//! `odata.continue-on-error` preference applies per item.

use serde::Serialize;
use uuid::Uuid;

use privmatrix_engine::BatchOperation;

use crate::error::DataverseResult;

/// Bound action granting privileges to a role.
const ADD_ACTION: &str = "Microsoft.Dynamics.CRM.AddPrivilegesRole";
/// Bound action revoking one privilege from a role.
const REMOVE_ACTION: &str = "Microsoft.Dynamics.CRM.RemovePrivilegeRole";

/// Body of the `AddPrivilegesRole` bound action.
#[derive(Debug, Serialize)]
struct AddPrivilegesBody {
    #[serde(rename = "Privileges")]
    privileges: Vec<RolePrivilegeBody>,
}

#[derive(Debug, Serialize)]
struct RolePrivilegeBody {
    #[serde(rename = "PrivilegeId")]
    privilege_id: Uuid,
    #[serde(rename = "Depth")]
    depth: &'static str,
}

/// Body of the `RemovePrivilegeRole` bound action.
#[derive(Debug, Serialize)]
struct RemovePrivilegeBody {
    #[serde(rename = "PrivilegeId")]
    privilege_id: Uuid,
}

/// Fresh boundary for one `$batch` call.
pub(crate) fn batch_boundary() -> String {
    format!("batch_{}", Uuid::new_v4().simple())
}

/// Renders the multipart `$batch` payload for one bounded operation chunk.
pub(crate) fn render_batch(
    api_base: &str,
    boundary: &str,
    operations: &[BatchOperation],
) -> DataverseResult<String> {
    let mut body = String::new();

    for operation in operations {
        let (url, json) = match operation {
            BatchOperation::AddPrivileges {
                role_id,
                privileges,
            } => {
                let payload = AddPrivilegesBody {
                    privileges: privileges
                        .iter()
                        .map(|grant| RolePrivilegeBody {
                            privilege_id: grant.privilege_id,
                            depth: grant.depth.as_str(),
                        })
                        .collect(),
                };
                (
                    format!("{api_base}/roles({role_id})/{ADD_ACTION}"),
                    serde_json::to_string(&payload)?,
                )
            }
            BatchOperation::RemovePrivilege {
                role_id,
                privilege_id,
            } => (
                format!("{api_base}/roles({role_id})/{REMOVE_ACTION}"),
                serde_json::to_string(&RemovePrivilegeBody {
                    privilege_id: *privilege_id,
                })?,
            ),
        };

        body.push_str(&format!("--{boundary}\r\n"));
        body.push_str("Content-Type: application/http\r\n");
        body.push_str("Content-Transfer-Encoding: binary\r\n\r\n");
        body.push_str(&format!("POST {url} HTTP/1.1\r\n"));
        body.push_str("Content-Type: application/json\r\n\r\n");
        body.push_str(&json);
        body.push_str("\r\n");
    }

    body.push_str(&format!("--{boundary}--\r\n"));
    Ok(body)
}
