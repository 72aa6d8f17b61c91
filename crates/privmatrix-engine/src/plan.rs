//! Expansion of the edited template across the selected entities and roles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::depth::{DepthState, Template};
use crate::error::{EngineError, EngineResult};
use crate::privileges::PrivilegeIndexCache;
use crate::types::{EntityRef, PrivilegeColumn, PrivilegeDepth, RoleRef};

/// A privilege grant carried inside an add operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedPrivilege {
    /// Remote privilege identifier.
    pub privilege_id: Uuid,
    /// Scope of the grant.
    pub depth: PrivilegeDepth,
}

/// One remote operation in an update plan.
///
/// Pure value; it acquires no remote identity until submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOperation {
    /// Grants all listed privileges to one role in a single call.
    ///
    /// All grants accumulated for one (role, entity) pair travel in one
    /// operation to keep remote round-trips down.
    AddPrivileges {
        /// Target role.
        role_id: Uuid,
        /// Grants for this role, in column order.
        privileges: Vec<GrantedPrivilege>,
    },
    /// Revokes one privilege from one role.
    RemovePrivilege {
        /// Target role.
        role_id: Uuid,
        /// Privilege to revoke.
        privilege_id: Uuid,
    },
}

/// Deterministic expansion of template × entities × roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    /// Operations in role-major, entity-minor, column order.
    pub operations: Vec<BatchOperation>,
    /// (role, entity) pairs that produced at least one operation.
    pub pairs_touched: usize,
}

/// Expands the template into the minimal operation sequence.
///
/// Preconditions, checked before anything else and without any remote call:
/// at least one entity and one role selected, the template not all-`NoChange`,
/// and a cached privilege index for every selected entity (fail-fast on the
/// first entity missing one, even when the rest are indexed).
///
/// Columns an entity's index lacks are skipped silently: some entities do not
/// support every privilege kind. Per (role, entity) pair, `SetNone` columns
/// emit one `RemovePrivilege` each and all other non-`NoChange` columns are
/// grouped into a single `AddPrivileges` operation.
pub fn build_plan(
    entities: &[EntityRef],
    roles: &[RoleRef],
    template: &Template,
    privileges: &PrivilegeIndexCache,
) -> EngineResult<UpdatePlan> {
    if entities.is_empty() {
        return Err(EngineError::NoEntitiesSelected);
    }
    if roles.is_empty() {
        return Err(EngineError::NoRolesSelected);
    }
    if template.is_all_no_change() {
        return Err(EngineError::NoChangesSelected);
    }
    for entity in entities {
        if !privileges.contains(&entity.logical_name) {
            return Err(EngineError::PrivilegesNotLoaded {
                logical_name: entity.logical_name.clone(),
            });
        }
    }

    let mut operations = Vec::new();
    let mut pairs_touched = 0;

    for role in roles {
        for entity in entities {
            let Some(index) = privileges.get(&entity.logical_name) else {
                // Checked above; kept as a hard failure rather than a skip.
                return Err(EngineError::PrivilegesNotLoaded {
                    logical_name: entity.logical_name.clone(),
                });
            };

            let before = operations.len();
            let mut grants = Vec::with_capacity(PrivilegeColumn::ALL.len());

            for (column, state) in template.iter() {
                if state.is_no_change() {
                    continue;
                }
                let Some(privilege_id) = index.privilege_id(column) else {
                    continue;
                };

                if state == DepthState::SetNone {
                    operations.push(BatchOperation::RemovePrivilege {
                        role_id: role.id,
                        privilege_id,
                    });
                } else if let Some(depth) = state.grant_depth() {
                    grants.push(GrantedPrivilege {
                        privilege_id,
                        depth,
                    });
                }
            }

            if !grants.is_empty() {
                operations.push(BatchOperation::AddPrivileges {
                    role_id: role.id,
                    privileges: grants,
                });
            }
            if operations.len() > before {
                pairs_touched += 1;
            }
        }
    }

    Ok(UpdatePlan {
        operations,
        pairs_touched,
    })
}
