//! Batched privilege assignment engine for security roles.
//!
//! This crate is the wire-neutral core of privmatrix: it models the one-row
//! depth template users edit, caches the entity/business-unit/role catalog
//! and per-entity privilege metadata, expands the template across the
//! selected entities and roles into a deterministic operation plan, and
//! submits that plan to a remote access-control service in bounded batches
//! with continue-on-error semantics.
//!
//! The remote service is abstracted behind [`AccessControlService`]; the
//! `privmatrix-dataverse` crate provides the Dataverse Web API
//! implementation.
//!
//! # Example
//!
//! ```
//! use privmatrix_engine::{
//!     build_plan, DepthState, EntityRef, PrivilegeColumn, PrivilegeIndex,
//!     PrivilegeIndexCache, PrivilegeMeta, RoleRef, Template,
//! };
//! use uuid::Uuid;
//!
//! // Privileges previously resolved for the selected entity.
//! let mut privileges = PrivilegeIndexCache::new();
//! privileges.insert(
//!     "account",
//!     PrivilegeIndex::from_records(&[
//!         PrivilegeMeta::new("Read", Uuid::from_u128(1)),
//!         PrivilegeMeta::new("Write", Uuid::from_u128(2)),
//!     ]),
//! );
//!
//! // Grant Read at user scope, revoke Write.
//! let mut template = Template::new();
//! template.set(PrivilegeColumn::Read, DepthState::User);
//! template.set(PrivilegeColumn::Write, DepthState::SetNone);
//!
//! let entities = [EntityRef::new("account", "Account")];
//! let roles = [RoleRef::new(Uuid::from_u128(9), "Sales Manager")];
//!
//! let plan = build_plan(&entities, &roles, &template, &privileges)?;
//! assert_eq!(plan.operations.len(), 2);
//! # Ok::<(), privmatrix_engine::EngineError>(())
//! ```

mod catalog;
mod depth;
mod error;
mod executor;
mod plan;
mod privileges;
mod service;
mod session;
mod types;

// Re-exports
pub use catalog::{load_business_units, load_entities, load_roles, Catalog};
pub use depth::{DepthState, Template};
pub use error::{EngineError, EngineResult, ServiceError, ServiceResult};
pub use executor::{BatchExecutor, RunReport};
pub use plan::{build_plan, BatchOperation, GrantedPrivilege, UpdatePlan};
pub use privileges::{PrivilegeIndex, PrivilegeIndexCache};
pub use service::{
    AccessControlService, BatchOutcome, EntityFilter, EntityMeta, PageCursor, RecordKind,
    RecordPage, RecordQuery, RecordRef,
};
pub use session::{LoadHandle, Status, UpdateSession};
pub use types::{
    BusinessUnitRef, EntityRef, PrivilegeColumn, PrivilegeDepth, PrivilegeMeta, RoleRef,
};
