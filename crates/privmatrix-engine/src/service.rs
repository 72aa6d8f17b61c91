//! The remote access-control service boundary.
//!
//! The engine drives any backend implementing [`AccessControlService`]; the
//! production implementation speaks the Dataverse Web API, tests use an
//! in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::plan::BatchOperation;
use crate::types::PrivilegeMeta;

/// Boolean metadata filters for entity listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFilter {
    /// Only customizable entities.
    pub customizable_only: bool,
    /// Exclude activity entities.
    pub exclude_activities: bool,
    /// Exclude intersect (many-to-many join) entities.
    pub exclude_intersects: bool,
}

impl EntityFilter {
    /// The filter used for the assignable-entity catalog: customizable,
    /// not an activity, not an intersect table.
    #[must_use]
    pub fn assignable() -> Self {
        Self {
            customizable_only: true,
            exclude_activities: true,
            exclude_intersects: true,
        }
    }
}

impl Default for EntityFilter {
    fn default() -> Self {
        Self::assignable()
    }
}

/// Raw entity-metadata record from the service.
///
/// The display name is optional on the wire; the catalog layer applies the
/// logical-name fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Schema (logical) name.
    pub logical_name: String,
    /// Localized display label, when one exists.
    pub display_name: Option<String>,
}

/// Which record catalog a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Business-unit records.
    BusinessUnit,
    /// Security-role records.
    Role,
}

/// A cursor-paginated record query, used identically for business units and
/// roles.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    /// Target record catalog.
    pub kind: RecordKind,
    /// Restrict roles to those without a parent role.
    pub root_only: bool,
    /// Restrict roles to one business unit.
    pub business_unit: Option<Uuid>,
    /// Records per page.
    pub page_size: u32,
}

impl RecordQuery {
    /// Default page size for catalog queries.
    pub const DEFAULT_PAGE_SIZE: u32 = 5000;

    /// Query for all business units.
    #[must_use]
    pub fn business_units() -> Self {
        Self {
            kind: RecordKind::BusinessUnit,
            root_only: false,
            business_unit: None,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// Query for root roles, optionally restricted to one business unit.
    #[must_use]
    pub fn root_roles(business_unit: Option<Uuid>) -> Self {
        Self {
            kind: RecordKind::Role,
            root_only: true,
            business_unit,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Opaque continuation cursor handed back by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wraps a service-issued cursor value.
    pub fn new(cursor: impl Into<String>) -> Self {
        Self(cursor.into())
    }

    /// The raw cursor value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A business-unit or role record in wire-neutral form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    /// Record ID.
    pub id: Uuid,
    /// Record name, when the service carries one.
    pub name: Option<String>,
}

/// One page of records.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    /// Records in service order.
    pub records: Vec<RecordRef>,
    /// Present when more pages follow.
    pub next: Option<PageCursor>,
}

impl RecordPage {
    /// A page with records and no continuation.
    #[must_use]
    pub fn last(records: Vec<RecordRef>) -> Self {
        Self {
            records,
            next: None,
        }
    }
}

/// Aggregate result of one batch submission.
///
/// Carries the transport-level outcome only: a batch submitted with
/// continue-on-error can succeed as a call while individual operations
/// inside it failed, and those per-item failures are not surfaced here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Operations the service accepted for processing in this call.
    pub operations_submitted: usize,
}

/// Remote access-control service the engine drives.
#[async_trait]
pub trait AccessControlService: Send + Sync {
    /// Lists entities matching the metadata filter.
    async fn query_entities(&self, filter: &EntityFilter) -> ServiceResult<Vec<EntityMeta>>;

    /// Fetches one page of business-unit or role records.
    async fn query_records(
        &self,
        query: &RecordQuery,
        cursor: Option<&PageCursor>,
    ) -> ServiceResult<RecordPage>;

    /// Lists the privileges an entity supports.
    async fn query_entity_privileges(
        &self,
        logical_name: &str,
    ) -> ServiceResult<Vec<PrivilegeMeta>>;

    /// Submits one bounded batch of operations.
    ///
    /// With `continue_on_error`, a failing operation must not abort its
    /// siblings in the same call.
    async fn execute_batch(
        &self,
        operations: &[BatchOperation],
        continue_on_error: bool,
    ) -> ServiceResult<BatchOutcome>;
}
