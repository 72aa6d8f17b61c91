//! Per-entity privilege metadata cache.

use std::collections::HashMap;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::service::AccessControlService;
use crate::types::{EntityRef, PrivilegeColumn, PrivilegeMeta};

/// Column-name → privilege-id mapping for one entity.
///
/// Entities do not all support all eight privilege kinds; absent columns are
/// simply missing from the index and are skipped at plan build.
#[derive(Debug, Clone, Default)]
pub struct PrivilegeIndex {
    by_name: HashMap<String, Uuid>,
}

impl PrivilegeIndex {
    /// Builds the index from the service's privilege records.
    ///
    /// Names are matched case-insensitively. Duplicate names must not occur
    /// under normal data; if they do, the first record wins.
    #[must_use]
    pub fn from_records(records: &[PrivilegeMeta]) -> Self {
        let mut by_name = HashMap::with_capacity(records.len());
        for record in records {
            by_name
                .entry(record.name.to_ascii_lowercase())
                .or_insert(record.privilege_id);
        }
        Self { by_name }
    }

    /// Remote id for one privilege column, if the entity supports it.
    #[must_use]
    pub fn privilege_id(&self, column: PrivilegeColumn) -> Option<Uuid> {
        self.by_name
            .get(&column.as_str().to_ascii_lowercase())
            .copied()
    }

    /// Number of privileges the entity supports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the entity supports no privileges at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Lazily resolved privilege indexes, keyed by entity logical name.
///
/// Entries live until [`PrivilegeIndexCache::clear`], which is called only on
/// a full catalog reload; nothing invalidates them implicitly.
#[derive(Debug, Default)]
pub struct PrivilegeIndexCache {
    entries: HashMap<String, PrivilegeIndex>,
}

impl PrivilegeIndexCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entity's index is cached. Logical names are compared
    /// case-insensitively.
    #[must_use]
    pub fn contains(&self, logical_name: &str) -> bool {
        self.entries.contains_key(&logical_name.to_ascii_lowercase())
    }

    /// The cached index for one entity.
    #[must_use]
    pub fn get(&self, logical_name: &str) -> Option<&PrivilegeIndex> {
        self.entries.get(&logical_name.to_ascii_lowercase())
    }

    /// Installs an index for one entity, replacing any prior entry.
    pub fn insert(&mut self, logical_name: &str, index: PrivilegeIndex) {
        self.entries
            .insert(logical_name.to_ascii_lowercase(), index);
    }

    /// Drops every cached index. Called on catalog reload.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves privilege indexes for every uncached entity.
    ///
    /// Idempotent per logical name: entities already cached are skipped
    /// without a remote call. Returns how many entities were fetched.
    #[instrument(skip_all, fields(requested = entities.len()))]
    pub async fn ensure_privileges(
        &mut self,
        service: &dyn AccessControlService,
        entities: &[EntityRef],
    ) -> EngineResult<usize> {
        let mut fetched = 0;
        for entity in entities {
            if self.contains(&entity.logical_name) {
                debug!(entity = %entity.logical_name, "privilege index already cached");
                continue;
            }

            let records = service
                .query_entity_privileges(&entity.logical_name)
                .await?;
            let index = PrivilegeIndex::from_records(&records);
            debug!(
                entity = %entity.logical_name,
                privileges = index.len(),
                "privilege index cached"
            );
            self.insert(&entity.logical_name, index);
            fetched += 1;
        }
        Ok(fetched)
    }
}
