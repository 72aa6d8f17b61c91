//! Catalog of assignable entities, business units, and security roles.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::service::{AccessControlService, EntityFilter, RecordQuery};
use crate::types::{BusinessUnitRef, EntityRef, RoleRef};

/// The three cached reference lists driving entity/role selection.
///
/// A load replaces the lists wholesale; there is no incremental merge.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Assignable entities, sorted by display name.
    pub entities: Vec<EntityRef>,
    /// Business units, sorted by name.
    pub business_units: Vec<BusinessUnitRef>,
    /// Root roles, sorted by name.
    pub roles: Vec<RoleRef>,
}

impl Catalog {
    /// Loads all three reference lists in one pass.
    ///
    /// Any remote failure aborts the whole load: no partial catalog is ever
    /// returned. Cancellation is checked before each remote call and at
    /// every page boundary.
    #[instrument(skip_all)]
    pub async fn load(
        service: &dyn AccessControlService,
        cancel: &CancellationToken,
    ) -> EngineResult<Self> {
        let entities = load_entities(service, cancel).await?;
        let business_units = load_business_units(service, cancel).await?;
        let roles = load_roles(service, cancel, None).await?;

        info!(
            entities = entities.len(),
            business_units = business_units.len(),
            roles = roles.len(),
            "catalog loaded"
        );

        Ok(Self {
            entities,
            business_units,
            roles,
        })
    }

    /// Entities whose display or logical name contains the keyword,
    /// case-insensitively. A blank keyword returns everything. Catalog
    /// order is preserved.
    pub fn filter_entities(&self, keyword: &str) -> Vec<&EntityRef> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.entities.iter().collect();
        }
        let needle = keyword.to_lowercase();
        self.entities
            .iter()
            .filter(|entity| {
                entity.display_name.to_lowercase().contains(&needle)
                    || entity.logical_name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Roles whose name contains the keyword, case-insensitively.
    pub fn filter_roles(&self, keyword: &str) -> Vec<&RoleRef> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.roles.iter().collect();
        }
        let needle = keyword.to_lowercase();
        self.roles
            .iter()
            .filter(|role| role.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Looks up an entity by logical name, case-insensitively.
    pub fn find_entity(&self, logical_name: &str) -> Option<&EntityRef> {
        self.entities
            .iter()
            .find(|entity| entity.logical_name.eq_ignore_ascii_case(logical_name))
    }
}

/// Retrieves all assignable entities: customizable, not an activity, not an
/// intersect table. The display name falls back to the logical name when the
/// service carries no localized label; the result is sorted by display name,
/// case-insensitively.
#[instrument(skip_all)]
pub async fn load_entities(
    service: &dyn AccessControlService,
    cancel: &CancellationToken,
) -> EngineResult<Vec<EntityRef>> {
    ensure_live(cancel)?;

    let metas = service.query_entities(&EntityFilter::assignable()).await?;
    ensure_live(cancel)?;

    let mut entities: Vec<EntityRef> = metas
        .into_iter()
        .map(|meta| {
            let display_name = match meta.display_name {
                Some(label) if !label.trim().is_empty() => label,
                _ => meta.logical_name.clone(),
            };
            EntityRef {
                logical_name: meta.logical_name,
                display_name,
            }
        })
        .collect();

    entities.sort_by(|a, b| sort_key(&a.display_name).cmp(&sort_key(&b.display_name)));
    debug!(count = entities.len(), "entities retrieved");
    Ok(entities)
}

/// Retrieves all business units, following the paging cursor until
/// exhausted. Sorted by name, case-insensitively.
#[instrument(skip_all)]
pub async fn load_business_units(
    service: &dyn AccessControlService,
    cancel: &CancellationToken,
) -> EngineResult<Vec<BusinessUnitRef>> {
    let query = RecordQuery::business_units();
    let mut units = Vec::new();
    let mut cursor = None;

    loop {
        ensure_live(cancel)?;
        let page = service.query_records(&query, cursor.as_ref()).await?;
        units.extend(page.records.into_iter().map(|record| BusinessUnitRef {
            id: record.id,
            name: record.name.unwrap_or_else(|| record.id.to_string()),
        }));
        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    units.sort_by(|a, b| sort_key(&a.name).cmp(&sort_key(&b.name)));
    debug!(count = units.len(), "business units retrieved");
    Ok(units)
}

/// Retrieves root roles (those without a parent role), optionally restricted
/// to one business unit. Sorted by name, case-insensitively.
#[instrument(skip_all, fields(business_unit = ?business_unit))]
pub async fn load_roles(
    service: &dyn AccessControlService,
    cancel: &CancellationToken,
    business_unit: Option<Uuid>,
) -> EngineResult<Vec<RoleRef>> {
    let query = RecordQuery::root_roles(business_unit);
    let mut roles = Vec::new();
    let mut cursor = None;

    loop {
        ensure_live(cancel)?;
        let page = service.query_records(&query, cursor.as_ref()).await?;
        roles.extend(page.records.into_iter().map(|record| RoleRef {
            id: record.id,
            name: record.name.unwrap_or_else(|| record.id.to_string()),
        }));
        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    roles.sort_by(|a, b| sort_key(&a.name).cmp(&sort_key(&b.name)));
    debug!(count = roles.len(), "roles retrieved");
    Ok(roles)
}

fn ensure_live(cancel: &CancellationToken) -> EngineResult<()> {
    if cancel.is_cancelled() {
        Err(EngineError::Cancelled)
    } else {
        Ok(())
    }
}

fn sort_key(name: &str) -> String {
    name.to_lowercase()
}
