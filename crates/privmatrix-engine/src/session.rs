//! Update session: shared caches, the template, and load coordination.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::catalog::Catalog;
use crate::depth::Template;
use crate::error::{EngineError, EngineResult};
use crate::executor::{BatchExecutor, RunReport};
use crate::plan::build_plan;
use crate::privileges::PrivilegeIndexCache;
use crate::service::AccessControlService;
use crate::types::{EntityRef, RoleRef};

/// User-facing phase of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Status {
    /// Nothing has happened yet.
    #[default]
    Idle,
    /// A catalog load is in flight.
    Loading,
    /// The in-flight load was cancelled.
    Cancelled,
    /// The load failed before installing anything.
    LoadFailed,
    /// A full catalog is installed.
    Loaded {
        /// Entities loaded.
        entities: usize,
        /// Business units loaded.
        business_units: usize,
        /// Roles loaded.
        roles: usize,
    },
    /// A roles-only reload finished.
    RolesLoaded {
        /// Roles loaded.
        count: usize,
        /// Whether the reload was scoped to one business unit.
        scoped: bool,
    },
    /// Privilege indexes are cached for the selection.
    PrivilegesCached {
        /// Entities covered.
        entities: usize,
    },
    /// A batch run is in flight.
    Updating,
    /// The batch run finished.
    UpdateComplete,
    /// The batch run failed partway.
    UpdateFailed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => f.write_str("Idle"),
            Status::Loading => f.write_str("Loading entities, business units, roles..."),
            Status::Cancelled => f.write_str("Cancelled."),
            Status::LoadFailed => f.write_str("Load failed."),
            Status::Loaded {
                entities,
                business_units,
                roles,
            } => write!(
                f,
                "Loaded: {entities} entities, {business_units} BUs, {roles} roles."
            ),
            Status::RolesLoaded {
                count,
                scoped: true,
            } => write!(f, "Roles loaded (BU): {count}"),
            Status::RolesLoaded {
                count,
                scoped: false,
            } => write!(f, "Roles loaded (all BUs): {count}"),
            Status::PrivilegesCached { entities } => {
                write!(f, "Privileges cached for {entities} entities.")
            }
            Status::Updating => f.write_str("Updating (batched)..."),
            Status::UpdateComplete => f.write_str("Update complete."),
            Status::UpdateFailed => f.write_str("Update failed."),
        }
    }
}

/// Handle identifying one in-flight catalog load.
///
/// Carries the load's generation and its cancellation token. The token is
/// checked cooperatively at page boundaries; the generation decides whether
/// the finished load may still install its result.
#[derive(Debug, Clone)]
pub struct LoadHandle {
    generation: u64,
    token: CancellationToken,
}

impl LoadHandle {
    /// This load's generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// This load's cancellation token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Owns the mutable state of one user session: the catalog, the privilege
/// cache, and the template.
///
/// Single-writer by construction: every mutation goes through `&mut self`,
/// from the completion side of a background operation. At most one catalog
/// load is in flight; starting a new one cancels and supersedes the previous
/// one, and a superseded load's late result is discarded by the generation
/// check in [`UpdateSession::install_catalog`]. Batch applies expose no
/// cancellation and must be serialized by the caller.
#[derive(Debug, Default)]
pub struct UpdateSession {
    catalog: Catalog,
    privileges: PrivilegeIndexCache,
    template: Template,
    generation: u64,
    current_load: Option<CancellationToken>,
    status: Status,
}

impl UpdateSession {
    /// Creates an empty session with an all-`NoChange` template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The installed catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The privilege-index cache.
    #[must_use]
    pub fn privileges(&self) -> &PrivilegeIndexCache {
        &self.privileges
    }

    /// The editable template row.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Mutable access to the template for cell edits.
    pub fn template_mut(&mut self) -> &mut Template {
        &mut self.template
    }

    /// Current phase.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Starts a catalog load, cancelling and superseding any prior one.
    ///
    /// The returned handle travels with the background load; pass it back to
    /// [`UpdateSession::install_catalog`] or [`UpdateSession::fail_load`]
    /// when the load completes.
    pub fn begin_load(&mut self) -> LoadHandle {
        if let Some(token) = self.current_load.take() {
            token.cancel();
        }
        self.generation += 1;
        let token = CancellationToken::new();
        self.current_load = Some(token.clone());
        self.status = Status::Loading;
        debug!(generation = self.generation, "catalog load started");
        LoadHandle {
            generation: self.generation,
            token,
        }
    }

    /// Cancels the in-flight load, if any.
    pub fn cancel_load(&mut self) {
        if let Some(token) = self.current_load.take() {
            token.cancel();
            self.status = Status::Cancelled;
            info!(generation = self.generation, "catalog load cancelled");
        }
    }

    /// Installs a completed load's result.
    ///
    /// Returns `false`, changing nothing, when the load was superseded or
    /// cancelled, even if it completed successfully afterwards. Installation
    /// replaces the catalog wholesale, clears the privilege cache, and resets
    /// the template.
    pub fn install_catalog(&mut self, handle: &LoadHandle, catalog: Catalog) -> bool {
        if handle.generation != self.generation || handle.token.is_cancelled() {
            debug!(
                generation = handle.generation,
                current = self.generation,
                "stale catalog load discarded"
            );
            return false;
        }
        self.current_load = None;
        self.status = Status::Loaded {
            entities: catalog.entities.len(),
            business_units: catalog.business_units.len(),
            roles: catalog.roles.len(),
        };
        self.privileges.clear();
        self.template.reset();
        self.catalog = catalog;
        true
    }

    /// Records the outcome of a failed or cancelled load.
    ///
    /// Returns `false` when the handle is stale; a superseded load's failure
    /// must not disturb the newer load's status.
    pub fn fail_load(&mut self, handle: &LoadHandle, error: &EngineError) -> bool {
        if handle.generation != self.generation {
            return false;
        }
        self.current_load = None;
        self.status = if error.is_cancelled() {
            Status::Cancelled
        } else {
            Status::LoadFailed
        };
        true
    }

    /// Installs a roles-only reload (e.g. after switching business unit).
    ///
    /// This path carries no cancellation and no generation; it simply
    /// replaces the role list.
    pub fn install_roles(&mut self, roles: Vec<RoleRef>, scoped: bool) {
        self.status = Status::RolesLoaded {
            count: roles.len(),
            scoped,
        };
        self.catalog.roles = roles;
    }

    /// Resolves privilege indexes for the selected entities.
    ///
    /// Already-cached entities cost nothing. On success the template is reset
    /// so the next run starts from a clean row.
    #[instrument(skip_all, fields(entities = entities.len()))]
    pub async fn load_privileges(
        &mut self,
        service: &dyn AccessControlService,
        entities: &[EntityRef],
    ) -> EngineResult<usize> {
        if entities.is_empty() {
            return Err(EngineError::NoEntitiesSelected);
        }
        let fetched = self.privileges.ensure_privileges(service, entities).await?;
        self.template.reset();
        self.status = Status::PrivilegesCached {
            entities: entities.len(),
        };
        Ok(fetched)
    }

    /// Builds and executes the update for the current template and the given
    /// selection.
    ///
    /// Precondition failures return before any remote call and leave the
    /// status untouched; once the plan builds, the run is reported as
    /// `Updating`, then `UpdateComplete` or `UpdateFailed`.
    #[instrument(skip_all, fields(entities = entities.len(), roles = roles.len()))]
    pub async fn apply(
        &mut self,
        service: &dyn AccessControlService,
        executor: &BatchExecutor,
        entities: &[EntityRef],
        roles: &[RoleRef],
    ) -> EngineResult<RunReport> {
        let plan = build_plan(entities, roles, &self.template, &self.privileges)?;

        self.status = Status::Updating;
        match executor.execute(service, &plan).await {
            Ok(report) => {
                self.status = Status::UpdateComplete;
                Ok(report)
            }
            Err(error) => {
                self.status = Status::UpdateFailed;
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_the_reported_phases() {
        assert_eq!(Status::Idle.to_string(), "Idle");
        assert_eq!(
            Status::Loading.to_string(),
            "Loading entities, business units, roles..."
        );
        assert_eq!(Status::Cancelled.to_string(), "Cancelled.");
        assert_eq!(
            Status::Loaded {
                entities: 12,
                business_units: 3,
                roles: 40
            }
            .to_string(),
            "Loaded: 12 entities, 3 BUs, 40 roles."
        );
        assert_eq!(
            Status::RolesLoaded {
                count: 5,
                scoped: true
            }
            .to_string(),
            "Roles loaded (BU): 5"
        );
        assert_eq!(
            Status::RolesLoaded {
                count: 9,
                scoped: false
            }
            .to_string(),
            "Roles loaded (all BUs): 9"
        );
        assert_eq!(
            Status::PrivilegesCached { entities: 2 }.to_string(),
            "Privileges cached for 2 entities."
        );
        assert_eq!(Status::Updating.to_string(), "Updating (batched)...");
        assert_eq!(Status::UpdateComplete.to_string(), "Update complete.");
        assert_eq!(Status::UpdateFailed.to_string(), "Update failed.");
    }

    #[test]
    fn begin_load_cancels_and_supersedes_the_previous_load() {
        let mut session = UpdateSession::new();
        let first = session.begin_load();
        let second = session.begin_load();

        assert!(first.token().is_cancelled());
        assert!(!second.token().is_cancelled());
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn stale_load_results_are_discarded() {
        let mut session = UpdateSession::new();
        let first = session.begin_load();
        let second = session.begin_load();

        // The superseded load completes late; nothing may change.
        assert!(!session.install_catalog(&first, Catalog::default()));
        assert_eq!(session.status(), &Status::Loading);

        assert!(session.install_catalog(&second, Catalog::default()));
        assert!(matches!(session.status(), Status::Loaded { .. }));
    }

    #[test]
    fn stale_load_failure_does_not_disturb_the_newer_load() {
        let mut session = UpdateSession::new();
        let first = session.begin_load();
        let _second = session.begin_load();

        assert!(!session.fail_load(&first, &EngineError::Cancelled));
        assert_eq!(session.status(), &Status::Loading);
    }

    #[test]
    fn cancel_load_reports_cancelled() {
        let mut session = UpdateSession::new();
        let handle = session.begin_load();
        session.cancel_load();

        assert!(handle.token().is_cancelled());
        assert_eq!(session.status(), &Status::Cancelled);
        // The cancelled load's result must not install.
        assert!(!session.install_catalog(&handle, Catalog::default()));
    }

    #[test]
    fn installing_a_catalog_resets_template_and_privilege_cache() {
        use crate::privileges::PrivilegeIndex;
        use crate::types::{PrivilegeColumn, PrivilegeMeta};
        use uuid::Uuid;

        let mut session = UpdateSession::new();
        session
            .privileges
            .insert(
                "account",
                PrivilegeIndex::from_records(&[PrivilegeMeta::new("Read", Uuid::from_u128(1))]),
            );
        session
            .template_mut()
            .set(PrivilegeColumn::Read, crate::depth::DepthState::User);

        let handle = session.begin_load();
        assert!(session.install_catalog(&handle, Catalog::default()));

        assert!(session.privileges().is_empty());
        assert!(session.template().is_all_no_change());
    }
}
