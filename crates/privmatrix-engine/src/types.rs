//! Reference types for the remote access-control catalog.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An entity kind that privileges can be granted against.
///
/// Identity is the logical name, compared case-insensitively. Instances are
/// immutable once fetched; a catalog reload replaces them wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    /// Schema (logical) name, e.g. `account`.
    pub logical_name: String,
    /// Localized display name; falls back to the logical name when the
    /// service carries no localized label.
    pub display_name: String,
}

impl EntityRef {
    /// Creates an entity reference.
    pub fn new(logical_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            display_name: display_name.into(),
        }
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.logical_name.eq_ignore_ascii_case(&other.logical_name)
    }
}

impl Eq for EntityRef {}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}  ({})", self.display_name, self.logical_name)
    }
}

/// A security role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    /// Role ID.
    pub id: Uuid,
    /// Role name.
    pub name: String,
}

impl RoleRef {
    /// Creates a role reference.
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A business unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessUnitRef {
    /// Business unit ID.
    pub id: Uuid,
    /// Business unit name.
    pub name: String,
}

impl BusinessUnitRef {
    /// Creates a business-unit reference.
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The eight access kinds a role can hold on an entity.
///
/// The set is closed and its declaration order is the column order used for
/// plan expansion and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrivilegeColumn {
    /// Create records.
    Create,
    /// Read records.
    Read,
    /// Write (update) records.
    Write,
    /// Delete records.
    Delete,
    /// Append this record to another.
    Append,
    /// Append other records to this one.
    AppendTo,
    /// Reassign record ownership.
    Assign,
    /// Share records with other users or teams.
    Share,
}

impl PrivilegeColumn {
    /// All columns, in declared order.
    pub const ALL: [PrivilegeColumn; 8] = [
        PrivilegeColumn::Create,
        PrivilegeColumn::Read,
        PrivilegeColumn::Write,
        PrivilegeColumn::Delete,
        PrivilegeColumn::Append,
        PrivilegeColumn::AppendTo,
        PrivilegeColumn::Assign,
        PrivilegeColumn::Share,
    ];

    /// Canonical column name, matching the service's privilege-type names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PrivilegeColumn::Create => "Create",
            PrivilegeColumn::Read => "Read",
            PrivilegeColumn::Write => "Write",
            PrivilegeColumn::Delete => "Delete",
            PrivilegeColumn::Append => "Append",
            PrivilegeColumn::AppendTo => "AppendTo",
            PrivilegeColumn::Assign => "Assign",
            PrivilegeColumn::Share => "Share",
        }
    }

    /// Resolves a column from its name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|column| column.as_str().eq_ignore_ascii_case(name))
    }

    /// Position of this column in [`PrivilegeColumn::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for PrivilegeColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope of a granted privilege, as submitted to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrivilegeDepth {
    /// The grantee's own records.
    Basic,
    /// The grantee's business unit.
    Local,
    /// The grantee's business unit and its children.
    Deep,
    /// The whole organization.
    Global,
}

impl PrivilegeDepth {
    /// Wire name of the depth.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PrivilegeDepth::Basic => "Basic",
            PrivilegeDepth::Local => "Local",
            PrivilegeDepth::Deep => "Deep",
            PrivilegeDepth::Global => "Global",
        }
    }
}

impl std::fmt::Display for PrivilegeDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A privilege record attached to an entity, as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeMeta {
    /// Privilege-type name, e.g. `Create`.
    pub name: String,
    /// Remote privilege identifier.
    pub privilege_id: Uuid,
}

impl PrivilegeMeta {
    /// Creates a privilege record.
    pub fn new(name: impl Into<String>, privilege_id: Uuid) -> Self {
        Self {
            name: name.into(),
            privilege_id,
        }
    }
}
