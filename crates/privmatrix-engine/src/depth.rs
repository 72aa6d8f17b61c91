//! Depth states and the one-row template edited before an update run.

use serde::{Deserialize, Serialize};

use crate::types::{PrivilegeColumn, PrivilegeDepth};

/// Per-column intent for one update run.
///
/// There is no total order between states. The only meaningful order is the
/// edit cycle:
///
/// ```text
/// NoChange -> User -> BusinessUnit -> Deep -> Organization -> SetNone -> NoChange
/// ```
///
/// `NoChange` is the identity state and produces no operation; `SetNone`
/// means "explicitly revoke if present".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepthState {
    /// Leave the privilege untouched.
    #[default]
    NoChange,
    /// Grant at user scope.
    User,
    /// Grant at business-unit scope.
    BusinessUnit,
    /// Grant at parent/child business-unit scope.
    Deep,
    /// Grant organization-wide.
    Organization,
    /// Revoke the privilege if present.
    SetNone,
}

impl DepthState {
    /// Next state in the edit cycle.
    #[must_use]
    pub fn advance(self) -> Self {
        match self {
            DepthState::NoChange => DepthState::User,
            DepthState::User => DepthState::BusinessUnit,
            DepthState::BusinessUnit => DepthState::Deep,
            DepthState::Deep => DepthState::Organization,
            DepthState::Organization => DepthState::SetNone,
            DepthState::SetNone => DepthState::NoChange,
        }
    }

    /// Execution scope for a grant, if this state produces one.
    ///
    /// `NoChange` and `SetNone` yield no scope: the former is a no-op, the
    /// latter is a removal rather than a scoped grant.
    #[must_use]
    pub fn grant_depth(self) -> Option<PrivilegeDepth> {
        match self {
            DepthState::User => Some(PrivilegeDepth::Basic),
            DepthState::BusinessUnit => Some(PrivilegeDepth::Local),
            DepthState::Deep => Some(PrivilegeDepth::Deep),
            DepthState::Organization => Some(PrivilegeDepth::Global),
            DepthState::NoChange | DepthState::SetNone => None,
        }
    }

    /// Whether this state leaves the privilege untouched.
    #[must_use]
    pub fn is_no_change(self) -> bool {
        matches!(self, DepthState::NoChange)
    }
}

/// The single editable row of per-column depth intent.
///
/// Every column always has exactly one state; a fresh template is
/// all-`NoChange`. The template is entity- and role-agnostic until plan
/// expansion and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    states: [DepthState; PrivilegeColumn::ALL.len()],
}

impl Template {
    /// Creates an all-`NoChange` template.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: [DepthState::NoChange; PrivilegeColumn::ALL.len()],
        }
    }

    /// Current state of one column.
    #[must_use]
    pub fn get(&self, column: PrivilegeColumn) -> DepthState {
        self.states[column.index()]
    }

    /// Sets one column to an explicit state.
    pub fn set(&mut self, column: PrivilegeColumn, state: DepthState) {
        self.states[column.index()] = state;
    }

    /// Advances one column one step in the cycle, returning the new state.
    pub fn cycle(&mut self, column: PrivilegeColumn) -> DepthState {
        let next = self.get(column).advance();
        self.set(column, next);
        next
    }

    /// Resets every column to `NoChange`.
    pub fn reset(&mut self) {
        self.states = [DepthState::NoChange; PrivilegeColumn::ALL.len()];
    }

    /// Whether every column is `NoChange`.
    #[must_use]
    pub fn is_all_no_change(&self) -> bool {
        self.states.iter().all(|state| state.is_no_change())
    }

    /// `(column, state)` pairs in declared column order.
    pub fn iter(&self) -> impl Iterator<Item = (PrivilegeColumn, DepthState)> + '_ {
        PrivilegeColumn::ALL
            .iter()
            .map(move |&column| (column, self.get(column)))
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_returns_to_start_after_six_advances() {
        for &start in &[
            DepthState::NoChange,
            DepthState::User,
            DepthState::BusinessUnit,
            DepthState::Deep,
            DepthState::Organization,
            DepthState::SetNone,
        ] {
            let mut state = start;
            for _ in 0..6 {
                state = state.advance();
            }
            assert_eq!(state, start);
        }
    }

    #[test]
    fn cycle_is_idempotent_under_multiples_of_six() {
        let mut state = DepthState::NoChange;
        for _ in 0..(6 * 4) {
            state = state.advance();
        }
        assert_eq!(state, DepthState::NoChange);
    }

    #[test]
    fn cycle_order() {
        let mut state = DepthState::NoChange;
        let expected = [
            DepthState::User,
            DepthState::BusinessUnit,
            DepthState::Deep,
            DepthState::Organization,
            DepthState::SetNone,
            DepthState::NoChange,
        ];
        for want in expected {
            state = state.advance();
            assert_eq!(state, want);
        }
    }

    #[test]
    fn grant_depth_mapping() {
        assert_eq!(DepthState::User.grant_depth(), Some(PrivilegeDepth::Basic));
        assert_eq!(
            DepthState::BusinessUnit.grant_depth(),
            Some(PrivilegeDepth::Local)
        );
        assert_eq!(DepthState::Deep.grant_depth(), Some(PrivilegeDepth::Deep));
        assert_eq!(
            DepthState::Organization.grant_depth(),
            Some(PrivilegeDepth::Global)
        );
        assert_eq!(DepthState::NoChange.grant_depth(), None);
        assert_eq!(DepthState::SetNone.grant_depth(), None);
    }

    #[test]
    fn fresh_template_is_all_no_change() {
        let template = Template::new();
        assert!(template.is_all_no_change());
        for column in PrivilegeColumn::ALL {
            assert_eq!(template.get(column), DepthState::NoChange);
        }
    }

    #[test]
    fn cycle_touches_only_the_clicked_column() {
        let mut template = Template::new();
        assert_eq!(template.cycle(PrivilegeColumn::Read), DepthState::User);
        assert_eq!(template.get(PrivilegeColumn::Read), DepthState::User);
        assert_eq!(template.get(PrivilegeColumn::Write), DepthState::NoChange);
        assert!(!template.is_all_no_change());
    }

    #[test]
    fn reset_clears_every_column() {
        let mut template = Template::new();
        template.set(PrivilegeColumn::Delete, DepthState::Organization);
        template.set(PrivilegeColumn::Share, DepthState::SetNone);
        template.reset();
        assert!(template.is_all_no_change());
    }
}
