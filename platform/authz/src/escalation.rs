//! Role escalation: which role tiers a subject may see or act on by virtue of
//! the tiers of the roles it holds.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Id, IdSet};

/// Abstract seniority bucket a concrete role belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTier {
    Employee,
    Specialist,
    TeamLeader,
    Manager,
    ProjectManager,
    BranchManager,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRule {
    /// Holding a role of this tier...
    pub holder: RoleTier,
    /// ...makes every role of these tiers part of the managed role scope.
    pub visible: Vec<RoleTier>,
}

/// Versioned escalation table. Role IDs are bound to tiers here so no
/// numeric role ID appears in decision code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEscalationTable {
    pub version: u32,
    pub roles: BTreeMap<Id, RoleTier>,
    pub rules: Vec<EscalationRule>,
}

impl Default for RoleEscalationTable {
    fn default() -> Self {
        use RoleTier::*;

        let staff = vec![Employee, Specialist, TeamLeader];
        let with_managers = vec![Employee, Specialist, TeamLeader, Manager];
        Self {
            version: 1,
            roles: BTreeMap::from([
                (1, Employee),
                (2, Specialist),
                (3, TeamLeader),
                (4, Manager),
                (5, ProjectManager),
                (6, BranchManager),
            ]),
            rules: vec![
                EscalationRule {
                    holder: Manager,
                    visible: staff,
                },
                EscalationRule {
                    holder: ProjectManager,
                    visible: with_managers.clone(),
                },
                EscalationRule {
                    holder: BranchManager,
                    visible: with_managers,
                },
            ],
        }
    }
}

impl RoleEscalationTable {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn tier_of(&self, role: Id) -> Option<RoleTier> {
        self.roles.get(&role).copied()
    }

    /// Role IDs made visible by the given held roles. Roles with no tier
    /// binding grant nothing.
    pub fn visible_roles(&self, held: &[Id]) -> IdSet {
        let held: BTreeSet<RoleTier> = held.iter().filter_map(|id| self.tier_of(*id)).collect();
        let visible: BTreeSet<RoleTier> = self
            .rules
            .iter()
            .filter(|rule| held.contains(&rule.holder))
            .flat_map(|rule| rule.visible.iter().copied())
            .collect();
        self.roles
            .iter()
            .filter(|(_, tier)| visible.contains(tier))
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_sees_staff_roles_only() {
        let table = RoleEscalationTable::default();
        assert_eq!(table.visible_roles(&[4]), IdSet::from([1, 2, 3]));
    }

    #[test]
    fn branch_and_project_managers_also_see_managers() {
        let table = RoleEscalationTable::default();
        assert_eq!(table.visible_roles(&[6]), IdSet::from([1, 2, 3, 4]));
        assert_eq!(table.visible_roles(&[5, 1]), IdSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn staff_and_unknown_roles_see_nothing() {
        let table = RoleEscalationTable::default();
        assert!(table.visible_roles(&[1, 2, 3, 99]).is_empty());
    }

    #[test]
    fn loads_from_json() {
        let raw = r#"{
            "version": 2,
            "roles": { "10": "team_leader", "11": "manager", "12": "employee" },
            "rules": [ { "holder": "team_leader", "visible": ["employee"] } ]
        }"#;
        let table = RoleEscalationTable::from_json(raw).unwrap();
        assert_eq!(table.version, 2);
        assert_eq!(table.tier_of(11), Some(RoleTier::Manager));
        assert_eq!(table.visible_roles(&[10]), IdSet::from([12]));
        assert!(table.visible_roles(&[11]).is_empty());
    }
}
