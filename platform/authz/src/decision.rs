use serde::Serialize;

use crate::IdSet;

/// Outcome of an access check.
///
/// On scoped paths `allowed_ids` and `forbidden_ids` partition the requested
/// IDs exactly; bulk callers apply the allowed subset and report the rest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub has_full_access: bool,
    pub has_access: bool,
    pub allowed_ids: IdSet,
    pub forbidden_ids: IdSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_ids2: Option<IdSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forbidden_ids2: Option<IdSet>,
}

impl AccessDecision {
    pub fn full() -> Self {
        Self {
            has_full_access: true,
            has_access: true,
            ..Self::default()
        }
    }

    pub fn denied() -> Self {
        Self::default()
    }

    /// Binary, unscoped denial of a create action.
    pub fn create_denied() -> Self {
        Self {
            has_full_access: true,
            has_access: false,
            ..Self::default()
        }
    }

    /// Split `requested` against `scope`.
    pub fn scoped(requested: &IdSet, scope: &IdSet) -> Self {
        let partition = Partition::new(requested, scope);
        Self {
            has_full_access: partition.is_full(),
            has_access: partition.any_allowed(),
            allowed_ids: partition.allowed,
            forbidden_ids: partition.forbidden,
            ..Self::default()
        }
    }

    /// Combine the partitions of both sides of a dual-resource action.
    pub fn dual(first: Partition, second: Partition) -> Self {
        Self {
            has_full_access: first.is_full() && second.is_full(),
            has_access: first.any_allowed() && second.any_allowed(),
            allowed_ids: first.allowed,
            forbidden_ids: first.forbidden,
            allowed_ids2: Some(second.allowed),
            forbidden_ids2: Some(second.forbidden),
        }
    }

    /// Dual-resource decision where only the first resource is scoped and
    /// every ID of the second is granted.
    pub fn scoped_first(first: Partition, ids2: &IdSet) -> Self {
        Self {
            has_full_access: first.is_full(),
            has_access: first.any_allowed(),
            allowed_ids: first.allowed,
            forbidden_ids: first.forbidden,
            allowed_ids2: Some(ids2.clone()),
            forbidden_ids2: Some(IdSet::new()),
        }
    }

    /// Mirror of [`AccessDecision::scoped_first`].
    pub fn scoped_second(ids: &IdSet, second: Partition) -> Self {
        Self {
            has_full_access: second.is_full(),
            has_access: second.any_allowed(),
            allowed_ids: ids.clone(),
            forbidden_ids: IdSet::new(),
            allowed_ids2: Some(second.allowed),
            forbidden_ids2: Some(second.forbidden),
        }
    }

    pub fn is_partial(&self) -> bool {
        self.has_access && !self.has_full_access
    }
}

/// Requested IDs split into those inside and outside a scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    pub allowed: IdSet,
    pub forbidden: IdSet,
}

impl Partition {
    pub fn new(requested: &IdSet, scope: &IdSet) -> Self {
        let (allowed, forbidden) = requested.iter().partition(|id| scope.contains(*id));
        Self { allowed, forbidden }
    }

    pub fn is_full(&self) -> bool {
        self.forbidden.is_empty()
    }

    pub fn any_allowed(&self) -> bool {
        !self.allowed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_covers_request_without_overlap() {
        let requested = IdSet::from([1, 2, 3, 4]);
        let scope = IdSet::from([2, 4, 9]);
        let decision = AccessDecision::scoped(&requested, &scope);

        assert_eq!(decision.allowed_ids, IdSet::from([2, 4]));
        assert_eq!(decision.forbidden_ids, IdSet::from([1, 3]));
        assert!(decision.allowed_ids.is_disjoint(&decision.forbidden_ids));
        let union: IdSet = decision
            .allowed_ids
            .union(&decision.forbidden_ids)
            .copied()
            .collect();
        assert_eq!(union, requested);
        assert!(decision.is_partial());
    }

    #[test]
    fn dual_requires_both_sides() {
        let first = Partition::new(&IdSet::from([1, 2]), &IdSet::from([1, 2]));
        let second = Partition::new(&IdSet::from([5, 6]), &IdSet::from([5]));
        let decision = AccessDecision::dual(first, second);

        assert!(decision.has_access);
        assert!(!decision.has_full_access);
        assert_eq!(decision.allowed_ids2, Some(IdSet::from([5])));
        assert_eq!(decision.forbidden_ids2, Some(IdSet::from([6])));
    }

    #[test]
    fn one_sided_dual_grants_the_other_side() {
        let first = Partition::new(&IdSet::from([1, 2]), &IdSet::from([2]));
        let decision = AccessDecision::scoped_first(first, &IdSet::from([40]));

        assert!(decision.has_access);
        assert!(!decision.has_full_access);
        assert_eq!(decision.allowed_ids2, Some(IdSet::from([40])));
        assert_eq!(decision.forbidden_ids2, Some(IdSet::new()));

        let second = Partition::new(&IdSet::from([40, 41]), &IdSet::from([40, 41]));
        let decision = AccessDecision::scoped_second(&IdSet::from([1]), second);
        assert!(decision.has_full_access);
        assert_eq!(decision.allowed_ids, IdSet::from([1]));
    }

    #[test]
    fn serializes_camel_case_and_omits_second_side() {
        let decision = AccessDecision::scoped(&IdSet::from([100013, 100099]), &IdSet::from([100013]));
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "hasFullAccess": false,
                "hasAccess": true,
                "allowedIds": [100013],
                "forbiddenIds": [100099]
            })
        );
    }
}
