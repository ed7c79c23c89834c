//! Named numeric counters with a fixed merge policy per name

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How two values of the same attribute combine when cards merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    Add,
    Max,
    Discard,
}

impl MergePolicy {
    fn merge(self, a: i64, b: i64) -> i64 {
        match self {
            MergePolicy::Add => a + b,
            MergePolicy::Max => a.max(b),
            MergePolicy::Discard => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub value: i64,
    pub policy: MergePolicy,
}

/// A name that two stores registered under different policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub name: String,
    pub kept: MergePolicy,
    pub dropped: MergePolicy,
}

/// Per-entity attribute store
///
/// Iterates in name order so snapshots hash identically across replicas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeStore {
    entries: BTreeMap<String, Attribute>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`; a name that already exists keeps its policy and value
    pub fn configure(&mut self, name: &str, initial: i64, policy: MergePolicy) {
        self.entries
            .entry(name.to_string())
            .or_insert(Attribute { value: initial, policy });
    }

    pub fn get(&self, name: &str, default: i64) -> i64 {
        self.entries.get(name).map_or(default, |a| a.value)
    }

    pub fn policy(&self, name: &str) -> Option<MergePolicy> {
        self.entries.get(name).map(|a| a.policy)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Add `delta` to a configured name. Unconfigured names are left alone.
    pub fn alter(&mut self, name: &str, delta: i64) -> bool {
        match self.entries.get_mut(name) {
            Some(attr) => {
                attr.value += delta;
                true
            }
            None => false,
        }
    }

    pub fn set(&mut self, name: &str, value: i64) -> bool {
        match self.entries.get_mut(name) {
            Some(attr) => {
                attr.value = value;
                true
            }
            None => false,
        }
    }

    /// Merge `other` into `self` and report every policy mismatch
    ///
    /// The policy already present in `self` wins. Names only `other` knows are
    /// merged against an implicit 0 under `other`'s policy.
    pub fn combine(&mut self, other: &AttributeStore) -> Vec<MergeConflict> {
        let mut conflicts = Vec::new();
        for (name, theirs) in &other.entries {
            match self.entries.get_mut(name) {
                Some(ours) => {
                    if ours.policy != theirs.policy {
                        conflicts.push(MergeConflict {
                            name: name.clone(),
                            kept: ours.policy,
                            dropped: theirs.policy,
                        });
                    }
                    ours.value = ours.policy.merge(ours.value, theirs.value);
                }
                None => {
                    self.entries.insert(
                        name.clone(),
                        Attribute {
                            value: theirs.policy.merge(0, theirs.value),
                            policy: theirs.policy,
                        },
                    );
                }
            }
        }
        // Names only we hold still go through the policy (discard must zero them).
        for (name, ours) in self.entries.iter_mut() {
            if !other.entries.contains_key(name) {
                ours.value = ours.policy.merge(ours.value, 0);
            }
        }
        conflicts
    }

    /// Zero every value, keeping the registered policies
    pub fn reset(&mut self) {
        for attr in self.entries.values_mut() {
            attr.value = 0;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_configure_fixes_policy_and_value() {
        let mut attrs = AttributeStore::new();
        attrs.configure("power", 2, MergePolicy::Add);
        attrs.configure("power", 9, MergePolicy::Max);

        assert_eq!(attrs.get("power", 0), 2);
        assert_eq!(attrs.policy("power"), Some(MergePolicy::Add));
    }

    #[test]
    fn test_get_unknown_returns_default() {
        let attrs = AttributeStore::new();
        assert_eq!(attrs.get("darkness", 0), 0);
        assert_eq!(attrs.get("darkness", -1), -1);
    }

    #[test]
    fn test_alter_requires_configuration() {
        let mut attrs = AttributeStore::new();
        assert!(!attrs.alter("power", 3));
        assert!(!attrs.contains("power"));

        attrs.configure("power", 0, MergePolicy::Add);
        assert!(attrs.alter("power", 3));
        assert!(attrs.alter("power", -1));
        assert_eq!(attrs.get("power", 0), 2);
    }

    #[test]
    fn test_combine_applies_each_policy() {
        let mut a = AttributeStore::new();
        a.configure("power", 2, MergePolicy::Add);
        a.configure("armor", 3, MergePolicy::Max);
        a.configure("charge", 5, MergePolicy::Discard);
        a.configure("solo", 4, MergePolicy::Max);

        let mut b = AttributeStore::new();
        b.configure("power", 5, MergePolicy::Add);
        b.configure("armor", 1, MergePolicy::Max);
        b.configure("charge", 5, MergePolicy::Discard);
        b.configure("fresh", 6, MergePolicy::Add);

        let conflicts = a.combine(&b);

        assert!(conflicts.is_empty());
        assert_eq!(a.get("power", 0), 7);
        assert_eq!(a.get("armor", 0), 3);
        assert_eq!(a.get("charge", 0), 0);
        assert_eq!(a.get("solo", 0), 4);
        assert_eq!(a.get("fresh", 0), 6);
        assert_eq!(a.policy("fresh"), Some(MergePolicy::Add));
    }

    #[test]
    fn test_combine_reports_policy_conflict_and_keeps_ours() {
        let mut a = AttributeStore::new();
        a.configure("power", 2, MergePolicy::Max);
        let mut b = AttributeStore::new();
        b.configure("power", 7, MergePolicy::Add);

        let conflicts = a.combine(&b);

        assert_eq!(
            conflicts,
            vec![MergeConflict {
                name: "power".to_string(),
                kept: MergePolicy::Max,
                dropped: MergePolicy::Add,
            }]
        );
        assert_eq!(a.policy("power"), Some(MergePolicy::Max));
        assert_eq!(a.get("power", 0), 7);
    }

    #[test]
    fn test_reset_keeps_policies() {
        let mut attrs = AttributeStore::new();
        attrs.configure("bought", 0, MergePolicy::Add);
        attrs.alter("bought", 2);
        attrs.reset();

        assert_eq!(attrs.get("bought", 9), 0);
        assert_eq!(attrs.policy("bought"), Some(MergePolicy::Add));
    }
}
