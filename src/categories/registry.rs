//! # Category registry: the fixed set of pollable data groups.
//!
//! [`CategoryRegistry`] is built once at coordinator construction and never
//! mutated afterwards. It owns the ordered category list and answers lookup
//! queries for the scheduler and cache.
//!
//! The [`standard`](CategoryRegistry::standard) set mirrors the data groups
//! a Redfish-style BMC exposes:
//!
//! ```text
//! Fast   : power
//! Normal : thermal, fan-mode, post-snoop
//! Static : system, chassis, manager, ntp, lldp, license, network-protocol
//! ```
//!
//! Fast and Normal categories are burst-eligible; Static ones are not.

use super::category::{CadenceClass, Category, CategoryId};

/// Immutable, ordered collection of category descriptors.
///
/// Fixed at construction; no registration or removal during a run.
#[derive(Clone, Debug)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    /// Builds the standard Redfish category set.
    pub fn standard() -> Self {
        use CadenceClass::{Fast, Normal, Static};
        use CategoryId::*;

        Self::custom(vec![
            Category::new(Power, Fast, true),
            Category::new(Thermal, Normal, true),
            Category::new(FanMode, Normal, true),
            Category::new(PostSnoop, Normal, true),
            Category::new(System, Static, false),
            Category::new(Chassis, Static, false),
            Category::new(Manager, Static, false),
            Category::new(Ntp, Static, false),
            Category::new(Lldp, Static, false),
            Category::new(License, Static, false),
            Category::new(NetworkProtocol, Static, false),
        ])
    }

    /// Builds a registry from an explicit category list.
    ///
    /// Intended for hosts that poll a subset (and for tests). Duplicate ids
    /// are debug-asserted; the first occurrence wins on lookup.
    pub fn custom(categories: Vec<Category>) -> Self {
        #[cfg(debug_assertions)]
        {
            let mut ids: Vec<CategoryId> = categories.iter().map(|c| c.id).collect();
            ids.sort_by_key(|c| c.as_str());
            let before = ids.len();
            ids.dedup();
            debug_assert_eq!(before, ids.len(), "duplicate category id in registry");
        }
        Self { categories }
    }

    /// Returns the ordered category sequence.
    pub fn list(&self) -> &[Category] {
        &self.categories
    }

    /// Looks up one category descriptor.
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Number of registered categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// True if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_covers_every_category() {
        let reg = CategoryRegistry::standard();
        assert_eq!(reg.len(), CategoryId::ALL.len());
        for id in CategoryId::ALL {
            assert!(reg.get(id).is_some(), "{id} missing from standard registry");
        }
    }

    #[test]
    fn test_static_categories_are_not_burst_eligible() {
        let reg = CategoryRegistry::standard();
        for cat in reg.list() {
            if cat.cadence == CadenceClass::Static {
                assert!(
                    !cat.burst_eligible,
                    "{} is static but burst-eligible",
                    cat.id
                );
            }
        }
    }

    #[test]
    fn test_custom_subset_lookup() {
        let reg = CategoryRegistry::custom(vec![Category::new(
            CategoryId::Power,
            CadenceClass::Fast,
            true,
        )]);
        assert_eq!(reg.len(), 1);
        assert!(reg.get(CategoryId::Power).is_some());
        assert!(reg.get(CategoryId::Thermal).is_none());
    }
}
