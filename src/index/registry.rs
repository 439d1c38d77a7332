//! Category registry: the name <-> id mapping for one conversion run.
//!
//! Two build policies exist. Discovery scans the whole corpus up front and
//! assigns ids 1..N over the lexicographically sorted name set, so the
//! mapping is identical for every output document of the run. Pass-through
//! takes a predefined COCO category list verbatim, ids unchanged.

use std::collections::{BTreeMap, BTreeSet};

use super::ids::CategoryId;
use super::model::Category;

/// Maps category names to stable positive integer ids.
#[derive(Clone, Debug)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    id_by_name: BTreeMap<String, CategoryId>,
    known_ids: BTreeSet<CategoryId>,
}

impl CategoryRegistry {
    /// Build policy A: discover names from a full corpus pre-pass.
    ///
    /// Duplicates collapse; ids are 1-indexed in sorted name order, so two
    /// scans of the same corpus always produce the same mapping.
    pub fn discover<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let distinct: BTreeSet<String> = names.into_iter().map(Into::into).collect();

        let categories: Vec<Category> = distinct
            .into_iter()
            .enumerate()
            .map(|(idx, name)| Category::new((idx + 1) as u32, name))
            .collect();

        Self::from_categories(categories)
    }

    /// Build policy B: take a predefined category list verbatim, ids
    /// unchanged.
    pub fn from_categories(categories: Vec<Category>) -> Self {
        let id_by_name = categories
            .iter()
            .map(|category| (category.name.clone(), category.id))
            .collect();
        let known_ids = categories.iter().map(|category| category.id).collect();

        Self {
            categories,
            id_by_name,
            known_ids,
        }
    }

    /// Resolve a name to its id, if the name was registered.
    pub fn id_for(&self, name: &str) -> Option<CategoryId> {
        self.id_by_name.get(name).copied()
    }

    /// Whether an id belongs to this registry.
    pub fn contains(&self, id: CategoryId) -> bool {
        self.known_ids.contains(&id)
    }

    /// The registered categories, in id-assignment order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
