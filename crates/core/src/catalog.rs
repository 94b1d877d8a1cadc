use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::CatalogRecord;
use crate::errors::CalibrationError;

/// Attribute strings arrive as delimiter-joined label lists, e.g.
/// `Comedy|Romance`.
pub const DEFAULT_ATTRIBUTE_DELIMITER: char = '|';

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A catalog entry. `attribute_weights` is assigned once at construction
/// (equal share `1/n` per label) and never mutated afterwards; per-user
/// relevance scores are carried separately by `rerank::ScoredCandidate`.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    attribute_weights: BTreeMap<String, f64>,
}

impl Item {
    pub fn new(id: ItemId, title: impl Into<String>, attributes: &str, delimiter: char) -> Self {
        let labels: Vec<&str> = attributes
            .split(delimiter)
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .collect();

        let mut attribute_weights = BTreeMap::new();
        if !labels.is_empty() {
            let share = 1.0 / labels.len() as f64;
            for label in labels {
                attribute_weights.insert(label.to_string(), share);
            }
        }

        Self { id, title: title.into(), attribute_weights }
    }

    pub fn attribute_weights(&self) -> &BTreeMap<String, f64> {
        &self.attribute_weights
    }
}

/// Read-only item index built once from catalog records. Safe to share
/// across users; nothing in the engine mutates it after construction.
#[derive(Debug, Default)]
pub struct Catalog {
    items: HashMap<ItemId, Item>,
}

impl Catalog {
    pub fn from_records(records: &[CatalogRecord], delimiter: char) -> Self {
        let mut items = HashMap::with_capacity(records.len());
        for record in records {
            let item =
                Item::new(record.item_id.clone(), &record.title, &record.attributes, delimiter);
            items.insert(item.id.clone(), item);
        }
        Self { items }
    }

    pub fn get(&self, item_id: &ItemId) -> Option<&Item> {
        self.items.get(item_id)
    }

    pub fn require(&self, item_id: &ItemId) -> Result<&Item, CalibrationError> {
        self.get(item_id)
            .ok_or_else(|| CalibrationError::UnknownItem { item_id: item_id.clone() })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }
}
