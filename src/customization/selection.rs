//! The user's current option choices for one product.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::types::OptionValue;

/// Option id → chosen value.
///
/// Updates return a new state. Entries that did not change keep their `Arc`,
/// so [`SelectionState::entry_changed`] can detect changes by pointer.
/// Equality compares values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState {
    entries: BTreeMap<String, Arc<OptionValue>>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, option_id: &str) -> Option<&OptionValue> {
        self.entries.get(option_id).map(Arc::as_ref)
    }

    pub fn contains(&self, option_id: &str) -> bool {
        self.entries.contains_key(option_id)
    }

    /// New state with `option_id` set to `value`; every other entry is shared.
    pub fn with(&self, option_id: impl Into<String>, value: OptionValue) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(option_id.into(), Arc::new(value));
        Self { entries }
    }

    /// Whether the entry for `option_id` differs (by identity) from `previous`.
    pub fn entry_changed(&self, previous: &SelectionState, option_id: &str) -> bool {
        match (self.entries.get(option_id), previous.entries.get(option_id)) {
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            (None, None) => false,
            _ => true,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, OptionValue)> for SelectionState {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
        }
    }
}
