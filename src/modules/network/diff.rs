//! Structural diff and merge primitives shared by the resource modules
//!
//! Two layers live here:
//! - Untyped primitives over [`serde_json::Value`] (`dict_diff`, `dict_merge`,
//!   `remove_empties`, `filter_dict_having_none_value`, [`FieldDiff`]) used to
//!   clean parameters, merge records and report structural changes.
//! - Typed helpers ([`FieldChange`], [`KeyedDiff`], [`list_diff`]) used by the
//!   reconcilers to decide which commands to emit for a field or a keyed list.

use crate::modules::ModuleResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

// ============================================================================
// Value Primitives
// ============================================================================

/// Returns true for values that carry no opinion: null, "", [] and {}
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Recursively strip keys and list items whose value is null or empty.
///
/// `false` and `0` are meaningful values and are kept.
pub fn remove_empties(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut cleaned = Map::new();
            for (key, item) in map {
                let item = remove_empties(item);
                if !is_empty_value(&item) {
                    cleaned.insert(key.clone(), item);
                }
            }
            Value::Object(cleaned)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(remove_empties)
                .filter(|item| !is_empty_value(item))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Return the part of `want` that differs from `have`.
///
/// Objects are compared key by key and recursively; any other value is
/// compared by deep equality. Returns `Value::Null` when nothing differs
/// for non-object values and an empty object for objects.
pub fn dict_diff(have: &Value, want: &Value) -> Value {
    match (have, want) {
        (Value::Object(have_map), Value::Object(want_map)) => {
            let mut diff = Map::new();
            for (key, want_value) in want_map {
                if want_value.is_null() {
                    continue;
                }
                match have_map.get(key) {
                    Some(have_value) if have_value == want_value => {}
                    Some(have_value @ Value::Object(_)) if want_value.is_object() => {
                        let nested = dict_diff(have_value, want_value);
                        if !is_empty_value(&nested) {
                            diff.insert(key.clone(), nested);
                        }
                    }
                    _ => {
                        diff.insert(key.clone(), want_value.clone());
                    }
                }
            }
            Value::Object(diff)
        }
        _ if have == want => Value::Null,
        _ => want.clone(),
    }
}

/// Deep merge of `base` and `other`; values from `other` win on conflict.
///
/// A null in `other` never overwrites a value in `base`.
pub fn dict_merge(base: &Value, other: &Value) -> Value {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            let mut merged = base_map.clone();
            for (key, other_value) in other_map {
                let value = match base_map.get(key) {
                    Some(base_value) => dict_merge(base_value, other_value),
                    None => other_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        (_, Value::Null) => base.clone(),
        _ => other.clone(),
    }
}

/// The fields of `have` that `want` leaves unspecified.
///
/// This is what `replaced`/`overridden` must clear for a record present on
/// both sides.
pub fn filter_dict_having_none_value(want: &Value, have: &Value) -> Value {
    let (Value::Object(want_map), Value::Object(have_map)) = (want, have) else {
        return Value::Object(Map::new());
    };

    let mut filtered = Map::new();
    for (key, have_value) in have_map {
        if have_value.is_null() {
            continue;
        }
        match want_map.get(key) {
            None | Some(Value::Null) => {
                filtered.insert(key.clone(), have_value.clone());
            }
            Some(want_value @ Value::Object(_)) if have_value.is_object() => {
                let nested = filter_dict_having_none_value(want_value, have_value);
                if !is_empty_value(&nested) {
                    filtered.insert(key.clone(), nested);
                }
            }
            Some(_) => {}
        }
    }
    Value::Object(filtered)
}

/// Deep-merge two typed records, `overlay` winning on every field it sets.
pub fn merge_records<T>(base: &T, overlay: &T) -> ModuleResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let base = serde_json::to_value(base)?;
    let overlay = remove_empties(&serde_json::to_value(overlay)?);
    Ok(serde_json::from_value(dict_merge(&base, &overlay))?)
}

// ============================================================================
// Structural Field Diff
// ============================================================================

/// Field-by-field comparison of two records.
///
/// Lists are compared element-wise: `added[field]` holds the elements only
/// present in want and `removed[field]` the elements only present in have.
/// Nested objects produce a nested `FieldDiff`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub added: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub changed: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub removed: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nested: BTreeMap<String, FieldDiff>,
}

impl FieldDiff {
    /// Compare two values that are expected to be objects
    pub fn compute(have: &Value, want: &Value) -> Self {
        let mut diff = FieldDiff::default();
        let empty = Map::new();
        let have_map = have.as_object().unwrap_or(&empty);
        let want_map = want.as_object().unwrap_or(&empty);

        for (key, want_value) in want_map {
            if is_empty_value(want_value) {
                continue;
            }
            match have_map.get(key) {
                None | Some(Value::Null) => {
                    diff.added.insert(key.clone(), want_value.clone());
                }
                Some(have_value) if have_value == want_value => {}
                Some(have_value @ Value::Object(_)) if want_value.is_object() => {
                    let nested = FieldDiff::compute(have_value, want_value);
                    if !nested.is_empty() {
                        diff.nested.insert(key.clone(), nested);
                    }
                }
                Some(Value::Array(have_items)) if want_value.is_array() => {
                    let want_items = want_value.as_array().map(Vec::as_slice).unwrap_or(&[]);
                    let elements = list_diff(have_items, want_items);
                    if !elements.added.is_empty() {
                        diff.added.insert(key.clone(), Value::Array(elements.added));
                    }
                    if !elements.removed.is_empty() {
                        diff.removed.insert(key.clone(), Value::Array(elements.removed));
                    }
                }
                Some(have_value) => {
                    diff.changed.insert(
                        key.clone(),
                        serde_json::json!({ "before": have_value, "after": want_value }),
                    );
                }
            }
        }

        if let Value::Object(unspecified) = filter_dict_having_none_value(want, have) {
            for (key, have_value) in unspecified {
                if have_value.is_object() && want_map.get(key.as_str()).is_some_and(Value::is_object)
                {
                    // partially specified nested objects were handled above
                    continue;
                }
                if !is_empty_value(&have_value) {
                    diff.removed.insert(key, have_value);
                }
            }
        }

        diff
    }

    /// Compare two typed records
    pub fn between<T: Serialize>(have: &T, want: &T) -> ModuleResult<Self> {
        let have = remove_empties(&serde_json::to_value(have)?);
        let want = remove_empties(&serde_json::to_value(want)?);
        Ok(Self::compute(&have, &want))
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.changed.is_empty()
            && self.removed.is_empty()
            && self.nested.is_empty()
    }
}

// ============================================================================
// Typed Helpers
// ============================================================================

/// What to do with a field present in have but absent from want
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absent {
    /// Leave it untouched (merged)
    Ignore,
    /// Reset it to its default (replaced, overridden)
    Clear,
}

/// Outcome of comparing a single scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChange<'a, T> {
    Unchanged,
    /// Apply the wanted value
    Set(&'a T),
    /// Remove the value currently configured
    Clear(&'a T),
}

impl<'a, T: PartialEq> FieldChange<'a, T> {
    /// Compare `have` and `want` for one field.
    ///
    /// `default` is the value the device reports when the field is not
    /// configured; a have value equal to it never needs clearing and a want
    /// value equal to an unset have needs no command.
    pub fn between(
        have: Option<&'a T>,
        want: Option<&'a T>,
        default: Option<&T>,
        absent: Absent,
    ) -> Self {
        match want {
            Some(w) => {
                let effective = have.or(default);
                if effective == Some(w) {
                    FieldChange::Unchanged
                } else {
                    FieldChange::Set(w)
                }
            }
            None if absent == Absent::Clear => Self::clear(have, default),
            None => FieldChange::Unchanged,
        }
    }

    /// Clear the have value unless it already equals the default
    pub fn clear(have: Option<&'a T>, default: Option<&T>) -> Self {
        match have {
            Some(h) if default != Some(h) => FieldChange::Clear(h),
            _ => FieldChange::Unchanged,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldChange::Unchanged)
    }
}

/// Records of two lists matched by key, never by position
#[derive(Debug)]
pub struct KeyedDiff<'a, T> {
    /// Every want record, in want order, with its have counterpart if any
    pub pairs: Vec<(Option<&'a T>, &'a T)>,
    /// Have records with no want counterpart, in have order
    pub have_only: Vec<&'a T>,
}

impl<'a, T> KeyedDiff<'a, T> {
    pub fn new<K, F>(have: &'a [T], want: &'a [T], key: F) -> Self
    where
        K: Eq + Hash,
        F: Fn(&T) -> K,
    {
        let have_by_key: HashMap<K, &'a T> = have.iter().map(|h| (key(h), h)).collect();
        let want_keys: std::collections::HashSet<K> = want.iter().map(&key).collect();

        let pairs = want
            .iter()
            .map(|w| (have_by_key.get(&key(w)).copied(), w))
            .collect();
        let have_only = have
            .iter()
            .filter(|h| !want_keys.contains(&key(h)))
            .collect();

        Self { pairs, have_only }
    }
}

/// Element-wise difference between two lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDiff<T> {
    /// Elements of want missing from have, in want order
    pub added: Vec<T>,
    /// Elements of have missing from want, in have order
    pub removed: Vec<T>,
}

impl<T> ListDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub fn list_diff<T: PartialEq + Clone>(have: &[T], want: &[T]) -> ListDiff<T> {
    ListDiff {
        added: want.iter().filter(|w| !have.contains(w)).cloned().collect(),
        removed: have.iter().filter(|h| !want.contains(h)).cloned().collect(),
    }
}
