//! Attribute store for one node
//!
//! Two parallel vectors (keys, values) in insertion order. At the observed
//! scale (about 1.5 attributes on nodes that have any) a linear scan beats
//! hashing, and no per-entry allocation beyond the strings themselves.
//!
//! Keys starting with [`INTERNAL_PREFIX`] are internal: they hold lazily
//! created side data (user data, attribute source ranges, the base URI) in
//! the same vectors, and are hidden from `len`, iteration, lists and output.
//!
//! ```text
//! keys: ["href", "/nodetree.userdata", "class"]
//! vals: [Text("/a"), UserData({..}),   Text(None)]   <- class is boolean
//! ```

use std::fmt;

use ahash::AHashMap;
use serde_json::Value;

use crate::attribute::{self, Attribute};
use crate::config::OutputSettings;
use crate::error::{Result, TreeError};
use crate::range::AttributeRange;

/// Marks an internal key. Can't be produced by the parser.
pub const INTERNAL_PREFIX: char = '/';

const USER_DATA_KEY: &str = "/nodetree.userdata";
const RANGES_KEY: &str = "/nodetree.ranges";
pub(crate) const BASE_URI_KEY: &str = "/nodetree.baseUri";

const INITIAL_CAPACITY: usize = 3;
const GROWTH_FACTOR: usize = 2;

pub(crate) fn is_internal_key(key: &str) -> bool {
    key.len() > 1 && key.starts_with(INTERNAL_PREFIX)
}

/// Value slot. Only `Text` is visible through the public attribute API.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    /// `None` is a boolean attribute
    Text(Option<String>),
    UserData(AHashMap<String, Value>),
    Ranges(AHashMap<String, AttributeRange>),
}

impl Slot {
    fn as_str(&self) -> &str {
        match self {
            Slot::Text(Some(v)) => v,
            _ => "",
        }
    }

    fn is_declared(&self) -> bool {
        matches!(self, Slot::Text(Some(_)))
    }

    fn text(&self) -> Option<&str> {
        match self {
            Slot::Text(v) => v.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Attributes {
    keys: Vec<String>,
    vals: Vec<Slot>,
    /// Bumped whenever the number of slots changes
    mod_count: u64,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_capacity(&mut self, min_new_size: usize) {
        let cur_cap = self.keys.capacity();
        if cur_cap >= min_new_size {
            return;
        }
        let size = self.keys.len();
        let mut new_cap = if cur_cap >= INITIAL_CAPACITY {
            size * GROWTH_FACTOR
        } else {
            INITIAL_CAPACITY
        };
        if min_new_size > new_cap {
            new_cap = min_new_size;
        }
        self.keys.reserve_exact(new_cap - size);
        self.vals.reserve_exact(new_cap - size);
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.keys.capacity()
    }

    fn index_of_key(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    fn index_of_key_ignore_case(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k.eq_ignore_ascii_case(key))
    }

    fn add_slot(&mut self, key: String, slot: Slot) {
        self.check_capacity(self.keys.len() + 1);
        self.keys.push(key);
        self.vals.push(slot);
        self.mod_count += 1;
    }

    fn remove_index(&mut self, index: usize) {
        self.keys.remove(index);
        self.vals.remove(index);
        self.mod_count += 1;
    }

    /// Value for `key`, or `""` if missing or boolean
    pub fn get(&self, key: &str) -> &str {
        self.index_of_key(key).map_or("", |i| self.vals[i].as_str())
    }

    pub fn get_ignore_case(&self, key: &str) -> &str {
        self.index_of_key_ignore_case(key)
            .map_or("", |i| self.vals[i].as_str())
    }

    /// Owned copy of the attribute under `key`
    pub fn attribute(&self, key: &str) -> Option<Attribute> {
        let i = self.index_of_key(key)?;
        Some(Attribute::from_parts(
            key.to_string(),
            self.vals[i].text().map(str::to_string),
        ))
    }

    /// Append without checking for an existing key; may create duplicates.
    pub fn add(&mut self, key: impl Into<String>, value: Option<&str>) -> &mut Self {
        self.add_slot(key.into(), Slot::Text(value.map(str::to_string)));
        self
    }

    /// Set `key` (exact match), or append it. `None` sets a boolean attribute.
    pub fn put(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        match self.index_of_key(key) {
            Some(i) => self.vals[i] = Slot::Text(value.map(str::to_string)),
            None => self.add_slot(key.to_string(), Slot::Text(value.map(str::to_string))),
        }
        self
    }

    /// Set the first key matching in any case. The stored key takes the
    /// casing of `key` if it differs.
    pub fn put_ignore_case(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        match self.index_of_key_ignore_case(key) {
            Some(i) => {
                self.vals[i] = Slot::Text(value.map(str::to_string));
                if self.keys[i] != key {
                    self.keys[i] = key.to_string();
                }
            }
            None => self.add_slot(key.to_string(), Slot::Text(value.map(str::to_string))),
        }
        self
    }

    /// `true` sets a boolean attribute, `false` removes it (any case)
    pub fn put_boolean(&mut self, key: &str, value: bool) -> &mut Self {
        if value {
            self.put_ignore_case(key, None)
        } else {
            self.remove_ignore_case(key)
        }
    }

    /// Put `attribute`'s key and value into this store
    pub fn put_attribute(&mut self, attribute: &Attribute) -> &mut Self {
        let value = attribute.has_declared_value().then(|| attribute.value());
        self.put(attribute.key(), value)
    }

    pub fn remove(&mut self, key: &str) -> &mut Self {
        if let Some(i) = self.index_of_key(key) {
            self.remove_index(i);
        }
        self
    }

    pub fn remove_ignore_case(&mut self, key: &str) -> &mut Self {
        if let Some(i) = self.index_of_key_ignore_case(key) {
            self.remove_index(i);
        }
        self
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.index_of_key(key).is_some()
    }

    pub fn has_key_ignore_case(&self, key: &str) -> bool {
        self.index_of_key_ignore_case(key).is_some()
    }

    /// Key present and not a boolean attribute
    pub fn has_declared_value(&self, key: &str) -> bool {
        self.index_of_key(key)
            .is_some_and(|i| self.vals[i].is_declared())
    }

    pub fn has_declared_value_ignore_case(&self, key: &str) -> bool {
        self.index_of_key_ignore_case(key)
            .is_some_and(|i| self.vals[i].is_declared())
    }

    /// Number of attributes, excluding internal entries.
    ///
    /// O(n): internal entries sit between ordinary ones.
    pub fn len(&self) -> usize {
        self.keys.iter().filter(|k| !is_internal_key(k)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge `incoming` into this store. Internal entries are not copied.
    pub fn add_all(&mut self, incoming: &Attributes) {
        let incoming_size = incoming.len();
        if incoming_size == 0 {
            return;
        }
        self.check_capacity(self.keys.len() + incoming_size);
        let needs_put = !self.keys.is_empty();
        for (key, value) in incoming.iter() {
            if needs_put {
                self.put(key, value);
            } else {
                self.add(key, value);
            }
        }
    }

    fn user_data_map(&self) -> Option<&AHashMap<String, Value>> {
        match self.index_of_key(USER_DATA_KEY).map(|i| &self.vals[i]) {
            Some(Slot::UserData(map)) => Some(map),
            _ => None,
        }
    }

    pub fn has_user_data(&self) -> bool {
        self.has_key(USER_DATA_KEY)
    }

    /// Caller-attached data under `key`
    pub fn user_data(&self, key: &str) -> Option<&Value> {
        self.user_data_map()?.get(key)
    }

    /// Attach data under `key`; `None` removes it. The backing map is only
    /// created when a value is actually stored.
    pub fn set_user_data(&mut self, key: &str, value: Option<Value>) -> &mut Self {
        let index = self.index_of_key(USER_DATA_KEY);
        match (index, value) {
            (None, None) => {}
            (None, Some(value)) => {
                let mut map = AHashMap::new();
                map.insert(key.to_string(), value);
                self.add_slot(USER_DATA_KEY.to_string(), Slot::UserData(map));
            }
            (Some(i), value) => {
                if let Slot::UserData(map) = &mut self.vals[i] {
                    match value {
                        Some(value) => {
                            map.insert(key.to_string(), value);
                        }
                        None => {
                            map.remove(key);
                        }
                    }
                }
            }
        }
        self
    }

    /// Source range of `key`'s name and value; `UNTRACKED` if the attribute
    /// is missing or was not tracked.
    pub fn source_range(&self, key: &str) -> AttributeRange {
        if !self.has_key(key) {
            return AttributeRange::UNTRACKED;
        }
        match self.index_of_key(RANGES_KEY).map(|i| &self.vals[i]) {
            Some(Slot::Ranges(ranges)) => ranges
                .get(key)
                .copied()
                .unwrap_or(AttributeRange::UNTRACKED),
            _ => AttributeRange::UNTRACKED,
        }
    }

    pub fn set_source_range(&mut self, key: &str, range: AttributeRange) -> &mut Self {
        match self.index_of_key(RANGES_KEY) {
            Some(i) => {
                if let Slot::Ranges(ranges) = &mut self.vals[i] {
                    ranges.insert(key.to_string(), range);
                }
            }
            None => {
                let mut ranges = AHashMap::new();
                ranges.insert(key.to_string(), range);
                self.add_slot(RANGES_KEY.to_string(), Slot::Ranges(ranges));
            }
        }
        self
    }

    /// Borrowing iterator over `(key, value)`, skipping internal entries.
    ///
    /// The borrow rules out outside mutation; use [`Attributes::cursor`] to
    /// remove while iterating.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.keys
            .iter()
            .zip(self.vals.iter())
            .filter(|(k, _)| !is_internal_key(k))
            .map(|(k, v)| (k.as_str(), v.text()))
    }

    /// Detached fail-fast iterator; see [`AttributeCursor`]
    pub fn cursor(&self) -> AttributeCursor {
        AttributeCursor {
            expected: self.mod_count,
            index: 0,
            last: None,
        }
    }

    pub fn as_list(&self) -> Vec<Attribute> {
        self.iter()
            .map(|(k, v)| Attribute::from_parts(k.to_string(), v.map(str::to_string)))
            .collect()
    }

    /// `data-*` attributes with the prefix stripped
    pub fn dataset(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.iter()
            .filter(|(k, _)| attribute::is_data_key(k))
            .map(|(k, v)| (&k["data-".len()..], v.unwrap_or("")))
    }

    /// Append the HTML form (` key="value"` per attribute) to `out`
    pub fn html_to(&self, out: &mut String, settings: &OutputSettings) {
        for (key, value) in self.iter() {
            if let Some(key) = attribute::valid_key(key, settings.syntax) {
                out.push(' ');
                attribute::html_no_validate(&key, value, out, settings);
            }
        }
    }

    pub fn html(&self) -> String {
        let mut out = String::new();
        self.html_to(&mut out, &OutputSettings::default());
        out
    }

    /// Lower-case every non-internal key
    pub fn normalize(&mut self) {
        for key in self.keys.iter_mut() {
            if !is_internal_key(key) {
                *key = key.to_lowercase();
            }
        }
    }

    /// Drop later duplicates of earlier keys; returns how many were removed.
    /// Run once after parsing a node, not in steady state.
    pub fn deduplicate(&mut self, case_sensitive: bool) -> usize {
        let mut dupes = 0;
        let mut i = 0;
        while i < self.keys.len() {
            let mut j = i + 1;
            while j < self.keys.len() {
                let same = if case_sensitive {
                    self.keys[i] == self.keys[j]
                } else {
                    self.keys[i].eq_ignore_ascii_case(&self.keys[j])
                };
                if same {
                    dupes += 1;
                    self.remove_index(j);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        dupes
    }
}

impl Clone for Attributes {
    /// Independent copy with backing vectors trimmed to size
    fn clone(&self) -> Self {
        let mut keys = Vec::with_capacity(self.keys.len());
        keys.extend(self.keys.iter().cloned());
        let mut vals = Vec::with_capacity(self.vals.len());
        vals.extend(self.vals.iter().cloned());
        Self {
            keys,
            vals,
            mod_count: 0,
        }
    }
}

impl PartialEq for Attributes {
    /// Same entries in any order
    fn eq(&self, other: &Self) -> bool {
        if self.keys.len() != other.keys.len() {
            return false;
        }
        self.keys.iter().zip(self.vals.iter()).all(|(key, val)| {
            other
                .index_of_key(key)
                .is_some_and(|j| other.vals[j] == *val)
        })
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html())
    }
}

/// Fail-fast cursor over an [`Attributes`] store.
///
/// Holds no borrow, so the store can be mutated between steps. Any change to
/// the store's size through another path makes the next step return
/// [`TreeError::ConcurrentModification`]; [`AttributeCursor::remove`] is the
/// sanctioned way to delete while iterating.
#[derive(Debug, Clone)]
pub struct AttributeCursor {
    expected: u64,
    index: usize,
    /// Slot of the entry last returned by `next`, cleared by `remove`
    last: Option<usize>,
}

impl AttributeCursor {
    fn check_modified(&self, attrs: &Attributes) -> Result<()> {
        if attrs.mod_count != self.expected {
            return Err(TreeError::ConcurrentModification);
        }
        Ok(())
    }

    pub fn has_next(&mut self, attrs: &Attributes) -> Result<bool> {
        self.check_modified(attrs)?;
        while self.index < attrs.keys.len() && is_internal_key(&attrs.keys[self.index]) {
            self.index += 1;
        }
        Ok(self.index < attrs.keys.len())
    }

    pub fn next(&mut self, attrs: &Attributes) -> Result<Option<Attribute>> {
        if !self.has_next(attrs)? {
            return Ok(None);
        }
        let i = self.index;
        self.index += 1;
        self.last = Some(i);
        Ok(Some(Attribute::from_parts(
            attrs.keys[i].clone(),
            attrs.vals[i].text().map(str::to_string),
        )))
    }

    /// Remove the attribute last returned by `next`
    pub fn remove(&mut self, attrs: &mut Attributes) -> Result<()> {
        self.check_modified(attrs)?;
        let Some(last) = self.last.take() else {
            return Err(TreeError::precondition("remove() requires a preceding next()"));
        };
        attrs.remove_index(last);
        // the successor shifted into the removed slot
        self.index = last;
        self.expected = attrs.mod_count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::{LineIndex, Range};

    #[test]
    fn test_put_get() {
        let mut attrs = Attributes::new();
        attrs.put("href", Some("/a")).put("hidden", None);

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("href"), "/a");
        assert_eq!(attrs.get("hidden"), "");
        assert_eq!(attrs.get("missing"), "");
        assert!(attrs.has_key("hidden"));
        assert!(!attrs.has_declared_value("hidden"));
        assert!(attrs.has_declared_value("href"));
        assert!(!attrs.has_key("HREF"));
        assert!(attrs.has_key_ignore_case("HREF"));
        assert_eq!(attrs.get_ignore_case("HREF"), "/a");

        attrs.put("href", Some("/b"));
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("href"), "/b");
    }

    #[test]
    fn test_put_ignore_case_updates_key_casing() {
        let mut attrs = Attributes::new();
        attrs.put("Title", Some("a"));
        attrs.put_ignore_case("TITLE", Some("b"));

        assert_eq!(attrs.len(), 1);
        assert!(attrs.has_key("TITLE"));
        assert!(!attrs.has_key("Title"));
        assert_eq!(attrs.get("TITLE"), "b");
    }

    #[test]
    fn test_put_boolean() {
        let mut attrs = Attributes::new();
        attrs.put_boolean("Checked", true);
        assert!(attrs.has_key("Checked"));
        assert!(!attrs.has_declared_value("Checked"));

        attrs.put_boolean("CHECKED", false);
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_add_allows_duplicates() {
        let mut attrs = Attributes::new();
        attrs.add("id", Some("1")).add("id", Some("2"));
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("id"), "1");

        attrs.remove("id");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("id"), "2");
    }

    #[test]
    fn test_remove_shifts_left() {
        let mut attrs = Attributes::new();
        attrs.put("a", Some("1")).put("b", Some("2")).put("c", Some("3"));
        attrs.remove("b");
        let keys: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "c"]);

        attrs.remove_ignore_case("A");
        assert_eq!(attrs.get("c"), "3");
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_growth() {
        for n in 0..=50 {
            let mut attrs = Attributes::new();
            for i in 0..n {
                attrs.add(format!("key{i}"), Some(format!("val{i}").as_str()));
            }
            assert_eq!(attrs.len(), n);
            for i in 0..n {
                assert_eq!(attrs.get(&format!("key{i}")), format!("val{i}"));
            }
        }
    }

    #[test]
    fn test_capacity_seed_and_doubling() {
        let mut attrs = Attributes::new();
        assert_eq!(attrs.capacity(), 0);
        attrs.add("a", None);
        assert!(attrs.capacity() >= INITIAL_CAPACITY);
        attrs.add("b", None).add("c", None).add("d", None);
        assert!(attrs.capacity() >= 6);
    }

    #[test]
    fn test_clone_is_independent_and_trimmed() {
        let mut attrs = Attributes::new();
        for i in 0..5 {
            attrs.add(format!("k{i}"), Some("v"));
        }
        attrs.set_user_data("tag", Some(serde_json::json!({"n": 1})));

        let mut clone = attrs.clone();
        assert_eq!(clone.capacity(), clone.keys.len());
        assert_eq!(clone, attrs);

        clone.put("k1", Some("changed"));
        clone.set_user_data("tag", Some(serde_json::json!(2)));
        assert_eq!(attrs.get("k1"), "v");
        assert_eq!(attrs.user_data("tag"), Some(&serde_json::json!({"n": 1})));
        assert_ne!(clone, attrs);
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut a = Attributes::new();
        a.put("x", Some("1")).put("y", None);
        let mut b = Attributes::new();
        b.put("y", None).put("x", Some("1"));
        assert_eq!(a, b);

        b.put("y", Some(""));
        assert_ne!(a, b);
    }

    #[test]
    fn test_deduplicate() {
        let mut sensitive = Attributes::new();
        sensitive.add("href", Some("a")).add("HREF", Some("b"));
        assert_eq!(sensitive.deduplicate(true), 0);
        assert_eq!(sensitive.len(), 2);

        let mut insensitive = Attributes::new();
        insensitive
            .add("href", Some("a"))
            .add("HREF", Some("b"))
            .add("id", Some("x"))
            .add("Href", Some("c"));
        assert_eq!(insensitive.deduplicate(false), 2);
        assert_eq!(insensitive.len(), 2);
        assert_eq!(insensitive.get("href"), "a");
        assert_eq!(insensitive.deduplicate(false), 0);
    }

    #[test]
    fn test_cursor_fail_fast() {
        let mut attrs = Attributes::new();
        attrs.put("a", Some("1")).put("b", Some("2")).put("c", Some("3"));

        let mut cursor = attrs.cursor();
        assert_eq!(cursor.next(&attrs).unwrap().unwrap().key(), "a");
        attrs.put("d", Some("4"));
        assert_eq!(cursor.has_next(&attrs), Err(TreeError::ConcurrentModification));
        assert_eq!(cursor.next(&attrs), Err(TreeError::ConcurrentModification));
    }

    #[test]
    fn test_cursor_value_update_is_not_a_conflict() {
        let mut attrs = Attributes::new();
        attrs.put("a", Some("1")).put("b", Some("2"));

        let mut cursor = attrs.cursor();
        cursor.next(&attrs).unwrap();
        attrs.put("a", Some("changed"));
        assert_eq!(cursor.next(&attrs).unwrap().unwrap().key(), "b");
    }

    #[test]
    fn test_cursor_remove() {
        let mut attrs = Attributes::new();
        attrs
            .put("a", Some("1"))
            .put("b", Some("2"))
            .put("c", Some("3"))
            .put("d", Some("4"));

        let mut cursor = attrs.cursor();
        let mut seen = Vec::new();
        while let Some(attr) = cursor.next(&attrs).unwrap() {
            seen.push(attr.key().to_string());
            if attr.key() == "b" || attr.key() == "c" {
                cursor.remove(&mut attrs).unwrap();
            }
        }
        assert_eq!(seen, ["a", "b", "c", "d"]);
        let left: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(left, ["a", "d"]);
    }

    #[test]
    fn test_cursor_remove_skips_internal_entry_after_has_next() {
        let mut attrs = Attributes::new();
        attrs.put("a", Some("1"));
        attrs.set_user_data("seen", Some(serde_json::json!(true)));
        attrs.put("b", Some("2"));

        let mut cursor = attrs.cursor();
        assert_eq!(cursor.next(&attrs).unwrap().unwrap().key(), "a");
        assert!(cursor.has_next(&attrs).unwrap());
        cursor.remove(&mut attrs).unwrap();

        assert!(!attrs.has_key("a"));
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.user_data("seen"), Some(&serde_json::json!(true)));
        assert_eq!(cursor.next(&attrs).unwrap().unwrap().key(), "b");
        assert!(cursor.next(&attrs).unwrap().is_none());
    }

    #[test]
    fn test_cursor_remove_twice_fails() {
        let mut attrs = Attributes::new();
        attrs.put("a", Some("1")).put("b", Some("2"));

        let mut cursor = attrs.cursor();
        cursor.next(&attrs).unwrap();
        cursor.next(&attrs).unwrap();
        cursor.remove(&mut attrs).unwrap();
        assert!(matches!(
            cursor.remove(&mut attrs),
            Err(TreeError::Precondition(_))
        ));
        assert_eq!(attrs.len(), 1);
        assert!(attrs.has_key("a"));
    }

    #[test]
    fn test_put_attribute() {
        let mut attrs = Attributes::new();
        attrs.put("href", Some("/old"));
        attrs
            .put_attribute(&Attribute::new("href", "/new"))
            .put_attribute(&Attribute::boolean("hidden"));

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("href"), "/new");
        assert!(attrs.has_key("hidden"));
        assert!(!attrs.has_declared_value("hidden"));
    }

    #[test]
    fn test_cursor_remove_before_next() {
        let mut attrs = Attributes::new();
        attrs.put("a", Some("1"));
        let mut cursor = attrs.cursor();
        assert!(matches!(
            cursor.remove(&mut attrs),
            Err(TreeError::Precondition(_))
        ));
    }

    #[test]
    fn test_internal_keys_hidden() {
        let mut attrs = Attributes::new();
        attrs.put("id", Some("x"));
        attrs.set_user_data("engine", Some(serde_json::json!("ref")));
        let index = LineIndex::new("<p id=x>");
        let range = AttributeRange::new(index.range(3, 5), index.range(6, 7));
        attrs.set_source_range("id", range);

        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.iter().count(), 1);
        assert_eq!(attrs.as_list().len(), 1);
        assert_eq!(attrs.html(), " id=\"x\"");
        assert_eq!(attrs.user_data("engine"), Some(&serde_json::json!("ref")));
        assert_eq!(attrs.source_range("id"), range);
        assert_eq!(attrs.source_range("missing"), AttributeRange::UNTRACKED);

        let mut cursor = attrs.cursor();
        assert_eq!(cursor.next(&attrs).unwrap().unwrap().key(), "id");
        assert!(cursor.next(&attrs).unwrap().is_none());
    }

    #[test]
    fn test_user_data_lazy() {
        let mut attrs = Attributes::new();
        attrs.set_user_data("k", None);
        assert!(!attrs.has_user_data());
        assert!(attrs.user_data("k").is_none());

        attrs.set_user_data("k", Some(serde_json::json!(1)));
        assert!(attrs.has_user_data());
        attrs.set_user_data("k", None);
        assert!(attrs.user_data("k").is_none());
    }

    #[test]
    fn test_untracked_source_range_for_untracked_key() {
        let mut attrs = Attributes::new();
        attrs.put("a", Some("1"));
        assert_eq!(attrs.source_range("a"), AttributeRange::UNTRACKED);
        assert!(!attrs.source_range("a").name.is_tracked());
        assert_eq!(attrs.source_range("a").value, Range::UNTRACKED);
    }

    #[test]
    fn test_html_and_dataset() {
        let mut attrs = Attributes::new();
        attrs
            .put("data-user-id", Some("7"))
            .put("title", Some("a \"q\""))
            .put("disabled", None)
            .put("bad key", Some("v"));

        assert_eq!(
            attrs.html(),
            " data-user-id=\"7\" title=\"a &quot;q&quot;\" disabled bad_key=\"v\""
        );
        let data: Vec<_> = attrs.dataset().collect();
        assert_eq!(data, [("user-id", "7")]);
    }

    #[test]
    fn test_add_all_and_normalize() {
        let mut a = Attributes::new();
        a.put("ID", Some("1"));
        let mut b = Attributes::new();
        b.put("ID", Some("2")).put("Class", Some("c"));
        b.set_user_data("x", Some(serde_json::json!(true)));

        a.add_all(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("ID"), "2");
        assert!(!a.has_user_data());

        a.normalize();
        assert!(a.has_key("id"));
        assert!(a.has_key("class"));
    }
}
