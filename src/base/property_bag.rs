//! Keyed property bag for attaching analysis facts to syntax nodes.
//!
//! Most nodes carry zero or one property, so storage grows in steps:
//! nothing, a single inline entry, a short list, and finally a hash map once
//! the list would exceed [`MAX_LIST_SIZE`] entries.

use std::any::{Any, TypeId};
use std::fmt;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Past this many entries the bag switches to a hash map.
pub const MAX_LIST_SIZE: usize = 8;

type Value = Box<dyn Any + Send + Sync>;

/// Key of a property: either a Rust type (typed properties) or a name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Type(TypeId),
    Named(SmolStr),
}

impl PropertyKey {
    pub fn of<T: Any>() -> Self {
        PropertyKey::Type(TypeId::of::<T>())
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::Named(SmolStr::new(name))
    }
}

impl From<SmolStr> for PropertyKey {
    fn from(name: SmolStr) -> Self {
        PropertyKey::Named(name)
    }
}

#[derive(Default)]
enum Storage {
    #[default]
    Empty,
    Single(PropertyKey, Value),
    List(Vec<(PropertyKey, Value)>),
    Map(FxHashMap<PropertyKey, Value>),
}

/// Association of keys to arbitrary values.
#[derive(Default)]
pub struct PropertyCollection {
    storage: Storage,
}

impl PropertyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value under the same key.
    pub fn set<V: Any + Send + Sync>(&mut self, key: impl Into<PropertyKey>, value: V) {
        self.insert_boxed(key.into(), Box::new(value));
    }

    /// Set a property keyed by the value's own type.
    pub fn set_typed<T: Any + Send + Sync>(&mut self, value: T) {
        self.insert_boxed(PropertyKey::of::<T>(), Box::new(value));
    }

    fn insert_boxed(&mut self, key: PropertyKey, value: Value) {
        match std::mem::take(&mut self.storage) {
            Storage::Empty => self.storage = Storage::Single(key, value),
            Storage::Single(existing, old) => {
                self.storage = if existing == key {
                    Storage::Single(key, value)
                } else {
                    Storage::List(vec![(existing, old), (key, value)])
                };
            }
            Storage::List(mut items) => {
                if let Some(slot) = items.iter_mut().find(|(k, _)| *k == key) {
                    slot.1 = value;
                    self.storage = Storage::List(items);
                } else if items.len() < MAX_LIST_SIZE {
                    items.push((key, value));
                    self.storage = Storage::List(items);
                } else {
                    let mut map: FxHashMap<_, _> = items.into_iter().collect();
                    map.insert(key, value);
                    self.storage = Storage::Map(map);
                }
            }
            Storage::Map(mut map) => {
                map.insert(key, value);
                self.storage = Storage::Map(map);
            }
        }
    }

    /// Get a property value.
    pub fn get(&self, key: &PropertyKey) -> Option<&(dyn Any + Send + Sync)> {
        match &self.storage {
            Storage::Empty => None,
            Storage::Single(k, v) => (k == key).then_some(v.as_ref()),
            Storage::List(items) => items.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_ref()),
            Storage::Map(map) => map.get(key).map(|v| v.as_ref()),
        }
    }

    fn get_mut(&mut self, key: &PropertyKey) -> Option<&mut (dyn Any + Send + Sync)> {
        match &mut self.storage {
            Storage::Empty => None,
            Storage::Single(k, v) => {
                if *k == *key {
                    Some(v.as_mut())
                } else {
                    None
                }
            }
            Storage::List(items) => items
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_mut()),
            Storage::Map(map) => map.get_mut(key).map(|v| v.as_mut()),
        }
    }

    /// Get a named property downcast to `V`.
    pub fn get_as<V: Any>(&self, key: impl Into<PropertyKey>) -> Option<&V> {
        self.get(&key.into()).and_then(|v| v.downcast_ref::<V>())
    }

    pub fn get_typed<T: Any>(&self) -> Option<&T> {
        self.get(&PropertyKey::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_typed_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.get_mut(&PropertyKey::of::<T>())
            .and_then(|v| v.downcast_mut::<T>())
    }

    /// Remove a property. Returns `true` if it was present.
    pub fn remove(&mut self, key: &PropertyKey) -> bool {
        match std::mem::take(&mut self.storage) {
            Storage::Empty => false,
            Storage::Single(k, v) => {
                if k == *key {
                    true
                } else {
                    self.storage = Storage::Single(k, v);
                    false
                }
            }
            Storage::List(mut items) => {
                let before = items.len();
                items.retain(|(k, _)| k != key);
                let removed = items.len() != before;
                if !items.is_empty() {
                    self.storage = Storage::List(items);
                }
                removed
            }
            Storage::Map(mut map) => {
                let removed = map.remove(key).is_some();
                self.storage = if map.len() <= MAX_LIST_SIZE {
                    Storage::List(map.into_iter().collect())
                } else {
                    Storage::Map(map)
                };
                removed
            }
        }
    }

    pub fn remove_typed<T: Any>(&mut self) -> bool {
        self.remove(&PropertyKey::of::<T>())
    }

    pub fn clear(&mut self) {
        self.storage = Storage::Empty;
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Empty => 0,
            Storage::Single(..) => 1,
            Storage::List(items) => items.len(),
            Storage::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn uses_map(&self) -> bool {
        matches!(self.storage, Storage::Map(_))
    }
}

impl fmt::Debug for PropertyCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyCollection")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Resolved(u32);

    #[test]
    fn test_single_property() {
        let mut bag = PropertyCollection::new();
        assert!(bag.is_empty());

        bag.set("depth", 3usize);
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get_as::<usize>("depth"), Some(&3));

        bag.set("depth", 4usize);
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get_as::<usize>("depth"), Some(&4));
    }

    #[test]
    fn test_typed_property() {
        let mut bag = PropertyCollection::new();
        bag.set_typed(Resolved(7));
        bag.set("other", true);

        assert_eq!(bag.get_typed::<Resolved>(), Some(&Resolved(7)));
        bag.get_typed_mut::<Resolved>().unwrap().0 = 9;
        assert_eq!(bag.get_typed::<Resolved>(), Some(&Resolved(9)));

        assert!(bag.remove_typed::<Resolved>());
        assert!(!bag.remove_typed::<Resolved>());
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_wrong_downcast_is_none() {
        let mut bag = PropertyCollection::new();
        bag.set("n", 1u8);
        assert!(bag.get_as::<u32>("n").is_none());
        assert!(bag.get_as::<u8>("missing").is_none());
    }

    #[test]
    fn test_upgrade_and_downgrade() {
        let mut bag = PropertyCollection::new();
        for i in 0..=MAX_LIST_SIZE {
            bag.set(format!("k{i}").as_str(), i);
        }
        assert_eq!(bag.len(), MAX_LIST_SIZE + 1);
        assert!(bag.uses_map());
        assert_eq!(bag.get_as::<usize>("k0"), Some(&0));

        assert!(bag.remove(&"k0".into()));
        assert!(!bag.uses_map());
        assert_eq!(bag.len(), MAX_LIST_SIZE);
        assert_eq!(bag.get_as::<usize>("k8"), Some(&8));
    }

    #[test]
    fn test_remove_last_from_list_empties() {
        let mut bag = PropertyCollection::new();
        bag.set("a", 1);
        bag.set("b", 2);
        assert!(bag.remove(&"a".into()));
        assert!(bag.remove(&"b".into()));
        assert!(bag.is_empty());

        bag.set("c", 3);
        bag.clear();
        assert_eq!(bag.len(), 0);
    }
}
