use std::collections::HashMap;

use crate::object::{AllocMode, DictIndex, Object};

/// A resolved dictionary key.
///
/// String-typed keys (literals, text and hex strings) are addressed by
/// their raw bytes. Numeric and boolean keys are canonicalized into a
/// printed form (`true`/`false`, decimal integers, fixed six-decimal
/// reals), so `1` and `1.0` are distinct keys. Other object types cannot
/// be used as keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum DictKey {
    Str(Vec<u8>),
    Scalar(String),
}

impl DictKey {
    pub fn from_scalar(obj: &Object) -> Option<DictKey> {
        match obj {
            Object::Bool(b) => Some(DictKey::Scalar(String::from(if *b {
                "true"
            } else {
                "false"
            }))),
            Object::Integer(n) => Some(DictKey::Scalar(format!("{}", n))),
            Object::Real(n) => Some(DictKey::Scalar(format!("{:.6}", n))),
            _ => None,
        }
    }
}

/// A user dictionary: two maps, one per key family
#[derive(Debug, Clone)]
pub(crate) struct DictObject {
    by_string: HashMap<Vec<u8>, Object>,
    by_scalar: HashMap<String, Object>,
    capacity: usize,
    alloc: AllocMode,
}

impl DictObject {
    pub fn new(capacity: usize, alloc: AllocMode) -> Self {
        Self {
            by_string: HashMap::new(),
            by_scalar: HashMap::new(),
            capacity,
            alloc,
        }
    }

    pub fn len(&self) -> usize {
        self.by_string.len() + self.by_scalar.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn alloc(&self) -> AllocMode {
        self.alloc
    }

    /// Inserts or replaces. A key that cannot be canonicalized is
    /// silently discarded.
    pub fn insert(&mut self, key: Option<DictKey>, value: Object) {
        match key {
            Some(DictKey::Str(bytes)) => {
                self.by_string.insert(bytes, value);
            }
            Some(DictKey::Scalar(repr)) => {
                self.by_scalar.insert(repr, value);
            }
            None => {}
        }
    }

    pub fn get(&self, key: &DictKey) -> Option<&Object> {
        match key {
            DictKey::Str(bytes) => self.by_string.get(bytes),
            DictKey::Scalar(repr) => self.by_scalar.get(repr),
        }
    }

    /// Lookup by executable-name bytes, used during name resolution
    pub fn get_name(&self, name: &[u8]) -> Option<&Object> {
        self.by_string.get(name)
    }

    pub fn contains(&self, key: &DictKey) -> bool {
        self.get(key).is_some()
    }

    pub fn string_entries(&self) -> impl Iterator<Item = (&Vec<u8>, &Object)> {
        self.by_string.iter()
    }

    pub fn scalar_entries(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.by_scalar.iter()
    }
}

/// One level of the dictionary stack. The system dictionary is a read-only
/// view over the operator table, so it has no arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StackDict {
    User(DictIndex),
    System,
}

/// The scope chain. The permanent local dictionary sits below every
/// entry pushed by `begin` and can never be popped; the system dictionary
/// is consulted after all of these during lookup.
#[derive(Debug, Clone)]
pub(crate) struct DictStack {
    /// Dictionaries pushed by `begin`, last entry innermost
    pub stack: Vec<StackDict>,
    pub local: DictIndex,
}

impl DictStack {
    pub fn new(local: DictIndex) -> Self {
        Self {
            stack: Vec::new(),
            local,
        }
    }

    /// The dictionary `def` stores into
    pub fn current(&self) -> StackDict {
        self.stack
            .last()
            .copied()
            .unwrap_or(StackDict::User(self.local))
    }

    pub fn push(&mut self, dict: StackDict) {
        self.stack.push(dict);
    }

    /// False when no `begin` frame remains; the local dictionary itself is
    /// not pop-able
    #[must_use]
    pub fn pop(&mut self) -> bool {
        self.stack.pop().is_some()
    }

    /// Innermost-first iteration over the user-visible scopes, ending with
    /// the local dictionary
    pub fn scopes(&self) -> impl Iterator<Item = StackDict> + '_ {
        self.stack
            .iter()
            .rev()
            .copied()
            .chain(std::iter::once(StackDict::User(self.local)))
    }
}

/// Snapshot taken by `save`: a deep copy of every user dictionary on the
/// stack plus the local dictionary. The paired graphics snapshot is kept
/// on the graphics-state stack by the accompanying `gsave`.
#[derive(Debug, Clone)]
pub(crate) struct SavedState {
    pub stack: Vec<StackDict>,
    pub local: DictIndex,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::object::ArenaKey;

    #[test]
    fn scalar_keys_canonicalize() {
        assert_eq!(
            DictKey::from_scalar(&Object::Integer(1)),
            Some(DictKey::Scalar(String::from("1")))
        );
        assert_eq!(
            DictKey::from_scalar(&Object::Real(1.0)),
            Some(DictKey::Scalar(String::from("1.000000")))
        );
        assert_eq!(
            DictKey::from_scalar(&Object::Bool(true)),
            Some(DictKey::Scalar(String::from("true")))
        );
        assert_eq!(DictKey::from_scalar(&Object::Null), None);
    }

    #[test]
    fn integer_and_real_keys_are_distinct() {
        let mut dict = DictObject::new(4, AllocMode::Local);

        dict.insert(DictKey::from_scalar(&Object::Integer(1)), Object::Integer(10));
        dict.insert(DictKey::from_scalar(&Object::Real(1.0)), Object::Integer(20));

        assert_eq!(dict.len(), 2);
        assert_eq!(
            dict.get(&DictKey::from_scalar(&Object::Integer(1)).unwrap()),
            Some(&Object::Integer(10))
        );
    }

    #[test]
    fn insert_replaces_existing_key() {
        let mut dict = DictObject::new(4, AllocMode::Local);
        let key = DictKey::Str(b"x".to_vec());

        dict.insert(Some(key.clone()), Object::Integer(1));
        dict.insert(Some(key.clone()), Object::Integer(2));

        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get(&key), Some(&Object::Integer(2)));
    }

    #[test]
    fn unusable_keys_are_dropped() {
        let mut dict = DictObject::new(4, AllocMode::Local);

        dict.insert(DictKey::from_scalar(&Object::File), Object::Integer(1));

        assert_eq!(dict.len(), 0);
    }

    #[test]
    fn scope_order_ends_at_local() {
        let local = DictIndex::from_usize(0);
        let inner = DictIndex::from_usize(1);
        let outer = DictIndex::from_usize(2);

        let mut stack = DictStack::new(local);
        stack.push(StackDict::User(outer));
        stack.push(StackDict::User(inner));

        let order: Vec<_> = stack.scopes().collect();
        assert_eq!(
            order,
            vec![
                StackDict::User(inner),
                StackDict::User(outer),
                StackDict::User(local),
            ]
        );

        assert_eq!(stack.current(), StackDict::User(inner));
        assert!(stack.pop());
        assert!(stack.pop());
        assert!(!stack.pop());
        assert_eq!(stack.current(), StackDict::User(local));
    }
}
