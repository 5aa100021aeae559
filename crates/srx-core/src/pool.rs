// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! UID-keyed object store.

use std::collections::BTreeMap;

use crate::object::Object;
use crate::uid::Uid;

/// Owning store mapping each object's head UID to the object.
///
/// Iteration is deterministic (ascending UID), which fixes the encoding order
/// of the wire format. Invalid UIDs can never become keys: inserting an object
/// whose head UID is invalid is a no-op, so the store never aliases the
/// invalid sentinel.
#[derive(Debug, Clone, Default)]
pub struct ObjectPool {
    objects: BTreeMap<Uid, Object>,
}

impl ObjectPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `obj` keyed by its head UID.
    ///
    /// Rejected when the head UID is invalid. An already-present object is
    /// kept (first registration wins); returns `true` when the object was
    /// actually stored.
    pub fn insert(&mut self, obj: Object) -> bool {
        let key = obj.uid();
        if !key.is_valid() || self.objects.contains_key(&key) {
            return false;
        }
        self.objects.insert(key, obj);
        true
    }

    /// Looks up the object for `uid`.
    #[must_use]
    pub fn get(&self, uid: Uid) -> Option<&Object> {
        self.objects.get(&uid)
    }

    /// Mutable lookup.
    #[must_use]
    pub fn get_mut(&mut self, uid: Uid) -> Option<&mut Object> {
        self.objects.get_mut(&uid)
    }

    /// `true` when an object with `uid` is present.
    #[must_use]
    pub fn contains(&self, uid: Uid) -> bool {
        self.objects.contains_key(&uid)
    }

    /// Removes and returns the object for `uid`.
    pub fn remove(&mut self, uid: Uid) -> Option<Object> {
        self.objects.remove(&uid)
    }

    /// Removes every object.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// `true` when the pool holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterates objects in ascending UID order.
    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::{BaseKind, DataType};
    use crate::uid::NO_UID;

    fn obj(token: u64) -> Object {
        Object::new(
            vec![Uid::wire(token, 4)],
            DataType::scalar(BaseKind::Int { signed: true }, 4),
        )
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let mut pool = ObjectPool::new();
        let invalid = Object::new(vec![NO_UID], DataType::scalar(BaseKind::Bool, 1));
        assert!(!pool.insert(invalid));
        assert!(pool.is_empty());
        assert!(pool.get(NO_UID).is_none());
    }

    #[test]
    fn first_registration_wins() {
        let mut pool = ObjectPool::new();
        assert!(pool.insert(obj(5)));
        let mut replacement = obj(5);
        replacement.set_version(3);
        assert!(!pool.insert(replacement));
        assert_eq!(pool.get(Uid::wire(5, 4)).map(Object::version), Some(0));
    }

    #[test]
    fn iteration_is_ascending_by_uid() {
        let mut pool = ObjectPool::new();
        for token in [9, 2, 7, 4] {
            pool.insert(obj(token));
        }
        let tokens: Vec<u64> = pool.iter().map(|o| o.uid().id.token()).collect();
        assert_eq!(tokens, vec![2, 4, 7, 9]);
    }

    #[test]
    fn remove_and_clear() {
        let mut pool = ObjectPool::new();
        pool.insert(obj(1));
        pool.insert(obj(2));
        assert!(pool.remove(Uid::wire(1, 4)).is_some());
        assert!(pool.remove(Uid::wire(1, 4)).is_none());
        assert_eq!(pool.len(), 1);
        pool.clear();
        assert!(pool.is_empty());
    }
}
