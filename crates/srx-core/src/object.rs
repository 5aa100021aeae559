// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reflective object instances.
//!
//! An [`Object`] is the image of one live datum: its type descriptor, UID
//! chain, version window, member list (classes), and raw primitive value
//! image (primitives). Objects are created by the reflection pass or by the
//! decoder and mutated only through the archive's mutator surface.

use std::cmp::Ordering;

use bytes::Bytes;

use crate::data_type::DataType;
use crate::member::Member;
use crate::uid::{Uid, UidChain, NO_UID};

/// Version stamp of a serialized object. Both bounds default to 0.
pub type Version = u32;

/// Reflective image of a single live datum.
#[derive(Clone, Debug)]
pub struct Object {
    data_type: DataType,
    uid_chain: UidChain,
    version: Version,
    min_version: Version,
    raw: Bytes,
    members: Vec<Member>,
}

impl Object {
    /// Builds an object for the given chain and type. The chain must carry at
    /// least the datum's own UID.
    #[must_use]
    pub fn new(uid_chain: UidChain, data_type: DataType) -> Self {
        debug_assert!(!uid_chain.is_empty(), "uid chain must not be empty");
        Self {
            data_type,
            uid_chain,
            version: 0,
            min_version: 0,
            raw: Bytes::new(),
            members: Vec::new(),
        }
    }

    /// Head UID of the datum itself.
    #[must_use]
    pub fn uid(&self) -> Uid {
        self.uid_chain.first().copied().unwrap_or(NO_UID)
    }

    /// UID of the pointee, present for non-null pointer datums.
    #[must_use]
    pub fn pointee_uid(&self) -> Option<Uid> {
        self.uid_chain.get(1).copied()
    }

    /// Full UID chain.
    #[must_use]
    pub fn uid_chain(&self) -> &[Uid] {
        &self.uid_chain
    }

    /// Type descriptor of the datum.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub(crate) fn data_type_mut(&mut self) -> &mut DataType {
        &mut self.data_type
    }

    /// Raw native byte image of a primitive value; empty for composites.
    #[must_use]
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub(crate) fn set_raw(&mut self, raw: Bytes) {
        self.raw = raw;
    }

    /// Version this object was written at.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Stamps the object's version.
    pub fn set_version(&mut self, v: Version) {
        self.version = v;
    }

    /// Oldest version this object remains compatible with.
    #[must_use]
    pub fn min_version(&self) -> Version {
        self.min_version
    }

    /// Stamps the object's minimum compatible version.
    pub fn set_min_version(&mut self, v: Version) {
        self.min_version = v;
    }

    /// Version window check between a destination and a source object.
    ///
    /// Equal versions are compatible; otherwise the newer side must declare a
    /// minimum that still covers the older side's version.
    #[must_use]
    pub fn is_version_compatible_to(&self, other: &Self) -> bool {
        if self.version == other.version {
            true
        } else if self.version > other.version {
            self.min_version <= other.version
        } else {
            other.min_version <= self.version
        }
    }

    /// Registered members, in canonical registration order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Appends a member record, preserving registration order.
    pub(crate) fn push_member(&mut self, member: Member) {
        self.members.push(member);
    }

    pub(crate) fn set_members(&mut self, members: Vec<Member>) {
        self.members = members;
    }

    /// Removes the first member record equal to `member`, if any.
    pub fn remove_member(&mut self, member: &Member) {
        if let Some(pos) = self.members.iter().position(|m| m == member) {
            self.members.remove(pos);
        }
    }

    /// First member with the given name.
    #[must_use]
    pub fn member_named(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// First member referring to the given UID.
    #[must_use]
    pub fn member_by_uid(&self, uid: Uid) -> Option<&Member> {
        self.members.iter().find(|m| m.uid() == uid)
    }

    /// All members whose type structurally matches `data_type`.
    #[must_use]
    pub fn members_of_type(&self, data_type: &DataType) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| m.data_type().matches(data_type))
            .collect()
    }

    /// Position of `member` in the canonical registration sequence.
    #[must_use]
    pub fn sequence_index_of(&self, member: &Member) -> Option<usize> {
        self.members.iter().position(|m| m == member)
    }
}

// Identity compares the UID chain and type only; versions, members, and raw
// payloads are projections of the same datum, not part of its identity.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.uid_chain == other.uid_chain && self.data_type == other.data_type
    }
}

impl Eq for Object {}

impl PartialOrd for Object {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Object {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.uid_chain, &self.data_type).cmp(&(&other.uid_chain, &other.data_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::BaseKind;

    fn int_obj(token: u64) -> Object {
        Object::new(
            vec![Uid::wire(token, 4)],
            DataType::scalar(BaseKind::Int { signed: true }, 4),
        )
    }

    #[test]
    fn version_window_table() {
        let mut d = int_obj(1);
        let mut s = int_obj(2);

        // Equal versions are always compatible.
        assert!(d.is_version_compatible_to(&s));

        // Destination newer: its min must cover the source.
        d.set_version(3);
        d.set_min_version(2);
        s.set_version(2);
        assert!(d.is_version_compatible_to(&s));
        s.set_version(1);
        assert!(!d.is_version_compatible_to(&s));

        // Source newer: symmetric rule.
        d.set_version(1);
        d.set_min_version(0);
        s.set_version(4);
        s.set_min_version(1);
        assert!(d.is_version_compatible_to(&s));
        s.set_min_version(2);
        assert!(!d.is_version_compatible_to(&s));
    }

    #[test]
    fn identity_ignores_versions_and_members() {
        let mut a = int_obj(7);
        let b = int_obj(7);
        a.set_version(9);
        a.push_member(Member::new(
            "x",
            Uid::wire(8, 4),
            0,
            DataType::scalar(BaseKind::Bool, 1),
        ));
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn member_queries_respect_registration_order() {
        let t = DataType::scalar(BaseKind::Int { signed: true }, 4);
        let mut obj = Object::new(vec![Uid::wire(1, 8)], DataType::class_named("Probe", 8));
        let m0 = Member::new("a", Uid::wire(10, 4), 0, t.clone());
        let m1 = Member::new("b", Uid::wire(11, 4), 4, t.clone());
        obj.push_member(m0.clone());
        obj.push_member(m1.clone());

        assert_eq!(obj.member_named("b"), Some(&m1));
        assert_eq!(obj.member_by_uid(Uid::wire(10, 4)), Some(&m0));
        assert_eq!(obj.members_of_type(&t).len(), 2);
        assert_eq!(obj.sequence_index_of(&m1), Some(1));

        obj.remove_member(&m0);
        assert_eq!(obj.sequence_index_of(&m1), Some(0));
        assert!(obj.member_named("a").is_none());
    }

    #[test]
    fn pointee_uid_reads_the_second_chain_entry() {
        let chain = vec![Uid::wire(1, 8), Uid::wire(2, 4)];
        let obj = Object::new(
            chain,
            DataType::scalar(BaseKind::Int { signed: true }, 4).pointer_to(),
        );
        assert_eq!(obj.pointee_uid(), Some(Uid::wire(2, 4)));
        assert_eq!(int_obj(3).pointee_uid(), None);
    }
}
