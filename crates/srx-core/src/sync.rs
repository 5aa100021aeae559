// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph reconciliation engine.
//!
//! Walks a destination pool (freshly reflected from live memory) against a
//! source pool (decoded from bytes), resolving each source member to a
//! destination member and writing primitive values back into live memory.
//! The walk is driven by the source's member lists and gated by the
//! destination's version windows and type descriptors, so structural drift
//! (renames, reorders, inserted members) is absorbed wherever a resolution
//! rule still applies.
//!
//! Visiting an object removes it from the destination pool. That erasure is
//! the sole cycle-breaking mechanism: a second traversal through the same
//! destination UID finds nothing and returns, so cyclic host graphs terminate
//! after visiting each destination object at most once. The destination pool
//! is consumed by a sync; the source pool is never mutated.

use std::ptr;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::codec::value;
use crate::error::ArchiveError;
use crate::member::Member;
use crate::object::Object;
use crate::pool::ObjectPool;
use crate::uid::{Uid, UidId};

pub(crate) struct Syncer<'a> {
    dst: &'a mut ObjectPool,
    src: &'a ObjectPool,
}

impl<'a> Syncer<'a> {
    /// Reconciles `src` into `dst`, starting from the two root objects.
    pub(crate) fn run(
        dst: &'a mut ObjectPool,
        dst_root: Uid,
        src: &'a ObjectPool,
        src_root: Uid,
    ) -> Result<(), ArchiveError> {
        let src_obj = src.get(src_root).cloned().ok_or(ArchiveError::NoSourceRoot)?;
        let dst_obj = dst
            .get(dst_root)
            .cloned()
            .ok_or(ArchiveError::NoDestinationRoot)?;
        debug!(
            src_objects = src.len(),
            dst_objects = dst.len(),
            "syncing archives"
        );
        let mut syncer = Syncer { dst, src };
        syncer.sync_object(Some(dst_obj), Some(src_obj))
    }

    fn sync_object(&mut self, dst: Option<Object>, src: Option<Object>) -> Result<(), ArchiveError> {
        // An absent object on either side ends the recursion.
        let (Some(d), Some(s)) = (dst, src) else {
            return Ok(());
        };
        if !d.is_version_compatible_to(&s) {
            return Err(ArchiveError::VersionIncompatible {
                dst_version: d.version(),
                dst_min: d.min_version(),
                src_version: s.version(),
                src_min: s.min_version(),
            });
        }
        if !d.data_type().matches(s.data_type()) {
            return Err(ArchiveError::TypeIncompatible {
                dst: d.data_type().long_descr(),
                src: s.data_type().long_descr(),
            });
        }

        // Mark visited before any recursion; see the module docs.
        self.dst.remove(d.uid());

        let data_type = d.data_type();
        if data_type.is_primitive() && !data_type.is_pointer() {
            return Self::sync_primitive(&d, &s);
        }
        if data_type.is_pointer() {
            return self.sync_pointer(&d, &s);
        }

        debug_assert!(data_type.is_class() || data_type.is_union());
        for src_member in s.members() {
            let Some(dst_member) = Self::match_member(&d, &s, src_member) else {
                return Err(ArchiveError::MissingMember {
                    name: src_member.name().to_owned(),
                });
            };
            trace!(
                member = src_member.name(),
                resolved = dst_member.name(),
                "member resolved"
            );
            self.sync_member(&dst_member, src_member)?;
        }
        Ok(())
    }

    /// The only place in the crate that writes live memory.
    fn sync_primitive(d: &Object, s: &Object) -> Result<(), ArchiveError> {
        let data_type = d.data_type();
        let addr = match d.uid().id {
            UidId::Live(a) => a as usize,
            UidId::Wire(_) => {
                unreachable!("destination primitives always carry live uids")
            }
        };

        if data_type.is_string() {
            let text = String::from_utf8_lossy(s.raw()).into_owned();
            // SAFETY: `addr` is the address of a live `String` field reflected
            // by the enclosing deserialize call, which holds exclusive access
            // to the host value for the whole pass.
            unsafe {
                *(addr as *mut String) = text;
            }
            return Ok(());
        }

        // Enum widths drift across builds; re-encode the stored integer at
        // the destination's width before the byte copy.
        let raw: Bytes = if data_type.is_enum() && s.raw().len() != data_type.size() {
            value::resize_enum_raw(s.raw(), data_type.size())
                .map(Bytes::from)
                .unwrap_or_else(|| s.raw().clone())
        } else {
            s.raw().clone()
        };

        assert_eq!(
            raw.len(),
            data_type.size(),
            "primitive payload width must match the destination type"
        );
        // SAFETY: `addr` is the address of a live primitive field of exactly
        // `data_type.size()` bytes, reflected by the enclosing deserialize
        // call, which holds exclusive access to the host value.
        unsafe {
            ptr::copy_nonoverlapping(raw.as_ptr(), addr as *mut u8, raw.len());
        }
        Ok(())
    }

    fn sync_pointer(&mut self, d: &Object, s: &Object) -> Result<(), ArchiveError> {
        debug_assert!(d.data_type().is_pointer());
        // No pointer rewriting: the live destination pointer already points at
        // a live pointee, reached here through the host's own reflection walk.
        let dst_pointee = d.pointee_uid().and_then(|uid| self.dst.get(uid).cloned());
        let src_pointee = s.pointee_uid().and_then(|uid| self.src.get(uid).cloned());
        self.sync_object(dst_pointee, src_pointee)
    }

    fn sync_member(&mut self, dst_member: &Member, src_member: &Member) -> Result<(), ArchiveError> {
        debug_assert!(dst_member.data_type().matches(src_member.data_type()));
        let d = self.dst.get(dst_member.uid()).cloned();
        let s = self.src.get(src_member.uid()).cloned();
        self.sync_object(d, s)
    }

    /// Structural member resolution, in priority order: exact name (with a
    /// changed type treated as terminally missing), unique type, offset among
    /// same-type candidates, registration sequence index.
    fn match_member(d: &Object, s: &Object, src_member: &Member) -> Option<Member> {
        if let Some(named) = d.member_named(src_member.name()) {
            return if named.data_type().matches(src_member.data_type()) {
                Some(named.clone())
            } else {
                None
            };
        }
        let candidates = d.members_of_type(src_member.data_type());
        match candidates.len() {
            0 => None,
            1 => Some(candidates[0].clone()),
            _ => {
                if let Some(m) = candidates.iter().find(|m| m.offset() == src_member.offset()) {
                    return Some((*m).clone());
                }
                let Some(seq) = s.sequence_index_of(src_member) else {
                    unreachable!("source member must appear in its own member list")
                };
                candidates
                    .into_iter()
                    .find(|m| d.sequence_index_of(m) == Some(seq))
                    .cloned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::{BaseKind, DataType};

    fn class(token: u64, members: Vec<Member>) -> Object {
        let mut obj = Object::new(vec![Uid::wire(token, 16)], DataType::class_named("Host", 16));
        obj.set_members(members);
        obj
    }

    fn int_type() -> DataType {
        DataType::scalar(BaseKind::Int { signed: true }, 4)
    }

    #[test]
    fn name_match_requires_matching_type() {
        let src_member = Member::new("speed", Uid::wire(10, 4), 0, int_type());
        let src = class(1, vec![src_member.clone()]);
        let retyped = Member::new("speed", Uid::wire(20, 8), 0, DataType::scalar(BaseKind::Real, 8));
        let dst = class(2, vec![retyped]);
        assert!(Syncer::match_member(&dst, &src, &src_member).is_none());
    }

    #[test]
    fn unique_type_candidate_survives_a_rename() {
        let src_member = Member::new("width", Uid::wire(10, 4), 0, int_type());
        let src = class(1, vec![src_member.clone()]);
        let renamed = Member::new("w", Uid::wire(20, 4), 0, int_type());
        let dst = class(2, vec![renamed.clone()]);
        assert_eq!(Syncer::match_member(&dst, &src, &src_member), Some(renamed));
    }

    #[test]
    fn offset_breaks_same_type_ties() {
        let src_a = Member::new("a", Uid::wire(10, 4), 0, int_type());
        let src_b = Member::new("b", Uid::wire(11, 4), 4, int_type());
        let src = class(1, vec![src_a, src_b.clone()]);
        let dst_x = Member::new("x", Uid::wire(20, 4), 0, int_type());
        let dst_y = Member::new("y", Uid::wire(21, 4), 4, int_type());
        let dst = class(2, vec![dst_y.clone(), dst_x]);
        assert_eq!(Syncer::match_member(&dst, &src, &src_b), Some(dst_y));
    }

    #[test]
    fn sequence_index_is_the_last_resort() {
        let src_a = Member::new("a", Uid::wire(10, 4), 0, int_type());
        let src_b = Member::new("b", Uid::wire(11, 4), 4, int_type());
        let src = class(1, vec![src_a.clone(), src_b]);
        // Destination offsets share nothing with the source layout.
        let dst_p = Member::new("p", Uid::wire(20, 4), 8, int_type());
        let dst_q = Member::new("q", Uid::wire(21, 4), 12, int_type());
        let dst = class(2, vec![dst_p.clone(), dst_q]);
        assert_eq!(Syncer::match_member(&dst, &src, &src_a), Some(dst_p));
    }

    #[test]
    fn exhausted_candidates_give_up() {
        let src_member = Member::new("a", Uid::wire(10, 4), 0, int_type());
        let src = class(1, vec![src_member.clone()]);
        let dst = class(2, vec![]);
        assert!(Syncer::match_member(&dst, &src, &src_member).is_none());
    }
}
