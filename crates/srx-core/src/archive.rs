// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Archive container and host-facing entry points.
//!
//! An [`Archive`] is the destination container for serialization and the
//! source container for deserialization. Serializing reflects the host's
//! object graph into a UID-keyed pool and encodes it; deserializing reflects
//! a fresh destination graph from live memory and lets the syncer reconcile
//! the decoded source graph into it.
//!
//! ```ignore
//! use srx_core::Archive;
//!
//! // Sender
//! let mut ar = Archive::new();
//! ar.serialize(&probe);
//! send(ar.raw_data());
//!
//! // Receiver (possibly a different build of the program)
//! let mut ar = Archive::from_bytes(&received)?;
//! ar.deserialize(&mut probe)?;
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::codec::{read, value, write, MAGIC};
use crate::error::ArchiveError;
use crate::member::Member;
use crate::object::{Object, Version};
use crate::pool::ObjectPool;
use crate::reflect::Field;
use crate::sync::Syncer;
use crate::uid::{Uid, NO_UID};

/// Pass the archive is currently driving. Host registration routines may
/// branch on it, though most never need to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    /// No pass in progress.
    #[default]
    None,
    /// Reflecting and encoding live state.
    Serialize,
    /// Reflecting a destination and syncing decoded state into it.
    Deserialize,
}

/// Time base tag for calendar projections of the archive timestamps.
///
/// The core stores plain seconds since the Unix epoch; projecting them into
/// civil time is left to adapters layered on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBase {
    /// Project into the host's local time zone.
    Local,
    /// Project into coordinated universal time.
    Utc,
}

/// Destination container for serialization, source container for
/// deserialization.
///
/// Not safe for concurrent use; every operation completes before returning.
#[derive(Debug, Default)]
pub struct Archive {
    objects: ObjectPool,
    operation: Operation,
    root: Uid,
    raw_data: Vec<u8>,
    modified: bool,
    name: String,
    comment: String,
    time_created: u64,
    time_modified: u64,
}

impl Archive {
    /// Creates an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes an archive from a byte stream.
    ///
    /// # Errors
    ///
    /// Any decode failure from the taxonomy in [`ArchiveError`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, ArchiveError> {
        let mut archive = Self::new();
        archive.decode(data)?;
        Ok(archive)
    }

    /// Replaces this archive's state with the graph decoded from `data`.
    ///
    /// # Errors
    ///
    /// Any decode failure from the taxonomy in [`ArchiveError`].
    pub fn decode(&mut self, data: &[u8]) -> Result<(), ArchiveError> {
        let decoded = read::decode_archive(data)?;
        self.objects = decoded.objects;
        self.root = decoded.root;
        self.name = decoded.name;
        self.comment = decoded.comment;
        self.time_created = decoded.time_created;
        self.time_modified = decoded.time_modified;
        self.raw_data = data.to_vec();
        self.operation = Operation::None;
        self.modified = false;
        Ok(())
    }

    /// Reflects the host graph reachable from `root` and encodes it.
    ///
    /// Any previously held object graph is discarded first.
    pub fn serialize<T: Field>(&mut self, root: &T) {
        self.operation = Operation::Serialize;
        self.objects.clear();
        self.raw_data.clear();
        self.root = Uid::of(root);
        root.register(self);
        self.ensure_reflected(root);
        self.encode();
        self.operation = Operation::None;
    }

    /// Reconciles this archive's decoded graph into the live host graph
    /// reachable from `root`.
    ///
    /// The destination is reflected from `root` with the operation flag set
    /// to [`Operation::Deserialize`] (the host's registration routine is the
    /// same for both directions), then the syncer writes decoded primitive
    /// values into live memory. On error the already-written primitives keep
    /// their new values; the rest of the host graph is untouched.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::NoSourceRoot`] / [`ArchiveError::NoDestinationRoot`]
    /// when either side lacks a root, and the sync failures
    /// ([`ArchiveError::VersionIncompatible`],
    /// [`ArchiveError::TypeIncompatible`], [`ArchiveError::MissingMember`]).
    pub fn deserialize<T: Field>(&mut self, root: &mut T) -> Result<(), ArchiveError> {
        self.operation = Operation::Deserialize;
        let mut dst = Archive::new();
        dst.operation = Operation::Deserialize;
        {
            let reflected: &T = root;
            dst.root = Uid::of(reflected);
            reflected.register(&mut dst);
            dst.ensure_reflected(reflected);
        }
        let result = Syncer::run(&mut dst.objects, dst.root, &self.objects, self.root);
        self.operation = Operation::None;
        result
    }

    /// Registers one field of `parent` with the archive.
    ///
    /// Called by host registration routines, once per field, in declaration
    /// order; the registration sequence becomes the canonical member order
    /// used for structural tie-breaking. Creates the parent's object on first
    /// use, appends the member record, and on the field's first appearance
    /// creates its object and descends into nested structure.
    pub fn serialize_member<P: Field, F: Field>(&mut self, parent: &P, field: &F, name: &str) {
        let parent_addr = parent as *const P as usize;
        let field_addr = field as *const F as usize;
        let offset = field_addr.wrapping_sub(parent_addr);

        let chain = field.uid_chain();
        let field_type = F::data_type();
        let member = Member::new(name, chain[0], offset, field_type.clone());

        let parent_uid = Uid::of(parent);
        if !self.objects.contains(parent_uid) {
            self.objects
                .insert(Object::new(parent.uid_chain(), P::data_type()));
        }
        if let Some(parent_obj) = self.objects.get_mut(parent_uid) {
            parent_obj.push_member(member);
        }

        if !self.objects.contains(chain[0]) {
            let mut obj = Object::new(chain, field_type);
            obj.set_raw(Bytes::from(field.value_bytes()));
            self.objects.insert(obj);
            // Descend only on first appearance; a revisit through a cyclic
            // pointer stops here.
            field.register(self);
        }
    }

    /// Stamps the version of `parent`'s object, creating it if the host
    /// stamps before registering any field.
    pub fn set_version<P: Field>(&mut self, parent: &P, version: Version) {
        self.ensure_reflected(parent);
        if let Some(obj) = self.objects.get_mut(Uid::of(parent)) {
            obj.set_version(version);
        }
        self.modified = true;
    }

    /// Stamps the minimum compatible version of `parent`'s object.
    pub fn set_min_version<P: Field>(&mut self, parent: &P, version: Version) {
        self.ensure_reflected(parent);
        if let Some(obj) = self.objects.get_mut(Uid::of(parent)) {
            obj.set_min_version(version);
        }
        self.modified = true;
    }

    /// Creates the object for `datum` when the registration pass did not
    /// (primitive roots register no members).
    fn ensure_reflected<T: Field>(&mut self, datum: &T) {
        let uid = Uid::of(datum);
        if !self.objects.contains(uid) {
            let mut obj = Object::new(datum.uid_chain(), T::data_type());
            obj.set_raw(Bytes::from(datum.value_bytes()));
            self.objects.insert(obj);
        }
    }

    /// Encoded byte stream, re-encoded lazily when the archive was mutated.
    pub fn raw_data(&mut self) -> &[u8] {
        if self.modified {
            self.encode();
        }
        &self.raw_data
    }

    /// Name of the wire format (the magic prefix).
    #[must_use]
    pub fn raw_data_format(&self) -> &'static str {
        MAGIC
    }

    /// `true` when the archive changed since the last encode.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Pass currently driven by this archive.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// UID of the root object.
    #[must_use]
    pub fn root(&self) -> Uid {
        self.root
    }

    /// The root object, when present.
    #[must_use]
    pub fn root_object(&self) -> Option<&Object> {
        self.objects.get(self.root)
    }

    /// Looks up an object by UID.
    #[must_use]
    pub fn object_by_uid(&self, uid: Uid) -> Option<&Object> {
        self.objects.get(uid)
    }

    /// Iterates all objects in deterministic (ascending UID) order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter()
    }

    /// Number of objects in the pool.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Free-form archive name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the free-form archive name.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
        self.modified = true;
    }

    /// Free-form archive comment.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Sets the free-form archive comment.
    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.to_owned();
        self.modified = true;
    }

    /// Seconds since the Unix epoch at which this archive was first encoded.
    #[must_use]
    pub fn time_created(&self) -> u64 {
        self.time_created
    }

    /// Seconds since the Unix epoch of the most recent encode.
    #[must_use]
    pub fn time_modified(&self) -> u64 {
        self.time_modified
    }

    /// Removes the object with the given UID from the pool.
    ///
    /// Does not cascade: member records referring to the removed object
    /// become dangling references, which the syncer tolerates.
    pub fn remove(&mut self, uid: Uid) {
        if !uid.is_valid() {
            return;
        }
        self.objects.remove(uid);
        self.modified = true;
    }

    /// Detaches a member record from its parent object.
    ///
    /// The member's own object stays in the pool (an orphan); removal does
    /// not cascade.
    pub fn remove_member(&mut self, parent: Uid, member: &Member) {
        if let Some(parent_obj) = self.objects.get_mut(parent) {
            parent_obj.remove_member(member);
            self.modified = true;
        }
    }

    /// Drops the object graph, root, and cached encoding.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.operation = Operation::None;
        self.root = NO_UID;
        self.raw_data.clear();
        self.modified = false;
    }

    /// Overwrites an integer object's value.
    ///
    /// Pointer objects transparently target their pointee; an absent pointee
    /// makes the call a no-op.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ValueTypeMismatch`] when the object is not an integer.
    pub fn set_int_value(&mut self, uid: Uid, value: i64) -> Result<(), ArchiveError> {
        let Some(obj) = self.objects.get(uid) else {
            return Ok(());
        };
        let data_type = obj.data_type().clone();
        if !data_type.is_integer() {
            return Err(ArchiveError::ValueTypeMismatch {
                requested: "integer",
                actual: data_type.long_descr(),
            });
        }
        let Some(target) = self.value_target(uid) else {
            return Ok(());
        };
        #[allow(clippy::cast_sign_loss)] // the byte image is sign-agnostic
        let bytes = if data_type.is_signed() {
            value::signed_bytes(value, data_type.size())
        } else {
            value::unsigned_bytes(value as u64, data_type.size())
        };
        let Some(bytes) = bytes else {
            unreachable!("integer objects always have a fundamental width")
        };
        if let Some(target_obj) = self.objects.get_mut(target) {
            target_obj.set_raw(Bytes::from(bytes));
        }
        self.modified = true;
        Ok(())
    }

    /// Overwrites a real object's value, narrowing to `real32` when that is
    /// the stored width.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ValueTypeMismatch`] when the object is not a real.
    pub fn set_real_value(&mut self, uid: Uid, value: f64) -> Result<(), ArchiveError> {
        let Some(obj) = self.objects.get(uid) else {
            return Ok(());
        };
        let data_type = obj.data_type().clone();
        if !data_type.is_real() {
            return Err(ArchiveError::ValueTypeMismatch {
                requested: "real",
                actual: data_type.long_descr(),
            });
        }
        let Some(target) = self.value_target(uid) else {
            return Ok(());
        };
        #[allow(clippy::cast_possible_truncation)]
        let bytes = match data_type.size() {
            4 => (value as f32).to_ne_bytes().to_vec(),
            8 => value.to_ne_bytes().to_vec(),
            _ => unreachable!("real objects always have a fundamental width"),
        };
        if let Some(target_obj) = self.objects.get_mut(target) {
            target_obj.set_raw(Bytes::from(bytes));
        }
        self.modified = true;
        Ok(())
    }

    /// Overwrites a boolean object's value.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ValueTypeMismatch`] when the object is not a boolean.
    pub fn set_bool_value(&mut self, uid: Uid, value: bool) -> Result<(), ArchiveError> {
        let Some(obj) = self.objects.get(uid) else {
            return Ok(());
        };
        let data_type = obj.data_type().clone();
        if !data_type.is_bool() {
            return Err(ArchiveError::ValueTypeMismatch {
                requested: "bool",
                actual: data_type.long_descr(),
            });
        }
        let Some(target) = self.value_target(uid) else {
            return Ok(());
        };
        if let Some(target_obj) = self.objects.get_mut(target) {
            target_obj.set_raw(Bytes::from(vec![u8::from(value)]));
        }
        self.modified = true;
        Ok(())
    }

    /// Overwrites an enum object's value, re-stamping the object at the
    /// receiver's native width for `E` so width drift between sender and
    /// receiver is tolerated.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ValueTypeMismatch`] when the object is not an enum.
    pub fn set_enum_value<E: Field>(&mut self, uid: Uid, value: u64) -> Result<(), ArchiveError> {
        let Some(obj) = self.objects.get(uid) else {
            return Ok(());
        };
        let data_type = obj.data_type().clone();
        if !data_type.is_enum() {
            return Err(ArchiveError::ValueTypeMismatch {
                requested: "enum",
                actual: data_type.long_descr(),
            });
        }
        let Some(target) = self.value_target(uid) else {
            return Ok(());
        };
        let width = E::data_type().size();
        let Some(bytes) = value::unsigned_bytes(value, width) else {
            unreachable!("enum widths are fundamental integer widths")
        };
        if let Some(target_obj) = self.objects.get_mut(target) {
            target_obj.data_type_mut().set_size(width);
            target_obj.set_raw(Bytes::from(bytes));
        }
        self.modified = true;
        Ok(())
    }

    /// Overwrites a primitive object's value from text, parsed according to
    /// the object's own type.
    ///
    /// Booleans accept `0`/`false`/`no` as false and anything else as true.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ValueTypeMismatch`] for composite objects,
    /// [`ArchiveError::MalformedInt`] / [`ArchiveError::MalformedReal`] when
    /// the text does not parse.
    pub fn set_auto_value(&mut self, uid: Uid, text: &str) -> Result<(), ArchiveError> {
        let Some(obj) = self.objects.get(uid) else {
            return Ok(());
        };
        let data_type = obj.data_type().clone();
        if !data_type.is_primitive() {
            return Err(ArchiveError::ValueTypeMismatch {
                requested: "primitive",
                actual: data_type.long_descr(),
            });
        }
        let Some(target) = self.value_target(uid) else {
            return Ok(());
        };
        let bytes: Vec<u8> = if data_type.is_integer() || data_type.is_enum() {
            let (negative, magnitude) = value::parse_decimal(text.as_bytes())?;
            let v = if negative {
                magnitude.wrapping_neg()
            } else {
                magnitude
            };
            let Some(bytes) = value::unsigned_bytes(v, data_type.size()) else {
                unreachable!("integer objects always have a fundamental width")
            };
            bytes
        } else if data_type.is_real() {
            let parsed: f64 = text.parse().map_err(|_| ArchiveError::MalformedReal {
                text: text.to_owned(),
            })?;
            #[allow(clippy::cast_possible_truncation)]
            let bytes = match data_type.size() {
                4 => (parsed as f32).to_ne_bytes().to_vec(),
                8 => parsed.to_ne_bytes().to_vec(),
                _ => unreachable!("real objects always have a fundamental width"),
            };
            bytes
        } else if data_type.is_bool() {
            let falsy = matches!(text.to_ascii_lowercase().as_str(), "0" | "false" | "no");
            vec![u8::from(!falsy)]
        } else {
            // String payload: pass the text through.
            text.as_bytes().to_vec()
        };
        if let Some(target_obj) = self.objects.get_mut(target) {
            target_obj.set_raw(Bytes::from(bytes));
        }
        self.modified = true;
        Ok(())
    }

    /// Renders a primitive object's value as text.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ValueTypeMismatch`] for composite objects.
    pub fn value_as_string(&self, uid: Uid) -> Result<String, ArchiveError> {
        let Some(obj) = self.objects.get(uid) else {
            return Ok(String::new());
        };
        if !obj.data_type().is_primitive() {
            return Err(ArchiveError::ValueTypeMismatch {
                requested: "string",
                actual: obj.data_type().long_descr(),
            });
        }
        match self.value_target_object(uid) {
            Some(target) => Ok(value::format_primitive(target.data_type(), target.raw())),
            None => Ok(String::new()),
        }
    }

    /// Reads an integer or enum object's value.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ValueTypeMismatch`] when the object is neither.
    pub fn value_as_int(&self, uid: Uid) -> Result<i64, ArchiveError> {
        let Some(obj) = self.objects.get(uid) else {
            return Ok(0);
        };
        let data_type = obj.data_type();
        if !data_type.is_integer() && !data_type.is_enum() {
            return Err(ArchiveError::ValueTypeMismatch {
                requested: "integer",
                actual: data_type.long_descr(),
            });
        }
        match self.value_target_object(uid) {
            Some(target) if !target.raw().is_empty() => {
                #[allow(clippy::cast_possible_wrap)]
                let v = if target.data_type().is_signed() {
                    value::read_signed(target.raw())
                } else {
                    value::read_unsigned(target.raw()) as i64
                };
                Ok(v)
            }
            _ => Ok(0),
        }
    }

    /// Reads a real object's value, widening `real32` to `f64`.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ValueTypeMismatch`] when the object is not a real.
    pub fn value_as_real(&self, uid: Uid) -> Result<f64, ArchiveError> {
        let Some(obj) = self.objects.get(uid) else {
            return Ok(0.0);
        };
        if !obj.data_type().is_real() {
            return Err(ArchiveError::ValueTypeMismatch {
                requested: "real",
                actual: obj.data_type().long_descr(),
            });
        }
        match self.value_target_object(uid) {
            Some(target) if !target.raw().is_empty() => Ok(value::read_real(target.raw())),
            _ => Ok(0.0),
        }
    }

    /// Reads a boolean object's value. An absent pointee reads as `false`.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ValueTypeMismatch`] when the object is not a boolean.
    pub fn value_as_bool(&self, uid: Uid) -> Result<bool, ArchiveError> {
        let Some(obj) = self.objects.get(uid) else {
            return Ok(false);
        };
        if !obj.data_type().is_bool() {
            return Err(ArchiveError::ValueTypeMismatch {
                requested: "bool",
                actual: obj.data_type().long_descr(),
            });
        }
        match self.value_target_object(uid) {
            Some(target) => Ok(target.raw().first().is_some_and(|b| *b != 0)),
            None => Ok(false),
        }
    }

    /// Resolves a value operation's target UID, reading through one level of
    /// pointer indirection.
    fn value_target(&self, uid: Uid) -> Option<Uid> {
        let obj = self.objects.get(uid)?;
        if obj.data_type().is_pointer() {
            let pointee = obj.pointee_uid()?;
            self.objects.contains(pointee).then_some(pointee)
        } else {
            Some(uid)
        }
    }

    fn value_target_object(&self, uid: Uid) -> Option<&Object> {
        self.objects.get(self.value_target(uid)?)
    }

    pub(crate) fn encode(&mut self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        if self.time_created == 0 {
            self.time_created = now;
        }
        self.time_modified = now;
        self.raw_data = write::encode_archive(
            self.root,
            &self.objects,
            &self.name,
            &self.comment,
            self.time_created,
            self.time_modified,
        );
        self.modified = false;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn fresh_archive_is_empty_and_unmodified() {
        let ar = Archive::new();
        assert_eq!(ar.operation(), Operation::None);
        assert!(!ar.is_modified());
        assert_eq!(ar.object_count(), 0);
        assert!(ar.root_object().is_none());
        assert_eq!(ar.raw_data_format(), "Srx1v");
    }

    #[test]
    fn serialize_primitive_root_creates_the_root_object() {
        let datum: u32 = 0x1234_5678;
        let mut ar = Archive::new();
        ar.serialize(&datum);
        let root = ar.root_object().expect("root object");
        assert!(root.data_type().is_integer());
        assert_eq!(root.data_type().size(), 4);
        assert_eq!(ar.value_as_int(ar.root()).unwrap(), 0x1234_5678);
    }

    #[test]
    fn mutators_flag_modification_and_encode_clears_it() {
        let datum: i32 = -5;
        let mut ar = Archive::new();
        ar.serialize(&datum);
        assert!(!ar.is_modified());
        ar.set_name("preset");
        assert!(ar.is_modified());
        let _ = ar.raw_data();
        assert!(!ar.is_modified());
    }

    #[test]
    fn set_int_value_rejects_non_integers() {
        let datum = true;
        let mut ar = Archive::new();
        ar.serialize(&datum);
        let err = ar.set_int_value(ar.root(), 3).unwrap_err();
        assert!(matches!(err, ArchiveError::ValueTypeMismatch { .. }));
    }

    #[test]
    fn auto_value_normalizes_through_the_object_type() {
        let datum: i64 = 0;
        let mut ar = Archive::new();
        ar.serialize(&datum);
        ar.set_auto_value(ar.root(), "-42").unwrap();
        assert_eq!(ar.value_as_string(ar.root()).unwrap(), "-42");
        assert_eq!(ar.value_as_int(ar.root()).unwrap(), -42);
    }

    #[test]
    fn clear_resets_graph_and_encoding() {
        let datum: u8 = 9;
        let mut ar = Archive::new();
        ar.serialize(&datum);
        assert_ne!(ar.object_count(), 0);
        ar.clear();
        assert_eq!(ar.object_count(), 0);
        assert!(!ar.root().is_valid());
        assert!(ar.raw_data().is_empty());
    }

    #[test]
    fn timestamps_initialize_on_first_encode_only() {
        let datum: u8 = 1;
        let mut ar = Archive::new();
        ar.serialize(&datum);
        let created = ar.time_created();
        assert_ne!(created, 0);
        ar.set_comment("again");
        let _ = ar.raw_data();
        assert_eq!(ar.time_created(), created);
        assert!(ar.time_modified() >= created);
    }
}
