// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reflective member records.

use crate::data_type::DataType;
use crate::uid::Uid;

/// One named, typed field of a class object.
///
/// `offset` is the byte offset of the field from the start of its parent.
/// Ordering is the lawful tuple order over `(uid, offset, name, type)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Member {
    uid: Uid,
    offset: usize,
    name: String,
    data_type: DataType,
}

impl Member {
    /// Builds a member record.
    #[must_use]
    pub fn new(name: &str, uid: Uid, offset: usize, data_type: DataType) -> Self {
        Self {
            uid,
            offset,
            name: name.to_owned(),
            data_type,
        }
    }

    /// UID of the datum this member refers to (the head of its chain).
    #[must_use]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// Byte offset of this field within its parent object.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Source-level identifier supplied at registration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type descriptor of the field.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}
