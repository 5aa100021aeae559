// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Archive error taxonomy.
//!
//! Every fallible operation in the crate (decoding, syncing, value mutation)
//! reports through the single [`ArchiveError`] enum. Errors abort the current
//! top-level call; no partial state is exposed beyond primitive values already
//! written into live memory by an interrupted sync.

use thiserror::Error;

use crate::object::Version;

/// Errors raised while decoding an archive, reconciling two archives, or
/// mutating primitive values.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Input is empty or does not start with the `Srx1v` magic prefix.
    #[error("missing or invalid magic prefix")]
    BadMagic,

    /// A blob length header contains a byte that is neither a digit nor `:`.
    #[error("malformed blob length header (unexpected byte {byte:#04x})")]
    MalformedLength {
        /// The offending byte.
        byte: u8,
    },

    /// A declared blob length overruns the enclosing slice.
    #[error("blob declares {declared} payload bytes but only {available} remain")]
    PrematureEnd {
        /// Payload length declared by the blob header.
        declared: usize,
        /// Bytes actually remaining in the enclosing slice.
        available: usize,
    },

    /// An integer blob contains a non-digit after the optional leading `-`.
    #[error("malformed integer blob {text:?}")]
    MalformedInt {
        /// The payload that failed to parse.
        text: String,
    },

    /// A real blob does not parse as a decimal floating point number.
    #[error("malformed real blob {text:?}")]
    MalformedReal {
        /// The payload that failed to parse.
        text: String,
    },

    /// The root blob does not declare a root object.
    #[error("root blob does not declare a root object")]
    MissingRoot,

    /// The declared root UID is not present in the decoded object pool.
    #[error("declared root object missing from decoded pool")]
    DanglingRoot,

    /// The source archive has no root object to sync from.
    #[error("source archive has no root object")]
    NoSourceRoot,

    /// The destination archive has no root object to sync into.
    #[error("destination archive has no root object")]
    NoDestinationRoot,

    /// Destination and source objects fall outside each other's declared
    /// version window.
    #[error(
        "version incompatible (destination version {dst_version} [min. version {dst_min}], \
         source version {src_version} [min. version {src_min}])"
    )]
    VersionIncompatible {
        /// Destination object version.
        dst_version: Version,
        /// Destination object minimum compatible version.
        dst_min: Version,
        /// Source object version.
        src_version: Version,
        /// Source object minimum compatible version.
        src_min: Version,
    },

    /// Destination and source objects have structurally incompatible types.
    #[error("incompatible data structure type (destination type {dst} vs. source type {src})")]
    TypeIncompatible {
        /// Long description of the destination type.
        dst: String,
        /// Long description of the source type.
        src: String,
    },

    /// A source member could not be resolved to any destination member.
    #[error("expected member {name:?} missing in destination object")]
    MissingMember {
        /// Name of the unresolved source member.
        name: String,
    },

    /// A value accessor or mutator was invoked on an object of the wrong kind.
    #[error("value of {requested} requested on object of type {actual}")]
    ValueTypeMismatch {
        /// The kind of value the caller asked for.
        requested: &'static str,
        /// Long description of the object's actual type.
        actual: String,
    },

    /// A calendar projection was requested for a time base this build does
    /// not understand. Unreachable through this crate's own API
    /// ([`TimeBase`](crate::TimeBase) is a closed enum); reported by
    /// projection adapters layered on top.
    #[error("unknown time base")]
    UnknownTimeBase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_message_carries_all_four_bounds() {
        let err = ArchiveError::VersionIncompatible {
            dst_version: 5,
            dst_min: 4,
            src_version: 2,
            src_min: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("destination version 5"));
        assert!(msg.contains("min. version 4"));
        assert!(msg.contains("source version 2"));
    }
}
