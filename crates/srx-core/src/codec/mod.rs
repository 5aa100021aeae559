// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The `Srx1v` wire codec.
//!
//! Every value on the wire is a *blob*: `<decimal-length>":"<payload-bytes>`.
//! Blobs nest; composites are blobs whose payload is a concatenation of
//! further blobs. There are no tags, delimiters, or checksums; the length
//! prefix is the only framing device. All numeric payloads (including
//! timestamps and identity tokens) are decimal ASCII, which keeps the format
//! independent of byte order and native word widths.
//!
//! A file is the five magic bytes `Srx1v` followed by the root blob:
//!
//! ```text
//! File       := "Srx1v" B(Root)
//! Root       := B(minor_version) Enc(root UID) Enc(ObjectPool)
//!               B(name) B(comment) B(created) B(modified)
//! Object     := B( Enc(DataType) B(version) B(min_version)
//!                  Enc(UIDChain) Enc(Members) Enc(Primitive) )
//! ```
//!
//! where `B(x)` is `len(x) ":" x`. Unrecognized trailing bytes inside a
//! nested blob are ignored; they are room for future extensions.

pub(crate) mod read;
pub(crate) mod value;
pub(crate) mod write;

/// Magic prefix identifying the wire format.
pub const MAGIC: &str = "Srx1v";

/// Encoding format minor version written into (and read from, then ignored
/// in) the root blob.
pub(crate) const FORMAT_MINOR_VERSION: u32 = 0;
