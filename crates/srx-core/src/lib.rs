// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! srx-core: schema-resilient reflective serialization.
//!
//! Hosts register their fields through the [`Field`] trait; the archive
//! reflects the reachable object graph (cycles included) into a UID-keyed
//! pool, the `Srx1v` codec round-trips that pool through a self-describing
//! length-prefixed text encoding, and the syncer reconciles a decoded graph
//! into a freshly reflected one, writing primitive values back into live
//! memory while tolerating structural drift between program versions:
//! renamed, reordered, and inserted members are resolved structurally, and
//! only genuine incompatibilities (version windows, changed types, removed
//! members) are rejected.
//!
//! # Determinism
//!
//! Object pools iterate in ascending UID order, so identical graph content
//! encodes to identical bytes (modulo the embedded timestamps). All numeric
//! wire payloads are decimal ASCII; the format is independent of endianness
//! and native word width.
//!
//! # Live memory
//!
//! Deserialization writes decoded primitive values into the host's live
//! fields. The write site is single and guarded: only UIDs produced by local
//! reflection carry addresses, and the host's registered pointers must be
//! null or valid for the duration of a pass (see [`Field`]).
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod archive;
mod codec;
mod data_type;
mod error;
mod member;
mod object;
mod pool;
mod reflect;
mod sync;
mod uid;

pub use archive::{Archive, Operation, TimeBase};
pub use codec::MAGIC;
pub use data_type::{BaseKind, DataType};
pub use error::ArchiveError;
pub use member::Member;
pub use object::{Object, Version};
pub use pool::ObjectPool;
pub use reflect::Field;
pub use uid::{Uid, UidChain, UidId, NO_UID};
