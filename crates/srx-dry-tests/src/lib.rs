// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host fixture types for exercising srx-core end to end.
//!
//! Each fixture plays the role of one "build" of a host program. Pairs that
//! share a user type name (`PanelV1`/`PanelV2`, `ProbeV1`/`ProbeV2`, …)
//! simulate schema drift between a sender and a receiver: renamed members,
//! members inserted at the tail, reordered members, version bumps, and enum
//! width changes. All fixtures are `#[repr(C)]` so member offsets are
//! deterministic across toolchains.

use std::mem;
use std::ptr;

use srx_core::{impl_enum_field, register_fields, Archive, DataType, Field};

/// Two-field struct used by the basic round-trip scenarios.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Signed payload.
    pub a: i32,
    /// Flag payload.
    pub b: bool,
}

impl Field for Sample {
    fn data_type() -> DataType {
        DataType::class_named("Sample", mem::size_of::<Sample>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: a, b);
    }
}

/// Self-referential list node; `linked_pair` wires two of them into a cycle.
#[repr(C)]
#[derive(Debug)]
pub struct Node {
    /// Next node in the (possibly cyclic) chain; null when unlinked.
    pub next: *mut Node,
    /// Payload distinguishing the nodes.
    pub x: i32,
}

impl Node {
    /// Creates an unlinked node.
    #[must_use]
    pub fn new(x: i32) -> Self {
        Self {
            next: ptr::null_mut(),
            x,
        }
    }
}

impl Field for Node {
    fn data_type() -> DataType {
        DataType::class_named("Node", mem::size_of::<Node>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: next, x);
    }
}

/// Boxes two nodes and links them into a two-element cycle.
#[must_use]
pub fn linked_pair(x1: i32, x2: i32) -> (Box<Node>, Box<Node>) {
    let mut a = Box::new(Node::new(x1));
    let mut b = Box::new(Node::new(x2));
    let pa: *mut Node = &mut *a;
    let pb: *mut Node = &mut *b;
    a.next = pb;
    b.next = pa;
    (a, b)
}

/// Sender-side `Panel` with the original member name.
#[repr(C)]
#[derive(Debug, Default)]
pub struct PanelV1 {
    /// Original member name.
    pub width: i32,
}

impl Field for PanelV1 {
    fn data_type() -> DataType {
        DataType::class_named("Panel", mem::size_of::<PanelV1>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: width);
    }
}

/// Receiver-side `Panel` after renaming `width` to `w` (same type, same
/// offset).
#[repr(C)]
#[derive(Debug, Default)]
pub struct PanelV2 {
    /// Renamed member.
    pub w: i32,
}

impl Field for PanelV2 {
    fn data_type() -> DataType {
        DataType::class_named("Panel", mem::size_of::<PanelV2>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: w);
    }
}

/// Sender-side `Probe` with two members.
#[repr(C)]
#[derive(Debug, Default)]
pub struct ProbeV1 {
    /// First payload.
    pub x: i32,
    /// Second payload.
    pub y: i32,
}

impl Field for ProbeV1 {
    fn data_type() -> DataType {
        DataType::class_named("Probe", mem::size_of::<ProbeV1>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: x, y);
    }
}

/// Receiver-side `Probe` with a member appended at the tail; older archives
/// must leave `z` at its live-memory default.
#[repr(C)]
#[derive(Debug, Default)]
pub struct ProbeV2 {
    /// First payload.
    pub x: i32,
    /// Second payload.
    pub y: i32,
    /// Member the sender does not know about.
    pub z: i32,
}

impl Field for ProbeV2 {
    fn data_type() -> DataType {
        DataType::class_named("Probe", mem::size_of::<ProbeV2>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: x, y, z);
    }
}

/// Sender-side `Mixed` with an integer before a real.
#[repr(C)]
#[derive(Debug, Default)]
pub struct MixedV1 {
    /// Integer payload.
    pub count: i32,
    /// Real payload.
    pub ratio: f32,
}

impl Field for MixedV1 {
    fn data_type() -> DataType {
        DataType::class_named("Mixed", mem::size_of::<MixedV1>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: count, ratio);
    }
}

/// Receiver-side `Mixed` with the members renamed and swapped; each source
/// member resolves through its unique type.
#[repr(C)]
#[derive(Debug, Default)]
pub struct MixedV2 {
    /// Real payload, now first.
    pub scale: f32,
    /// Integer payload, now second.
    pub total: i32,
}

impl Field for MixedV2 {
    fn data_type() -> DataType {
        DataType::class_named("Mixed", mem::size_of::<MixedV2>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: scale, total);
    }
}

/// Sender-side `Twins`: two members of the same type.
#[repr(C)]
#[derive(Debug, Default)]
pub struct TwinsV1 {
    /// First twin.
    pub a1: i32,
    /// Second twin.
    pub a2: i32,
}

impl Field for TwinsV1 {
    fn data_type() -> DataType {
        DataType::class_named("Twins", mem::size_of::<TwinsV1>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: a1, a2);
    }
}

/// Receiver-side `Twins` with both members renamed; same-type candidates are
/// told apart by offset.
#[repr(C)]
#[derive(Debug, Default)]
pub struct TwinsV2 {
    /// First twin, renamed.
    pub b1: i32,
    /// Second twin, renamed.
    pub b2: i32,
}

impl Field for TwinsV2 {
    fn data_type() -> DataType {
        DataType::class_named("Twins", mem::size_of::<TwinsV2>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: b1, b2);
    }
}

/// Receiver-side `Twins` whose layout shares no offsets with the sender; the
/// registration sequence index is the only resolution rule left.
#[repr(C)]
#[derive(Debug, Default)]
pub struct ShiftedTwins {
    /// Leading padding that displaces every offset.
    pub pad: i64,
    /// First twin, renamed and displaced.
    pub b1: i32,
    /// Second twin, renamed and displaced.
    pub b2: i32,
}

impl Field for ShiftedTwins {
    fn data_type() -> DataType {
        DataType::class_named("Twins", mem::size_of::<ShiftedTwins>())
    }

    fn register(&self, ar: &mut Archive) {
        // The twins keep their original sequence positions; the pad comes
        // last so it cannot shadow them.
        register_fields!(ar, self: b1, b2, pad);
    }
}

/// `Gauge` as written by the oldest build: version 1, min version 1.
#[repr(C)]
#[derive(Debug, Default)]
pub struct GaugeV1 {
    /// Payload.
    pub level: i32,
}

impl Field for GaugeV1 {
    fn data_type() -> DataType {
        DataType::class_named("Gauge", mem::size_of::<GaugeV1>())
    }

    fn register(&self, ar: &mut Archive) {
        ar.set_version(self, 1);
        ar.set_min_version(self, 1);
        register_fields!(ar, self: level);
    }
}

/// `Gauge` at version 2, min version 1.
#[repr(C)]
#[derive(Debug, Default)]
pub struct GaugeV2 {
    /// Payload.
    pub level: i32,
}

impl Field for GaugeV2 {
    fn data_type() -> DataType {
        DataType::class_named("Gauge", mem::size_of::<GaugeV2>())
    }

    fn register(&self, ar: &mut Archive) {
        ar.set_version(self, 2);
        ar.set_min_version(self, 1);
        register_fields!(ar, self: level);
    }
}

/// `Gauge` at version 3 that dropped compatibility with anything below
/// version 2.
#[repr(C)]
#[derive(Debug, Default)]
pub struct GaugeV3 {
    /// Payload.
    pub level: i32,
}

impl Field for GaugeV3 {
    fn data_type() -> DataType {
        DataType::class_named("Gauge", mem::size_of::<GaugeV3>())
    }

    fn register(&self, ar: &mut Archive) {
        ar.set_version(self, 3);
        ar.set_min_version(self, 2);
        register_fields!(ar, self: level);
    }
}

/// 4-byte build of the `Mode` enum.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeNarrow {
    /// Resting state.
    Idle = 0,
    /// Running state.
    Active = 3,
    /// Overdrive state.
    Turbo = 7,
}

impl_enum_field!(ModeNarrow as u32, "Mode");

/// 8-byte build of the `Mode` enum, same discriminants.
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeWide {
    /// Resting state.
    Idle = 0,
    /// Running state.
    Active = 3,
    /// Overdrive state.
    Turbo = 7,
}

impl_enum_field!(ModeWide as u64, "Mode");

/// `Rig` as built with the 4-byte `Mode`.
#[repr(C)]
#[derive(Debug)]
pub struct RigNarrow {
    /// Operating mode.
    pub mode: ModeNarrow,
}

impl Field for RigNarrow {
    fn data_type() -> DataType {
        DataType::class_named("Rig", mem::size_of::<RigNarrow>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: mode);
    }
}

/// `Rig` as built with the 8-byte `Mode`.
#[repr(C)]
#[derive(Debug)]
pub struct RigWide {
    /// Operating mode.
    pub mode: ModeWide,
}

impl Field for RigWide {
    fn data_type() -> DataType {
        DataType::class_named("Rig", mem::size_of::<RigWide>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: mode);
    }
}

/// Host struct carrying a string payload next to a scalar.
#[repr(C)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tagged {
    /// Variable-length label.
    pub label: String,
    /// Scalar payload.
    pub id: u32,
}

impl Field for Tagged {
    fn data_type() -> DataType {
        DataType::class_named("Tagged", mem::size_of::<Tagged>())
    }

    fn register(&self, ar: &mut Archive) {
        register_fields!(ar, self: label, id);
    }
}
