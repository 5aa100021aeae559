// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reflective type descriptors.
//!
//! A [`DataType`] classifies one reflected datum: its base kind, the opaque
//! user type name (for enums, classes, and unions), its byte size, and whether
//! the datum is a pointer to a value of that type. Descriptors are built at
//! registration time from the host's static types and round-trip through the
//! wire format as short ASCII tags (`"int32"`, `"real64"`, `"class"`, …), so
//! two builds of a program agree on them regardless of the compiler's native
//! spelling of a type.

use std::any::type_name;
use std::mem;

/// Base classification of a datum, dispatched by pattern match.
///
/// Widths live in [`DataType::size`], not in the variant: the wire carries the
/// tag and the size as separate fields and a receiver trusts each for what it
/// is good for (the tag for kind and signedness, the size for byte widths).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BaseKind {
    /// Fixed-width integer.
    Int {
        /// `true` for `int8..int64`, `false` for `uint8..uint64`.
        signed: bool,
    },
    /// IEEE 754 floating point (`real32` / `real64`).
    Real,
    /// Boolean.
    Bool,
    /// User enum; stored as an unsigned integer at its native width.
    Enum,
    /// User class/struct with registered members.
    Class,
    /// User union. Carried for wire compatibility; treated like a class with
    /// whatever members the host chose to register.
    Union,
    /// String payload; the raw image is the UTF-8 byte content.
    Str,
}

impl BaseKind {
    /// Renders the wire tag for this kind at the given byte size.
    #[must_use]
    pub(crate) fn wire_tag(self, size: usize) -> String {
        match self {
            Self::Int { signed: true } => format!("int{}", size * 8),
            Self::Int { signed: false } => format!("uint{}", size * 8),
            Self::Real => format!("real{}", size * 8),
            Self::Bool => "bool".to_owned(),
            Self::Enum => "enum".to_owned(),
            Self::Class => "class".to_owned(),
            Self::Union => "union".to_owned(),
            Self::Str => "string".to_owned(),
        }
    }

    /// Parses a wire tag. Unknown tags yield `None` (an invalid descriptor).
    #[must_use]
    pub(crate) fn from_wire_tag(tag: &str) -> Option<Self> {
        match tag {
            "int8" | "int16" | "int32" | "int64" => Some(Self::Int { signed: true }),
            "uint8" | "uint16" | "uint32" | "uint64" => Some(Self::Int { signed: false }),
            "real32" | "real64" => Some(Self::Real),
            "bool" => Some(Self::Bool),
            "enum" => Some(Self::Enum),
            "class" => Some(Self::Class),
            "union" => Some(Self::Union),
            "string" => Some(Self::Str),
            _ => None,
        }
    }
}

/// Reflective descriptor of one datum's type.
///
/// Equality and ordering are strict and componentwise over
/// `(kind, user_name, size, pointer)`; ordering exists solely so descriptors
/// can key maps. Structural compatibility across program versions is the
/// looser [`DataType::matches`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataType {
    kind: BaseKind,
    user_name: String,
    size: usize,
    pointer: bool,
}

impl DataType {
    /// Builds a descriptor for a fundamental scalar kind.
    #[must_use]
    pub fn scalar(kind: BaseKind, size: usize) -> Self {
        debug_assert!(!matches!(kind, BaseKind::Enum | BaseKind::Class | BaseKind::Union));
        Self {
            kind,
            user_name: String::new(),
            size,
            pointer: false,
        }
    }

    /// Builds a class descriptor named after the host type's raw symbol name.
    #[must_use]
    pub fn class_of<T>() -> Self {
        Self::class_named(type_name::<T>(), mem::size_of::<T>())
    }

    /// Builds a class descriptor with an explicit user type name.
    ///
    /// Hosts that must match archives written by another build (where the raw
    /// symbol name may differ) register under a stable explicit name.
    #[must_use]
    pub fn class_named(name: &str, size: usize) -> Self {
        Self {
            kind: BaseKind::Class,
            user_name: name.to_owned(),
            size,
            pointer: false,
        }
    }

    /// Builds an enum descriptor with an explicit user type name and width.
    #[must_use]
    pub fn enumeration(name: &str, size: usize) -> Self {
        Self {
            kind: BaseKind::Enum,
            user_name: name.to_owned(),
            size,
            pointer: false,
        }
    }

    /// Builds a union descriptor with an explicit user type name.
    #[must_use]
    pub fn union_named(name: &str, size: usize) -> Self {
        Self {
            kind: BaseKind::Union,
            user_name: name.to_owned(),
            size,
            pointer: false,
        }
    }

    /// Builds the string descriptor. `size` is the byte size of the host's
    /// string handle, not of the payload.
    #[must_use]
    pub fn string_type() -> Self {
        Self {
            kind: BaseKind::Str,
            user_name: String::new(),
            size: mem::size_of::<String>(),
            pointer: false,
        }
    }

    /// Reassembles a descriptor from decoded wire fields.
    #[must_use]
    pub(crate) fn from_wire(kind: BaseKind, user_name: String, size: usize, pointer: bool) -> Self {
        Self {
            kind,
            user_name,
            size,
            pointer,
        }
    }

    /// Returns the pointer variant of this descriptor. The size stays the
    /// pointee's size; only the indirection flag changes.
    #[must_use]
    pub fn pointer_to(mut self) -> Self {
        self.pointer = true;
        self
    }

    /// Base kind of the datum.
    #[must_use]
    pub fn kind(&self) -> BaseKind {
        self.kind
    }

    /// Opaque user type name; empty for fundamental kinds.
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Byte size of the datum (the pointee's size for pointers).
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Overwrites the byte size. Used when a receiver re-stamps an enum at its
    /// native width.
    pub(crate) fn set_size(&mut self, size: usize) {
        self.size = size;
    }

    /// `true` when the datum is a pointer to a value of this type.
    #[must_use]
    pub fn is_pointer(&self) -> bool {
        self.pointer
    }

    /// `true` for class descriptors.
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.kind == BaseKind::Class
    }

    /// `true` for union descriptors.
    #[must_use]
    pub fn is_union(&self) -> bool {
        self.kind == BaseKind::Union
    }

    /// A primitive carries its value in the raw image rather than in members.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        !self.is_class() && !self.is_union()
    }

    /// `true` for signed and unsigned integers.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self.kind, BaseKind::Int { .. })
    }

    /// `true` for floating point kinds.
    #[must_use]
    pub fn is_real(&self) -> bool {
        self.kind == BaseKind::Real
    }

    /// `true` for booleans.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.kind == BaseKind::Bool
    }

    /// `true` for enums.
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.kind == BaseKind::Enum
    }

    /// `true` for string payloads.
    #[must_use]
    pub fn is_string(&self) -> bool {
        self.kind == BaseKind::Str
    }

    /// Signed integers and reals carry a sign.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(self.kind, BaseKind::Int { signed: true }) || self.is_real()
    }

    /// Structural compatibility across program versions.
    ///
    /// Componentwise like `==`, except the byte size is ignored when both
    /// sides are classes (layouts grow as members are added), both are enums
    /// (widths are compiler-dependent), or both are strings (handle sizes are
    /// platform-dependent). Values are never coerced across differing
    /// fundamental widths.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        let size_exempt = matches!(
            (self.kind, other.kind),
            (BaseKind::Class, BaseKind::Class)
                | (BaseKind::Enum, BaseKind::Enum)
                | (BaseKind::Str, BaseKind::Str)
        );
        self.kind == other.kind
            && self.user_name == other.user_name
            && (size_exempt || self.size == other.size)
            && self.pointer == other.pointer
    }

    /// Human-readable description used in diagnostics.
    #[must_use]
    pub fn long_descr(&self) -> String {
        let mut s = self.kind.wire_tag(self.size);
        if !self.user_name.is_empty() {
            s.push(' ');
            s.push_str(&self.user_name);
        }
        if self.pointer {
            s.push_str(" pointer");
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tags_round_trip_for_all_fundamental_kinds() {
        let cases = [
            (BaseKind::Int { signed: true }, 4, "int32"),
            (BaseKind::Int { signed: false }, 8, "uint64"),
            (BaseKind::Real, 4, "real32"),
            (BaseKind::Real, 8, "real64"),
            (BaseKind::Bool, 1, "bool"),
            (BaseKind::Enum, 4, "enum"),
            (BaseKind::Class, 16, "class"),
            (BaseKind::Union, 8, "union"),
            (BaseKind::Str, 24, "string"),
        ];
        for (kind, size, tag) in cases {
            assert_eq!(kind.wire_tag(size), tag);
            assert_eq!(BaseKind::from_wire_tag(tag), Some(kind));
        }
        assert_eq!(BaseKind::from_wire_tag("widget"), None);
        assert_eq!(BaseKind::from_wire_tag(""), None);
    }

    #[test]
    fn strict_equality_distinguishes_widths() {
        let a = DataType::scalar(BaseKind::Int { signed: true }, 4);
        let b = DataType::scalar(BaseKind::Int { signed: true }, 8);
        assert_ne!(a, b);
        assert!(!a.matches(&b));
    }

    #[test]
    fn matches_exempts_class_enum_and_string_sizes() {
        let c1 = DataType::class_named("Probe", 8);
        let c2 = DataType::class_named("Probe", 12);
        assert_ne!(c1, c2);
        assert!(c1.matches(&c2));

        let e1 = DataType::enumeration("Mode", 4);
        let e2 = DataType::enumeration("Mode", 8);
        assert!(e1.matches(&e2));

        let s1 = DataType::string_type();
        let mut s2 = DataType::string_type();
        s2.set_size(12);
        assert!(s1.matches(&s2));

        // Different names stay incompatible even at equal sizes.
        assert!(!c1.matches(&DataType::class_named("Gauge", 8)));
    }

    #[test]
    fn pointer_flag_participates_in_matching() {
        let v = DataType::scalar(BaseKind::Int { signed: true }, 4);
        let p = v.clone().pointer_to();
        assert!(!v.matches(&p));
        assert_eq!(p.size(), 4);
        assert!(p.is_pointer());
    }

    #[test]
    fn signedness_predicates() {
        assert!(DataType::scalar(BaseKind::Int { signed: true }, 2).is_signed());
        assert!(!DataType::scalar(BaseKind::Int { signed: false }, 2).is_signed());
        assert!(DataType::scalar(BaseKind::Real, 8).is_signed());
        assert!(!DataType::scalar(BaseKind::Bool, 1).is_signed());
    }

    #[test]
    fn composite_kinds_are_not_primitive() {
        assert!(!DataType::class_named("Probe", 8).is_primitive());
        assert!(!DataType::union_named("Blob", 8).is_primitive());
        assert!(DataType::enumeration("Mode", 4).is_primitive());
        assert!(DataType::string_type().is_primitive());
    }

    #[test]
    fn ordering_is_a_lawful_tuple_order() {
        let mut types = vec![
            DataType::scalar(BaseKind::Real, 8),
            DataType::class_named("B", 4),
            DataType::class_named("A", 4),
            DataType::scalar(BaseKind::Int { signed: true }, 2),
            DataType::scalar(BaseKind::Int { signed: true }, 2).pointer_to(),
        ];
        types.sort();
        for pair in types.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        // Antisymmetry spot check on a pair that once broke the ordering.
        let a = DataType::class_named("A", 4);
        let b = DataType::class_named("B", 4);
        assert!(a < b);
        assert!(!(b < a));
    }

    #[test]
    fn long_descr_names_kind_user_type_and_indirection() {
        let t = DataType::class_named("Probe", 8).pointer_to();
        assert_eq!(t.long_descr(), "class Probe pointer");
        let i = DataType::scalar(BaseKind::Int { signed: false }, 4);
        assert_eq!(i.long_descr(), "uint32");
    }
}
