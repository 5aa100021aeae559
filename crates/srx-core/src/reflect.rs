// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host-facing reflection surface.
//!
//! Rust has no compile-time field reflection, so a host type describes itself:
//! it implements [`Field`] and, for classes, writes a `register` body that
//! calls [`Archive::serialize_member`] once per field. The same body runs for
//! both serialization and deserialization; it only declares fields, it never
//! reads or writes values itself.
//!
//! ```ignore
//! use srx_core::{register_fields, Archive, DataType, Field};
//!
//! #[repr(C)]
//! struct Probe {
//!     x: i32,
//!     armed: bool,
//! }
//!
//! impl Field for Probe {
//!     fn data_type() -> DataType {
//!         DataType::class_named("Probe", core::mem::size_of::<Probe>())
//!     }
//!     fn register(&self, ar: &mut Archive) {
//!         register_fields!(ar, self: x, armed);
//!     }
//! }
//! ```

use std::mem;

use crate::archive::Archive;
use crate::data_type::{BaseKind, DataType};
use crate::uid::{Uid, UidChain, UidId};

/// A datum the reflector can register: every primitive, string, pointer, and
/// host class that participates in an archive.
pub trait Field {
    /// Type descriptor derived from the static type.
    fn data_type() -> DataType
    where
        Self: Sized;

    /// UID chain of this datum. Non-pointer datums carry a single entry;
    /// pointer impls append the pointee.
    fn uid_chain(&self) -> UidChain
    where
        Self: Sized,
    {
        vec![Uid::of(self)]
    }

    /// Native byte image of a primitive value; empty for composites.
    fn value_bytes(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Declares nested structure. Classes register their fields here;
    /// primitives have nothing to declare.
    fn register(&self, ar: &mut Archive) {
        let _ = ar;
    }
}

macro_rules! impl_numeric_field {
    ($($ty:ty => $kind:expr),+ $(,)?) => {$(
        impl Field for $ty {
            fn data_type() -> DataType {
                DataType::scalar($kind, mem::size_of::<$ty>())
            }

            fn value_bytes(&self) -> Vec<u8> {
                self.to_ne_bytes().to_vec()
            }
        }
    )+};
}

impl_numeric_field! {
    i8  => BaseKind::Int { signed: true },
    i16 => BaseKind::Int { signed: true },
    i32 => BaseKind::Int { signed: true },
    i64 => BaseKind::Int { signed: true },
    u8  => BaseKind::Int { signed: false },
    u16 => BaseKind::Int { signed: false },
    u32 => BaseKind::Int { signed: false },
    u64 => BaseKind::Int { signed: false },
    f32 => BaseKind::Real,
    f64 => BaseKind::Real,
}

impl Field for bool {
    fn data_type() -> DataType {
        DataType::scalar(BaseKind::Bool, mem::size_of::<bool>())
    }

    fn value_bytes(&self) -> Vec<u8> {
        vec![u8::from(*self)]
    }
}

impl Field for String {
    fn data_type() -> DataType {
        DataType::string_type()
    }

    fn value_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

/// Degree-1 pointer support. The chain carries the pointer cell and, when the
/// pointer is non-null, the pointee; registration descends into class
/// pointees so the whole reachable graph is reflected.
///
/// # Safety contract
///
/// A registered pointer must be null or point at a datum that stays valid for
/// the duration of the serialization or deserialization pass. This mirrors
/// the host-side guarantee any reflective framework needs; violating it is
/// undefined behavior.
impl<T: Field> Field for *mut T {
    fn data_type() -> DataType {
        T::data_type().pointer_to()
    }

    fn uid_chain(&self) -> UidChain {
        let cell = Uid::of(self);
        if self.is_null() {
            vec![cell]
        } else {
            let pointee = Uid {
                id: UidId::Live(*self as usize as u64),
                size: mem::size_of::<T>(),
            };
            vec![cell, pointee]
        }
    }

    fn register(&self, ar: &mut Archive) {
        if self.is_null() {
            return;
        }
        // SAFETY: non-null registered pointers are valid per the trait impl's
        // safety contract.
        let pointee: &T = unsafe { &**self };
        pointee.register(ar);
    }
}

/// Shared-pointer twin of the `*mut T` impl; same chain shape, same safety
/// contract.
impl<T: Field> Field for *const T {
    fn data_type() -> DataType {
        T::data_type().pointer_to()
    }

    fn uid_chain(&self) -> UidChain {
        let cell = Uid::of(self);
        if self.is_null() {
            vec![cell]
        } else {
            let pointee = Uid {
                id: UidId::Live(*self as usize as u64),
                size: mem::size_of::<T>(),
            };
            vec![cell, pointee]
        }
    }

    fn register(&self, ar: &mut Archive) {
        if self.is_null() {
            return;
        }
        // SAFETY: non-null registered pointers are valid per the trait impl's
        // safety contract.
        let pointee: &T = unsafe { &**self };
        pointee.register(ar);
    }
}

/// Implements [`Field`] for a fieldless `#[repr(...)]` enum.
///
/// The enum is reported under the given stable user name at its native width;
/// the stored value is its discriminant cast through the repr type.
///
/// ```ignore
/// #[repr(u32)]
/// #[derive(Clone, Copy)]
/// enum Mode { Idle = 0, Turbo = 7 }
///
/// srx_core::impl_enum_field!(Mode as u32, "Mode");
/// ```
#[macro_export]
macro_rules! impl_enum_field {
    ($ty:ty as $repr:ty, $name:expr) => {
        impl $crate::Field for $ty {
            fn data_type() -> $crate::DataType {
                $crate::DataType::enumeration($name, ::core::mem::size_of::<$ty>())
            }

            fn value_bytes(&self) -> ::std::vec::Vec<u8> {
                ((*self) as $repr).to_ne_bytes().to_vec()
            }
        }
    };
}

/// Registers a list of fields with the archive, one
/// [`Archive::serialize_member`] call per field.
///
/// `register_fields!(ar, self: a, b, c)` expands to
/// `ar.serialize_member(self, &self.a, "a")` and so on.
#[macro_export]
macro_rules! register_fields {
    ($ar:expr, $host:ident : $($field:ident),+ $(,)?) => {
        $( $ar.serialize_member($host, &$host.$field, ::core::stringify!($field)); )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_descriptors_carry_native_widths() {
        assert_eq!(<i16 as Field>::data_type().size(), 2);
        assert!(<i16 as Field>::data_type().is_signed());
        assert!(!<u64 as Field>::data_type().is_signed());
        assert_eq!(<f64 as Field>::data_type().size(), 8);
        assert!(<f32 as Field>::data_type().is_real());
        assert!(<bool as Field>::data_type().is_bool());
        assert!(<String as Field>::data_type().is_string());
    }

    #[test]
    fn value_bytes_are_the_native_image() {
        let v: u32 = 0x1234_5678;
        assert_eq!(v.value_bytes(), 0x1234_5678u32.to_ne_bytes().to_vec());
        assert_eq!(true.value_bytes(), vec![1]);
        assert_eq!(false.value_bytes(), vec![0]);
        assert_eq!("hi".to_owned().value_bytes(), b"hi".to_vec());
    }

    #[test]
    fn null_pointer_chain_has_no_pointee_entry() {
        let p: *mut i32 = std::ptr::null_mut();
        let chain = p.uid_chain();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].size, mem::size_of::<*mut i32>());
    }

    #[test]
    fn pointer_chain_carries_cell_then_pointee() {
        let mut value: i32 = 41;
        let p: *mut i32 = &mut value;
        let chain = p.uid_chain();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].size, mem::size_of::<*mut i32>());
        assert_eq!(chain[1].size, 4);
        assert_eq!(chain[1].id.token(), &value as *const i32 as usize as u64);
        assert!(<*mut i32 as Field>::data_type().is_pointer());
        assert_eq!(<*mut i32 as Field>::data_type().size(), 4);
    }
}
