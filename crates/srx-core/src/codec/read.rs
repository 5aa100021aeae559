// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blob decoder.
//!
//! Cursor-based: every pop splits one blob off the front of a `&[u8]` slice
//! and recurses into its payload. Required blobs fail hard with the error
//! taxonomy; list positions use the tolerant variants, which treat an
//! exhausted slice or an invalid element as the end of the list. Trailing
//! bytes inside a nested blob are ignored; they belong to future format
//! extensions.

use bytes::Bytes;
use tracing::debug;

use crate::codec::{value, MAGIC};
use crate::data_type::{BaseKind, DataType};
use crate::error::ArchiveError;
use crate::member::Member;
use crate::object::Object;
use crate::pool::ObjectPool;
use crate::uid::{Uid, UidChain};

/// Everything the root blob carries.
pub(crate) struct DecodedArchive {
    pub root: Uid,
    pub objects: ObjectPool,
    pub name: String,
    pub comment: String,
    pub time_created: u64,
    pub time_modified: u64,
}

/// Splits the next blob off the front of `cur`, failing when no complete blob
/// is present.
fn pop_blob<'a>(cur: &mut &'a [u8]) -> Result<&'a [u8], ArchiveError> {
    let mut len: usize = 0;
    let mut i = 0;
    loop {
        let Some(&c) = cur.get(i) else {
            return Err(ArchiveError::PrematureEnd {
                declared: len,
                available: 0,
            });
        };
        if c == b':' {
            break;
        }
        if !c.is_ascii_digit() {
            return Err(ArchiveError::MalformedLength { byte: c });
        }
        len = len
            .checked_mul(10)
            .and_then(|l| l.checked_add(usize::from(c - b'0')))
            .ok_or(ArchiveError::PrematureEnd {
                declared: usize::MAX,
                available: cur.len(),
            })?;
        i += 1;
    }
    let start = i + 1;
    let available = cur.len() - start;
    if len > available {
        return Err(ArchiveError::PrematureEnd {
            declared: len,
            available,
        });
    }
    let blob = &cur[start..start + len];
    *cur = &cur[start + len..];
    Ok(blob)
}

/// Tolerant pop: an exhausted cursor yields `None` instead of an error.
fn pop_blob_opt<'a>(cur: &mut &'a [u8]) -> Result<Option<&'a [u8]>, ArchiveError> {
    if cur.is_empty() {
        return Ok(None);
    }
    pop_blob(cur).map(Some)
}

fn pop_u64(cur: &mut &[u8]) -> Result<u64, ArchiveError> {
    let blob = pop_blob(cur)?;
    let (negative, magnitude) = value::parse_decimal(blob)?;
    Ok(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

#[allow(clippy::cast_possible_truncation)] // wire values reinterpret at the receiver's width
fn pop_u32(cur: &mut &[u8]) -> Result<u32, ArchiveError> {
    pop_u64(cur).map(|v| v as u32)
}

#[allow(clippy::cast_possible_truncation)]
fn pop_usize(cur: &mut &[u8]) -> Result<usize, ArchiveError> {
    pop_u64(cur).map(|v| v as usize)
}

fn pop_string(cur: &mut &[u8]) -> Result<String, ArchiveError> {
    let blob = pop_blob(cur)?;
    Ok(String::from_utf8_lossy(blob).into_owned())
}

fn pop_uid(cur: &mut &[u8]) -> Result<Uid, ArchiveError> {
    let blob = pop_blob(cur)?;
    let mut p = blob;
    let token = pop_u64(&mut p)?;
    let size = pop_usize(&mut p)?;
    Ok(Uid::wire(token, size))
}

fn pop_uid_chain(cur: &mut &[u8]) -> Result<UidChain, ArchiveError> {
    let blob = pop_blob(cur)?;
    let mut p = blob;
    let mut chain = UidChain::new();
    while !p.is_empty() {
        chain.push(pop_uid(&mut p)?);
    }
    Ok(chain)
}

fn pop_data_type(cur: &mut &[u8]) -> Result<Option<DataType>, ArchiveError> {
    let blob = pop_blob(cur)?;
    let mut p = blob;
    let tag = pop_string(&mut p)?;
    let user_name = pop_string(&mut p)?;
    let size = pop_usize(&mut p)?;
    let pointer = pop_u64(&mut p)? != 0;
    let Some(kind) = BaseKind::from_wire_tag(&tag) else {
        return Ok(None);
    };
    if size == 0 {
        return Ok(None);
    }
    Ok(Some(DataType::from_wire(kind, user_name, size, pointer)))
}

/// Pops one member; an invalid record ends the enclosing list.
fn pop_member(cur: &mut &[u8]) -> Result<Option<Member>, ArchiveError> {
    let Some(blob) = pop_blob_opt(cur)? else {
        return Ok(None);
    };
    let mut p = blob;
    if p.is_empty() {
        return Ok(None);
    }
    let uid = pop_uid(&mut p)?;
    let offset = pop_usize(&mut p)?;
    let name = pop_string(&mut p)?;
    let Some(data_type) = pop_data_type(&mut p)? else {
        return Ok(None);
    };
    if !uid.is_valid() || name.is_empty() {
        return Ok(None);
    }
    Ok(Some(Member::new(&name, uid, offset, data_type)))
}

fn pop_members(cur: &mut &[u8]) -> Result<Vec<Member>, ArchiveError> {
    let Some(blob) = pop_blob_opt(cur)? else {
        return Ok(Vec::new());
    };
    let mut p = blob;
    let mut members = Vec::new();
    while !p.is_empty() {
        match pop_member(&mut p)? {
            Some(member) => members.push(member),
            None => break,
        }
    }
    Ok(members)
}

fn pop_primitive_value(cur: &mut &[u8], data_type: &DataType) -> Result<Bytes, ArchiveError> {
    if data_type.is_primitive() && !data_type.is_pointer() {
        let blob = pop_blob(cur)?;
        value::decode_primitive(data_type, blob)
    } else {
        // The empty placeholder blob is optional on the wire.
        let _ = pop_blob_opt(cur)?;
        Ok(Bytes::new())
    }
}

/// Pops one object; an invalid record ends the pool.
fn pop_object(cur: &mut &[u8]) -> Result<Option<Object>, ArchiveError> {
    let Some(blob) = pop_blob_opt(cur)? else {
        return Ok(None);
    };
    let mut p = blob;
    if p.is_empty() {
        return Ok(None);
    }
    let Some(data_type) = pop_data_type(&mut p)? else {
        return Ok(None);
    };
    let version = pop_u32(&mut p)?;
    let min_version = pop_u32(&mut p)?;
    let chain = pop_uid_chain(&mut p)?;
    if chain.is_empty() {
        return Ok(None);
    }
    let members = pop_members(&mut p)?;
    let raw = pop_primitive_value(&mut p, &data_type)?;

    let mut obj = Object::new(chain, data_type);
    obj.set_version(version);
    obj.set_min_version(min_version);
    obj.set_members(members);
    obj.set_raw(raw);
    Ok(Some(obj))
}

fn pop_pool(cur: &mut &[u8]) -> Result<ObjectPool, ArchiveError> {
    let blob = pop_blob(cur)?;
    let mut p = blob;
    let mut pool = ObjectPool::new();
    while !p.is_empty() {
        match pop_object(&mut p)? {
            Some(obj) => {
                pool.insert(obj);
            }
            None => break,
        }
    }
    Ok(pool)
}

/// Decodes a complete `Srx1v` byte stream.
pub(crate) fn decode_archive(data: &[u8]) -> Result<DecodedArchive, ArchiveError> {
    let Some(rest) = data.strip_prefix(MAGIC.as_bytes()) else {
        return Err(ArchiveError::BadMagic);
    };
    let mut cur = rest;
    let root_blob = pop_blob(&mut cur)?;
    let mut p = root_blob;

    // Room for future format revisions; read and ignore.
    let _minor_version = pop_u32(&mut p)?;

    if p.is_empty() {
        return Err(ArchiveError::MissingRoot);
    }
    let root = pop_uid(&mut p)?;
    if !root.is_valid() {
        return Err(ArchiveError::MissingRoot);
    }

    let objects = pop_pool(&mut p)?;

    let name = match pop_blob_opt(&mut p)? {
        Some(blob) => String::from_utf8_lossy(blob).into_owned(),
        None => String::new(),
    };
    let comment = match pop_blob_opt(&mut p)? {
        Some(blob) => String::from_utf8_lossy(blob).into_owned(),
        None => String::new(),
    };
    let time_created = pop_time_opt(&mut p)?;
    let time_modified = pop_time_opt(&mut p)?;

    if !objects.contains(root) {
        return Err(ArchiveError::DanglingRoot);
    }

    debug!(objects = objects.len(), "decoded archive");
    Ok(DecodedArchive {
        root,
        objects,
        name,
        comment,
        time_created,
        time_modified,
    })
}

fn pop_time_opt(cur: &mut &[u8]) -> Result<u64, ArchiveError> {
    match pop_blob_opt(cur)? {
        Some(blob) => {
            let (negative, magnitude) = value::parse_decimal(blob)?;
            Ok(if negative {
                magnitude.wrapping_neg()
            } else {
                magnitude
            })
        }
        None => Ok(0),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn pop_blob_splits_and_advances() {
        let mut cur: &[u8] = b"3:abc2:xy";
        assert_eq!(pop_blob(&mut cur).unwrap(), b"abc");
        assert_eq!(pop_blob(&mut cur).unwrap(), b"xy");
        assert!(cur.is_empty());
    }

    #[test]
    fn pop_blob_rejects_non_digit_length() {
        let mut cur: &[u8] = b"3a:abc";
        assert!(matches!(
            pop_blob(&mut cur),
            Err(ArchiveError::MalformedLength { byte: b'a' })
        ));
    }

    #[test]
    fn pop_blob_rejects_overrun() {
        let mut cur: &[u8] = b"9:abc";
        assert!(matches!(
            pop_blob(&mut cur),
            Err(ArchiveError::PrematureEnd {
                declared: 9,
                available: 3
            })
        ));
    }

    #[test]
    fn pop_blob_rejects_missing_separator() {
        let mut cur: &[u8] = b"123";
        assert!(matches!(
            pop_blob(&mut cur),
            Err(ArchiveError::PrematureEnd { .. })
        ));
    }

    #[test]
    fn tolerant_pop_treats_exhaustion_as_end() {
        let mut cur: &[u8] = b"";
        assert!(pop_blob_opt(&mut cur).unwrap().is_none());
    }

    #[test]
    fn uid_chain_reads_all_entries() {
        // Two uids: (7, 4) and (9, 8).
        let inner = "6:1:71:46:1:91:8";
        let framed = format!("{}:{}", inner.len(), inner);
        let mut cur: &[u8] = framed.as_bytes();
        let chain = pop_uid_chain(&mut cur).unwrap();
        assert_eq!(chain, vec![Uid::wire(7, 4), Uid::wire(9, 8)]);
    }

    #[test]
    fn unknown_type_tag_is_an_invalid_descriptor() {
        // tag "widget", empty user name, size 4, not a pointer
        let inner = "6:widget0:1:41:0";
        let framed = format!("{}:{}", inner.len(), inner);
        let mut cur: &[u8] = framed.as_bytes();
        assert!(pop_data_type(&mut cur).unwrap().is_none());
    }
}
