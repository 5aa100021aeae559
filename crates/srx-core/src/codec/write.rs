// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blob encoder.
//!
//! Builds the byte stream bottom-up: each composite renders its payload into
//! a string, then wraps it with the `len:` prefix. Primitive values are
//! formatted from the object's raw image; live memory is never touched here.

use crate::codec::{value, FORMAT_MINOR_VERSION, MAGIC};
use crate::data_type::DataType;
use crate::member::Member;
use crate::object::Object;
use crate::pool::ObjectPool;
use crate::uid::Uid;

fn push_blob(out: &mut String, payload: &str) {
    out.push_str(&payload.len().to_string());
    out.push(':');
    out.push_str(payload);
}

fn encode_uid(out: &mut String, uid: Uid) {
    let mut s = String::new();
    push_blob(&mut s, &uid.id.token().to_string());
    push_blob(&mut s, &uid.size.to_string());
    push_blob(out, &s);
}

fn encode_data_type(out: &mut String, data_type: &DataType) {
    let mut s = String::new();
    push_blob(&mut s, &data_type.kind().wire_tag(data_type.size()));
    push_blob(&mut s, data_type.user_name());
    push_blob(&mut s, &data_type.size().to_string());
    push_blob(&mut s, if data_type.is_pointer() { "1" } else { "0" });
    push_blob(out, &s);
}

fn encode_uid_chain(out: &mut String, chain: &[Uid]) {
    let mut s = String::new();
    for uid in chain {
        encode_uid(&mut s, *uid);
    }
    push_blob(out, &s);
}

fn encode_member(out: &mut String, member: &Member) {
    let mut s = String::new();
    encode_uid(&mut s, member.uid());
    push_blob(&mut s, &member.offset().to_string());
    push_blob(&mut s, member.name());
    encode_data_type(&mut s, member.data_type());
    push_blob(out, &s);
}

fn encode_members(out: &mut String, members: &[Member]) {
    let mut s = String::new();
    for member in members {
        encode_member(&mut s, member);
    }
    push_blob(out, &s);
}

fn encode_primitive_value(out: &mut String, obj: &Object) {
    let data_type = obj.data_type();
    if data_type.is_primitive() && !data_type.is_pointer() {
        push_blob(out, &value::format_primitive(data_type, obj.raw()));
    } else {
        push_blob(out, "");
    }
}

fn encode_object(out: &mut String, obj: &Object) {
    let mut s = String::new();
    encode_data_type(&mut s, obj.data_type());
    push_blob(&mut s, &obj.version().to_string());
    push_blob(&mut s, &obj.min_version().to_string());
    encode_uid_chain(&mut s, obj.uid_chain());
    encode_members(&mut s, obj.members());
    encode_primitive_value(&mut s, obj);
    push_blob(out, &s);
}

fn encode_pool(out: &mut String, pool: &ObjectPool) {
    let mut s = String::new();
    for obj in pool.iter() {
        encode_object(&mut s, obj);
    }
    push_blob(out, &s);
}

/// Encodes a whole archive into the `Srx1v` byte stream.
pub(crate) fn encode_archive(
    root: Uid,
    pool: &ObjectPool,
    name: &str,
    comment: &str,
    time_created: u64,
    time_modified: u64,
) -> Vec<u8> {
    let mut body = String::new();
    push_blob(&mut body, &FORMAT_MINOR_VERSION.to_string());
    encode_uid(&mut body, root);
    encode_pool(&mut body, pool);
    push_blob(&mut body, name);
    push_blob(&mut body, comment);
    push_blob(&mut body, &time_created.to_string());
    push_blob(&mut body, &time_modified.to_string());

    let mut out = String::from(MAGIC);
    push_blob(&mut out, &body);
    out.into_bytes()
}
