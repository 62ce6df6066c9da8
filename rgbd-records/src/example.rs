//! Self-describing sample payloads.
//!
//! A payload is a flat key -> value map holding each modality's encoded
//! bytes, format tag, and decoded dimensions. It is encoded in the
//! `tf.train.Example` wire layout so the downstream reader consumes shard
//! files unchanged.
//!
//! # Wire layout
//!
//! ```text
//! Example   := field 1 (len-delimited): Features
//! Features  := repeated field 1 (len-delimited): map entry
//! entry     := field 1 (len-delimited): key (utf-8)
//!              field 2 (len-delimited): Feature
//! Feature   := field 1 (len-delimited): BytesList
//!            | field 3 (len-delimited): Int64List
//! BytesList := repeated field 1 (len-delimited): bytes
//! Int64List := field 1 (len-delimited): packed varint int64s
//! ```
//!
//! Map entries are written sorted by key. The downstream layout permits
//! any order, but a fixed order keeps repeated conversions byte-identical.

use std::collections::BTreeMap;
use thiserror::Error;

const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LEN: u64 = 2;
const WIRE_FIXED32: u64 = 5;

/// Errors parsing a payload back into an [`Example`].
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("varint overflows 64 bits at byte {offset}")]
    VarintOverflow { offset: usize },

    #[error("unsupported field {field} (wire type {wire_type}) at byte {offset}")]
    UnsupportedField {
        field: u64,
        wire_type: u64,
        offset: usize,
    },

    #[error("map entry key at byte {offset} is not valid utf-8")]
    InvalidKey { offset: usize },

    #[error("map entry at byte {offset} is missing its {missing}")]
    IncompleteEntry {
        offset: usize,
        missing: &'static str,
    },
}

/// A single typed value in a payload map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feature {
    /// Raw byte strings (encoded images, format tags).
    Bytes(Vec<Vec<u8>>),
    /// 64-bit integers (dimensions).
    Int64(Vec<i64>),
}

impl Feature {
    /// Single byte-string feature.
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Feature::Bytes(vec![value.into()])
    }

    /// Single integer feature.
    pub fn int64(value: i64) -> Self {
        Feature::Int64(vec![value])
    }

    /// The first byte string, if this is a bytes feature.
    pub fn first_bytes(&self) -> Option<&[u8]> {
        match self {
            Feature::Bytes(values) => values.first().map(Vec::as_slice),
            Feature::Int64(_) => None,
        }
    }

    /// The first integer, if this is an int64 feature.
    pub fn first_int64(&self) -> Option<i64> {
        match self {
            Feature::Int64(values) => values.first().copied(),
            Feature::Bytes(_) => None,
        }
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Feature::Bytes(values) => {
                let mut list = Vec::new();
                for value in values {
                    put_len_delimited(&mut list, 1, value);
                }
                put_len_delimited(&mut out, 1, &list);
            }
            Feature::Int64(values) => {
                let mut packed = Vec::new();
                for &value in values {
                    put_varint(&mut packed, value as u64);
                }
                let mut list = Vec::new();
                put_len_delimited(&mut list, 1, &packed);
                put_len_delimited(&mut out, 3, &list);
            }
        }
        out
    }
}

/// An ordered key -> feature map, encodable to payload bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Example {
    features: BTreeMap<String, Feature>,
}

impl Example {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the feature stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, feature: Feature) {
        self.features.insert(key.into(), feature);
    }

    pub fn get(&self, key: &str) -> Option<&Feature> {
        self.features.get(key)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Keys in encoding order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Encode to payload bytes. Deterministic: entries are emitted in key
    /// order.
    pub fn encode(&self) -> Vec<u8> {
        let mut features = Vec::new();
        for (key, feature) in &self.features {
            let mut entry = Vec::new();
            put_len_delimited(&mut entry, 1, key.as_bytes());
            put_len_delimited(&mut entry, 2, &feature.encode());
            put_len_delimited(&mut features, 1, &entry);
        }

        let mut payload = Vec::new();
        put_len_delimited(&mut payload, 1, &features);
        payload
    }

    /// Parse payload bytes back into a map.
    ///
    /// Accepts both packed and unpacked int64 lists; unknown fields of
    /// known wire types are skipped, matching ordinary protobuf readers.
    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        let mut example = Example::new();
        let mut outer = Cursor::new(bytes);
        while !outer.done() {
            let (field, wire_type) = outer.tag()?;
            if field == 1 && wire_type == WIRE_LEN {
                let features = outer.len_delimited()?;
                decode_features(features, &mut example)?;
            } else {
                outer.skip(field, wire_type)?;
            }
        }
        Ok(example)
    }
}

fn decode_features(bytes: &[u8], example: &mut Example) -> Result<(), PayloadError> {
    let mut cursor = Cursor::new(bytes);
    while !cursor.done() {
        let entry_offset = cursor.pos;
        let (field, wire_type) = cursor.tag()?;
        if field == 1 && wire_type == WIRE_LEN {
            let entry = cursor.len_delimited()?;
            let (key, feature) = decode_entry(entry, entry_offset)?;
            example.insert(key, feature);
        } else {
            cursor.skip(field, wire_type)?;
        }
    }
    Ok(())
}

fn decode_entry(bytes: &[u8], entry_offset: usize) -> Result<(String, Feature), PayloadError> {
    let mut cursor = Cursor::new(bytes);
    let mut key = None;
    let mut feature = None;
    while !cursor.done() {
        let (field, wire_type) = cursor.tag()?;
        match (field, wire_type) {
            (1, WIRE_LEN) => {
                let offset = cursor.pos;
                let raw = cursor.len_delimited()?;
                key = Some(
                    String::from_utf8(raw.to_vec())
                        .map_err(|_| PayloadError::InvalidKey { offset })?,
                );
            }
            (2, WIRE_LEN) => feature = Some(decode_feature(cursor.len_delimited()?)?),
            _ => cursor.skip(field, wire_type)?,
        }
    }

    let key = key.ok_or(PayloadError::IncompleteEntry {
        offset: entry_offset,
        missing: "key",
    })?;
    let feature = feature.ok_or(PayloadError::IncompleteEntry {
        offset: entry_offset,
        missing: "value",
    })?;
    Ok((key, feature))
}

fn decode_feature(bytes: &[u8]) -> Result<Feature, PayloadError> {
    let mut cursor = Cursor::new(bytes);
    let mut feature = Feature::Bytes(Vec::new());
    while !cursor.done() {
        let (field, wire_type) = cursor.tag()?;
        match (field, wire_type) {
            // BytesList
            (1, WIRE_LEN) => {
                let mut values = Vec::new();
                let mut list = Cursor::new(cursor.len_delimited()?);
                while !list.done() {
                    let (list_field, list_wire) = list.tag()?;
                    if list_field == 1 && list_wire == WIRE_LEN {
                        values.push(list.len_delimited()?.to_vec());
                    } else {
                        list.skip(list_field, list_wire)?;
                    }
                }
                feature = Feature::Bytes(values);
            }
            // Int64List
            (3, WIRE_LEN) => {
                let mut values = Vec::new();
                let mut list = Cursor::new(cursor.len_delimited()?);
                while !list.done() {
                    let (list_field, list_wire) = list.tag()?;
                    match (list_field, list_wire) {
                        (1, WIRE_LEN) => {
                            let mut packed = Cursor::new(list.len_delimited()?);
                            while !packed.done() {
                                values.push(packed.varint()? as i64);
                            }
                        }
                        (1, WIRE_VARINT) => values.push(list.varint()? as i64),
                        _ => list.skip(list_field, list_wire)?,
                    }
                }
                feature = Feature::Int64(values);
            }
            _ => cursor.skip(field, wire_type)?,
        }
    }
    Ok(feature)
}

fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

fn put_len_delimited(buf: &mut Vec<u8>, field: u32, bytes: &[u8]) {
    put_varint(buf, (u64::from(field) << 3) | WIRE_LEN);
    put_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn done(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn varint(&mut self) -> Result<u64, PayloadError> {
        let start = self.pos;
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let &byte = self
                .bytes
                .get(self.pos)
                .ok_or(PayloadError::Truncated { offset: start })?;
            self.pos += 1;
            if shift >= 64 {
                return Err(PayloadError::VarintOverflow { offset: start });
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn tag(&mut self) -> Result<(u64, u64), PayloadError> {
        let tag = self.varint()?;
        Ok((tag >> 3, tag & 0x7))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PayloadError> {
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(PayloadError::Truncated { offset: start })?;
        self.pos = end;
        Ok(&self.bytes[start..end])
    }

    fn len_delimited(&mut self) -> Result<&'a [u8], PayloadError> {
        let len = self.varint()?;
        self.take(len as usize)
    }

    fn skip(&mut self, field: u64, wire_type: u64) -> Result<(), PayloadError> {
        match wire_type {
            WIRE_VARINT => {
                self.varint()?;
            }
            WIRE_FIXED64 => {
                self.take(8)?;
            }
            WIRE_LEN => {
                self.len_delimited()?;
            }
            WIRE_FIXED32 => {
                self.take(4)?;
            }
            _ => {
                return Err(PayloadError::UnsupportedField {
                    field,
                    wire_type,
                    offset: self.pos,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_bytes_for_single_int() {
        let mut example = Example::new();
        example.insert("a", Feature::int64(1));

        // Hand-assembled wire bytes for {"a": Int64List([1])}
        let expected = [
            0x0a, 0x0c, // Example.features, 12 bytes
            0x0a, 0x0a, // map entry, 10 bytes
            0x0a, 0x01, 0x61, // key "a"
            0x12, 0x05, // Feature, 5 bytes
            0x1a, 0x03, // Int64List, 3 bytes
            0x0a, 0x01, 0x01, // packed [1]
        ];
        assert_eq!(example.encode(), expected);
    }

    #[test]
    fn test_round_trip_mixed_features() {
        let mut example = Example::new();
        example.insert("image/encoded", Feature::bytes(vec![0xff, 0xd8, 0xff]));
        example.insert("image/format", Feature::bytes(b"jpg".to_vec()));
        example.insert("image/height", Feature::int64(480));
        example.insert("image/width", Feature::int64(640));

        let decoded = Example::decode(&example.encode()).unwrap();
        assert_eq!(decoded, example);
        assert_eq!(
            decoded.get("image/encoded").unwrap().first_bytes(),
            Some(&[0xff, 0xd8, 0xff][..])
        );
        assert_eq!(decoded.get("image/height").unwrap().first_int64(), Some(480));
    }

    #[test]
    fn test_round_trip_negative_and_large_ints() {
        let mut example = Example::new();
        example.insert("v", Feature::Int64(vec![-1, 0, i64::MAX, i64::MIN]));

        let decoded = Example::decode(&example.encode()).unwrap();
        assert_eq!(decoded, example);
    }

    #[test]
    fn test_round_trip_empty() {
        let example = Example::new();
        let decoded = Example::decode(&example.encode()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_encoding_is_deterministic_and_order_independent() {
        let mut forward = Example::new();
        forward.insert("image/height", Feature::int64(4));
        forward.insert("label/height", Feature::int64(4));

        let mut reverse = Example::new();
        reverse.insert("label/height", Feature::int64(4));
        reverse.insert("image/height", Feature::int64(4));

        assert_eq!(forward.encode(), reverse.encode());
        assert_eq!(forward.encode(), forward.encode());
    }

    #[test]
    fn test_keys_iterate_sorted() {
        let mut example = Example::new();
        example.insert("label/encoded", Feature::bytes(b"x".to_vec()));
        example.insert("depth/encoded", Feature::bytes(b"y".to_vec()));
        example.insert("image/encoded", Feature::bytes(b"z".to_vec()));

        let keys: Vec<&str> = example.keys().collect();
        assert_eq!(keys, ["depth/encoded", "image/encoded", "label/encoded"]);
    }

    #[test]
    fn test_unpacked_int64_list_is_accepted() {
        // Same map as the golden test but with the int64 written unpacked
        // (tag 0x08), as pre-proto3 writers produce
        let bytes = [
            0x0a, 0x0b, // Example.features
            0x0a, 0x09, // map entry
            0x0a, 0x01, 0x61, // key "a"
            0x12, 0x04, // Feature
            0x1a, 0x02, // Int64List
            0x08, 0x07, // value = 7, unpacked
        ];
        let decoded = Example::decode(&bytes).unwrap();
        assert_eq!(decoded.get("a").unwrap().first_int64(), Some(7));
    }

    #[test]
    fn test_truncated_payload_fails() {
        let mut example = Example::new();
        example.insert("a", Feature::int64(1));
        let bytes = example.encode();

        let err = Example::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, PayloadError::Truncated { .. }));
    }

    #[test]
    fn test_entry_without_value_fails() {
        // Map entry carrying only a key
        let bytes = [
            0x0a, 0x05, // Example.features
            0x0a, 0x03, // map entry
            0x0a, 0x01, 0x61, // key "a"
        ];
        let err = Example::decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::IncompleteEntry {
                missing: "value",
                ..
            }
        ));
    }
}
