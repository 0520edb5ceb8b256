//! On-chain anchor record codec.
//!
//! The record is a narrow subset of CBOR (RFC 8949): one definite-length map
//! with text keys, holding
//! - `"mh"` (mandatory): 32-byte manifest hash as a byte string
//! - `"p"` (present only when non-empty): array of 32-byte parent hashes
//!
//! Only text, byte-string, array and map items are written, with lengths up
//! to 32 bits. The decoder reads the two known keys strictly and skips the
//! value of any other key whole, nested items included. Bytes after the map
//! are ignored.

use std::collections::HashSet;

use crate::error::CodecError;
use crate::types::VersionId;

/// Major types used by the record.
mod major {
    pub const UNSIGNED: u8 = 0;
    pub const NEGATIVE: u8 = 1;
    pub const BYTES: u8 = 2;
    pub const TEXT: u8 = 3;
    pub const ARRAY: u8 = 4;
    pub const MAP: u8 = 5;
    pub const SIMPLE: u8 = 7;
}

/// Deepest nesting accepted inside a skipped value.
pub const MAX_SKIP_DEPTH: usize = 16;

const KEY_MANIFEST_HASH: &str = "mh";
const KEY_PARENTS: &str = "p";

/// The commitment embedded on chain: a manifest hash and its parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorRecord {
    pub manifest_hash: VersionId,
    /// Parent manifest ids, unique, in declaration order.
    pub parents: Vec<VersionId>,
}

impl AnchorRecord {
    pub fn new(manifest_hash: VersionId) -> Self {
        Self {
            manifest_hash,
            parents: Vec::new(),
        }
    }

    pub fn with_parents(mut self, parents: Vec<VersionId>) -> Self {
        self.parents = parents;
        self
    }
}

/// Encode an anchor record.
///
/// Fails if the parent list contains duplicates.
pub fn encode_anchor(record: &AnchorRecord) -> Result<Vec<u8>, CodecError> {
    let mut seen = HashSet::new();
    for parent in &record.parents {
        if !seen.insert(parent) {
            return Err(CodecError::DuplicateParent(parent.to_hex()));
        }
    }

    let entries = if record.parents.is_empty() { 1 } else { 2 };
    let mut buf = Vec::with_capacity(4 + 35 + 3 + 33 * record.parents.len());
    encode_header(&mut buf, major::MAP, entries)?;

    encode_text(&mut buf, KEY_MANIFEST_HASH)?;
    encode_bytes(&mut buf, record.manifest_hash.as_bytes())?;

    if !record.parents.is_empty() {
        encode_text(&mut buf, KEY_PARENTS)?;
        encode_header(&mut buf, major::ARRAY, record.parents.len() as u64)?;
        for parent in &record.parents {
            encode_bytes(&mut buf, parent.as_bytes())?;
        }
    }
    Ok(buf)
}

/// Write an item header with the shortest length form.
fn encode_header(buf: &mut Vec<u8>, major: u8, n: u64) -> Result<(), CodecError> {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        return Err(CodecError::LengthTooLarge(n));
    }
    Ok(())
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), CodecError> {
    encode_header(buf, major::BYTES, bytes.len() as u64)?;
    buf.extend_from_slice(bytes);
    Ok(())
}

fn encode_text(buf: &mut Vec<u8>, s: &str) -> Result<(), CodecError> {
    encode_header(buf, major::TEXT, s.len() as u64)?;
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Decode an anchor record.
///
/// Fails when `mh` is missing or not 32 bytes, or when any length runs past
/// the end of `bytes`.
pub fn decode_anchor(bytes: &[u8]) -> Result<AnchorRecord, CodecError> {
    let mut dec = Decoder { buf: bytes, pos: 0 };

    let entries = dec.expect_header(major::MAP, "map")?;
    let mut manifest_hash = None;
    let mut parents: Option<Vec<VersionId>> = None;

    for _ in 0..entries {
        let key = dec.read_key()?;
        match key.as_str() {
            KEY_MANIFEST_HASH => {
                if manifest_hash.is_some() {
                    return Err(CodecError::DuplicateKey(key));
                }
                manifest_hash = Some(dec.read_hash("mh")?);
            }
            KEY_PARENTS => {
                if parents.is_some() {
                    return Err(CodecError::DuplicateKey(key));
                }
                let count = dec.expect_header(major::ARRAY, "array")?;
                let mut list = Vec::new();
                let mut seen = HashSet::new();
                for _ in 0..count {
                    let parent = dec.read_hash("parent")?;
                    if !seen.insert(parent) {
                        return Err(CodecError::DuplicateParent(parent.to_hex()));
                    }
                    list.push(parent);
                }
                parents = Some(list);
            }
            _ => dec.skip_value(0)?,
        }
    }

    Ok(AnchorRecord {
        manifest_hash: manifest_hash.ok_or(CodecError::MissingManifestHash)?,
        parents: parents.unwrap_or_default(),
    })
}

struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn take(&mut self, n: u64) -> Result<&'a [u8], CodecError> {
        let remaining = (self.buf.len() - self.pos) as u64;
        if n > remaining {
            return Err(CodecError::Truncated(self.pos));
        }
        let n = n as usize;
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_header(&mut self) -> Result<(u8, u64), CodecError> {
        let initial = self.take(1)?[0];
        let major = initial >> 5;
        let len = match initial & 0x1f {
            ai @ 0..=23 => u64::from(ai),
            24 => u64::from(self.take(1)?[0]),
            25 => {
                let b = self.take(2)?;
                u64::from(u16::from_be_bytes([b[0], b[1]]))
            }
            26 => {
                let b = self.take(4)?;
                u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            }
            ai => return Err(CodecError::UnsupportedHeader(ai)),
        };
        Ok((major, len))
    }

    fn expect_header(&mut self, want: u8, name: &'static str) -> Result<u64, CodecError> {
        let (major, len) = self.read_header()?;
        if major != want {
            return Err(CodecError::UnexpectedType {
                expected: name,
                found: major,
            });
        }
        Ok(len)
    }

    fn read_key(&mut self) -> Result<String, CodecError> {
        let len = self.expect_header(major::TEXT, "text key")?;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidKey)
    }

    /// Skip one complete item of any major type.
    fn skip_value(&mut self, depth: usize) -> Result<(), CodecError> {
        if depth > MAX_SKIP_DEPTH {
            return Err(CodecError::NestingTooDeep(MAX_SKIP_DEPTH));
        }
        let (major, len) = self.read_header()?;
        match major {
            // The header already carries the whole value.
            major::UNSIGNED | major::NEGATIVE | major::SIMPLE => {}
            major::BYTES | major::TEXT => {
                self.take(len)?;
            }
            major::ARRAY => {
                for _ in 0..len {
                    self.skip_value(depth + 1)?;
                }
            }
            major::MAP => {
                for _ in 0..len {
                    self.skip_value(depth + 1)?;
                    self.skip_value(depth + 1)?;
                }
            }
            // Tag: the tagged item follows.
            _ => self.skip_value(depth + 1)?,
        }
        Ok(())
    }

    fn read_hash(&mut self, field: &'static str) -> Result<VersionId, CodecError> {
        let len = self.expect_header(major::BYTES, "byte string")?;
        let raw = self.take(len)?;
        let arr: [u8; 32] = raw.try_into().map_err(|_| CodecError::HashLength {
            field,
            got: raw.len(),
        })?;
        Ok(VersionId::from_bytes(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciborium::value::Value;
    use proptest::prelude::*;

    fn id(b: u8) -> VersionId {
        VersionId::from_bytes([b; 32])
    }

    #[test]
    fn test_encode_without_parents_layout() {
        let bytes = encode_anchor(&AnchorRecord::new(id(0xab))).unwrap();
        assert_eq!(bytes.len(), 1 + 3 + 2 + 32);
        assert_eq!(&bytes[..6], &[0xa1, 0x62, b'm', b'h', 0x58, 0x20]);
        assert_eq!(&bytes[6..], &[0xab; 32]);
    }

    #[test]
    fn test_roundtrip_with_parents() {
        let record = AnchorRecord::new(id(1)).with_parents(vec![id(2), id(3)]);
        let bytes = encode_anchor(&record).unwrap();
        assert_eq!(bytes[0], 0xa2);
        assert_eq!(decode_anchor(&bytes).unwrap(), record);
    }

    #[test]
    fn test_duplicate_parent_rejected_on_encode() {
        let record = AnchorRecord::new(id(1)).with_parents(vec![id(2), id(2)]);
        assert!(matches!(
            encode_anchor(&record),
            Err(CodecError::DuplicateParent(_))
        ));
    }

    #[test]
    fn test_header_widths() {
        let mut buf = Vec::new();
        encode_header(&mut buf, major::BYTES, 23).unwrap();
        assert_eq!(buf, vec![0x57]);

        buf.clear();
        encode_header(&mut buf, major::BYTES, 24).unwrap();
        assert_eq!(buf, vec![0x58, 24]);

        buf.clear();
        encode_header(&mut buf, major::ARRAY, 256).unwrap();
        assert_eq!(buf, vec![0x99, 0x01, 0x00]);

        buf.clear();
        encode_header(&mut buf, major::TEXT, 0x1_0000).unwrap();
        assert_eq!(buf, vec![0x7a, 0x00, 0x01, 0x00, 0x00]);

        buf.clear();
        assert_eq!(
            encode_header(&mut buf, major::BYTES, 1 << 32),
            Err(CodecError::LengthTooLarge(1 << 32))
        );
    }

    #[test]
    fn test_missing_mh() {
        // {"p": []}
        let bytes = [0xa1, 0x61, b'p', 0x80];
        assert_eq!(decode_anchor(&bytes), Err(CodecError::MissingManifestHash));
    }

    #[test]
    fn test_short_mh() {
        // {"mh": h'0102'}
        let bytes = [0xa1, 0x62, b'm', b'h', 0x42, 0x01, 0x02];
        assert_eq!(
            decode_anchor(&bytes),
            Err(CodecError::HashLength { field: "mh", got: 2 })
        );
    }

    #[test]
    fn test_length_past_end() {
        let mut bytes = encode_anchor(&AnchorRecord::new(id(7))).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(decode_anchor(&bytes), Err(CodecError::Truncated(_))));

        // Byte string claiming 2^32 - 1 bytes.
        let bytes = [0xa1, 0x62, b'm', b'h', 0x5a, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(decode_anchor(&bytes), Err(CodecError::Truncated(_))));
    }

    #[test]
    fn test_64bit_length_rejected() {
        let bytes = [0xa1, 0x62, b'm', b'h', 0x5b, 0, 0, 0, 0, 0, 0, 0, 32];
        assert_eq!(decode_anchor(&bytes), Err(CodecError::UnsupportedHeader(27)));
    }

    #[test]
    fn test_unknown_text_key_skipped() {
        let mut bytes = vec![0xa2, 0x61, b'v', 0x62, b'v', b'2'];
        bytes.extend_from_slice(&[0x62, b'm', b'h', 0x58, 0x20]);
        bytes.extend_from_slice(&[0x44; 32]);
        assert_eq!(decode_anchor(&bytes).unwrap(), AnchorRecord::new(id(0x44)));
    }

    fn with_unknown_entry(key: u8, value: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xa2, 0x61, key];
        bytes.extend_from_slice(value);
        bytes.extend_from_slice(&[0x62, b'm', b'h', 0x58, 0x20]);
        bytes.extend_from_slice(&[0x44; 32]);
        bytes
    }

    #[test]
    fn test_unknown_integer_key_skipped() {
        // {"v": 1, "mh": ...}
        let bytes = with_unknown_entry(b'v', &[0x01]);
        assert_eq!(decode_anchor(&bytes).unwrap(), AnchorRecord::new(id(0x44)));

        // {"v": 70000, ...} and {"v": -1, ...}
        let bytes = with_unknown_entry(b'v', &[0x1a, 0x00, 0x01, 0x11, 0x70]);
        assert_eq!(decode_anchor(&bytes).unwrap(), AnchorRecord::new(id(0x44)));
        let bytes = with_unknown_entry(b'v', &[0x20]);
        assert_eq!(decode_anchor(&bytes).unwrap(), AnchorRecord::new(id(0x44)));
    }

    #[test]
    fn test_unknown_nested_values_skipped() {
        // {"x": [1], "mh": ...}
        let bytes = with_unknown_entry(b'x', &[0x81, 0x01]);
        assert_eq!(decode_anchor(&bytes).unwrap(), AnchorRecord::new(id(0x44)));

        // {"x": {"a": [h'', true, null]}, ...}
        let bytes = with_unknown_entry(b'x', &[0xa1, 0x61, b'a', 0x83, 0x40, 0xf5, 0xf6]);
        assert_eq!(decode_anchor(&bytes).unwrap(), AnchorRecord::new(id(0x44)));

        // {"x": 1(1700000000), ...}
        let bytes = with_unknown_entry(b'x', &[0xc1, 0x1a, 0x65, 0x53, 0xf1, 0x00]);
        assert_eq!(decode_anchor(&bytes).unwrap(), AnchorRecord::new(id(0x44)));
    }

    #[test]
    fn test_unknown_value_limits() {
        // An array claiming more items than the buffer holds.
        let bytes = with_unknown_entry(b'x', &[0x9a, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(decode_anchor(&bytes), Err(CodecError::Truncated(_))));

        let nested = vec![0x81; MAX_SKIP_DEPTH + 2];
        let bytes = with_unknown_entry(b'x', &nested);
        assert_eq!(
            decode_anchor(&bytes),
            Err(CodecError::NestingTooDeep(MAX_SKIP_DEPTH))
        );

        let mut nested = vec![0x81; MAX_SKIP_DEPTH];
        nested.push(0x00);
        let bytes = with_unknown_entry(b'x', &nested);
        assert_eq!(decode_anchor(&bytes).unwrap(), AnchorRecord::new(id(0x44)));
    }

    #[test]
    fn test_we_skip_ciborium_values() {
        let value = Value::Map(vec![
            (
                Value::Text("meta".into()),
                Value::Map(vec![
                    (Value::Text("v".into()), Value::Integer(2.into())),
                    (Value::Text("ok".into()), Value::Bool(true)),
                    (
                        Value::Text("tags".into()),
                        Value::Array(vec![Value::Text("a".into()), Value::Integer((-5).into())]),
                    ),
                ]),
            ),
            (Value::Text("mh".into()), Value::Bytes(vec![3; 32])),
        ]);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&value, &mut bytes).unwrap();
        assert_eq!(decode_anchor(&bytes).unwrap(), AnchorRecord::new(id(3)));
    }

    #[test]
    fn test_duplicate_mh_rejected() {
        let mut bytes = vec![0xa2];
        for _ in 0..2 {
            bytes.extend_from_slice(&[0x62, b'm', b'h', 0x58, 0x20]);
            bytes.extend_from_slice(&[0x01; 32]);
        }
        assert_eq!(
            decode_anchor(&bytes),
            Err(CodecError::DuplicateKey("mh".into()))
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let record = AnchorRecord::new(id(7)).with_parents(vec![id(8)]);
        let mut bytes = encode_anchor(&record).unwrap();
        bytes.push(0x00);
        assert_eq!(decode_anchor(&bytes).unwrap(), record);

        bytes.extend_from_slice(b"junk");
        assert_eq!(decode_anchor(&bytes).unwrap(), record);
    }

    #[test]
    fn test_not_a_map() {
        assert!(matches!(
            decode_anchor(&[0x80]),
            Err(CodecError::UnexpectedType { expected: "map", found: 4 })
        ));
        assert!(matches!(decode_anchor(&[]), Err(CodecError::Truncated(0))));
    }

    #[test]
    fn test_ciborium_reads_our_encoding() {
        let record = AnchorRecord::new(id(9)).with_parents(vec![id(10)]);
        let bytes = encode_anchor(&record).unwrap();
        let value: Value = ciborium::de::from_reader(bytes.as_slice()).unwrap();
        let entries = value.as_map().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, Value::Text("mh".into()));
        assert_eq!(entries[0].1, Value::Bytes(vec![9; 32]));
        assert_eq!(entries[1].0, Value::Text("p".into()));
        assert_eq!(
            entries[1].1,
            Value::Array(vec![Value::Bytes(vec![10; 32])])
        );
    }

    #[test]
    fn test_we_read_ciborium_encoding() {
        let value = Value::Map(vec![
            (Value::Text("mh".into()), Value::Bytes(vec![5; 32])),
            (
                Value::Text("p".into()),
                Value::Array(vec![Value::Bytes(vec![6; 32]), Value::Bytes(vec![7; 32])]),
            ),
        ]);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&value, &mut bytes).unwrap();
        let record = decode_anchor(&bytes).unwrap();
        assert_eq!(record.manifest_hash, id(5));
        assert_eq!(record.parents, vec![id(6), id(7)]);
    }

    proptest! {
        #[test]
        fn prop_roundtrip(mh in any::<[u8; 32]>(), parents in proptest::collection::hash_set(any::<[u8; 32]>(), 0..40)) {
            let record = AnchorRecord::new(VersionId::from_bytes(mh))
                .with_parents(parents.into_iter().map(VersionId::from_bytes).collect());
            let bytes = encode_anchor(&record).unwrap();
            prop_assert_eq!(decode_anchor(&bytes).unwrap(), record);
        }

        #[test]
        fn prop_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = decode_anchor(&bytes);
        }
    }
}
