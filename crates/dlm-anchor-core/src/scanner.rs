//! Extraction of data-carrying outputs from raw legacy transactions.
//!
//! The transaction envelope must parse completely up to the last output;
//! any truncation there is a hard error. Script contents are matched
//! leniently (see [`crate::script`]).

use std::fmt;

use crate::encoding::{decode_hex, ByteReader};
use crate::error::ParseError;
use crate::script::parse_data_script;

/// Tags that mark an output as belonging to this protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorTag {
    /// Dataset manifest anchor.
    Dlm1,
    /// Transformation record.
    Trn1,
}

impl AnchorTag {
    pub const ALL: [AnchorTag; 2] = [AnchorTag::Dlm1, AnchorTag::Trn1];

    pub const fn as_bytes(&self) -> &'static [u8; 4] {
        match self {
            AnchorTag::Dlm1 => b"DLM1",
            AnchorTag::Trn1 => b"TRN1",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorTag::Dlm1 => "DLM1",
            AnchorTag::Trn1 => "TRN1",
        }
    }

    /// Classify a push by its first four bytes.
    pub fn from_prefix(push: &[u8]) -> Option<Self> {
        let prefix = push.get(..4)?;
        Self::ALL.into_iter().find(|tag| tag.as_bytes() == prefix)
    }
}

impl fmt::Display for AnchorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data-carrying (`OP_RETURN`) output found in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataOutput {
    /// Output index within the transaction.
    pub vout: u32,
    pub satoshis: u64,
    /// Full locking script.
    pub script: Vec<u8>,
    pub has_op_false: bool,
    /// Push payloads after `OP_RETURN`, in script order.
    pub pushes: Vec<Vec<u8>>,
    /// Known tag read from the first four bytes of the first push.
    pub tag: Option<AnchorTag>,
}

impl DataOutput {
    pub fn script_hex(&self) -> String {
        hex::encode(&self.script)
    }

    pub fn pushes_hex(&self) -> Vec<String> {
        self.pushes.iter().map(hex::encode).collect()
    }

    /// Printable-ASCII rendering of each push, `None` where any byte is not printable.
    pub fn pushes_ascii(&self) -> Vec<Option<String>> {
        self.pushes.iter().map(|p| printable_ascii(p)).collect()
    }

    /// The anchor body that follows the tag.
    ///
    /// Accepts both layouts seen on chain: tag and body in a single push
    /// (`"DLM1" || body`), or the tag pushed alone with the body in the next push.
    pub fn anchor_payload(&self) -> Option<&[u8]> {
        self.tag?;
        let first = self.pushes.first()?;
        if first.len() > 4 {
            Some(&first[4..])
        } else {
            self.pushes.get(1).map(Vec::as_slice)
        }
    }
}

/// Render `bytes` as ASCII if non-empty and every byte is in `0x20..=0x7e`.
pub fn printable_ascii(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() || !bytes.iter().all(|b| (0x20..=0x7e).contains(b)) {
        return None;
    }
    Some(bytes.iter().map(|&b| b as char).collect())
}

/// Parse a raw transaction and return every data-carrying output.
///
/// The trailing lock time is not required.
pub fn scan_transaction(raw: &[u8]) -> Result<Vec<DataOutput>, ParseError> {
    let mut reader = ByteReader::new(raw);

    // version
    reader.read_bytes(4)?;

    let input_count = reader.read_varint()?;
    for _ in 0..input_count {
        reader.read_bytes(32)?; // prev txid
        reader.read_bytes(4)?; // prev vout
        reader.read_var_bytes()?; // scriptSig
        reader.read_bytes(4)?; // sequence
    }

    let output_count = reader.read_varint()?;
    let mut outputs = Vec::new();
    for n in 0..output_count {
        let satoshis = reader.read_u64_le()?;
        let script = reader.read_var_bytes()?;

        let Some(parsed) = parse_data_script(script) else {
            continue;
        };
        let vout = u32::try_from(n).map_err(|_| ParseError::VarIntOverflow(n))?;
        let tag = parsed.pushes.first().and_then(|p| AnchorTag::from_prefix(p));
        outputs.push(DataOutput {
            vout,
            satoshis,
            script: script.to_vec(),
            has_op_false: parsed.has_op_false,
            pushes: parsed.pushes,
            tag,
        });
    }

    Ok(outputs)
}

/// [`scan_transaction`] over a hex-encoded transaction.
pub fn scan_transaction_hex(raw_hex: &str) -> Result<Vec<DataOutput>, ParseError> {
    let raw = decode_hex(raw_hex)?;
    if raw.is_empty() {
        return Err(ParseError::Truncated {
            offset: 0,
            needed: 4,
            available: 0,
        });
    }
    scan_transaction(&raw)
}

/// The first data-carrying output, if any.
pub fn first_data_output(raw: &[u8]) -> Result<Option<DataOutput>, ParseError> {
    Ok(scan_transaction(raw)?.into_iter().next())
}

/// Tag and index of the first data-carrying output.
///
/// The tag is `None` when there is no data output or its first push carries
/// no known tag; the index is `None` only when there is no data output.
pub fn detect_anchor_tag(raw: &[u8]) -> Result<(Option<AnchorTag>, Option<u32>), ParseError> {
    Ok(match first_data_output(raw)? {
        Some(out) => (out.tag, Some(out.vout)),
        None => (None, None),
    })
}
