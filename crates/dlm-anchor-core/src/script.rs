//! Data-carrier script construction and parsing.
//!
//! A data-carrying output looks like `OP_FALSE? OP_RETURN <push>*`. Parsing
//! is lenient about trailing garbage: the pushes read before the first
//! non-push opcode or overlong push are still returned.

use crate::encoding::varint_len;

pub const OP_FALSE: u8 = 0x00;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;

/// Largest length carried by a direct push opcode.
const MAX_DIRECT_PUSH: usize = 0x4b;

/// Result of matching a script against the data-carrier shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataScript {
    pub has_op_false: bool,
    pub pushes: Vec<Vec<u8>>,
}

/// Match `script` against `OP_FALSE? OP_RETURN <push>*`.
///
/// Returns `None` when the script is not a data carrier at all.
pub fn parse_data_script(script: &[u8]) -> Option<DataScript> {
    let mut i = 0usize;
    let has_op_false = script.first() == Some(&OP_FALSE);
    if has_op_false {
        i += 1;
    }
    if script.get(i) != Some(&OP_RETURN) {
        return None;
    }
    i += 1;

    let mut pushes = Vec::new();
    while i < script.len() {
        let op = script[i];
        i += 1;

        let width = match op {
            0x01..=0x4b => 0,
            OP_PUSHDATA1 => 1,
            OP_PUSHDATA2 => 2,
            OP_PUSHDATA4 => 4,
            _ => break,
        };
        let Some(len_bytes) = script.get(i..i + width) else {
            break;
        };
        let len = match width {
            0 => usize::from(op),
            _ => {
                let mut le = [0u8; 8];
                le[..width].copy_from_slice(len_bytes);
                match usize::try_from(u64::from_le_bytes(le)) {
                    Ok(n) => n,
                    Err(_) => break,
                }
            }
        };
        i += width;

        let Some(end) = i.checked_add(len).filter(|end| *end <= script.len()) else {
            break;
        };
        pushes.push(script[i..end].to_vec());
        i = end;
    }

    Some(DataScript {
        has_op_false,
        pushes,
    })
}

/// Encode `data` behind the smallest push opcode that fits it.
pub fn push_data(data: &[u8]) -> Vec<u8> {
    let len = data.len();
    let mut out = Vec::with_capacity(len + 5);
    if len == 0 {
        // 0x00 would read as OP_FALSE, which the parser does not treat as a push.
        out.extend_from_slice(&[OP_PUSHDATA1, 0]);
    } else if len <= MAX_DIRECT_PUSH {
        out.push(len as u8);
    } else if len <= 0xff {
        out.extend_from_slice(&[OP_PUSHDATA1, len as u8]);
    } else if len <= 0xffff {
        out.push(OP_PUSHDATA2);
        out.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        out.push(OP_PUSHDATA4);
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
    out.extend_from_slice(data);
    out
}

/// Build `OP_FALSE OP_RETURN <payload>`.
pub fn build_data_script(payload: &[u8]) -> Vec<u8> {
    build_data_script_multi(&[payload])
}

/// Build `OP_FALSE OP_RETURN <push_1> ... <push_n>`.
pub fn build_data_script_multi(pushes: &[&[u8]]) -> Vec<u8> {
    let mut script = vec![OP_FALSE, OP_RETURN];
    for push in pushes {
        script.extend_from_slice(&push_data(push));
    }
    script
}

/// Serialized size of a transaction output carrying a script of `script_len` bytes.
pub fn data_output_size(script_len: usize) -> usize {
    8 + varint_len(script_len as u64) + script_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_op_false_op_return_pushes() {
        let script = [OP_FALSE, OP_RETURN, 0x02, 0xaa, 0xbb, 0x01, 0xcc];
        let parsed = parse_data_script(&script).unwrap();
        assert!(parsed.has_op_false);
        assert_eq!(parsed.pushes, vec![vec![0xaa, 0xbb], vec![0xcc]]);
    }

    #[test]
    fn test_parse_bare_op_return() {
        let parsed = parse_data_script(&[OP_RETURN, 0x01, 0x41]).unwrap();
        assert!(!parsed.has_op_false);
        assert_eq!(parsed.pushes, vec![b"A".to_vec()]);
    }

    #[test]
    fn test_non_carrier_scripts() {
        assert!(parse_data_script(&[]).is_none());
        assert!(parse_data_script(&[OP_FALSE]).is_none());
        // P2PKH prefix
        assert!(parse_data_script(&[0x76, 0xa9, 0x14]).is_none());
    }

    #[test]
    fn test_stops_at_non_push_opcode() {
        let script = [OP_RETURN, 0x01, 0x41, 0x6a, 0x01, 0x42];
        let parsed = parse_data_script(&script).unwrap();
        assert_eq!(parsed.pushes, vec![b"A".to_vec()]);
    }

    #[test]
    fn test_overlong_push_keeps_leading_pushes() {
        let script = [OP_FALSE, OP_RETURN, 0x04, b'D', b'L', b'M', b'1', 0x10, 0x00];
        let parsed = parse_data_script(&script).unwrap();
        assert_eq!(parsed.pushes, vec![b"DLM1".to_vec()]);
    }

    #[test]
    fn test_truncated_pushdata_length() {
        let script = [OP_RETURN, 0x01, 0x41, OP_PUSHDATA2, 0x05];
        let parsed = parse_data_script(&script).unwrap();
        assert_eq!(parsed.pushes, vec![b"A".to_vec()]);
    }

    #[test]
    fn test_pushdata4_huge_length_stops() {
        let script = [OP_RETURN, OP_PUSHDATA4, 0xff, 0xff, 0xff, 0xff, 0x00];
        let parsed = parse_data_script(&script).unwrap();
        assert!(parsed.pushes.is_empty());
    }

    #[test]
    fn test_push_data_opcode_selection() {
        assert_eq!(push_data(&[7u8; 75])[0], 75);
        assert_eq!(&push_data(&[7u8; 76])[..2], &[OP_PUSHDATA1, 76]);
        assert_eq!(&push_data(&[7u8; 256])[..3], &[OP_PUSHDATA2, 0x00, 0x01]);
        assert_eq!(&push_data(&[7u8; 0x1_0000])[..5], &[OP_PUSHDATA4, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_built_script_parses_back() {
        for len in [1usize, 75, 76, 255, 256, 70_000] {
            let payload = vec![0x5a; len];
            let script = build_data_script(&payload);
            assert_eq!(&script[..2], &[OP_FALSE, OP_RETURN]);
            let parsed = parse_data_script(&script).unwrap();
            assert_eq!(parsed.pushes, vec![payload], "len {len}");
        }
    }

    #[test]
    fn test_data_output_size() {
        assert_eq!(data_output_size(40), 8 + 1 + 40);
        assert_eq!(data_output_size(300), 8 + 3 + 300);
    }
}
