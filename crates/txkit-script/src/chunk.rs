//! Script chunk parsing and encoding.
//!
//! A script chunk is either an opcode or a data push with its associated bytes.
//! `Chunks` walks raw script bytes lazily so that classification can stop at
//! the first element that breaks a pattern, before a later truncated push is
//! ever reached.

use crate::opcodes::*;
use crate::ScriptError;

/// A single parsed element of a Bitcoin script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes), this is the length.
    pub op: u8,
    /// The pushed bytes, or for a top-level OP_RETURN the bytes following it.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// Whether this chunk pushes data (OP_0 counts as an empty push).
    pub fn is_push(&self) -> bool {
        self.op <= OP_PUSHDATA4
    }

    /// The pushed bytes of a push chunk.
    pub fn push_data(&self) -> Option<&[u8]> {
        if self.op == OP_0 {
            return Some(&[]);
        }
        if self.is_push() {
            self.data.as_deref()
        } else {
            None
        }
    }

    /// Render this chunk as one display token.
    ///
    /// Pushes render as hex, OP_0 as `OP_0`, and a top-level OP_RETURN
    /// followed by its trailing bytes as `OP_RETURN <hex>`.
    pub fn to_display_string(&self) -> String {
        match (&self.data, self.op) {
            (Some(data), OP_DATA_1..=OP_PUSHDATA4) => hex::encode(data),
            (Some(data), OP_RETURN) if !data.is_empty() => format!("OP_RETURN {}", hex::encode(data)),
            _ => opcode_to_string(self.op),
        }
    }
}

/// Lazy iterator over the chunks of a script.
///
/// Yields `Err(DataTooSmall)` once, for a push that runs past the end of
/// the script, and then stops.
pub struct Chunks<'a> {
    bytes: &'a [u8],
    pos: usize,
    conditional_depth: u32,
    failed: bool,
    opaque_return: bool,
}

impl<'a> Chunks<'a> {
    /// Start iterating over `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Chunks {
            bytes,
            pos: 0,
            conditional_depth: 0,
            failed: false,
            opaque_return: true,
        }
    }

    /// Iterate opcode by opcode, with OP_RETURN as a plain opcode.
    ///
    /// This is the walk script evaluation performs, so bytes after an
    /// OP_RETURN are still read as opcodes and pushes.
    pub fn opcodes(bytes: &'a [u8]) -> Self {
        Chunks {
            opaque_return: false,
            ..Chunks::new(bytes)
        }
    }

    /// Byte offset of the next chunk.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, start: usize, len: usize) -> Result<Vec<u8>, ScriptError> {
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(ScriptError::DataTooSmall(self.pos))?;
        let data = self.bytes[start..end].to_vec();
        self.pos = end;
        Ok(data)
    }

    fn length_prefix(&self, width: usize) -> Result<usize, ScriptError> {
        let start = self.pos + 1;
        let field = self
            .bytes
            .get(start..start + width)
            .ok_or(ScriptError::DataTooSmall(self.pos))?;
        let mut le = [0u8; 4];
        le[..width].copy_from_slice(field);
        Ok(u32::from_le_bytes(le) as usize)
    }

    fn read_chunk(&mut self) -> Result<ScriptChunk, ScriptError> {
        let op = self.bytes[self.pos];
        let data = match op {
            OP_DATA_1..=OP_DATA_75 => Some(self.take(self.pos + 1, op as usize)?),
            OP_PUSHDATA1 => {
                let len = self.length_prefix(1)?;
                Some(self.take(self.pos + 2, len)?)
            }
            OP_PUSHDATA2 => {
                let len = self.length_prefix(2)?;
                Some(self.take(self.pos + 3, len)?)
            }
            OP_PUSHDATA4 => {
                let len = self.length_prefix(4)?;
                Some(self.take(self.pos + 5, len)?)
            }
            OP_RETURN if self.opaque_return && self.conditional_depth == 0 => {
                // Everything after a top-level OP_RETURN is unparsed payload.
                let rest = self.bytes[self.pos + 1..].to_vec();
                self.pos = self.bytes.len();
                Some(rest)
            }
            _ => {
                match op {
                    OP_IF | OP_NOTIF | OP_VERIF | OP_VERNOTIF => self.conditional_depth += 1,
                    OP_ENDIF => self.conditional_depth = self.conditional_depth.saturating_sub(1),
                    _ => {}
                }
                self.pos += 1;
                None
            }
        };
        Ok(ScriptChunk { op, data })
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<ScriptChunk, ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        let chunk = self.read_chunk();
        self.failed = chunk.is_err();
        Some(chunk)
    }
}

/// Decode raw script bytes into a vector of `ScriptChunk` values.
///
/// # Returns
/// All chunks, or `DataTooSmall` if a push is truncated.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    Chunks::new(bytes).collect()
}

/// Compute the minimal push prefix for a payload of `data_len` bytes.
///
/// # Returns
/// The prefix bytes, or `DataTooBig` beyond the OP_PUSHDATA4 range.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len <= OP_DATA_75 as usize {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xFF {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xFFFF {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len <= 0xFFFF_FFFF {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::DataTooBig)
    }
}

/// Encode multiple payloads as consecutive minimal pushes.
///
/// # Returns
/// The concatenated pushes, or `PartTooBig(index)` for an oversized part.
pub fn encode_push_datas(parts: &[&[u8]]) -> Result<Vec<u8>, ScriptError> {
    let mut result = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let prefix = push_data_prefix(part.len()).map_err(|_| ScriptError::PartTooBig(i))?;
        result.extend_from_slice(&prefix);
        result.extend_from_slice(part);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_script_simple() {
        let bytes = hex::decode("05000102030401ff02abcd").unwrap();
        let parts = decode_script(&bytes).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].push_data(), Some(&[0, 1, 2, 3, 4][..]));
        assert_eq!(parts[2].push_data(), Some(&[0xab, 0xcd][..]));

        let data: Vec<&[u8]> = parts.iter().filter_map(|p| p.push_data()).collect();
        assert_eq!(hex::encode(encode_push_datas(&data).unwrap()), "05000102030401ff02abcd");
    }

    #[test]
    fn test_decode_script_empty() {
        assert!(decode_script(&[]).unwrap().is_empty());
    }

    /// Two OP_PUSHDATA1 pushes between OP_2 and OP_CHECKMULTISIG.
    #[test]
    fn test_decode_script_pushdata1() {
        let script_hex = "524c53ff0488b21e000000000000000000362f7a9030543db8751401c387d6a71e870f1895b3a62569d455e8ee5f5f5e5f03036624c6df96984db6b4e625b6707c017eb0e0d137cd13a0c989bfa77a4473fd000000004c53ff0488b21e0000000000000000008b20425398995f3c866ea6ce5c1828a516b007379cf97b136bffbdc86f75df14036454bad23b019eae34f10aff8b8d6d8deb18cb31354e5a169ee09d8a4560e8250000000052ae";
        let parts = decode_script(&hex::decode(script_hex).unwrap()).unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[1].op, OP_PUSHDATA1);
        assert_eq!(parts[1].push_data().map(<[u8]>::len), Some(0x53));
        assert_eq!(parts[4].op, OP_CHECKMULTISIG);
    }

    #[test]
    fn test_truncated_pushes() {
        for script in ["05000102", "4c", "4c05ff", "4d0100", "4e00000001ff"] {
            let bytes = hex::decode(script).unwrap();
            assert!(
                matches!(decode_script(&bytes), Err(ScriptError::DataTooSmall(_))),
                "{} should be truncated",
                script
            );
        }
    }

    /// Chunks before a truncated push are still yielded.
    #[test]
    fn test_lazy_iteration_stops_after_error() {
        let bytes = hex::decode("51760a0102").unwrap();
        let mut chunks = Chunks::new(&bytes);
        assert_eq!(chunks.next().unwrap().unwrap().op, OP_1);
        assert_eq!(chunks.next().unwrap().unwrap().op, OP_DUP);
        assert!(chunks.next().unwrap().is_err());
        assert!(chunks.next().is_none());
    }

    #[test]
    fn test_op_return_takes_the_rest() {
        let bytes = hex::decode("6a0401020304ff").unwrap();
        let parts = decode_script(&bytes).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].data.as_deref(), Some(&[0x04, 1, 2, 3, 4, 0xff][..]));
        assert_eq!(parts[0].to_display_string(), "OP_RETURN 0401020304ff");

        // inside a conditional OP_RETURN is an ordinary opcode
        let parts = decode_script(&hex::decode("636a6851").unwrap()).unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[1].to_display_string(), "OP_RETURN");
    }

    #[test]
    fn test_opcode_walk_reads_past_op_return() {
        let bytes = hex::decode("6a0401020304ff").unwrap();
        let parts: Vec<ScriptChunk> = Chunks::opcodes(&bytes).collect::<Result<_, _>>().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].op, OP_RETURN);
        assert_eq!(parts[0].data, None);
        assert_eq!(parts[1].push_data(), Some(&[1, 2, 3, 4][..]));
        assert_eq!(parts[2].op, 0xff);
    }

    #[test]
    fn test_push_data_prefix_boundaries() {
        assert_eq!(push_data_prefix(0).unwrap(), vec![0x00]);
        assert_eq!(push_data_prefix(75).unwrap(), vec![0x4b]);
        assert_eq!(push_data_prefix(76).unwrap(), vec![OP_PUSHDATA1, 76]);
        assert_eq!(push_data_prefix(255).unwrap(), vec![OP_PUSHDATA1, 0xff]);
        assert_eq!(push_data_prefix(256).unwrap(), vec![OP_PUSHDATA2, 0x00, 0x01]);
        assert_eq!(push_data_prefix(65536).unwrap(), vec![OP_PUSHDATA4, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_op_0_is_an_empty_push() {
        let parts = decode_script(&[OP_0, OP_CHECKSIG]).unwrap();
        assert!(parts[0].is_push());
        assert_eq!(parts[0].push_data(), Some(&[][..]));
        assert!(!parts[1].is_push());
        assert_eq!(parts[1].push_data(), None);
    }
}
