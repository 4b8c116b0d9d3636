//! The GenLayer calldata format, used for contract call arguments and view results.
//!
//! Every value starts with a ULEB128 header. The low three bits of the header are the type and the remaining bits
//! are the type's parameter: the value of an integer, or the length of a byte string, string, array or map. Map
//! keys are written as a length-prefixed UTF-8 string without a header and are sorted.

use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde_json::{Number, Value as JsonValue};
use thiserror::Error;

const BITS_IN_TYPE: u32 = 3;

const TYPE_SPECIAL: u8 = 0;
const TYPE_PINT: u8 = 1;
const TYPE_NINT: u8 = 2;
const TYPE_BYTES: u8 = 3;
const TYPE_STR: u8 = 4;
const TYPE_ARR: u8 = 5;
const TYPE_MAP: u8 = 6;

const SPECIAL_NULL: u128 = 0;
const SPECIAL_FALSE: u128 = 1;
const SPECIAL_TRUE: u128 = 2;
const SPECIAL_ADDR: u128 = 3;

/// Maximum nesting of arrays and maps accepted by [decode].
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i128),
    Bytes(Vec<u8>),
    Str(String),
    Address(Address),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl Value {
    /// The payload of a method call: `{"method": method, "args": args}`.
    pub fn method_call(method: &str, args: impl IntoIterator<Item = Value>) -> Value {
        Value::Map(BTreeMap::from([
            ("method".to_owned(), Value::from(method)),
            ("args".to_owned(), Value::Array(args.into_iter().collect())),
        ]))
    }

    /// Converts to JSON. Byte strings and addresses become `0x`-prefixed hex strings and integers which do not fit
    /// in 64 bits become decimal strings.
    pub fn into_json(self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Int(i) => i64::try_from(i)
                .map(|i| JsonValue::Number(Number::from(i)))
                .or_else(|_| u64::try_from(i).map(|u| JsonValue::Number(Number::from(u))))
                .unwrap_or_else(|_| JsonValue::String(i.to_string())),
            Value::Bytes(b) => JsonValue::String(format!("0x{}", hex::encode(b))),
            Value::Str(s) => JsonValue::String(s),
            Value::Address(a) => JsonValue::String(a.to_string()),
            Value::Array(items) => {
                JsonValue::Array(items.into_iter().map(Value::into_json).collect())
            }
            Value::Map(entries) => JsonValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalldataError {
    #[error("unexpected end of calldata")]
    UnexpectedEnd,
    #[error("integer in calldata is too large")]
    Overflow,
    #[error("unknown calldata type {0}")]
    UnknownType(u8),
    #[error("unknown special value {0}")]
    UnknownSpecial(u128),
    #[error("calldata string is not valid UTF-8")]
    InvalidUtf8,
    #[error("calldata is nested more than {MAX_DEPTH} levels deep")]
    TooDeep,
    #[error("{0} trailing bytes after calldata value")]
    TrailingBytes(usize),
}

pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => write_header(out, SPECIAL_NULL, TYPE_SPECIAL),
        Value::Bool(false) => write_header(out, SPECIAL_FALSE, TYPE_SPECIAL),
        Value::Bool(true) => write_header(out, SPECIAL_TRUE, TYPE_SPECIAL),
        Value::Address(address) => {
            write_header(out, SPECIAL_ADDR, TYPE_SPECIAL);
            out.extend_from_slice(address.as_slice());
        }
        Value::Int(i) if *i >= 0 => write_header(out, i.unsigned_abs(), TYPE_PINT),
        Value::Int(i) => write_header(out, i.unsigned_abs() - 1, TYPE_NINT),
        Value::Bytes(bytes) => {
            write_header(out, bytes.len() as u128, TYPE_BYTES);
            out.extend_from_slice(bytes);
        }
        Value::Str(s) => {
            write_header(out, s.len() as u128, TYPE_STR);
            out.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            write_header(out, items.len() as u128, TYPE_ARR);
            for item in items {
                encode_into(item, out);
            }
        }
        Value::Map(entries) => {
            write_header(out, entries.len() as u128, TYPE_MAP);
            for (key, value) in entries {
                write_uleb128(out, key.len() as u128);
                out.extend_from_slice(key.as_bytes());
                encode_into(value, out);
            }
        }
    }
}

// Headers carry up to 125 bits of payload. Larger integers are not supported.
fn write_header(out: &mut Vec<u8>, payload: u128, ty: u8) {
    write_uleb128(out, (payload << BITS_IN_TYPE) | u128::from(ty));
}

fn write_uleb128(out: &mut Vec<u8>, mut n: u128) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Decodes a single value which must span the whole input.
pub fn decode(data: &[u8]) -> Result<Value, CalldataError> {
    let mut reader = Reader {
        data,
        pos: 0,
        depth: 0,
    };
    let value = reader.value()?;
    match data.len() - reader.pos {
        0 => Ok(value),
        n => Err(CalldataError::TrailingBytes(n)),
    }
}

fn length(payload: u128) -> Result<usize, CalldataError> {
    usize::try_from(payload).map_err(|_| CalldataError::Overflow)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CalldataError> {
        let end = self.pos.checked_add(n).ok_or(CalldataError::UnexpectedEnd)?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(CalldataError::UnexpectedEnd)?;
        self.pos = end;
        Ok(slice)
    }

    fn uleb128(&mut self) -> Result<u128, CalldataError> {
        let mut result: u128 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.take(1)?[0];
            let bits = u128::from(byte & 0x7f);
            if shift >= 128 || (bits << shift) >> shift != bits {
                return Err(CalldataError::Overflow);
            }
            result |= bits << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    fn string(&mut self, len: usize) -> Result<String, CalldataError> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CalldataError::InvalidUtf8)
    }

    /// Reads `len` values nested one level below the current one.
    fn nested<T>(
        &mut self,
        len: usize,
        mut item: impl FnMut(&mut Self) -> Result<T, CalldataError>,
    ) -> Result<Vec<T>, CalldataError> {
        if self.depth == MAX_DEPTH {
            return Err(CalldataError::TooDeep);
        }
        self.depth += 1;
        let mut items = Vec::new();
        for _ in 0..len {
            items.push(item(self)?);
        }
        self.depth -= 1;
        Ok(items)
    }

    fn value(&mut self) -> Result<Value, CalldataError> {
        let header = self.uleb128()?;
        let ty = (header & 0b111) as u8;
        let payload = header >> BITS_IN_TYPE;

        Ok(match ty {
            TYPE_SPECIAL => match payload {
                SPECIAL_NULL => Value::Null,
                SPECIAL_FALSE => Value::Bool(false),
                SPECIAL_TRUE => Value::Bool(true),
                SPECIAL_ADDR => Value::Address(Address::from_slice(self.take(20)?)),
                other => return Err(CalldataError::UnknownSpecial(other)),
            },
            TYPE_PINT => Value::Int(i128::try_from(payload).map_err(|_| CalldataError::Overflow)?),
            TYPE_NINT => Value::Int(
                i128::try_from(payload)
                    .map(|p| -p - 1)
                    .map_err(|_| CalldataError::Overflow)?,
            ),
            TYPE_BYTES => {
                let len = length(payload)?;
                Value::Bytes(self.take(len)?.to_vec())
            }
            TYPE_STR => {
                let len = length(payload)?;
                Value::Str(self.string(len)?)
            }
            TYPE_ARR => Value::Array(self.nested(length(payload)?, Self::value)?),
            TYPE_MAP => {
                let entries = self.nested(length(payload)?, |reader| {
                    let key_len = length(reader.uleb128()?)?;
                    let key = reader.string(key_len)?;
                    Ok((key, reader.value()?))
                })?;
                Value::Map(entries.into_iter().collect())
            }
            other => return Err(CalldataError::UnknownType(other)),
        })
    }
}
