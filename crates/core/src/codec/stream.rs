//! Primitive reader/writer over a stub byte stream.
//!
//! Integers, booleans and string literals are MessagePack-encoded, so small
//! values take a single byte.

use super::name_table::{NameRef, NameTableReader, NameTableWriter, Resolved};
use crate::error::{Result, StubError};
use crate::model::Name;
use std::fmt::Display;

fn write_failed(err: impl Display) -> StubError {
    StubError::Io(std::io::Error::other(err.to_string()))
}

fn read_failed(what: &str, err: impl Display) -> StubError {
    StubError::corrupt(format!("failed to read {}: {}", what, err))
}

#[derive(Debug, Default)]
pub struct StubOutputStream {
    buf: Vec<u8>,
    names: NameTableWriter,
}

impl StubOutputStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_varint(&mut self, value: u64) -> Result<()> {
        rmp::encode::write_uint(&mut self.buf, value).map_err(write_failed)?;
        Ok(())
    }

    pub fn write_signed(&mut self, value: i64) -> Result<()> {
        rmp::encode::write_sint(&mut self.buf, value).map_err(write_failed)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        rmp::encode::write_bool(&mut self.buf, value).map_err(write_failed)?;
        Ok(())
    }

    pub fn write_literal(&mut self, value: &str) -> Result<()> {
        rmp::encode::write_str(&mut self.buf, value).map_err(write_failed)?;
        Ok(())
    }

    pub fn write_name(&mut self, name: Option<&Name>) -> Result<()> {
        let name_ref = self.names.reference(name.map(Name::as_str));
        self.write_varint(name_ref.reference())?;
        if let NameRef::New { literal, .. } = name_ref {
            self.write_literal(literal)?;
        }
        Ok(())
    }

    pub fn write_names(&mut self, names: &[Name]) -> Result<()> {
        self.write_varint(names.len() as u64)?;
        for name in names {
            self.write_name(Some(name))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug)]
pub struct StubInputStream<'a> {
    buf: &'a [u8],
    names: NameTableReader,
    depth: usize,
    max_depth: usize,
}

impl<'a> StubInputStream<'a> {
    pub fn new(bytes: &'a [u8], max_depth: usize) -> Self {
        Self {
            buf: bytes,
            names: NameTableReader::new(),
            depth: 0,
            max_depth,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.buf.len() < len {
            return Err(StubError::corrupt(format!(
                "unexpected end of stream: wanted {} bytes, {} left",
                len,
                self.buf.len()
            )));
        }
        let (head, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(head)
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        rmp::decode::read_int::<u64, _>(&mut self.buf).map_err(|e| read_failed("varint", e))
    }

    pub fn read_signed(&mut self) -> Result<i64> {
        rmp::decode::read_int::<i64, _>(&mut self.buf).map_err(|e| read_failed("signed int", e))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        rmp::decode::read_bool(&mut self.buf).map_err(|e| read_failed("bool", e))
    }

    /// Read a length prefix and make sure the stream can still hold that
    /// many entries of at least one byte each.
    pub fn read_count(&mut self, what: &str) -> Result<usize> {
        let count = self.read_varint()?;
        if count > self.buf.len() as u64 {
            return Err(StubError::corrupt(format!(
                "{} count {} exceeds remaining {} bytes",
                what,
                count,
                self.buf.len()
            )));
        }
        Ok(count as usize)
    }

    pub fn read_literal(&mut self) -> Result<&'a str> {
        let len = rmp::decode::read_str_len(&mut self.buf).map_err(|e| read_failed("string", e))?;
        let bytes = self.read_raw(len as usize)?;
        std::str::from_utf8(bytes).map_err(|e| read_failed("string", e))
    }

    pub fn read_name(&mut self) -> Result<Option<Name>> {
        let reference = self.read_varint()?;
        match self.names.resolve(reference)? {
            Resolved::Absent => Ok(None),
            Resolved::Known(name) => Ok(Some(name)),
            Resolved::Pending => {
                let literal = self.read_literal()?;
                Ok(Some(self.names.register(literal)))
            }
        }
    }

    pub fn read_required_name(&mut self, what: &str) -> Result<Name> {
        self.read_name()?
            .ok_or_else(|| StubError::corrupt(format!("missing {}", what)))
    }

    pub fn read_names(&mut self) -> Result<Vec<Name>> {
        let count = self.read_count("name list")?;
        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            names.push(self.read_required_name("name list entry")?);
        }
        Ok(names)
    }

    /// Enter one level of nesting; fails once `max_depth` is exceeded.
    pub fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(StubError::corrupt(format!(
                "nesting deeper than {} levels",
                self.max_depth
            )));
        }
        Ok(())
    }

    pub fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
