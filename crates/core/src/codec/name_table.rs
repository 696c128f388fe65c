//! Per-stream name pool.
//!
//! Every name is written as a reference. `0` means "no name", `k + 1` refers
//! to the k-th distinct name seen so far in the stream, and `len + 1` (the
//! next free slot) introduces a new name whose literal follows immediately.

use crate::error::{Result, StubError};
use crate::model::Name;
use lasso::{Key, Rodeo};

pub const ABSENT: u64 = 0;

/// What the writer has to emit for one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRef<'a> {
    Absent,
    Existing(u64),
    New { reference: u64, literal: &'a str },
}

impl NameRef<'_> {
    pub fn reference(&self) -> u64 {
        match self {
            NameRef::Absent => ABSENT,
            NameRef::Existing(r) => *r,
            NameRef::New { reference, .. } => *reference,
        }
    }
}

#[derive(Debug, Default)]
pub struct NameTableWriter {
    rodeo: Rodeo,
}

impl NameTableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    pub fn reference<'a>(&mut self, name: Option<&'a str>) -> NameRef<'a> {
        let Some(name) = name else {
            return NameRef::Absent;
        };
        if let Some(spur) = self.rodeo.get(name) {
            return NameRef::Existing(spur.into_usize() as u64 + 1);
        }
        let reference = self.rodeo.len() as u64 + 1;
        self.rodeo.get_or_intern(name);
        NameRef::New {
            reference,
            literal: name,
        }
    }
}

#[derive(Debug, Default)]
pub struct NameTableReader {
    names: Vec<Name>,
}

/// How the reader has to interpret a reference it just decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Absent,
    Known(Name),
    /// The literal follows in the stream and must be registered with
    /// [`NameTableReader::register`].
    Pending,
}

impl NameTableReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn resolve(&self, reference: u64) -> Result<Resolved> {
        let next = self.names.len() as u64 + 1;
        match reference {
            ABSENT => Ok(Resolved::Absent),
            r if r == next => Ok(Resolved::Pending),
            r if r < next => Ok(Resolved::Known(self.names[(r - 1) as usize].clone())),
            r => Err(StubError::corrupt(format!(
                "name reference {} out of range (table holds {})",
                r,
                self.names.len()
            ))),
        }
    }

    pub fn register(&mut self, literal: &str) -> Name {
        let name = Name::new(literal);
        self.names.push(name.clone());
        name
    }
}
