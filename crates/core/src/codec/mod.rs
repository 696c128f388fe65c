//! Binary codec for stub trees.
//!
//! A stream is the magic `STUB`, the format version and then the root node.
//! Each node is its kind tag, its payload fields, its child count and then
//! its children, depth first.

pub mod name_table;
pub mod serializer;
pub mod stream;

pub use serializer::StubSerializer;
pub use stream::{StubInputStream, StubOutputStream};

use crate::error::{Result, StubError};
use crate::model::{
    ClassStub, FileStub, FunctionStub, ObjectStub, PropertyDelegateStub, PropertyStub, StubData,
    StubId, StubKind, StubRef, StubTree, StubTreeBuilder,
};

pub const MAGIC: &[u8; 4] = b"STUB";

/// Bumped whenever the node or payload layout changes.
pub const STUB_FORMAT_VERSION: u64 = 4;

pub const DEFAULT_MAX_DEPTH: usize = 256;

pub fn is_stub_stream(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

pub fn serialize(tree: &StubTree) -> Result<Vec<u8>> {
    serialize_with_limit(tree, DEFAULT_MAX_DEPTH)
}

/// Encode a stub tree, refusing trees that [`deserialize_with_limit`] would
/// reject for the same `max_depth`.
pub fn serialize_with_limit(tree: &StubTree, max_depth: usize) -> Result<Vec<u8>> {
    let mut out = StubOutputStream::new();
    out.write_raw(MAGIC);
    out.write_varint(STUB_FORMAT_VERSION)?;
    write_node(&mut out, tree.root(), 1, max_depth)?;
    Ok(out.into_bytes())
}

fn write_node(
    out: &mut StubOutputStream,
    stub: StubRef<'_>,
    depth: usize,
    max_depth: usize,
) -> Result<()> {
    if depth > max_depth {
        return Err(StubError::InvalidTree(format!(
            "nesting deeper than {} levels",
            max_depth
        )));
    }
    out.write_varint(stub.kind().tag() as u64)?;
    match stub.data() {
        StubData::File(data) => data.serialize(out)?,
        StubData::Class(data) => data.serialize(out)?,
        StubData::Object(data) => data.serialize(out)?,
        StubData::Function(data) => data.serialize(out)?,
        StubData::Property(data) => data.serialize(out)?,
        StubData::PropertyDelegate(data) => data.serialize(out)?,
    }
    let children: Vec<_> = stub.children().collect();
    out.write_varint(children.len() as u64)?;
    for child in children {
        write_node(out, child, depth + 1, max_depth)?;
    }
    Ok(())
}

pub fn deserialize(bytes: &[u8]) -> Result<StubTree> {
    deserialize_with_limit(bytes, DEFAULT_MAX_DEPTH)
}

/// Decode a stub stream, rejecting trees nested deeper than `max_depth`.
pub fn deserialize_with_limit(bytes: &[u8], max_depth: usize) -> Result<StubTree> {
    let mut input = StubInputStream::new(bytes, max_depth);

    let magic = input
        .read_raw(MAGIC.len())
        .map_err(|_| StubError::corrupt("stream too short for header"))?;
    if magic != MAGIC {
        return Err(StubError::corrupt("bad magic"));
    }
    let version = input.read_varint()?;
    if version != STUB_FORMAT_VERSION {
        return Err(StubError::corrupt(format!(
            "format version {} (expected {})",
            version, STUB_FORMAT_VERSION
        )));
    }

    input.descend()?;
    let kind = read_kind(&mut input)?;
    if kind != StubKind::File {
        return Err(StubError::corrupt(format!(
            "root must be a file, found {}",
            kind
        )));
    }
    let mut builder = StubTreeBuilder::new(FileStub::deserialize(&mut input)?);
    read_children(&mut input, &mut builder, StubId::ROOT)?;
    input.ascend();

    if input.remaining() != 0 {
        return Err(StubError::corrupt(format!(
            "{} trailing bytes after root",
            input.remaining()
        )));
    }
    Ok(builder.finish())
}

fn read_kind(input: &mut StubInputStream<'_>) -> Result<StubKind> {
    let tag = input.read_varint()?;
    u8::try_from(tag)
        .ok()
        .and_then(StubKind::from_tag)
        .ok_or_else(|| StubError::corrupt(format!("unknown kind tag {}", tag)))
}

fn read_children(
    input: &mut StubInputStream<'_>,
    builder: &mut StubTreeBuilder,
    parent: StubId,
) -> Result<()> {
    let count = input.read_count("child")?;
    for _ in 0..count {
        read_node(input, builder, parent)?;
    }
    Ok(())
}

fn read_node(
    input: &mut StubInputStream<'_>,
    builder: &mut StubTreeBuilder,
    parent: StubId,
) -> Result<()> {
    input.descend()?;

    let kind = read_kind(input)?;
    let data: StubData = match kind {
        StubKind::File => {
            return Err(StubError::corrupt("nested file stub"));
        }
        StubKind::Class | StubKind::EnumEntry => ClassStub::deserialize(input)?.into(),
        StubKind::Object => ObjectStub::deserialize(input)?.into(),
        StubKind::Function => FunctionStub::deserialize(input)?.into(),
        StubKind::Property => PropertyStub::deserialize(input)?.into(),
        StubKind::PropertyDelegate => PropertyDelegateStub::deserialize(input)?.into(),
    };
    if data.kind() != kind {
        return Err(StubError::corrupt(format!(
            "kind tag {} disagrees with payload ({})",
            kind,
            data.kind()
        )));
    }

    let id = builder
        .push_child(parent, data)
        .map_err(|e| StubError::corrupt(e.to_string()))?;
    read_children(input, builder, id)?;

    input.ascend();
    Ok(())
}
