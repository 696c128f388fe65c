use super::kind::StubKind;
use super::types::{ClassId, ValueClassRepresentation};
use super::Name;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStub {
    /// `None` for the root package.
    pub package_fq_name: Option<Name>,
}

/// Payload shared by classes, interfaces, enum classes and enum entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassStub {
    pub name: Option<Name>,
    /// `None` for local classes and anything nested in one.
    pub fq_name: Option<Name>,
    /// Package and relative name; `None` wherever `fq_name` is.
    pub class_id: Option<ClassId>,
    /// Supertype references as written (short form, unresolved).
    pub super_names: Vec<Name>,
    pub is_interface: bool,
    pub is_enum_entry: bool,
    pub is_local: bool,
    pub is_top_level: bool,
    pub value_class: Option<ValueClassRepresentation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectStub {
    pub name: Option<Name>,
    pub fq_name: Option<Name>,
    pub super_names: Vec<Name>,
    pub is_companion: bool,
    pub is_local: bool,
    pub is_top_level: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionStub {
    pub name: Option<Name>,
    pub fq_name: Option<Name>,
    pub is_top_level: bool,
    pub is_extension: bool,
    pub has_body: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStub {
    pub name: Option<Name>,
    pub fq_name: Option<Name>,
    pub is_var: bool,
    pub is_top_level: bool,
    pub is_extension: bool,
    pub has_initializer: bool,
    pub has_delegate: bool,
    pub has_return_type_ref: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertyDelegateStub {
    /// `false` for compiled code and for `by` clauses without an expression.
    pub has_expression: bool,
}

/// Kind-specific content of a stub node. The variant fixes the node's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubData {
    File(FileStub),
    Class(ClassStub),
    Object(ObjectStub),
    Function(FunctionStub),
    Property(PropertyStub),
    PropertyDelegate(PropertyDelegateStub),
}

impl StubData {
    pub fn kind(&self) -> StubKind {
        match self {
            StubData::File(_) => StubKind::File,
            StubData::Class(c) if c.is_enum_entry => StubKind::EnumEntry,
            StubData::Class(_) => StubKind::Class,
            StubData::Object(_) => StubKind::Object,
            StubData::Function(_) => StubKind::Function,
            StubData::Property(_) => StubKind::Property,
            StubData::PropertyDelegate(_) => StubKind::PropertyDelegate,
        }
    }

    pub fn name(&self) -> Option<&Name> {
        match self {
            StubData::Class(c) => c.name.as_ref(),
            StubData::Object(o) => o.name.as_ref(),
            StubData::Function(f) => f.name.as_ref(),
            StubData::Property(p) => p.name.as_ref(),
            StubData::File(_) | StubData::PropertyDelegate(_) => None,
        }
    }

    /// Qualified name of the declaration; the package name for files.
    pub fn qualified_name(&self) -> Option<&Name> {
        match self {
            StubData::File(f) => f.package_fq_name.as_ref(),
            StubData::Class(c) => c.fq_name.as_ref(),
            StubData::Object(o) => o.fq_name.as_ref(),
            StubData::Function(f) => f.fq_name.as_ref(),
            StubData::Property(p) => p.fq_name.as_ref(),
            StubData::PropertyDelegate(_) => None,
        }
    }

    pub fn super_names(&self) -> &[Name] {
        match self {
            StubData::Class(c) => &c.super_names,
            StubData::Object(o) => &o.super_names,
            _ => &[],
        }
    }

    pub fn is_top_level(&self) -> bool {
        match self {
            StubData::Class(c) => c.is_top_level,
            StubData::Object(o) => o.is_top_level,
            StubData::Function(f) => f.is_top_level,
            StubData::Property(p) => p.is_top_level,
            StubData::File(_) | StubData::PropertyDelegate(_) => false,
        }
    }

    pub fn is_local(&self) -> bool {
        match self {
            StubData::Class(c) => c.is_local,
            StubData::Object(o) => o.is_local,
            _ => false,
        }
    }

    /// Whether this node records detail-only content (an initializer, a
    /// delegate expression, a body) that a detailed tree could supply.
    pub fn has_detail_expression(&self) -> bool {
        match self {
            StubData::Property(p) => p.has_initializer,
            StubData::PropertyDelegate(d) => d.has_expression,
            StubData::Function(f) => f.has_body,
            _ => false,
        }
    }
}

impl From<FileStub> for StubData {
    fn from(value: FileStub) -> Self {
        StubData::File(value)
    }
}

impl From<ClassStub> for StubData {
    fn from(value: ClassStub) -> Self {
        StubData::Class(value)
    }
}

impl From<ObjectStub> for StubData {
    fn from(value: ObjectStub) -> Self {
        StubData::Object(value)
    }
}

impl From<FunctionStub> for StubData {
    fn from(value: FunctionStub) -> Self {
        StubData::Function(value)
    }
}

impl From<PropertyStub> for StubData {
    fn from(value: PropertyStub) -> Self {
        StubData::Property(value)
    }
}

impl From<PropertyDelegateStub> for StubData {
    fn from(value: PropertyDelegateStub) -> Self {
        StubData::PropertyDelegate(value)
    }
}
