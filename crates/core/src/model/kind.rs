use std::fmt;

/// Declaration category of a stub node.
///
/// `Class` and `EnumEntry` share the [`ClassStub`](super::ClassStub) payload;
/// the payload's `is_enum_entry` flag selects between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StubKind {
    File,
    Class,
    EnumEntry,
    Object,
    Function,
    Property,
    PropertyDelegate,
}

impl StubKind {
    pub const ALL: [StubKind; 7] = [
        StubKind::File,
        StubKind::Class,
        StubKind::EnumEntry,
        StubKind::Object,
        StubKind::Function,
        StubKind::Property,
        StubKind::PropertyDelegate,
    ];

    /// Wire tag used by the stub codec. Tags are part of the persisted format.
    pub fn tag(self) -> u8 {
        match self {
            StubKind::File => 0,
            StubKind::Class => 1,
            StubKind::EnumEntry => 2,
            StubKind::Object => 3,
            StubKind::Function => 4,
            StubKind::Property => 5,
            StubKind::PropertyDelegate => 6,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Kinds that contribute facts to the index.
    pub fn is_declaration(self) -> bool {
        !matches!(self, StubKind::File | StubKind::PropertyDelegate)
    }

    pub fn is_class_like(self) -> bool {
        matches!(self, StubKind::Class | StubKind::EnumEntry | StubKind::Object)
    }

    /// Whether a node of this kind may own a child of kind `child`.
    pub fn can_contain(self, child: StubKind) -> bool {
        use StubKind::*;
        match self {
            File => matches!(child, Class | Object | Function | Property),
            Class => matches!(child, Class | EnumEntry | Object | Function | Property),
            EnumEntry | Object => matches!(child, Class | Object | Function | Property),
            // local declarations
            Function => matches!(child, Class | Object),
            Property => matches!(child, PropertyDelegate),
            PropertyDelegate => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StubKind::File => "file",
            StubKind::Class => "class",
            StubKind::EnumEntry => "enum_entry",
            StubKind::Object => "object",
            StubKind::Function => "function",
            StubKind::Property => "property",
            StubKind::PropertyDelegate => "property_delegate",
        }
    }
}

impl fmt::Display for StubKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
