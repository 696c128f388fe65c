use stubscope_plugin::{NamingConvention, SyntaxKind};

/// Separator used between a type and its members (methods, fields).
pub const MEMBER_SEPARATOR: char = '#';

/// Separator used between packages and between package/class.
pub const TYPE_SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, Default)]
pub struct JavaNamingConvention;

impl JavaNamingConvention {
    /// Split a member name into (type_fqn, member_name).
    ///
    /// Returns `None` if the name does not contain a member separator.
    ///
    /// # Examples
    /// ```
    /// use stubscope_java::JavaNamingConvention;
    /// assert_eq!(
    ///     JavaNamingConvention::parse_member_fqn("com.example.Account#deposit"),
    ///     Some(("com.example.Account", "deposit"))
    /// );
    /// ```
    pub fn parse_member_fqn(fqn: &str) -> Option<(&str, &str)> {
        fqn.rfind(MEMBER_SEPARATOR)
            .map(|pos| (&fqn[..pos], &fqn[pos + 1..]))
    }

    pub fn is_member_fqn(fqn: &str) -> bool {
        fqn.contains(MEMBER_SEPARATOR)
    }
}

impl NamingConvention for JavaNamingConvention {
    fn separator(&self) -> &str {
        "."
    }

    fn get_separator(&self, parent: SyntaxKind, child: SyntaxKind) -> &str {
        match (parent, child) {
            (
                SyntaxKind::Class | SyntaxKind::EnumEntry,
                SyntaxKind::Function | SyntaxKind::Property,
            ) => "#",
            _ => ".",
        }
    }

    fn short_name<'a>(&self, fq_name: &'a str) -> &'a str {
        fq_name
            .rsplit([TYPE_SEPARATOR, MEMBER_SEPARATOR, '$'])
            .next()
            .unwrap_or(fq_name)
    }
}
