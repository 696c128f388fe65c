use crate::syntax::SyntaxKind;
use std::fmt::Debug;

/// Defines language-specific naming rules for qualified names.
/// The stub builder only ever joins a container name with a member name;
/// resolution of references is not its concern.
pub trait NamingConvention: Send + Sync + Debug {
    /// The primary separator (e.g., "." for Kotlin/Java, "::" for Rust).
    fn separator(&self) -> &str;

    /// Get the separator between a container and a member based on their kinds.
    fn get_separator(&self, _parent: SyntaxKind, _child: SyntaxKind) -> &str {
        self.separator()
    }

    /// Qualify `name` with its container.
    ///
    /// `container` is `None` for declarations in the default (root) package.
    fn qualify(
        &self,
        container: Option<&str>,
        parent: SyntaxKind,
        child: SyntaxKind,
        name: &str,
    ) -> String {
        match container {
            Some(prefix) if !prefix.is_empty() => {
                let mut fq = String::with_capacity(prefix.len() + name.len() + 2);
                fq.push_str(prefix);
                fq.push_str(self.get_separator(parent, child));
                fq.push_str(name);
                fq
            }
            _ => name.to_string(),
        }
    }

    /// Last segment of a qualified name.
    fn short_name<'a>(&self, fq_name: &'a str) -> &'a str {
        fq_name
            .rsplit(self.separator())
            .next()
            .unwrap_or(fq_name)
    }
}

/// A default "Dot" convention (e.g. for Kotlin/Java-ish languages).
#[derive(Debug, Default, Clone, Copy)]
pub struct DotPathConvention;

impl NamingConvention for DotPathConvention {
    fn separator(&self) -> &str {
        "."
    }
}
