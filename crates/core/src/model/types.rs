use super::Name;
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    Invariant,
    In,
    Out,
}

/// Compact description of a type as written, enough to rebuild the
/// underlying type of a value class without resolving anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeBean {
    Class {
        class_id: Name,
        arguments: Vec<TypeArgument>,
        nullable: bool,
    },
    TypeParameter {
        name: Name,
        nullable: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    Star,
    Type { variance: Variance, bean: TypeBean },
}

/// Underlying types of a value class. Zero or one entries are stored inline.
pub type UnderlyingTypes = SmallVec<[TypeBean; 1]>;

/// Layout of a value class.
///
/// `is_inline` classes wrap zero or one type (zero only for malformed input);
/// multi-field value classes wrap at least one. The absence of a
/// representation is modelled as `Option::None` on the owning class, which is
/// a different state from a representation with no underlying types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueClassRepresentation {
    pub is_inline: bool,
    pub underlying_types: UnderlyingTypes,
}

impl ValueClassRepresentation {
    pub fn new(is_inline: bool, underlying_types: impl IntoIterator<Item = TypeBean>) -> Self {
        Self {
            is_inline,
            underlying_types: underlying_types.into_iter().collect(),
        }
    }

    pub fn inline(underlying: TypeBean) -> Self {
        Self::new(true, [underlying])
    }
}

/// A class name split into its package and its dotted path inside that
/// package, so `a.b.C.D` is `a.b` + `C.D`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassId {
    /// `None` for the root package.
    pub package: Option<Name>,
    pub relative_name: Name,
    pub is_local: bool,
}

impl ClassId {
    pub fn top_level(package: Option<Name>, name: impl Into<Name>) -> Self {
        Self {
            package,
            relative_name: name.into(),
            is_local: false,
        }
    }

    pub fn nested(&self, name: &str) -> Self {
        Self {
            package: self.package.clone(),
            relative_name: Name::new(format!("{}.{}", self.relative_name, name)),
            is_local: self.is_local,
        }
    }

    pub fn short_name(&self) -> &str {
        self.relative_name.rsplit('.').next().unwrap_or_default()
    }

    pub fn is_nested(&self) -> bool {
        self.relative_name.contains('.')
    }
}

/// `a/b/C.D`, with the package segments joined by `/`.
impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(package) = &self.package {
            write!(f, "{}/", package.replace('.', "/"))?;
        }
        f.write_str(&self.relative_name)
    }
}

impl TypeBean {
    pub fn class(class_id: impl Into<Name>) -> Self {
        TypeBean::Class {
            class_id: class_id.into(),
            arguments: Vec::new(),
            nullable: false,
        }
    }

    pub fn nullable(self) -> Self {
        match self {
            TypeBean::Class {
                class_id,
                arguments,
                ..
            } => TypeBean::Class {
                class_id,
                arguments,
                nullable: true,
            },
            TypeBean::TypeParameter { name, .. } => TypeBean::TypeParameter {
                name,
                nullable: true,
            },
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            TypeBean::Class { nullable, .. } | TypeBean::TypeParameter { nullable, .. } => {
                *nullable
            }
        }
    }

    /// Parse a type reference as written in source, e.g. `kotlin.collections.List<out T>?`
    /// or `Map<String, ? extends Number>`.
    ///
    /// Simple names listed in `type_params` become [`TypeBean::TypeParameter`].
    /// Returns `None` for text that is not a well-formed type reference.
    pub fn parse(text: &str, type_params: &[&str]) -> Option<TypeBean> {
        let mut parser = TypeTextParser {
            src: text,
            pos: 0,
            type_params,
        };
        let bean = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos == text.len() {
            Some(bean)
        } else {
            None
        }
    }
}

struct TypeTextParser<'a> {
    src: &'a str,
    pos: usize,
    type_params: &'a [&'a str],
}

impl<'a> TypeTextParser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = &self.src[self.pos..];
        if let Some(after) = rest.strip_prefix(keyword) {
            if after.starts_with(char::is_whitespace) {
                self.pos += keyword.len();
                return true;
            }
        }
        false
    }

    fn identifier(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' || c == '$' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let ident = &self.src[start..self.pos];
        if ident.is_empty() || ident.starts_with('.') || ident.ends_with('.') || ident.contains("..")
        {
            return None;
        }
        Some(ident)
    }

    fn parse_type(&mut self) -> Option<TypeBean> {
        self.skip_ws();
        let ident = self.identifier()?;
        self.skip_ws();

        let mut arguments = Vec::new();
        if self.eat('<') {
            loop {
                arguments.push(self.parse_argument()?);
                self.skip_ws();
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return None;
            }
        }
        self.skip_ws();
        let nullable = self.eat('?');

        let mut bean = if arguments.is_empty() && self.type_params.contains(&ident) {
            TypeBean::TypeParameter {
                name: Name::new(ident),
                nullable,
            }
        } else {
            TypeBean::Class {
                class_id: Name::new(ident),
                arguments,
                nullable,
            }
        };

        // Java array suffixes
        loop {
            self.skip_ws();
            if !self.eat('[') {
                break;
            }
            self.skip_ws();
            if !self.eat(']') {
                return None;
            }
            bean = TypeBean::Class {
                class_id: Name::new_static("Array"),
                arguments: vec![TypeArgument::Type {
                    variance: Variance::Invariant,
                    bean,
                }],
                nullable: false,
            };
        }
        Some(bean)
    }

    fn parse_argument(&mut self) -> Option<TypeArgument> {
        self.skip_ws();
        if self.eat('*') {
            return Some(TypeArgument::Star);
        }
        if self.eat('?') {
            self.skip_ws();
            let variance = if self.eat_keyword("extends") {
                Variance::Out
            } else if self.eat_keyword("super") {
                Variance::In
            } else {
                return Some(TypeArgument::Star);
            };
            let bean = self.parse_type()?;
            return Some(TypeArgument::Type { variance, bean });
        }
        let variance = if self.eat_keyword("out") {
            Variance::Out
        } else if self.eat_keyword("in") {
            Variance::In
        } else {
            Variance::Invariant
        };
        let bean = self.parse_type()?;
        Some(TypeArgument::Type { variance, bean })
    }
}

impl fmt::Display for TypeBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeBean::Class {
                class_id,
                arguments,
                nullable,
            } => {
                f.write_str(class_id)?;
                if !arguments.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                if *nullable {
                    f.write_str("?")?;
                }
                Ok(())
            }
            TypeBean::TypeParameter { name, nullable } => {
                f.write_str(name)?;
                if *nullable {
                    f.write_str("?")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArgument::Star => f.write_str("*"),
            TypeArgument::Type { variance, bean } => match variance {
                Variance::Invariant => write!(f, "{}", bean),
                Variance::In => write!(f, "in {}", bean),
                Variance::Out => write!(f, "out {}", bean),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Int", "Int")]
    #[case("kotlin.String?", "kotlin.String?")]
    #[case("List<out T>", "List<out T>")]
    #[case("Map<String, ? extends Number>", "Map<String, out Number>")]
    #[case("Comparator<*>", "Comparator<*>")]
    #[case("Map<K, V>?", "Map<K, V>?")]
    #[case("int[]", "Array<int>")]
    fn test_parse_and_render(#[case] input: &str, #[case] rendered: &str) {
        let bean = TypeBean::parse(input, &["T", "K", "V"]).unwrap();
        assert_eq!(bean.to_string(), rendered);
    }

    #[test]
    fn test_type_parameters_are_recognised() {
        let bean = TypeBean::parse("T?", &["T"]).unwrap();
        assert_eq!(
            bean,
            TypeBean::TypeParameter {
                name: Name::new("T"),
                nullable: true
            }
        );
        // qualified names never name a type parameter
        assert!(matches!(
            TypeBean::parse("a.T", &["T"]).unwrap(),
            TypeBean::Class { .. }
        ));
    }

    #[rstest]
    #[case("")]
    #[case("List<")]
    #[case("List<String")]
    #[case(".Foo")]
    #[case("Foo Bar")]
    #[case("a..b")]
    fn test_rejects_malformed_text(#[case] input: &str) {
        assert_eq!(TypeBean::parse(input, &[]), None);
    }

    #[test]
    fn test_small_representations_stay_inline() {
        let empty = ValueClassRepresentation::new(true, []);
        assert!(!empty.underlying_types.spilled());
        let single = ValueClassRepresentation::inline(TypeBean::class("Int"));
        assert!(!single.underlying_types.spilled());
        let many = ValueClassRepresentation::new(
            false,
            [TypeBean::class("Int"), TypeBean::class("Long")],
        );
        assert!(many.underlying_types.spilled());
    }

    #[test]
    fn test_class_id_nesting() {
        let outer = ClassId::top_level(Some(Name::new("a.b")), "C");
        let inner = outer.nested("D");
        assert_eq!(inner.relative_name.as_str(), "C.D");
        assert_eq!(inner.short_name(), "D");
        assert!(inner.is_nested());
        assert!(!outer.is_nested());
        assert_eq!(inner.to_string(), "a/b/C.D");
        assert_eq!(ClassId::top_level(None, "Main").to_string(), "Main");
    }
}
