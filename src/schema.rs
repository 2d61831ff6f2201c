//! Declaration types delivered by the host-language parser
//!
//! One [`SourceFile`] manifest is produced per host source file. Declarations
//! are immutable once loaded; everything downstream works on borrowed views.
//!
//! ## Example manifest
//! ```json
//! {
//!   "file": "user.go",
//!   "declarations": [
//!     { "name": "UserID", "kind": "alias", "underlying": { "kind": "ident", "name": "string" } },
//!     {
//!       "name": "User",
//!       "kind": "struct",
//!       "members": [
//!         { "names": ["ID"], "type": { "kind": "ident", "name": "UserID" }, "tag": "json:\"id\"" },
//!         { "names": [], "type": { "kind": "ident", "name": "Audit" } }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// A type expression as written in the host language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    /// Bare identifier: `int`, `User`, `any`
    Ident { name: String },
    /// Package-qualified identifier: `time.Time`
    Qualified { package: String, name: String },
    /// `*T`
    Pointer { elem: Box<TypeExpr> },
    /// `[]T`
    Slice { elem: Box<TypeExpr> },
    /// `[N]T`
    Array {
        #[serde(default)]
        len: Option<u64>,
        elem: Box<TypeExpr>,
    },
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// Inline `interface{ ... }`
    Interface,
    /// Inline anonymous `struct{ ... }`
    Struct,
    /// Function type
    Func,
    /// Channel type
    Chan {
        #[serde(default)]
        elem: Option<Box<TypeExpr>>,
    },
    /// Any shape the parser reports that this tool does not model
    #[serde(other)]
    Opaque,
}

impl TypeExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        TypeExpr::Ident { name: name.into() }
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn pointer(elem: TypeExpr) -> Self {
        TypeExpr::Pointer { elem: Box::new(elem) }
    }

    pub fn slice(elem: TypeExpr) -> Self {
        TypeExpr::Slice { elem: Box::new(elem) }
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Ident { name } => write!(f, "{}", name),
            TypeExpr::Qualified { package, name } => write!(f, "{}.{}", package, name),
            TypeExpr::Pointer { elem } => write!(f, "*{}", elem),
            TypeExpr::Slice { elem } => write!(f, "[]{}", elem),
            TypeExpr::Array { len: Some(n), elem } => write!(f, "[{}]{}", n, elem),
            TypeExpr::Array { len: None, elem } => write!(f, "[...]{}", elem),
            TypeExpr::Map { key, value } => write!(f, "map[{}]{}", key, value),
            TypeExpr::Interface => write!(f, "interface{{}}"),
            TypeExpr::Struct => write!(f, "struct{{}}"),
            TypeExpr::Func => write!(f, "func"),
            TypeExpr::Chan { elem: Some(elem) } => write!(f, "chan {}", elem),
            TypeExpr::Chan { elem: None } => write!(f, "chan"),
            TypeExpr::Opaque => write!(f, "<opaque>"),
        }
    }
}

/// One member line of a struct declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Declared names; empty for an embedded member
    #[serde(default)]
    pub names: Vec<String>,
    /// Declared type
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    /// Raw struct tag, with or without surrounding backquotes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Member {
    /// A named member (one or more names sharing a type)
    pub fn named<I, S>(names: I, ty: TypeExpr) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ty,
            tag: None,
        }
    }

    /// An embedded member
    pub fn embedded(ty: TypeExpr) -> Self {
        Self {
            names: Vec::new(),
            ty,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

/// Kind of a top-level type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Struct,
    Alias,
    Interface,
}

/// A named top-level type declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    /// Struct members, in source order
    #[serde(default)]
    pub members: Vec<Member>,
    /// Underlying type of an alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying: Option<TypeExpr>,
    /// Host file this declaration came from; filled from the manifest when absent
    #[serde(default)]
    pub origin_file: String,
}

impl Declaration {
    pub fn structure(name: impl Into<String>, origin_file: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            kind: DeclKind::Struct,
            members,
            underlying: None,
            origin_file: origin_file.into(),
        }
    }

    pub fn alias(name: impl Into<String>, origin_file: impl Into<String>, underlying: TypeExpr) -> Self {
        Self {
            name: name.into(),
            kind: DeclKind::Alias,
            members: Vec::new(),
            underlying: Some(underlying),
            origin_file: origin_file.into(),
        }
    }

    pub fn interface(name: impl Into<String>, origin_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DeclKind::Interface,
            members: Vec::new(),
            underlying: None,
            origin_file: origin_file.into(),
        }
    }
}

/// Declarations parsed from a single host source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Host file name, e.g. `user.go`
    pub file: String,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

/// Whether a host-language identifier is exported (starts with an uppercase letter)
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map(char::is_uppercase).unwrap_or(false)
}
