//! Domain entities: the symbol inventory model

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Returns true for names hidden by the leading-underscore convention.
pub fn is_private_name(name: &str) -> bool {
    name.starts_with('_')
}

/// Public/private classification of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Classify a name inside a scope that may declare an export list.
    ///
    /// The prefix rule is applied first: an underscore name is private even
    /// when the export list names it. Any other name is public unless an
    /// export list exists and omits it.
    pub fn classify(name: &str, exports: Option<&ExportList>) -> Self {
        if is_private_name(name) {
            return Visibility::Private;
        }
        match exports {
            Some(list) if !list.contains(name) => Visibility::Private,
            _ => Visibility::Public,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Constant,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Constant => "constant",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit allow-list of public names (`__all__`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportList {
    names: Vec<String>,
}

impl ExportList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        list.extend(names);
        list
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Append names, ignoring ones already listed (`__all__ += [...]`).
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.contains(&name) {
                self.names.push(name);
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExportList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// A named, documentable unit: function, class, method or constant.
///
/// Classes own their members (methods, class constants, nested classes);
/// traversal flattens them under the class's qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Set at construction; refined against the enclosing export list when
    /// the symbol is placed into a tree
    pub visibility: Visibility,
    pub docstring: Option<String>,
    pub members: Vec<Symbol>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        let name = name.into();
        Self {
            visibility: Visibility::classify(&name, None),
            name,
            kind,
            docstring: None,
            members: Vec::new(),
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Function)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Class)
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Method)
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Constant)
    }

    pub fn with_doc(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    /// Add a member; functions declared inside a class become methods.
    pub fn with_member(mut self, mut member: Symbol) -> Self {
        if member.kind == SymbolKind::Function {
            member.kind = SymbolKind::Method;
        }
        self.members.push(member);
        self
    }

    pub fn with_members<I: IntoIterator<Item = Symbol>>(self, members: I) -> Self {
        members.into_iter().fold(self, Symbol::with_member)
    }

    pub fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }

    pub fn member(&self, name: &str) -> Option<&Symbol> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Re-derive visibility for this symbol and, by prefix only, its members.
    pub(crate) fn apply_exports(&mut self, exports: Option<&ExportList>) {
        self.visibility = Visibility::classify(&self.name, exports);
        for member in &mut self.members {
            member.apply_exports(None);
        }
    }
}

/// A name bound in a package initializer by importing it from a descendant,
/// e.g. `from .internals import helper as public_helper`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reexport {
    /// Name bound in the package namespace
    pub name: String,
    /// Name in the defining module when the import is aliased
    pub original: Option<String>,
    /// Dotted path relative to the package (`internals`, `sub.mod`);
    /// `None` searches every descendant module
    pub source: Option<String>,
}

impl Reexport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            original: None,
            source: None,
        }
    }

    pub fn from_module(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::new(name)
        }
    }

    pub fn aliased(mut self, original: impl Into<String>) -> Self {
        self.original = Some(original.into());
        self
    }

    /// Name to look up in the defining scope.
    pub fn target_name(&self) -> &str {
        self.original.as_deref().unwrap_or(&self.name)
    }
}

/// Declaration of a module before it is placed into a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDecl {
    pub name: String,
    pub docstring: Option<String>,
    pub exports: Option<ExportList>,
    pub symbols: Vec<Symbol>,
    pub path: Option<PathBuf>,
}

impl ModuleDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn doc(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn exports<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports = Some(ExportList::new(names));
        self
    }

    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.symbols.push(symbol);
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Declaration of a package (a namespace with an initializer) and
/// everything below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDecl {
    pub name: String,
    pub docstring: Option<String>,
    pub exports: Option<ExportList>,
    pub reexports: Vec<Reexport>,
    /// Definitions made directly in the initializer
    pub symbols: Vec<Symbol>,
    pub modules: Vec<ModuleDecl>,
    pub packages: Vec<PackageDecl>,
    pub path: Option<PathBuf>,
}

impl PackageDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn doc(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn exports<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports = Some(ExportList::new(names));
        self
    }

    pub fn reexport(mut self, reexport: Reexport) -> Self {
        self.reexports.push(reexport);
        self
    }

    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.symbols.push(symbol);
        self
    }

    pub fn module(mut self, module: ModuleDecl) -> Self {
        self.modules.push(module);
        self
    }

    pub fn package(mut self, package: PackageDecl) -> Self {
        self.packages.push(package);
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// A module placed in a package tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    pub name: String,
    /// Dot-separated path from the root package
    pub qualified_name: String,
    pub docstring: Option<String>,
    pub exports: Option<ExportList>,
    pub symbols: Vec<Symbol>,
    pub path: Option<PathBuf>,
}

impl ModuleNode {
    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }
}
