//! Data model for symbols, locations, diagnostics, and relations

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Current schema version for envelope/snapshot stability
pub const SCHEMA_VERSION: &str = "1.2";

/// Kind of code element as reported by the project index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Method,
    Function,
    Type,
    Interface,
    Field,
    Property,
    Module,
    Other,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Method => "method",
            SymbolKind::Function => "function",
            SymbolKind::Type => "type",
            SymbolKind::Interface => "interface",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::Module => "module",
            SymbolKind::Other => "other",
        }
    }

    /// Type-like kinds participate in derived-type walks; member kinds do not.
    pub fn is_type_like(&self) -> bool {
        matches!(self, SymbolKind::Type | SymbolKind::Interface)
    }
}

/// Declaration modifiers relevant to override/implementation classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_virtual: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_abstract: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_override: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_sealed: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_static: bool,
}

/// A point in a document (1-indexed line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// An inclusive source range within a single document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: Position,
    pub end: Position,
}

impl SourceSpan {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start: Position::new(start_line, start_column),
            end: Position::new(end_line, end_column),
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        let after_start = pos.line > self.start.line
            || (pos.line == self.start.line && pos.column >= self.start.column);
        let before_end =
            pos.line < self.end.line || (pos.line == self.end.line && pos.column <= self.end.column);
        after_start && before_end
    }

    pub fn contains_span(&self, other: &SourceSpan) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    /// Rough size metric used to pick the innermost of nested declarations.
    pub fn line_extent(&self) -> u32 {
        self.end.line.saturating_sub(self.start.line)
    }
}

/// A resolved declaration location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Opaque stable identity for a code element, as returned by the project index.
///
/// Equality and hashing are by `id` only: the index assigns one stable id per
/// element, and traversal identity (cycle detection, visited sets, flattening)
/// must not depend on display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRef {
    /// Stable index-assigned identity
    pub id: String,

    /// Simple name (no container qualification)
    pub name: String,

    /// Declaring namespace or type, empty for top-level symbols
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container: String,

    pub kind: SymbolKind,

    #[serde(default)]
    pub modifiers: Modifiers,

    /// From a dependency rather than project source
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_external: bool,

    /// Absent for symbols with no source (external/compiled-only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl SymbolRef {
    /// Display identity: `Container.name`, used to de-duplicate siblings.
    pub fn display(&self) -> String {
        if self.container.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.container, self.name)
        }
    }
}

impl PartialEq for SymbolRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SymbolRef {}

impl Hash for SymbolRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// One occurrence of a reference to a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSite {
    pub document: String,
    pub span: SourceSpan,
}

/// Diagnostic severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }

    /// Lower rank is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
            Severity::Hint => 3,
        }
    }
}

/// A single diagnostic produced by the project index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub span: SourceSpan,
    pub severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    pub message: String,
}

/// One planned edit of the bulk find-replace tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEdit {
    pub file: String,
    pub span: SourceSpan,
    pub replacement: String,
}

/// How a node in an override/implementation hierarchy relates to its parent.
///
/// A closed set: classification policy lives in [`classify_relation`] so it is
/// testable without an index behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    DirectOverride,
    ExplicitInterfaceImpl,
    InterfaceMethodImpl,
    DerivedClass,
    BaseDefinition,
    Call,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::DirectOverride => "direct_override",
            RelationKind::ExplicitInterfaceImpl => "explicit_interface_impl",
            RelationKind::InterfaceMethodImpl => "interface_method_impl",
            RelationKind::DerivedClass => "derived_class",
            RelationKind::BaseDefinition => "base_definition",
            RelationKind::Call => "call",
        }
    }
}

/// Classify the relation between a member (or type) and the base element it
/// was discovered under.
///
/// Pure function of the two symbols: no index access, no fallbacks.
pub fn classify_relation(member: &SymbolRef, base: &SymbolRef) -> RelationKind {
    if member.kind.is_type_like() {
        return RelationKind::DerivedClass;
    }

    if base.kind == SymbolKind::Interface || base_is_interface_member(base) {
        // Explicit interface implementations carry the interface name in the
        // member name itself (e.g. `IParser.Advance`).
        let qualified = format!("{}.", interface_name(base));
        if member.name.starts_with(&qualified) {
            return RelationKind::ExplicitInterfaceImpl;
        }
        return RelationKind::InterfaceMethodImpl;
    }

    if member.modifiers.is_override {
        return RelationKind::DirectOverride;
    }

    // A member discovered under a virtual/abstract base without an explicit
    // override modifier still shadows the base definition.
    if base.modifiers.is_virtual || base.modifiers.is_abstract {
        return RelationKind::DirectOverride;
    }

    RelationKind::BaseDefinition
}

fn base_is_interface_member(base: &SymbolRef) -> bool {
    base.kind != SymbolKind::Interface && base.container.starts_with('I') && {
        // Heuristic used only when the index does not hand us the declaring
        // type's kind: `IFoo`-style containers denote interface members.
        base.container
            .chars()
            .nth(1)
            .map(|c| c.is_ascii_uppercase())
            .unwrap_or(false)
    }
}

fn interface_name(base: &SymbolRef) -> &str {
    if base.kind == SymbolKind::Interface {
        &base.name
    } else {
        &base.container
    }
}
