//! Request types for the MCP server
//!
//! Every tool that names a root symbol accepts either `symbol` (name, id, or
//! `*`/`?` wildcard pattern) or a `document` + `line` + `column` position.

use rmcp::schemars;
use serde::Deserialize;

/// Request to resolve the symbol at a document position
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolveSymbolRequest {
    /// Document path as known to the index
    #[schemars(description = "Document path as known to the project index")]
    pub document: String,

    /// Line number (1-indexed)
    #[schemars(description = "Line number (1-indexed)")]
    pub line: u32,

    /// Column number (1-indexed)
    #[schemars(description = "Column number (1-indexed)")]
    pub column: u32,
}

/// Request to build a call hierarchy
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CallHierarchyRequest {
    /// Root symbol by name, id, or wildcard pattern
    #[schemars(description = "Root symbol name, id, or wildcard pattern (alternative to document/line/column)")]
    pub symbol: Option<String>,

    /// Document path of the root position
    #[schemars(description = "Document path of the root position")]
    pub document: Option<String>,

    /// Line of the root position (1-indexed)
    #[schemars(description = "Line of the root position (1-indexed)")]
    pub line: Option<u32>,

    /// Column of the root position (1-indexed)
    #[schemars(description = "Column of the root position (1-indexed)")]
    pub column: Option<u32>,

    /// Traversal depth per direction (default: 3, max: 32)
    #[schemars(description = "Traversal depth per direction (default: 3, max: 32)")]
    pub depth: Option<usize>,

    /// Direction: 'incoming' (callers), 'outgoing' (callees), or 'both'
    #[schemars(description = "Direction: 'incoming' (callers), 'outgoing' (callees), or 'both' (default)")]
    pub direction: Option<String>,

    /// Maximum nodes to return (default: 100)
    #[schemars(description = "Maximum nodes to return before budget shaping (default: 100)")]
    pub max_results: Option<usize>,

    /// Keep calls into dependency symbols (default: false)
    #[schemars(description = "Keep calls into dependency symbols (default: false; the allow-list applies either way)")]
    pub include_external: Option<bool>,

    /// Output format: 'text' (default) or 'json'
    #[schemars(description = "Output format: 'text' (compact) or 'json' (envelope)")]
    pub format: Option<String>,
}

/// Request to build an override/implementation hierarchy
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OverrideHierarchyRequest {
    /// Root symbol by name, id, or wildcard pattern
    #[schemars(description = "Root member or type name, id, or wildcard pattern (alternative to document/line/column)")]
    pub symbol: Option<String>,

    /// Document path of the root position
    #[schemars(description = "Document path of the root position")]
    pub document: Option<String>,

    /// Line of the root position (1-indexed)
    #[schemars(description = "Line of the root position (1-indexed)")]
    pub line: Option<u32>,

    /// Column of the root position (1-indexed)
    #[schemars(description = "Column of the root position (1-indexed)")]
    pub column: Option<u32>,

    /// Traversal depth for the override side (default: 3, max: 32)
    #[schemars(description = "Traversal depth for overriding members (default: 3, max: 32)")]
    pub depth: Option<usize>,

    /// Direction: 'incoming' (overrides), 'outgoing' (base chain), or 'both'
    #[schemars(description = "Direction: 'incoming' (overriding members), 'outgoing' (base chain), or 'both' (default)")]
    pub direction: Option<String>,

    /// Maximum nodes to return (default: 100)
    #[schemars(description = "Maximum nodes to return before budget shaping (default: 100)")]
    pub max_results: Option<usize>,

    /// Output format: 'text' (default) or 'json'
    #[schemars(description = "Output format: 'text' (compact) or 'json' (envelope)")]
    pub format: Option<String>,
}

/// Request to list references to a symbol
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FindReferencesRequest {
    /// Symbol by name, id, or wildcard pattern
    #[schemars(description = "Symbol name, id, or wildcard pattern (alternative to document/line/column)")]
    pub symbol: Option<String>,

    /// Document path of the symbol position
    #[schemars(description = "Document path of the symbol position")]
    pub document: Option<String>,

    /// Line of the symbol position (1-indexed)
    #[schemars(description = "Line of the symbol position (1-indexed)")]
    pub line: Option<u32>,

    /// Column of the symbol position (1-indexed)
    #[schemars(description = "Column of the symbol position (1-indexed)")]
    pub column: Option<u32>,

    /// Maximum references to return (default: 100)
    #[schemars(description = "Maximum references to return before budget shaping (default: 100)")]
    pub max_results: Option<usize>,

    /// Output format: 'text' (default) or 'json'
    #[schemars(description = "Output format: 'text' (compact) or 'json' (envelope)")]
    pub format: Option<String>,
}

/// Request for project or file diagnostics
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetDiagnosticsRequest {
    /// Restrict to one document (project-wide when omitted)
    #[schemars(description = "Restrict to one document; project-wide when omitted")]
    pub file: Option<String>,

    /// Minimum severity: 'error', 'warning', 'info', or 'hint'
    #[schemars(description = "Minimum severity to include: 'error', 'warning', 'info', or 'hint'")]
    pub severity: Option<String>,

    /// Maximum diagnostics to return (default: 100)
    #[schemars(description = "Maximum diagnostics to return before budget shaping (default: 100)")]
    pub max_results: Option<usize>,

    /// Output format: 'text' (default) or 'json'
    #[schemars(description = "Output format: 'text' (compact) or 'json' (envelope)")]
    pub format: Option<String>,
}

/// Request to plan a bulk rename
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PlanRenameRequest {
    /// Symbol by name, id, or wildcard pattern
    #[schemars(description = "Symbol name, id, or wildcard pattern (alternative to document/line/column)")]
    pub symbol: Option<String>,

    /// Document path of the symbol position
    #[schemars(description = "Document path of the symbol position")]
    pub document: Option<String>,

    /// Line of the symbol position (1-indexed)
    #[schemars(description = "Line of the symbol position (1-indexed)")]
    pub line: Option<u32>,

    /// Column of the symbol position (1-indexed)
    #[schemars(description = "Column of the symbol position (1-indexed)")]
    pub column: Option<u32>,

    /// Replacement name
    #[schemars(description = "Replacement name applied at every reference site")]
    pub new_name: String,

    /// Maximum edits to return (default: 100)
    #[schemars(description = "Maximum edits to return before budget shaping (default: 100)")]
    pub max_results: Option<usize>,

    /// Output format: 'text' (default) or 'json'
    #[schemars(description = "Output format: 'text' (compact) or 'json' (envelope)")]
    pub format: Option<String>,
}

/// Request for one page of a stored overflow record
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetOverflowPageRequest {
    /// Overflow id from a truncated response
    #[schemars(description = "Overflow id from a truncated response")]
    pub overflow_id: String,

    /// Page number (1-based)
    #[schemars(description = "Page number (1-based, bounded by the record's page count)")]
    pub page: usize,

    /// Output format: 'text' (default) or 'json'
    #[schemars(description = "Output format: 'text' (compact) or 'json' (envelope)")]
    pub format: Option<String>,
}

/// Request for index summary counts
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IndexSummaryRequest {}
