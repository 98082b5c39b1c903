//! MCP Server for codenav-engine
//!
//! Exposes the code navigation tools over the Model Context Protocol so AI
//! assistants can query call graphs, override hierarchies, references, and
//! diagnostics against a loaded index snapshot. Every tool response is budget
//! shaped; truncated responses carry an overflow id usable with
//! `get_overflow_page`.

pub mod formatting;
pub mod types;

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use tokio_util::sync::CancellationToken;

use crate::engine::{CodeNavEngine, HierarchyRequest, RootTarget};
use crate::error::CodeNavError;
use crate::hierarchy::Direction;
use crate::index::StaticIndex;
use crate::schema::{Position, Severity};
use crate::shape::ToolEnvelope;

use formatting::format_envelope;
use types::*;

// ============================================================================
// MCP Server Implementation
// ============================================================================

/// MCP server over one loaded project index
#[derive(Clone)]
pub struct CodeNavServer {
    engine: Arc<CodeNavEngine<StaticIndex>>,
    tool_router: ToolRouter<CodeNavServer>,
}

#[tool_router]
impl CodeNavServer {
    pub fn new(engine: CodeNavEngine<StaticIndex>) -> Self {
        Self {
            engine: Arc::new(engine),
            tool_router: Self::tool_router(),
        }
    }

    /// Resolve the symbol at a document position
    #[tool(description = "Resolve the symbol declared at or containing a document position. Returns the symbol's stable id, which every other tool accepts as 'symbol'.")]
    async fn resolve_symbol(
        &self,
        Parameters(request): Parameters<ResolveSymbolRequest>,
    ) -> Result<CallToolResult, McpError> {
        let target = RootTarget::Position {
            document: request.document,
            position: Position::new(request.line, request.column),
        };
        match self.engine.resolve_root(&target) {
            Ok(symbol) => {
                let text = serde_json::to_string_pretty(&symbol)
                    .unwrap_or_else(|_| "{}".to_string());
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(error_result(&e, None)),
        }
    }

    /// Build a call hierarchy around a symbol
    #[tool(description = "Build a depth-bounded call hierarchy around a symbol: callers (incoming), callees (outgoing), or both. Cycle-safe; large graphs are reduced to the response budget with the full graph retrievable page by page.")]
    async fn call_hierarchy(
        &self,
        Parameters(request): Parameters<CallHierarchyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let target = match root_target(
            request.symbol,
            request.document,
            request.line,
            request.column,
        ) {
            Ok(t) => t,
            Err(message) => return Ok(CallToolResult::error(vec![Content::text(message)])),
        };
        let direction = match parse_direction(request.direction.as_deref()) {
            Ok(d) => d,
            Err(message) => return Ok(CallToolResult::error(vec![Content::text(message)])),
        };

        let hierarchy = HierarchyRequest {
            depth: request.depth,
            direction,
            max_results: request.max_results,
            include_external: request.include_external.unwrap_or(false),
        };
        let result = self.engine.call_hierarchy(
            &target,
            &hierarchy,
            &CancellationToken::new(),
        );
        respond(result, request.format.as_deref())
    }

    /// Build an override/implementation hierarchy around a member or type
    #[tool(description = "Build an override/implementation hierarchy: overriding and implementing members (incoming) and the overridden base chain (outgoing). Falls back to derived-type scanning for abstract members the direct lookup misses.")]
    async fn override_hierarchy(
        &self,
        Parameters(request): Parameters<OverrideHierarchyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let target = match root_target(
            request.symbol,
            request.document,
            request.line,
            request.column,
        ) {
            Ok(t) => t,
            Err(message) => return Ok(CallToolResult::error(vec![Content::text(message)])),
        };
        let direction = match parse_direction(request.direction.as_deref()) {
            Ok(d) => d,
            Err(message) => return Ok(CallToolResult::error(vec![Content::text(message)])),
        };

        let hierarchy = HierarchyRequest {
            depth: request.depth,
            direction,
            max_results: request.max_results,
            include_external: false,
        };
        let result = self.engine.override_hierarchy(
            &target,
            &hierarchy,
            &CancellationToken::new(),
        );
        respond(result, request.format.as_deref())
    }

    /// List references to a symbol
    #[tool(description = "List every reference to a symbol in document order. Large result sets are reduced to the response budget; the full set stays retrievable through get_overflow_page.")]
    async fn find_references(
        &self,
        Parameters(request): Parameters<FindReferencesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let target = match root_target(
            request.symbol,
            request.document,
            request.line,
            request.column,
        ) {
            Ok(t) => t,
            Err(message) => return Ok(CallToolResult::error(vec![Content::text(message)])),
        };
        let result = self.engine.find_references(
            &target,
            request.max_results,
            &CancellationToken::new(),
        );
        respond(result, request.format.as_deref())
    }

    /// Get project or file diagnostics
    #[tool(description = "Retrieve diagnostics for the project or one document, most severe first, with an optional minimum severity filter.")]
    async fn get_diagnostics(
        &self,
        Parameters(request): Parameters<GetDiagnosticsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let severity = match request.severity.as_deref() {
            None => None,
            Some(s) => match parse_severity(s) {
                Ok(sev) => Some(sev),
                Err(message) => {
                    return Ok(CallToolResult::error(vec![Content::text(message)]))
                }
            },
        };
        let result = self.engine.diagnostics(
            request.file.as_deref(),
            severity,
            request.max_results,
            &CancellationToken::new(),
        );
        respond(result, request.format.as_deref())
    }

    /// Plan a bulk rename of a symbol
    #[tool(description = "Plan a bulk find-replace for a symbol: one text edit per reference site, in document order. The plan is returned for review; applying it is the editor's job.")]
    async fn plan_rename(
        &self,
        Parameters(request): Parameters<PlanRenameRequest>,
    ) -> Result<CallToolResult, McpError> {
        let target = match root_target(
            request.symbol,
            request.document,
            request.line,
            request.column,
        ) {
            Ok(t) => t,
            Err(message) => return Ok(CallToolResult::error(vec![Content::text(message)])),
        };
        let result = self.engine.plan_rename(
            &target,
            &request.new_name,
            request.max_results,
            &CancellationToken::new(),
        );
        respond(result, request.format.as_deref())
    }

    /// Fetch one page of a stored overflow record
    #[tool(description = "Fetch one page of a truncated result by its overflow id. Pages are 1-based; replaying all pages reconstructs the full result in its original order.")]
    async fn get_overflow_page(
        &self,
        Parameters(request): Parameters<GetOverflowPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.engine.overflow_page(&request.overflow_id, request.page);
        respond(result, request.format.as_deref())
    }

    /// Summary counts of the loaded index
    #[tool(description = "Summary counts of the loaded index snapshot: symbols, references, call edges, type links, diagnostics.")]
    async fn index_summary(
        &self,
        Parameters(_request): Parameters<IndexSummaryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let envelope = self.engine.index_summary();
        Ok(CallToolResult::success(vec![Content::text(
            format_envelope(&envelope, None),
        )]))
    }
}

#[tool_handler]
impl ServerHandler for CodeNavServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "codenav-engine".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("CodeNav Engine".to_string()),
                website_url: None,
                icons: None,
            },
            instructions: Some(MCP_INSTRUCTIONS.to_string()),
        }
    }
}

/// Instructions for AI agents using the codenav tools
const MCP_INSTRUCTIONS: &str = r#"CodeNav Engine - Code Navigation for AI Assistants

## Purpose
Answers structural questions about a codebase (who calls this, what overrides
this, where is this used) from a precomputed index snapshot, with every
response shaped to a fixed size budget.

## Tools
- resolve_symbol: position -> symbol id
- call_hierarchy: callers/callees graph around a symbol
- override_hierarchy: overriding members and base chain of a member
- find_references: all uses of a symbol in document order
- get_diagnostics: project or file diagnostics, most severe first
- plan_rename: bulk find-replace plan (one edit per reference)
- get_overflow_page: retrieve pages of a truncated result
- index_summary: size of the loaded snapshot

## Truncation
Responses report total_found vs returned. When truncated, the response names
an overflow_id: pass it to get_overflow_page (pages are 1-based) to read the
complete result without re-running the query. Overflow records expire, so
fetch pages promptly.

## Workflow Tips
1. Resolve the symbol first when you only have a file position.
2. Prefer symbol ids from earlier responses over names: ids are unambiguous.
3. Keep depth small (2-3) on call_hierarchy for hub functions; deep graphs
   truncate quickly.
4. Treat nodes flagged 'truncated' as expandable: re-run the tool rooted at
   that node to see further levels."#;

// ============================================================================
// Helper Functions
// ============================================================================

/// Build a root target from the symbol/position request fields.
fn root_target(
    symbol: Option<String>,
    document: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
) -> Result<RootTarget, String> {
    if let Some(symbol) = symbol.filter(|s| !s.trim().is_empty()) {
        return Ok(RootTarget::Name(symbol));
    }
    match (document, line, column) {
        (Some(document), Some(line), Some(column)) => Ok(RootTarget::Position {
            document,
            position: Position::new(line, column),
        }),
        _ => Err(
            "Provide either 'symbol' or all of 'document', 'line', and 'column'".to_string(),
        ),
    }
}

fn parse_direction(direction: Option<&str>) -> Result<Direction, String> {
    match direction {
        None | Some("both") => Ok(Direction::Both),
        Some("incoming") | Some("callers") | Some("overrides") => Ok(Direction::Incoming),
        Some("outgoing") | Some("callees") | Some("base") => Ok(Direction::Outgoing),
        Some(other) => Err(format!(
            "Unknown direction '{}': expected 'incoming', 'outgoing', or 'both'",
            other
        )),
    }
}

fn parse_severity(severity: &str) -> Result<Severity, String> {
    match severity {
        "error" => Ok(Severity::Error),
        "warning" => Ok(Severity::Warning),
        "info" => Ok(Severity::Info),
        "hint" => Ok(Severity::Hint),
        other => Err(format!(
            "Unknown severity '{}': expected 'error', 'warning', 'info', or 'hint'",
            other
        )),
    }
}

/// Convert an engine result into a tool response. Cancellation aborts without
/// an envelope; contract errors become error envelopes with recovery hints.
fn respond(
    result: crate::error::Result<ToolEnvelope>,
    format: Option<&str>,
) -> Result<CallToolResult, McpError> {
    match result {
        Ok(envelope) => Ok(CallToolResult::success(vec![Content::text(
            format_envelope(&envelope, format),
        )])),
        Err(CodeNavError::Cancelled) => Ok(CallToolResult::error(vec![Content::text(
            "Operation cancelled",
        )])),
        Err(e) => Ok(error_result(&e, format)),
    }
}

fn error_result(error: &CodeNavError, format: Option<&str>) -> CallToolResult {
    let envelope = ToolEnvelope::error(error);
    CallToolResult::error(vec![Content::text(format_envelope(&envelope, format))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_target_prefers_symbol() {
        let target = root_target(
            Some("Parse".to_string()),
            Some("a.rs".to_string()),
            Some(1),
            Some(1),
        )
        .unwrap();
        assert!(matches!(target, RootTarget::Name(n) if n == "Parse"));
    }

    #[test]
    fn test_root_target_requires_full_position() {
        assert!(root_target(None, Some("a.rs".to_string()), Some(1), None).is_err());
        assert!(root_target(None, None, None, None).is_err());
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!(parse_direction(None).unwrap(), Direction::Both);
        assert_eq!(parse_direction(Some("callers")).unwrap(), Direction::Incoming);
        assert!(parse_direction(Some("sideways")).is_err());
    }
}
