//! CodeNav Engine: code navigation tools with budget-shaped results
//!
//! This library answers structural questions about a codebase (call
//! hierarchies, override hierarchies, references, diagnostics, bulk rename
//! plans) on top of an external project index, and fits every answer into a
//! fixed response-size budget. The code intelligence itself lives behind the
//! [`index::ProjectIndex`] trait; what this crate owns is result shaping:
//!
//! - [`hierarchy`] builds bounded, cycle-safe, bidirectional relationship
//!   graphs over the index,
//! - [`estimate`] and [`reduce`] fit result sets into the budget,
//! - [`overflow`] keeps the untruncated result retrievable page by page,
//! - [`shape`] ties those together into the response envelope every tool
//!   returns,
//! - [`mcp_server`] exposes the tools over MCP (stdio transport).
//!
//! # Example
//!
//! ```ignore
//! use codenav_engine::{CodeNavEngine, EngineConfig, HierarchyRequest, RootTarget, StaticIndex};
//! use codenav_engine::hierarchy::Direction;
//! use tokio_util::sync::CancellationToken;
//!
//! let index = StaticIndex::from_json_file("snapshot.json".as_ref())?;
//! let engine = CodeNavEngine::new(index, EngineConfig::default());
//!
//! let request = HierarchyRequest {
//!     depth: Some(3),
//!     direction: Direction::Incoming,
//!     max_results: None,
//!     include_external: false,
//! };
//! let envelope = engine.call_hierarchy(
//!     &RootTarget::Name("ProcessOrder".to_string()),
//!     &request,
//!     &CancellationToken::new(),
//! )?;
//! println!("{}", envelope.to_json_pretty());
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod hierarchy;
pub mod index;
pub mod mcp_server;
pub mod overflow;
pub mod reduce;
pub mod schema;
pub mod shape;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::{CodeNavEngine, HierarchyRequest, RootTarget};
pub use error::{CodeNavError, Result};
pub use hierarchy::{
    flatten, Direction, GraphNode, HierarchyBuilder, HierarchyOptions, MAX_DEPTH_CEILING,
};
pub use index::{IndexSnapshot, IndexStats, ProjectIndex, StaticIndex};
pub use mcp_server::CodeNavServer;
pub use overflow::{OverflowPage, OverflowStore, RetentionPolicy};
pub use reduce::{
    reduce_to_budget, TruncationDecision, DEFAULT_REDUCTION_STEPS, HARD_RESULT_CAP,
};
pub use schema::{
    classify_relation, Diagnostic, Location, Modifiers, Position, ReferenceSite, RelationKind,
    Severity, SourceSpan, SymbolKind, SymbolRef, TextEdit, SCHEMA_VERSION,
};
pub use shape::{prune_tree, shape_list, shape_tree, ShapePolicy, ToolEnvelope};
