//! Tool-level orchestration: resolve roots, run queries or traversals, shape
//! responses.
//!
//! One engine instance serves every tool invocation. Invocations share no
//! mutable state except the overflow store, so concurrent calls need no
//! coordination beyond it.

use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::{CodeNavError, Result};
use crate::estimate::{diagnostic_cost, reference_cost, sampled_item_cost, text_edit_cost};
use crate::hierarchy::{
    Direction, HierarchyBuilder, HierarchyOptions, MAX_DEPTH_CEILING,
};
use crate::index::{IndexStats, ProjectIndex};
use crate::overflow::OverflowStore;
use crate::schema::{Diagnostic, Position, ReferenceSite, Severity, SymbolRef, TextEdit};
use crate::shape::{shape_list, shape_tree, ShapePolicy, ToolEnvelope};

/// Messages sampled when estimating diagnostic cost.
const DIAGNOSTIC_SAMPLE_SIZE: usize = 16;

/// How a tool names its root symbol
#[derive(Debug, Clone)]
pub enum RootTarget {
    Position { document: String, position: Position },
    Name(String),
}

impl RootTarget {
    fn describe(&self) -> String {
        match self {
            RootTarget::Position { document, position } => {
                format!("{}:{}:{}", document, position.line, position.column)
            }
            RootTarget::Name(name) => name.clone(),
        }
    }
}

/// Parameters shared by the hierarchy tools
#[derive(Debug, Clone)]
pub struct HierarchyRequest {
    pub depth: Option<usize>,
    pub direction: Direction,
    pub max_results: Option<usize>,
    pub include_external: bool,
}

pub struct CodeNavEngine<I: ProjectIndex> {
    index: I,
    config: EngineConfig,
    overflow: OverflowStore,
}

impl<I: ProjectIndex> CodeNavEngine<I> {
    pub fn new(index: I, config: EngineConfig) -> Self {
        let overflow = OverflowStore::new(config.retention_policy());
        Self {
            index,
            config,
            overflow,
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn overflow(&self) -> &OverflowStore {
        &self.overflow
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve a root symbol from a position or a name/id query.
    pub fn resolve_root(&self, target: &RootTarget) -> Result<SymbolRef> {
        let found = match target {
            RootTarget::Position { document, position } => {
                self.index.resolve_symbol_at(document, *position)?
            }
            RootTarget::Name(name) => {
                self.index.find_symbols_named(name)?.into_iter().next()
            }
        };
        found.ok_or_else(|| CodeNavError::RootNotFound {
            target: target.describe(),
        })
    }

    /// Callers/callees of the root, shaped to the budget.
    pub fn call_hierarchy(
        &self,
        target: &RootTarget,
        request: &HierarchyRequest,
        cancel: &CancellationToken,
    ) -> Result<ToolEnvelope> {
        let options = self.hierarchy_options(request)?;
        let policy = self.policy(request.max_results)?;
        let root = self.resolve_root(target)?;
        tracing::debug!(root = %root.display(), depth = options.max_depth, "call hierarchy");

        let builder = HierarchyBuilder::new(&self.index, options, cancel.clone());
        let graph = builder.build_call_hierarchy(root.clone())?;

        let label = format!("call hierarchy nodes for {}", root.display());
        let mut envelope = shape_tree(&label, &graph, &policy, &self.overflow);
        envelope.message = Some(format!("Call hierarchy of {}", root.display()));
        Ok(envelope)
    }

    /// Override/implementation hierarchy plus base chain, shaped.
    pub fn override_hierarchy(
        &self,
        target: &RootTarget,
        request: &HierarchyRequest,
        cancel: &CancellationToken,
    ) -> Result<ToolEnvelope> {
        let options = self.hierarchy_options(request)?;
        let policy = self.policy(request.max_results)?;
        let root = self.resolve_root(target)?;
        tracing::debug!(root = %root.display(), depth = options.max_depth, "override hierarchy");

        let builder = HierarchyBuilder::new(&self.index, options, cancel.clone());
        let graph = builder.build_override_hierarchy(root.clone())?;

        let label = format!("override hierarchy nodes for {}", root.display());
        let mut envelope = shape_tree(&label, &graph, &policy, &self.overflow);
        envelope.message = Some(format!("Override hierarchy of {}", root.display()));
        Ok(envelope)
    }

    /// Flat reference list in document order, shaped.
    pub fn find_references(
        &self,
        target: &RootTarget,
        max_results: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<ToolEnvelope> {
        let policy = self.policy(max_results)?;
        let root = self.resolve_root(target)?;
        self.checkpoint(cancel)?;

        let mut sites = self.index.find_references(&root)?;
        sort_sites(&mut sites);

        let label = format!("references to {}", root.display());
        let mut envelope = shape_list(&label, &sites, reference_cost, &policy, &self.overflow);
        envelope.message = Some(format!("References to {}", root.display()));
        Ok(envelope)
    }

    /// Project or single-document diagnostics, most severe first, shaped with
    /// a sampled cost model.
    pub fn diagnostics(
        &self,
        document: Option<&str>,
        min_severity: Option<Severity>,
        max_results: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<ToolEnvelope> {
        let policy = self.policy(max_results)?;
        self.checkpoint(cancel)?;

        let mut diagnostics = self.index.diagnostics(document)?;
        if let Some(min) = min_severity {
            diagnostics.retain(|d| d.severity.rank() <= min.rank());
        }
        sort_diagnostics(&mut diagnostics);

        // Message lengths are assumed uniform; sample a prefix instead of
        // walking every message.
        let per_item = sampled_item_cost(&diagnostics, DIAGNOSTIC_SAMPLE_SIZE, diagnostic_cost);

        let label = match document {
            Some(file) => format!("diagnostics for {}", file),
            None => "project diagnostics".to_string(),
        };
        let mut envelope = shape_list(
            &label,
            &diagnostics,
            |_| per_item,
            &policy,
            &self.overflow,
        );
        envelope.message = Some(label_message(&label, envelope.total_found));
        Ok(envelope)
    }

    /// Bulk find-replace plan: one edit per reference occurrence, in document
    /// order. Applying the edits is the index collaborator's job.
    pub fn plan_rename(
        &self,
        target: &RootTarget,
        new_name: &str,
        max_results: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<ToolEnvelope> {
        let policy = self.policy(max_results)?;
        let root = self.resolve_root(target)?;
        self.checkpoint(cancel)?;

        let mut sites = self.index.find_references(&root)?;
        sort_sites(&mut sites);
        let edits: Vec<TextEdit> = sites
            .into_iter()
            .map(|site| TextEdit {
                file: site.document,
                span: site.span,
                replacement: new_name.to_string(),
            })
            .collect();

        let label = format!("rename edits for {}", root.display());
        let mut envelope = shape_list(&label, &edits, text_edit_cost, &policy, &self.overflow);
        envelope.message = Some(format!(
            "Rename {} -> {}: {} edit(s) planned",
            root.display(),
            new_name,
            envelope.total_found
        ));
        Ok(envelope)
    }

    /// Page `page` (1-based) of a stored overflow record.
    pub fn overflow_page(&self, overflow_id: &str, page: usize) -> Result<ToolEnvelope> {
        if page == 0 {
            return Err(CodeNavError::InvalidDepthOrBudget {
                message: "page numbers are 1-based".to_string(),
            });
        }
        let result = self.overflow.page(overflow_id, page)?;

        Ok(ToolEnvelope {
            success: true,
            message: Some(format!(
                "Page {} of {} for {}",
                result.page, result.page_count, result.label
            )),
            total_found: result.total_items,
            returned: result.items.len(),
            truncated: false,
            overflow_id: Some(result.overflow_id.clone()),
            notices: Vec::new(),
            items: Some(serde_json::Value::Array(result.items)),
            tree: None,
            error_code: None,
        })
    }

    /// Summary counts of the loaded index.
    pub fn index_summary(&self) -> ToolEnvelope {
        let stats: IndexStats = self.index.stats();
        ToolEnvelope {
            success: true,
            message: Some(format!(
                "{} symbols, {} references, {} call edges",
                stats.symbols, stats.references, stats.call_edges
            )),
            total_found: stats.symbols,
            returned: stats.symbols,
            truncated: false,
            overflow_id: None,
            notices: Vec::new(),
            items: serde_json::to_value(&stats).ok(),
            tree: None,
            error_code: None,
        }
    }

    fn hierarchy_options(&self, request: &HierarchyRequest) -> Result<HierarchyOptions> {
        let depth = request.depth.unwrap_or(self.config.default_depth);
        if depth > MAX_DEPTH_CEILING {
            return Err(CodeNavError::InvalidDepthOrBudget {
                message: format!("depth {} exceeds the ceiling of {}", depth, MAX_DEPTH_CEILING),
            });
        }
        Ok(HierarchyOptions {
            max_depth: depth,
            direction: request.direction,
            include_external: request.include_external,
            external_allowlist: self.config.external_allowlist.clone(),
        })
    }

    fn policy(&self, max_results: Option<usize>) -> Result<ShapePolicy> {
        if max_results == Some(0) {
            return Err(CodeNavError::InvalidDepthOrBudget {
                message: "max_results must be positive".to_string(),
            });
        }
        Ok(ShapePolicy {
            budget: self.config.response_budget,
            base_cost: self.config.base_response_cost,
            requested_max: max_results.unwrap_or(self.config.default_max_results),
            steps: self.config.reduction_steps.clone(),
            page_size: self.config.overflow_page_size,
        })
    }

    fn checkpoint(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(CodeNavError::Cancelled);
        }
        Ok(())
    }
}

fn sort_sites(sites: &mut [ReferenceSite]) {
    sites.sort_by(|a, b| {
        (&a.document, a.span.start.line, a.span.start.column).cmp(&(
            &b.document,
            b.span.start.line,
            b.span.start.column,
        ))
    });
}

fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (a.severity.rank(), &a.file, a.span.start.line).cmp(&(
            b.severity.rank(),
            &b.file,
            b.span.start.line,
        ))
    });
}

fn label_message(label: &str, total: usize) -> String {
    format!(
        "{}{}: {} found",
        label[..1].to_uppercase(),
        &label[1..],
        total
    )
}
