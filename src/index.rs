//! Project index contract and the snapshot-backed implementation.
//!
//! The engine never computes code intelligence itself: symbol resolution,
//! reference search, implementation/derived-type search, and diagnostics all
//! come from a project index collaborator behind the [`ProjectIndex`] trait.
//! [`StaticIndex`] is the shipped implementation, deserialized from a JSON
//! snapshot produced by whatever indexer the deployment runs.

use std::fs;
use std::path::Path;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{CodeNavError, Result};
use crate::schema::{Diagnostic, Location, Position, ReferenceSite, SourceSpan, SymbolRef};

/// Capability contract consumed from the project index collaborator.
///
/// Absence of data is a legitimate empty result; only inability to reach the
/// collaborator is an error (`IndexUnavailable`).
pub trait ProjectIndex: Send + Sync {
    /// Resolve the symbol declared at or containing a position.
    fn resolve_symbol_at(&self, document: &str, position: Position) -> Result<Option<SymbolRef>>;

    /// All reference occurrences of a symbol, declaration sites included.
    fn find_references(&self, symbol: &SymbolRef) -> Result<Vec<ReferenceSite>>;

    /// Symbols called from the body of a symbol.
    fn callees_of(&self, symbol: &SymbolRef) -> Result<Vec<SymbolRef>>;

    /// Direct implementations/overrides of a member, or implementations of an
    /// interface member.
    fn find_implementations(&self, symbol: &SymbolRef) -> Result<Vec<SymbolRef>>;

    /// Types derived from a type, optionally transitively.
    fn find_derived_types(&self, type_symbol: &SymbolRef, transitive: bool)
        -> Result<Vec<SymbolRef>>;

    /// The declaration whose body encloses a reference site, if any.
    fn resolve_enclosing_declaration(
        &self,
        document: &str,
        span: SourceSpan,
    ) -> Result<Option<SymbolRef>>;

    /// Declared source location; `None` for symbols with no source.
    fn declaration_location(&self, symbol: &SymbolRef) -> Option<Location>;

    /// The member this member directly overrides, if any (base-chain pointer).
    fn overridden_member(&self, symbol: &SymbolRef) -> Result<Option<SymbolRef>>;

    /// Same-named member lookup on a type.
    fn member_named(&self, type_symbol: &SymbolRef, name: &str) -> Result<Option<SymbolRef>>;

    /// Diagnostics for one document, or for the whole project when `None`.
    fn diagnostics(&self, document: Option<&str>) -> Result<Vec<Diagnostic>>;

    /// Name lookup for root resolution. Exact matches win over substring
    /// matches; `*`/`?` wildcards are supported.
    fn find_symbols_named(&self, query: &str) -> Result<Vec<SymbolRef>>;

    /// Cheap summary counts for the loaded index.
    fn stats(&self) -> IndexStats;
}

/// Summary counts surfaced by the `index_summary` tool
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub symbols: usize,
    pub references: usize,
    pub call_edges: usize,
    pub implementation_links: usize,
    pub derived_type_links: usize,
    pub override_links: usize,
    pub diagnostics: usize,
}

// ============================================================================
// Snapshot Format
// ============================================================================

/// One declared symbol plus the span of its body (used for enclosing-declaration
/// resolution; symbols without source omit it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    #[serde(flatten)]
    pub symbol: SymbolRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_span: Option<SourceSpan>,
}

/// One reference occurrence of a symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub symbol_id: String,
    pub document: String,
    pub span: SourceSpan,
}

/// One caller -> callee edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub caller: String,
    pub callee: String,
}

/// A directed link between two symbol ids; meaning depends on the table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    pub from: String,
    pub to: String,
}

/// Serialized form of a project index, as produced by an external indexer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSnapshot {
    #[serde(default)]
    pub symbols: Vec<SymbolRecord>,

    #[serde(default)]
    pub references: Vec<ReferenceRecord>,

    #[serde(default)]
    pub calls: Vec<CallRecord>,

    /// base member/interface member -> implementing/overriding member
    #[serde(default)]
    pub implementations: Vec<LinkRecord>,

    /// base type -> directly derived type
    #[serde(default)]
    pub derived_types: Vec<LinkRecord>,

    /// member -> the member it directly overrides
    #[serde(default)]
    pub overrides: Vec<LinkRecord>,

    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

// ============================================================================
// StaticIndex
// ============================================================================

/// In-memory [`ProjectIndex`] backed by an [`IndexSnapshot`].
///
/// All lookups are precomputed into hash maps at load time; queries are
/// read-only afterwards, so the type is trivially `Send + Sync`.
pub struct StaticIndex {
    symbols: AHashMap<String, SymbolRef>,
    declarations_by_file: AHashMap<String, Vec<(String, SourceSpan)>>,
    references: AHashMap<String, Vec<ReferenceSite>>,
    callees: AHashMap<String, Vec<String>>,
    implementations: AHashMap<String, Vec<String>>,
    derived: AHashMap<String, Vec<String>>,
    overridden: AHashMap<String, String>,
    members_by_container: AHashMap<String, AHashMap<String, String>>,
    diagnostics: Vec<Diagnostic>,
    stats: IndexStats,
}

impl StaticIndex {
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Self {
        let mut symbols = AHashMap::new();
        let mut declarations_by_file: AHashMap<String, Vec<(String, SourceSpan)>> = AHashMap::new();
        let mut members_by_container: AHashMap<String, AHashMap<String, String>> = AHashMap::new();

        for record in &snapshot.symbols {
            let sym = &record.symbol;
            if let (Some(location), Some(span)) = (&sym.location, record.body_span) {
                declarations_by_file
                    .entry(location.file.clone())
                    .or_default()
                    .push((sym.id.clone(), span));
            }
            if !sym.container.is_empty() {
                members_by_container
                    .entry(sym.container.clone())
                    .or_default()
                    .entry(sym.name.clone())
                    .or_insert_with(|| sym.id.clone());
            }
            symbols.insert(sym.id.clone(), sym.clone());
        }

        let mut references: AHashMap<String, Vec<ReferenceSite>> = AHashMap::new();
        for r in &snapshot.references {
            references.entry(r.symbol_id.clone()).or_default().push(ReferenceSite {
                document: r.document.clone(),
                span: r.span,
            });
        }

        let mut callees: AHashMap<String, Vec<String>> = AHashMap::new();
        for c in &snapshot.calls {
            callees.entry(c.caller.clone()).or_default().push(c.callee.clone());
        }

        let mut implementations: AHashMap<String, Vec<String>> = AHashMap::new();
        for l in &snapshot.implementations {
            implementations.entry(l.from.clone()).or_default().push(l.to.clone());
        }

        let mut derived: AHashMap<String, Vec<String>> = AHashMap::new();
        for l in &snapshot.derived_types {
            derived.entry(l.from.clone()).or_default().push(l.to.clone());
        }

        let mut overridden: AHashMap<String, String> = AHashMap::new();
        for l in &snapshot.overrides {
            overridden.entry(l.from.clone()).or_insert_with(|| l.to.clone());
        }

        let stats = IndexStats {
            symbols: symbols.len(),
            references: snapshot.references.len(),
            call_edges: snapshot.calls.len(),
            implementation_links: snapshot.implementations.len(),
            derived_type_links: snapshot.derived_types.len(),
            override_links: snapshot.overrides.len(),
            diagnostics: snapshot.diagnostics.len(),
        };

        Self {
            symbols,
            declarations_by_file,
            references,
            callees,
            implementations,
            derived,
            overridden,
            members_by_container,
            diagnostics: snapshot.diagnostics,
            stats,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: IndexSnapshot =
            serde_json::from_str(json).map_err(|e| CodeNavError::SnapshotFailure {
                message: format!("invalid snapshot JSON: {}", e),
            })?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| CodeNavError::SnapshotFailure {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&data)
    }

    pub fn symbol(&self, id: &str) -> Option<&SymbolRef> {
        self.symbols.get(id)
    }

    fn resolve_ids(&self, ids: &[String]) -> Vec<SymbolRef> {
        ids.iter().filter_map(|id| self.symbols.get(id).cloned()).collect()
    }

    /// Innermost declaration in `document` whose body satisfies `pred`.
    fn innermost_declaration<F>(&self, document: &str, pred: F) -> Option<SymbolRef>
    where
        F: Fn(&SourceSpan) -> bool,
    {
        let declarations = self.declarations_by_file.get(document)?;
        declarations
            .iter()
            .filter(|(_, span)| pred(span))
            .min_by_key(|(_, span)| span.line_extent())
            .and_then(|(id, _)| self.symbols.get(id).cloned())
    }
}

impl ProjectIndex for StaticIndex {
    fn resolve_symbol_at(&self, document: &str, position: Position) -> Result<Option<SymbolRef>> {
        Ok(self.innermost_declaration(document, |span| span.contains(position)))
    }

    fn find_references(&self, symbol: &SymbolRef) -> Result<Vec<ReferenceSite>> {
        Ok(self.references.get(&symbol.id).cloned().unwrap_or_default())
    }

    fn callees_of(&self, symbol: &SymbolRef) -> Result<Vec<SymbolRef>> {
        let ids = self.callees.get(&symbol.id).cloned().unwrap_or_default();
        Ok(self.resolve_ids(&ids))
    }

    fn find_implementations(&self, symbol: &SymbolRef) -> Result<Vec<SymbolRef>> {
        let ids = self.implementations.get(&symbol.id).cloned().unwrap_or_default();
        Ok(self.resolve_ids(&ids))
    }

    fn find_derived_types(
        &self,
        type_symbol: &SymbolRef,
        transitive: bool,
    ) -> Result<Vec<SymbolRef>> {
        let direct = self.derived.get(&type_symbol.id).cloned().unwrap_or_default();
        if !transitive {
            return Ok(self.resolve_ids(&direct));
        }

        let mut seen: AHashSet<String> = AHashSet::new();
        let mut queue: Vec<String> = direct;
        let mut out = Vec::new();
        while let Some(id) = queue.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(next) = self.derived.get(&id) {
                queue.extend(next.iter().cloned());
            }
            if let Some(sym) = self.symbols.get(&id) {
                out.push(sym.clone());
            }
        }
        Ok(out)
    }

    fn resolve_enclosing_declaration(
        &self,
        document: &str,
        span: SourceSpan,
    ) -> Result<Option<SymbolRef>> {
        Ok(self.innermost_declaration(document, |decl| decl.contains_span(&span)))
    }

    fn declaration_location(&self, symbol: &SymbolRef) -> Option<Location> {
        self.symbols.get(&symbol.id).and_then(|s| s.location.clone())
    }

    fn overridden_member(&self, symbol: &SymbolRef) -> Result<Option<SymbolRef>> {
        Ok(self
            .overridden
            .get(&symbol.id)
            .and_then(|id| self.symbols.get(id).cloned()))
    }

    fn member_named(&self, type_symbol: &SymbolRef, name: &str) -> Result<Option<SymbolRef>> {
        let members = match self
            .members_by_container
            .get(&type_symbol.display())
            .or_else(|| self.members_by_container.get(&type_symbol.name))
        {
            Some(m) => m,
            None => return Ok(None),
        };
        Ok(members.get(name).and_then(|id| self.symbols.get(id).cloned()))
    }

    fn diagnostics(&self, document: Option<&str>) -> Result<Vec<Diagnostic>> {
        match document {
            Some(file) => Ok(self
                .diagnostics
                .iter()
                .filter(|d| d.file == file)
                .cloned()
                .collect()),
            None => Ok(self.diagnostics.clone()),
        }
    }

    fn find_symbols_named(&self, query: &str) -> Result<Vec<SymbolRef>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        // Direct id hit first: callers may pass through an id they got from a
        // previous response.
        if let Some(sym) = self.symbols.get(query) {
            return Ok(vec![sym.clone()]);
        }

        if query.contains('*') || query.contains('?') {
            let pattern = wildcard_to_regex(query)?;
            let mut matches: Vec<SymbolRef> = self
                .symbols
                .values()
                .filter(|s| pattern.is_match(&s.name) || pattern.is_match(&s.display()))
                .cloned()
                .collect();
            sort_by_location(&mut matches);
            return Ok(matches);
        }

        let query_lower = query.to_lowercase();
        let mut exact = Vec::new();
        let mut partial = Vec::new();
        for sym in self.symbols.values() {
            let name_lower = sym.name.to_lowercase();
            if name_lower == query_lower || sym.display().to_lowercase() == query_lower {
                exact.push(sym.clone());
            } else if name_lower.contains(&query_lower) {
                partial.push(sym.clone());
            }
        }

        let mut matches = if !exact.is_empty() { exact } else { partial };
        sort_by_location(&mut matches);
        Ok(matches)
    }

    fn stats(&self) -> IndexStats {
        self.stats.clone()
    }
}

fn wildcard_to_regex(query: &str) -> Result<regex::Regex> {
    let mut pattern = String::from("(?i)^");
    for ch in query.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(&c.to_string())),
        }
    }
    pattern.push('$');
    regex::Regex::new(&pattern).map_err(|e| CodeNavError::InvalidDepthOrBudget {
        message: format!("bad symbol pattern '{}': {}", query, e),
    })
}

/// Deterministic ordering for name-lookup results: declared symbols by source
/// position, locationless ones last by display name.
fn sort_by_location(symbols: &mut [SymbolRef]) {
    symbols.sort_by(|a, b| match (&a.location, &b.location) {
        (Some(la), Some(lb)) => (&la.file, la.line, la.column, a.display())
            .cmp(&(&lb.file, lb.line, lb.column, b.display())),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.display().cmp(&b.display()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Modifiers, SymbolKind};

    fn record(id: &str, name: &str, file: &str, start: u32, end: u32) -> SymbolRecord {
        SymbolRecord {
            symbol: SymbolRef {
                id: id.to_string(),
                name: name.to_string(),
                container: String::new(),
                kind: SymbolKind::Function,
                modifiers: Modifiers::default(),
                is_external: false,
                location: Some(Location {
                    file: file.to_string(),
                    line: start,
                    column: 1,
                }),
            },
            body_span: Some(SourceSpan::new(start, 1, end, 1)),
        }
    }

    fn index_with(records: Vec<SymbolRecord>) -> StaticIndex {
        StaticIndex::from_snapshot(IndexSnapshot {
            symbols: records,
            ..Default::default()
        })
    }

    #[test]
    fn enclosing_declaration_picks_innermost() {
        let index = index_with(vec![
            record("outer", "Outer", "a.rs", 1, 100),
            record("inner", "Inner", "a.rs", 10, 20),
        ]);
        let span = SourceSpan::new(12, 1, 12, 5);
        let found = index
            .resolve_enclosing_declaration("a.rs", span)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "inner");
    }

    #[test]
    fn name_lookup_prefers_exact_matches() {
        let index = index_with(vec![
            record("a", "Process", "a.rs", 1, 5),
            record("b", "ProcessAll", "a.rs", 10, 15),
        ]);
        let found = index.find_symbols_named("process").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");

        let partial = index.find_symbols_named("processa").unwrap();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].id, "b");
    }

    #[test]
    fn name_lookup_supports_wildcards() {
        let index = index_with(vec![
            record("a", "Process", "a.rs", 1, 5),
            record("b", "ProcessAll", "a.rs", 10, 15),
            record("c", "Reprocess", "a.rs", 20, 25),
        ]);
        let found = index.find_symbols_named("Process*").unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn derived_types_transitive_walk() {
        let mut snapshot = IndexSnapshot {
            symbols: vec![
                record("base", "Base", "a.rs", 1, 5),
                record("mid", "Mid", "a.rs", 10, 15),
                record("leaf", "Leaf", "a.rs", 20, 25),
            ],
            ..Default::default()
        };
        snapshot.derived_types = vec![
            LinkRecord { from: "base".to_string(), to: "mid".to_string() },
            LinkRecord { from: "mid".to_string(), to: "leaf".to_string() },
        ];
        let index = StaticIndex::from_snapshot(snapshot);
        let base = index.symbol("base").unwrap().clone();

        let direct = index.find_derived_types(&base, false).unwrap();
        assert_eq!(direct.len(), 1);

        let all = index.find_derived_types(&base, true).unwrap();
        assert_eq!(all.len(), 2);
    }
}
