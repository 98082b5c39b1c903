//! Common test fixtures for codenav-engine integration tests
//!
//! `SnapshotBuilder` assembles index snapshots declaratively: symbols with
//! body spans, call edges (which also plant a reference site inside the
//! caller's body, the way a real indexer would), type links, and diagnostics.

#![allow(dead_code)]

use std::collections::HashMap;

use codenav_engine::config::EngineConfig;
use codenav_engine::engine::CodeNavEngine;
use codenav_engine::index::{
    CallRecord, IndexSnapshot, LinkRecord, ReferenceRecord, StaticIndex, SymbolRecord,
};
use codenav_engine::schema::{
    Diagnostic, Location, Modifiers, Severity, SourceSpan, SymbolKind, SymbolRef,
};

pub struct SnapshotBuilder {
    snapshot: IndexSnapshot,
    refs_in_caller: HashMap<String, u32>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            snapshot: IndexSnapshot::default(),
            refs_in_caller: HashMap::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn symbol(
        mut self,
        id: &str,
        name: &str,
        container: &str,
        kind: SymbolKind,
        modifiers: Modifiers,
        file: &str,
        start_line: u32,
        end_line: u32,
    ) -> Self {
        self.snapshot.symbols.push(SymbolRecord {
            symbol: SymbolRef {
                id: id.to_string(),
                name: name.to_string(),
                container: container.to_string(),
                kind,
                modifiers,
                is_external: false,
                location: Some(Location {
                    file: file.to_string(),
                    line: start_line,
                    column: 1,
                }),
            },
            body_span: Some(SourceSpan::new(start_line, 1, end_line, 1)),
        });
        self
    }

    pub fn function(self, id: &str, name: &str, file: &str, start: u32, end: u32) -> Self {
        self.symbol(id, name, "", SymbolKind::Function, Modifiers::default(), file, start, end)
    }

    pub fn method(
        self,
        id: &str,
        name: &str,
        container: &str,
        file: &str,
        start: u32,
        end: u32,
    ) -> Self {
        self.symbol(id, name, container, SymbolKind::Method, Modifiers::default(), file, start, end)
    }

    pub fn abstract_method(
        self,
        id: &str,
        name: &str,
        container: &str,
        file: &str,
        start: u32,
        end: u32,
    ) -> Self {
        let modifiers = Modifiers {
            is_abstract: true,
            ..Modifiers::default()
        };
        self.symbol(id, name, container, SymbolKind::Method, modifiers, file, start, end)
    }

    pub fn override_method(
        self,
        id: &str,
        name: &str,
        container: &str,
        file: &str,
        start: u32,
        end: u32,
    ) -> Self {
        let modifiers = Modifiers {
            is_override: true,
            ..Modifiers::default()
        };
        self.symbol(id, name, container, SymbolKind::Method, modifiers, file, start, end)
    }

    pub fn ty(self, id: &str, name: &str, file: &str, start: u32, end: u32) -> Self {
        self.symbol(id, name, "", SymbolKind::Type, Modifiers::default(), file, start, end)
    }

    pub fn interface(self, id: &str, name: &str, file: &str, start: u32, end: u32) -> Self {
        self.symbol(id, name, "", SymbolKind::Interface, Modifiers::default(), file, start, end)
    }

    pub fn external_function(mut self, id: &str, name: &str) -> Self {
        self.snapshot.symbols.push(SymbolRecord {
            symbol: SymbolRef {
                id: id.to_string(),
                name: name.to_string(),
                container: String::new(),
                kind: SymbolKind::Function,
                modifiers: Modifiers::default(),
                is_external: true,
                location: None,
            },
            body_span: None,
        });
        self
    }

    /// Record `caller` calling `callee`: a forward call edge plus a reference
    /// site planted inside the caller's body.
    pub fn call(mut self, caller: &str, callee: &str) -> Self {
        let (file, start_line) = self
            .snapshot
            .symbols
            .iter()
            .find(|r| r.symbol.id == caller)
            .and_then(|r| {
                r.symbol
                    .location
                    .as_ref()
                    .map(|l| (l.file.clone(), l.line))
            })
            .expect("caller must be declared with a location before .call()");

        let offset = self.refs_in_caller.entry(caller.to_string()).or_insert(0);
        *offset += 1;
        let line = start_line + *offset;

        self.snapshot.calls.push(CallRecord {
            caller: caller.to_string(),
            callee: callee.to_string(),
        });
        self.snapshot.references.push(ReferenceRecord {
            symbol_id: callee.to_string(),
            document: file,
            span: SourceSpan::new(line, 5, line, 25),
        });
        self
    }

    /// Raw reference site, independent of any caller declaration.
    pub fn reference(mut self, symbol_id: &str, document: &str, line: u32) -> Self {
        self.snapshot.references.push(ReferenceRecord {
            symbol_id: symbol_id.to_string(),
            document: document.to_string(),
            span: SourceSpan::new(line, 5, line, 25),
        });
        self
    }

    pub fn implements(mut self, base: &str, member: &str) -> Self {
        self.snapshot.implementations.push(LinkRecord {
            from: base.to_string(),
            to: member.to_string(),
        });
        self
    }

    pub fn derives(mut self, base: &str, derived: &str) -> Self {
        self.snapshot.derived_types.push(LinkRecord {
            from: base.to_string(),
            to: derived.to_string(),
        });
        self
    }

    pub fn overrides_link(mut self, member: &str, base: &str) -> Self {
        self.snapshot.overrides.push(LinkRecord {
            from: member.to_string(),
            to: base.to_string(),
        });
        self
    }

    pub fn diagnostic(
        mut self,
        file: &str,
        line: u32,
        severity: Severity,
        code: Option<&str>,
        message: &str,
    ) -> Self {
        self.snapshot.diagnostics.push(Diagnostic {
            file: file.to_string(),
            span: SourceSpan::new(line, 1, line, 40),
            severity,
            code: code.map(str::to_string),
            message: message.to_string(),
        });
        self
    }

    pub fn snapshot(self) -> IndexSnapshot {
        self.snapshot
    }

    pub fn build(self) -> StaticIndex {
        StaticIndex::from_snapshot(self.snapshot)
    }
}

pub fn sym(index: &StaticIndex, id: &str) -> SymbolRef {
    index
        .symbol(id)
        .unwrap_or_else(|| panic!("fixture symbol {} missing", id))
        .clone()
}

pub fn engine(index: StaticIndex) -> CodeNavEngine<StaticIndex> {
    CodeNavEngine::new(index, EngineConfig::default())
}

pub fn engine_with(index: StaticIndex, config: EngineConfig) -> CodeNavEngine<StaticIndex> {
    CodeNavEngine::new(index, config)
}

/// Root function `target` with `n` distinct callers, each in its own file.
pub fn fanout_index(n: u32) -> StaticIndex {
    let mut builder = SnapshotBuilder::new().function("target", "Target", "target.rs", 1, 10);
    for i in 0..n {
        let id = format!("caller{}", i);
        let file = format!("caller{}.rs", i);
        builder = builder
            .function(&id, &format!("Caller{}", i), &file, 1, 30)
            .call(&id, "target");
    }
    builder.build()
}

/// Mutually recursive pair: `a` calls `b`, `b` calls `a`.
pub fn cycle_index() -> StaticIndex {
    SnapshotBuilder::new()
        .function("a", "Alpha", "a.rs", 1, 20)
        .function("b", "Beta", "b.rs", 1, 20)
        .call("a", "b")
        .call("b", "a")
        .build()
}

/// Diamond: `a` calls `b` and `c`; both call `d`; `d` calls `e`.
pub fn diamond_index() -> StaticIndex {
    SnapshotBuilder::new()
        .function("a", "Entry", "a.rs", 1, 20)
        .function("b", "Left", "b.rs", 1, 20)
        .function("c", "Right", "c.rs", 1, 20)
        .function("d", "Shared", "d.rs", 1, 20)
        .function("e", "Leaf", "e.rs", 1, 20)
        .call("a", "b")
        .call("a", "c")
        .call("b", "d")
        .call("c", "d")
        .call("d", "e")
        .build()
}
