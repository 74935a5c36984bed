//! Version edges and path selection.
//!
//! Selection policy, most specific first:
//! 1. an edge registered exactly for `from -> to`;
//! 2. a chain of single-step edges `from -> from+1 -> ... -> to`;
//! 3. the catch-all edge, when it targets `to` and `from < to`;
//! 4. otherwise [`MigrateError::NoMigrationPath`].
//!
//! Exactly one of these is chosen per run, so the catch-all never runs on top
//! of an explicit path.

use crate::context::MigrationContext;
use crate::error::{MigrateError, MigrateResult};
use cz_core::SchemaVersion;
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::fmt;

/// Procedure run by an edge or its post-migrate hook.
pub type EdgeBody = fn(&MigrationContext<'_>) -> MigrateResult<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// `to == from + 1`
    Step,
    /// `to > from + 1`
    Skip,
    /// Any version below `to`.
    CatchAll,
}

#[derive(Clone)]
pub struct MigrationEdge {
    from: SchemaVersion,
    to: SchemaVersion,
    kind: EdgeKind,
    description: &'static str,
    body: EdgeBody,
    post_migrate: Option<EdgeBody>,
}

impl MigrationEdge {
    pub fn new(from: u32, to: u32, description: &'static str, body: EdgeBody) -> Self {
        let kind = if to == from.saturating_add(1) {
            EdgeKind::Step
        } else {
            EdgeKind::Skip
        };
        Self {
            from: SchemaVersion::new(from),
            to: SchemaVersion::new(to),
            kind,
            description,
            body,
            post_migrate: None,
        }
    }

    /// Edge from any older version to `to`. Its body must bring any prior
    /// schema state up to `to`, however it got there.
    pub fn catch_all(to: u32, description: &'static str, body: EdgeBody) -> Self {
        Self {
            from: SchemaVersion::UNVERSIONED,
            to: SchemaVersion::new(to),
            kind: EdgeKind::CatchAll,
            description,
            body,
            post_migrate: None,
        }
    }

    /// Run `hook` after the body, in the same transaction.
    pub fn with_post_migrate(mut self, hook: EdgeBody) -> Self {
        self.post_migrate = Some(hook);
        self
    }

    pub fn from(&self) -> SchemaVersion {
        self.from
    }

    pub fn to(&self) -> SchemaVersion {
        self.to
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn is_catch_all(&self) -> bool {
        self.kind == EdgeKind::CatchAll
    }

    pub fn has_post_migrate(&self) -> bool {
        self.post_migrate.is_some()
    }

    /// Run the body, then the post-migrate hook if any.
    pub fn apply(&self, ctx: &MigrationContext<'_>) -> MigrateResult<()> {
        (self.body)(ctx)?;
        if let Some(hook) = self.post_migrate {
            hook(ctx)?;
        }
        Ok(())
    }
}

impl fmt::Display for MigrationEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_catch_all() {
            write!(f, "* -> {}", self.to)
        } else {
            write!(f, "{} -> {}", self.from, self.to)
        }
    }
}

impl fmt::Debug for MigrationEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationEdge")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("post_migrate", &self.post_migrate.is_some())
            .finish()
    }
}

/// Which rule of the selection policy produced a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Already at the target.
    Current,
    Exact,
    Chain,
    CatchAll,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathKind::Current => "current",
            PathKind::Exact => "exact edge",
            PathKind::Chain => "single-step chain",
            PathKind::CatchAll => "catch-all",
        })
    }
}

/// Edges chosen for one run, in execution order.
#[derive(Debug, Clone)]
pub struct MigrationPath<'r> {
    pub kind: PathKind,
    pub edges: Vec<&'r MigrationEdge>,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    edges: Vec<MigrationEdge>,
    catch_all: Option<MigrationEdge>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge, rejecting backward edges, duplicates, and a second
    /// catch-all.
    pub fn register(&mut self, edge: MigrationEdge) -> MigrateResult<()> {
        if edge.is_catch_all() {
            if edge.to == SchemaVersion::UNVERSIONED {
                return Err(MigrateError::InvalidEdge {
                    from: edge.from,
                    to: edge.to,
                    reason: "catch-all must target a real version".to_string(),
                });
            }
            if self.catch_all.is_some() {
                return Err(MigrateError::DuplicateEdge {
                    from: edge.from,
                    to: edge.to,
                });
            }
            self.catch_all = Some(edge);
            return Ok(());
        }

        if edge.to <= edge.from {
            return Err(MigrateError::InvalidEdge {
                from: edge.from,
                to: edge.to,
                reason: "target must be newer than source".to_string(),
            });
        }
        if self.find(edge.from, edge.to).is_some() {
            return Err(MigrateError::DuplicateEdge {
                from: edge.from,
                to: edge.to,
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, edge: MigrationEdge) -> MigrateResult<Self> {
        self.register(edge)?;
        Ok(self)
    }

    /// Explicit edges in registration order (the catch-all excluded).
    pub fn edges(&self) -> &[MigrationEdge] {
        &self.edges
    }

    pub fn catch_all(&self) -> Option<&MigrationEdge> {
        self.catch_all.as_ref()
    }

    /// Highest version any edge reaches.
    pub fn latest(&self) -> Option<SchemaVersion> {
        self.edges
            .iter()
            .chain(self.catch_all.iter())
            .map(|e| e.to)
            .max()
    }

    fn find(&self, from: SchemaVersion, to: SchemaVersion) -> Option<&MigrationEdge> {
        self.edges.iter().find(|e| e.from == from && e.to == to)
    }

    /// Choose the path from `from` to `to`.
    pub fn select(&self, from: SchemaVersion, to: SchemaVersion) -> MigrateResult<MigrationPath<'_>> {
        if from == to {
            return Ok(MigrationPath {
                kind: PathKind::Current,
                edges: Vec::new(),
            });
        }
        if from > to {
            return Err(MigrateError::NoMigrationPath { from, to });
        }

        if let Some(edge) = self.find(from, to) {
            return Ok(MigrationPath {
                kind: PathKind::Exact,
                edges: vec![edge],
            });
        }

        if let Some(chain) = self.step_chain(from, to) {
            return Ok(MigrationPath {
                kind: PathKind::Chain,
                edges: chain,
            });
        }

        match &self.catch_all {
            Some(edge) if edge.to == to => Ok(MigrationPath {
                kind: PathKind::CatchAll,
                edges: vec![edge],
            }),
            _ => Err(MigrateError::NoMigrationPath { from, to }),
        }
    }

    /// Edges to execute for `from -> to`; empty when already there.
    pub fn edges_for(
        &self,
        from: SchemaVersion,
        to: SchemaVersion,
    ) -> MigrateResult<Vec<&MigrationEdge>> {
        Ok(self.select(from, to)?.edges)
    }

    /// Whether [`select`](Self::select) finds a path.
    pub fn supports(&self, from: SchemaVersion, to: SchemaVersion) -> bool {
        self.select(from, to).is_ok()
    }

    /// Whether explicit edges (step and skip, in any combination) connect
    /// `from` to `to`. Broader than the selection policy; reported by
    /// diagnostics to spot versions that only the catch-all can upgrade.
    pub fn explicit_path_exists(&self, from: SchemaVersion, to: SchemaVersion) -> bool {
        let graph: DiGraphMap<u32, ()> = self
            .edges
            .iter()
            .map(|e| (e.from.get(), e.to.get()))
            .collect();
        if !graph.contains_node(from.get()) || !graph.contains_node(to.get()) {
            return from == to;
        }
        has_path_connecting(&graph, from.get(), to.get(), None)
    }

    fn step_chain(&self, from: SchemaVersion, to: SchemaVersion) -> Option<Vec<&MigrationEdge>> {
        let mut chain = Vec::new();
        let mut current = from;
        while current < to {
            let next = current.next();
            let edge = self
                .edges
                .iter()
                .find(|e| e.kind == EdgeKind::Step && e.from == current && e.to == next)?;
            chain.push(edge);
            current = next;
        }
        Some(chain)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
