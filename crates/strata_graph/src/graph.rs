//! The dependency graph and build queue over sessions.

use std::collections::{BTreeMap, BTreeSet};

use strata_config::SessionDecl;

use crate::error::GraphError;
use crate::session::Session;

/// One graph node: the session plus the names of its prerequisites.
#[derive(Debug, Clone)]
struct Entry {
    session: Session,
    deps: BTreeSet<String>,
}

/// An acyclic dependency graph of sessions, keyed by name.
///
/// Dependencies point from a session to its prerequisites (ancestors). The
/// structure supports general multi-parent edges even though declarations
/// restrict each session to a single parent; the restriction is enforced at
/// the declaration layer.
///
/// The scheduler uses a restricted copy of the graph as its pending queue:
/// harvested sessions are [`remove`](SessionGraph::remove)d, which prunes
/// them from the remaining dependency sets, and
/// [`dequeue`](SessionGraph::dequeue) picks the next ready session.
#[derive(Debug, Clone, Default)]
pub struct SessionGraph {
    entries: BTreeMap<String, Entry>,
}

impl SessionGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the full graph from validated declarations.
    ///
    /// Each session depends on its declared parent. Declarations may appear
    /// in any order; insertion proceeds in waves so parents always land
    /// first. A parent loop (which passes declaration-level validation,
    /// since every referenced name exists) surfaces here as
    /// `CycleDetected`.
    pub fn from_decls(decls: &[SessionDecl]) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        let mut pending: Vec<&SessionDecl> = decls.iter().collect();
        while !pending.is_empty() {
            let (ready, stuck): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|d| d.parent.as_ref().map_or(true, |p| graph.contains(p)));
            if ready.is_empty() {
                return Err(GraphError::CycleDetected(parent_loop(&stuck)));
            }
            for decl in ready {
                let deps: Vec<String> = decl.parent.clone().into_iter().collect();
                graph.insert(Session::from_decl(decl), &deps)?;
            }
            pending = stuck;
        }
        Ok(graph)
    }

    /// Number of sessions in the graph.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the graph holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if a session with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Looks up a session by name.
    pub fn get(&self, name: &str) -> Option<&Session> {
        self.entries.get(name).map(|e| &e.session)
    }

    /// Session names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Inserts a new session with the given prerequisite names.
    ///
    /// Fails with `DuplicateSession` if the name is taken, with
    /// `UndefinedSession` if any prerequisite is not already in the graph,
    /// and with `CycleDetected` for a self-dependency. A failed insertion
    /// leaves the graph untouched.
    pub fn insert(&mut self, session: Session, deps: &[String]) -> Result<(), GraphError> {
        let name = session.name.clone();
        if self.entries.contains_key(&name) {
            return Err(GraphError::DuplicateSession(name));
        }
        let missing: Vec<String> = deps
            .iter()
            .filter(|d| !self.entries.contains_key(*d))
            .filter(|d| **d != name)
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(GraphError::UndefinedSession(missing));
        }
        if deps.iter().any(|d| *d == name) {
            return Err(GraphError::CycleDetected(vec![name.clone(), name]));
        }
        self.entries.insert(
            name,
            Entry {
                session,
                deps: deps.iter().cloned().collect(),
            },
        );
        Ok(())
    }

    /// Adds prerequisite edges to an existing session.
    ///
    /// Fails with `UndefinedSession` if the session or any prerequisite is
    /// missing, and with `CycleDetected` (carrying the ordered loop) if any
    /// edge would close a cycle. A failed call leaves the graph untouched.
    pub fn add_deps(&mut self, name: &str, deps: &[String]) -> Result<(), GraphError> {
        let mut missing: Vec<String> = Vec::new();
        if !self.entries.contains_key(name) {
            missing.push(name.to_string());
        }
        missing.extend(
            deps.iter()
                .filter(|d| !self.entries.contains_key(*d))
                .cloned(),
        );
        if !missing.is_empty() {
            return Err(GraphError::UndefinedSession(missing));
        }
        // All edges are checked before any is added.
        for dep in deps {
            if dep == name {
                return Err(GraphError::CycleDetected(vec![
                    name.to_string(),
                    name.to_string(),
                ]));
            }
            if let Some(mut path) = self.find_path(name, dep) {
                path.push(name.to_string());
                return Err(GraphError::CycleDetected(path));
            }
        }
        if let Some(entry) = self.entries.get_mut(name) {
            entry.deps.extend(deps.iter().cloned());
        }
        Ok(())
    }

    /// Removes a session and every edge touching it.
    ///
    /// Dependents are not cascade-removed; their dependency sets simply
    /// shrink, which is exactly what the pending queue relies on.
    pub fn remove(&mut self, name: &str) {
        self.entries.remove(name);
        for entry in self.entries.values_mut() {
            entry.deps.remove(name);
        }
    }

    /// Sessions that directly depend on `name`, in lexicographic order.
    fn children(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.deps.contains(name))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Finds a dependency-order path `from ⇝ to` along child edges.
    ///
    /// Returns the node names from `from` to `to` inclusive, or `None` if
    /// `to` is not a descendant of `from`.
    fn find_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        if from == to {
            return Some(vec![from.to_string()]);
        }
        for child in self.children(from) {
            if let Some(mut path) = self.find_path(child, to) {
                path.insert(0, from.to_string());
                return Some(path);
            }
        }
        None
    }

    /// Forward transitive closure: the seeds plus all their descendants.
    pub fn all_succs(&self, seeds: &BTreeSet<String>) -> BTreeSet<String> {
        let mut reached: BTreeSet<String> = BTreeSet::new();
        let mut frontier: Vec<String> = seeds
            .iter()
            .filter(|s| self.entries.contains_key(*s))
            .cloned()
            .collect();
        while let Some(name) = frontier.pop() {
            if reached.insert(name.clone()) {
                for child in self.children(&name) {
                    frontier.push(child.to_string());
                }
            }
        }
        reached
    }

    /// Backward transitive closure: the seeds plus all their ancestors.
    pub fn all_preds(&self, seeds: &BTreeSet<String>) -> BTreeSet<String> {
        let mut reached: BTreeSet<String> = BTreeSet::new();
        let mut frontier: Vec<String> = seeds
            .iter()
            .filter(|s| self.entries.contains_key(*s))
            .cloned()
            .collect();
        while let Some(name) = frontier.pop() {
            if reached.insert(name.clone()) {
                if let Some(entry) = self.entries.get(&name) {
                    frontier.extend(entry.deps.iter().cloned());
                }
            }
        }
        reached
    }

    /// The induced sub-graph restricted to `keep`.
    ///
    /// Dependency edges leading outside `keep` are dropped.
    pub fn restrict(&self, keep: &BTreeSet<String>) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(n, _)| keep.contains(*n))
            .map(|(n, e)| {
                let deps = e.deps.intersection(keep).cloned().collect();
                (
                    n.clone(),
                    Entry {
                        session: e.session.clone(),
                        deps,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Sessions in a stable topological order, ancestors strictly first.
    ///
    /// Among sessions whose prerequisites are all emitted, lexicographic
    /// name order breaks ties, so equal graphs list identically.
    pub fn topological_order(&self) -> Vec<(&str, &Session)> {
        let mut indegree: BTreeMap<&str, usize> = self
            .entries
            .iter()
            .map(|(n, e)| (n.as_str(), e.deps.len()))
            .collect();
        let mut ready: BTreeSet<&str> = indegree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();
        let mut order = Vec::with_capacity(self.entries.len());
        while let Some(name) = ready.iter().next().copied() {
            ready.remove(name);
            order.push((name, &self.entries[name].session));
            for child in self.children(name) {
                if let Some(d) = indegree.get_mut(child) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(child);
                    }
                }
            }
        }
        order
    }

    /// Resolves a user selection into the affected descendant set and the
    /// restricted build queue.
    ///
    /// The selection is every session when `select_all` is set, otherwise
    /// the explicitly named sessions plus every session carrying one of the
    /// requested group tags. Returns the forward closure of the selection
    /// (sorted) and the queue restricted to the backward closure of that
    /// forward closure — every ancestor needed, the selection itself, and
    /// its descendants.
    ///
    /// Fails with `UndefinedSession` listing every explicit name not in the
    /// graph.
    pub fn required(
        &self,
        select_all: bool,
        groups: &[String],
        names: &[String],
    ) -> Result<(Vec<String>, SessionGraph), GraphError> {
        let undefined: Vec<String> = names
            .iter()
            .filter(|n| !self.entries.contains_key(*n))
            .cloned()
            .collect();
        if !undefined.is_empty() {
            return Err(GraphError::UndefinedSession(undefined));
        }

        let selected: BTreeSet<String> = if select_all {
            self.entries.keys().cloned().collect()
        } else {
            let mut selected: BTreeSet<String> = names.iter().cloned().collect();
            for (name, entry) in &self.entries {
                if groups.iter().any(|g| entry.session.in_group(g)) {
                    selected.insert(name.clone());
                }
            }
            selected
        };

        let descendants = self.all_succs(&selected);
        let queue = self.restrict(&self.all_preds(&descendants));
        Ok((descendants.into_iter().collect(), queue))
    }

    /// Dequeues the first ready session in stable topological order.
    ///
    /// A session is ready when every prerequisite has already been removed
    /// from this queue. Sessions for which `is_running` returns `true` are
    /// skipped but stay queued (they are removed at harvest). Returns
    /// `None` when nothing is ready — the queue may still be non-empty.
    pub fn dequeue<F>(&self, is_running: F) -> Option<(String, Session)>
    where
        F: Fn(&str) -> bool,
    {
        self.topological_order()
            .into_iter()
            .find(|(name, _)| self.entries[*name].deps.is_empty() && !is_running(name))
            .map(|(name, session)| (name.to_string(), session.clone()))
    }

    /// Returns `true` if no other session depends on `name`.
    ///
    /// Leaves need no durable heap unless explicitly requested, since no
    /// later build step consumes their output.
    pub fn is_leaf(&self, name: &str) -> bool {
        !self.entries.values().any(|e| e.deps.contains(name))
    }
}

/// Extracts one parent loop from declarations that can never be inserted.
///
/// Walks parent pointers from the lexicographically first stuck name until
/// a name repeats; the returned path starts and ends with the repeated
/// name, listed in child-to-parent order.
fn parent_loop(stuck: &[&SessionDecl]) -> Vec<String> {
    let by_name: BTreeMap<&str, &SessionDecl> =
        stuck.iter().map(|d| (d.name.as_str(), *d)).collect();
    let Some(mut current) = by_name.values().next().copied() else {
        return Vec::new();
    };
    let mut path: Vec<String> = Vec::new();
    loop {
        if let Some(pos) = path.iter().position(|n| *n == current.name) {
            let mut cycle = path.split_off(pos);
            cycle.push(current.name.clone());
            return cycle;
        }
        path.push(current.name.clone());
        let parent = current.parent.as_deref().unwrap_or_default();
        match by_name.get(parent) {
            Some(next) => current = next,
            // The walk left the stuck set; report what was collected.
            None => return path,
        }
    }
}
