//! Object mapper: a change-tracked session between one object graph and one
//! transaction manager.
//!
//! The mapper keeps the object/node map, the set of objects modified since
//! the last commit and the nodes of objects destroyed since then. Graph
//! events are drained from the [`ObjectGraph`] on every entry point, so the
//! host never calls the observer hooks by hand unless it wants to.
//!
//! ```text
//! user edit ──► GraphEvent ──► object_modified / object_destroyed
//!                                          │
//! commit() ──► GraphStorer + GraphRemover inside one transaction
//!                                          │
//! other transaction commits ──► CommitNotice ──► process_external() ──► reload
//! ```

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tether_object::{GraphEvent, Handle, ObjectError, ObjectGraph, TypeRegistry, Variant};
use tether_store::TripleStore;
use tether_txn::{CommitNotice, TransactionId, TransactionManager};
use tether_types::vocab::rdf;
use tether_types::{Node, Triple};
use tracing::{debug, info, warn};

use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::loader::GraphLoader;
use crate::map::{NodeMap, ObjectNodeMap};
use crate::remover::GraphRemover;
use crate::storer::{identity_property, GraphStorer};

/// Outcome of one [`ObjectMapper::commit`], also sent to
/// [`subscribe_committed`](ObjectMapper::subscribe_committed) receivers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// `None` when there was nothing to commit.
    pub transaction: Option<TransactionId>,
    /// Objects written, including those reached by following.
    pub stored: usize,
    /// Triples deleted for destroyed objects.
    pub removed: usize,
    pub additions: usize,
    pub removals: usize,
}

/// Change-tracked mapping session.
pub struct ObjectMapper {
    manager: Arc<TransactionManager>,
    registry: Arc<TypeRegistry>,
    config: MapperConfig,
    map: ObjectNodeMap,
    changed: BTreeSet<Handle>,
    destroyed: BTreeSet<Node>,
    /// The transaction being committed; its own notice is dropped.
    in_commit: Option<TransactionId>,
    in_reload: bool,
    notices: Receiver<CommitNotice>,
    external: Vec<CommitNotice>,
    committed: Vec<Sender<CommitSummary>>,
}

impl ObjectMapper {
    pub fn new(
        manager: Arc<TransactionManager>,
        registry: Arc<TypeRegistry>,
        config: MapperConfig,
    ) -> Self {
        let notices = manager.subscribe();
        Self {
            manager,
            registry,
            config,
            map: ObjectNodeMap::new(),
            changed: BTreeSet::new(),
            destroyed: BTreeSet::new(),
            in_commit: None,
            in_reload: false,
            notices,
            external: Vec::new(),
            committed: Vec::new(),
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<TransactionManager> {
        &self.manager
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn map(&self) -> &ObjectNodeMap {
        &self.map
    }

    pub fn node_of(&self, object: Handle) -> Option<&Node> {
        self.map.node(object)
    }

    pub fn object_at(&self, node: &Node) -> Option<Handle> {
        self.map.object(&self.manager.expand_node(node))
    }

    pub fn is_managed(&self, object: Handle) -> bool {
        self.map.node(object).is_some()
    }

    /// Objects waiting to be stored by the next commit.
    pub fn pending_changes(&self) -> &BTreeSet<Handle> {
        &self.changed
    }

    /// Nodes waiting to be removed by the next commit.
    pub fn pending_removals(&self) -> &BTreeSet<Node> {
        &self.destroyed
    }

    /// Receive a [`CommitSummary`] after every successful commit.
    pub fn subscribe_committed(&mut self) -> Receiver<CommitSummary> {
        let (tx, rx) = mpsc::channel();
        self.committed.push(tx);
        rx
    }

    // -----------------------------------------------------------------------
    // Tracking
    // -----------------------------------------------------------------------

    /// Track an object that already carries its persisted Uri.
    ///
    /// Fails with [`MapperError::MissingIdentity`] when the object's type has
    /// no identity property or the property holds no Uri.
    pub fn manage(&mut self, graph: &mut ObjectGraph, object: Handle) -> MapperResult<()> {
        let type_name = graph
            .get(object)
            .ok_or(ObjectError::DeadHandle(object))?
            .type_name()
            .to_string();
        let desc = self.registry.descriptor(&type_name)?;
        let uri = match identity_property(desc, &self.config.vocabulary)
            .and_then(|name| graph.property(object, name))
        {
            Some(Variant::Uri(uri)) => uri.clone(),
            _ => return Err(MapperError::MissingIdentity(object)),
        };
        let node = self.manager.expand_node(&Node::uri(uri));
        self.map.insert(object, node.clone())?;
        graph.observe(object)?;
        debug!(object = %object, node = %node, "managing object");
        Ok(())
    }

    pub fn manage_all(&mut self, graph: &mut ObjectGraph, objects: &[Handle]) -> MapperResult<()> {
        for &object in objects {
            self.manage(graph, object)?;
        }
        Ok(())
    }

    /// Track an object, queueing it for the next commit unless the store
    /// already holds it.
    pub fn add(&mut self, graph: &mut ObjectGraph, object: Handle) -> MapperResult<()> {
        match self.manage(graph, object) {
            Ok(()) => {
                let stored = match self.map.node(object) {
                    Some(node) => self.manager.contains(&Triple::new(
                        node.clone(),
                        Node::uri(rdf::TYPE),
                        Node::Nothing,
                    ))?,
                    None => false,
                };
                if !stored {
                    self.changed.insert(object);
                }
                Ok(())
            }
            Err(MapperError::MissingIdentity(_)) => {
                graph.observe(object)?;
                self.changed.insert(object);
                debug!(object = %object, "queued anonymous object");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn add_all(&mut self, graph: &mut ObjectGraph, objects: &[Handle]) -> MapperResult<()> {
        for &object in objects {
            self.add(graph, object)?;
        }
        Ok(())
    }

    /// Stop tracking an object. The store is left alone.
    pub fn unmanage(&mut self, graph: &mut ObjectGraph, object: Handle) {
        if graph.contains(object) {
            if let Err(e) = graph.unobserve(object) {
                warn!(object = %object, error = %e, "failed to unobserve object");
            }
        }
        self.map.remove_object(object);
        self.changed.remove(&object);
    }

    /// Mark an object as modified. Ignored while the mapper applies a reload.
    pub fn object_modified(&mut self, object: Handle) {
        if self.in_reload {
            return;
        }
        self.changed.insert(object);
    }

    /// Forget a destroyed object and queue its node for removal. Ignored
    /// while the mapper applies a reload.
    pub fn object_destroyed(&mut self, object: Handle) {
        if self.in_reload {
            return;
        }
        self.changed.remove(&object);
        if let Some(node) = self.map.remove_object(object) {
            debug!(object = %object, node = %node, "queued node for removal");
            self.destroyed.insert(node);
        }
    }

    /// Dispatch the graph's pending events to the observer hooks.
    pub fn pump_events(&mut self, graph: &mut ObjectGraph) {
        for event in graph.drain_events() {
            match event {
                GraphEvent::Modified(object) => self.object_modified(object),
                GraphEvent::Destroyed(object) => self.object_destroyed(object),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    /// Store every changed object and remove every destroyed node in one
    /// transaction.
    ///
    /// Objects the storer rejects stay pending and are retried by the next
    /// commit; the rest are committed. A store or removal error rolls the
    /// transaction back and keeps the pending sets.
    pub fn commit(&mut self, graph: &mut ObjectGraph) -> MapperResult<CommitSummary> {
        self.pump_events(graph);
        self.changed.retain(|o| graph.contains(*o));
        if self.changed.is_empty() && self.destroyed.is_empty() {
            return Ok(CommitSummary::default());
        }
        self.commit_pending(graph)
    }

    fn commit_pending(&mut self, graph: &mut ObjectGraph) -> MapperResult<CommitSummary> {
        let manager = Arc::clone(&self.manager);
        let mut txn = manager.start_transaction()?;
        let objects: Vec<Handle> = self.changed.iter().copied().collect();
        let mut nodes = self.map.nodes().clone();

        let written = write_pending(
            &txn,
            &self.registry,
            &self.config,
            graph,
            &objects,
            &self.destroyed,
            &mut nodes,
        );
        let (stored, failed, removed) = match written {
            Ok(counts) => counts,
            Err(e) => {
                warn!(transaction = %txn.id(), error = %e, "commit failed, rolling back");
                if let Err(rollback) = txn.rollback() {
                    warn!(error = %rollback, "rollback failed");
                }
                return Err(e);
            }
        };

        let id = txn.id();
        self.in_commit = Some(id);
        let committed = txn.commit();
        drop(txn);
        self.drain_notices();
        self.in_commit = None;
        let changes = committed?;

        self.map.absorb_nodes(nodes)?;
        let mapped: Vec<Handle> = self.map.nodes().keys().copied().collect();
        for object in mapped {
            if graph.contains(object) {
                graph.observe(object)?;
            }
        }
        if !failed.is_empty() {
            warn!(
                transaction = %id,
                failed = failed.len(),
                "objects left pending after failing to store"
            );
        }
        self.changed = failed;
        self.destroyed.clear();

        let summary = CommitSummary {
            transaction: Some(id),
            stored,
            removed,
            additions: changes.additions(),
            removals: changes.removals(),
        };
        info!(
            transaction = %id,
            stored,
            removed,
            additions = summary.additions,
            removals = summary.removals,
            "mapper committed"
        );
        self.committed
            .retain(|tx| tx.send(summary.clone()).is_ok());
        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // Loading and external changes
    // -----------------------------------------------------------------------

    /// Load the object at `node` and track everything the pass constructed.
    pub fn load(
        &mut self,
        graph: &mut ObjectGraph,
        node: &Node,
        hint: Option<&str>,
    ) -> MapperResult<Handle> {
        self.pump_events(graph);
        let registry = Arc::clone(&self.registry);
        let mut objects = self.map.objects().clone();
        let mut loader = GraphLoader::new(
            self.manager.as_ref(),
            &registry,
            &self.config.vocabulary,
            self.config.load,
        );
        let object = loader.load(graph, node, hint, &mut objects)?;
        let loaded = loader.loaded().to_vec();
        self.track_loaded(graph, objects, &loaded)?;
        Ok(object)
    }

    /// Load every typed node in the store, skipping nodes that fail.
    pub fn load_all(&mut self, graph: &mut ObjectGraph) -> MapperResult<Vec<Handle>> {
        self.pump_events(graph);
        let registry = Arc::clone(&self.registry);
        let mut objects = self.map.objects().clone();
        let mut loader = GraphLoader::new(
            self.manager.as_ref(),
            &registry,
            &self.config.vocabulary,
            self.config.load,
        );
        let roots = loader.load_all(graph, &mut objects)?;
        let loaded = loader.loaded().to_vec();
        self.track_loaded(graph, objects, &loaded)?;
        Ok(roots)
    }

    fn track_loaded(
        &mut self,
        graph: &mut ObjectGraph,
        objects: crate::map::ObjectMap,
        loaded: &[Handle],
    ) -> MapperResult<()> {
        self.map.absorb_objects(objects)?;
        for &object in loaded {
            if graph.contains(object) {
                graph.observe(object)?;
            }
        }
        Ok(())
    }

    /// Move waiting commit notices into the external queue, dropping the
    /// notice of the transaction being committed.
    fn drain_notices(&mut self) {
        for notice in self.notices.try_iter() {
            if notice.transaction.is_some() && notice.transaction == self.in_commit {
                continue;
            }
            self.external.push(notice);
        }
    }

    /// Apply changes committed by other transactions.
    ///
    /// Every mapped node that appears as the subject of a changed triple is
    /// reloaded from committed state. Notices of this mapper's own commits
    /// are skipped. Returns the number of objects refreshed.
    pub fn process_external(&mut self, graph: &mut ObjectGraph) -> MapperResult<usize> {
        self.pump_events(graph);
        self.drain_notices();
        let mut subjects = BTreeSet::new();
        for notice in std::mem::take(&mut self.external) {
            subjects.extend(notice.changes.subjects());
        }
        subjects.retain(|node| self.map.object(node).is_some());
        if subjects.is_empty() {
            return Ok(0);
        }

        self.in_reload = true;
        let result = self.reload(graph, subjects.into_iter().collect());
        self.pump_events(graph);
        self.in_reload = false;
        self.changed.retain(|o| graph.contains(*o));
        result
    }

    fn reload(&mut self, graph: &mut ObjectGraph, nodes: Vec<Node>) -> MapperResult<usize> {
        let registry = Arc::clone(&self.registry);
        let mut objects = self.map.objects().clone();
        let mut loader = GraphLoader::new(
            self.manager.as_ref(),
            &registry,
            &self.config.vocabulary,
            self.config.load,
        );
        let refreshed = loader.reload(graph, &nodes, &mut objects)?;
        let loaded = loader.loaded().to_vec();
        self.track_loaded(graph, objects, &loaded)?;
        info!(nodes = nodes.len(), refreshed = refreshed.len(), "reloaded external changes");
        Ok(refreshed.len())
    }
}

fn write_pending(
    store: &dyn TripleStore,
    registry: &TypeRegistry,
    config: &MapperConfig,
    graph: &mut ObjectGraph,
    objects: &[Handle],
    destroyed: &BTreeSet<Node>,
    nodes: &mut NodeMap,
) -> MapperResult<(usize, BTreeSet<Handle>, usize)> {
    let mut storer = GraphStorer::new(store, registry, &config.vocabulary, config.store);
    let stored: BTreeSet<Handle> = storer.store_all(graph, objects, nodes).into_iter().collect();
    let failed = objects
        .iter()
        .filter(|o| !stored.contains(*o))
        .copied()
        .collect();
    let mut remover = GraphRemover::new(store);
    for node in destroyed {
        remover.remove(node)?;
    }
    Ok((storer.stored().len(), failed, remover.removed()))
}

impl std::fmt::Debug for ObjectMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectMapper")
            .field("mapped", &self.map.len())
            .field("changed", &self.changed.len())
            .field("destroyed", &self.destroyed.len())
            .finish()
    }
}
