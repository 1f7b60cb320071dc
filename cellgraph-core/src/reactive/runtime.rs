//! Cell Graph Runtime
//!
//! The runtime is the central coordinator that owns the cell table, drives
//! evaluations and publishes status changes.
//!
//! # How It Works
//!
//! 1. `define` registers a cell with its declared dependencies. The cell
//!    starts pending at generation 1 and nothing runs yet.
//!
//! 2. The first `get` (or `await_all`, or a dependent's evaluation) marks the
//!    cell observed and spawns an evaluation for its current generation.
//!
//! 3. An evaluation makes sure every dependency is evaluating, waits until
//!    they are all settled, captures their values in one go and runs the
//!    compute future.
//!
//! 4. The result is written only if the cell is still on the generation the
//!    evaluation started under. Superseded results are dropped.
//!
//! 5. `invalidate` bumps the generation of the cell and every transitive
//!    dependent, marks them pending and restarts the observed ones.
//!
//! # Thread Safety
//!
//! The cell table sits behind a single mutex. It is never held across an
//! `.await` or while user code (compute functions, hooks, observers) runs,
//! so compute functions may freely read the graph.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace, warn};

use super::cell::{Cell, Inputs};
use super::input::Input;
use super::observer::Observer;
use super::options::{CellOptions, ErasedOptions, ErrorHook, ResultHook};
use super::snapshot::{ArcAny, CellSnapshot, Snapshot};
use super::subscriber::CellEvent;
use crate::config::GraphConfig;
use crate::error::{CellError, ComputeError, ConfigError};
use crate::graph::{CellId, CellStatus, Dependencies, Node, UpdateScheduler};
use crate::report::{CellReport, GraphReport};

type ComputeFn = dyn Fn(Inputs) -> BoxFuture<'static, Result<ArcAny, ComputeError>> + Send + Sync;

/// Everything the runtime keeps about a cell besides its graph node.
struct CellSlot {
    value_type: TypeId,
    type_name: &'static str,
    compute: Arc<ComputeFn>,
    options: ErasedOptions,

    /// Last successful value. Kept across invalidations but only readable
    /// while the cell is complete.
    value: Option<ArcAny>,

    /// Failure of the current generation.
    error: Option<CellError>,

    /// Ticks every time the cell settles or is invalidated. Waiters re-check
    /// the status on each tick.
    changes: watch::Sender<u64>,
}

#[derive(Default)]
struct GraphState {
    topology: UpdateScheduler,
    slots: HashMap<CellId, CellSlot>,
}

struct GraphInner {
    config: GraphConfig,
    runtime: Option<Handle>,
    names: DashMap<Arc<str>, CellId>,
    state: Mutex<GraphState>,
    events: broadcast::Sender<CellEvent>,
}

/// Outcome of capturing a cell's inputs.
enum Prepared {
    Run(Arc<ComputeFn>, Inputs),
    Failed(CellError),
    /// A dependency went back to pending before we could read it.
    Retry,
    /// The evaluation's generation was superseded.
    Stale,
}

enum Hook {
    Result(ResultHook, ArcAny),
    Error(ErrorHook, CellError),
}

/// A graph of named asynchronous cells.
///
/// The graph is owned by a store; clones share the same cells. Evaluations
/// run as tasks on the Tokio runtime the graph was created in (or the one
/// passed to [`CellGraph::with_runtime`]).
///
/// # Example
///
/// ```rust,ignore
/// let graph = CellGraph::new(GraphConfig::named("group-comparison"));
///
/// let a = graph.define("cellA", &[], |_| async { Ok(5) }, CellOptions::new())?;
/// let b = graph.define(
///     "cellB",
///     &["cellA"],
///     move |inputs| {
///         let a = inputs.get(&a);
///         async move { Ok(*a? * 2) }
///     },
///     CellOptions::new(),
/// )?;
///
/// assert_eq!(graph.settled(&b).await?.value.as_deref(), Some(&10));
/// ```
#[derive(Clone)]
pub struct CellGraph {
    inner: Arc<GraphInner>,
}

impl CellGraph {
    /// Create an empty graph.
    ///
    /// Evaluations are spawned on the runtime current at the time of the
    /// call that triggers them.
    pub fn new(config: GraphConfig) -> Self {
        Self::build(config, None)
    }

    /// Create an empty graph that always spawns evaluations on `runtime`.
    pub fn with_runtime(config: GraphConfig, runtime: Handle) -> Self {
        Self::build(config, Some(runtime))
    }

    fn build(config: GraphConfig, runtime: Option<Handle>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(GraphInner {
                config,
                runtime,
                names: DashMap::new(),
                state: Mutex::new(GraphState::default()),
                events,
            }),
        }
    }

    /// The graph's configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.inner.config
    }

    /// Register a derived cell.
    ///
    /// `dependencies` are cell names; each must already be defined. The
    /// compute function receives their values once they have all completed.
    pub fn define<T, F, Fut>(
        &self,
        name: &str,
        dependencies: &[&str],
        compute: F,
        options: CellOptions<T>,
    ) -> Result<Cell<T>, ConfigError>
    where
        T: Send + Sync + 'static,
        F: Fn(Inputs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ComputeError>> + Send + 'static,
    {
        let compute: Arc<ComputeFn> = Arc::new(move |inputs: Inputs| {
            let fut = compute(inputs);
            async move { fut.await.map(|value| Arc::new(value) as ArcAny) }.boxed()
        });

        let (id, name) = self.inner.insert::<T>(name, dependencies, compute, options.erase())?;
        Ok(Cell::new(id, name))
    }

    /// Register an input cell holding `initial`.
    pub fn input<T>(&self, name: &str, initial: T) -> Result<Input<T>, ConfigError>
    where
        T: Send + Sync + 'static,
    {
        let current = Arc::new(RwLock::new(Arc::new(initial)));
        let held = Arc::clone(&current);
        let compute: Arc<ComputeFn> = Arc::new(move |_inputs: Inputs| {
            let value: Arc<T> = Arc::clone(&*held.read());
            let value: ArcAny = value;
            async move { Ok::<_, ComputeError>(value) }.boxed()
        });

        let (id, name) = self
            .inner
            .insert::<T>(name, &[], compute, ErasedOptions::default())?;
        Ok(Input::new(Cell::new(id, name), current))
    }

    /// Replace an input's value and invalidate it.
    pub fn set_input<T>(&self, input: &Input<T>, value: T)
    where
        T: Send + Sync + 'static,
    {
        input.replace(value);
        self.inner.invalidate(input.cell().id());
    }

    /// Replace an input's value with `f(current)` and invalidate it.
    pub fn update_input<T, F>(&self, input: &Input<T>, f: F)
    where
        T: Send + Sync + 'static,
        F: FnOnce(&T) -> T,
    {
        let current = input.current();
        let next = f(current.as_ref());
        self.set_input(input, next);
    }

    /// Look up a typed handle by name.
    pub fn cell<T: Send + Sync + 'static>(&self, name: &str) -> Result<Cell<T>, ConfigError> {
        let id = self.resolve(name)?;
        let state = self.inner.state.lock();
        let (node, slot) = state
            .topology
            .get_node(id)
            .zip(state.slots.get(&id))
            .ok_or_else(|| ConfigError::UnknownCell(name.to_string()))?;

        if slot.value_type != TypeId::of::<T>() {
            return Err(ConfigError::TypeMismatch {
                cell: name.to_string(),
                expected: type_name::<T>(),
                actual: slot.type_name,
            });
        }
        Ok(Cell::new(id, node.name().clone()))
    }

    /// Current snapshot of a cell.
    ///
    /// Never blocks. Starts an evaluation if the cell is pending and none is
    /// running for its generation.
    pub fn get(&self, name: &str) -> Result<CellSnapshot, ConfigError> {
        let id = self.resolve(name)?;
        self.inner.start(id, true);
        self.inner
            .snapshot(id)
            .ok_or_else(|| ConfigError::UnknownCell(name.to_string()))
    }

    /// Typed [`get`](Self::get).
    pub fn read<T: Send + Sync + 'static>(&self, cell: &Cell<T>) -> Result<Snapshot<T>, ConfigError> {
        self.inner.start(cell.id(), true);
        self.inner
            .snapshot(cell.id())
            .map(Snapshot::from_erased)
            .ok_or_else(|| ConfigError::UnknownCell(cell.name().to_string()))
    }

    /// Mark a cell and all its transitive dependents pending, and schedule
    /// recomputation of the observed ones.
    pub fn invalidate(&self, name: &str) -> Result<(), ConfigError> {
        let id = self.resolve(name)?;
        self.inner.invalidate(id);
        Ok(())
    }

    /// Wait until every named cell has settled (`Complete` or `Error`).
    ///
    /// Starts evaluations as needed. Unknown names fail before anything runs.
    pub async fn await_all(&self, names: &[&str]) -> Result<Vec<CellSnapshot>, ConfigError> {
        let ids = names
            .iter()
            .map(|name| self.resolve(name))
            .collect::<Result<Vec<_>, _>>()?;

        for id in &ids {
            self.inner.start(*id, true);
        }

        loop {
            for id in &ids {
                self.inner.wait_settled(*id, None).await;
            }

            let snapshots = ids
                .iter()
                .zip(names)
                .map(|(id, name)| {
                    self.inner
                        .snapshot(*id)
                        .ok_or_else(|| ConfigError::UnknownCell(name.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            // An invalidation may have landed while we waited on a later cell.
            if snapshots.iter().all(|s| s.status.is_terminal()) {
                return Ok(snapshots);
            }
        }
    }

    /// Typed wait for a single cell.
    pub async fn settled<T: Send + Sync + 'static>(
        &self,
        cell: &Cell<T>,
    ) -> Result<Snapshot<T>, ConfigError> {
        let mut snapshots = self.await_all(&[cell.name()]).await?;
        snapshots
            .pop()
            .map(Snapshot::from_erased)
            .ok_or_else(|| ConfigError::UnknownCell(cell.name().to_string()))
    }

    /// Combined status of several cells: `Error` if any failed, otherwise
    /// `Pending` if any is still running, otherwise `Complete`.
    pub fn group_status(&self, names: &[&str]) -> Result<CellStatus, ConfigError> {
        let mut combined = CellStatus::Complete;
        for name in names {
            match self.get(name)?.status {
                CellStatus::Error => return Ok(CellStatus::Error),
                CellStatus::Pending => combined = CellStatus::Pending,
                CellStatus::Complete => {}
            }
        }
        Ok(combined)
    }

    /// Subscribe to every status change in the graph.
    pub fn subscribe(&self) -> broadcast::Receiver<CellEvent> {
        self.inner.events.subscribe()
    }

    /// Run `callback` on every status change of the named cells.
    ///
    /// The callback runs on a spawned task until the returned observer is
    /// disposed or dropped.
    pub fn observe<F>(&self, names: &[&str], callback: F) -> Result<Observer, ConfigError>
    where
        F: Fn(&CellEvent) + Send + Sync + 'static,
    {
        let ids = names
            .iter()
            .map(|name| self.resolve(name))
            .collect::<Result<_, _>>()?;
        let runtime = self.inner.runtime_handle().ok_or(ConfigError::NoRuntime)?;
        Ok(Observer::spawn(&runtime, self.subscribe(), ids, callback))
    }

    /// Status of every cell, in definition order.
    pub fn report(&self) -> GraphReport {
        let state = self.inner.state.lock();
        let cells = state
            .topology
            .nodes()
            .filter_map(|node| {
                let slot = state.slots.get(&node.id())?;
                let dependencies = node
                    .dependencies()
                    .iter()
                    .filter_map(|dep| state.topology.get_node(*dep))
                    .map(|dep| dep.name().to_string())
                    .collect();
                Some(CellReport {
                    name: node.name().to_string(),
                    status: node.status(),
                    generation: node.generation(),
                    dependencies,
                    value_type: slot.type_name.to_string(),
                    has_value: slot.value.is_some(),
                    error: slot.error.as_ref().map(ToString::to_string),
                })
            })
            .collect();

        GraphReport {
            graph: self.inner.config.name.clone(),
            cells,
        }
    }

    /// Number of cells defined.
    pub fn len(&self) -> usize {
        self.inner.names.len()
    }

    /// Whether no cells are defined.
    pub fn is_empty(&self) -> bool {
        self.inner.names.is_empty()
    }

    /// Whether a cell with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.names.contains_key(name)
    }

    fn resolve(&self, name: &str) -> Result<CellId, ConfigError> {
        self.inner
            .lookup(name)
            .ok_or_else(|| ConfigError::UnknownCell(name.to_string()))
    }
}

impl Default for CellGraph {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl std::fmt::Debug for CellGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellGraph")
            .field("name", &self.inner.config.name)
            .field("cells", &self.len())
            .finish()
    }
}

impl GraphInner {
    fn lookup(&self, name: &str) -> Option<CellId> {
        self.names.get(name).map(|entry| *entry.value())
    }

    fn runtime_handle(&self) -> Option<Handle> {
        self.runtime.clone().or_else(|| Handle::try_current().ok())
    }

    fn insert<T: 'static>(
        &self,
        name: &str,
        dependencies: &[&str],
        compute: Arc<ComputeFn>,
        options: ErasedOptions,
    ) -> Result<(CellId, Arc<str>), ConfigError> {
        let mut state = self.state.lock();

        if self.names.contains_key(name) {
            return Err(ConfigError::DuplicateCell(name.to_string()));
        }

        let mut ids = Dependencies::new();
        for dep in dependencies {
            if *dep == name {
                return Err(ConfigError::Cycle {
                    cell: name.to_string(),
                    path: vec![name.to_string(), name.to_string()],
                });
            }
            let id = self
                .lookup(dep)
                .ok_or_else(|| ConfigError::UnknownDependency {
                    cell: name.to_string(),
                    dependency: dep.to_string(),
                })?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let node = Node::new(name, ids);
        let cell_name = node.name().clone();
        let id = state.topology.add_node(node)?;

        let (changes, _) = watch::channel(0);
        state.slots.insert(
            id,
            CellSlot {
                value_type: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                compute,
                options,
                value: None,
                error: None,
                changes,
            },
        );
        self.names.insert(cell_name.clone(), id);

        debug!(
            graph = %self.config.name,
            cell = %cell_name,
            dependencies = dependencies.len(),
            "cell defined"
        );
        Ok((id, cell_name))
    }

    fn snapshot(&self, id: CellId) -> Option<CellSnapshot> {
        let state = self.state.lock();
        let node = state.topology.get_node(id)?;
        let slot = state.slots.get(&id)?;
        let status = node.status();

        Some(CellSnapshot {
            name: node.name().clone(),
            status,
            generation: node.generation(),
            value: slot.options.readable(status, slot.value.as_ref()),
            error: match status {
                CellStatus::Error => slot.error.clone(),
                _ => None,
            },
        })
    }

    /// Spawn an evaluation if the cell needs one.
    ///
    /// `observe` marks the cell as read by a consumer. Without it, only cells
    /// that were observed before are started, so never-read cells stay lazy.
    fn start(self: &Arc<Self>, id: CellId, observe: bool) {
        let (runtime, generation) = {
            let mut state = self.state.lock();
            let Some(node) = state.topology.get_node_mut(id) else {
                return;
            };

            if observe {
                node.mark_observed();
            } else if !node.is_observed() {
                return;
            }
            if !node.needs_evaluation() {
                return;
            }

            let Some(runtime) = self.runtime_handle() else {
                warn!(
                    graph = %self.config.name,
                    cell = %node.name(),
                    "no tokio runtime available, cell stays pending"
                );
                return;
            };

            let generation = node.begin_evaluation();
            trace!(graph = %self.config.name, cell = %node.name(), generation, "evaluation started");
            (runtime, generation)
        };

        runtime.spawn(Arc::clone(self).evaluate(id, generation));
    }

    async fn evaluate(self: Arc<Self>, id: CellId, generation: u64) {
        let dependencies = {
            let state = self.state.lock();
            match state.topology.get_node(id) {
                Some(node) => node.dependencies().clone(),
                None => return,
            }
        };

        for dep in &dependencies {
            self.start(*dep, true);
        }

        let prepared = 'wait: loop {
            for dep in &dependencies {
                if !self.wait_settled(*dep, Some((id, generation))).await {
                    break 'wait Prepared::Stale;
                }
            }
            match self.prepare(id, generation, &dependencies) {
                Prepared::Retry => continue,
                prepared => break prepared,
            }
        };

        let result = match prepared {
            Prepared::Run(compute, inputs) => {
                let cell: Arc<str> = Arc::from(inputs.cell());
                let outcome = AssertUnwindSafe(async move { compute(inputs).await })
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(source)) => Err(CellError::Compute { cell, source }),
                    Err(panic) => Err(CellError::Compute {
                        cell,
                        source: ComputeError::new(panic_message(panic.as_ref())),
                    }),
                }
            }
            Prepared::Failed(err) => Err(err),
            Prepared::Retry | Prepared::Stale => {
                trace!(graph = %self.config.name, generation, "evaluation superseded before compute");
                return;
            }
        };

        self.settle(id, generation, result);
    }

    /// Capture the dependency values for one evaluation, under a single lock.
    fn prepare(&self, id: CellId, generation: u64, dependencies: &Dependencies) -> Prepared {
        let state = self.state.lock();
        let (Some(node), Some(slot)) = (state.topology.get_node(id), state.slots.get(&id)) else {
            return Prepared::Stale;
        };
        if !node.is_current(generation) {
            return Prepared::Stale;
        }

        let mut values = SmallVec::new();
        for dep in dependencies {
            let (Some(dep_node), Some(dep_slot)) =
                (state.topology.get_node(*dep), state.slots.get(dep))
            else {
                return Prepared::Stale;
            };

            match (dep_node.status(), &dep_slot.value) {
                (CellStatus::Complete, Some(value)) => {
                    values.push((dep_node.name().clone(), Arc::clone(value)));
                }
                (CellStatus::Error, _) => {
                    let cause = dep_slot.error.clone().unwrap_or_else(|| CellError::Compute {
                        cell: dep_node.name().clone(),
                        source: ComputeError::new("failed without recording an error"),
                    });
                    return Prepared::Failed(CellError::Upstream {
                        cell: node.name().clone(),
                        upstream: dep_node.name().clone(),
                        cause: Box::new(cause),
                    });
                }
                _ => return Prepared::Retry,
            }
        }

        Prepared::Run(
            Arc::clone(&slot.compute),
            Inputs::new(node.name().clone(), values),
        )
    }

    /// Record an evaluation's outcome if its generation is still current.
    fn settle(self: &Arc<Self>, id: CellId, generation: u64, result: Result<ArcAny, CellError>) {
        let (event, hook, dependents) = {
            let mut state = self.state.lock();
            let GraphState { topology, slots } = &mut *state;
            let (Some(node), Some(slot)) = (topology.get_node_mut(id), slots.get_mut(&id)) else {
                return;
            };

            if !node.is_current(generation) {
                trace!(
                    graph = %self.config.name,
                    cell = %node.name(),
                    generation,
                    current = node.generation(),
                    "dropping superseded result"
                );
                return;
            }

            let (status, hook) = match result {
                Ok(value) => {
                    slot.value = Some(Arc::clone(&value));
                    slot.error = None;
                    let hook = slot.options.on_result.clone().map(|h| Hook::Result(h, value));
                    (CellStatus::Complete, hook)
                }
                Err(err) => {
                    slot.error = Some(err.clone());
                    let hook = slot.options.on_error.clone().map(|h| Hook::Error(h, err));
                    (CellStatus::Error, hook)
                }
            };

            node.settle(status);
            slot.changes.send_modify(|ticks| *ticks += 1);

            let event = CellEvent {
                id,
                cell: node.name().clone(),
                status,
                generation,
            };
            let dependents: Vec<CellId> = node.dependents().iter().copied().collect();
            (event, hook, dependents)
        };

        match &event.status {
            CellStatus::Error => debug!(
                graph = %self.config.name,
                cell = %event.cell,
                generation,
                "cell failed"
            ),
            _ => debug!(graph = %self.config.name, cell = %event.cell, generation, "cell complete"),
        }

        let outcome = match hook {
            Some(Hook::Result(hook, value)) => catch_unwind(AssertUnwindSafe(|| hook(&value))),
            Some(Hook::Error(hook, err)) => catch_unwind(AssertUnwindSafe(|| hook(&err))),
            None => Ok(()),
        };
        if let Err(panic) = outcome {
            warn!(
                graph = %self.config.name,
                cell = %event.cell,
                generation,
                reason = %panic_message(panic.as_ref()),
                "cell hook panicked"
            );
        }

        self.publish(event);

        for dependent in dependents {
            self.start(dependent, false);
        }
    }

    fn invalidate(self: &Arc<Self>, id: CellId) {
        let (events, refresh) = {
            let mut state = self.state.lock();
            let order = state.topology.invalidation_order(id);
            let GraphState { topology, slots } = &mut *state;

            let mut events = Vec::with_capacity(order.len());
            let mut refresh = Vec::new();
            for cell in order {
                let Some(node) = topology.get_node_mut(cell) else {
                    continue;
                };
                let generation = node.invalidate();
                if let Some(slot) = slots.get(&cell) {
                    slot.changes.send_modify(|ticks| *ticks += 1);
                }
                events.push(CellEvent {
                    id: cell,
                    cell: node.name().clone(),
                    status: CellStatus::Pending,
                    generation,
                });
                if node.is_observed() {
                    refresh.push(cell);
                }
            }
            (events, refresh)
        };

        if let Some(first) = events.first() {
            debug!(
                graph = %self.config.name,
                cell = %first.cell,
                generation = first.generation,
                affected = events.len(),
                "cell invalidated"
            );
        }

        for event in events {
            self.publish(event);
        }

        if self.config.eager_refresh {
            for cell in refresh {
                self.start(cell, false);
            }
        }
    }

    /// Wait until the cell's current generation has settled.
    ///
    /// The cell is (re)started on every wake-up, so an invalidation landing
    /// mid-wait is recomputed even when refresh is lazy. With an `owner`
    /// evaluation, gives up and returns `false` as soon as that evaluation's
    /// generation is superseded.
    async fn wait_settled(self: &Arc<Self>, id: CellId, owner: Option<(CellId, u64)>) -> bool {
        let (mut ticks, mut owner_ticks) = {
            let state = self.state.lock();
            let Some(slot) = state.slots.get(&id) else {
                return true;
            };
            let owner_ticks = owner
                .and_then(|(owner, _)| state.slots.get(&owner))
                .map(|slot| slot.changes.subscribe());
            (slot.changes.subscribe(), owner_ticks)
        };

        loop {
            if let Some((owner, generation)) = owner {
                let state = self.state.lock();
                let current = state
                    .topology
                    .get_node(owner)
                    .map_or(false, |node| node.is_current(generation));
                if !current {
                    return false;
                }
            }

            // No-op while an evaluation is in flight or the cell is settled.
            self.start(id, true);

            let terminal = {
                let state = self.state.lock();
                state
                    .topology
                    .get_node(id)
                    .map_or(true, |node| node.status().is_terminal())
            };
            if terminal {
                return true;
            }

            let changed = match owner_ticks.as_mut() {
                Some(owner_ticks) => tokio::select! {
                    changed = ticks.changed() => changed,
                    changed = owner_ticks.changed() => changed,
                },
                None => ticks.changed().await,
            };
            if changed.is_err() {
                return true;
            }
        }
    }

    fn publish(&self, event: CellEvent) {
        // No receivers is fine; nobody is rendering this graph.
        let _ = self.events.send(event);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("compute panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("compute panicked: {message}")
    } else {
        "compute panicked".to_string()
    }
}
