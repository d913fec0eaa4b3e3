//! Generic dedup/fan-out task runner.
//!
//! A [`FileLoaderWorker`] drives any graph of [`LoaderTask`]s keyed by file
//! name. Each unique file name is loaded at most once; every rediscovery of a
//! file re-evaluates its depth and external-library status and, when either
//! improved, resubmits the file's sub-tasks so the improvement reaches them.
//!
//! Work is fire-and-forget on a `rayon::Scope`. The scope is the barrier:
//! `run_and_wait` returns only after every job, including jobs spawned by
//! jobs, has finished.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::FxHashSet;
use tsz_common::ResolvedPath;

// =============================================================================
// Task contract
// =============================================================================

/// Flags of the reference that discovered a task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskEdge {
    /// Crossing this edge adds one to the depth.
    pub increase_depth: bool,
    /// Skip the task when the depth after this edge exceeds the maximum.
    pub elide_on_depth: bool,
    /// The edge leads into a dependency package.
    pub from_external_library: bool,
    /// Caller-supplied entry point. A file named by a root slot is never
    /// promoted to external, whichever edge reaches it.
    pub root: bool,
}

/// A unit of work in a file graph.
pub trait LoaderTask: Send + Sync + Sized + 'static {
    /// Shared context handed to every load.
    type Loader: Sync;

    /// Identity used for dedup.
    fn file_name(&self) -> &str;

    /// Canonical path, known once the task is loaded.
    fn path(&self) -> Option<&ResolvedPath>;

    fn is_loaded(&self) -> bool;

    /// Do the task's work and record its sub-tasks. Called at most once per
    /// authoritative instance, under the runner's per-file lock. Extra work
    /// may be spawned on `scope`; it is joined by the same barrier.
    fn load<'scope>(&self, loader: &'scope Self::Loader, scope: &rayon::Scope<'scope>);

    fn sub_tasks(&self) -> &SubTasks<Self>;

    /// Flags of the reference this instance was built for.
    fn edge(&self) -> TaskEdge {
        TaskEdge::default()
    }

    fn is_from_external_library(&self) -> bool {
        false
    }

    /// Record that some discovery reached this task through an external edge.
    fn mark_from_external_library(&self) {}
}

/// One slot in a task list: the task and the edge that placed it there.
///
/// When the slot's instance loses the dedup race the runner swaps in the
/// authoritative task but keeps the edge.
pub struct TaskRef<T> {
    pub task: Arc<T>,
    pub edge: TaskEdge,
}

impl<T: LoaderTask> TaskRef<T> {
    #[must_use]
    pub fn new(task: T) -> Self {
        let edge = task.edge();
        Self {
            task: Arc::new(task),
            edge,
        }
    }
}

impl<T> Clone for TaskRef<T> {
    fn clone(&self) -> Self {
        Self {
            task: Arc::clone(&self.task),
            edge: self.edge,
        }
    }
}

impl<T> std::fmt::Debug for TaskRef<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRef")
            .field("task", &self.task)
            .field("edge", &self.edge)
            .finish()
    }
}

/// A task's discovered sub-tasks.
pub struct SubTasks<T>(Mutex<Vec<TaskRef<T>>>);

impl<T> Default for SubTasks<T> {
    fn default() -> Self {
        Self(Mutex::new(Vec::new()))
    }
}

impl<T> std::fmt::Debug for SubTasks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SubTasks").field(&self.len()).finish()
    }
}

impl<T> SubTasks<T> {
    pub fn lock(&self) -> MutexGuard<'_, Vec<TaskRef<T>>> {
        self.0.lock().expect("sub-task lock poisoned")
    }

    pub fn set(&self, tasks: Vec<TaskRef<T>>) {
        *self.lock() = tasks;
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<TaskRef<T>> {
        self.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Work group
// =============================================================================

/// Thread pool the runner spawns on.
pub struct WorkGroup {
    pool: Option<rayon::ThreadPool>,
}

impl WorkGroup {
    /// `single_threaded` runs everything on one dedicated worker thread;
    /// otherwise the global rayon pool is used.
    pub fn new(single_threaded: bool) -> Result<Self> {
        let pool = if single_threaded {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(1)
                .thread_name(|_| "tsz-loader".to_string())
                .build()
                .context("failed to build single-threaded loader pool")?;
            Some(pool)
        } else {
            None
        };
        Ok(Self { pool })
    }

    #[must_use]
    pub fn is_single_threaded(&self) -> bool {
        self.pool.is_some()
    }

    /// Run `op` in a scope and block until all work spawned in it is done.
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&rayon::Scope<'scope>) -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.scope(op),
            None => rayon::scope(op),
        }
    }
}

// =============================================================================
// Runner
// =============================================================================

#[derive(Debug)]
struct QueuedState {
    lowest_depth: usize,
    from_external_library: bool,
    /// Some slot naming this file is a caller-supplied root.
    root: bool,
}

/// The authoritative instance for a file name plus the state reconciled
/// across all of its discoveries.
struct QueuedTask<T> {
    task: Arc<T>,
    state: Mutex<QueuedState>,
}

impl<T> QueuedTask<T> {
    fn new(task: Arc<T>, root: bool) -> Self {
        Self {
            task,
            state: Mutex::new(QueuedState {
                lowest_depth: usize::MAX,
                from_external_library: false,
                root,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, QueuedState> {
        self.state.lock().expect("queued task lock poisoned")
    }
}

pub struct FileLoaderWorker<T> {
    tasks_by_file_name: DashMap<String, Arc<QueuedTask<T>>>,
    max_depth: usize,
}

impl<T: LoaderTask> FileLoaderWorker<T> {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            tasks_by_file_name: DashMap::new(),
            max_depth,
        }
    }

    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of distinct file names seen so far.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks_by_file_name.len()
    }

    /// Lowest depth the file has been reached at, if it was discovered.
    #[must_use]
    pub fn lowest_depth(&self, file_name: &str) -> Option<usize> {
        self.tasks_by_file_name
            .get(file_name)
            .map(|queued| queued.state().lowest_depth)
    }

    /// Schedule `tasks` and everything they discover, then block until the
    /// graph is quiescent. Slots in `tasks` are rewritten to the
    /// authoritative instances.
    pub fn run_and_wait(&self, loader: &T::Loader, group: &WorkGroup, tasks: &mut [TaskRef<T>]) {
        group.scope(|scope| self.start(scope, loader, tasks, 0, false));
        tracing::debug!(tasks = self.task_count(), "file loader worker quiescent");
    }

    fn start<'scope>(
        &'scope self,
        scope: &rayon::Scope<'scope>,
        loader: &'scope T::Loader,
        tasks: &mut [TaskRef<T>],
        depth: usize,
        from_external_library: bool,
    ) {
        // Register every slot before spawning any of them, so a root is
        // known as a root before a sibling's descendants can reach it.
        let mut discovered = Vec::with_capacity(tasks.len());
        for slot in tasks.iter_mut() {
            let mut is_external = from_external_library || slot.edge.from_external_library;
            let queued = match self
                .tasks_by_file_name
                .entry(slot.task.file_name().to_string())
            {
                Entry::Occupied(entry) => {
                    let queued = Arc::clone(entry.get());
                    drop(entry);
                    if !Arc::ptr_eq(&slot.task, &queued.task) {
                        slot.task = Arc::clone(&queued.task);
                    }
                    if slot.edge.root {
                        queued.state().root = true;
                    }
                    is_external |= queued.task.is_from_external_library();
                    queued
                }
                Entry::Vacant(entry) => {
                    let queued =
                        Arc::new(QueuedTask::new(Arc::clone(&slot.task), slot.edge.root));
                    entry.insert(Arc::clone(&queued));
                    queued
                }
            };
            discovered.push((queued, slot.edge, is_external));
        }

        for (queued, edge, is_external) in discovered {
            scope.spawn(move |scope| self.evaluate(scope, loader, &queued, edge, depth, is_external));
        }
    }

    /// Reconcile one discovery of `queued` reached through `edge`.
    fn evaluate<'scope>(
        &'scope self,
        scope: &rayon::Scope<'scope>,
        loader: &'scope T::Loader,
        queued: &QueuedTask<T>,
        edge: TaskEdge,
        depth: usize,
        is_external: bool,
    ) {
        let mut state = queued.state();
        let task = &queued.task;
        let mut start_sub_tasks = false;

        let current_depth = if edge.increase_depth {
            depth.saturating_add(1)
        } else {
            depth
        };
        if current_depth < state.lowest_depth {
            state.lowest_depth = current_depth;
            start_sub_tasks = true;
        }

        if !state.root && is_external && !state.from_external_library {
            state.from_external_library = true;
            start_sub_tasks = true;
        }

        if edge.elide_on_depth && current_depth > self.max_depth {
            tracing::trace!(
                file = task.file_name(),
                depth = current_depth,
                max_depth = self.max_depth,
                "elided on depth"
            );
            return;
        }

        if !task.is_loaded() {
            tracing::debug!(file = task.file_name(), depth = current_depth, "loading");
            task.load(loader, scope);
            // A task first reached on an elided edge already lowered the
            // depth without loading; its sub-tasks still need starting.
            start_sub_tasks = true;
        } else if start_sub_tasks {
            tracing::trace!(
                file = task.file_name(),
                depth = state.lowest_depth,
                external = state.from_external_library,
                "re-propagating to sub-tasks"
            );
        }

        if start_sub_tasks {
            let mut sub_tasks = task.sub_tasks().lock();
            self.start(
                scope,
                loader,
                &mut sub_tasks,
                state.lowest_depth,
                state.from_external_library,
            );
        }
    }

    // =========================================================================
    // Collection
    // =========================================================================

    /// Flatten the finished graph reachable from `tasks`.
    ///
    /// Tasks reached through an external edge are marked first. Then each
    /// loaded task is visited once: its sub-tasks, then `iterate`, then its
    /// path is appended. Dependencies therefore precede their dependents.
    pub fn collect(
        &self,
        tasks: &[TaskRef<T>],
        mut iterate: impl FnMut(&Arc<T>),
    ) -> Vec<ResolvedPath> {
        for entry in &self.tasks_by_file_name {
            if entry.value().state().from_external_library {
                entry.value().task.mark_from_external_library();
            }
        }

        let mut results = Vec::new();
        let mut seen = FxHashSet::default();
        Self::collect_worker(tasks, &mut iterate, &mut seen, &mut results);
        results
    }

    fn collect_worker(
        tasks: &[TaskRef<T>],
        iterate: &mut impl FnMut(&Arc<T>),
        seen: &mut FxHashSet<*const T>,
        results: &mut Vec<ResolvedPath>,
    ) {
        for slot in tasks {
            let task = &slot.task;
            if !task.is_loaded() || !seen.insert(Arc::as_ptr(task)) {
                continue;
            }
            let sub_tasks = task.sub_tasks().snapshot();
            if !sub_tasks.is_empty() {
                Self::collect_worker(&sub_tasks, iterate, seen, results);
            }
            iterate(task);
            if let Some(path) = task.path() {
                results.push(path.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/worker.rs"]
mod tests;
