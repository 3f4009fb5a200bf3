//! The policy boundary: hot-reloadable behaviour modules.
//!
//! A *policy* supplies everything about the window manager that a user
//! might want to change without recompiling the host: keybindings, window
//! and monitor rules, the layout list, and input-device preferences. It
//! is built as a separate artifact (a `cdylib` exporting one well-known
//! entry symbol, see [`loader`]) and can be loaded, unloaded and reloaded
//! while the host keeps servicing events.
//!
//! The host never holds pointers into a policy across a reload. All
//! access goes through [`ActivePolicy`], which has exactly two states:
//! `Vacant` (every query returns empty, every binding table is blank) and
//! `Loaded`. A reload is an atomic swap of this one owned value; a failed
//! load leaves the previous state untouched.
//!
//! Policies may spawn worker threads through the [`WorkerSet`] handed to
//! their `init`. Those workers observe host state only through the
//! [`HostHandle`] snapshot accessors and route mutations back through its
//! request channel. [`ActivePolicy::unload`] joins every worker before
//! the module's `teardown` completes, so no policy code ever runs against
//! a discarded table.

pub mod loader;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{info, warn};

use crate::bindings::{Action, Keybind, Mousebind};
use crate::config::rules::{MonitorRule, WindowRule};
use crate::config::InputPrefs;
use crate::core::tags::TagMask;
use crate::layouts::Layout;

/// The capability table a policy exposes to the host.
///
/// A module must fully populate its table before `init` returns; the
/// host reads it freely afterwards and stops before `teardown` begins.
/// The table is owned by the module and discarded wholesale with it.
#[derive(custom_debug_derive::Debug, Default)]
pub struct PolicyTable {
    /// The policy's keybindings.
    pub keybinds: Vec<Keybind>,
    /// The policy's mouse bindings.
    pub mousebinds: Vec<Mousebind>,
    /// Window placement rules, applied at map time.
    pub rules: Vec<WindowRule>,
    /// Output setup rules, applied at connect time.
    pub monitor_rules: Vec<MonitorRule>,
    /// The layout list; monitors select into it by index.
    #[debug(skip)]
    pub layouts: Vec<Box<dyn Layout>>,
    /// Input-device preferences.
    pub input: InputPrefs,
}

/// The interface a loaded policy module implements.
///
/// This is the capability surface of the reload boundary: the host calls
/// `init` exactly once after loading, reads `table` between `init` and
/// `teardown`, and calls `teardown` exactly once before the module is
/// discarded. Failures must be returned, never thrown across the
/// boundary.
pub trait PolicyModule: Send {
    /// Populates the policy table and optionally spawns workers.
    fn init(&mut self, host: &HostHandle, workers: &mut WorkerSet) -> Result<(), PolicyError>;

    /// Releases anything the module holds besides its table. Called
    /// after every worker has been joined.
    fn teardown(&mut self);

    /// The module's capability table.
    fn table(&self) -> &PolicyTable;
}

/// An error raised loading or initialising a policy.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The artifact does not exist.
    #[error("policy artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    /// The artifact exists but could not be opened as a library.
    #[error("policy artifact unreadable: {0}")]
    ArtifactUnreadable(String),

    /// The artifact does not export the entry symbol.
    #[error("policy entry symbol `{0}` missing")]
    EntrySymbolMissing(String),

    /// The module's `init` reported failure.
    #[error("policy init failed: {0}")]
    InitFailed(String),

    /// A reload was requested with no artifact-backed policy active.
    #[error("no policy artifact to reload")]
    NothingLoaded,

    /// A worker thread could not be spawned.
    #[error("could not spawn policy worker: {0}")]
    WorkerSpawn(String),
}

impl From<io::Error> for PolicyError {
    fn from(e: io::Error) -> Self {
        PolicyError::WorkerSpawn(e.to_string())
    }
}

/// A shutdown flag observed by policy workers.
#[derive(Debug, Clone)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Whether the worker has been asked to stop. Workers must poll this
    /// and return promptly once it is raised.
    pub fn raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The worker threads owned by a loaded policy.
///
/// Joining is collective: raising the stop flag and joining every thread
/// is what makes unload safe, so workers must exit once their flag is
/// raised.
#[derive(custom_debug_derive::Debug, Default)]
pub struct WorkerSet {
    stop: Arc<AtomicBool>,
    #[debug(skip)]
    handles: Vec<JoinHandle<()>>,
}

impl WorkerSet {
    /// Creates an empty worker set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live workers.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Tests whether the set holds no workers.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Spawns a named worker thread owned by this set.
    pub fn spawn<F>(&mut self, name: &str, f: F) -> Result<(), PolicyError>
    where
        F: FnOnce(StopFlag) + Send + 'static,
    {
        let flag = StopFlag(self.stop.clone());
        let handle = thread::Builder::new()
            .name(format!("policy-{name}"))
            .spawn(move || f(flag))?;
        self.handles.push(handle);
        Ok(())
    }

    /// Raises the stop flag and joins every worker, blocking until all
    /// of them have observably stopped.
    pub fn join_all(&mut self) {
        self.stop.store(true, Ordering::Release);
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("<unnamed>").to_owned();
            if handle.join().is_err() {
                warn!(worker = %name, "policy worker panicked before join");
            }
        }
    }
}

/// A request routed from a policy worker (or the bar) back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    /// Carry out an action on the main thread.
    Dispatch(Action),
    /// Republish status snapshots.
    RefreshStatus,
}

/// A snapshot of the selected monitor, readable from any thread.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MonitorSummary {
    /// The selected monitor's output name.
    pub name: String,
    /// Its active tag set.
    pub active_tags: TagMask,
    /// Its current layout symbol.
    pub layout_symbol: String,
}

/// The callback table the host hands to policy modules.
///
/// The handle is resolved once at host construction and stays valid for
/// the life of the process, which strictly exceeds any module's. Workers
/// use it to read the selected-monitor snapshot and to route mutations
/// back to the main thread; they never touch host structures directly.
#[derive(Debug, Clone)]
pub struct HostHandle {
    requests: Sender<HostRequest>,
    selected: Arc<RwLock<MonitorSummary>>,
}

impl HostHandle {
    /// Creates the handle and the receiver the host drains.
    pub(crate) fn new() -> (Self, Receiver<HostRequest>) {
        let (tx, rx) = unbounded();
        (
            Self {
                requests: tx,
                selected: Arc::new(RwLock::new(MonitorSummary::default())),
            },
            rx,
        )
    }

    /// Asks the host to carry out an action on the main thread.
    pub fn request(&self, action: Action) {
        if self.requests.send(HostRequest::Dispatch(action)).is_err() {
            warn!("host request channel is gone");
        }
    }

    /// Asks the host to republish status snapshots.
    pub fn refresh_status(&self) {
        let _ = self.requests.send(HostRequest::RefreshStatus);
    }

    /// The current selected-monitor snapshot.
    pub fn selected_monitor(&self) -> MonitorSummary {
        self.selected.read().clone()
    }

    /// Writes to the host's log on behalf of the policy.
    pub fn log(&self, message: &str) {
        info!(target: "policy", "{message}");
    }

    pub(crate) fn set_selected(&self, summary: MonitorSummary) {
        *self.selected.write() = summary;
    }
}

/// A live, initialised policy: the module, its workers, and (for
/// artifact-backed policies) the library it came from.
#[derive(custom_debug_derive::Debug)]
pub struct PolicyHandle {
    // field order matters: the module must drop before the library that
    // contains its code is closed
    #[debug(skip)]
    module: Box<dyn PolicyModule>,
    workers: WorkerSet,
    path: Option<PathBuf>,
    torn_down: bool,
    #[debug(skip)]
    _artifact: Option<libloading::Library>,
}

impl PolicyHandle {
    /// Initialises a module into a live handle. On init failure the
    /// module is torn down and dropped, and the artifact is closed.
    pub(crate) fn initialise(
        mut module: Box<dyn PolicyModule>,
        artifact: Option<libloading::Library>,
        path: Option<PathBuf>,
        host: &HostHandle,
    ) -> Result<Self, PolicyError> {
        let mut workers = WorkerSet::new();

        match module.init(host, &mut workers) {
            Ok(()) => Ok(Self {
                module,
                workers,
                path,
                torn_down: false,
                _artifact: artifact,
            }),
            Err(e) => {
                workers.join_all();
                module.teardown();
                // the artifact may only close after the module whose code
                // it contains is gone
                drop(module);
                drop(artifact);
                Err(e)
            }
        }
    }

    /// The module's capability table.
    pub fn table(&self) -> &PolicyTable {
        self.module.table()
    }

    /// The artifact this policy was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Joins every worker, then tears the module down. Idempotent.
    fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.workers.join_all();
        self.module.teardown();
        self.torn_down = true;
    }
}

impl Drop for PolicyHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The host's view of the policy boundary.
///
/// Exactly two states exist: no policy (everything empty) and a loaded
/// policy. Swapping between them is the whole of the reload operation.
#[derive(Debug, Default)]
pub enum ActivePolicy {
    /// No policy is loaded; all tables are empty.
    #[default]
    Vacant,
    /// A policy is loaded and initialised.
    Loaded(PolicyHandle),
}

impl ActivePolicy {
    /// Tests whether a policy is loaded.
    pub fn is_loaded(&self) -> bool {
        matches!(self, ActivePolicy::Loaded(_))
    }

    /// The active capability table, if any.
    pub fn table(&self) -> Option<&PolicyTable> {
        match self {
            ActivePolicy::Vacant => None,
            ActivePolicy::Loaded(handle) => Some(handle.table()),
        }
    }

    /// The active keybinds, empty when vacant.
    pub fn keybinds(&self) -> &[Keybind] {
        self.table().map_or(&[], |t| t.keybinds.as_slice())
    }

    /// The active mousebinds, empty when vacant.
    pub fn mousebinds(&self) -> &[Mousebind] {
        self.table().map_or(&[], |t| t.mousebinds.as_slice())
    }

    /// The active window rules, empty when vacant.
    pub fn rules(&self) -> &[WindowRule] {
        self.table().map_or(&[], |t| t.rules.as_slice())
    }

    /// The active monitor rules, empty when vacant.
    pub fn monitor_rules(&self) -> &[MonitorRule] {
        self.table().map_or(&[], |t| t.monitor_rules.as_slice())
    }

    /// The active layout list, empty when vacant.
    pub fn layouts(&self) -> &[Box<dyn Layout>] {
        self.table().map_or(&[], |t| t.layouts.as_slice())
    }

    /// The active input preferences, defaults when vacant.
    pub fn input(&self) -> InputPrefs {
        self.table().map_or_else(InputPrefs::default, |t| t.input)
    }

    /// The artifact path of the loaded policy, if it came from one.
    pub fn artifact_path(&self) -> Option<&Path> {
        match self {
            ActivePolicy::Vacant => None,
            ActivePolicy::Loaded(handle) => handle.path(),
        }
    }

    /// Adopts an in-process module (a compiled-in policy, or a test
    /// double), replacing the current policy on success.
    pub fn adopt(
        &mut self,
        module: Box<dyn PolicyModule>,
        host: &HostHandle,
    ) -> Result<(), PolicyError> {
        let handle = PolicyHandle::initialise(module, None, None, host)?;
        self.unload();
        *self = ActivePolicy::Loaded(handle);
        Ok(())
    }

    /// Loads a policy from an artifact.
    ///
    /// The swap only happens after the new policy has fully initialised:
    /// a failed load leaves the previous policy (or the vacant state)
    /// untouched, and the host keeps running with it.
    pub fn load(&mut self, path: &Path, host: &HostHandle) -> Result<(), PolicyError> {
        let handle = loader::load(path, host)?;
        self.unload();
        *self = ActivePolicy::Loaded(handle);
        info!(path = %path.display(), "policy loaded");
        Ok(())
    }

    /// Unloads the active policy, if any.
    ///
    /// Blocks until every policy worker has stopped, then tears the
    /// module down and closes its artifact.
    pub fn unload(&mut self) {
        if let ActivePolicy::Loaded(mut handle) = std::mem::take(self) {
            handle.shutdown();
            info!("policy unloaded");
        }
    }

    /// Reloads the active policy from its artifact: an unload followed by
    /// a load of the same path.
    ///
    /// If the load half fails the host is left with *no* active policy;
    /// bindings and layouts degrade to empty rather than the process
    /// dying.
    pub fn reload(&mut self, host: &HostHandle) -> Result<(), PolicyError> {
        let Some(path) = self.artifact_path().map(Path::to_owned) else {
            return Err(PolicyError::NothingLoaded);
        };

        self.unload();

        match loader::load(&path, host) {
            Ok(handle) => {
                *self = ActivePolicy::Loaded(handle);
                info!(path = %path.display(), "policy reloaded");
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "policy reload failed, running without a policy");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    //! An in-process policy used across the crate's tests.

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::bindings::keysym::*;
    use crate::bindings::{kb, ModKey};
    use crate::core::tags::TagMask;
    use crate::layouts::{Floating, MasterStack, Monocle};

    /// A policy double with a small table and an optional worker.
    pub(crate) struct TestPolicy {
        pub table: PolicyTable,
        pub spawn_worker: bool,
        pub fail_init: bool,
        pub torn_down: Arc<AtomicBool>,
        pub worker_ticks: Arc<AtomicUsize>,
        pub worker_stopped: Arc<AtomicBool>,
    }

    impl TestPolicy {
        pub fn new() -> Self {
            Self {
                table: PolicyTable {
                    keybinds: vec![
                        kb(vec![ModKey::Meta], XK_J, Action::FocusStack(1)),
                        kb(vec![ModKey::Meta], XK_K, Action::FocusStack(-1)),
                        kb(vec![ModKey::Meta], XK_1, Action::View(TagMask::single(0))),
                    ],
                    layouts: vec![
                        Box::new(MasterStack),
                        Box::new(Monocle),
                        Box::new(Floating),
                    ],
                    ..PolicyTable::default()
                },
                spawn_worker: false,
                fail_init: false,
                torn_down: Arc::new(AtomicBool::new(false)),
                worker_ticks: Arc::new(AtomicUsize::new(0)),
                worker_stopped: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl PolicyModule for TestPolicy {
        fn init(&mut self, _host: &HostHandle, workers: &mut WorkerSet) -> Result<(), PolicyError> {
            if self.fail_init {
                return Err(PolicyError::InitFailed("told to fail".into()));
            }
            if self.spawn_worker {
                let ticks = self.worker_ticks.clone();
                let stopped = self.worker_stopped.clone();
                workers.spawn("test-feeder", move |stop| {
                    while !stop.raised() {
                        ticks.fetch_add(1, Ordering::SeqCst);
                        std::thread::yield_now();
                    }
                    stopped.store(true, Ordering::SeqCst);
                })?;
            }
            Ok(())
        }

        fn teardown(&mut self) {
            self.torn_down.store(true, Ordering::SeqCst);
        }

        fn table(&self) -> &PolicyTable {
            &self.table
        }
    }
}
