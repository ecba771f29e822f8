//! Process-wide control state shared by every agent component.
//!
//! One [`AgentContext`] is created at startup and outlives every world
//! session. The control loop, command dispatcher, vitals monitor and chest
//! workflow all hold an `Arc` to it. Locks are held only for the mutation
//! itself, never across a world call, so concurrent writers are
//! last-writer-wins.

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, oneshot};

use crate::geometry::Vec3;

/// Lowest value `min_health` may take.
pub const MIN_HEALTH_FLOOR: u32 = 1;

/// The target kind used when none is given.
pub const DEFAULT_TARGET_KIND: &str = "log";

/// Operator-adjustable flags and harvest counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    /// Block kind the loop searches for; never empty
    pub target_kind: String,

    /// Whether the loop may start new actions
    pub active: bool,

    /// Replant saplings where logs were harvested
    pub auto_replant: bool,

    /// Health below which the loop runs its emergency feeding
    pub min_health: u32,

    /// Items harvested since the last deposit attempt
    pub session_count: u32,

    /// Items harvested since startup; never decreases
    pub total_harvested: u64,

    pub yolo: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            target_kind: DEFAULT_TARGET_KIND.into(),
            active: true,
            auto_replant: false,
            min_health: 2,
            session_count: 0,
            total_harvested: 0,
            yolo: false,
        }
    }
}

impl ControlState {
    /// Switch targets. Blank input falls back to the default kind.
    pub fn set_target(&mut self, kind: &str) {
        let kind = kind.trim();
        self.target_kind = if kind.is_empty() {
            DEFAULT_TARGET_KIND.into()
        } else {
            kind.to_string()
        };
        self.session_count = 0;
    }

    pub fn record_harvest(&mut self) {
        self.total_harvested += 1;
        self.session_count += 1;
    }

    pub fn reset_session(&mut self) {
        self.session_count = 0;
    }

    pub fn set_min_health(&mut self, min_health: u32) {
        self.min_health = min_health.max(MIN_HEALTH_FLOOR);
    }

    pub fn enable_yolo(&mut self) {
        self.yolo = true;
        self.min_health = MIN_HEALTH_FLOOR;
    }
}

/// Remembered storage container.
///
/// Holds a position only while it is believed to be a container; the
/// deposit workflow clears it the moment a lookup says otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChestMemory {
    pub position: Option<Vec3>,
}

/// The shared context object handed to every component.
#[derive(Debug, Default)]
pub struct AgentContext {
    control: RwLock<ControlState>,
    chest: RwLock<ChestMemory>,
    container_watch: Mutex<Option<oneshot::Sender<String>>>,
}

impl AgentContext {
    pub fn new(control: ControlState) -> Self {
        Self {
            control: RwLock::new(control),
            chest: RwLock::new(ChestMemory::default()),
            container_watch: Mutex::new(None),
        }
    }

    /// A copy of the current control state.
    pub async fn snapshot(&self) -> ControlState {
        self.control.read().await.clone()
    }

    /// Apply a mutation to the control state and return its result.
    pub async fn update<R>(&self, f: impl FnOnce(&mut ControlState) -> R) -> R {
        let mut control = self.control.write().await;
        f(&mut control)
    }

    pub async fn is_active(&self) -> bool {
        self.control.read().await.active
    }

    pub async fn target_kind(&self) -> String {
        self.control.read().await.target_kind.clone()
    }

    pub async fn chest_position(&self) -> Option<Vec3> {
        self.chest.read().await.position
    }

    pub async fn remember_chest(&self, position: Vec3) {
        self.chest.write().await.position = Some(position);
    }

    pub async fn forget_chest(&self) {
        self.chest.write().await.position = None;
    }

    /// Register interest in the next container window. Replaces any
    /// earlier registration, whose receiver then sees the sender dropped.
    pub async fn arm_container_watch(&self) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        *self.container_watch.lock().await = Some(tx);
        rx
    }

    /// Hand a window kind to the registered watcher, if any. Returns whether
    /// a watcher took it.
    pub async fn fire_container_watch(&self, window_kind: &str) -> bool {
        match self.container_watch.lock().await.take() {
            Some(tx) => tx.send(window_kind.to_string()).is_ok(),
            None => false,
        }
    }

    pub async fn disarm_container_watch(&self) {
        self.container_watch.lock().await.take();
    }

    pub async fn container_watch_armed(&self) -> bool {
        self.container_watch.lock().await.is_some()
    }
}
