use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use serde::Serialize;

use crate::{
    append_runtime_log,
    exit_state::ShutdownPhase,
    node_readiness::{NodeKind, NodeReadinessState},
    protocol_gate::ProtocolDisposition,
    tab_store::TabRecord,
};

/// Tagged notification published on the bus. Serializable so the host can
/// forward it to the webview unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    StorageInitialized,
    StorageInitFailed { reason: String },
    StorageClosed { ok: bool },
    ProtocolGateRegistered { scheme: String },
    NodeStateChanged {
        node: NodeKind,
        state: NodeReadinessState,
    },
    NodeStartFailed { node: NodeKind, reason: String },
    NodeStopped { node: NodeKind, ok: bool },
    ProtocolAccessed {
        scheme: String,
        url: String,
        disposition: ProtocolDisposition,
    },
    BootstrapCompleted,
    ShutdownPhaseChanged { phase: ShutdownPhase },
    SocketsDestroyed { ok: bool },
    TabsRefreshed { tabs: Vec<TabRecord> },
    MenuRefreshed { tab_count: usize },
    Quit,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StorageInitialized => "storageInitialized",
            Self::StorageInitFailed { .. } => "storageInitFailed",
            Self::StorageClosed { .. } => "storageClosed",
            Self::ProtocolGateRegistered { .. } => "protocolGateRegistered",
            Self::NodeStateChanged { .. } => "nodeStateChanged",
            Self::NodeStartFailed { .. } => "nodeStartFailed",
            Self::NodeStopped { .. } => "nodeStopped",
            Self::ProtocolAccessed { .. } => "protocolAccessed",
            Self::BootstrapCompleted => "bootstrapCompleted",
            Self::ShutdownPhaseChanged { .. } => "shutdownPhaseChanged",
            Self::SocketsDestroyed { .. } => "socketsDestroyed",
            Self::TabsRefreshed { .. } => "tabsRefreshed",
            Self::MenuRefreshed { .. } => "menuRefreshed",
            Self::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub ethereum_node: NodeReadinessState,
    pub swarm_node: NodeReadinessState,
    pub shutdown: ShutdownPhase,
    pub storage_ready: bool,
    pub tabs: Vec<TabRecord>,
}

impl AppState {
    pub fn node(&self, node: NodeKind) -> NodeReadinessState {
        match node {
            NodeKind::Ethereum => self.ethereum_node,
            NodeKind::Swarm => self.swarm_node,
        }
    }

    fn node_mut(&mut self, node: NodeKind) -> &mut NodeReadinessState {
        match node {
            NodeKind::Ethereum => &mut self.ethereum_node,
            NodeKind::Swarm => &mut self.swarm_node,
        }
    }

    /// Applies `action` to the state. Transitions that break the readiness
    /// cycle or the shutdown ordering are refused and leave the state as is.
    fn reduce(&mut self, action: &Action) -> Result<(), String> {
        match action {
            Action::StorageInitialized => self.storage_ready = true,
            Action::StorageClosed { .. } => self.storage_ready = false,
            Action::NodeStateChanged { node, state } => {
                let current = self.node(*node);
                if !current.can_transition_to(*state) {
                    return Err(format!(
                        "Invalid {} readiness transition: {} -> {}",
                        node.as_str(),
                        current.as_str(),
                        state.as_str()
                    ));
                }
                *self.node_mut(*node) = *state;
            }
            Action::ShutdownPhaseChanged { phase } => {
                if !self.shutdown.can_advance_to(*phase) {
                    return Err(format!(
                        "Invalid shutdown transition: {} -> {}",
                        self.shutdown.as_str(),
                        phase.as_str()
                    ));
                }
                self.shutdown = *phase;
            }
            Action::TabsRefreshed { tabs } => self.tabs = tabs.clone(),
            _ => {}
        }
        Ok(())
    }
}

pub type Observer = Arc<dyn Fn(&Action, &AppState) + Send + Sync>;

/// Clears the delivering flag on drop, so a panicking observer does not leave
/// the queue blocked for every later publish.
struct DeliveryGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Process-wide action broadcaster and the single source of truth for node
/// readiness and shutdown phase.
///
/// `publish` reduces the action into the state immediately and then delivers
/// it to every observer. Delivery is funnelled through one queue so observers
/// always see actions in publish order, including actions published from
/// inside another observer.
pub struct DispatchBus {
    state: Mutex<AppState>,
    observers: Mutex<Vec<Observer>>,
    queue: Mutex<VecDeque<(Action, AppState)>>,
    delivering: AtomicBool,
}

impl Default for DispatchBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchBus {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AppState::default()),
            observers: Mutex::new(Vec::new()),
            queue: Mutex::new(VecDeque::new()),
            delivering: AtomicBool::new(false),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(error) => {
                append_runtime_log("dispatch bus state lock poisoned; recovering");
                error.into_inner()
            }
        }
    }

    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<(Action, AppState)>> {
        match self.queue.lock() {
            Ok(guard) => guard,
            Err(error) => error.into_inner(),
        }
    }

    pub fn get_state(&self) -> AppState {
        self.lock_state().clone()
    }

    pub fn node_state(&self, node: NodeKind) -> NodeReadinessState {
        self.lock_state().node(node)
    }

    pub fn shutdown_phase(&self) -> ShutdownPhase {
        self.lock_state().shutdown
    }

    pub fn subscribe(&self, observer: Observer) {
        match self.observers.lock() {
            Ok(mut guard) => guard.push(observer),
            Err(error) => error.into_inner().push(observer),
        }
    }

    pub fn publish(&self, action: Action) -> Result<(), String> {
        {
            let mut state = self.lock_state();
            if let Err(error) = state.reduce(&action) {
                append_runtime_log(&format!("dispatch rejected {}: {}", action.name(), error));
                return Err(error);
            }
            // Enqueue under the state lock so queue order equals reduce order.
            self.lock_queue().push_back((action, state.clone()));
        }
        self.deliver_pending();
        Ok(())
    }

    fn deliver_pending(&self) {
        loop {
            if self
                .delivering
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // Another caller is draining the queue and will pick this up.
                return;
            }
            let delivering = DeliveryGuard {
                flag: &self.delivering,
            };

            loop {
                let next = self.lock_queue().pop_front();
                let Some((action, snapshot)) = next else {
                    break;
                };
                let observers = match self.observers.lock() {
                    Ok(guard) => guard.clone(),
                    Err(error) => error.into_inner().clone(),
                };
                for observer in observers {
                    observer(&action, &snapshot);
                }
            }

            drop(delivering);
            if self.lock_queue().is_empty() {
                return;
            }
        }
    }
}
