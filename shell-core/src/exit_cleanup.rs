use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    append_shutdown_log,
    dispatch_bus::{Action, DispatchBus},
    exit_state::{DrainStage, ShutdownPhase, TerminationDecision, TerminationReason},
    node_process::NodeSubsystem,
    socket_manager::SocketPool,
    tab_store::Storage,
    SOCKET_DRAIN_GRACE,
};

/// Sequences process shutdown: sockets, grace delay, nodes, storage, quit.
///
/// The first termination request flips the shutdown phase from `Running` to
/// `Draining(Sockets)` through the bus reducer, which only accepts that step
/// once. Every later request observes the drain (or its completion) instead
/// of starting another one.
pub struct ShutdownOrchestrator<S, N, P> {
    bus: Arc<DispatchBus>,
    sockets: Arc<S>,
    nodes: Vec<Arc<N>>,
    storage: Arc<P>,
    grace: Duration,
    drain_started: AtomicBool,
}

impl<S, N, P> ShutdownOrchestrator<S, N, P>
where
    S: SocketPool,
    N: NodeSubsystem,
    P: Storage,
{
    /// `nodes` are stopped in the given order; the blockchain node goes first.
    pub fn new(bus: Arc<DispatchBus>, sockets: Arc<S>, nodes: Vec<Arc<N>>, storage: Arc<P>) -> Self {
        Self::with_grace(bus, sockets, nodes, storage, SOCKET_DRAIN_GRACE)
    }

    pub fn with_grace(
        bus: Arc<DispatchBus>,
        sockets: Arc<S>,
        nodes: Vec<Arc<N>>,
        storage: Arc<P>,
        grace: Duration,
    ) -> Self {
        Self {
            bus,
            sockets,
            nodes,
            storage,
            grace,
            drain_started: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> ShutdownPhase {
        self.bus.shutdown_phase()
    }

    /// Decides what a termination attempt should do. Only the caller that
    /// receives [`TerminationDecision::BeginDrain`] may run [`Self::drain`].
    pub fn request_termination(&self, reason: &TerminationReason) -> TerminationDecision {
        if self.bus.shutdown_phase().is_terminated() {
            return TerminationDecision::AllowExit;
        }

        let latched = self
            .bus
            .publish(Action::ShutdownPhaseChanged {
                phase: ShutdownPhase::Draining(DrainStage::Sockets),
            })
            .is_ok();
        if latched {
            append_shutdown_log(&format!("termination requested: {}", reason.describe()));
            return TerminationDecision::BeginDrain;
        }

        if self.bus.shutdown_phase().is_terminated() {
            return TerminationDecision::AllowExit;
        }
        append_shutdown_log(&format!(
            "termination already in progress ({}); ignoring {}",
            self.bus.shutdown_phase().as_str(),
            reason.describe()
        ));
        TerminationDecision::AlreadyDraining
    }

    /// Runs the drain sequence to completion. Individual step failures are
    /// logged and reported on the bus; they never stop the sequence.
    pub async fn drain(&self) -> Result<(), String> {
        if self.bus.shutdown_phase() != ShutdownPhase::Draining(DrainStage::Sockets) {
            return Err(format!(
                "Cannot drain while shutdown phase is {}.",
                self.bus.shutdown_phase().as_str()
            ));
        }
        if self
            .drain_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err("Shutdown drain is already running.".to_string());
        }

        let sockets_ok = match self.sockets.destroy_all().await {
            Ok(count) => {
                append_shutdown_log(&format!("closed {count} socket(s)"));
                true
            }
            Err(error) => {
                append_shutdown_log(&format!("failed to destroy sockets, continuing: {error}"));
                false
            }
        };
        self.publish_step(Action::SocketsDestroyed { ok: sockets_ok });

        tokio::time::sleep(self.grace).await;
        self.advance(ShutdownPhase::Draining(DrainStage::NodesAndStorage));

        for node in &self.nodes {
            let kind = node.kind();
            let ok = match node.stop().await {
                Ok(()) => true,
                Err(error) => {
                    append_shutdown_log(&format!("failed to stop {}: {error}", kind.as_str()));
                    false
                }
            };
            self.publish_step(Action::NodeStopped { node: kind, ok });
        }

        let storage_ok = match self.storage.close().await {
            Ok(()) => true,
            Err(error) => {
                append_shutdown_log(&format!("failed to close storage: {error}"));
                false
            }
        };
        self.publish_step(Action::StorageClosed { ok: storage_ok });

        self.advance(ShutdownPhase::Terminated);
        append_shutdown_log("shutdown drain complete");
        self.publish_step(Action::Quit);
        Ok(())
    }

    /// Requests termination and, when this call owns the drain, runs it.
    pub async fn terminate(&self, reason: TerminationReason) -> TerminationDecision {
        let decision = self.request_termination(&reason);
        if decision == TerminationDecision::BeginDrain {
            if let Err(error) = self.drain().await {
                append_shutdown_log(&error);
            }
        }
        decision
    }

    fn advance(&self, phase: ShutdownPhase) {
        self.publish_step(Action::ShutdownPhaseChanged { phase });
    }

    fn publish_step(&self, action: Action) {
        let name = action.name();
        if let Err(error) = self.bus.publish(action) {
            append_shutdown_log(&format!("failed to publish {name}: {error}"));
        }
    }
}
