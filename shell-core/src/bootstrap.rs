use std::sync::Arc;

use tokio::{runtime::Handle, task::JoinHandle};

use crate::{
    append_node_log, append_startup_log,
    dispatch_bus::{Action, DispatchBus},
    exit_cleanup::ShutdownOrchestrator,
    exit_state::TerminationReason,
    menu_model::MenuRenderer,
    node_process::NodeSubsystem,
    protocol_gate::ProtocolGate,
    refresh_debouncer::RefreshDebouncer,
    socket_manager::SocketPool,
    tab_store::{RecordView, Storage},
};

/// Everything the startup sequence touches, already constructed.
pub struct BootstrapSequencer<S, N, P, M> {
    pub bus: Arc<DispatchBus>,
    pub storage: Arc<P>,
    pub sockets: Arc<S>,
    pub nodes: Vec<Arc<N>>,
    pub gate: ProtocolGate,
    pub debouncer: RefreshDebouncer<P, M>,
    pub orchestrator: Arc<ShutdownOrchestrator<S, N, P>>,
    pub auto_start_nodes: bool,
    pub runtime: Handle,
}

impl<S, N, P, M> BootstrapSequencer<S, N, P, M>
where
    S: SocketPool + 'static,
    N: NodeSubsystem + 'static,
    P: Storage + RecordView + 'static,
    M: MenuRenderer + 'static,
{
    /// Storage, protocol gate, initial menu, then node starts. Node starts run
    /// in the background; their handles are returned for callers that want to
    /// await them. A storage failure routes straight into termination.
    pub async fn run(&self) -> Result<Vec<JoinHandle<()>>, String> {
        append_startup_log("opening tab storage");
        if let Err(error) = self.storage.init().await {
            append_startup_log(&format!("storage initialization failed: {error}"));
            let _ = self.bus.publish(Action::StorageInitFailed {
                reason: error.clone(),
            });
            self.orchestrator
                .terminate(TerminationReason::InitializationFailure(error.clone()))
                .await;
            return Err(error);
        }
        self.bus.publish(Action::StorageInitialized)?;

        if self.gate.register() {
            append_startup_log(&format!("registered {} protocol gate", self.gate.scheme()));
        }

        self.debouncer.attach();
        self.debouncer.refresh_now();

        let node_tasks = if self.auto_start_nodes {
            self.nodes
                .iter()
                .map(|node| self.spawn_node_start(node.clone()))
                .collect()
        } else {
            append_startup_log("node auto-start disabled");
            Vec::new()
        };

        self.bus.publish(Action::BootstrapCompleted)?;
        append_startup_log("bootstrap completed");
        Ok(node_tasks)
    }

    fn spawn_node_start(&self, node: Arc<N>) -> JoinHandle<()> {
        let bus = self.bus.clone();
        let sockets = self.sockets.clone();
        self.runtime.spawn(async move {
            let name = node.kind().as_str();
            if let Err(error) = node.start().await {
                append_node_log(&format!("{name} did not start: {error}"));
                return;
            }

            let Some(addr) = node.connection_addr() else {
                return;
            };
            if !bus.shutdown_phase().is_running() {
                return;
            }
            if let Err(error) = sockets.open(name, &addr).await {
                append_node_log(&error);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Mutex, time::Duration};

    use super::*;
    use crate::{
        exit_state::ShutdownPhase,
        menu_model::RebuildCompletion,
        node_readiness::{NodeKind, NodeReadinessState},
        protocol_gate::{GateConfig, GateMessages},
        shell_locale::shell_texts_for_locale,
        tab_store::{TabRecord, TabStore},
        AppState,
    };

    type Calls = Arc<Mutex<Vec<String>>>;

    fn push(calls: &Calls, entry: impl Into<String>) {
        calls.lock().expect("calls lock").push(entry.into());
    }

    struct FakeSockets {
        calls: Calls,
    }

    impl SocketPool for FakeSockets {
        async fn open(&self, label: &str, addr: &str) -> Result<u64, String> {
            push(&self.calls, format!("open:{label}:{addr}"));
            Ok(1)
        }

        async fn destroy_all(&self) -> Result<usize, String> {
            push(&self.calls, "destroy");
            Ok(0)
        }
    }

    struct FakeNode {
        kind: NodeKind,
        bus: Arc<DispatchBus>,
        calls: Calls,
        addr: Option<String>,
    }

    impl NodeSubsystem for FakeNode {
        fn kind(&self) -> NodeKind {
            self.kind
        }

        async fn start(&self) -> Result<(), String> {
            push(&self.calls, format!("start:{}", self.kind.as_str()));
            for state in [NodeReadinessState::Enabling, NodeReadinessState::Enabled] {
                self.bus.publish(Action::NodeStateChanged {
                    node: self.kind,
                    state,
                })?;
            }
            Ok(())
        }

        async fn stop(&self) -> Result<(), String> {
            push(&self.calls, format!("stop:{}", self.kind.as_str()));
            Ok(())
        }

        fn connection_addr(&self) -> Option<String> {
            self.addr.clone()
        }
    }

    #[derive(Default)]
    struct FakeRenderer {
        rebuilds: Mutex<Vec<usize>>,
    }

    impl MenuRenderer for FakeRenderer {
        fn rebuild_menu(&self, tabs: &[TabRecord], done: RebuildCompletion) {
            self.rebuilds.lock().expect("rebuilds lock").push(tabs.len());
            done(Ok(()));
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        calls: Calls,
        actions: Arc<Mutex<Vec<&'static str>>>,
        renderer: Arc<FakeRenderer>,
        sequencer: BootstrapSequencer<FakeSockets, FakeNode, TabStore, FakeRenderer>,
    }

    fn fixture(auto_start_nodes: bool) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Calls::default();
        let bus = Arc::new(DispatchBus::new());
        let actions = Arc::new(Mutex::new(Vec::new()));
        let sink = actions.clone();
        bus.subscribe(Arc::new(move |action: &Action, _state: &AppState| {
            sink.lock().expect("actions lock").push(action.name());
        }));

        let storage = Arc::new(TabStore::for_root(dir.path()));
        let sockets = Arc::new(FakeSockets {
            calls: calls.clone(),
        });
        let nodes = vec![
            Arc::new(FakeNode {
                kind: NodeKind::Ethereum,
                bus: bus.clone(),
                calls: calls.clone(),
                addr: Some("127.0.0.1:8545".to_string()),
            }),
            Arc::new(FakeNode {
                kind: NodeKind::Swarm,
                bus: bus.clone(),
                calls: calls.clone(),
                addr: None,
            }),
        ];
        let renderer = Arc::new(FakeRenderer::default());
        let gate = ProtocolGate::new(
            bus.clone(),
            GateConfig::swarm("http://localhost:8500", None),
            GateMessages::from_texts(&shell_texts_for_locale("en-US")),
            None,
        );
        let debouncer = RefreshDebouncer::new(
            storage.clone(),
            renderer.clone(),
            bus.clone(),
            Duration::from_millis(1_000),
            Handle::current(),
        );
        let orchestrator = Arc::new(ShutdownOrchestrator::with_grace(
            bus.clone(),
            sockets.clone(),
            nodes.clone(),
            storage.clone(),
            Duration::from_millis(10),
        ));

        Fixture {
            _dir: dir,
            calls,
            actions,
            renderer,
            sequencer: BootstrapSequencer {
                bus,
                storage,
                sockets,
                nodes,
                gate,
                debouncer,
                orchestrator,
                auto_start_nodes,
                runtime: Handle::current(),
            },
        }
    }

    #[tokio::test]
    async fn run_initializes_in_order_before_starting_nodes() {
        let fixture = fixture(true);

        let node_tasks = fixture.sequencer.run().await.expect("bootstrap");

        assert_eq!(
            *fixture.actions.lock().expect("actions lock"),
            [
                "storageInitialized",
                "protocolGateRegistered",
                "tabsRefreshed",
                "menuRefreshed",
                "bootstrapCompleted",
            ]
        );
        assert!(fixture.sequencer.gate.is_registered());
        assert_eq!(*fixture.renderer.rebuilds.lock().expect("rebuilds lock"), [0]);

        for task in node_tasks {
            task.await.expect("node task");
        }
        let calls = fixture.calls.lock().expect("calls lock").clone();
        assert!(calls.contains(&"start:ethereum".to_string()));
        assert!(calls.contains(&"start:swarm".to_string()));
        assert_eq!(
            calls.iter().filter(|call| call.starts_with("open:")).collect::<Vec<_>>(),
            ["open:ethereum:127.0.0.1:8545"]
        );
        let state = fixture.sequencer.bus.get_state();
        assert!(state.storage_ready);
        assert_eq!(state.swarm_node, NodeReadinessState::Enabled);
    }

    #[tokio::test]
    async fn run_without_auto_start_leaves_nodes_disabled() {
        let fixture = fixture(false);

        let node_tasks = fixture.sequencer.run().await.expect("bootstrap");

        assert!(node_tasks.is_empty());
        assert!(fixture.calls.lock().expect("calls lock").is_empty());
        assert_eq!(
            fixture.sequencer.bus.node_state(NodeKind::Ethereum),
            NodeReadinessState::Disabled
        );
    }

    #[tokio::test(start_paused = true)]
    async fn storage_failure_routes_into_termination() {
        let fixture = fixture(true);
        let tabs_path = fixture.sequencer.storage.path().to_path_buf();
        fs::create_dir_all(tabs_path.parent().expect("parent")).expect("create data dir");
        fs::write(&tabs_path, "{ not json").expect("write malformed tabs");

        let error = fixture.sequencer.run().await.expect_err("must fail");

        assert!(!error.is_empty());
        assert!(!fixture.sequencer.gate.is_registered());
        assert!(fixture.renderer.rebuilds.lock().expect("rebuilds lock").is_empty());
        assert_eq!(
            fixture.sequencer.bus.shutdown_phase(),
            ShutdownPhase::Terminated
        );
        let actions = fixture.actions.lock().expect("actions lock").clone();
        assert_eq!(actions.first(), Some(&"storageInitFailed"));
        assert_eq!(actions.last(), Some(&"quit"));
        assert!(!actions.contains(&"bootstrapCompleted"));
        let calls = fixture.calls.lock().expect("calls lock").clone();
        assert!(!calls.iter().any(|call| call.starts_with("start:")));
    }
}
