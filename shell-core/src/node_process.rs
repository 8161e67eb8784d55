use std::{
    fs::{self, OpenOptions},
    future::Future,
    process::{ExitStatus, Stdio},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use tokio::{
    net::TcpStream,
    process::{Child, Command},
    time::Instant,
};

use crate::{
    append_node_log,
    dispatch_bus::{Action, DispatchBus},
    node_config::NodeLaunchPlan,
    node_readiness::{NodeKind, NodeReadinessState},
    process_control, NODE_PROBE_TIMEOUT, NODE_READY_POLL_INTERVAL,
};

/// An embedded long-running node. Implementations publish their own
/// readiness transitions on the dispatch bus.
pub trait NodeSubsystem: Send + Sync {
    fn kind(&self) -> NodeKind;

    fn start(&self) -> impl Future<Output = Result<(), String>> + Send;

    fn stop(&self) -> impl Future<Output = Result<(), String>> + Send;

    /// Address the shell keeps a socket open to while the node is enabled.
    fn connection_addr(&self) -> Option<String> {
        None
    }
}

/// Holds a flag high for as long as the guard lives; acquisition fails while
/// another guard holds it.
struct StartGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> StartGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag })
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub async fn probe_tcp(addr: &str) -> bool {
    matches!(
        tokio::time::timeout(NODE_PROBE_TIMEOUT, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

pub struct ProcessNode {
    plan: NodeLaunchPlan,
    bus: Arc<DispatchBus>,
    child: Mutex<Option<Child>>,
    is_starting: AtomicBool,
    keeps_connection: bool,
}

impl ProcessNode {
    pub fn new(plan: NodeLaunchPlan, bus: Arc<DispatchBus>) -> Self {
        let keeps_connection = plan.kind == NodeKind::Ethereum;
        Self {
            plan,
            bus,
            child: Mutex::new(None),
            is_starting: AtomicBool::new(false),
            keeps_connection,
        }
    }

    pub fn plan(&self) -> &NodeLaunchPlan {
        &self.plan
    }

    fn name(&self) -> &'static str {
        self.plan.kind.process_name()
    }

    fn lock_child(&self) -> MutexGuard<'_, Option<Child>> {
        match self.child.lock() {
            Ok(guard) => guard,
            Err(error) => {
                append_node_log(&format!("{} process lock poisoned; recovering", self.name()));
                error.into_inner()
            }
        }
    }

    fn publish_state(&self, state: NodeReadinessState) -> Result<(), String> {
        self.bus.publish(Action::NodeStateChanged {
            node: self.plan.kind,
            state,
        })
    }

    fn spawn_child(&self) -> Result<Child, String> {
        let mut command = Command::new(&self.plan.cmd);
        command
            .args(&self.plan.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(log_path) = &self.plan.log_path {
            if let Some(log_parent) = log_path.parent() {
                fs::create_dir_all(log_parent).map_err(|error| {
                    format!(
                        "Failed to create node log directory {}: {}",
                        log_parent.display(),
                        error
                    )
                })?;
            }
            let stdout_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
                .map_err(|error| {
                    format!("Failed to open node log {}: {}", log_path.display(), error)
                })?;
            let stderr_file = stdout_file
                .try_clone()
                .map_err(|error| format!("Failed to clone node log handle: {error}"))?;
            command.stdout(Stdio::from(stdout_file));
            command.stderr(Stdio::from(stderr_file));
        } else {
            command.stdout(Stdio::null());
            command.stderr(Stdio::null());
        }

        command.spawn().map_err(|error| {
            format!(
                "Failed to spawn {} with command {:?}: {}",
                self.name(),
                self.plan.debug_command(),
                error
            )
        })
    }

    fn child_exit_status(&self) -> Result<Option<ExitStatus>, String> {
        let mut guard = self.lock_child();
        let Some(child) = guard.as_mut() else {
            return Err(format!("{} process is not running.", self.name()));
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                *guard = None;
                Ok(Some(status))
            }
            Ok(None) => Ok(None),
            Err(error) => Err(format!(
                "Failed to poll {} process status: {error}",
                self.name()
            )),
        }
    }

    async fn wait_until_ready(&self) -> Result<(), String> {
        let started_at = Instant::now();
        loop {
            if probe_tcp(&self.plan.probe_addr).await {
                return Ok(());
            }

            if let Some(status) = self.child_exit_status()? {
                return Err(format!(
                    "{} exited before becoming reachable: {status}",
                    self.name()
                ));
            }

            if started_at.elapsed() >= self.plan.ready_timeout {
                return Err(format!(
                    "Timed out after {}ms waiting for {} at {}.",
                    self.plan.ready_timeout.as_millis(),
                    self.name(),
                    self.plan.probe_addr
                ));
            }

            tokio::time::sleep(NODE_READY_POLL_INTERVAL).await;
        }
    }

    async fn kill_child(&self) -> Result<(), String> {
        let child = self.lock_child().take();
        match child {
            Some(mut child) => process_control::stop_child_process(&mut child, self.name()).await,
            None => Ok(()),
        }
    }

    async fn fail_start(&self, reason: String) -> Result<(), String> {
        append_node_log(&format!("{} failed to start: {reason}", self.name()));
        if let Err(error) = self.kill_child().await {
            append_node_log(&error);
        }
        let _ = self.bus.publish(Action::NodeStartFailed {
            node: self.plan.kind,
            reason: reason.clone(),
        });
        Err(reason)
    }
}

impl NodeSubsystem for ProcessNode {
    fn kind(&self) -> NodeKind {
        self.plan.kind
    }

    async fn start(&self) -> Result<(), String> {
        let Some(_guard) = StartGuard::try_acquire(&self.is_starting) else {
            return Err(format!("{} start already in progress.", self.name()));
        };

        match self.bus.node_state(self.plan.kind) {
            NodeReadinessState::Disabled => {}
            NodeReadinessState::Enabled => return Ok(()),
            NodeReadinessState::Enabling => {
                return Err(format!("{} is already enabling.", self.name()));
            }
            NodeReadinessState::Disabling => {
                return Err(format!("{} is still stopping.", self.name()));
            }
        }

        self.publish_state(NodeReadinessState::Enabling)?;
        append_node_log(&format!(
            "starting {}: {:?}",
            self.name(),
            self.plan.debug_command()
        ));

        let child = match self.spawn_child() {
            Ok(child) => child,
            Err(error) => return self.fail_start(error).await,
        };
        *self.lock_child() = Some(child);

        if let Err(error) = self.wait_until_ready().await {
            return self.fail_start(error).await;
        }

        self.publish_state(NodeReadinessState::Enabled)?;
        append_node_log(&format!(
            "{} is reachable at {}",
            self.name(),
            self.plan.probe_addr
        ));
        Ok(())
    }

    async fn stop(&self) -> Result<(), String> {
        let was_enabled = self.bus.node_state(self.plan.kind) == NodeReadinessState::Enabled;
        if was_enabled {
            self.publish_state(NodeReadinessState::Disabling)?;
        }

        let result = self.kill_child().await;

        if was_enabled {
            self.publish_state(NodeReadinessState::Disabled)?;
        }
        append_node_log(&format!("{} stopped", self.name()));
        result
    }

    fn connection_addr(&self) -> Option<String> {
        self.keeps_connection.then(|| self.plan.probe_addr.clone())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;

    fn plan(cmd: &str, args: &[&str], probe_addr: &str, ready_timeout: Duration) -> NodeLaunchPlan {
        NodeLaunchPlan {
            kind: NodeKind::Swarm,
            cmd: cmd.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            probe_addr: probe_addr.to_string(),
            ready_timeout,
            log_path: None,
        }
    }

    async fn closed_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr").to_string();
        drop(listener);
        addr
    }

    #[test]
    fn start_guard_rejects_second_holder_until_dropped() {
        let flag = AtomicBool::new(false);
        let guard = StartGuard::try_acquire(&flag).expect("first acquire");
        assert!(StartGuard::try_acquire(&flag).is_none());
        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(StartGuard::try_acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn start_walks_to_enabled_and_stop_back_to_disabled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr").to_string();
        let bus = Arc::new(DispatchBus::new());
        let node = ProcessNode::new(
            plan("sleep", &["30"], &addr, Duration::from_secs(5)),
            bus.clone(),
        );

        node.start().await.expect("start");
        assert_eq!(bus.node_state(NodeKind::Swarm), NodeReadinessState::Enabled);

        node.stop().await.expect("stop");
        assert_eq!(bus.node_state(NodeKind::Swarm), NodeReadinessState::Disabled);
        assert!(node.lock_child().is_none());
    }

    #[tokio::test]
    async fn start_reports_process_that_exits_before_ready() {
        let bus = Arc::new(DispatchBus::new());
        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = failures.clone();
        bus.subscribe(Arc::new(move |action: &Action, _state: &crate::AppState| {
            if let Action::NodeStartFailed { reason, .. } = action {
                sink.lock().expect("failures lock").push(reason.clone());
            }
        }));
        let node = ProcessNode::new(
            plan("sh", &["-c", "exit 3"], &closed_port().await, Duration::from_secs(5)),
            bus.clone(),
        );

        let error = node.start().await.expect_err("must fail");

        assert!(error.contains("exited before becoming reachable"), "{error}");
        assert_eq!(failures.lock().expect("failures lock").len(), 1);
        assert_eq!(bus.node_state(NodeKind::Swarm), NodeReadinessState::Enabling);
    }

    #[tokio::test]
    async fn start_times_out_when_probe_never_succeeds() {
        let bus = Arc::new(DispatchBus::new());
        let node = ProcessNode::new(
            plan("sleep", &["30"], &closed_port().await, Duration::from_millis(400)),
            bus,
        );

        let error = node.start().await.expect_err("must time out");

        assert!(error.contains("Timed out"), "{error}");
        assert!(node.lock_child().is_none());
    }

    #[tokio::test]
    async fn start_fails_for_missing_binary() {
        let bus = Arc::new(DispatchBus::new());
        let node = ProcessNode::new(
            plan(
                "mist-test-binary-that-does-not-exist",
                &[],
                "127.0.0.1:1",
                Duration::from_secs(1),
            ),
            bus,
        );

        let error = node.start().await.expect_err("must fail");
        assert!(error.contains("Failed to spawn swarm"), "{error}");
    }

    #[test]
    fn only_the_ethereum_node_keeps_a_connection() {
        let bus = Arc::new(DispatchBus::new());
        let swarm = ProcessNode::new(
            plan("swarm", &[], "127.0.0.1:8500", Duration::from_secs(1)),
            bus.clone(),
        );
        let mut geth_plan = plan("geth", &[], "127.0.0.1:8545", Duration::from_secs(1));
        geth_plan.kind = NodeKind::Ethereum;
        let geth = ProcessNode::new(geth_plan, bus);

        assert_eq!(swarm.connection_addr(), None);
        assert_eq!(geth.connection_addr(), Some("127.0.0.1:8545".to_string()));
    }
}
