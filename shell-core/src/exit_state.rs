use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DrainStage {
    Sockets,
    NodesAndStorage,
}

/// Process-wide shutdown progress. Starts in `Running`, only ever moves
/// forward, and is never reset once `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", content = "stage", rename_all = "camelCase")]
pub enum ShutdownPhase {
    #[default]
    Running,
    Draining(DrainStage),
    Terminated,
}

impl ShutdownPhase {
    fn rank(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Draining(DrainStage::Sockets) => 1,
            Self::Draining(DrainStage::NodesAndStorage) => 2,
            Self::Terminated => 3,
        }
    }

    /// Each phase may only be entered from its immediate predecessor. The
    /// `Running -> Draining(Sockets)` move doubles as the one-shot latch.
    pub fn can_advance_to(self, target: Self) -> bool {
        target.rank() == self.rank() + 1
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    pub fn is_draining(self) -> bool {
        matches!(self, Self::Draining(_))
    }

    pub fn is_terminated(self) -> bool {
        self == Self::Terminated
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining(DrainStage::Sockets) => "draining(sockets)",
            Self::Draining(DrainStage::NodesAndStorage) => "draining(nodes+storage)",
            Self::Terminated => "terminated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    QuitRequested,
    AllWindowsClosed,
    OsSignal(&'static str),
    FatalError(String),
    InitializationFailure(String),
}

impl TerminationReason {
    pub fn describe(&self) -> String {
        match self {
            Self::QuitRequested => "quit requested".to_string(),
            Self::AllWindowsClosed => "all windows closed".to_string(),
            Self::OsSignal(signal) => format!("os signal {signal}"),
            Self::FatalError(error) => format!("fatal error: {error}"),
            Self::InitializationFailure(error) => format!("initialization failure: {error}"),
        }
    }
}

/// What the host should do with the exit attempt that raised a termination
/// signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationDecision {
    /// This signal won the latch: suppress the exit and run the drain.
    BeginDrain,
    /// A drain is already in flight: suppress the exit, do nothing else.
    AlreadyDraining,
    /// Draining finished: let the process exit.
    AllowExit,
}

impl TerminationDecision {
    pub fn should_prevent_exit(self) -> bool {
        !matches!(self, Self::AllowExit)
    }
}
