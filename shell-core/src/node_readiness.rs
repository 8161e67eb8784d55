use serde::{Deserialize, Serialize};

/// The embedded node subsystems whose lifecycle the shell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Ethereum,
    Swarm,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Swarm => "swarm",
        }
    }

    pub fn process_name(self) -> &'static str {
        match self {
            Self::Ethereum => "geth",
            Self::Swarm => "swarm",
        }
    }
}

/// Readiness of one node subsystem. The only legal moves follow the cycle
/// `Disabled -> Enabling -> Enabled -> Disabling -> Disabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeReadinessState {
    #[default]
    Disabled,
    Enabling,
    Enabled,
    Disabling,
}

impl NodeReadinessState {
    pub fn successor(self) -> Self {
        match self {
            Self::Disabled => Self::Enabling,
            Self::Enabling => Self::Enabled,
            Self::Enabled => Self::Disabling,
            Self::Disabling => Self::Disabled,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.successor() == target
    }

    pub fn routes_requests(self) -> bool {
        self == Self::Enabled
    }

    pub fn defers_requests(self) -> bool {
        self == Self::Enabling
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Enabling => "enabling",
            Self::Enabled => "enabled",
            Self::Disabling => "disabling",
        }
    }
}
