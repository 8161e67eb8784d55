use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use url::Url;

use crate::{
    logging, node_readiness::NodeKind, DEFAULT_GETH_CMD, DEFAULT_GETH_PROBE_ADDR,
    DEFAULT_NODE_READY_TIMEOUT_MS, DEFAULT_SWARM_CMD, DEFAULT_SWARM_GATEWAY_URL,
    DEFAULT_SWARM_PENDING_TIMEOUT_MS, DEFAULT_SWARM_PROBE_ADDR, DEFAULT_TAB_REFRESH_DEBOUNCE_MS,
    GETH_CMD_ENV, GETH_PROBE_ADDR_ENV, NODE_AUTO_START_ENV, NODE_READY_TIMEOUT_ENV,
    NODE_READY_TIMEOUT_MAX_MS, NODE_READY_TIMEOUT_MIN_MS, SWARM_CMD_ENV, SWARM_GATEWAY_URL_ENV,
    SWARM_PENDING_TIMEOUT_ENV, SWARM_PENDING_TIMEOUT_MAX_MS, SWARM_PROBE_ADDR_ENV,
    TAB_REFRESH_DEBOUNCE_ENV, TAB_REFRESH_DEBOUNCE_MAX_MS, TAB_REFRESH_DEBOUNCE_MIN_MS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLaunchPlan {
    pub kind: NodeKind,
    pub cmd: String,
    pub args: Vec<String>,
    pub probe_addr: String,
    pub ready_timeout: Duration,
    pub log_path: Option<PathBuf>,
}

impl NodeLaunchPlan {
    pub fn debug_command(&self) -> Vec<String> {
        let mut parts = vec![self.cmd.clone()];
        parts.extend(self.args.clone());
        parts
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn parse_command_line(raw: &str, source: &str) -> Result<(String, Vec<String>), String> {
    let mut pieces = shlex::split(raw).ok_or_else(|| format!("Invalid {source}: {raw}"))?;
    if pieces.is_empty() {
        return Err(format!("{source} is empty."));
    }
    let cmd = pieces.remove(0);
    Ok((cmd, pieces))
}

pub fn parse_bounded_ms(raw: Option<&str>, default_ms: u64, min_ms: u64, max_ms: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default_ms)
        .clamp(min_ms, max_ms)
}

/// Like [`parse_bounded_ms`] but `0` switches the timeout off.
pub fn parse_optional_timeout_ms(raw: Option<&str>, default_ms: u64, max_ms: u64) -> Option<Duration> {
    let parsed = raw
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default_ms);
    if parsed == 0 {
        return None;
    }
    Some(Duration::from_millis(parsed.min(max_ms)))
}

pub fn is_auto_start_enabled(raw: Option<&str>) -> bool {
    !matches!(raw.map(str::trim), Some("0") | Some("false"))
}

pub fn normalize_gateway_url(raw: &str, default_url: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return default_url.to_string();
    }

    match Url::parse(trimmed) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
            parsed.as_str().trim_end_matches('/').to_string()
        }
        _ => default_url.to_string(),
    }
}

pub fn node_auto_start_enabled() -> bool {
    is_auto_start_enabled(env_value(NODE_AUTO_START_ENV).as_deref())
}

pub fn resolve_swarm_gateway_url() -> String {
    normalize_gateway_url(
        &env_value(SWARM_GATEWAY_URL_ENV).unwrap_or_default(),
        DEFAULT_SWARM_GATEWAY_URL,
    )
}

pub fn resolve_swarm_pending_timeout() -> Option<Duration> {
    parse_optional_timeout_ms(
        env_value(SWARM_PENDING_TIMEOUT_ENV).as_deref(),
        DEFAULT_SWARM_PENDING_TIMEOUT_MS,
        SWARM_PENDING_TIMEOUT_MAX_MS,
    )
}

pub fn resolve_tab_refresh_debounce() -> Duration {
    Duration::from_millis(parse_bounded_ms(
        env_value(TAB_REFRESH_DEBOUNCE_ENV).as_deref(),
        DEFAULT_TAB_REFRESH_DEBOUNCE_MS,
        TAB_REFRESH_DEBOUNCE_MIN_MS,
        TAB_REFRESH_DEBOUNCE_MAX_MS,
    ))
}

pub fn resolve_node_launch_plan(
    kind: NodeKind,
    root_dir: Option<&Path>,
) -> Result<NodeLaunchPlan, String> {
    let (cmd_env, default_cmd, probe_env, default_probe) = match kind {
        NodeKind::Ethereum => (
            GETH_CMD_ENV,
            DEFAULT_GETH_CMD,
            GETH_PROBE_ADDR_ENV,
            DEFAULT_GETH_PROBE_ADDR,
        ),
        NodeKind::Swarm => (
            SWARM_CMD_ENV,
            DEFAULT_SWARM_CMD,
            SWARM_PROBE_ADDR_ENV,
            DEFAULT_SWARM_PROBE_ADDR,
        ),
    };

    let (cmd, args) = match env_value(cmd_env) {
        Some(custom) => parse_command_line(&custom, cmd_env)?,
        None => parse_command_line(default_cmd, "default node command")?,
    };
    let ready_timeout = Duration::from_millis(parse_bounded_ms(
        env_value(NODE_READY_TIMEOUT_ENV).as_deref(),
        DEFAULT_NODE_READY_TIMEOUT_MS,
        NODE_READY_TIMEOUT_MIN_MS,
        NODE_READY_TIMEOUT_MAX_MS,
    ));

    Ok(NodeLaunchPlan {
        kind,
        cmd,
        args,
        probe_addr: env_value(probe_env).unwrap_or_else(|| default_probe.to_string()),
        ready_timeout,
        log_path: logging::node_log_path(root_dir, kind.process_name()),
    })
}
