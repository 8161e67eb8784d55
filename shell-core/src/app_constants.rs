use std::time::Duration;

pub const ROOT_ENV: &str = "MIST_ROOT";
pub const DEFAULT_ROOT_DIR_NAME: &str = ".mist";
pub const DATA_DIR_NAME: &str = "data";
pub const LOGS_DIR_NAME: &str = "logs";
pub const DESKTOP_STATE_FILE: &str = "desktop_state.json";
pub const TABS_STATE_FILE: &str = "tabs.json";

pub const DESKTOP_LOG_FILE: &str = "desktop.log";
pub const DESKTOP_LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const LOG_BACKUP_COUNT: usize = 5;

pub const DEFAULT_SHELL_LOCALE: &str = "en-US";
pub const SHELL_LOCALE_ENV: &str = "MIST_DESKTOP_LOCALE";

pub const SWARM_SCHEME: &str = "bzz";
pub const DEFAULT_SWARM_GATEWAY_URL: &str = "http://localhost:8500";
pub const SWARM_GATEWAY_URL_ENV: &str = "MIST_SWARM_GATEWAY_URL";
pub const SWARM_PENDING_TIMEOUT_ENV: &str = "MIST_SWARM_PENDING_TIMEOUT_MS";
pub const DEFAULT_SWARM_PENDING_TIMEOUT_MS: u64 = 30_000;
pub const SWARM_PENDING_TIMEOUT_MAX_MS: u64 = 600_000;

pub const NODE_AUTO_START_ENV: &str = "MIST_NODE_AUTO_START";
pub const GETH_CMD_ENV: &str = "MIST_GETH_CMD";
pub const GETH_PROBE_ADDR_ENV: &str = "MIST_GETH_PROBE_ADDR";
pub const DEFAULT_GETH_CMD: &str = "geth --http --http.addr 127.0.0.1 --http.port 8545";
pub const DEFAULT_GETH_PROBE_ADDR: &str = "127.0.0.1:8545";
pub const SWARM_CMD_ENV: &str = "MIST_SWARM_CMD";
pub const SWARM_PROBE_ADDR_ENV: &str = "MIST_SWARM_PROBE_ADDR";
pub const DEFAULT_SWARM_CMD: &str = "swarm --bzzport 8500";
pub const DEFAULT_SWARM_PROBE_ADDR: &str = "127.0.0.1:8500";

pub const NODE_READY_TIMEOUT_ENV: &str = "MIST_NODE_READY_TIMEOUT_MS";
pub const DEFAULT_NODE_READY_TIMEOUT_MS: u64 = 60_000;
pub const NODE_READY_TIMEOUT_MIN_MS: u64 = 1_000;
pub const NODE_READY_TIMEOUT_MAX_MS: u64 = 600_000;
pub const NODE_READY_POLL_INTERVAL: Duration = Duration::from_millis(300);
pub const NODE_PROBE_TIMEOUT: Duration = Duration::from_millis(800);

pub const TAB_REFRESH_DEBOUNCE_ENV: &str = "MIST_TAB_REFRESH_DEBOUNCE_MS";
pub const DEFAULT_TAB_REFRESH_DEBOUNCE_MS: u64 = 1_000;
pub const TAB_REFRESH_DEBOUNCE_MIN_MS: u64 = 50;
pub const TAB_REFRESH_DEBOUNCE_MAX_MS: u64 = 60_000;

pub const SOCKET_DRAIN_GRACE: Duration = Duration::from_millis(500);
pub const SOCKET_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

pub const TAB_MENU_LABEL_MAX_CHARS: usize = 48;
pub const TAB_MENU_ACCELERATOR_LIMIT: usize = 9;
