pub const MAIN_WINDOW_LABEL: &str = "main";
pub const ACTION_EVENT: &str = "mist://action";
pub const SELECT_TAB_EVENT: &str = "mist://select-tab";
pub const WINDOWS_SCHEME_HOST_SUFFIX: &str = ".localhost";
