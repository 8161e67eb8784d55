use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use crate::{append_runtime_log, runtime_paths, DESKTOP_STATE_FILE, SHELL_LOCALE_ENV};

const LOCALE_FIELD: &str = "locale";

#[derive(Debug, Clone, Copy)]
pub struct ShellTexts {
    pub menu_app: &'static str,
    pub menu_reload: &'static str,
    pub menu_quit: &'static str,
    pub menu_tabs: &'static str,
    pub menu_no_tabs: &'static str,
    pub untitled_tab: &'static str,
    pub swarm_error_title: &'static str,
    pub swarm_not_enabled: &'static str,
    pub swarm_pending_timeout: &'static str,
    pub swarm_start_failed: &'static str,
}

pub fn shell_texts_for_locale(locale: &str) -> ShellTexts {
    if locale == "zh-CN" {
        return ShellTexts {
            menu_app: "Mist",
            menu_reload: "重新加载",
            menu_quit: "退出",
            menu_tabs: "标签页",
            menu_no_tabs: "没有打开的标签页",
            untitled_tab: "未命名标签页",
            swarm_error_title: "Swarm 错误",
            swarm_not_enabled: "Swarm 服务未启用。请先启用 Swarm 再打开 bzz 地址。",
            swarm_pending_timeout: "等待 Swarm 启动超时。",
            swarm_start_failed: "Swarm 启动失败。",
        };
    }

    ShellTexts {
        menu_app: "Mist",
        menu_reload: "Reload",
        menu_quit: "Quit",
        menu_tabs: "Tabs",
        menu_no_tabs: "No open tabs",
        untitled_tab: "Untitled tab",
        swarm_error_title: "Swarm error",
        swarm_not_enabled: "Swarm is not enabled. Enable Swarm before opening bzz addresses.",
        swarm_pending_timeout: "Timed out waiting for Swarm to start.",
        swarm_start_failed: "Swarm failed to start.",
    }
}

pub fn resolve_shell_locale(
    default_shell_locale: &'static str,
    root_dir: Option<PathBuf>,
) -> &'static str {
    if let Some(locale) = read_cached_shell_locale(root_dir.as_deref()) {
        return locale;
    }

    for env_key in [SHELL_LOCALE_ENV, "LC_ALL", "LANG"] {
        if let Ok(value) = env::var(env_key) {
            if let Some(locale) = normalize_shell_locale(&value) {
                return locale;
            }
        }
    }

    default_shell_locale
}

pub fn normalize_shell_locale(raw: &str) -> Option<&'static str> {
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.starts_with("zh") {
        return Some("zh-CN");
    }
    if lowered.starts_with("en") {
        return Some("en-US");
    }
    None
}

fn desktop_state_path(root_dir: Option<&Path>) -> Option<PathBuf> {
    root_dir.map(|root| runtime_paths::data_file_path(root, DESKTOP_STATE_FILE))
}

fn read_cached_shell_locale(root_dir: Option<&Path>) -> Option<&'static str> {
    let state_path = desktop_state_path(root_dir)?;
    let raw = fs::read_to_string(state_path).ok()?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    normalize_shell_locale(parsed.get(LOCALE_FIELD)?.as_str()?)
}

/// Stores (or with `None`/an unsupported value, clears) the cached locale in
/// the desktop state file, preserving any other fields in it.
pub fn write_cached_shell_locale(
    locale: Option<&str>,
    root_dir: Option<&Path>,
) -> Result<(), String> {
    let normalized_locale = locale.and_then(normalize_shell_locale);
    if let Some(raw_locale) = locale {
        if normalized_locale.is_none() {
            append_runtime_log(&format!(
                "unsupported shell locale '{raw_locale}'; clearing cached locale"
            ));
        }
    }

    let Some(state_path) = desktop_state_path(root_dir) else {
        append_runtime_log("shell locale state path is unavailable; skipping locale persistence");
        return Ok(());
    };

    if let Some(parent_dir) = state_path.parent() {
        fs::create_dir_all(parent_dir).map_err(|error| {
            format!(
                "Failed to create shell locale directory {}: {}",
                parent_dir.display(),
                error
            )
        })?;
    }

    let mut object = match fs::read_to_string(&state_path) {
        Ok(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                append_runtime_log(&format!(
                    "desktop state {} is not a JSON object; resetting state file",
                    state_path.display()
                ));
                Map::new()
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Map::new(),
        Err(error) => {
            return Err(format!(
                "Failed to read shell locale state {}: {}",
                state_path.display(),
                error
            ));
        }
    };

    match normalized_locale {
        Some(normalized_locale) => {
            object.insert(
                LOCALE_FIELD.to_string(),
                Value::String(normalized_locale.to_string()),
            );
        }
        None => {
            object.remove(LOCALE_FIELD);
        }
    }

    let serialized = serde_json::to_string_pretty(&Value::Object(object))
        .map_err(|error| format!("Failed to serialize shell locale state: {error}"))?;
    fs::write(&state_path, serialized).map_err(|error| {
        format!(
            "Failed to write shell locale state {}: {}",
            state_path.display(),
            error
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_texts_default_to_english() {
        let texts = shell_texts_for_locale("fr-FR");
        assert_eq!(texts.menu_quit, "Quit");
        assert_eq!(texts.menu_tabs, "Tabs");
        assert!(texts.swarm_not_enabled.contains("not enabled"));
    }

    #[test]
    fn shell_texts_for_zh_cn_are_translated() {
        let texts = shell_texts_for_locale("zh-CN");
        assert_eq!(texts.menu_quit, "退出");
        assert_eq!(texts.menu_tabs, "标签页");
    }

    #[test]
    fn normalize_shell_locale_accepts_language_prefixes() {
        assert_eq!(normalize_shell_locale("EN_us.UTF-8"), Some("en-US"));
        assert_eq!(normalize_shell_locale(" zh_TW "), Some("zh-CN"));
        assert_eq!(normalize_shell_locale("de-DE"), None);
        assert_eq!(normalize_shell_locale(""), None);
    }

    #[test]
    fn cached_locale_round_trips_and_keeps_other_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state_path = runtime_paths::data_file_path(dir.path(), DESKTOP_STATE_FILE);
        fs::create_dir_all(state_path.parent().expect("parent")).expect("mkdir");
        fs::write(&state_path, r#"{"windowWidth": 1024}"#).expect("seed state");

        write_cached_shell_locale(Some("zh_CN"), Some(dir.path())).expect("write locale");
        assert_eq!(read_cached_shell_locale(Some(dir.path())), Some("zh-CN"));
        assert_eq!(
            resolve_shell_locale("en-US", Some(dir.path().to_path_buf())),
            "zh-CN"
        );

        write_cached_shell_locale(None, Some(dir.path())).expect("clear locale");
        assert_eq!(read_cached_shell_locale(Some(dir.path())), None);
        let parsed: Value =
            serde_json::from_str(&fs::read_to_string(&state_path).expect("read state"))
                .expect("parse state");
        assert_eq!(parsed["windowWidth"], 1024);
    }

    #[test]
    fn write_resets_non_object_state_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state_path = runtime_paths::data_file_path(dir.path(), DESKTOP_STATE_FILE);
        fs::create_dir_all(state_path.parent().expect("parent")).expect("mkdir");
        fs::write(&state_path, "[1, 2, 3]").expect("seed state");

        write_cached_shell_locale(Some("en-US"), Some(dir.path())).expect("write locale");

        assert_eq!(read_cached_shell_locale(Some(dir.path())), Some("en-US"));
    }
}
