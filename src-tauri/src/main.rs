#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_menu;
mod app_runtime;
mod app_types;
mod bus_bridge;
mod desktop_bridge_commands;
mod error_dialog;
mod exit_events;
mod menu_handler;
mod scheme_protocol;
mod shell_services;
mod ui_dispatch;
mod window_actions;

pub(crate) use app_constants::*;
pub(crate) use app_types::{BridgeResult, ShellServices};
pub(crate) use mist_shell_core::{
    append_menu_log, append_runtime_log, append_shutdown_log, append_startup_log,
};

fn main() {
    app_runtime::run();
}
