use mist_shell_core::{logging, runtime_paths, DESKTOP_LOG_FILE, SWARM_SCHEME};
use tauri::{Manager, RunEvent};

use crate::{
    append_startup_log, bus_bridge, error_dialog, exit_events, menu_handler, scheme_protocol,
    shell_services, window_actions,
};

pub(crate) fn run() {
    append_startup_log("desktop process starting");
    append_startup_log(&format!(
        "desktop log path: {}",
        logging::resolve_desktop_log_path(runtime_paths::default_root_dir(), DESKTOP_LOG_FILE)
            .display()
    ));

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            append_startup_log("second instance launched; focusing main window");
            window_actions::show_main_window(app);
        }))
        .plugin(tauri_plugin_dialog::init())
        .register_asynchronous_uri_scheme_protocol(SWARM_SCHEME, |ctx, request, responder| {
            scheme_protocol::handle_swarm_request(ctx.app_handle(), request, responder)
        })
        .invoke_handler(tauri::generate_handler![
            crate::desktop_bridge_commands::desktop_bridge_is_desktop_runtime,
            crate::desktop_bridge_commands::desktop_bridge_get_app_state,
            crate::desktop_bridge_commands::desktop_bridge_list_tabs,
            crate::desktop_bridge_commands::desktop_bridge_insert_tab,
            crate::desktop_bridge_commands::desktop_bridge_update_tab,
            crate::desktop_bridge_commands::desktop_bridge_delete_tab,
            crate::desktop_bridge_commands::desktop_bridge_set_shell_locale,
            crate::desktop_bridge_commands::desktop_bridge_quit,
        ])
        .on_menu_event(|app, event| menu_handler::handle_menu_event(app, event.id().as_ref()))
        .setup(|app| {
            let app_handle = app.handle().clone();
            let runtime =
                tauri::async_runtime::block_on(async { tokio::runtime::Handle::current() });

            let services = match shell_services::build_shell_services(&app_handle, runtime) {
                Ok(services) => services,
                Err(error) => {
                    error_dialog::show_startup_error(&app_handle, &error);
                    return Err(error.into());
                }
            };
            bus_bridge::attach(&app_handle, &services.bus);
            let sequencer = services.sequencer();
            app.manage(services);

            exit_events::install_signal_handlers(&app_handle);
            exit_events::install_panic_hook(&app_handle);

            tauri::async_runtime::spawn(async move {
                if let Err(error) = sequencer.run().await {
                    append_startup_log(&format!("bootstrap aborted: {error}"));
                    error_dialog::show_error_dialog(&app_handle, "Mist", &error);
                }
            });
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| match event {
            RunEvent::ExitRequested { code, api, .. } => {
                exit_events::handle_exit_requested(app_handle, code, &api);
            }
            RunEvent::Exit => {
                exit_events::handle_exit_event(app_handle);
            }
            _ => {}
        });
}
