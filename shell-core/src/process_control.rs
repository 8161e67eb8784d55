#[cfg(target_os = "windows")]
use std::process::Stdio;

use tokio::process::Child;

use crate::append_node_log;

/// Kills a node process (and on Windows its whole process tree) and reaps it.
pub async fn stop_child_process(child: &mut Child, name: &str) -> Result<(), String> {
    #[cfg(target_os = "windows")]
    {
        if let Some(pid) = child.id() {
            let status = tokio::process::Command::new("taskkill")
                .args(["/pid", &pid.to_string(), "/t", "/f"])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            if let Err(error) = status {
                append_node_log(&format!("taskkill for {name} (pid {pid}) failed: {error}"));
            }
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Err(error) = child.start_kill() {
            append_node_log(&format!("failed to signal {name} for shutdown: {error}"));
        }
    }

    match child.wait().await {
        Ok(status) => {
            append_node_log(&format!("{name} exited: {status}"));
            Ok(())
        }
        Err(error) => Err(format!("Failed to wait for {name} to exit: {error}")),
    }
}
