use crate::backup;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::core::select_workspace;
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::path::PathBuf;

fn target_workspace(state: &AppState, params: &Value) -> Result<PathBuf, HandlerErr> {
    params
        .get("workspacePath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .or_else(|| state.workspace.clone())
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

fn export_bundle(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let out_path = required_str(params, "outPath")?;
    let workspace_path = target_workspace(state, params)?;

    if let Some(conn) = state.db.as_ref() {
        let _ = conn.execute_batch("PRAGMA wal_checkpoint(FULL)");
    }

    let export = backup::export_workspace_bundle(&workspace_path, &PathBuf::from(&out_path))
        .map_err(|e| {
            HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": out_path }))
        })?;
    Ok(json!({
        "ok": true,
        "path": out_path,
        "bundleFormat": export.bundle_format,
        "entryCount": export.entry_count,
        "dbSha256": export.db_sha256,
    }))
}

/// Reopens the workspace that was current before a failed import. When that
/// fails too the workspace is deselected, so no request sees a half-open state.
fn reopen_previous(state: &mut AppState) {
    let Some(previous) = state.workspace.clone() else {
        return;
    };
    if let Err(e) = select_workspace(state, &previous) {
        tracing::error!(workspace = %previous.display(), "cannot reopen workspace: {e:#}");
        state.workspace = None;
        state.db = None;
    }
}

fn import_bundle(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let in_path = required_str(params, "inPath")?;
    let workspace_path = target_workspace(state, params)?;

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return Err(HandlerErr::new("not_found", "bundle file not found")
            .with_details(json!({ "path": in_path })));
    }

    // Release the open handle before the file is replaced.
    state.db = None;

    let import = match backup::import_workspace_bundle(&src, &workspace_path) {
        Ok(v) => v,
        Err(e) => {
            reopen_previous(state);
            return Err(HandlerErr::new("io_failed", format!("{e:#}"))
                .with_details(json!({ "path": in_path })));
        }
    };
    if let Err(e) = select_workspace(state, &workspace_path) {
        reopen_previous(state);
        return Err(HandlerErr::new("db_open_failed", format!("{e:#}"))
            .with_details(json!({ "workspacePath": workspace_path.to_string_lossy() })));
    }

    Ok(json!({
        "ok": true,
        "workspacePath": workspace_path.to_string_lossy(),
        "bundleFormatDetected": import.bundle_format_detected,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "backup.exportWorkspaceBundle" => export_bundle(state, &req.params),
        "backup.importWorkspaceBundle" => import_bundle(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
