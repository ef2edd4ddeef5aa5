const APP_NAME: &str = "memegen";

/// Desktop notification for a finished export; failures are only logged.
pub(super) fn send_export_complete(path: &std::path::Path) {
    let body = format!("Saved {}", path.display());
    if let Err(err) = notify_rust::Notification::new()
        .appname(APP_NAME)
        .summary("Export complete")
        .body(&body)
        .show()
    {
        tracing::warn!("system notification failed: {err}");
    }
}
