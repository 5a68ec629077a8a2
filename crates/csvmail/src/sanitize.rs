//! Helpers for turning untrusted attachment names into safe local paths.

/// Makes an attachment filename safe to join onto a local directory.
///
/// Path separators (`/`, `\`) and parent-directory sequences (`..`) are each
/// replaced by `_`, so the result can never escape the target directory.
/// Everything else is kept verbatim.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .replace('/', "_")
        .replace('\\', "_")
        .replace("..", "_")
}
