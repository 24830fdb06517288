use crate::menu::WindowMessage;
use std::path::Path;

/// Result type for trait operations that may be unsupported.
pub type CapResult<T> = Result<T, CapError>;

#[derive(Debug, thiserror::Error)]
pub enum CapError {
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("dependency missing: {0}")]
    DependencyMissing(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Filesystem operations
// ---------------------------------------------------------------------------

pub trait FilesystemOps: Send + Sync {
    fn read_file(&self, path: &Path) -> CapResult<Vec<u8>>;
    fn write_file(&self, path: &Path, data: &[u8]) -> CapResult<()>;
    /// Replace `to` with `from` in one step.
    fn rename(&self, from: &Path, to: &Path) -> CapResult<()>;
    fn remove_dir_all(&self, path: &Path) -> CapResult<()>;
    fn exists(&self, path: &Path) -> bool;
}

// ---------------------------------------------------------------------------
// Host window / shell operations driven by the application menu
// ---------------------------------------------------------------------------

/// Everything a menu click can ask of the host. The host owns the actual
/// windows; the engine only decides what to ask for.
pub trait MenuHost: Send + Sync {
    /// Forward a message to the focused app window.
    fn send_to_window(&self, message: &WindowMessage) -> CapResult<()>;

    fn toggle_full_screen(&self) -> CapResult<()>;

    /// Reload the container window itself rather than the hosted page.
    fn reload_container(&self) -> CapResult<()>;

    fn toggle_container_dev_tools(&self) -> CapResult<()>;

    fn open_external(&self, url: &str) -> CapResult<()>;

    /// Ask the user a yes/no question. `false` means cancel.
    fn confirm(&self, title: &str, message: &str) -> bool;

    /// Clear cookies, local storage etc. for a session partition.
    fn clear_storage_data(&self, partition: &str) -> CapResult<()>;

    fn quit(&self) -> CapResult<()>;
}
