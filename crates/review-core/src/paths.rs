use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const REVIEW_DIR: &str = ".review";
pub const CONFIG_FILE: &str = ".review/config.yaml";
pub const ROTATION_FILE: &str = ".review/rotation.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn review_dir(root: &Path) -> PathBuf {
    root.join(REVIEW_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn rotation_path(root: &Path) -> PathBuf {
    root.join(ROTATION_FILE)
}
