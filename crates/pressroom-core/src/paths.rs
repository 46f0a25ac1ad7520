use crate::error::{PressError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PRESSROOM_DIR: &str = ".pressroom";
pub const STATE_DB: &str = ".pressroom/state.redb";
pub const AUDIT_DB: &str = ".pressroom/audit.sqlite";
pub const CONFIG_FILE: &str = ".pressroom/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn pressroom_dir(root: &Path) -> PathBuf {
    root.join(PRESSROOM_DIR)
}

pub fn state_db_path(root: &Path) -> PathBuf {
    root.join(STATE_DB)
}

pub fn audit_db_path(root: &Path) -> PathBuf {
    root.join(AUDIT_DB)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn is_initialized(root: &Path) -> bool {
    pressroom_dir(root).is_dir()
}

// ---------------------------------------------------------------------------
// Engine name validation
// ---------------------------------------------------------------------------

static ENGINE_RE: OnceLock<Regex> = OnceLock::new();

fn engine_re() -> &'static Regex {
    ENGINE_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Engine names key heartbeat, run-state, and control-flag rows; they must be
/// lowercase alphanumeric slugs so they are safe in URLs and store keys.
pub fn validate_engine_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !engine_re().is_match(name) {
        return Err(PressError::InvalidSlug(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_engine_names() {
        for name in ["production-engine", "a", "engine-2", "x1"] {
            validate_engine_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_engine_names() {
        for name in [
            "",
            "-leading-dash",
            "trailing-dash-",
            "has spaces",
            "UPPER",
            "a_b",
        ] {
            assert!(validate_engine_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/shop");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/shop/.pressroom/config.yaml")
        );
        assert_eq!(
            state_db_path(root),
            PathBuf::from("/tmp/shop/.pressroom/state.redb")
        );
        assert_eq!(
            audit_db_path(root),
            PathBuf::from("/tmp/shop/.pressroom/audit.sqlite")
        );
    }
}
