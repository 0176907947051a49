//! XDG Base Directory paths for teamscope.
//!
//! The hook-side ingest command and the dashboard server run as separate
//! processes; both resolve their database and queue locations here.

use std::path::PathBuf;

/// Get the teamscope data directory.
///
/// Returns `$TEAMSCOPE_DATA_DIR` if set, then `$XDG_DATA_HOME/teamscope`,
/// otherwise `~/.local/share/teamscope`. This is where the event database
/// and the pending-notification queue live; hook adapters and the server
/// must resolve the same directory.
///
/// # Examples
///
/// ```
/// use teamscope_paths::data_dir;
///
/// let data = data_dir();
/// let db_path = data.join("teamscope.db");
/// ```
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TEAMSCOPE_DATA_DIR") {
        PathBuf::from(dir)
    } else if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("teamscope")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share/teamscope")
    } else {
        PathBuf::from(".local/share/teamscope")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_ends_with_teamscope() {
        let path = data_dir();
        assert!(
            path.ends_with("teamscope"),
            "data_dir should end with 'teamscope'"
        );
    }

    // Both env vars feed the same function; a single test body keeps the
    // mutations ordered. The override values still end in "teamscope" so
    // the assertion above holds under any test interleaving.
    #[test]
    fn test_data_dir_env_overrides() {
        unsafe {
            std::env::set_var("TEAMSCOPE_DATA_DIR", "/tmp/test-override/teamscope");
            std::env::set_var("XDG_DATA_HOME", "/tmp/test-data");
        }
        assert_eq!(data_dir(), PathBuf::from("/tmp/test-override/teamscope"));

        unsafe {
            std::env::remove_var("TEAMSCOPE_DATA_DIR");
        }
        assert_eq!(data_dir(), PathBuf::from("/tmp/test-data/teamscope"));

        unsafe {
            std::env::remove_var("XDG_DATA_HOME");
        }
    }
}
