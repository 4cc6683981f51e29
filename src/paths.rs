use std::path::PathBuf;

const APP_DIR: &str = "nota";

/// Directory the store defaults to when `--store-dir` is not given:
/// the platform data directory, `nota/notes` underneath.
pub fn default_store_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR)
            .join("notes")
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join("Library")
            .join("Application Support")
            .join(APP_DIR)
            .join("notes")
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        if let Some(data_home) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
            return data_home.join(APP_DIR).join("notes");
        }
        home_or_tmp().join(".local").join("share").join(APP_DIR).join("notes")
    }
}

pub fn user_log_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR)
            .join("logs")
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join("Library")
            .join("Logs")
            .join(APP_DIR)
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        if let Some(state_home) = std::env::var_os("XDG_STATE_HOME").map(PathBuf::from) {
            return state_home.join(APP_DIR).join("logs");
        }
        home_or_tmp().join(".local").join("state").join(APP_DIR).join("logs")
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn home_or_tmp() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}
