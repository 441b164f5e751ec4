use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("garble");
            Some(state_dir.join("scores.db"))
        } else {
            ProjectDirs::from("", "", "garble")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("scores.db"))
        }
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "garble") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("garble_config.json")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path_ends_with_scores_db() {
        let path = AppDirs::db_path().unwrap();
        assert!(path.ends_with("scores.db") || path.to_string_lossy().ends_with("scores.db"));
    }

    #[test]
    fn test_config_path_is_json() {
        assert_eq!(
            AppDirs::config_path().extension().and_then(|e| e.to_str()),
            Some("json")
        );
    }
}
