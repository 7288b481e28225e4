use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Dermadesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tracing filter used when RUST_LOG is not set
pub fn default_log_filter() -> &'static str {
    "dermadesk=info"
}

/// Get the application data directory
/// ~/Dermadesk/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Dermadesk")
}

/// Default location of the clinic database
pub fn database_path() -> PathBuf {
    app_data_dir().join("dermadesk.db")
}

/// Directory receipt PDFs are exported to
pub fn exports_dir() -> PathBuf {
    app_data_dir().join("exports")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Dermadesk"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("dermadesk.db"));
    }

    #[test]
    fn exports_dir_under_app_data() {
        let exports = exports_dir();
        assert!(exports.starts_with(app_data_dir()));
        assert!(exports.ends_with("exports"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
