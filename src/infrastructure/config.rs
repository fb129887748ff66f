use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Root directory for uploaded profile images and their variants
    pub storage_dir: PathBuf,
    /// Directory served at `/` for static assets
    pub static_dir: PathBuf,
    /// Public path of the image shown when a user has none attached
    pub default_profile_image: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://bookers.db?mode=rwc".to_string(),
            port: 3000,
            cors_allowed_origins: Vec::new(),
            storage_dir: PathBuf::from("storage"),
            static_dir: PathBuf::from("static"),
            default_profile_image: "/assets/no_image.png".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            default_profile_image: env::var("DEFAULT_PROFILE_IMAGE")
                .unwrap_or(defaults.default_profile_image),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "DATABASE_URL",
        "PORT",
        "CORS_ALLOWED_ORIGINS",
        "STORAGE_DIR",
        "STATIC_DIR",
        "DEFAULT_PROFILE_IMAGE",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env();
        assert_eq!(config.database_url, "sqlite://bookers.db?mode=rwc");
        assert_eq!(config.port, 3000);
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(config.storage_dir, PathBuf::from("storage"));
        assert_eq!(config.default_profile_image, "/assets/no_image.png");
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        unsafe {
            env::set_var("PORT", "8080");
            env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,");
            env::set_var("STORAGE_DIR", "/tmp/bookers");
        }
        let config = Config::from_env();
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/bookers"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_falls_back() {
        clear_env();
        unsafe { env::set_var("PORT", "not-a-port") };
        assert_eq!(Config::from_env().port, 3000);
        clear_env();
    }
}
