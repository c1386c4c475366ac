use crate::persistence::StorageKind;
use crate::services::leaderboard::Settings;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub storage: StorageKind,
    pub host: String,
    pub port: u16,
    pub cooldown_secs: i64,
    pub leaderboard_size: usize,
    pub admin_token: Option<String>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unparsable numbers fall back to
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let storage = match lookup("STORAGE_BACKEND").as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("sqlite") => StorageKind::Sqlite,
            _ => StorageKind::Json,
        };
        let default_path = match storage {
            StorageKind::Json => "leaderboard.json",
            StorageKind::Sqlite => "leaderboard.db",
        };

        Config {
            data_path: lookup("DATA_PATH")
                .unwrap_or_else(|| default_path.into())
                .into(),
            storage,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: lookup("PORT").and_then(|p| p.parse().ok()).unwrap_or(3001),
            cooldown_secs: lookup("SUBMIT_COOLDOWN_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|s: &i64| *s >= 0)
                .unwrap_or(30),
            leaderboard_size: lookup("LEADERBOARD_SIZE")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(10),
            admin_token: lookup("ADMIN_TOKEN").filter(|t| !t.is_empty()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            cooldown: chrono::Duration::seconds(self.cooldown_secs),
            top_n: self.leaderboard_size,
        }
    }

    /// The privileged-caller predicate: a non-empty configured token that
    /// matches the presented one exactly.
    pub fn is_admin(&self, presented: Option<&str>) -> bool {
        match (&self.admin_token, presented) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.data_path, PathBuf::from("leaderboard.json"));
        assert_eq!(cfg.storage, StorageKind::Json);
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.cooldown_secs, 30);
        assert_eq!(cfg.leaderboard_size, 10);
        assert!(cfg.admin_token.is_none());
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let cfg = config(&[
            ("PORT", "http"),
            ("SUBMIT_COOLDOWN_SECS", "-4"),
            ("LEADERBOARD_SIZE", "0"),
        ]);
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.cooldown_secs, 30);
        assert_eq!(cfg.leaderboard_size, 10);
    }

    #[test]
    fn test_sqlite_backend_default_path() {
        let cfg = config(&[("STORAGE_BACKEND", "SQLite")]);
        assert_eq!(cfg.storage, StorageKind::Sqlite);
        assert_eq!(cfg.data_path, PathBuf::from("leaderboard.db"));
    }

    #[test]
    fn test_admin_predicate() {
        assert!(!config(&[]).is_admin(Some("")));
        assert!(!config(&[("ADMIN_TOKEN", "")]).is_admin(Some("")));
        let cfg = config(&[("ADMIN_TOKEN", "s3cret")]);
        assert!(cfg.is_admin(Some("s3cret")));
        assert!(!cfg.is_admin(Some("guess")));
        assert!(!cfg.is_admin(None));
    }
}
