use std::collections::HashMap;

/// Which store backend the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Rest,
    Memory,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
    #[error("CRESCENT_STORE=memory requires the inmem-store feature")]
    MemoryStoreUnavailable,
}

/// Connection details for the managed backend. Never logged.
#[derive(Clone)]
pub struct StoreSecrets {
    pub url: String,
    pub key: String,
}

impl std::fmt::Debug for StoreSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSecrets").field("url", &self.url).field("key", &"<redacted>").finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreKind,
    pub secrets: Option<StoreSecrets>,
    pub table: String,
    pub bind_addr: String,
    pub port: u16,
    pub enable_hsts: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Builds the config from an explicit variable map; `from_env` feeds it the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(&vars, name);

        let store = match get("CRESCENT_STORE").unwrap_or("rest") {
            "rest" => StoreKind::Rest,
            "memory" if cfg!(feature = "inmem-store") => StoreKind::Memory,
            "memory" => return Err(ConfigError::MemoryStoreUnavailable),
            other => return Err(ConfigError::Invalid { name: "CRESCENT_STORE", value: other.to_string() }),
        };

        let secrets = match (get("SUPABASE_URL"), get("SUPABASE_KEY")) {
            (Some(url), Some(key)) => Some(StoreSecrets { url: url.to_string(), key: key.to_string() }),
            (url, key) if store == StoreKind::Rest => {
                let mut missing = Vec::new();
                if url.is_none() { missing.push("SUPABASE_URL"); }
                if key.is_none() { missing.push("SUPABASE_KEY"); }
                return Err(ConfigError::Missing(missing));
            }
            _ => None,
        };
        if let Some(s) = &secrets {
            if !(s.url.starts_with("https://") || s.url.starts_with("http://")) {
                return Err(ConfigError::Invalid { name: "SUPABASE_URL", value: s.url.clone() });
            }
        }

        let port = match get("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid { name: "PORT", value: p.to_string() })?,
            None => 8080,
        };

        Ok(Self {
            store,
            secrets,
            table: get("SIGHTINGS_TABLE").unwrap_or("sightings").to_string(),
            bind_addr: get("BIND_ADDR").unwrap_or("0.0.0.0").to_string(),
            port,
            enable_hsts: get("ENABLE_HSTS").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false),
        })
    }
}

fn lookup<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn rest_store_needs_both_secrets() {
        let err = AppConfig::from_vars(vars(&[("SUPABASE_URL", "https://x.supabase.co")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec!["SUPABASE_KEY"]));
        assert_eq!(err.to_string(), "missing required environment variables: SUPABASE_KEY");

        let err = AppConfig::from_vars(vars(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec!["SUPABASE_URL", "SUPABASE_KEY"]));
    }

    #[test]
    fn defaults_apply() {
        let cfg = AppConfig::from_vars(vars(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_KEY", "anon"),
        ])).unwrap();
        assert_eq!(cfg.store, StoreKind::Rest);
        assert_eq!(cfg.table, "sightings");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.bind_addr, "0.0.0.0");
        assert!(!cfg.enable_hsts);
    }

    #[test]
    fn rejects_bad_port_and_url() {
        let err = AppConfig::from_vars(vars(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_KEY", "anon"),
            ("PORT", "eighty"),
        ])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = AppConfig::from_vars(vars(&[("SUPABASE_URL", "x.supabase.co"), ("SUPABASE_KEY", "k")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SUPABASE_URL", .. }));
    }

    #[test]
    fn debug_output_hides_key() {
        let s = StoreSecrets { url: "https://x".into(), key: "very-secret".into() };
        assert!(!format!("{s:?}").contains("very-secret"));
    }

    #[cfg(feature = "inmem-store")]
    #[test]
    fn memory_store_skips_secrets() {
        let cfg = AppConfig::from_vars(vars(&[("CRESCENT_STORE", "memory"), ("ENABLE_HSTS", "true")])).unwrap();
        assert_eq!(cfg.store, StoreKind::Memory);
        assert!(cfg.secrets.is_none());
        assert!(cfg.enable_hsts);
    }
}
