pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    /// Marks the session cookie `Secure`; enable behind HTTPS.
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow::anyhow!("invalid DATABASE_MAX_CONNECTIONS: {}", raw))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let jwt_secret =
            lookup("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let session_ttl_hours = match lookup("SESSION_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| anyhow::anyhow!("invalid SESSION_TTL_HOURS: {}", raw))?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };
        let secure_cookies = lookup("SECURE_COOKIES")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            database_url,
            max_connections,
            jwt_secret,
            session_ttl_hours,
            secure_cookies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/posts"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl_hours, DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let base = [("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")];
        let mut bad_port = base.to_vec();
        bad_port.push(("PORT", "eighty"));
        assert!(AppConfig::from_lookup(lookup(&bad_port)).is_err());

        let mut bad_ttl = base.to_vec();
        bad_ttl.push(("SESSION_TTL_HOURS", "0"));
        assert!(AppConfig::from_lookup(lookup(&bad_ttl)).is_err());

        let mut bad_pool = base.to_vec();
        bad_pool.push(("DATABASE_MAX_CONNECTIONS", "none"));
        assert!(AppConfig::from_lookup(lookup(&bad_pool)).is_err());
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("SESSION_TTL_HOURS", "2"),
            ("SECURE_COOKIES", "true"),
        ]))
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.session_ttl_hours, 2);
        assert!(config.secure_cookies);
    }
}
