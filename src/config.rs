//! Runtime settings read from the environment (after `.env` is loaded).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use secrecy::Secret;

use crate::flyweights::category::PreloadPolicy;

#[derive(Clone, Debug)]
pub struct Settings {
    pub bind_address: String,
    /// When absent the service runs against the in-memory store.
    pub database_url: Option<Secret<String>>,
    /// Base URL of the hosted backend, used for RPC calls made with the caller's token.
    pub supabase_url: Option<String>,
    pub jwt_secret: Secret<String>,
    pub db_timeout: Duration,
    pub query_cache_ttl: Duration,
    pub category_preload_policy: PreloadPolicy,
    pub locales_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("SUPABASE_JWT_SECRET")
            .context("SUPABASE_JWT_SECRET must be set")?;

        let db_timeout_ms = parse_var("DB_TIMEOUT_MS", 5000u64)?;
        let cache_ttl_secs = parse_var("QUERY_CACHE_TTL_SECS", 300u64)?;

        let category_preload_policy = match std::env::var("CATEGORY_PRELOAD_POLICY") {
            Ok(raw) => PreloadPolicy::from_str(&raw)
                .map_err(|e| anyhow::anyhow!(e))
                .context("Invalid CATEGORY_PRELOAD_POLICY")?,
            Err(_) => PreloadPolicy::default(),
        };

        Ok(Self {
            bind_address: std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3001".into()),
            database_url: std::env::var("DATABASE_URL").ok().map(Secret::new),
            supabase_url: std::env::var("SUPABASE_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string()),
            jwt_secret: Secret::new(jwt_secret),
            db_timeout: Duration::from_millis(db_timeout_ms),
            query_cache_ttl: Duration::from_secs(cache_ttl_secs),
            category_preload_policy,
            locales_dir: std::env::var("LOCALES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("locales")),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Settings {
    pub fn for_tests() -> Self {
        Self {
            bind_address: "127.0.0.1:0".into(),
            database_url: None,
            supabase_url: None,
            jwt_secret: Secret::new("test-jwt-secret".into()),
            db_timeout: Duration::from_millis(5000),
            query_cache_ttl: Duration::from_secs(300),
            category_preload_policy: PreloadPolicy::FirstWins,
            locales_dir: PathBuf::from("locales"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default_when_unset() {
        let value = parse_var("VIDEOTECA_TEST_UNSET_VARIABLE", 42u64).unwrap();
        assert_eq!(value, 42);
    }
}
