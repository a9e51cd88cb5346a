//! Backend configuration from environment variables.

use store::{BackendConfig, ConfigError};

/// Load the backend config from `SUPABASE_URL`, `SUPABASE_ANON_KEY` and the
/// optional `SUPABASE_BUCKET`, reading a `.env` file first if one exists.
pub fn backend_from_env() -> Result<BackendConfig, ConfigError> {
    dotenvy::dotenv().ok();
    backend_from_vars(|name| std::env::var(name).ok())
}

/// Build the backend config from an arbitrary variable lookup.
pub fn backend_from_vars(
    var: impl Fn(&str) -> Option<String>,
) -> Result<BackendConfig, ConfigError> {
    let url = var("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
    let anon_key = var("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

    let config = BackendConfig::new(url, anon_key);
    Ok(match var("SUPABASE_BUCKET") {
        Some(bucket) if !bucket.is_empty() => config.with_bucket(bucket),
        _ => config,
    })
}
