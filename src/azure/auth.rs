use anyhow::{Result, bail};
use tracing::debug;

pub const PAT_ENV: &str = "AZURE_DEVOPS_PAT";
pub const EXT_PAT_ENV: &str = "AZURE_DEVOPS_EXT_PAT";

/// Resolve a personal access token using multiple strategies:
/// 1. `token` from the config file
/// 2. `AZURE_DEVOPS_PAT` environment variable
/// 3. `AZURE_DEVOPS_EXT_PAT` environment variable (used by `az devops`)
pub fn resolve_token(configured: Option<&str>) -> Result<String> {
    resolve_token_with(configured, |name| std::env::var(name).ok())
}

/// Same as [`resolve_token`] with an injectable environment lookup.
pub fn resolve_token_with<F>(configured: Option<&str>, env: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = configured.map(str::trim)
        && !token.is_empty()
    {
        debug!("Token resolved via config file");
        return Ok(token.to_string());
    }

    for name in [PAT_ENV, EXT_PAT_ENV] {
        if let Some(token) = env(name)
            && !token.trim().is_empty()
        {
            debug!(var = name, "Token resolved via environment");
            return Ok(token.trim().to_string());
        }
    }

    bail!(
        "Could not resolve an Azure DevOps access token. Please either:\n\
         - Set `token` in the [azure] section of the config file\n\
         - Set the {PAT_ENV} environment variable\n\
         - Set the {EXT_PAT_ENV} environment variable"
    )
}
