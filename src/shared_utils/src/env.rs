use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// A variable that is set but blank (only whitespace) counts as missing, so an
/// exported-but-empty `GM_API_URL=` does not silently replace a configured URL.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(MissingEnvVarError(name.to_string())),
    }
}

/// Like [`get_env_var`] but for optional overrides.
pub fn env_override(name: &str) -> Option<String> {
    get_env_var(name).ok()
}
