//! Look-up credentials, kept apart from the main configuration
//!
//! The credentials file is a TOML document with one table per profile:
//!
//! ```toml
//! [default]
//! bearer-token = "AAAA..."
//! ```

use crate::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Credentials of one profile
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Credentials {
    pub bearer_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

/// Loads the credentials stored under `profile`
///
/// # Arguments
///
/// * `path` - Path to the TOML credentials file
/// * `profile` - Name of the table to read
///
/// # Returns
///
/// * `Ok(Credentials)` - The profile's credentials
/// * `Err(ConfigError::MissingProfile)` - The file has no such profile
/// * `Err(ConfigError)` - The file could not be read or parsed, or the token is empty
pub fn load_credentials(path: &Path, profile: &str) -> Result<Credentials, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut profiles: HashMap<String, Credentials> = toml::from_str(&content)?;

    let credentials = profiles
        .remove(profile)
        .ok_or_else(|| ConfigError::MissingProfile(profile.to_string()))?;

    if credentials.bearer_token.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "bearer-token of profile '{}' is empty",
            profile
        )));
    }

    Ok(credentials)
}
