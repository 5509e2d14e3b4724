//! Posting credentials (OAuth 1.0a user context).

use std::fmt;

use crate::error::{AppError, Result};

pub const API_KEY_VAR: &str = "X_API_KEY";
pub const API_SECRET_VAR: &str = "X_API_SECRET";
pub const ACCESS_TOKEN_VAR: &str = "X_ACCESS_TOKEN";
pub const ACCESS_SECRET_VAR: &str = "X_ACCESS_SECRET";

/// Consumer and access token pairs for the posting API.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup.
    ///
    /// Blank values count as missing. All missing names are reported at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let fetch = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = fetch(API_KEY_VAR);
        let api_secret = fetch(API_SECRET_VAR);
        let access_token = fetch(ACCESS_TOKEN_VAR);
        let access_secret = fetch(ACCESS_SECRET_VAR);

        match (api_key, api_secret, access_token, access_secret) {
            (Some(api_key), Some(api_secret), Some(access_token), Some(access_secret)) => {
                Ok(Self {
                    api_key,
                    api_secret,
                    access_token,
                    access_secret,
                })
            }
            _ => Err(AppError::config(format!(
                "set the environment variable(s): {}",
                Self::missing(&lookup).join(", ")
            ))),
        }
    }

    /// Names of required variables that are unset or blank.
    pub fn missing(lookup: &impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
        [API_KEY_VAR, API_SECRET_VAR, ACCESS_TOKEN_VAR, ACCESS_SECRET_VAR]
            .into_iter()
            .filter(|name| lookup(name).is_none_or(|v| v.trim().is_empty()))
            .collect()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn loads_complete_credentials() {
        let vars = env(&[
            (API_KEY_VAR, "key"),
            (API_SECRET_VAR, "secret"),
            (ACCESS_TOKEN_VAR, "token"),
            (ACCESS_SECRET_VAR, "token-secret"),
        ]);
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(creds.api_key, "key");
        assert_eq!(creds.access_secret, "token-secret");
        assert!(!format!("{creds:?}").contains("token-secret"));
    }

    #[test]
    fn reports_missing_and_blank_variables() {
        let vars = env(&[(API_KEY_VAR, "key"), (API_SECRET_VAR, "  ")]);
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();

        assert!(err.is_fatal());
        let message = err.to_string();
        assert!(message.contains(API_SECRET_VAR));
        assert!(message.contains(ACCESS_TOKEN_VAR));
        assert!(message.contains(ACCESS_SECRET_VAR));
        assert!(!message.contains(API_KEY_VAR));
    }
}
