use std::env;

use crate::common::{ApiKey, ChatError};

/// Reads the API key from the process environment. Call `dotenv()` first
/// if the key lives in a `.env` file.
pub fn load_credential(var: &str) -> Result<ApiKey, ChatError> {
    load_credential_with(var, |name| env::var(name).ok())
}

pub fn load_credential_with<F>(var: &str, lookup: F) -> Result<ApiKey, ChatError>
where
    F: FnOnce(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(ApiKey {
            key: value.trim().to_string().into(),
        }),
        _ => Err(ChatError::MissingCredential(var.to_string())),
    }
}
