use std::env;

use anyhow::{bail, Result};
use couch_conflicts_core::Credentials;

pub const ACCOUNT_VAR: &str = "CLOUDANT_ACCOUNT";
pub const API_KEY_VAR: &str = "CLOUDANT_API_KEY";
pub const PASSWORD_VAR: &str = "CLOUDANT_PASSWORD";

/// Read the Cloudant credentials from the environment (after `.env` is loaded).
pub fn from_env() -> Result<Credentials> {
    from_lookup(|name| env::var(name).ok())
}

fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
    let read = |name: &str| -> Result<String> {
        match lookup(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => bail!("Missing environment variable: {}", name),
        }
    };

    Ok(Credentials::new(
        read(ACCOUNT_VAR)?,
        read(API_KEY_VAR)?,
        read(PASSWORD_VAR)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_all_variables_present() {
        let credentials = from_lookup(lookup(&[
            (ACCOUNT_VAR, "acme"),
            (API_KEY_VAR, "key"),
            (PASSWORD_VAR, "secret"),
        ]))
        .unwrap();
        assert_eq!(credentials.account, "acme");
        assert_eq!(credentials.password, "secret");
    }

    #[test]
    fn test_missing_variable_is_named() {
        let err = from_lookup(lookup(&[(ACCOUNT_VAR, "acme"), (API_KEY_VAR, "key")])).unwrap_err();
        assert!(err.to_string().contains(PASSWORD_VAR));
    }

    #[test]
    fn test_blank_variable_counts_as_missing() {
        let err = from_lookup(lookup(&[
            (ACCOUNT_VAR, " "),
            (API_KEY_VAR, "key"),
            (PASSWORD_VAR, "secret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ACCOUNT_VAR));
    }
}
