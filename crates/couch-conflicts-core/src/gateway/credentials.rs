use std::fmt;

/// Account credentials for a Cloudant (or CouchDB) server.
#[derive(Clone)]
pub struct Credentials {
    pub account: String,
    pub api_key: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        account: impl Into<String>,
        api_key: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            api_key: api_key.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("api_key", &obfuscate(&self.api_key))
            .field("password", &obfuscate(&self.password))
            .finish()
    }
}

/// Mask a secret for display, keeping only its first and last characters.
pub fn obfuscate(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => String::new(),
        1..=4 => "*".repeat(chars.len()),
        n => {
            let mut masked = String::with_capacity(n);
            masked.push(chars[0]);
            masked.push_str(&"*".repeat(n - 2));
            masked.push(chars[n - 1]);
            masked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obfuscate_keeps_edges() {
        assert_eq!(obfuscate("secret-key"), "s********y");
    }

    #[test]
    fn test_obfuscate_short_values_fully_masked() {
        assert_eq!(obfuscate(""), "");
        assert_eq!(obfuscate("abcd"), "****");
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let credentials = Credentials::new("acme", "apikey-123456", "hunter2-password");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("acme"));
        assert!(!rendered.contains("apikey-123456"));
        assert!(!rendered.contains("hunter2-password"));
    }
}
