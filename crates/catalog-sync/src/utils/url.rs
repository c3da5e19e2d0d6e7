//! URL utilities for validation and safe logging

use url::Url;

pub struct UrlUtils;

impl UrlUtils {
    /// Parse a URL and require an http(s) scheme with a host
    pub fn parse_http_url(url: &str) -> Result<Url, String> {
        let parsed = Url::parse(url.trim()).map_err(|e| format!("'{url}' is not a valid URL: {e}"))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(format!("'{url}' uses unsupported scheme '{other}'")),
        }
        if parsed.host_str().is_none() {
            return Err(format!("'{url}' has no host"));
        }
        Ok(parsed)
    }

    /// Mask credentials in a URL before it is logged
    ///
    /// Handles both `user:pass@host` authority credentials and well-known
    /// secret-bearing query parameters.
    pub fn obfuscate_credentials(url: &str) -> String {
        use regex::Regex;

        let mut obfuscated = url.to_string();

        if let Ok(parsed) = Url::parse(url)
            && (!parsed.username().is_empty() || parsed.password().is_some())
        {
            let mut new_url = parsed.clone();
            let _ = new_url.set_username("****");
            let _ = new_url.set_password(Some("****"));
            obfuscated = new_url.to_string();
        }

        let sensitive_params = [
            "password",
            "pass",
            "client_secret",
            "access_token",
            "token",
            "api_key",
        ];

        for param in &sensitive_params {
            let pattern = format!(r"(?i)([?&]{}=)[^&]*", regex::escape(param));
            if let Ok(re) = Regex::new(&pattern) {
                obfuscated = re.replace_all(&obfuscated, "${1}****").to_string();
            }
        }

        obfuscated
    }
}
