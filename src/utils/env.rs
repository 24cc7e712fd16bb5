/// Get environment variable with TIDEWAY_ prefix, falling back to unprefixed version
///
/// Checks `TIDEWAY_{key}` first, then `{key}`, so mail settings can live
/// alongside other Tideway settings or use conventional names.
///
/// # Examples
///
/// ```rust
/// use tideway_mail::utils::get_env_with_prefix;
///
/// // Checks TIDEWAY_MAIL_DEFAULT first, then MAIL_DEFAULT
/// let default = get_env_with_prefix("MAIL_DEFAULT");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("TIDEWAY_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Parse a boolean flag such as `TIDEWAY_MAIL_LOG_JSON`
///
/// Accepts `true`/`false`, `1`/`0` and `yes`/`no`; anything else is `None`.
pub fn get_env_flag(key: &str) -> Option<bool> {
    match get_env_with_prefix(key)?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
