use tracing::warn;

/// Locales shipped in `locales/`
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "fi"];

/// Switch the locale for user-visible strings, falling back to English
pub fn set_locale(locale: &str) {
    // Accept region-qualified names such as `fi-FI`
    let language = locale.split(['-', '_']).next().unwrap_or(locale);

    if SUPPORTED_LOCALES.contains(&language) {
        rust_i18n::set_locale(language);
    } else {
        warn!("Unsupported locale {}, using English", locale);
        rust_i18n::set_locale("en");
    }
}
