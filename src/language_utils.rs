use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for locale code handling
///
/// Locales are a primary language subtag (ISO 639-1 or ISO 639-3),
/// optionally followed by region or script subtags separated by `-` or `_`
/// (e.g. "en", "pt-BR", "zh_Hant"). Only the primary subtag is checked
/// against the ISO tables.
/// Split a locale into its primary language subtag and the remainder
pub fn split_locale(locale: &str) -> (&str, Option<&str>) {
    let trimmed = locale.trim();
    match trimmed.find(['-', '_']) {
        Some(pos) => (&trimmed[..pos], Some(&trimmed[pos + 1..])),
        None => (trimmed, None),
    }
}

/// Resolve the primary subtag of a locale to an ISO language
fn language_for(locale: &str) -> Option<Language> {
    let (primary, _) = split_locale(locale);
    let primary = primary.to_lowercase();

    match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    }
}

/// Validate that a locale names a known language
pub fn validate_locale(locale: &str) -> Result<()> {
    let (_, rest) = split_locale(locale);
    if rest.is_some_and(str::is_empty) {
        return Err(anyhow!("Invalid locale: {}", locale));
    }

    language_for(locale)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid locale: {}", locale))
}

/// Check if a locale code is valid
pub fn is_valid_locale(locale: &str) -> bool {
    validate_locale(locale).is_ok()
}

/// Get the English language name for a locale
pub fn get_language_name(locale: &str) -> Result<String> {
    let lang = language_for(locale)
        .ok_or_else(|| anyhow!("Failed to get language from locale: {}", locale))?;

    Ok(lang.to_name().to_string())
}
