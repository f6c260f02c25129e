use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").expect("valid regex"));
static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]").expect("valid regex"));
static UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("valid regex"));

/// Normalizes a header cell or row key so lookups ignore case, spacing and
/// punctuation: `" Maybe - Possibly! "` becomes `maybe_possibly`.
pub fn normalize_key(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let separated = SEPARATORS.replace_all(&lower, "_");
    let stripped = NON_ALNUM.replace_all(&separated, "");
    let squeezed = UNDERSCORES.replace_all(&stripped, "_");
    squeezed
        .strip_suffix('_')
        .unwrap_or(&squeezed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes() {
        assert_eq!(normalize_key("Yes"), "yes");
        assert_eq!(normalize_key("  NO "), "no");
        assert_eq!(normalize_key("maybe possibly"), "maybe_possibly");
        assert_eq!(normalize_key(" Maybe - Possibly! "), "maybe_possibly");
        assert_eq!(normalize_key("co2 (kg/MWh)"), "co2_kgmwh");
        assert_eq!(normalize_key("a__b"), "a_b");
        assert_eq!(normalize_key("trailing_"), "trailing");
        assert_eq!(normalize_key("-"), "");
    }
}
