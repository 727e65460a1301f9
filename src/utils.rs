use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static RE_INVALID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static RE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

/// Turns a group title into the slug used in `/group/<slug>/`.
///
/// With `allow_unicode` the title is NFKC-normalized and non-ASCII letters are
/// kept, otherwise it is NFKD-normalized and reduced to ASCII.
pub fn slugify(value: &str, allow_unicode: bool) -> String {
    let mut normalized = if allow_unicode {
        value.nfkc().collect::<String>()
    } else {
        value.nfkd().filter(|c| c.is_ascii()).collect::<String>()
    };

    normalized = normalized.to_lowercase();

    let cleaned = RE_INVALID.replace_all(&normalized, "");
    let slug = RE_SEPARATOR.replace_all(cleaned.trim(), "-");

    slug.trim_matches(|c| c == '-' || c == '_').to_owned()
}

/// First `limit` characters of `text`, on char boundaries.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_ascii_title() {
        assert_eq!(slugify("Cats & Dogs: the Group!", false), "cats-dogs-the-group");
    }

    #[test]
    fn test_slugify_cyrillic_title() {
        assert_eq!(slugify("Тестовая группа", true), "тестовая-группа");
        assert_eq!(slugify("Тестовая группа", false), "");
    }

    #[test]
    fn test_slugify_whitespace_and_dashes() {
        assert_eq!(
            slugify("   lots --  of \t space ", false),
            "lots-of-space"
        );
        assert_eq!(slugify("already-slugified_text", true), "already-slugified_text");
    }

    #[test]
    fn test_slugify_accents() {
        assert_eq!(slugify("C'est déjà l'été", false), "cest-deja-lete");
        assert_eq!(slugify("C'est déjà l'été", true), "cest-déjà-lété");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify("", true), "");
        assert_eq!(slugify("!@#$%^&*()", false), "");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("Тестовый пост более 15 символов", 15), "Тестовый пост б");
        assert_eq!(truncate_chars("short", 15), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
