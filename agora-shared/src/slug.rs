/// URL slugs for pages, listings, categories and usernames
///
/// Slugs are lowercase ASCII words joined by `-`. Uniqueness is enforced by
/// the database; when an insert hits the unique index the caller retries with
/// [`candidate`] for the next attempt, which appends a short random suffix.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Insert attempts before giving up on a slug clash
pub const MAX_SLUG_ATTEMPTS: u32 = 5;

const SUFFIX_LEN: usize = 6;
const MAX_SLUG_LEN: usize = 80;

/// Lowercases and collapses everything that is not `[a-z0-9]` into single dashes
///
/// Common Latin accents are folded to their base letter; other non-ASCII
/// characters act as separators.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        let ch = fold_accent(ch);
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }

        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug
}

/// Slug to try on the given attempt (0-based)
///
/// The first attempt uses `base` as is; later ones append `-xxxxxx`.
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 && !base.is_empty() {
        return base.to_string();
    }

    let suffix = random_suffix();
    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

fn fold_accent(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("FC Barcelona Academy"), "fc-barcelona-academy");
        assert_eq!(slugify("  Lagos   Tennis Club  "), "lagos-tennis-club");
        assert_eq!(slugify("Under-17 / Girls"), "under-17-girls");
    }

    #[test]
    fn test_slugify_accents() {
        assert_eq!(slugify("Club Atlético São Paulo"), "club-atletico-sao-paulo");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "word ".repeat(50);
        assert!(slugify(&long).len() <= MAX_SLUG_LEN + 4);
    }

    #[test]
    fn test_candidate_first_attempt_is_base() {
        assert_eq!(candidate("riverside-fc", 0), "riverside-fc");
    }

    #[test]
    fn test_candidate_suffix() {
        let slug = candidate("riverside-fc", 1);
        let (base, suffix) = slug.rsplit_once('-').unwrap();
        assert_eq!(base, "riverside-fc");
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_candidate_empty_base() {
        let slug = candidate("", 0);
        assert_eq!(slug.len(), SUFFIX_LEN);
        assert!(!slug.contains('-'));
    }
}
