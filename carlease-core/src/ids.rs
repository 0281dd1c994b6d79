//! Record identifier generation.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, distributions::Alphanumeric};

const SUFFIX_LEN: usize = 6;

/// Generates a `{unix-millis}-{random}` identifier.
///
/// # Examples
///
/// ```
/// let id = carlease_core::generate_id();
/// let (millis, suffix) = id.split_once('-').expect("two parts");
/// assert!(millis.parse::<u128>().is_ok());
/// assert_eq!(suffix.len(), 6);
/// ```
pub fn generate_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    format!("{millis}-{suffix}")
}

/// Lowercases `input` and joins its alphanumeric runs with `-`.
///
/// # Examples
///
/// ```
/// use carlease_core::slugify;
///
/// assert_eq!(slugify("The New Grandeur (GN7)"), "the-new-grandeur-gn7");
/// assert_eq!(slugify("  --  "), "");
/// ```
pub fn slugify(input: &str) -> String {
    input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|run| !run.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Appends `-{attempt}` to `base` for the second and later attempts.
pub(crate) fn with_attempt(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_owned()
    } else {
        format!("{base}-{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Sonata", "sonata")]
    #[case("EV9 GT-Line", "ev9-gt-line")]
    #[case("그랜저 하이브리드", "그랜저-하이브리드")]
    #[case("", "")]
    fn slugs_keep_alphanumeric_runs(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[rstest]
    fn generated_ids_differ() {
        assert_ne!(generate_id(), generate_id());
    }

    #[rstest]
    #[case(1, "kia-suv-ev9")]
    #[case(2, "kia-suv-ev9-2")]
    fn attempts_after_the_first_get_a_counter(#[case] attempt: u32, #[case] expected: &str) {
        assert_eq!(with_attempt("kia-suv-ev9", attempt), expected);
    }
}
