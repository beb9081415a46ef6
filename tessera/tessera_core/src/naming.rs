//! Naming helpers.
//!
//! Physical names are what the cloud provider sees. They are derived from
//! the app name, the stage and the logical name, and must be deterministic:
//! replanning the same program has to produce byte-identical names, so no
//! randomness is involved anywhere in this module.

use sha2::{Digest, Sha256};

use crate::utils::config::AppContext;

/// Alphabet for pretty hashes. Excludes characters that are easy to
/// confuse when read aloud or typed (`g`, `i`, `j`, `l`, `p`, `q`, `y`).
pub const PRETTY_CHARS: &[u8; 19] = b"abcdefhkmnorstuvwxz";

/// Character used to left-pad short pretty hashes.
pub const PADDING_CHAR: char = 's';

/// The stage is never truncated below this many characters when the name
/// has to be shortened.
pub const MIN_STAGE_LENGTH: usize = 8;

/// Remove every character outside `[A-Za-z0-9]`.
pub fn strip_non_alphanumeric(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Normalize a logical name: strip non-alphanumerics and capitalize the
/// first letter.
///
/// ```
/// use tessera_core::naming::sanitize;
///
/// assert_eq!(sanitize("my-bucket_1"), "Mybucket1");
/// ```
pub fn sanitize(name: &str) -> String {
    let stripped = strip_non_alphanumeric(name);
    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Derive a length-bounded physical name.
///
/// The name is stripped of non-alphanumerics, then prefixed with the app
/// and stage. With `L = max_length - len(suffix)` the first form that fits
/// wins:
///
/// 1. `{app}-{stage}-{name}`
/// 2. the app truncated, stage and name kept whole
/// 3. the stage truncated (never below [`MIN_STAGE_LENGTH`] characters) and
///    the name truncated to fill the remainder
///
/// The suffix is always appended last. The result never exceeds
/// `max_length` characters.
///
/// ```
/// use tessera_core::naming::physical_name;
/// use tessera_core::utils::config::AppContext;
///
/// let app = AppContext::new("myapp", "dev");
/// assert_eq!(physical_name(&app, 64, "MyQueue", ".fifo"), "myapp-dev-MyQueue.fifo");
/// ```
pub fn physical_name(app: &AppContext, max_length: usize, name: &str, suffix: &str) -> String {
    let name = strip_non_alphanumeric(name);
    let budget = max_length.saturating_sub(char_len(suffix));
    let main = prefixed_name(&app.name, &app.stage, &name, budget);
    truncate(&format!("{}{}", main, suffix), max_length)
}

fn prefixed_name(app: &str, stage: &str, name: &str, budget: usize) -> String {
    let (app_len, stage_len, name_len) = (char_len(app), char_len(stage), char_len(name));

    if app_len + stage_len + name_len + 2 <= budget {
        return format!("{}-{}-{}", app, stage, name);
    }

    let stage_and_name = stage_len + name_len + 1;
    if stage_and_name + 1 < budget {
        let keep = budget - stage_and_name - 1;
        return format!("{}-{}-{}", truncate(app, keep), stage, name);
    }
    if stage_and_name <= budget {
        return format!("{}-{}", stage, name);
    }

    let stage_keep = stage_len.min(MIN_STAGE_LENGTH.max(budget.saturating_sub(name_len + 1)));
    if budget <= stage_keep + 1 {
        return truncate(stage, budget);
    }
    let name_keep = budget - stage_keep - 1;
    format!("{}-{}", truncate(stage, stage_keep), truncate(name, name_keep))
}

/// Hash a string into a short, human-typable identifier of exactly
/// `length` characters.
///
/// The SHA-256 digest is read as a big-endian integer and written out in
/// base 19 over [`PRETTY_CHARS`], most significant digit first. The result
/// is cut to `length` characters and left-padded with [`PADDING_CHAR`].
pub fn hash_to_pretty_string(input: &str, length: usize) -> String {
    let digest = Sha256::digest(input.as_bytes());
    encode_pretty(digest.to_vec(), length)
}

/// Integer variant of [`hash_to_pretty_string`].
pub fn hash_number_to_pretty_string(number: u64, length: usize) -> String {
    encode_pretty(number.to_be_bytes().to_vec(), length)
}

fn encode_pretty(mut digits: Vec<u8>, length: usize) -> String {
    let base = PRETTY_CHARS.len() as u32;
    let mut encoded = Vec::new();

    while digits.iter().any(|&b| b != 0) {
        let mut remainder = 0u32;
        for byte in digits.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / base) as u8;
            remainder = acc % base;
        }
        encoded.push(PRETTY_CHARS[remainder as usize]);
    }
    encoded.reverse();

    let hash: String = encoded.into_iter().take(length).map(char::from).collect();
    let padding = length - hash.len();
    std::iter::repeat(PADDING_CHAR).take(padding).chain(hash.chars()).collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
