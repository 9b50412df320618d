//! Query reference letters
//!
//! Queries inside one panel are told apart by a single uppercase letter.
//! Assignment always picks the first letter in `A..=Z` that no sibling
//! query holds yet, so both the migrator and live editing agree on it.

use serde_json::Value;

/// Number of assignable reference letters
pub const REF_ID_CAPACITY: usize = 26;

/// First letter in `A..=Z` not held by any of `taken`
///
/// Returns `None` once all 26 letters are in use.
///
/// # Examples
/// ```
/// use dash_migrate::first_unused_letter;
///
/// assert_eq!(first_unused_letter(["A", "C"]), Some('B'));
/// assert_eq!(first_unused_letter(Vec::<&str>::new()), Some('A'));
/// ```
#[must_use]
pub fn first_unused_letter<'a, I>(taken: I) -> Option<char>
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: Vec<&str> = taken.into_iter().collect();
    ('A'..='Z').find(|letter| !taken.iter().any(|t| is_letter(t, *letter)))
}

/// Reference letters currently held by the targets of a raw panel
pub(crate) fn held_letters(targets: &[Value]) -> Vec<&str> {
    targets
        .iter()
        .filter_map(|t| t.get("refId").and_then(Value::as_str))
        .collect()
}

#[inline]
fn is_letter(held: &str, letter: char) -> bool {
    let mut chars = held.chars();
    chars.next() == Some(letter) && chars.next().is_none()
}
