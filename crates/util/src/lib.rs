mod single_init;

pub use self::single_init::SingleInit;

/// Trim a string, returning `None` if nothing remains.
pub fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();

    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Length of a string in Unicode scalar values.
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}
