//! Address-set change detection
//!
//! Resolved address lists are semantically sets; order carries no meaning.

/// Whether two address sets are the same
///
/// Equal length and identical contents position-by-position once both are
/// sorted. Pure and synchronous.
pub fn equivalent<S: AsRef<str>>(old: &[S], new: &[S]) -> bool {
    if old.len() != new.len() {
        return false;
    }

    let mut a: Vec<&str> = old.iter().map(AsRef::as_ref).collect();
    let mut b: Vec<&str> = new.iter().map(AsRef::as_ref).collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_does_not_matter() {
        assert!(equivalent(&["a", "b"], &["b", "a"]));
    }

    #[test]
    fn test_different_member_is_a_change() {
        assert!(!equivalent(&["a", "b"], &["a", "c"]));
    }

    #[test]
    fn test_empty_sets_are_equivalent() {
        let empty: [&str; 0] = [];
        assert!(equivalent(&empty, &empty));
    }

    #[test]
    fn test_length_mismatch_is_a_change() {
        assert!(!equivalent(&["10.0.0.1"], &["10.0.0.1", "10.0.0.2"]));
        assert!(!equivalent(&["10.0.0.1", "10.0.0.1"], &["10.0.0.1"]));
    }

    #[test]
    fn test_duplicates_are_counted() {
        assert!(!equivalent(&["a", "a", "b"], &["a", "b", "b"]));
    }
}
