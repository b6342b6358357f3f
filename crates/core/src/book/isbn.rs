/// Normalize user-entered ISBN text.
///
/// Strips hyphens and whitespace and upper-cases a trailing ISBN-10 check
/// character. Returns `None` when nothing is left. No checksum validation is
/// done: sources decide whether they know the number.
pub fn normalize_isbn(raw: &str) -> Option<String> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if cleaned.ends_with('x') {
        cleaned.pop();
        cleaned.push('X');
    }

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
