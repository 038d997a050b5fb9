//! Canonical form for person names.
//!
//! Every write path stores names in this form and every name lookup compares
//! against it, so two inputs that differ only in case or spacing collide on
//! the store's uniqueness constraint.

/// Trim, collapse interior whitespace to single spaces and title-case each word.
///
/// `normalize_name(normalize_name(s)) == normalize_name(s)` for every `s`.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        push_title_word(&mut out, word);
    }
    out
}

fn push_title_word(out: &mut String, word: &str) {
    let mut seen_letter = false;
    for ch in word.chars() {
        if !seen_letter && ch.is_alphabetic() {
            seen_letter = true;
            let mut upper = ch.to_uppercase();
            // Letters without a single-char uppercase form (e.g. 'ß') stay
            // lowercase so a second pass cannot change them again.
            match (upper.next(), upper.next()) {
                (Some(single), None) => out.push(single),
                _ => out.extend(ch.to_lowercase()),
            }
        } else {
            out.extend(ch.to_lowercase());
        }
    }
}
