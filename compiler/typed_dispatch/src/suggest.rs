//! "Did you mean?" suggestions for unknown type names.
//!
//! A name that differs from a registered one only by ASCII case is always
//! suggested first (`Number` -> `number`). Failing that, the registered
//! name with the smallest Levenshtein distance within a length-based
//! threshold is suggested.

/// Levenshtein edit distance between two strings.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    // Two-row table
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, a_char) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != *b_char);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Maximum distance worth suggesting for a name of `len` characters.
fn threshold(len: usize) -> usize {
    match len {
        0 => 0,
        1..=2 => 1,
        3..=5 => 2,
        6..=10 => 3,
        n => (n / 2).min(5),
    }
}

/// Suggest a registered name for the unknown `name`.
pub fn suggest_type_name<'a>(
    name: &str,
    candidates: impl Iterator<Item = &'a str> + Clone,
) -> Option<&'a str> {
    if let Some(exact) = candidates
        .clone()
        .find(|candidate| candidate.eq_ignore_ascii_case(name))
    {
        return Some(exact);
    }

    let limit = threshold(name.chars().count());
    let lowered = name.to_ascii_lowercase();
    candidates
        .filter_map(|candidate| {
            let distance = edit_distance(&lowered, &candidate.to_ascii_lowercase());
            (distance <= limit).then_some((distance, candidate))
        })
        // min_by_key keeps the first of equal distances: registration order wins ties
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}
