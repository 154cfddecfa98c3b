/// Administrative prefixes stripped from district names, as word sequences.
/// Longer sequences come first so "CITY OF" wins over "CITY".
const ADMIN_PREFIXES: &[&[&str]] = &[
    &["KABUPATEN"],
    &["KOTAMADYA"],
    &["KOTA"],
    &["KAB."],
    &["KAB"],
    &["CITY", "OF"],
    &["CITY"],
    &["REGENCY"],
];

/// Derive the join key for a district name.
///
/// Uppercases, strips leading administrative prefixes for as long as one is
/// followed by more text, and collapses whitespace. An empty name yields the
/// empty key. Applying it twice gives the same result as applying it once.
pub fn normalize_key(name: &str) -> String {
    let upper = name.to_uppercase();
    let all_words: Vec<&str> = upper.split_whitespace().collect();
    let mut words = all_words.as_slice();

    'strip: loop {
        for prefix in ADMIN_PREFIXES {
            if words.len() > prefix.len() && words.starts_with(prefix) {
                words = &words[prefix.len()..];
                continue 'strip;
            }
        }
        break;
    }

    words.join(" ")
}
