use std::collections::BTreeMap;

/// Used when a name has no usable words left.
const FALLBACK_ALIAS: &str = "proj";

/// Domain phrases that should survive as a single short word.
const REPLACEMENTS: [(&str, &str); 2] = [("ct.gov", "ctgov"), ("sso/aug", "sso")];

/// Substrings treated as word separators.
const NOISE: [&str; 5] = ["-", "_", "and", "the", " "];

/// Derives a short alias from a project name that is not yet a key of `existing`.
///
/// `Tech Debt` becomes `tede`, `Release Engineering Tools` becomes `ret` and a single word keeps its
/// first 4 characters. Collisions get a numeric suffix starting from 2.
pub fn synthesize(project: &str, existing: &BTreeMap<String, String>) -> String {
    let mut name = project.to_lowercase();
    for (from, to) in REPLACEMENTS {
        name = name.replace(from, to);
    }
    for noise in NOISE {
        name = name.replace(noise, " ");
    }
    let words = name.split_whitespace().collect::<Vec<_>>();

    let base = match words.as_slice() {
        [] => FALLBACK_ALIAS.to_string(),
        [word] => prefix(word, 4),
        [first, second] => prefix(first, 2) + &prefix(second, 2),
        [first, ..] => {
            let initials = words
                .iter()
                .take(4)
                .filter_map(|v| v.chars().next())
                .collect::<String>();
            if initials.chars().count() < 3 && first.chars().count() > 1 {
                prefix(first, 3)
            } else {
                initials
            }
        }
    };

    let mut alias = base.clone();
    let mut counter = 1;
    while existing.contains_key(&alias) {
        counter += 1;
        alias = format!("{base}{counter}");
    }
    alias
}

fn prefix(word: &str, length: usize) -> String {
    word.chars().take(length).collect()
}
