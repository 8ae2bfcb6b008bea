use oqee_client::types::Channel;

use crate::services::catalog::CatalogIndex;

/// Levenshtein distance over Unicode code points, unit cost per edit.
///
/// Two rolling rows keyed on the shorter input, so memory stays
/// O(min(len a, len b)) while the result is independent of argument order.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (long, short) = if a.len() < b.len() { (b, a) } else { (a, b) };

    if short.is_empty() {
        return long.len();
    }

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0; short.len() + 1];

    for (i, &c1) in long.iter().enumerate() {
        current[0] = i + 1;
        for (j, &c2) in short.iter().enumerate() {
            let insertions = previous[j + 1] + 1;
            let deletions = current[j] + 1;
            let substitutions = previous[j] + usize::from(c1 != c2);
            current[j + 1] = insertions.min(deletions).min(substitutions);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}

/// Picks the catalog channel whose lowercased name is closest to `query`.
///
/// Linear scan over the whole catalog; ties keep the channel encountered
/// first in catalog order. Returns `None` only when the catalog is empty.
pub fn resolve<'a>(query: &str, index: &'a CatalogIndex) -> Option<&'a Channel> {
    let needle = query.to_lowercase();
    let mut best: Option<(&Channel, usize)> = None;

    for channel in index.channels() {
        let score = distance(&needle, &channel.name.to_lowercase());
        match best {
            Some((_, current)) if score >= current => {}
            _ => best = Some((channel, score)),
        }
    }

    best.map(|(channel, _)| channel)
}
