//! Candidate filters applied to catalog results.

use std::collections::HashSet;

use crate::catalog::CatalogVolume;

/// Title or summary fragments that mark reprints and collected editions.
pub const EXCLUDED_TERMS: &[&str] = &[
    "collected",
    "collection",
    "omnibus",
    "complete",
    "essential",
    "masterworks",
    "epic collection",
    "treasury",
    "archive",
    "reprint",
    "classic",
    "golden age",
    "silver age",
    "hardcover",
    "trade paperback",
    "tpb",
    "graphic novel",
];

/// Series that started more than this many years ago are archival.
pub const MAX_SERIES_AGE_YEARS: i64 = 3;

/// Looks like a genuinely new ongoing series rather than a reprint.
pub fn is_new_series(volume: &CatalogVolume, current_year: i32) -> bool {
    let name = volume.name.to_lowercase();
    let deck = volume.deck.to_lowercase();
    if EXCLUDED_TERMS
        .iter()
        .any(|term| name.contains(term) || deck.contains(term))
    {
        return false;
    }

    match volume.start_year {
        Some(year) if year > 0 => year >= current_year as i64 - MAX_SERIES_AGE_YEARS,
        _ => true,
    }
}

/// Keep the first volume seen for each id, preserving order.
pub fn dedupe_by_id(volumes: Vec<CatalogVolume>) -> Vec<CatalogVolume> {
    let mut seen = HashSet::new();
    volumes.into_iter().filter(|v| seen.insert(v.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    const YEAR: i32 = 2026;

    #[test]
    fn test_excluded_terms_in_name_or_deck() {
        let omnibus = fixtures::marvel_volume(1, "X-Men Omnibus");
        assert!(!is_new_series(&omnibus, YEAR));

        let mut decked = fixtures::marvel_volume(2, "Daredevil");
        decked.deck = "Collects the CLASSIC run".to_string();
        assert!(!is_new_series(&decked, YEAR));

        assert!(is_new_series(&fixtures::marvel_volume(3, "Daredevil"), YEAR));
    }

    #[test]
    fn test_every_excluded_term_rejects() {
        for term in EXCLUDED_TERMS {
            let v = fixtures::marvel_volume(1, &format!("Batman {}", term.to_uppercase()));
            assert!(!is_new_series(&v, YEAR), "term {:?} should reject", term);
        }
    }

    #[test]
    fn test_start_year_boundary() {
        let mut v = fixtures::marvel_volume(1, "Venom");
        v.start_year = Some(YEAR as i64 - 3);
        assert!(is_new_series(&v, YEAR));
        v.start_year = Some(YEAR as i64 - 4);
        assert!(!is_new_series(&v, YEAR));
        v.start_year = None;
        assert!(is_new_series(&v, YEAR));
        // zero is how the catalog says "unknown"
        v.start_year = Some(0);
        assert!(is_new_series(&v, YEAR));
    }

    #[test]
    fn test_empty_text_is_not_a_failure() {
        let mut v = fixtures::marvel_volume(1, "");
        v.deck = String::new();
        assert!(is_new_series(&v, YEAR));
    }

    #[test]
    fn test_dedupe_keeps_first_seen_order() {
        let volumes = vec![
            fixtures::marvel_volume(3, "C"),
            fixtures::marvel_volume(1, "A"),
            fixtures::marvel_volume(3, "C again"),
            fixtures::marvel_volume(2, "B"),
            fixtures::marvel_volume(1, "A again"),
        ];
        let deduped = dedupe_by_id(volumes);
        let ids: Vec<u64> = deduped.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(deduped[0].name, "C");
    }
}
