//! The fixed allow-list of publishers whose new series are picked up.

use crate::catalog::CatalogVolume;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitoredPublisher {
    pub name: &'static str,
    /// Catalog publisher id.
    pub id: u64,
    /// Lowercase fragments that identify this publisher by name.
    pub terms: &'static [&'static str],
}

pub const MONITORED_PUBLISHERS: [MonitoredPublisher; 3] = [
    MonitoredPublisher {
        name: "Marvel",
        id: 31,
        terms: &["marvel"],
    },
    MonitoredPublisher {
        name: "DC",
        id: 10,
        terms: &["dc", "detective comics"],
    },
    MonitoredPublisher {
        name: "Dark Horse",
        id: 16,
        terms: &["dark horse"],
    },
];

/// Name variants seen on catalog records for the monitored publishers.
/// Matched as substrings, so "dc" also hits any name containing those letters.
const PUBLISHER_ALIASES: &[&str] = &[
    "marvel",
    "marvel comics",
    "marvel entertainment",
    "marvel worldwide",
    "marvel entertainment group",
    "marvel comics group",
    "dc",
    "dc comics",
    "dc entertainment",
    "dc universe",
    "detective comics",
    "detective comics, inc.",
    "dark horse",
    "dark horse comics",
    "dark horse entertainment",
];

/// Published by one of the monitored publishers, by name or by id.
pub fn is_monitored(volume: &CatalogVolume) -> bool {
    let name = volume.publisher_name().to_lowercase();
    if PUBLISHER_ALIASES.iter().any(|alias| name.contains(alias)) {
        return true;
    }
    volume
        .publisher_id()
        .is_some_and(|id| MONITORED_PUBLISHERS.iter().any(|p| p.id == id))
}

/// Belongs to `publisher` specifically. The structured id wins; the name
/// check covers records whose publisher id is missing or wrong.
pub fn matches_publisher(volume: &CatalogVolume, publisher: &MonitoredPublisher) -> bool {
    if volume.publisher_id() == Some(publisher.id) {
        return true;
    }
    if !is_monitored(volume) {
        return false;
    }
    let name = volume.publisher_name().to_lowercase();
    publisher.terms.iter().any(|term| name.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_is_monitored_by_name() {
        assert!(is_monitored(&fixtures::catalog_volume_flat(
            1,
            "A",
            "Marvel Worldwide"
        )));
        assert!(is_monitored(&fixtures::catalog_volume_flat(
            2,
            "B",
            "Detective Comics, Inc."
        )));
        assert!(!is_monitored(&fixtures::catalog_volume_flat(3, "C", "Image")));
    }

    #[test]
    fn test_is_monitored_by_id() {
        let v = fixtures::catalog_volume(1, "A", Some((16, "")), Some(2026));
        assert!(is_monitored(&v));
        let other = fixtures::catalog_volume(2, "B", Some((999, "Boom! Studios")), Some(2026));
        assert!(!is_monitored(&other));
    }

    #[test]
    fn test_matches_publisher() {
        let [marvel, dc, dark_horse] = MONITORED_PUBLISHERS;

        let by_id = fixtures::catalog_volume(1, "A", Some((31, "Wrong Name")), Some(2026));
        assert!(matches_publisher(&by_id, &marvel));

        let by_name = fixtures::catalog_volume(2, "B", Some((0, "DC Comics")), Some(2026));
        assert!(matches_publisher(&by_name, &dc));
        assert!(!matches_publisher(&by_name, &marvel));

        let missing = fixtures::catalog_volume(3, "C", None, Some(2026));
        assert!(!matches_publisher(&missing, &dark_horse));
    }
}
