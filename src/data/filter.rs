//! Cluster selection over the loaded table.

use crate::models::{ClusterSelector, RegionRecord};

/// Records passing `selector`, in their original order.
///
/// The input is only borrowed; [`ClusterSelector::All`] yields every
/// record. A selection with no members yields an empty vector.
pub fn filter_records<'a>(
    records: &'a [RegionRecord],
    selector: ClusterSelector,
) -> Vec<&'a RegionRecord> {
    records
        .iter()
        .filter(|r| selector.matches(r.cluster_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Indicator;

    fn record(name: &str, cluster_id: u32) -> RegionRecord {
        RegionRecord {
            region_name: name.to_string(),
            map_key: name.to_string(),
            cluster_id,
            indicators: vec![Indicator {
                name: "APM_SD".to_string(),
                value: 90.0,
            }],
            extras: Vec::new(),
        }
    }

    fn table(clusters: &[u32]) -> Vec<RegionRecord> {
        clusters
            .iter()
            .enumerate()
            .map(|(i, &c)| record(&format!("Region {}", i), c))
            .collect()
    }

    #[test]
    fn test_all_is_identity() {
        let records = table(&[1, 2, 3, 1, 2, 3, 1, 2, 3, 1]);
        let filtered = filter_records(&records, ClusterSelector::All);

        assert_eq!(filtered.len(), 10);
        for (kept, original) in filtered.iter().zip(&records) {
            assert_eq!(*kept, original);
        }
    }

    #[test]
    fn test_cluster_preserves_order() {
        let records = table(&[2, 1, 2, 3, 2]);
        let filtered = filter_records(&records, ClusterSelector::Cluster(2));

        let names: Vec<&str> = filtered.iter().map(|r| r.region_name.as_str()).collect();
        assert_eq!(names, vec!["Region 0", "Region 2", "Region 4"]);
        assert!(filtered.iter().all(|r| r.cluster_id == 2));
    }

    #[test]
    fn test_no_matches_is_empty() {
        let records = table(&[1, 1, 2]);
        assert!(filter_records(&records, ClusterSelector::Cluster(3)).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_records(&[], ClusterSelector::All).is_empty());
    }

    #[test]
    fn test_input_untouched() {
        let records = table(&[3, 1, 3]);
        let before = records.clone();
        let _ = filter_records(&records, ClusterSelector::Cluster(1));
        assert_eq!(records, before);
    }
}
