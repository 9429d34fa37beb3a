//! Cluster aggregation and summary statistics.
//!
//! This module groups the selected regions by cluster label and computes
//! the per-indicator means that feed the profile table and the radar
//! chart.

use crate::models::{
    ClusterProfile, ClusterProfiles, Dataset, DashboardSummary, Indicator, RadarPoint,
    RegionRecord,
};
use std::collections::HashMap;

/// Running sums for one cluster group.
struct Group {
    cluster_id: u32,
    members: usize,
    sums: Vec<f64>,
    counts: Vec<usize>,
}

/// Group records by cluster label and average each indicator.
///
/// Groups appear in the order their label first occurs in `records`;
/// labels with no records never appear. Non-finite values (missing
/// cells) are skipped, so each mean is taken over the values present.
/// An indicator with no present value in a group averages to NaN.
pub fn cluster_profiles<'a, I>(records: I, indicators: &[String]) -> ClusterProfiles
where
    I: IntoIterator<Item = &'a RegionRecord>,
{
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<u32, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.cluster_id).or_insert_with(|| {
            groups.push(Group {
                cluster_id: record.cluster_id,
                members: 0,
                sums: vec![0.0; indicators.len()],
                counts: vec![0; indicators.len()],
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.members += 1;

        for (i, name) in indicators.iter().enumerate() {
            if let Some(value) = record.indicator(name).filter(|v| v.is_finite()) {
                group.sums[i] += value;
                group.counts[i] += 1;
            }
        }
    }

    let profiles = groups
        .into_iter()
        .map(|group| ClusterProfile {
            cluster_id: group.cluster_id,
            members: group.members,
            means: indicators
                .iter()
                .enumerate()
                .map(|(i, name)| Indicator {
                    name: name.clone(),
                    value: if group.counts[i] == 0 {
                        f64::NAN
                    } else {
                        group.sums[i] / group.counts[i] as f64
                    },
                })
                .collect(),
        })
        .collect();

    ClusterProfiles(profiles)
}

/// Headline counters for a selection of `selected` regions.
pub fn summarize(dataset: &Dataset, selected: usize) -> DashboardSummary {
    DashboardSummary {
        selected_regions: selected,
        total_regions: dataset.len(),
        cluster_count: dataset.cluster_count(),
    }
}

/// Reshape profiles into one point per (cluster, indicator).
pub fn radar_series(profiles: &ClusterProfiles) -> Vec<RadarPoint> {
    profiles
        .iter()
        .flat_map(|profile| {
            profile.means.iter().map(move |m| RadarPoint {
                cluster_id: profile.cluster_id,
                indicator: m.name.clone(),
                value: m.value,
            })
        })
        .collect()
}

/// Largest finite mean across all profiles, if any.
pub fn max_mean(profiles: &ClusterProfiles) -> Option<f64> {
    profiles
        .iter()
        .flat_map(|p| p.means.iter().map(|m| m.value))
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
}

/// Cluster with the highest and lowest mean for each indicator.
///
/// Used for the narrative under the profile table. Indicators where no
/// cluster has a finite mean are omitted.
pub fn indicator_extremes(
    profiles: &ClusterProfiles,
    indicators: &[String],
) -> Vec<(String, u32, u32)> {
    indicators
        .iter()
        .filter_map(|name| {
            let values: Vec<(u32, f64)> = profiles
                .iter()
                .filter_map(|p| {
                    p.mean(name)
                        .filter(|v| v.is_finite())
                        .map(|v| (p.cluster_id, v))
                })
                .collect();

            let best = values
                .iter()
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;
            let worst = values
                .iter()
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

            Some((name.clone(), best.0, worst.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter_records;
    use crate::models::ClusterSelector;
    use std::path::PathBuf;

    const TOLERANCE: f64 = 1e-9;

    fn create_record(cluster_id: u32, values: &[(&str, f64)]) -> RegionRecord {
        RegionRecord {
            region_name: format!("Region {}", cluster_id),
            map_key: format!("Region {}", cluster_id),
            cluster_id,
            indicators: values
                .iter()
                .map(|(name, value)| Indicator {
                    name: name.to_string(),
                    value: *value,
                })
                .collect(),
            extras: Vec::new(),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scenario_two_clusters() {
        let records = vec![
            create_record(1, &[("APM_SD", 80.0)]),
            create_record(1, &[("APM_SD", 90.0)]),
            create_record(2, &[("APM_SD", 70.0)]),
        ];

        let profiles = cluster_profiles(&records, &names(&["APM_SD"]));

        assert_eq!(profiles.cluster_ids(), vec![1, 2]);
        assert!((profiles.get(1).unwrap().mean("APM_SD").unwrap() - 85.0).abs() < TOLERANCE);
        assert!((profiles.get(2).unwrap().mean("APM_SD").unwrap() - 70.0).abs() < TOLERANCE);
        assert_eq!(profiles.get(1).unwrap().members, 2);
        assert!(profiles.get(3).is_none());
    }

    #[test]
    fn test_first_appearance_order() {
        let records = vec![
            create_record(3, &[("HLS", 15.0)]),
            create_record(1, &[("HLS", 12.0)]),
            create_record(3, &[("HLS", 16.0)]),
            create_record(2, &[("HLS", 13.0)]),
        ];

        let profiles = cluster_profiles(&records, &names(&["HLS"]));
        assert_eq!(profiles.cluster_ids(), vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_input() {
        let records: Vec<RegionRecord> = Vec::new();
        let profiles = cluster_profiles(&records, &names(&["APM_SD"]));
        assert!(profiles.is_empty());
        assert!(radar_series(&profiles).is_empty());
        assert_eq!(max_mean(&profiles), None);
    }

    #[test]
    fn test_empty_selection_flows_through() {
        let records = vec![
            create_record(1, &[("APM_SD", 80.0)]),
            create_record(2, &[("APM_SD", 70.0)]),
        ];
        let filtered = filter_records(&records, ClusterSelector::Cluster(3));
        assert!(filtered.is_empty());

        let profiles = cluster_profiles(filtered.iter().copied(), &names(&["APM_SD"]));
        assert!(profiles.is_empty());
    }

    #[test]
    fn test_means_match_definition() {
        let indicators = names(&["APM_SD", "RLS"]);
        let records: Vec<RegionRecord> = (0..12)
            .map(|i| {
                let f = i as f64;
                create_record(i % 3 + 1, &[("APM_SD", 60.0 + f * 3.7), ("RLS", 7.0 + f * 0.13)])
            })
            .collect();

        let profiles = cluster_profiles(&records, &indicators);

        for profile in profiles.iter() {
            for name in &indicators {
                let members: Vec<f64> = records
                    .iter()
                    .filter(|r| r.cluster_id == profile.cluster_id)
                    .map(|r| r.indicator(name).unwrap())
                    .collect();
                let expected = members.iter().sum::<f64>() / members.len() as f64;
                assert!((profile.mean(name).unwrap() - expected).abs() < TOLERANCE);
            }
        }
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let records = vec![
            create_record(1, &[("APM_SD", 80.0), ("HLS", f64::NAN)]),
            create_record(1, &[("APM_SD", f64::NAN), ("HLS", f64::NAN)]),
            create_record(1, &[("APM_SD", 90.0), ("HLS", f64::NAN)]),
        ];

        let profiles = cluster_profiles(&records, &names(&["APM_SD", "HLS"]));
        let profile = profiles.get(1).unwrap();

        assert_eq!(profile.members, 3);
        assert!((profile.mean("APM_SD").unwrap() - 85.0).abs() < TOLERANCE);
        assert!(profile.mean("HLS").unwrap().is_nan());
    }

    #[test]
    fn test_unknown_indicator_is_nan() {
        let records = vec![create_record(1, &[("APM_SD", 80.0)])];
        let profiles = cluster_profiles(&records, &names(&["Lulus_SMA_Plus"]));
        assert!(profiles.get(1).unwrap().mean("Lulus_SMA_Plus").unwrap().is_nan());
    }

    #[test]
    fn test_radar_series_long_form() {
        let records = vec![
            create_record(1, &[("APM_SD", 80.0), ("HLS", 12.0)]),
            create_record(2, &[("APM_SD", 70.0), ("HLS", 14.0)]),
        ];
        let profiles = cluster_profiles(&records, &names(&["APM_SD", "HLS"]));
        let radar = radar_series(&profiles);

        assert_eq!(radar.len(), 4);
        assert_eq!(radar[0].cluster_id, 1);
        assert_eq!(radar[0].indicator, "APM_SD");
        assert_eq!(radar[3].cluster_id, 2);
        assert_eq!(radar[3].indicator, "HLS");
        assert_eq!(radar[3].value, 14.0);
        assert_eq!(max_mean(&profiles), Some(80.0));
    }

    #[test]
    fn test_indicator_extremes() {
        let records = vec![
            create_record(1, &[("APM_SD", 80.0), ("HLS", 15.0)]),
            create_record(2, &[("APM_SD", 95.0), ("HLS", 12.0)]),
            create_record(3, &[("APM_SD", 85.0), ("HLS", f64::NAN)]),
        ];
        let indicators = names(&["APM_SD", "HLS", "RLS"]);
        let profiles = cluster_profiles(&records, &indicators);

        let extremes = indicator_extremes(&profiles, &indicators);
        assert_eq!(
            extremes,
            vec![
                ("APM_SD".to_string(), 2, 1),
                ("HLS".to_string(), 1, 2),
            ]
        );
    }

    #[test]
    fn test_summarize() {
        let dataset = Dataset {
            source: PathBuf::from("x.csv"),
            columns: Vec::new(),
            indicators: names(&["APM_SD"]),
            records: vec![
                create_record(1, &[("APM_SD", 80.0)]),
                create_record(2, &[("APM_SD", 70.0)]),
                create_record(2, &[("APM_SD", 75.0)]),
            ],
        };

        let summary = summarize(&dataset, 2);
        assert_eq!(summary.selected_regions, 2);
        assert_eq!(summary.total_regions, 3);
        assert_eq!(summary.cluster_count, 2);
    }
}
