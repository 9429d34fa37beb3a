//! Markdown and JSON report generation.
//!
//! Each dashboard view (summary counters, map, data table, cluster
//! profile, radar series) becomes one section of the report.

use crate::analysis::indicator_extremes;
use crate::models::{
    ClusterProfiles, ClusterStyle, DashboardReport, DashboardSummary, MapView, RadarPoint,
    RegionRecord, ReportMetadata,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport) -> String {
    let decimals = report.metadata.decimals;
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", report.metadata.title));

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    // Table of contents
    output.push_str(&generate_table_of_contents(report));

    // Views
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_legend_section(&report.legend, &report.profiles));
    if let Some(ref map) = report.map {
        output.push_str(&generate_map_section(map));
    }
    output.push_str(&generate_table_section(report));
    output.push_str(&generate_profile_section(
        &report.profiles,
        &report.indicators,
        decimals,
    ));
    output.push_str(&generate_radar_section(&report.radar, decimals));

    // Interpretation
    if let Some(ref text) = report.interpretation {
        output.push_str(&generate_interpretation_section(text));
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Format an indicator value, rendering missing values as `n/a`.
pub fn format_value(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", decimals, value)
    } else {
        "n/a".to_string()
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Province:** {}\n", metadata.province));
    section.push_str(&format!("- **Data Source:** `{}`\n", metadata.data_source));
    if let Some(ref boundary) = metadata.boundary_source {
        section.push_str(&format!("- **Boundary Document:** `{}`\n", boundary));
    }
    section.push_str(&format!("- **Selection:** {}\n", metadata.selector));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Duration:** {:.3}s\n", metadata.duration_seconds));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &DashboardReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Cluster Legend](#cluster-legend)\n");
    if report.map.is_some() {
        toc.push_str("- [Cluster Map](#cluster-map)\n");
    }
    toc.push_str("- [Clustering Results](#clustering-results)\n");
    toc.push_str("- [Cluster Profiles](#cluster-profiles)\n");
    toc.push_str("- [Indicator Patterns](#indicator-patterns)\n");
    if report.interpretation.is_some() {
        toc.push_str("- [Interpretation](#interpretation)\n");
    }
    toc.push('\n');

    toc
}

/// Generate the headline counters.
fn generate_summary_section(summary: &DashboardSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Regions Selected | Total Regencies/Cities | Clusters |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| **{}** | **{}** | **{}** |\n\n",
        summary.selected_regions, summary.total_regions, summary.cluster_count
    ));

    section
}

/// Generate the cluster legend with the selected member count per cluster.
fn generate_legend_section(legend: &[ClusterStyle], profiles: &ClusterProfiles) -> String {
    let mut section = String::new();

    section.push_str("## Cluster Legend\n\n");
    if legend.is_empty() {
        section.push_str("No cluster styles configured.\n\n");
        return section;
    }

    section.push_str("| Cluster | Quality Level | Color | Selected |\n");
    section.push_str("|:---:|:---|:---:|:---:|\n");
    for style in legend {
        let members = profiles.get(style.id).map_or(0, |p| p.members);
        section.push_str(&format!(
            "| {} | {} | `{}` | {} |\n",
            style.id,
            escape_cell(&style.label),
            style.color,
            members
        ));
    }
    section.push('\n');

    section
}

/// Generate the map section: join diagnostics and per-region colors.
fn generate_map_section(map: &MapView) -> String {
    let mut section = String::new();

    section.push_str("## Cluster Map\n\n");

    if let Some(ref error) = map.error {
        section.push_str(&format!("> **Map unavailable:** {}\n\n", error));
        return section;
    }

    section.push_str(&format!(
        "*Joined on `{}` in `{}`: {} of {} regions matched.*\n\n",
        map.feature_id_key,
        map.source,
        map.matched,
        map.regions.len()
    ));

    if map.regions.is_empty() {
        section.push_str("No regions to draw for the current selection.\n\n");
    } else {
        section.push_str("| Region | Map Key | Cluster | Fill | On Map |\n");
        section.push_str("|:---|:---|:---:|:---:|:---:|\n");
        for region in &map.regions {
            section.push_str(&format!(
                "| {} | {} | {} | `{}` | {} |\n",
                escape_cell(&region.region_name),
                escape_cell(&region.map_key),
                region.cluster_id,
                region.color,
                if region.matched { "yes" } else { "**no**" }
            ));
        }
        section.push('\n');
    }

    if !map.unmatched_keys.is_empty() {
        section.push_str(&format!(
            "**Unmatched map keys ({}):** these regions are not colored.\n\n",
            map.unmatched_keys.len()
        ));
        for key in &map.unmatched_keys {
            section.push_str(&format!("- `{}`\n", key));
        }
        section.push('\n');
    }

    if !map.duplicate_keys.is_empty() {
        section.push_str("**Ambiguous map keys:** shared by several regions or features.\n\n");
        for key in &map.duplicate_keys {
            section.push_str(&format!("- `{}`\n", key));
        }
        section.push('\n');
    }

    if !map.unused_features.is_empty() {
        section.push_str(&format!(
            "<details>\n<summary>Boundary features without a region in this view ({})</summary>\n\n",
            map.unused_features.len()
        ));
        for key in &map.unused_features {
            section.push_str(&format!("- {}\n", key));
        }
        section.push_str("\n</details>\n\n");
    }

    section
}

/// Value of one table cell for a record.
fn table_cell(record: &RegionRecord, column: &str, report: &DashboardReport) -> String {
    if column == report.name_column {
        escape_cell(&record.region_name)
    } else if column == report.cluster_column {
        record.cluster_id.to_string()
    } else if let Some(value) = record.indicator(column) {
        format_value(value, report.metadata.decimals)
    } else {
        record.extra(column).map(escape_cell).unwrap_or_default()
    }
}

/// Generate the data table of the selected regions.
fn generate_table_section(report: &DashboardReport) -> String {
    let mut section = String::new();

    section.push_str("## Clustering Results\n\n");

    if report.regions.is_empty() {
        section.push_str("No regions match the current selection.\n\n");
        return section;
    }

    let headers: Vec<String> = report.columns.iter().map(|c| escape_cell(c)).collect();
    section.push_str(&format!("| {} | Map Key |\n", headers.join(" | ")));
    section.push_str(&format!("|{}:---|\n", ":---|".repeat(headers.len())));

    for record in &report.regions {
        let cells: Vec<String> = report
            .columns
            .iter()
            .map(|column| table_cell(record, column, report))
            .collect();
        section.push_str(&format!(
            "| {} | {} |\n",
            cells.join(" | "),
            escape_cell(&record.map_key)
        ));
    }
    section.push('\n');

    section
}

/// Generate the cluster profile table.
fn generate_profile_section(
    profiles: &ClusterProfiles,
    indicators: &[String],
    decimals: usize,
) -> String {
    let mut section = String::new();

    section.push_str("## Cluster Profiles\n\n");
    section.push_str("Mean of each education indicator per cluster.\n\n");

    if profiles.is_empty() {
        section.push_str("No clusters in the current selection.\n\n");
        return section;
    }

    section.push_str(&format!("| Cluster | Regions | {} |\n", indicators.join(" | ")));
    section.push_str(&format!("|:---:|:---:|{}\n", "---:|".repeat(indicators.len())));

    for profile in profiles.iter() {
        let values: Vec<String> = indicators
            .iter()
            .map(|name| format_value(profile.mean(name).unwrap_or(f64::NAN), decimals))
            .collect();
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            profile.cluster_id,
            profile.members,
            values.join(" | ")
        ));
    }
    section.push('\n');

    if profiles.len() > 1 {
        let extremes = indicator_extremes(profiles, indicators);
        if !extremes.is_empty() {
            for (indicator, best, worst) in extremes {
                section.push_str(&format!(
                    "- **{}:** highest in Cluster {}, lowest in Cluster {}\n",
                    indicator, best, worst
                ));
            }
            section.push('\n');
        }
    }

    section
}

/// Generate the radar series in long form.
fn generate_radar_section(radar: &[RadarPoint], decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("## Indicator Patterns\n\n");

    if radar.is_empty() {
        section.push_str("Nothing to plot for the current selection.\n\n");
        return section;
    }

    section.push_str("| Cluster | Indicator | Value |\n");
    section.push_str("|:---:|:---|---:|\n");
    for point in radar {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            point.cluster_id,
            point.indicator,
            format_value(point.value, decimals)
        ));
    }
    section.push('\n');

    section
}

/// Generate the interpretation section.
fn generate_interpretation_section(text: &str) -> String {
    format!("## Interpretation\n\n{}\n\n", text)
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by EduSeg from Fuzzy C-Means clustering results*\n");

    footer
}

/// Generate a JSON report. Missing means serialize as `null`.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{cluster_profiles, radar_series};
    use crate::models::{ClusterSelector, Indicator, RegionColor};
    use chrono::Utc;

    fn indicators() -> Vec<String> {
        vec!["APM_SD".to_string(), "HLS".to_string()]
    }

    fn region(name: &str, key: &str, cluster_id: u32, apm: f64, hls: f64) -> RegionRecord {
        RegionRecord {
            region_name: name.to_string(),
            map_key: key.to_string(),
            cluster_id,
            indicators: vec![
                Indicator {
                    name: "APM_SD".to_string(),
                    value: apm,
                },
                Indicator {
                    name: "HLS".to_string(),
                    value: hls,
                },
            ],
            extras: vec![("Derajat_C1".to_string(), "0.64".to_string())],
        }
    }

    fn create_test_report(regions: Vec<RegionRecord>) -> DashboardReport {
        let profiles = cluster_profiles(&regions, &indicators());
        let radar = radar_series(&profiles);

        DashboardReport {
            metadata: ReportMetadata {
                title: "Education Quality Segmentation Dashboard".to_string(),
                province: "Sumatera Barat".to_string(),
                data_source: "hasil_klaster_fcm_sumbar.csv".to_string(),
                boundary_source: Some("sumbar.geojson".to_string()),
                selector: ClusterSelector::All,
                generated_at: Utc::now(),
                duration_seconds: 0.01,
                decimals: 2,
            },
            summary: DashboardSummary {
                selected_regions: regions.len(),
                total_regions: 19,
                cluster_count: 3,
            },
            legend: vec![ClusterStyle {
                id: 1,
                label: "Low".to_string(),
                color: "#d73027".to_string(),
            }],
            columns: vec![
                "Kabupaten_Kota".to_string(),
                "APM_SD".to_string(),
                "HLS".to_string(),
                "Derajat_C1".to_string(),
                "Cluster".to_string(),
            ],
            name_column: "Kabupaten_Kota".to_string(),
            cluster_column: "Cluster".to_string(),
            indicators: indicators(),
            regions,
            profiles,
            radar,
            map: Some(MapView {
                source: "sumbar.geojson".to_string(),
                feature_id_key: "properties.NAME_2".to_string(),
                matched: 1,
                regions: vec![RegionColor {
                    region_name: "Kabupaten Agam".to_string(),
                    map_key: "Agam".to_string(),
                    cluster_id: 1,
                    color: "#d73027".to_string(),
                    matched: true,
                    indicators: Vec::new(),
                }],
                unmatched_keys: vec!["Mentawai".to_string()],
                duplicate_keys: Vec::new(),
                unused_features: vec!["Kepulauan Mentawai".to_string()],
                error: None,
            }),
            interpretation: Some("Higher clusters have better access.".to_string()),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(vec![
            region("Kabupaten Agam", "Agam", 1, 97.5, 13.1),
            region("Kota Padang", "Padang", 3, 99.25, 16.4),
        ]);
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Education Quality Segmentation Dashboard"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Cluster Map"));
        assert!(markdown.contains("## Clustering Results"));
        assert!(markdown.contains("## Cluster Profiles"));
        assert!(markdown.contains("## Indicator Patterns"));
        assert!(markdown.contains("## Interpretation"));
        assert!(markdown.contains("| **2** | **19** | **3** |"));
        assert!(markdown.contains("| 1 | Low | `#d73027` | 1 |"));
        assert!(markdown.contains("| Kota Padang | 99.25 | 16.40 | 0.64 | 3 | Padang |"));
        assert!(markdown.contains("- `Mentawai`"));
    }

    #[test]
    fn test_profile_section_values() {
        let regions = vec![
            region("Kabupaten Agam", "Agam", 1, 80.0, 12.0),
            region("Kabupaten Solok", "Solok", 1, 90.0, 13.0),
            region("Kota Padang", "Padang", 2, 70.0, 16.0),
        ];
        let profiles = cluster_profiles(&regions, &indicators());
        let section = generate_profile_section(&profiles, &indicators(), 2);

        assert!(section.contains("| Cluster | Regions | APM_SD | HLS |"));
        assert!(section.contains("| 1 | 2 | 85.00 | 12.50 |"));
        assert!(section.contains("| 2 | 1 | 70.00 | 16.00 |"));
        assert!(section.contains("**APM_SD:** highest in Cluster 1, lowest in Cluster 2"));
    }

    #[test]
    fn test_empty_selection_renders() {
        let report = create_test_report(Vec::new());
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("No regions match the current selection."));
        assert!(markdown.contains("No clusters in the current selection."));
        assert!(markdown.contains("Nothing to plot for the current selection."));
    }

    #[test]
    fn test_map_unavailable() {
        let map = MapView::failed(
            "sumbar.geojson".to_string(),
            "properties.NAME_2".to_string(),
            "boundary document not found: sumbar.geojson".to_string(),
        );
        let section = generate_map_section(&map);
        assert!(section.contains("Map unavailable"));
        assert!(!section.contains("| Region |"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(85.0, 2), "85.00");
        assert_eq!(format_value(13.456, 1), "13.5");
        assert_eq!(format_value(f64::NAN, 2), "n/a");
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(vec![region("Kabupaten Agam", "Agam", 1, f64::NAN, 13.1)]);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"profiles\""));
        assert!(json.contains("\"selector\": \"all\""));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["profiles"][0]["means"][0]["value"].is_null());
        assert_eq!(value["regions"][0]["map_key"], "Agam");
    }
}
