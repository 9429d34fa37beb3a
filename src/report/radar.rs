//! Radar (polar line) chart rendering.
//!
//! One closed polygon per cluster profile, one axis per indicator,
//! drawn as a standalone SVG document.

use crate::analysis::max_mean;
use crate::models::{ClusterPalette, ClusterProfiles};
use std::f64::consts::PI;
use std::fmt::Write;

const SIZE: f64 = 640.0;
const RADIUS: f64 = 220.0;
const RINGS: usize = 5;

/// Round `value` up to 1, 2 or 5 times a power of ten.
pub fn nice_ceiling(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }

    let magnitude = 10f64.powf(value.log10().floor());
    let scaled = value / magnitude;
    let step = if scaled <= 1.0 {
        1.0
    } else if scaled <= 2.0 {
        2.0
    } else if scaled <= 5.0 {
        5.0
    } else {
        10.0
    };

    step * magnitude
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Position of `value` on axis `index` of `count`, starting at twelve
/// o'clock and going clockwise.
fn point(index: usize, count: usize, value: f64, scale: f64) -> (f64, f64) {
    let center = SIZE / 2.0;
    let angle = -PI / 2.0 + 2.0 * PI * index as f64 / count as f64;
    let r = RADIUS * (value / scale).clamp(0.0, 1.0);
    (center + r * angle.cos(), center + r * angle.sin())
}

fn label_point(index: usize, count: usize) -> (f64, f64) {
    let center = SIZE / 2.0;
    let angle = -PI / 2.0 + 2.0 * PI * index as f64 / count as f64;
    let r = RADIUS + 18.0;
    (center + r * angle.cos(), center + r * angle.sin())
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{:.2},{:.2}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the cluster profiles as an SVG radar chart.
///
/// Missing means are drawn at the center. With no profiles the axes are
/// still drawn, with a "No data" note.
pub fn render_radar_svg(
    profiles: &ClusterProfiles,
    indicators: &[String],
    palette: &ClusterPalette,
    title: &str,
) -> String {
    let count = indicators.len().max(1);
    let scale = nice_ceiling(max_mean(profiles).unwrap_or(0.0));
    let center = SIZE / 2.0;
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{0}" height="{0}" viewBox="0 0 {0} {0}" font-family="sans-serif">"#,
        SIZE
    );
    let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="28" text-anchor="middle" font-size="16">{}</text>"#,
        center,
        escape_xml(title)
    );

    // Grid rings with their scale labels
    for ring in 1..=RINGS {
        let value = scale * ring as f64 / RINGS as f64;
        let ring_points: Vec<(f64, f64)> =
            (0..count).map(|i| point(i, count, value, scale)).collect();
        let _ = writeln!(
            svg,
            r##"  <polygon class="grid" points="{}" fill="none" stroke="#dddddd"/>"##,
            points_attr(&ring_points)
        );
        let (x, y) = point(0, count, value, scale);
        let _ = writeln!(
            svg,
            r##"  <text x="{:.2}" y="{:.2}" font-size="11" fill="#777777">{}</text>"##,
            x + 4.0,
            y,
            value
        );
    }

    // Axes, labelled just outside the outer ring
    for (i, name) in indicators.iter().enumerate() {
        let (x, y) = point(i, count, scale, scale);
        let (lx, ly) = label_point(i, count);
        let anchor = if (lx - center).abs() < 1.0 {
            "middle"
        } else if lx > center {
            "start"
        } else {
            "end"
        };
        let _ = writeln!(
            svg,
            r##"  <line class="axis" x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="#bbbbbb"/>"##,
            center, center, x, y
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{:.2}" y="{:.2}" text-anchor="{}" font-size="13">{}</text>"#,
            lx,
            ly,
            anchor,
            escape_xml(name)
        );
    }

    // One closed polygon per cluster
    for profile in profiles.iter() {
        let color = palette.color(profile.cluster_id);
        let series: Vec<(f64, f64)> = indicators
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = profile
                    .mean(name)
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0);
                point(i, count, value, scale)
            })
            .collect();
        let _ = writeln!(
            svg,
            r#"  <polygon class="series" data-cluster="{}" points="{}" fill="{}" fill-opacity="0.15" stroke="{}" stroke-width="2"/>"#,
            profile.cluster_id,
            points_attr(&series),
            color,
            color
        );
    }

    // Legend
    for (row, profile) in profiles.iter().enumerate() {
        let y = 56.0 + row as f64 * 20.0;
        let _ = writeln!(
            svg,
            r#"  <rect x="16" y="{:.0}" width="12" height="12" fill="{}"/>"#,
            y - 10.0,
            palette.color(profile.cluster_id)
        );
        let _ = writeln!(
            svg,
            r#"  <text x="34" y="{:.0}" font-size="12">{}</text>"#,
            y,
            escape_xml(&palette.label(profile.cluster_id))
        );
    }

    if profiles.is_empty() {
        let _ = writeln!(
            svg,
            r##"  <text x="{0}" y="{0}" text-anchor="middle" font-size="14" fill="#999999">No data</text>"##,
            center
        );
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cluster_profiles;
    use crate::models::{ClusterStyle, Indicator, RegionRecord};

    fn palette() -> ClusterPalette {
        ClusterPalette::new(
            vec![
                ClusterStyle {
                    id: 1,
                    label: "Low".to_string(),
                    color: "#d73027".to_string(),
                },
                ClusterStyle {
                    id: 3,
                    label: "High".to_string(),
                    color: "#1a9850".to_string(),
                },
            ],
            "#bdbdbd",
        )
    }

    fn record(cluster_id: u32, apm: f64, hls: f64) -> RegionRecord {
        RegionRecord {
            region_name: "Region".to_string(),
            map_key: "Region".to_string(),
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
            extras: Vec::new(),
        }
    }

    #[test]
    fn test_nice_ceiling() {
        assert_eq!(nice_ceiling(99.4), 100.0);
        assert_eq!(nice_ceiling(100.0), 100.0);
        assert_eq!(nice_ceiling(16.2), 20.0);
        assert_eq!(nice_ceiling(43.0), 50.0);
        assert_eq!(nice_ceiling(0.0), 1.0);
        assert_eq!(nice_ceiling(f64::NAN), 1.0);
    }

    #[test]
    fn test_point_geometry() {
        let (x, y) = point(0, 4, 1.0, 1.0);
        assert!((x - SIZE / 2.0).abs() < 1e-9);
        assert!((y - (SIZE / 2.0 - RADIUS)).abs() < 1e-9);

        let (x, y) = point(1, 4, 0.5, 1.0);
        assert!((x - (SIZE / 2.0 + RADIUS / 2.0)).abs() < 1e-9);
        assert!((y - SIZE / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_one_polygon_per_cluster() {
        let indicators = vec!["APM_SD".to_string(), "HLS".to_string()];
        let records = vec![record(1, 97.0, 13.0), record(3, 99.0, 16.0), record(1, 96.0, 12.5)];
        let profiles = cluster_profiles(&records, &indicators);

        let svg = render_radar_svg(&profiles, &indicators, &palette(), "Indicators & clusters");

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches(r#"class="series""#).count(), 2);
        assert_eq!(svg.matches(r#"class="axis""#).count(), 2);
        assert!(svg.contains(r#"data-cluster="3""#));
        assert!(svg.contains("#1a9850"));
        assert!(svg.contains("Cluster 1 (Low)"));
        assert!(svg.contains("Indicators &amp; clusters"));
        assert!(!svg.contains("No data"));
    }

    #[test]
    fn test_render_empty_profiles() {
        let indicators = vec!["APM_SD".to_string()];
        let svg = render_radar_svg(&ClusterProfiles::default(), &indicators, &palette(), "Empty");
        assert!(svg.contains("No data"));
        assert_eq!(svg.matches(r#"class="series""#).count(), 0);
    }
}
