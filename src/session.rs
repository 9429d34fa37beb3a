//! Interactive selection loop.
//!
//! Reads one cluster selection per line and prints the counters and the
//! cluster profile table for it. Each selection goes through
//! [`Dashboard::on_filter_changed`] against the table held in memory;
//! only `r` reads the source file again.

use crate::dashboard::{Dashboard, FilterView};
use crate::models::{ClusterSelector, Dataset};
use crate::report::format_value;
use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

const PROMPT: &str = "Cluster (all, 1, 2, ..., r to reload, q to quit): ";

/// Run the loop until end of input or a quit command.
///
/// Returns the number of selections shown.
pub fn run_session<R: BufRead, W: Write>(
    dashboard: &Dashboard,
    mut input: R,
    mut output: W,
) -> Result<usize> {
    print_loaded(&dashboard.dataset(), &mut output)?;

    let mut shown = 0;
    let mut line = String::new();
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        let choice = line.trim();
        if choice.is_empty() {
            continue;
        }
        match choice.to_lowercase().as_str() {
            "q" | "quit" | "exit" => break,
            "r" | "reload" => {
                match dashboard.reload() {
                    Ok(dataset) => print_loaded(&dataset, &mut output)?,
                    Err(e) => {
                        warn!("Reload failed: {}", e);
                        writeln!(output, "Error: {}", e)?;
                    }
                }
                continue;
            }
            _ => {}
        }

        let selector: ClusterSelector = match choice.parse() {
            Ok(selector) => selector,
            Err(e) => {
                writeln!(output, "Invalid selection: {}", e)?;
                continue;
            }
        };
        debug!("Selection changed to {}", selector);

        let view = dashboard.on_filter_changed(selector);
        print_view(dashboard, &view, &mut output)?;
        shown += 1;
    }

    Ok(shown)
}

fn print_loaded<W: Write>(dataset: &Dataset, output: &mut W) -> Result<()> {
    let ids: Vec<String> = dataset.cluster_ids().iter().map(u32::to_string).collect();
    writeln!(
        output,
        "{} regions loaded, clusters: {}",
        dataset.len(),
        ids.join(", ")
    )?;
    Ok(())
}

fn print_view<W: Write>(dashboard: &Dashboard, view: &FilterView, output: &mut W) -> Result<()> {
    let decimals = dashboard.config().report.decimals;
    let palette = dashboard.palette();

    writeln!(output)?;
    writeln!(
        output,
        "{}: {} of {} regions, {} clusters in total",
        view.selector,
        view.records.len(),
        view.dataset.len(),
        view.dataset.cluster_count()
    )?;

    if view.profiles.is_empty() {
        writeln!(output, "No regions in this selection.")?;
        writeln!(output)?;
        return Ok(());
    }

    write!(output, "{:<22}", "Cluster")?;
    for name in &view.dataset.indicators {
        write!(output, " {:>14}", name)?;
    }
    writeln!(output)?;

    for profile in view.profiles.iter() {
        let label = format!("{} [{}]", palette.label(profile.cluster_id), profile.members);
        write!(output, "{:<22}", label)?;
        for name in &view.dataset.indicators {
            let value = profile.mean(name).unwrap_or(f64::NAN);
            write!(output, " {:>14}", format_value(value, decimals))?;
        }
        writeln!(output)?;
    }

    if let Some(map) = dashboard.map_view(view) {
        match map.error {
            Some(ref e) => writeln!(output, "Map unavailable: {}", e)?,
            None if map.mismatch_count() > 0 => writeln!(
                output,
                "Map: {} of {} regions joined, unmatched: [{}], ambiguous: [{}]",
                map.matched,
                map.regions.len(),
                map.unmatched_keys.join(", "),
                map.duplicate_keys.join(", ")
            )?,
            None => writeln!(
                output,
                "Map: {} of {} regions joined",
                map.matched,
                map.regions.len()
            )?,
        }
    }

    writeln!(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn dashboard(with_map: bool) -> Dashboard {
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let mut config = Config::default();
        config.data.path = fixtures.join("sumbar_fcm.csv").display().to_string();
        config.map.geojson = fixtures
            .join("sumbar_boundaries.geojson")
            .display()
            .to_string();
        Dashboard::open(config, with_map).unwrap()
    }

    fn run(input: &str, with_map: bool) -> (usize, String) {
        let dashboard = dashboard(with_map);
        let mut output = Vec::new();
        let shown = run_session(&dashboard, Cursor::new(input), &mut output).unwrap();
        (shown, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_session_selections() {
        let (shown, output) = run("all\n2\nq\n", false);

        assert_eq!(shown, 2);
        assert!(output.starts_with("19 regions loaded, clusters: 1, 2, 3"));
        assert!(output.contains("All clusters: 19 of 19 regions, 3 clusters in total"));
        assert!(output.contains("Cluster 2: 7 of 19 regions"));
        assert!(output.contains("Cluster 2 (Medium) [7]"));
    }

    #[test]
    fn test_session_invalid_and_empty_selection() {
        let (shown, output) = run("tinggi\n\n7\n", false);

        assert_eq!(shown, 1);
        assert!(output.contains("Invalid selection"));
        assert!(output.contains("Cluster 7: 0 of 19 regions"));
        assert!(output.contains("No regions in this selection."));
    }

    #[test]
    fn test_session_reload() {
        let (shown, output) = run("r\n3\n", false);
        assert_eq!(shown, 1);
        assert_eq!(output.matches("19 regions loaded").count(), 2);
        assert!(output.contains("Cluster 3 (High) [7]"));
    }

    #[test]
    fn test_session_quit_stops_reading() {
        let (shown, _) = run("quit\n1\n", false);
        assert_eq!(shown, 0);
    }

    #[test]
    fn test_session_reports_map_mismatches() {
        let (_, output) = run("all\n", true);
        assert!(output.contains("Map: 17 of 19 regions joined"));
        assert!(output.contains("unmatched: [Kep. Mentawai]"));
        assert!(output.contains("ambiguous: [Solok]"));
    }
}
