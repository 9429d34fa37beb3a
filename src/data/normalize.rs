//! Region name normalization.
//!
//! The result table names regions the way the statistics office does
//! ("Kabupaten Padang Pariaman", "Kota Padang") while the boundary
//! document keys features by the bare name. The map key is the display
//! name with administrative-type prefixes removed.

/// Prefixes stripped when no configuration overrides them.
pub const DEFAULT_PREFIXES: &[&str] = &["Kabupaten ", "Kota ", "Regency ", "City "];

/// Derive the map key for a region name.
///
/// Leading prefixes are removed repeatedly, so the result never starts
/// with one and normalizing twice equals normalizing once.
pub fn normalize_with<S: AsRef<str>>(region_name: &str, prefixes: &[S]) -> String {
    let mut rest = region_name.trim_start();

    loop {
        let stripped = prefixes
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|p| !p.is_empty())
            .find_map(|p| rest.strip_prefix(p));

        match stripped {
            Some(next) => rest = next.trim_start(),
            None => break,
        }
    }

    rest.trim_end().to_string()
}
