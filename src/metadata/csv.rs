//! Tabular metadata rows.
//!
//! The heading is `Name, Description`, then one column per layer and one per
//! stat, using display names. A cell holding a zero value (empty string or
//! 0) is left blank to keep sheets readable.

use super::Metadata;
use super::stats::StatValue;
use crate::config::GeneratorConfig;
use crate::selection::ChosenPiece;

pub const NAME_COLUMN: &str = "Name";
pub const DESCRIPTION_COLUMN: &str = "Description";

/// Column labels for a run.
pub fn heading(config: &GeneratorConfig) -> Vec<String> {
    let mut columns = vec![NAME_COLUMN.to_string(), DESCRIPTION_COLUMN.to_string()];
    columns.extend(
        config
            .settings
            .piece_order
            .iter()
            .map(|layer| config.layer_display_name(layer)),
    );
    columns.extend(
        config
            .settings
            .stats
            .keys()
            .map(|stat| config.stat_display_name(stat)),
    );
    columns
}

/// Joins labels into a heading line.
pub fn heading_line(columns: &[String]) -> String {
    join_cells(columns.iter().map(|c| escape(c)))
}

/// Renders one asset's metadata as a row matching [`heading`].
///
/// Cells are laid out by position: name, description, one per chosen piece
/// in piece order, then one per clamped stat in config order.
pub fn row(meta: &Metadata, pieces: &[ChosenPiece], stats: &[StatValue]) -> String {
    let cells = [meta.name.as_str(), meta.description.as_str()]
        .into_iter()
        .chain(pieces.iter().map(|p| p.friendly_name.as_str()))
        .map(escape)
        .chain(stats.iter().map(|s| number_cell(s.value)));
    join_cells(cells)
}

/// A zero stat renders blank.
fn number_cell(value: i64) -> String {
    if value == 0 { String::new() } else { value.to_string() }
}

fn escape(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn join_cells(cells: impl Iterator<Item = String>) -> String {
    cells.collect::<Vec<_>>().join(",")
}
