//! Markdown table output for the terminal.

use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::Table;

use crate::frame::ExportFrame;

/// Render `frame` as a markdown table.
pub fn render_table(frame: &ExportFrame) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN).set_header(&frame.header);
    for row in &frame.rows {
        table.add_row(row);
    }
    table.to_string()
}
