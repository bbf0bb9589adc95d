use crate::model::{Cell, Table};
use rust_decimal::RoundingStrategy;
use serde::Serialize;

/// Longest text placed in one layout cell, in characters.
pub const MAX_CELL_CHARS: usize = 30;

const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// Page geometry in points, origin at the bottom left of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub x_start: f64,
    pub y_start: f64,
    pub column_step: f64,
    pub row_step: f64,
    /// A new page starts once the next row would sit below this line.
    pub bottom_margin: f64,
    pub page_height: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            x_start: 10.0 * POINTS_PER_MM,
            y_start: 270.0 * POINTS_PER_MM,
            column_step: 40.0 * POINTS_PER_MM,
            row_step: 10.0,
            bottom_margin: 40.0,
            page_height: 792.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedText {
    pub column: usize,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPage {
    pub number: usize,
    pub items: Vec<PlacedText>,
}

/// Position every header and cell of `table` on letter-sized pages.
///
/// The header only appears on the first page; continuation pages start
/// directly with data rows at `y_start`.
pub fn layout_pages(table: &Table, options: &LayoutOptions) -> Vec<LayoutPage> {
    let mut pages = vec![LayoutPage {
        number: 1,
        items: Vec::new(),
    }];
    let mut y = options.y_start;

    place_row(
        &mut pages,
        options,
        y,
        table.columns().iter().map(|c| c.name.clone()),
    );
    y -= options.row_step;

    let rows = table.rows();
    for (i, record) in rows.iter().enumerate() {
        place_row(&mut pages, options, y, record.cells().iter().map(cell_text));
        y -= options.row_step;
        if y < options.bottom_margin && i + 1 < rows.len() {
            pages.push(LayoutPage {
                number: pages.len() + 1,
                items: Vec::new(),
            });
            y = options.y_start;
        }
    }

    pages
}

fn place_row(
    pages: &mut [LayoutPage],
    options: &LayoutOptions,
    y: f64,
    texts: impl Iterator<Item = String>,
) {
    let Some(page) = pages.last_mut() else {
        return;
    };
    for (column, text) in texts.enumerate() {
        page.items.push(PlacedText {
            column,
            x: options.x_start + column as f64 * options.column_step,
            y,
            text,
        });
    }
}

/// Text drawn for a cell: numbers rounded to two places, everything else
/// cut to [`MAX_CELL_CHARS`].
pub fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Number(v) => format!(
            "{:.2}",
            v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        ),
        Cell::Text(s) => truncate(s),
        Cell::Numbers(values) => truncate(
            &values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Cell::Empty => String::new(),
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(MAX_CELL_CHARS).collect()
}

/// Render pages as fixed-width text, one line per row position, pages
/// separated by form feeds.
pub fn render_text(pages: &[LayoutPage]) -> String {
    let cell_width = MAX_CELL_CHARS + 2;
    let mut out = String::new();

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push('\x0c');
        }

        let mut lines: Vec<(f64, Vec<&PlacedText>)> = Vec::new();
        for item in &page.items {
            match lines.iter_mut().find(|(y, _)| (*y - item.y).abs() < f64::EPSILON) {
                Some((_, items)) => items.push(item),
                None => lines.push((item.y, vec![item])),
            }
        }
        lines.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (_, mut items) in lines {
            items.sort_by_key(|item| item.column);
            let mut line = String::new();
            for item in items {
                let target = item.column * cell_width;
                let current = line.chars().count();
                if current < target {
                    line.extend(std::iter::repeat(' ').take(target - current));
                } else if current > 0 {
                    line.push(' ');
                }
                line.push_str(&item.text);
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    out
}
