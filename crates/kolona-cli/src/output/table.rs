use kolona_core::model::{Cell, Table};

pub fn print(table: &Table) {
    print!("{}", format_table(table));
}

/// Plain aligned columns: header, a rule, then one line per record.
pub fn format_table(table: &Table) -> String {
    let header: Vec<String> = table.column_names().iter().map(|n| n.to_string()).collect();
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|r| r.cells().iter().map(display_cell).collect())
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            std::iter::once(&header)
                .chain(rows.iter())
                .filter_map(|row| row.get(i))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

fn display_cell(cell: &Cell) -> String {
    match cell {
        Cell::Numbers(values) => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" "),
        Cell::Empty => "-".to_string(),
        other => other.to_string(),
    }
}
