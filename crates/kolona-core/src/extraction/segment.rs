use super::{PageContent, PageRows};

/// Split a layout line into cells on runs of two or more whitespace
/// characters. A single space stays inside the cell.
pub fn split_on_gaps(line: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut start: Option<usize> = None;
    let mut gap_start = 0;
    let mut gap_len = 0;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if gap_len == 0 {
                gap_start = i;
            }
            gap_len += 1;
            if gap_len == 2 {
                if let Some(s) = start.take() {
                    cells.push(&line[s..gap_start]);
                }
            }
        } else {
            if start.is_none() {
                start = Some(i);
            }
            gap_len = 0;
        }
    }

    if let Some(s) = start {
        cells.push(line[s..].trim_end());
    }

    cells
}

/// Rows of one page; blank lines produce no row.
pub fn segment_page(page: &PageContent) -> PageRows {
    let rows = page
        .lines
        .iter()
        .map(|l| split_on_gaps(l))
        .filter(|cells| !cells.is_empty())
        .map(|cells| cells.into_iter().map(str::to_string).collect())
        .collect();
    PageRows {
        page_number: page.page_number,
        rows,
    }
}
