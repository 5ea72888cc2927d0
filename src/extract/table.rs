use super::ExtractError;

/// Rows shown in the markdown sample of the summary rendering.
pub const SAMPLE_ROWS: usize = 10;

/// A parsed CSV file: header row plus data rows, all as strings.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn parse_csv(bytes: &[u8]) -> Result<CsvTable, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(ExtractError::NoColumns);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(CsvTable { headers, rows })
}

impl CsvTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Whole table as right-aligned plain text columns, without an index.
    pub fn render_plain(&self) -> String {
        let widths: Vec<usize> = (0..self.column_count())
            .map(|col| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(self.headers[col].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let render_line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(render_line(&self.headers));
        for row in &self.rows {
            lines.push(render_line(row));
        }
        lines.join("\n")
    }

    /// First `limit` rows as a markdown pipe table.
    pub fn render_markdown(&self, limit: usize) -> String {
        let mut out = String::new();
        out.push_str(&markdown_row(&self.headers));
        out.push('\n');
        out.push('|');
        for _ in &self.headers {
            out.push_str(" --- |");
        }
        for row in self.rows.iter().take(limit) {
            out.push('\n');
            out.push_str(&markdown_row(row));
        }
        out
    }

    pub fn render_summary(&self, name: &str) -> String {
        format!(
            "The file {} has {} rows and {} columns.\nColumns: {}\n\nFirst {} rows:\n{}",
            name,
            self.row_count(),
            self.column_count(),
            self.headers.join(", "),
            SAMPLE_ROWS.min(self.row_count()),
            self.render_markdown(SAMPLE_ROWS)
        )
    }
}

fn markdown_row(cells: &[String]) -> String {
    let escaped: Vec<String> = cells
        .iter()
        .map(|c| c.replace('|', "\\|").replace(['\r', '\n'], " "))
        .collect();
    format!("| {} |", escaped.join(" | "))
}
