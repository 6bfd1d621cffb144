//! Plain-text table rendering for terminal output.

use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A titled table; columns whose every cell is numeric are right-aligned.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    title: Option<String>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: None,
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn alignments(&self) -> Vec<Align> {
        (0..self.headers.len())
            .map(|idx| {
                let numeric = !self.rows.is_empty()
                    && self.rows.iter().all(|row| {
                        row.get(idx)
                            .is_some_and(|cell| is_numeric(cell) || cell.is_empty())
                    });
                if numeric { Align::Right } else { Align::Left }
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let column_count = self.headers.len();
        let mut widths = self
            .headers
            .iter()
            .map(|h| display_width(h))
            .collect::<Vec<_>>();
        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate().take(column_count) {
                widths[idx] = widths[idx].max(display_width(cell));
            }
        }
        for width in &mut widths {
            *width = (*width).max(3);
        }
        let aligns = self.alignments();

        let mut output = String::new();
        if let Some(title) = &self.title {
            let _ = writeln!(output, "{title}");
        }
        let _ = writeln!(output, "{}", format_row(&self.headers, &widths, &aligns));
        let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
        let _ = writeln!(output, "{}", format_row(&separator, &widths, &aligns));
        for row in &self.rows {
            let _ = writeln!(output, "{}", format_row(row, &widths, &aligns));
        }
        output
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

fn is_numeric(cell: &str) -> bool {
    let trimmed = cell.trim();
    !trimmed.is_empty() && trimmed.replace(',', "").parse::<f64>().is_ok()
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let mut cells = Vec::with_capacity(widths.len());
    for (idx, width) in widths.iter().enumerate() {
        let value = values.get(idx).map(String::as_str).unwrap_or("");
        let sanitized = sanitize_cell(value);
        let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
        let cell = match aligns.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => format!("{sanitized}{padding}"),
            Align::Right => format!("{padding}{sanitized}"),
        };
        cells.push(cell);
    }
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

/// Thousands separators for integer metrics, e.g. `12,345`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_columns_align_right() {
        let mut table = TextTable::new(["name", "clicks"]);
        table.push_row(vec!["Alice".to_string(), "5".to_string()]);
        table.push_row(vec!["Bob".to_string(), "1,250".to_string()]);
        let rendered = table.render();
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "name   clicks",
                "-----  ------",
                "Alice       5",
                "Bob     1,250"
            ]
        );
    }

    #[test]
    fn title_precedes_header_and_control_chars_are_flattened() {
        let mut table = TextTable::new(["note"]).titled("Notes");
        table.push_row(vec!["line1\nline2\tvalue".to_string()]);
        let rendered = table.render();
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Notes");
        assert_eq!(lines[3], "line1 line2 value");
    }

    #[test]
    fn group_thousands_inserts_commas() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
