/// A two-dimensional labeled table rendered into an HTML fragment.
///
/// Column and row labels are paths (one entry per level), so both
/// single-level and hierarchical headers are expressed the same way.
/// The table is substituted into the body at render time; it never
/// becomes a MIME part of its own.
#[derive(Clone, Debug, Default)]
pub struct Table {
    column_labels: Vec<Vec<String>>,
    row_labels: Vec<Vec<String>>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Table with a single level of column labels and no rows yet.
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Table {
        Table {
            column_labels: columns.into_iter().map(|c| vec![c.into()]).collect(),
            row_labels: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Table with hierarchical column labels, one path per column.
    pub fn with_columns(columns: Vec<Vec<String>>) -> Table {
        Table {
            column_labels: columns,
            row_labels: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<S: Into<String>>(&mut self, cells: Vec<S>) {
        self.row_labels.push(Vec::new());
        self.rows.push(cells.into_iter().map(|c| c.into()).collect());
    }

    pub fn push_labeled_row<S: Into<String>>(&mut self, label: Vec<S>, cells: Vec<S>) {
        self.row_labels
            .push(label.into_iter().map(|l| l.into()).collect());
        self.rows.push(cells.into_iter().map(|c| c.into()).collect());
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.column_labels.len()
    }

    /// Render the table as an HTML fragment.
    ///
    /// Header: one row per column-label level; adjacent columns sharing a
    /// label under the same ancestor path are merged with colspan.
    /// Body: row-label cells lead each row, with consecutive runs merged
    /// via rowspan the same way. A table with zero data rows renders as a
    /// header-only table. Never fails.
    pub fn to_html(&self) -> String {
        let header_depth = depth_of(&self.column_labels);
        let label_depth = depth_of(&self.row_labels);

        let mut html = String::from("<table>\n<thead>\n");

        for level in 0..header_depth {
            html.push_str("<tr>");

            // Pad the row-label columns once, spanning the whole header
            if label_depth > 0 && level == 0 {
                html.push_str(&format!(
                    "<th colspan=\"{}\" rowspan=\"{}\"></th>",
                    label_depth, header_depth
                ));
            }

            for (start, span) in spans_at_level(&self.column_labels, level) {
                let text = label_at(&self.column_labels[start], level);
                if span > 1 {
                    html.push_str(&format!("<th colspan=\"{}\">{}</th>", span, escape(text)));
                } else {
                    html.push_str(&format!("<th>{}</th>", escape(text)));
                }
            }

            html.push_str("</tr>\n");
        }

        html.push_str("</thead>\n<tbody>\n");

        for (i, row) in self.rows.iter().enumerate() {
            html.push_str("<tr>");

            for level in 0..label_depth {
                if let Some(span) = rowspan_at(&self.row_labels, i, level) {
                    let text = label_at(&self.row_labels[i], level);
                    if span > 1 {
                        html.push_str(&format!(
                            "<th rowspan=\"{}\">{}</th>",
                            span,
                            escape(text)
                        ));
                    } else {
                        html.push_str(&format!("<th>{}</th>", escape(text)));
                    }
                }
            }

            for cell in row {
                html.push_str(&format!("<td>{}</td>", escape(cell)));
            }

            html.push_str("</tr>\n");
        }

        html.push_str("</tbody>\n</table>");
        html
    }
}

fn depth_of(labels: &[Vec<String>]) -> usize {
    labels.iter().map(|l| l.len()).max().unwrap_or(0)
}

fn label_at(path: &[String], level: usize) -> &str {
    path.get(level).map(|s| s.as_str()).unwrap_or("")
}

/// Prefix of `path` up to and including `level`, padded with "".
fn prefix_of(path: &[String], level: usize) -> Vec<&str> {
    (0..=level).map(|l| label_at(path, l)).collect()
}

/// Runs of adjacent columns sharing the full label prefix at `level`,
/// as (start index, span) pairs.
fn spans_at_level(labels: &[Vec<String>], level: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;

    while start < labels.len() {
        let prefix = prefix_of(&labels[start], level);
        let mut end = start + 1;

        while end < labels.len() && prefix_of(&labels[end], level) == prefix {
            end += 1;
        }

        spans.push((start, end - start));
        start = end;
    }

    spans
}

/// Rowspan for the label cell of row `i` at `level`, or None when the
/// cell is covered by a span opened on an earlier row.
fn rowspan_at(labels: &[Vec<String>], i: usize, level: usize) -> Option<usize> {
    let prefix = prefix_of(&labels[i], level);

    if i > 0 && prefix_of(&labels[i - 1], level) == prefix {
        return None;
    }

    let mut span = 1;
    while i + span < labels.len() && prefix_of(&labels[i + span], level) == prefix {
        span += 1;
    }

    Some(span)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn simple_3x3() -> Table {
        let mut table = Table::new(vec!["first", "second", "third"]);
        table.push_row(vec!["1", "2", "3"]);
        table.push_row(vec!["4", "5", "6"]);
        table.push_row(vec!["7", "8", "9"]);
        table
    }

    #[test]
    fn simple_table() {
        let html = simple_3x3().to_html();

        assert!(html.starts_with("<table>"));
        assert!(html.contains("<th>first</th>"));
        assert!(html.contains("<td>5</td>"));
        // Header row plus three data rows
        assert_eq!(html.matches("<tr>").count(), 4);
    }

    #[test]
    fn single_column_table() {
        let mut table = Table::new(vec!["first"]);
        table.push_row(vec!["1"]);
        table.push_row(vec!["2"]);
        table.push_row(vec!["3"]);

        let html = table.to_html();

        assert!(html.contains("<th>first</th>"));
        assert_eq!(html.matches("<td>").count(), 3);
    }

    #[test]
    fn empty_table() {
        let table = Table::new(vec!["first", "second", "third"]);
        let html = table.to_html();

        assert!(!html.is_empty());
        assert!(html.contains("<th>second</th>"));
        assert_eq!(html.matches("<td>").count(), 0);
    }

    #[test]
    fn row_labels() {
        let mut table = Table::new(vec!["first", "second", "third"]);
        table.push_labeled_row(vec!["a"], vec!["1", "2", "3"]);
        table.push_labeled_row(vec!["b"], vec!["4", "5", "6"]);
        table.push_labeled_row(vec!["c"], vec!["7", "8", "9"]);

        let html = table.to_html();

        assert!(html.contains("<th>a</th>"));
        // Blank padding cell above the label column
        assert!(html.contains("<th colspan=\"1\" rowspan=\"1\"></th>"));
    }

    #[test]
    fn hierarchical_columns_are_spanned() {
        let columns = vec![
            vec!["parent a".to_string(), "child a".to_string()],
            vec!["parent a".to_string(), "child b".to_string()],
            vec!["parent b".to_string(), "child a".to_string()],
            vec!["parent c".to_string(), "child a".to_string()],
        ];
        let mut table = Table::with_columns(columns);
        table.push_row(vec!["1", "2", "3", "a"]);
        table.push_row(vec!["4", "5", "6", "b"]);

        let html = table.to_html();

        // Two header levels
        assert!(html.contains("<th colspan=\"2\">parent a</th>"));
        assert!(html.contains("<th>parent b</th>"));
        assert!(html.contains("<th>child b</th>"));
    }

    #[test]
    fn hierarchical_rows_are_spanned() {
        let mut table = Table::new(vec!["first"]);
        table.push_labeled_row(
            vec!["row a".to_string(), "sub a".to_string()],
            vec!["1".to_string()],
        );
        table.push_labeled_row(
            vec!["row a".to_string(), "sub b".to_string()],
            vec!["2".to_string()],
        );
        table.push_labeled_row(
            vec!["row b".to_string(), "sub a".to_string()],
            vec!["3".to_string()],
        );

        let html = table.to_html();

        assert!(html.contains("<th rowspan=\"2\">row a</th>"));
        assert!(html.contains("<th>row b</th>"));
        // "sub a" under "row a" and under "row b" must not merge
        assert_eq!(html.matches("<th>sub a</th>").count(), 2);
    }

    #[test]
    fn repeated_labels_merge_fully() {
        // Both rows and both columns carry identical paths
        let columns = vec![
            vec!["col a".to_string(), "child b".to_string()],
            vec!["col a".to_string(), "child b".to_string()],
        ];
        let mut table = Table::with_columns(columns);
        table.push_labeled_row(
            vec!["row a".to_string(), "child b".to_string()],
            vec!["1".to_string(), "2".to_string()],
        );
        table.push_labeled_row(
            vec!["row a".to_string(), "child b".to_string()],
            vec!["4".to_string(), "5".to_string()],
        );

        let html = table.to_html();

        assert!(html.contains("<th colspan=\"2\">col a</th>"));
        assert!(html.contains("<th colspan=\"2\">child b</th>"));
        assert!(html.contains("<th rowspan=\"2\">row a</th>"));
    }

    #[test]
    fn cells_are_escaped() {
        let mut table = Table::new(vec!["x"]);
        table.push_row(vec!["<script>&"]);

        let html = table.to_html();

        assert!(html.contains("&lt;script&gt;&amp;"));
        assert!(!html.contains("<script>"));
    }
}
