//! Plain-text table rendering for CLI outputs.

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: Vec<S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Missing cells render empty; extra cells are dropped.
    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();

        let line = |cells: &dyn Fn(usize) -> String| {
            let mut s = String::new();
            for (i, w) in widths.iter().enumerate() {
                s.push_str(&format!("{:<w$}  ", cells(i), w = *w));
            }
            s.trim_end().to_string()
        };

        out.push_str(&line(&|i| self.headers[i].clone()));
        out.push('\n');
        out.push_str(&line(&|i| "-".repeat(widths[i])));
        out.push('\n');

        for row in &self.rows {
            out.push_str(&line(&|i| row.get(i).cloned().unwrap_or_default()));
            out.push('\n');
        }

        out
    }
}
