//! The hand-over format to plotting: labeled series over a shared x
//! axis, emitted as JSON or as a table.

use std::io::Write;

use anyhow::Result;

use crate::{reshape::ResultMatrix, terminal_table::TerminalTable};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<f64>,
    pub series: Vec<Series>,
}

impl Chart {
    /// `labels` must have one entry per matrix row.
    pub fn from_matrix(
        title: impl Into<String>,
        y_label: impl Into<String>,
        matrix: ResultMatrix,
        labels: Vec<String>,
    ) -> Self {
        assert_eq!(labels.len(), matrix.rows.len(), "one label per bucket");
        Chart {
            title: title.into(),
            x_label: DISTANCE_LABEL.into(),
            y_label: y_label.into(),
            x: matrix.distances.iter().map(|d| *d as f64).collect(),
            series: labels
                .into_iter()
                .zip(matrix.rows)
                .map(|(label, values)| Series { label, values })
                .collect(),
        }
    }

    /// One line per x value, one column per series.
    pub fn write_table(&self, tsv_mode: bool, out: &mut impl Write) -> Result<()> {
        let titles: Vec<&str> = std::iter::once(self.x_label.as_str())
            .chain(self.series.iter().map(|s| s.label.as_str()))
            .collect();
        let widths: Vec<usize> = titles[..titles.len() - 1]
            .iter()
            .map(|t| t.len().max(10) + 2)
            .collect();
        if !tsv_mode {
            writeln!(out, "{} ({})", self.title, self.y_label)?;
        }
        let table = TerminalTable::new(&widths, &titles, tsv_mode);
        table.write_title_row(out)?;
        for (i, x) in self.x.iter().enumerate() {
            let row: Vec<String> = std::iter::once(x.to_string())
                .chain(self.series.iter().map(|s| format_value(s.values[i])))
                .collect();
            table.write_data_row(&row, out)?;
        }
        Ok(())
    }
}

pub const DISTANCE_LABEL: &str = "Distance (m)";

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v}")
    } else {
        format!("{v:.3}")
    }
}
