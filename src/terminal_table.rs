//! Printing reshaped matrices as a table, either padded for reading
//! on a terminal (with a bold title row), or as tab separated values
//! for feeding into other tools.
//!
//! Fields are printed via `Display` without escaping, thus values must
//! not contain tabs or newlines.

use std::{fmt::Display, io::Write};

use anyhow::{bail, Result};
use itertools::{EitherOrBoth, Itertools};
use yansi::{Paint, Style};

/// Column widths are fixed up front so that rows can be streamed. A
/// value wider than its column is still followed by a space. The last
/// column has no width and no padding.
pub struct TerminalTable {
    widths: Vec<usize>,
    titles: Vec<String>,
    /// Tab separated, no padding, no ANSI codes
    pub tsv_mode: bool,
}

impl TerminalTable {
    /// `widths` must have one element less than `titles`. A space is
    /// appended to each title so that italic text is not clipped.
    pub fn new<S: Display>(widths: &[usize], titles: &[S], tsv_mode: bool) -> Self {
        Self {
            widths: widths.to_owned(),
            titles: titles.iter().map(|title| format!("{title} ")).collect(),
            tsv_mode,
        }
    }

    fn write_row<V: Display>(
        &self,
        row: &[V],
        line_style: Option<Style>,
        out: &mut impl Write,
    ) -> Result<()> {
        if row.len() != self.widths.len() + 1 {
            bail!(
                "row has {} columns, table has {}",
                row.len(),
                self.widths.len() + 1
            )
        }

        for (i, either_or_both) in row.iter().zip_longest(&self.widths).enumerate() {
            let (val, width) = match either_or_both {
                EitherOrBoth::Both(val, width) => (val, Some(*width)),
                EitherOrBoth::Left(val) => (val, None),
                EitherOrBoth::Right(_) => unreachable!("row length checked above"),
            };
            if self.tsv_mode && i > 0 {
                out.write_all(b"\t")?;
            }
            let s = val.to_string();
            match line_style {
                Some(style) => write!(out, "{}", s.as_str().paint(style))?,
                None => out.write_all(s.as_bytes())?,
            }
            if let (Some(width), false) = (width, self.tsv_mode) {
                let padding = width.saturating_sub(s.len()).max(1);
                write!(out, "{:padding$}", "")?;
            }
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_title_row(&self, out: &mut impl Write) -> Result<()> {
        const STYLE: Style = Style::new().bold().italic();
        self.write_row(
            &self.titles,
            if self.tsv_mode { None } else { Some(STYLE) },
            out,
        )
    }

    pub fn write_data_row<V: Display>(&self, data: &[V], out: &mut impl Write) -> Result<()> {
        self.write_row(data, None, out)
    }
}
