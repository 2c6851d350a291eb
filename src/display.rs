use prettytable::{Cell, Row, Table, format};
use spinoff::{Color, Spinner, spinners};
use std::io::IsTerminal;

use crate::io::locator::DesiredFiles;
use crate::prelude::*;

pub struct SpinnerContainer {
    instance: Option<Spinner>,
}

// The spinner api doesn't provide a way to create an empty instance, so the option stands
// in for "no spinner" when we are piped or asked to be quiet.
impl SpinnerContainer {
    pub fn stop_with_message(&mut self, message: &str) {
        // Note that it has to take ownership to prevent double stopping.
        match self.instance.take() {
            Some(mut s) => s.stop_with_message(message),
            None => println!("{}", message),
        }
    }

    /// Attempts to create a spinner based on user preference and terminal capabilities.
    ///
    /// Hosts usually pipe our output into their own logs, a spinner there is just noise.
    pub fn create_spinner_unless_no_terminal_or(no_animate: bool, text: &str) -> Self {
        if no_animate || !std::io::stdout().is_terminal() {
            return SpinnerContainer { instance: None };
        }

        SpinnerContainer {
            instance: Some(Spinner::new(spinners::Dots, text.to_owned(), Color::Blue)),
        }
    }
}

impl Drop for SpinnerContainer {
    fn drop(&mut self) {
        if let Some(s) = self.instance.as_mut() {
            s.stop_with_message("");
        }
    }
}

/// How [`render_listing`] draws its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStyle {
    /// Boxed, like psql prints query results.
    #[default]
    Psql,
    /// Tab separated, for piping.
    Plain,
}

/// Tabulates located files as (object name, creation date) rows.
pub fn render_listing(
    files: &DesiredFiles,
    headers: [&str; 2],
    style: TableStyle,
) -> AppResult<String> {
    let rows = files
        .iter()
        .map(|(creation_date, name)| [name.as_str(), creation_date.as_str()]);

    match style {
        TableStyle::Plain => {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(b'\t')
                .from_writer(vec![]);

            for row in std::iter::once(headers).chain(rows) {
                writer.write_record(row).into_diagnostic()?;
            }

            let data = writer
                .into_inner()
                .into_diagnostic()
                .wrap_err("Failed to get writer data.")?;

            let listing = String::from_utf8(data)
                .into_diagnostic()
                .wrap_err("Invalid utf-8")?;

            Ok(listing.trim_end().to_owned())
        }

        TableStyle::Psql => {
            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
            table.set_titles(Row::new(headers.iter().map(|title| Cell::new(title)).collect()));

            for row in rows {
                table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
            }

            Ok(table.to_string().trim_end().to_owned())
        }
    }
}
