//! Reading the transaction snapshot from disk.

use crate::error::{Result, ResultExt, SalesError};
use crate::schema;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Reads a delimited snapshot into a schema-conformed frame of strings.
///
/// Every column is read as text so the cleaner decides how each value is
/// typed and can point at the exact cell that fails to parse.
#[derive(Debug, Clone, Copy)]
pub struct DataLoader {
    delimiter: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl DataLoader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Load and validate the snapshot at `path`.
    ///
    /// # Errors
    /// `InputNotFound` when the file does not exist, `Polars` when it cannot
    /// be parsed, and the schema errors of [`schema::conform`].
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SalesError::InputNotFound(path.to_path_buf()));
        }

        info!("Loading transactions from {}", path.display());

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(self.delimiter)
                    .with_quote_char(Some(b'"')),
            )
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .context(format!("Opening {}", path.display()))?
            .finish()
            .context(format!("Reading {}", path.display()))?;

        debug!("Read {} rows x {} columns", df.height(), df.width());

        let df = schema::conform(df)?;
        info!("Loaded {} transactions", df.height());
        Ok(df)
    }
}
