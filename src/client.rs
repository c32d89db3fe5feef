//! Download client.
//!
//! Ties the dataset fetcher and the table wrangler together: one call
//! downloads a table archive, wrangles its payload and optionally saves the
//! cleaned result as CSV.

use crate::config::StatCanConfig;
use crate::constants::SAVE_FILE_PREFIX;
use crate::error::Result;
use crate::fetcher::DatasetFetcher;
use crate::frame::{self, Backend, DataframeHandle};
use crate::models::{Language, WrangledTable};
use crate::transport::{HttpTransport, Transport};
use crate::wrangle::Wrangler;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// A downloaded and wrangled table
#[derive(Debug, Clone)]
pub struct Download {
    pub table_number: String,
    pub product_id: String,
    pub language: Language,
    /// Dataset title from the archive metadata, when present
    pub title: Option<String>,
    pub table: WrangledTable,
    /// Where the cleaned CSV was written, if it was saved
    pub saved_to: Option<PathBuf>,
}

impl Download {
    pub fn to_dataframe(&self, backend: Backend) -> Result<DataframeHandle> {
        frame::to_dataframe(self.table.table(), backend)
    }

    /// File name used when saving: `statcan_{pid}_{lang}.csv`
    pub fn file_name(&self) -> String {
        format!("{}_{}_{}.csv", SAVE_FILE_PREFIX, self.product_id, self.language.code())
    }

    /// Write the cleaned table into `dir`, returning the file path
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        self.to_dataframe(Backend::Native)?.write_csv(&path)?;
        Ok(path)
    }
}

pub struct StatCan<T: Transport = HttpTransport> {
    fetcher: DatasetFetcher<T>,
    wrangler: Wrangler,
}

impl StatCan<HttpTransport> {
    pub fn new(config: &StatCanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fetcher: DatasetFetcher::from_config(config)?,
            wrangler: Wrangler::new(config.wrangler.clone()),
        })
    }
}

impl<T: Transport> StatCan<T> {
    /// Client over a custom transport
    pub fn with_transport(config: &StatCanConfig, transport: T) -> Self {
        Self {
            fetcher: DatasetFetcher::new(config.base_url.clone(), transport),
            wrangler: Wrangler::new(config.wrangler.clone()),
        }
    }

    /// Fetch and wrangle one table, saving it when `save_dir` is given
    ///
    /// A `save_dir` that is not an existing directory is reported and the
    /// save is skipped; the download itself still succeeds.
    pub fn download(
        &self,
        table_number: &str,
        language: Language,
        save_dir: Option<&Path>,
    ) -> Result<Download> {
        let fetched = self.fetcher.fetch(table_number, language)?;
        let title = fetched.raw.name.clone();
        let table = self.wrangler.wrangle(fetched.raw, language)?;

        let mut download = Download {
            table_number: fetched.table_number,
            product_id: fetched.product_id,
            language,
            title,
            table,
            saved_to: None,
        };

        if let Some(dir) = save_dir {
            if dir.is_dir() {
                let path = download.save(dir)?;
                info!("Saved table {} to {}", download.table_number, path.display());
                download.saved_to = Some(path);
            } else {
                error!(
                    "Save directory {} does not exist or is not a directory; not saving",
                    dir.display()
                );
            }
        }

        Ok(download)
    }
}
