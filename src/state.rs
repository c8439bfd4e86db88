use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use chrono::NaiveDate;

use portfolio_panel::data::cache::CacheKey;
use portfolio_panel::data::filter::{self, FilterSelection};
use portfolio_panel::data::model::CellValue;
use portfolio_panel::{DashboardConfig, DashboardSnapshot, Pipeline, SourceError};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub pipeline: Pipeline,

    /// Per-column filter selections.
    pub selection: FilterSelection,

    /// File the selection was initialised for; a new file resets it.
    selection_key: Option<CacheKey>,

    /// Result of the last pipeline run.
    pub snapshot: Option<Rc<DashboardSnapshot>>,

    /// Colours of the category column.
    pub color_map: ColorMap,

    /// Set when there is nothing to show (no source file).
    pub fatal_message: Option<String>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            pipeline: Pipeline::new(config),
            selection: FilterSelection::new(),
            selection_key: None,
            snapshot: None,
            color_map: ColorMap::default(),
            fatal_message: None,
            status_message: None,
        }
    }

    /// Run the pipeline for the current selection. Called once per frame.
    pub fn refresh(&mut self) {
        let (source, dataset) = match self.pipeline.dataset() {
            Ok(loaded) => loaded,
            Err(e) => {
                self.report(&e);
                return;
            }
        };

        let key = CacheKey::from(&source);
        if self.selection_key.as_ref() != Some(&key) {
            self.selection = self.pipeline.default_selection(&dataset);
            let category = &self.pipeline.config().fields.category;
            self.color_map = ColorMap::new(&dataset.distinct_values(category));
            self.selection_key = Some(key);
        }

        match self.pipeline.run(&self.selection) {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.fatal_message = None;
            }
            Err(e) => self.report(&e),
        }
    }

    fn report(&mut self, e: &anyhow::Error) {
        if let Some(SourceError::NoSpreadsheet { .. }) = e.downcast_ref::<SourceError>() {
            self.snapshot = None;
            self.selection_key = None;
            self.fatal_message = Some(e.to_string());
        } else {
            self.drop_stale_snapshot();
            let msg = format!("Erro: {e:#}");
            if self.status_message.as_deref() != Some(msg.as_str()) {
                log::error!("{e:#}");
            }
            self.status_message = Some(msg);
        }
    }

    /// Forget a snapshot computed from a file other than the one the cache
    /// last tried to load.
    fn drop_stale_snapshot(&mut self) {
        let Some(attempted) = self.pipeline.cache().key() else {
            return;
        };
        let stale = self
            .snapshot
            .as_ref()
            .is_some_and(|s| CacheKey::from(&s.source) != *attempted);
        if stale {
            self.snapshot = None;
            self.selection_key = None;
        }
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &CellValue) {
        filter::toggle_value(&mut self.selection, column, value);
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(snapshot) = self.snapshot.clone() {
            filter::select_all(&mut self.selection, &snapshot.dataset, column);
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        filter::select_none(&mut self.selection, column);
    }

    pub fn set_date_range(&mut self, column: &str, start: NaiveDate, end: NaiveDate) {
        filter::set_date_range(&mut self.selection, column, start, end);
    }

    pub fn set_include_missing_dates(&mut self, column: &str, include: bool) {
        filter::set_include_missing_dates(&mut self.selection, column, include);
    }

    /// Replace the source spreadsheet with the file at `path`.
    pub fn upload(&mut self, path: &Path) {
        let result = std::fs::read(path)
            .with_context(|| format!("reading {}", path.display()))
            .and_then(|bytes| {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .context("file name is not valid UTF-8")?;
                self.pipeline.replace_source(name, &bytes)
            });

        match result {
            Ok(dest) => {
                self.status_message = Some(format!("Arquivo substituído: {}", dest.display()));
                self.selection_key = None;
                self.refresh();
            }
            Err(e) => {
                log::error!("upload failed: {e:#}");
                self.status_message = Some(format!("Erro no envio: {e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_upload_drops_previous_snapshot() {
        let data = tempfile::tempdir().unwrap();
        std::fs::write(data.path().join("carteiras.csv"), "Carteira,Posição\nA,1\nB,2\n").unwrap();
        let mut state = AppState::new(DashboardConfig {
            data_dir: data.path().to_path_buf(),
            rescan_secs: 0,
            ..DashboardConfig::default()
        });
        state.refresh();
        assert_eq!(state.snapshot.as_ref().map(|s| s.dataset.len()), Some(2));

        let uploads = tempfile::tempdir().unwrap();
        let broken = uploads.path().join("novo.xlsx");
        std::fs::write(&broken, b"not a workbook").unwrap();
        state.upload(&broken);

        assert!(state.snapshot.is_none());
        assert!(state.fatal_message.is_none());
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Erro")));

        state.refresh();
        assert!(state.snapshot.is_none());
        assert_eq!(state.pipeline.cache().loads(), 2);
    }
}
