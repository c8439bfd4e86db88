//! Load → filter → aggregate, memoised per source file and selection.
//!
//! The GUI calls [`Pipeline::run`] every frame. The dataset is cached on the
//! file's path and modification time, and the finished
//! [`DashboardSnapshot`] on that plus the active [`FilterSelection`], so an
//! unchanged frame costs one directory scan at most.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::config::DashboardConfig;
use crate::data::aggregate::{
    self, CategoryBreakdown, CompositionSlice, Kpis, MonthlyTotals, RankingEntry,
    ReturnDistribution,
};
use crate::data::cache::{CacheKey, DatasetCache};
use crate::data::filter::{FilterSelection, FilteredView, init_filter_state};
use crate::data::model::Dataset;
use crate::data::source::{self, SourceFile};
use crate::error::SourceError;

// ---------------------------------------------------------------------------
// Snapshot – everything one frame renders
// ---------------------------------------------------------------------------

/// The result of one pipeline pass. `None` aggregations lack a column.
#[derive(Debug)]
pub struct DashboardSnapshot {
    pub source: SourceFile,
    pub dataset: Rc<Dataset>,
    /// Records of `dataset` that passed the selection.
    pub indices: Vec<usize>,
    pub kpis: Kpis,
    pub monthly: Option<Vec<MonthlyTotals>>,
    pub breakdown: Option<Vec<CategoryBreakdown>>,
    pub composition: Option<Vec<CompositionSlice>>,
    pub ranking: Option<Vec<RankingEntry>>,
    pub returns: Option<ReturnDistribution>,
    pub clients: Option<usize>,
}

impl DashboardSnapshot {
    pub fn compute(
        source: SourceFile,
        dataset: Rc<Dataset>,
        selection: &FilterSelection,
        config: &DashboardConfig,
    ) -> Self {
        let fields = &config.fields;
        let view = FilteredView::new(&dataset, selection);

        let kpis = aggregate::kpis(&view, fields);
        let monthly = aggregate::monthly_series(&view, fields);
        let breakdown = aggregate::category_breakdown(&view, fields);
        let composition = aggregate::composition(&view, fields);
        let ranking = aggregate::ranking(&view, fields);
        let returns = aggregate::return_distribution(
            &view,
            fields,
            config.negative_bins,
            config.non_negative_bins,
        );
        let clients = aggregate::distinct_clients(&view, fields);
        let indices = view.indices().to_vec();

        Self {
            source,
            dataset,
            indices,
            kpis,
            monthly,
            breakdown,
            composition,
            ranking,
            returns,
            clients,
        }
    }

    /// The filtered records as a view.
    pub fn view(&self) -> FilteredView<'_> {
        FilteredView::from_indices(&self.dataset, &self.indices)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

struct Memo {
    key: CacheKey,
    selection: FilterSelection,
    snapshot: Rc<DashboardSnapshot>,
}

pub struct Pipeline {
    config: DashboardConfig,
    cache: DatasetCache,
    source: Option<SourceFile>,
    last_scan: Option<Instant>,
    memo: Option<Memo>,
}

impl Pipeline {
    pub fn new(config: DashboardConfig) -> Self {
        Self::with_cache(config, DatasetCache::default())
    }

    pub fn with_cache(config: DashboardConfig, cache: DatasetCache) -> Self {
        Self {
            config,
            cache,
            source: None,
            last_scan: None,
            memo: None,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// The current source file, rescanning the data directory at most once
    /// per `rescan_secs`.
    pub fn source(&mut self) -> Result<SourceFile, SourceError> {
        let interval = Duration::from_secs(self.config.rescan_secs);
        if let (Some(source), Some(at)) = (&self.source, self.last_scan) {
            if at.elapsed() < interval {
                return Ok(source.clone());
            }
        }

        self.last_scan = Some(Instant::now());
        let found = source::find_latest(&self.config.data_dir, &self.config.extensions);
        match &found {
            Ok(latest) if self.source.as_ref() != Some(latest) => {
                log::info!("source file: {}", latest.path.display());
            }
            Err(e) => log::warn!("{e}"),
            Ok(_) => {}
        }
        self.source = found.as_ref().ok().cloned();
        found
    }

    /// The current source and its (cached) dataset.
    pub fn dataset(&mut self) -> Result<(SourceFile, Rc<Dataset>)> {
        let source = self.source()?;
        let dataset = self.cache.get_or_load(&source)?;
        Ok((source, dataset))
    }

    /// The selection that shows everything in `dataset`.
    pub fn default_selection(&self, dataset: &Dataset) -> FilterSelection {
        init_filter_state(dataset, self.config.filter_limits())
    }

    /// Run the whole pipeline for `selection`.
    pub fn run(&mut self, selection: &FilterSelection) -> Result<Rc<DashboardSnapshot>> {
        let (source, dataset) = self.dataset()?;
        let key = CacheKey::from(&source);

        if let Some(memo) = &self.memo {
            if memo.key == key && memo.selection == *selection {
                return Ok(Rc::clone(&memo.snapshot));
            }
        }

        let snapshot = Rc::new(DashboardSnapshot::compute(
            source,
            dataset,
            selection,
            &self.config,
        ));
        log::debug!(
            "recomputed snapshot: {} of {} records",
            snapshot.indices.len(),
            snapshot.dataset.len()
        );
        self.memo = Some(Memo {
            key,
            selection: selection.clone(),
            snapshot: Rc::clone(&snapshot),
        });
        Ok(snapshot)
    }

    /// Replace the source spreadsheet with an uploaded file and drop every
    /// cached result.
    pub fn replace_source(&mut self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dest = source::replace_source(
            &self.config.data_dir,
            file_name,
            bytes,
            &self.config.extensions,
        )?;
        self.invalidate();
        Ok(dest)
    }

    /// Forget the cached dataset, snapshot and source scan.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
        self.memo = None;
        self.source = None;
        self.last_scan = None;
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::data::filter::select_none;
    use crate::data::model::CellValue;

    fn config(dir: &Path) -> DashboardConfig {
        DashboardConfig {
            data_dir: dir.to_path_buf(),
            rescan_secs: 0,
            ..DashboardConfig::default()
        }
    }

    fn write_csv(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    const CSV: &str = "Carteira,Posição,Valor aportado,Rentabilidade,Cliente,Entrada\n\
                       A,100,90,11.1,1,05/01/2024\n\
                       A,200,150,33.3,2,10/02/2024\n\
                       B,300,310,-3.2,1,15/02/2024\n";

    #[test]
    fn test_run_memoises_on_selection() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "carteiras.csv", CSV);
        let mut pipeline = Pipeline::new(config(dir.path()));

        let everything = FilterSelection::new();
        let first = pipeline.run(&everything).unwrap();
        let again = pipeline.run(&everything).unwrap();
        assert!(Rc::ptr_eq(&first, &again));
        assert_eq!(first.kpis.total_position, 600.0);

        let mut none = FilterSelection::new();
        select_none(&mut none, "Carteira");
        let empty = pipeline.run(&none).unwrap();
        assert!(empty.indices.is_empty());
        assert_eq!(empty.kpis.total_position, 0.0);
        assert_eq!(pipeline.cache().loads(), 1);
    }

    #[test]
    fn test_replace_source_reloads() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "carteiras.csv", CSV);
        let mut pipeline = Pipeline::new(config(dir.path()));
        let before = pipeline.run(&FilterSelection::new()).unwrap();
        assert_eq!(before.dataset.len(), 3);

        pipeline
            .replace_source(
                "novo.csv",
                b"Carteira,Posicao\nZ,1\n",
            )
            .unwrap();
        let after = pipeline.run(&FilterSelection::new()).unwrap();
        assert_eq!(after.dataset.len(), 1);
        assert_eq!(after.source.file_name(), "novo.csv");
        assert!(!dir.path().join("carteiras.csv").exists());
        assert_eq!(pipeline.cache().loads(), 2);
        // Without the designated columns the charts are skipped.
        assert!(after.breakdown.is_none());
        assert!(after.monthly.is_none());
    }

    #[test]
    fn test_missing_source_surfaces_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = Pipeline::new(config(dir.path()));
        let err = pipeline.run(&FilterSelection::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::NoSpreadsheet { .. })
        ));
    }

    #[test]
    fn test_default_selection_returns_everything() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "carteiras.csv", CSV);
        let mut pipeline = Pipeline::new(config(dir.path()));
        let (_, dataset) = pipeline.dataset().unwrap();
        let selection = pipeline.default_selection(&dataset);
        assert!(selection.contains_key("Carteira"));
        assert!(selection.contains_key("Entrada"));

        let snapshot = pipeline.run(&selection).unwrap();
        assert_eq!(snapshot.indices.len(), dataset.len());
        assert_eq!(snapshot.view().len(), 3);
        let ranking = snapshot.ranking.as_ref().unwrap();
        assert_eq!(ranking[0].category, CellValue::String("A".into()));
        assert_eq!(snapshot.clients, Some(2));
    }

    #[test]
    fn test_broken_source_is_parsed_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.xlsx"), b"not a workbook").unwrap();
        let mut pipeline = Pipeline::new(DashboardConfig {
            rescan_secs: 60,
            ..config(dir.path())
        });

        for _ in 0..5 {
            let err = pipeline.run(&FilterSelection::new()).unwrap_err();
            assert!(format!("{err:#}").contains("bad.xlsx"));
        }
        assert_eq!(pipeline.cache().loads(), 1);

        pipeline.invalidate();
        assert!(pipeline.run(&FilterSelection::new()).is_err());
        assert_eq!(pipeline.cache().loads(), 2);
    }
}
