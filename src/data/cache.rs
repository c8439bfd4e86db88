use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use anyhow::{Result, anyhow};

use super::model::Dataset;
use super::source::SourceFile;

/// Identity of a loaded file: its path and modification time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl From<&SourceFile> for CacheKey {
    fn from(source: &SourceFile) -> Self {
        Self {
            path: source.path.clone(),
            modified: source.modified,
        }
    }
}

type Loaded = std::result::Result<Rc<Dataset>, Rc<anyhow::Error>>;

/// Single-entry cache of the last load attempt, successful or not.
///
/// A changed path or modification time reloads; `invalidate` forgets the entry.
/// A file that failed to load is not read again until it changes.
pub struct DatasetCache {
    loader: Box<dyn Fn(&Path) -> Result<Dataset>>,
    entry: Option<(CacheKey, Loaded)>,
    loads: usize,
}

/// A cached outcome as a fresh `Result`; errors keep their context chain as text.
fn shared(loaded: &Loaded) -> Result<Rc<Dataset>> {
    match loaded {
        Ok(dataset) => Ok(Rc::clone(dataset)),
        Err(e) => Err(anyhow!("{e:#}")),
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::with_loader(super::loader::load_file)
    }
}

impl DatasetCache {
    pub fn with_loader(loader: impl Fn(&Path) -> Result<Dataset> + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            entry: None,
            loads: 0,
        }
    }

    /// Return the cached dataset for `source`, loading it on a miss.
    pub fn get_or_load(&mut self, source: &SourceFile) -> Result<Rc<Dataset>> {
        let key = CacheKey::from(source);
        if let Some((cached, loaded)) = &self.entry {
            if *cached == key {
                return shared(loaded);
            }
        }

        log::info!("cache miss for {}, loading", source.path.display());
        self.loads += 1;
        let loaded: Loaded = (self.loader)(&source.path).map(Rc::new).map_err(Rc::new);
        if let Err(e) = &loaded {
            log::error!("{e:#}");
        }
        let result = shared(&loaded);
        self.entry = Some((key, loaded));
        result
    }

    /// Key of the last load attempt, if any.
    pub fn key(&self) -> Option<&CacheKey> {
        self.entry.as_ref().map(|(k, _)| k)
    }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            log::debug!("dataset cache invalidated");
        }
    }

    /// How many times the loader has run, failures included.
    pub fn loads(&self) -> usize {
        self.loads
    }
}
