//! Daily price series cache.
//!
//! Series are keyed by (symbol, kind, calendar date). An entry is only a
//! hit on the day it was written and only while it holds at least
//! [`MIN_CACHED_POINTS`] bars; anything else (missing file, unreadable
//! JSON, short or unordered series) is a miss that the caller rebuilds.
//!
//! On disk every entry is one JSON array of [`PricePoint`]s at
//! `<dir>/<stem>_<YYYY-MM-DD>.json`, see [`Instrument::cache_stem`].

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::market::PriceSource;
use crate::models::{Instrument, InstrumentKind, PricePoint};
use crate::{GttError, Result};

/// Fewest bars a cached or freshly fetched series may hold.
pub const MIN_CACHED_POINTS: usize = 50;

/// A validated series as stored for one trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSeries {
    pub symbol: String,
    pub kind: InstrumentKind,
    /// Day the entry was built for.
    pub date: NaiveDate,
    pub points: Vec<PricePoint>,
}

/// Key-value store for daily series.
pub trait SeriesStore {
    /// Returns today's entry for `instrument`, or `None` on any miss.
    fn get(&self, instrument: &Instrument, today: NaiveDate) -> Option<CachedSeries>;

    /// Stores `points` as today's entry, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    fn put(
        &self,
        instrument: &Instrument,
        today: NaiveDate,
        points: Vec<PricePoint>,
    ) -> Result<CachedSeries>;
}

/// Checks the structural invariants of a series.
fn validate(points: &[PricePoint]) -> std::result::Result<(), String> {
    if points.len() < MIN_CACHED_POINTS {
        return Err(format!(
            "{} points, need at least {MIN_CACHED_POINTS}",
            points.len()
        ));
    }
    if let Some(pair) = points.windows(2).find(|w| w[0].date >= w[1].date) {
        return Err(format!(
            "dates out of order at {} -> {}",
            pair[0].date, pair[1].date
        ));
    }
    Ok(())
}

/// JSON files in a single directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `instrument` on `date`.
    pub fn path_for(&self, instrument: &Instrument, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.json",
            instrument.cache_stem(),
            date.format("%Y-%m-%d")
        ))
    }

    /// Reads and validates one entry file.
    fn read(&self, path: &Path) -> Result<Vec<PricePoint>> {
        let corrupt = |reason: String| GttError::CacheCorrupt {
            path: path.display().to_string(),
            reason,
        };
        let contents = std::fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
        let points: Vec<PricePoint> =
            serde_json::from_str(&contents).map_err(|e| corrupt(e.to_string()))?;
        validate(&points).map_err(corrupt)?;
        Ok(points)
    }

    /// Deletes entries dated more than `keep_days` days before `today`.
    ///
    /// Files without a parsable `_<YYYY-MM-DD>.json` suffix are left alone.
    /// Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or a file
    /// cannot be removed.
    pub fn prune(&self, keep_days: u32, today: NaiveDate) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(date) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.rsplit_once('_'))
                .and_then(|(_, d)| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            if (today - date).num_days() > i64::from(keep_days) {
                std::fs::remove_file(&path)?;
                debug!(path = %path.display(), "removed stale cache file");
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "pruned stale cache files");
        }
        Ok(removed)
    }
}

impl SeriesStore for FileStore {
    fn get(&self, instrument: &Instrument, today: NaiveDate) -> Option<CachedSeries> {
        let path = self.path_for(instrument, today);
        if !path.exists() {
            debug!(%instrument, "cache miss");
            return None;
        }

        match self.read(&path) {
            Ok(points) => {
                debug!(%instrument, points = points.len(), "cache hit");
                Some(CachedSeries {
                    symbol: instrument.symbol.clone(),
                    kind: instrument.kind,
                    date: today,
                    points,
                })
            }
            Err(e) => {
                warn!(%instrument, error = %e, "discarding cache entry");
                None
            }
        }
    }

    fn put(
        &self,
        instrument: &Instrument,
        today: NaiveDate,
        points: Vec<PricePoint>,
    ) -> Result<CachedSeries> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(instrument, today);

        // Write beside the target and rename so readers never see a partial file.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut tmp, &points)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        info!(%instrument, points = points.len(), path = %path.display(), "cached series");
        Ok(CachedSeries {
            symbol: instrument.symbol.clone(),
            kind: instrument.kind,
            date: today,
            points,
        })
    }
}

type MemoryKey = (String, InstrumentKind, NaiveDate);

/// In-process store with the same hit rules as [`FileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<MemoryKey, Vec<PricePoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, valid or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<MemoryKey, Vec<PricePoint>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SeriesStore for MemoryStore {
    fn get(&self, instrument: &Instrument, today: NaiveDate) -> Option<CachedSeries> {
        let key = (instrument.symbol.clone(), instrument.kind, today);
        let points = self.lock().get(&key).cloned()?;
        validate(&points).ok()?;
        Some(CachedSeries {
            symbol: instrument.symbol.clone(),
            kind: instrument.kind,
            date: today,
            points,
        })
    }

    fn put(
        &self,
        instrument: &Instrument,
        today: NaiveDate,
        points: Vec<PricePoint>,
    ) -> Result<CachedSeries> {
        let key = (instrument.symbol.clone(), instrument.kind, today);
        self.lock().insert(key, points.clone());
        Ok(CachedSeries {
            symbol: instrument.symbol.clone(),
            kind: instrument.kind,
            date: today,
            points,
        })
    }
}

/// Returns today's series for `instrument`, fetching and caching on a miss.
///
/// A failed cache write is logged and the fetched series still returned.
///
/// # Errors
///
/// Returns [`GttError::DataUnavailable`] if the fetch fails or yields
/// fewer than [`MIN_CACHED_POINTS`] bars.
pub async fn resolve<S, P>(
    store: &S,
    source: &P,
    instrument: &Instrument,
    today: NaiveDate,
) -> Result<CachedSeries>
where
    S: SeriesStore + ?Sized,
    P: PriceSource + ?Sized,
{
    if let Some(hit) = store.get(instrument, today) {
        return Ok(hit);
    }

    info!(%instrument, "fetching price history");
    let points = source.fetch(instrument).await?;
    if points.len() < MIN_CACHED_POINTS {
        return Err(GttError::unavailable(
            &instrument.symbol,
            format!(
                "insufficient history ({} days, need at least {MIN_CACHED_POINTS})",
                points.len()
            ),
        ));
    }

    match store.put(instrument, today, points.clone()) {
        Ok(stored) => Ok(stored),
        Err(e) => {
            warn!(%instrument, error = %e, "failed to cache series");
            Ok(CachedSeries {
                symbol: instrument.symbol.clone(),
                kind: instrument.kind,
                date: today,
                points,
            })
        }
    }
}
