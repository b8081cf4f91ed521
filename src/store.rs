use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::browser::SessionLauncher;
use crate::chunker::TextChunker;
use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::harvest::{harvest_all, Harvest};

const STORE_FILE: &str = "chunks.jsonl";

/// One chunk as handed to the indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub run_id: Uuid,
    pub site: String,
    pub position: usize,
    pub text: String,
    pub harvested_at: DateTime<Utc>,
}

/// JSON Lines file of chunk records, one per line, in harvest order.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORE_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Replaces the store. Written to a temporary file first so a crash never
    /// leaves a half-written store behind.
    pub fn write(&self, records: &[ChunkRecord]) -> Result<(), HarvestError> {
        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!("{STORE_FILE}.tmp"));
        {
            let mut out = BufWriter::new(fs::File::create(&tmp)?);
            for record in records {
                serde_json::to_writer(&mut out, record)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
        fs::rename(&tmp, self.path())?;
        info!("💾 Wrote {} chunks to {}", records.len(), self.path().display());
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<ChunkRecord>, HarvestError> {
        let reader = BufReader::new(fs::File::open(self.path())?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

/// Chunk every site whose text is longer than `min_len` characters.
pub fn chunk_harvest(harvest: &Harvest, chunker: &TextChunker, min_len: usize) -> Vec<ChunkRecord> {
    let mut records = Vec::new();
    for site in &harvest.sites {
        if site.text.chars().count() <= min_len {
            continue;
        }
        records.extend(chunker.chunk(&site.text).into_iter().map(|chunk| ChunkRecord {
            run_id: harvest.run_id,
            site: site.site.clone(),
            position: chunk.position,
            text: chunk.text,
            harvested_at: harvest.started_at,
        }));
    }
    records
}

/// Use the existing store, or harvest, chunk and write a new one.
pub async fn load_or_harvest(
    store: &ChunkStore,
    launcher: &dyn SessionLauncher,
    config: &HarvestConfig,
    force: bool,
) -> Result<Vec<ChunkRecord>, HarvestError> {
    if store.exists() && !force {
        info!("📦 Using existing chunk store at {}", store.path().display());
        return store.load();
    }

    let chunker = TextChunker::new(config.chunking)?;
    let harvest = harvest_all(launcher, &config.crawl, &config.sites).await?;
    let records = chunk_harvest(&harvest, &chunker, config.min_index_len);
    if records.is_empty() {
        return Err(HarvestError::NothingToIndex {
            sites: config.sites.len(),
        });
    }
    store.write(&records)?;
    Ok(records)
}
