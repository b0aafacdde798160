use crate::{Document, FieldPostings, IndexConfig, InvertedIndex};
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, remove_file, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
    #[serde(default)]
    pub config: IndexConfig,
}

/// Location of a persisted index. Passed explicitly to every save and load.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn title_postings(&self) -> PathBuf { self.root.join("postings_title.bin") }
    fn description_postings(&self) -> PathBuf { self.root.join("postings_description.bin") }
}

fn save_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut f = BufWriter::new(File::create(path).with_context(|| format!("create {}", path.display()))?);
    bincode::serialize_into(&mut f, value)?;
    f.flush()?;
    Ok(())
}

fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let value = bincode::deserialize_from(BufReader::new(f)).with_context(|| format!("decode {}", path.display()))?;
    Ok(value)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let path = paths.meta();
    let mut f = BufWriter::new(File::create(&path).with_context(|| format!("create {}", path.display()))?);
    serde_json::to_writer_pretty(&mut f, meta).with_context(|| format!("encode {}", path.display()))?;
    f.flush()?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let f = File::open(&path).with_context(|| format!("no index at {} (open {})", paths.root.display(), path.display()))?;
    let meta = serde_json::from_reader(BufReader::new(f)).with_context(|| format!("decode {}", path.display()))?;
    Ok(meta)
}

/// Write `index` under `paths.root`. `meta.json` goes last, so a directory without it is not an index.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    // an older meta.json must not vouch for half-written files
    match remove_file(paths.meta()) {
        Err(e) if e.kind() != ErrorKind::NotFound => {
            return Err(e).with_context(|| format!("remove {}", paths.meta().display()));
        }
        _ => {}
    }
    save_bin(&paths.docs(), &index.docs)?;
    save_bin(&paths.title_postings(), &index.title)?;
    save_bin(&paths.description_postings(), &index.description)?;
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into());
    let meta = MetaFile { num_docs: index.num_docs(), created_at, version: FORMAT_VERSION, config: index.config.clone() };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "index saved");
    Ok(())
}

pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        bail!("unsupported index version {} (expected {})", meta.version, FORMAT_VERSION);
    }
    let docs: Vec<Document> = load_bin(&paths.docs())?;
    if docs.len() != meta.num_docs as usize {
        bail!("index is inconsistent: meta.json lists {} documents, docs.bin holds {}", meta.num_docs, docs.len());
    }
    let title: FieldPostings = load_bin(&paths.title_postings())?;
    let description: FieldPostings = load_bin(&paths.description_postings())?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "index loaded");
    Ok(InvertedIndex::from_parts(title, description, docs, meta.config))
}
