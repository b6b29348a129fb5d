use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::api::types::GraphData;
use crate::graph_utils::graph::RenderedGraph;

const EXPORT_PREFIX: &str = "graph_";
const EXPORT_EXT: &str = "json";

/// What an export file holds: the raw backend payload plus the on-screen
/// layout at the time of export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub exported_at: String,
    pub data: GraphData,
    // node id -> (x, y)
    #[serde(default)]
    pub positions: Vec<(String, f64, f64)>,
}

impl GraphExport {
    pub fn new(data: &GraphData, rendered: Option<&RenderedGraph>) -> Self {
        let positions = rendered
            .map(|g| g.nodes().iter().map(|n| (n.key.clone(), n.x, n.y)).collect())
            .unwrap_or_default();
        Self { exported_at: timestamp(), data: data.clone(), positions }
    }
}

fn timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    now.format(fmt).unwrap_or_else(|_| "unknown".to_string())
}

/// Timestamped export path in `dir`. Names have one-second resolution, so a
/// counter suffix is added when the name is already taken.
pub fn export_path_now(dir: &Path) -> PathBuf {
    let stamp = timestamp();
    let path = dir.join(format!("{}{}.{}", EXPORT_PREFIX, stamp, EXPORT_EXT));
    if !path.exists() {
        return path;
    }
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{}{}_{}.{}", EXPORT_PREFIX, stamp, n, EXPORT_EXT));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

/// Write a timestamped export into `dir`, creating it if needed.
pub fn save_export(dir: &Path, export: &GraphExport) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let s = serde_json::to_string_pretty(export)?;
    let path = export_path_now(dir);
    atomic_write(&path, s.as_bytes())?;
    Ok(path)
}

pub fn load_export(path: &Path) -> anyhow::Result<GraphExport> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let export: GraphExport = serde_json::from_str(&buf)?;
    Ok(export)
}

pub fn list_exports(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = Vec::new();
    if dir.exists() {
        for e in fs::read_dir(dir)? {
            let p = e?.path();
            if let Some(name) = p.file_name().and_then(|s| s.to_str())
                && name.starts_with(EXPORT_PREFIX) && name.ends_with(".json")
            {
                entries.push(p);
            }
        }
    }
    // newest first; names sort by timestamp
    entries.sort();
    entries.reverse();
    Ok(entries)
}
