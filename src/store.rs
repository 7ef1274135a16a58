use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::CatalogEntry;

const CATALOG_FILE: &str = "catalog.json";

fn catalog_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CATALOG_FILE)
}

/// Load the persisted catalog blob. `Ok(None)` when none exists yet, so the
/// caller can regenerate.
pub fn load_catalog(data_dir: &Path) -> Result<Option<Vec<CatalogEntry>>> {
    let path = catalog_path(data_dir);
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let entries =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(entries))
}

/// Overwrite the catalog blob with a freshly discovered entry list.
pub fn save_catalog(data_dir: &Path, entries: &[CatalogEntry]) -> Result<()> {
    fs::create_dir_all(data_dir).with_context(|| format!("creating {}", data_dir.display()))?;
    let path = catalog_path(data_dir);
    let data = serde_json::to_string(entries)?;
    fs::write(&path, data).with_context(|| format!("writing {}", path.display()))?;
    info!(count = entries.len(), path = %path.display(), "catalog saved");
    Ok(())
}
