use crate::error::Error;
use crate::probe::dir_size_bytes;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug)]
pub struct SizeListing {
    pub output: PathBuf,
    pub entries: usize,
    pub total_kb: u64,
}

/// `dirs.txt` → `dirs_sizes.txt` next to it.
pub fn sizes_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}_sizes.{}", stem, ext.to_string_lossy()),
        None => format!("{}_sizes", stem),
    };
    input.with_file_name(name)
}

/// Read a list of directories (one per line) and write `dir,size_kb` for each.
/// Absent directories are listed with size 0.
pub fn list_dir_sizes(input: &Path) -> Result<SizeListing, Error> {
    if !input.is_file() {
        return Err(Error::NotFound(input.to_path_buf()));
    }
    let output = sizes_output_path(input);
    info!("Writing to {}", output.display());

    let contents = fs::read_to_string(input)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&output)?;

    let mut entries = 0;
    let mut total_kb = 0u64;
    for dir in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let path = Path::new(dir);
        let size_kb = if path.is_dir() {
            dir_size_bytes(path) / 1024
        } else {
            debug!("{} does not exist, recording 0", dir);
            0
        };
        total_kb += size_kb;
        entries += 1;
        let size = size_kb.to_string();
        writer.write_record([dir, size.as_str()])?;
    }
    writer.flush()?;

    Ok(SizeListing {
        output,
        entries,
        total_kb,
    })
}

/// Scale a kB figure by powers of 1000 up to TB.
pub fn natural_size(kb: u64) -> (f64, &'static str) {
    let mut value = kb as f64;
    let mut unit = "kB";
    for next in ["MB", "GB", "TB"] {
        if value <= 1000.0 {
            break;
        }
        value /= 1000.0;
        unit = next;
    }
    (value, unit)
}
