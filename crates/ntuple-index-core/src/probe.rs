use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Recorded size of a directory that does not exist.
pub const MISSING_SIZE: f64 = -1.0;
/// Recorded creation time of a directory that does not exist.
pub const MISSING_TIME: &str = "-1";

#[derive(Debug, Clone, PartialEq)]
pub struct DirProbe {
    pub size_kb: f64,
    pub creation_time: String,
}

impl DirProbe {
    pub fn missing() -> Self {
        Self {
            size_kb: MISSING_SIZE,
            creation_time: MISSING_TIME.to_string(),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.creation_time == MISSING_TIME
    }
}

/// Size and creation time of `dir`. Never fails: an absent directory yields
/// the sentinel values so the row still records that it was referenced.
pub fn probe(dir: &Path) -> DirProbe {
    if !dir.is_dir() {
        debug!("{} does not exist", dir.display());
        return DirProbe::missing();
    }

    let size_kb = dir_size_bytes(dir) as f64 / 1024.0;
    let creation_time = match creation_time(dir) {
        Ok(time) => time,
        Err(err) => {
            warn!("Could not stat {}: {}", dir.display(), err);
            MISSING_TIME.to_string()
        }
    };

    DirProbe {
        size_kb,
        creation_time,
    }
}

/// Sum of the sizes of all regular files below `dir`. Symlinks are not
/// followed; entries that cannot be read or stat'ed are left out.
pub fn dir_size_bytes(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("Skipping entry while sizing {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| match entry.metadata() {
            Ok(metadata) => Some(metadata.len()),
            Err(err) => {
                debug!("Could not stat {}: {}", entry.path().display(), err);
                None
            }
        })
        .sum()
}

/// Status-change time of `path` (not following symlinks) in local time,
/// formatted for a SQLite TEXT column.
pub fn creation_time(path: &Path) -> io::Result<String> {
    let metadata = fs::symlink_metadata(path)?;
    Ok(format_timestamp(&change_time(&metadata)?.naive_local()))
}

#[cfg(unix)]
fn change_time(metadata: &fs::Metadata) -> io::Result<DateTime<Local>> {
    use chrono::TimeZone;
    use std::os::unix::fs::MetadataExt;

    Local
        .timestamp_opt(metadata.ctime(), metadata.ctime_nsec() as u32)
        .single()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "ctime out of range"))
}

#[cfg(not(unix))]
fn change_time(metadata: &fs::Metadata) -> io::Result<DateTime<Local>> {
    let time = metadata.created().or_else(|_| metadata.modified())?;
    Ok(DateTime::<Local>::from(time))
}

/// `YYYY-MM-DD HH:MM:SS[.ffffff]`: space separated, no zone, microseconds
/// only when non-zero.
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    if time.nanosecond() / 1000 == 0 {
        time.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        time.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}
