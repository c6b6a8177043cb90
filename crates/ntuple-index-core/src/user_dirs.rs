//! Survey of CRAB task directories in a user's storage area, independent of
//! any descriptor.

use crate::convention::resolve_owner;
use crate::probe::{creation_time, dir_size_bytes, MISSING_TIME};
use crate::storage::{Row, Value};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

lazy_static! {
    // CRAB task directories are named by submission time, e.g. 170626_204933
    static ref TASK_DIR: Regex = Regex::new(r"^.*/[0-9_]{5,}$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDirRow {
    pub dirname: String,
    pub size: f64,
    pub user: String,
    pub creation_time: String,
}

impl UserDirRow {
    pub fn into_row(self) -> Row {
        vec![
            ("dirname", Value::Text(self.dirname)),
            ("size", Value::Real(self.size)),
            ("user", Value::Text(self.user)),
            ("creation_time", Value::Text(self.creation_time)),
        ]
    }
}

/// A directory ending in `/log` never matches, since the last segment must be
/// digits and underscores.
fn is_task_dir(path: &Path) -> bool {
    TASK_DIR.is_match(&path.to_string_lossy())
}

/// Every CRAB task directory below `area`, in traversal order. Matching
/// directories are still descended into.
pub fn find_task_dirs(area: PathBuf) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(&area)
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", area.display(), err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .filter(|path| is_task_dir(path))
}

/// Rows for the task directories of `subject` under `user_area_root`. The
/// subject may name a subdirectory, e.g. `alice/RunII`.
pub fn user_dir_rows(user_area_root: &Path, subject: &str) -> impl Iterator<Item = UserDirRow> {
    let area = user_area_root.join(subject);
    debug!("Surveying task directories under {}", area.display());

    find_task_dirs(area).map(|dir| {
        let dirname = dir.to_string_lossy().into_owned();
        let created = creation_time(&dir).unwrap_or_else(|err| {
            warn!("Could not stat {}: {}", dir.display(), err);
            MISSING_TIME.to_string()
        });
        UserDirRow {
            size: dir_size_bytes(&dir) as f64 / 1024.0,
            user: resolve_owner(&dirname).unwrap_or_default(),
            creation_time: created,
            dirname,
        }
    })
}
