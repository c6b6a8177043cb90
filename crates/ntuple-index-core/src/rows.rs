//! Lazy row production for the descriptor and ntuple-directory tables.
//!
//! Both generators are single-pass iterators: every row is built on demand
//! when the sink pulls it, and probing happens strictly one directory at a
//! time.

use crate::convention::{resolve_branch, resolve_owner, resolve_year};
use crate::probe::probe;
use crate::progress::ProgressReporter;
use crate::scanner::{extract_referenced_files, find_descriptors, referenced_paths_to_directories};
use crate::storage::{Row, Value};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use std::vec;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorRow {
    pub filepath: String,
    pub branch: String,
    pub year: String,
    pub git_src: String,
}

impl DescriptorRow {
    /// Unresolved labels become empty strings, the table requires them.
    pub fn new(filepath: &str, git_src: &str) -> Self {
        Self {
            filepath: filepath.to_string(),
            branch: resolve_branch(filepath).unwrap_or_default(),
            year: resolve_year(filepath).unwrap_or_default(),
            git_src: git_src.to_string(),
        }
    }

    pub fn into_row(self) -> Row {
        vec![
            ("filepath", Value::Text(self.filepath)),
            ("branch", Value::Text(self.branch)),
            ("year", Value::Text(self.year)),
            ("git_src", Value::Text(self.git_src)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NtupleDirRow {
    pub xml_filepath: String,
    pub ntuple_dir: String,
    pub size: f64,
    pub user: Option<String>,
    pub creation_time: String,
}

impl NtupleDirRow {
    /// Owner comes from the path alone; size and time need the directory to exist.
    pub fn probe(xml_filepath: &str, ntuple_dir: &str) -> Self {
        let result = probe(Path::new(ntuple_dir));
        Self {
            xml_filepath: xml_filepath.to_string(),
            ntuple_dir: ntuple_dir.to_string(),
            size: result.size_kb,
            user: resolve_owner(ntuple_dir),
            creation_time: result.creation_time,
        }
    }

    pub fn into_row(self) -> Row {
        vec![
            ("xml_filepath", Value::Text(self.xml_filepath)),
            ("ntuple_dir", Value::Text(self.ntuple_dir)),
            ("size", Value::Real(self.size)),
            ("user", self.user.map_or(Value::Null, Value::Text)),
            ("creation_time", Value::Text(self.creation_time)),
        ]
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// One row per descriptor under `root`.
pub fn descriptor_rows<'a>(
    root: &'a Path,
    git_src: &'a str,
) -> impl Iterator<Item = DescriptorRow> + 'a {
    find_descriptors(root).map(move |relative| DescriptorRow::new(&display_path(&relative), git_src))
}

/// Courtesy pause after every `every` directory probes, to go easy on network
/// filesystems. `every == 0` disables it.
#[derive(Debug)]
pub struct Throttle {
    every: usize,
    pause: Duration,
    count: usize,
}

impl Throttle {
    pub fn new(every: usize, pause: Duration) -> Self {
        Self {
            every,
            pause,
            count: 0,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn pause_length(&self) -> Duration {
        self.pause
    }

    /// Record one probe; returns `true` when a pause is now due.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        self.every != 0 && self.count % self.every == 0
    }

    /// Sleep for the configured pause.
    pub fn pause(&self) {
        info!("Done {}, sleeping for {:?}...", self.count, self.pause);
        if !self.pause.is_zero() {
            thread::sleep(self.pause);
        }
    }
}

/// One row per (descriptor, storage directory) pair under `root`. Directories
/// are deduplicated within a descriptor only.
pub struct NtupleDirRows<'a> {
    root: &'a Path,
    descriptors: Box<dyn Iterator<Item = PathBuf> + 'a>,
    current: Option<(String, vec::IntoIter<String>)>,
    throttle: Throttle,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> NtupleDirRows<'a> {
    pub fn new(root: &'a Path, throttle: Throttle, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            root,
            descriptors: Box::new(find_descriptors(root)),
            current: None,
            throttle,
            reporter,
        }
    }

    pub fn dirs_probed(&self) -> usize {
        self.throttle.count()
    }

    fn directories_of(&self, relative: &Path) -> Vec<String> {
        let full = self.root.join(relative);
        match extract_referenced_files(&full) {
            Ok(files) => referenced_paths_to_directories(files),
            Err(err) => {
                warn!("Could not read descriptor {}: {}", full.display(), err);
                Vec::new()
            }
        }
    }
}

impl Iterator for NtupleDirRows<'_> {
    type Item = NtupleDirRow;

    fn next(&mut self) -> Option<NtupleDirRow> {
        loop {
            if let Some((xml_filepath, dirs)) = self.current.as_mut() {
                if let Some(dir) = dirs.next() {
                    let row = NtupleDirRow::probe(xml_filepath, &dir);
                    if self.throttle.tick() {
                        self.reporter
                            .on_throttle(self.throttle.count(), self.throttle.pause_length());
                        self.throttle.pause();
                    }
                    return Some(row);
                }
            }

            let relative = self.descriptors.next()?;
            let dirs = self.directories_of(&relative);
            self.current = Some((display_path(&relative), dirs.into_iter()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use std::fs;
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Default)]
    struct RecordingReporter {
        throttled_at: Mutex<Vec<(usize, Instant)>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn on_throttle(&self, dirs_probed: usize, _pause: Duration) {
            self.throttled_at
                .lock()
                .unwrap()
                .push((dirs_probed, Instant::now()));
        }
    }

    #[test]
    fn test_throttle_pauses_every_n() {
        let mut throttle = Throttle::new(3, Duration::ZERO);
        let paused: Vec<bool> = (0..7).map(|_| throttle.tick()).collect();
        assert_eq!(paused, vec![false, false, true, false, false, true, false]);
        assert_eq!(throttle.count(), 7);
    }

    #[test]
    fn test_disabled_throttle_never_pauses() {
        let mut throttle = Throttle::disabled();
        assert!((0..2000).all(|_| !throttle.tick()));
    }

    #[test]
    fn test_throttle_reported_before_sleeping() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("a.xml"),
            "<In FileName=\"/nonexistent/store/user/bob/j1/f.root\" Lumi=\"0.0\"/>\n\
             <In FileName=\"/nonexistent/store/user/bob/j2/f.root\" Lumi=\"0.0\"/>\n",
        )
        .unwrap();

        let pause = Duration::from_millis(50);
        let reporter = RecordingReporter::default();
        let mut rows = NtupleDirRows::new(tmp.path(), Throttle::new(2, pause), &reporter);

        assert!(rows.next().is_some());
        assert!(reporter.throttled_at.lock().unwrap().is_empty());

        assert!(rows.next().is_some());
        let returned_at = Instant::now();
        let calls = reporter.throttled_at.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 2);
        assert!(returned_at.duration_since(calls[0].1) >= pause);
    }

    #[test]
    fn test_descriptor_row_substitutes_empty_labels() {
        let row = DescriptorRow::new("misc/TTbar.xml", "UHH2/master");
        assert_eq!(row.branch, "");
        assert_eq!(row.year, "");
        assert_eq!(row.git_src, "UHH2/master");

        let columns: Vec<&str> = row.into_row().iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, vec!["filepath", "branch", "year", "git_src"]);
    }

    #[test]
    fn test_ntuple_dir_row_without_owner_is_null() {
        let row = NtupleDirRow::probe("a.xml", "/nonexistent/store/mc/job");
        assert_eq!(row.user, None);
        assert_eq!(row.size, -1.0);
        let values = row.into_row();
        assert_eq!(values[3], ("user", Value::Null));
        assert_eq!(values[2], ("size", Value::Real(-1.0)));
    }

    #[test]
    fn test_rows_per_descriptor_directory_pair() {
        let tmp = tempfile::tempdir().unwrap();
        let entry = r#"<In FileName="/nonexistent/store/user/bob/job/0000/f.root" Lumi="0.0"/>"#;
        fs::write(tmp.path().join("a.xml"), entry).unwrap();
        fs::write(tmp.path().join("b.xml"), entry).unwrap();
        fs::write(tmp.path().join("empty.xml"), "<JobConfiguration/>").unwrap();

        let reporter = SilentReporter;
        let mut rows = NtupleDirRows::new(tmp.path(), Throttle::new(1, Duration::ZERO), &reporter);
        let mut collected: Vec<NtupleDirRow> = rows.by_ref().collect();
        collected.sort_by(|a, b| a.xml_filepath.cmp(&b.xml_filepath));

        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].xml_filepath, "a.xml");
        assert_eq!(collected[1].xml_filepath, "b.xml");
        assert!(collected
            .iter()
            .all(|r| r.ntuple_dir == "/nonexistent/store/user/bob/job"));
        assert_eq!(rows.dirs_probed(), 2);
        assert!(rows.next().is_none());
    }
}
