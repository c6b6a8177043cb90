use lazy_static::lazy_static;
use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

lazy_static! {
    // Only entries with Lumi="0.0" are collected.
    static ref FILE_ENTRY: Regex = Regex::new(r#"< ?In FileName="(.+)" Lumi="0\.0" ?/>"#).unwrap();
}

/// Lazily walk `root` and yield every `*.xml` file as a path relative to `root`.
/// Unreadable entries are logged and skipped. Order follows the filesystem.
pub fn find_descriptors(root: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    WalkDir::new(root)
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "xml"))
        .filter_map(move |entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(Path::to_path_buf)
        })
}

/// Open a descriptor and lazily yield the ntuple file names it references.
pub fn extract_referenced_files(descriptor: &Path) -> io::Result<ReferencedFiles<BufReader<File>>> {
    let file = File::open(descriptor)?;
    debug!("Reading descriptor {}", descriptor.display());
    Ok(ReferencedFiles::new(BufReader::new(file)))
}

/// Line-oriented extractor over a descriptor body.
///
/// A trimmed line starting with `<!--` opens a comment; a trimmed line ending
/// with `-->` closes it and is itself skipped. Lines inside a comment never
/// yield, whatever they contain.
/// Lines are decoded lossily, so a stray non-UTF-8 byte only affects its
/// own line.
pub struct ReferencedFiles<R> {
    reader: R,
    buf: Vec<u8>,
    in_comment: bool,
}

impl<R: BufRead> ReferencedFiles<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            in_comment: false,
        }
    }

    fn match_line(&mut self, raw: &str) -> Option<String> {
        let line = raw.trim();
        if line.starts_with(COMMENT_OPEN) {
            self.in_comment = true;
        }
        if line.ends_with(COMMENT_CLOSE) {
            self.in_comment = false;
            return None;
        }
        if self.in_comment {
            return None;
        }
        FILE_ENTRY
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl<R: BufRead> Iterator for ReferencedFiles<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!("Stopped reading descriptor early: {}", err);
                    return None;
                }
            }
            let line = String::from_utf8_lossy(&self.buf).into_owned();
            if let Some(file_name) = self.match_line(&line) {
                return Some(file_name);
            }
        }
    }
}
