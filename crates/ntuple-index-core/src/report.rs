//! Plain-text audit listings for one descriptor tree: every referenced file,
//! every storage directory, which descriptors use each directory, and
//! optionally which referenced files are gone.

use crate::error::Error;
use crate::scanner::{directory_of, extract_referenced_files, find_descriptors, normalize_directory};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DescriptorReferences {
    /// Relative to the scanned root.
    pub descriptor: String,
    pub files: Vec<String>,
}

/// Read every descriptor under `root` together with the files it references.
pub fn collect_references(root: &Path) -> Result<Vec<DescriptorReferences>, Error> {
    if !root.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()));
    }
    let mut all = Vec::new();
    for relative in find_descriptors(root) {
        let files = match extract_referenced_files(&root.join(&relative)) {
            Ok(files) => files.collect(),
            Err(err) => {
                warn!("Could not read descriptor {}: {}", relative.display(), err);
                continue;
            }
        };
        all.push(DescriptorReferences {
            descriptor: relative.to_string_lossy().into_owned(),
            files,
        });
    }
    Ok(all)
}

#[derive(Debug, Default)]
pub struct AuditReport {
    pub files: BTreeSet<String>,
    pub directories: BTreeSet<String>,
    pub dir_map: BTreeMap<String, BTreeSet<String>>,
    /// Descriptor → referenced files not on disk. `None` when not checked.
    pub missing: Option<BTreeMap<String, Vec<String>>>,
}

impl AuditReport {
    pub fn build(references: &[DescriptorReferences], check_missing: bool) -> Self {
        let mut report = AuditReport::default();
        let mut missing = BTreeMap::new();

        for entry in references {
            for file in &entry.files {
                let dir = normalize_directory(directory_of(file));
                report.files.insert(file.clone());
                report.directories.insert(dir.clone());
                report
                    .dir_map
                    .entry(dir)
                    .or_default()
                    .insert(entry.descriptor.clone());

                if check_missing && !Path::new(file).is_file() {
                    missing
                        .entry(entry.descriptor.clone())
                        .or_insert_with(Vec::new)
                        .push(file.clone());
                }
            }
        }

        if check_missing {
            report.missing = Some(missing);
        }
        report
    }

    pub fn missing_count(&self) -> usize {
        self.missing
            .as_ref()
            .map_or(0, |m| m.values().map(Vec::len).sum())
    }

    /// Write the listings into `out_dir`, file names prefixed/suffixed by `label`.
    pub fn write(&self, out_dir: &Path, label: &str) -> Result<Vec<PathBuf>, Error> {
        fs::create_dir_all(out_dir)?;
        let mut written = Vec::new();

        let path = out_dir.join(format!("ntuple_filenames_{}.txt", label));
        write_lines(&path, self.files.iter())?;
        info!("Found {} ntuples, list saved to {}", self.files.len(), path.display());
        written.push(path);

        let path = out_dir.join(format!("ntuple_dirnames_{}.txt", label));
        write_lines(&path, self.directories.iter())?;
        info!(
            "Found {} ntuple dirs, list saved to {}",
            self.directories.len(),
            path.display()
        );
        written.push(path);

        let path = out_dir.join(format!("{}_dir_map.txt", label));
        let mut out = BufWriter::new(fs::File::create(&path)?);
        for (dir, descriptors) in &self.dir_map {
            writeln!(out, "{}::", dir)?;
            for descriptor in descriptors {
                writeln!(out, "\t{}", descriptor)?;
            }
        }
        out.flush()?;
        written.push(path);

        if let Some(missing) = &self.missing {
            let path = out_dir.join(format!("{}_missing.txt", label));
            let mut out = BufWriter::new(fs::File::create(&path)?);
            for (descriptor, files) in missing {
                writeln!(out, "{}::", descriptor)?;
                for file in files {
                    writeln!(out, "{}", file)?;
                }
            }
            out.flush()?;
            info!("# Missing files: {}", self.missing_count());
            written.push(path);
        }

        Ok(written)
    }
}

fn write_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a String>) -> Result<(), Error> {
    let joined: Vec<&str> = lines.map(String::as_str).collect();
    fs::write(path, joined.join("\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(descriptor: &str, files: &[&str]) -> DescriptorReferences {
        DescriptorReferences {
            descriptor: descriptor.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_build_dedups_and_maps() {
        let references = vec![
            refs("a.xml", &["/s/user/x/job/0000/1.root", "/s/user/x/job/0001/2.root"]),
            refs("b.xml", &["/s/user/x/job/0000/1.root", "/s/user/y/other/3.root"]),
        ];
        let report = AuditReport::build(&references, false);

        assert_eq!(report.files.len(), 3);
        assert_eq!(
            report.directories.iter().cloned().collect::<Vec<_>>(),
            vec!["/s/user/x/job".to_string(), "/s/user/y/other".to_string()]
        );
        let users_of_job: Vec<&String> = report.dir_map["/s/user/x/job"].iter().collect();
        assert_eq!(users_of_job, vec!["a.xml", "b.xml"]);
        assert!(report.missing.is_none());
        assert_eq!(report.missing_count(), 0);
    }

    #[test]
    fn test_missing_files_grouped_by_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        let present = tmp.path().join("present.root");
        fs::write(&present, "x").unwrap();
        let present = present.to_string_lossy().into_owned();
        let absent = tmp.path().join("absent.root").to_string_lossy().into_owned();

        let references = vec![refs("a.xml", &[present.as_str(), absent.as_str()])];
        let report = AuditReport::build(&references, true);
        let missing = report.missing.as_ref().unwrap();
        assert_eq!(missing["a.xml"], vec![absent]);
        assert_eq!(report.missing_count(), 1);
    }

    #[test]
    fn test_write_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let references = vec![refs("a.xml", &["/s/user/x/job/0000/1.root"])];
        let report = AuditReport::build(&references, true);
        let written = report.write(tmp.path(), "RunII_94X_v1").unwrap();
        assert_eq!(written.len(), 4);

        let dir_map = fs::read_to_string(tmp.path().join("RunII_94X_v1_dir_map.txt")).unwrap();
        assert_eq!(dir_map, "/s/user/x/job::\n\ta.xml\n");
        let dirs = fs::read_to_string(tmp.path().join("ntuple_dirnames_RunII_94X_v1.txt")).unwrap();
        assert_eq!(dirs, "/s/user/x/job");
    }

    #[test]
    fn test_collect_requires_root() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            collect_references(&tmp.path().join("absent")),
            Err(Error::NotFound(_))
        ));
    }
}
