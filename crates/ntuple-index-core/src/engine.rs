use crate::config::AppConfig;
use crate::error::Error;
use crate::legacy::LegacyCheckout;
use crate::progress::ProgressReporter;
use crate::provenance::{GitProvenance, ProvenanceProvider};
use crate::rows::{descriptor_rows, DescriptorRow, NtupleDirRow, NtupleDirRows, Throttle};
use crate::storage::schema::{DESCRIPTOR_COLUMNS, NTUPLE_DIR_COLUMNS, USER_DIR_COLUMNS};
use crate::storage::{Database, Row};
use crate::user_dirs::{user_dir_rows, UserDirRow};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct IndexEngine {
    config: AppConfig,
    db_path: String,
}

#[derive(Debug)]
pub struct IndexResult {
    pub git_src: String,
    pub descriptor_rows: usize,
    pub ntuple_dir_rows: usize,
    pub descriptor_duration: Duration,
    pub ntuple_dir_duration: Duration,
}

impl IndexEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            db_path: config.output.clone(),
            config,
        }
    }

    pub fn with_db_path(mut self, path: &str) -> Self {
        self.db_path = path.to_string();
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Index the descriptor tree under `root` into the engine's database:
    /// 1. one descriptor row per `*.xml` file
    /// 2. one directory row per (descriptor, storage directory) pair
    pub fn index_root(
        &self,
        root: &Path,
        append: bool,
        provenance: &dyn ProvenanceProvider,
        reporter: &dyn ProgressReporter,
    ) -> Result<IndexResult, Error> {
        ensure_dir(root)?;
        let db = Database::open(&self.db_path)?;
        self.index_into(&db, root, append, provenance, reporter)
    }

    /// Same as [`index_root`](Self::index_root) against an already open database.
    pub fn index_into(
        &self,
        db: &Database,
        root: &Path,
        append: bool,
        provenance: &dyn ProvenanceProvider,
        reporter: &dyn ProgressReporter,
    ) -> Result<IndexResult, Error> {
        ensure_dir(root)?;
        let git_src = provenance.git_source();
        info!("Indexing {} ({})", root.display(), git_src);

        let descriptor_table = &self.config.descriptor_table;
        prepare_table(db, descriptor_table, DESCRIPTOR_COLUMNS, append)?;
        info!("Filling {} table...", descriptor_table);
        let descriptor_start = Instant::now();
        let rows = descriptor_rows(root, &git_src).map(DescriptorRow::into_row);
        let descriptor_count = fill_with_progress(db, descriptor_table, rows, reporter)?;
        let descriptor_duration = descriptor_start.elapsed();

        let ntuple_dir_table = &self.config.ntuple_dir_table;
        prepare_table(db, ntuple_dir_table, NTUPLE_DIR_COLUMNS, append)?;
        info!("Filling {} table...", ntuple_dir_table);
        let ntuple_dir_start = Instant::now();
        let throttle = Throttle::new(self.config.throttle_every, self.config.throttle_pause());
        let rows = NtupleDirRows::new(root, throttle, reporter).map(NtupleDirRow::into_row);
        let ntuple_dir_count = fill_with_progress(db, ntuple_dir_table, rows, reporter)?;
        let ntuple_dir_duration = ntuple_dir_start.elapsed();

        Ok(IndexResult {
            git_src,
            descriptor_rows: descriptor_count,
            ntuple_dir_rows: ntuple_dir_count,
            descriptor_duration,
            ntuple_dir_duration,
        })
    }

    /// Check out each configured historical branch in turn and index its
    /// descriptor tree. Only the first branch can overwrite; later ones append.
    pub fn index_legacy(
        &self,
        append: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<(String, IndexResult)>, Error> {
        let legacy = &self.config.legacy;
        let checkout = LegacyCheckout::open_or_clone(legacy)?;
        let root = checkout.workdir()?.join(&legacy.descriptor_dir);
        let db = Database::open(&self.db_path)?;

        let mut results = Vec::new();
        for (index, branch) in checkout.branches_to_index()?.into_iter().enumerate() {
            reporter.on_branch_start(&branch);
            checkout.checkout(&branch)?;
            let provenance = GitProvenance::from_repository(checkout.repository())?;
            let result = self.index_into(&db, &root, append || index > 0, &provenance, reporter)?;
            results.push((branch, result));
        }
        Ok(results)
    }

    /// Record the CRAB task directories of `subject` under the configured user area.
    pub fn index_user_dirs(
        &self,
        subject: &str,
        append: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<usize, Error> {
        let db = Database::open(&self.db_path)?;
        self.index_user_dirs_into(&db, Path::new(&self.config.user_area_root), subject, append, reporter)
    }

    pub fn index_user_dirs_into(
        &self,
        db: &Database,
        user_area_root: &Path,
        subject: &str,
        append: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<usize, Error> {
        let table = &self.config.user_dir_table;
        prepare_table(db, table, USER_DIR_COLUMNS, append)?;
        info!("Filling {} table...", table);
        let rows = user_dir_rows(user_area_root, subject).map(UserDirRow::into_row);
        fill_with_progress(db, table, rows, reporter)
    }
}

fn ensure_dir(root: &Path) -> Result<(), Error> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(Error::NotFound(root.to_path_buf()))
    }
}

/// Overwrite mode always recreates; append mode only creates a missing table.
fn prepare_table(db: &Database, name: &str, columns: &[&str], append: bool) -> Result<(), Error> {
    if !append || !db.table_exists(name)? {
        db.create_table(name, columns)?;
    } else {
        debug!("Appending to existing table {}", name);
    }
    Ok(())
}

fn fill_with_progress<I>(
    db: &Database,
    table: &str,
    rows: I,
    reporter: &dyn ProgressReporter,
) -> Result<usize, Error>
where
    I: Iterator<Item = Row>,
{
    let start = Instant::now();
    reporter.on_table_start(table);
    let rows = rows.enumerate().map(|(index, row)| {
        reporter.on_row(table, index + 1);
        row
    });
    let count = db.fill_table(table, rows)?;
    info!("Added {} entries to {}", count, table);
    reporter.on_table_complete(table, count, start.elapsed().as_secs_f64());
    Ok(count)
}
