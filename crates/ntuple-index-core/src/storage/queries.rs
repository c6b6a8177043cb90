use super::sqlite::Database;
use rusqlite::{params, Result};

impl Database {
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        self.connection()
            .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
                row.get(0)
            })
    }

    /// Directories referenced by some descriptor but absent at probe time.
    pub fn missing_ntuple_dirs(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT DISTINCT ntuple_dir FROM \"{}\" WHERE size < 0 ORDER BY ntuple_dir",
            table
        ))?;
        let dirs = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>>>()?;
        Ok(dirs)
    }

    /// Total kB per owner, counting each directory once and ignoring absent ones.
    /// Largest first.
    pub fn size_by_user(&self, table: &str) -> Result<Vec<(Option<String>, f64)>> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT user, SUM(size) AS total FROM \
               (SELECT DISTINCT ntuple_dir, user, size FROM \"{}\" WHERE size >= 0) \
             GROUP BY user ORDER BY total DESC",
            table
        ))?;
        let totals = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>>>()?;
        Ok(totals)
    }

    pub fn descriptors_for_dir(&self, table: &str, ntuple_dir: &str) -> Result<Vec<String>> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT xml_filepath FROM \"{}\" WHERE ntuple_dir = ?1 ORDER BY xml_filepath",
            table
        ))?;
        let descriptors = stmt
            .query_map(params![ntuple_dir], |row| row.get(0))?
            .collect::<Result<Vec<String>>>()?;
        Ok(descriptors)
    }
}
