use git2::{Oid, Repository, Signature};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use ntuple_index_core::config::LegacyConfig;
use ntuple_index_core::legacy::LegacyCheckout;
use ntuple_index_core::storage::Database;
use ntuple_index_core::{AppConfig, Error, GitProvenance, IndexEngine, ProvenanceProvider, SilentReporter};

/// Commit `files` as an orphan commit on `branch`, replacing the index contents.
fn commit_branch(repo: &Repository, branch: &str, files: &[(&str, &str)]) -> Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    let mut index = repo.index().unwrap();
    index.clear().unwrap();
    for (path, contents) in files {
        let full = workdir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, contents).unwrap();
        index.add_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("Test", "test@example.com").unwrap();
    repo.commit(
        Some(&format!("refs/heads/{}", branch)),
        &sig,
        &sig,
        &format!("datasets for {}", branch),
        &tree,
        &[],
    )
    .unwrap()
}

fn descriptor(file: &str) -> String {
    format!("<JobConfiguration>\n<In FileName=\"{}\" Lumi=\"0.0\"/>\n</JobConfiguration>\n", file)
}

#[test]
fn test_provenance_from_remote_and_branch() {
    let tmp = tempdir().unwrap();
    let repo = Repository::init(tmp.path()).unwrap();
    repo.remote("origin", "https://github.com/UHH2/UHH2-datasets.git")
        .unwrap();
    commit_branch(&repo, "master", &[("RunII_102X_v1/2017v2/a.xml", "")]);
    repo.set_head("refs/heads/master").unwrap();

    let provenance = GitProvenance::discover(&tmp.path().join("RunII_102X_v1")).unwrap();
    assert_eq!(provenance.repo_name(), "UHH2-datasets");
    assert_eq!(provenance.branch(), "master");
    assert_eq!(provenance.git_source(), "UHH2-datasets/master");
}

#[test]
fn test_provenance_detached_head() {
    let tmp = tempdir().unwrap();
    let repo = Repository::init(tmp.path()).unwrap();
    repo.remote("UHH", "https://github.com/UHH2/UHH2.git").unwrap();
    let oid = commit_branch(&repo, "master", &[("a.xml", "")]);
    repo.set_head_detached(oid).unwrap();

    let provenance = GitProvenance::discover(tmp.path()).unwrap();
    assert_eq!(provenance.git_source(), "UHH2/HEAD");
}

#[test]
fn test_provenance_requires_remote() {
    let tmp = tempdir().unwrap();
    let repo = Repository::init(tmp.path()).unwrap();
    commit_branch(&repo, "master", &[("a.xml", "")]);
    repo.set_head("refs/heads/master").unwrap();

    assert!(matches!(
        GitProvenance::discover(tmp.path()),
        Err(Error::Other(_))
    ));
}

fn legacy_upstream(base: &Path) -> std::path::PathBuf {
    let upstream = base.join("upstream");
    let repo = Repository::init(&upstream).unwrap();
    let tt = descriptor("/nonexistent/store/user/carol/tt/0000/a.root");
    let dy = descriptor("/nonexistent/store/group/uhh/dy/0001/b.root");
    commit_branch(
        &repo,
        "RunII_80X_v3",
        &[("common/datasets/MC_80X_v3/2016/TTbar.xml", tt.as_str())],
    );
    commit_branch(
        &repo,
        "RunII_94X_v1",
        &[("common/datasets/RunII_94X_v1/2017/DY.xml", dy.as_str())],
    );
    commit_branch(&repo, "feature_x", &[("common/datasets/x.xml", "")]);
    upstream
}

fn legacy_config(base: &Path, upstream: &Path) -> LegacyConfig {
    LegacyConfig {
        repo_url: upstream.to_string_lossy().into_owned(),
        remote_name: "UHH".to_string(),
        clone_dir: base.join("clone").to_string_lossy().into_owned(),
        descriptor_dir: "common/datasets".to_string(),
        branches: vec![
            "RunII_94X_v1".to_string(),
            "RunII_80X_v3".to_string(),
            "RunII_101_v1".to_string(),
        ],
    }
}

#[test]
fn test_legacy_branch_selection() {
    let tmp = tempdir().unwrap();
    let upstream = legacy_upstream(tmp.path());
    let config = legacy_config(tmp.path(), &upstream);

    let checkout = LegacyCheckout::open_or_clone(&config).unwrap();
    let mut remote = checkout.remote_branches().unwrap();
    remote.sort();
    assert_eq!(
        remote,
        vec!["UHH/RunII_80X_v3", "UHH/RunII_94X_v1", "UHH/feature_x"]
    );
    assert_eq!(
        checkout.branches_to_index().unwrap(),
        vec!["RunII_80X_v3".to_string(), "RunII_94X_v1".to_string()]
    );

    checkout.checkout("RunII_94X_v1").unwrap();
    let workdir = checkout.workdir().unwrap();
    assert!(workdir.join("common/datasets/RunII_94X_v1/2017/DY.xml").is_file());

    // reopening an existing clone must not fail
    drop(checkout);
    assert!(LegacyCheckout::open_or_clone(&config).is_ok());
}

#[test]
fn test_index_legacy_appends_across_branches() {
    let tmp = tempdir().unwrap();
    let upstream = legacy_upstream(tmp.path());
    let db_path = tmp.path().join("legacy.sqlite");

    let config = AppConfig {
        throttle_pause_secs: 0,
        legacy: legacy_config(tmp.path(), &upstream),
        ..AppConfig::default()
    };
    let engine = IndexEngine::new(config).with_db_path(db_path.to_str().unwrap());
    let results = engine.index_legacy(false, &SilentReporter).unwrap();

    let branches: Vec<&str> = results.iter().map(|(b, _)| b.as_str()).collect();
    assert_eq!(branches, vec!["RunII_80X_v3", "RunII_94X_v1"]);
    assert_eq!(results[0].1.git_src, "upstream/RunII_80X_v3");
    assert_eq!(results[1].1.git_src, "upstream/RunII_94X_v1");

    let db = Database::open(db_path.to_str().unwrap()).unwrap();
    let mut rows: Vec<(String, String, String, String)> = db
        .connection()
        .prepare("SELECT filepath, branch, year, git_src FROM xml")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    rows.sort();
    assert_eq!(
        rows,
        vec![
            (
                "MC_80X_v3/2016/TTbar.xml".to_string(),
                "MC_80X_v3".to_string(),
                "2016".to_string(),
                "upstream/RunII_80X_v3".to_string(),
            ),
            (
                "RunII_94X_v1/2017/DY.xml".to_string(),
                "RunII_94X_v1".to_string(),
                "2017".to_string(),
                "upstream/RunII_94X_v1".to_string(),
            ),
        ]
    );

    let mut owners: Vec<Option<String>> = db
        .connection()
        .prepare("SELECT user FROM xml_ntuple_dir")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    owners.sort();
    assert_eq!(owners, vec![Some("carol".to_string()), Some("uhh".to_string())]);
}
