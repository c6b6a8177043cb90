use crate::convention::normalize_path;
use std::collections::BTreeSet;

/// CRAB writes output into numbered shard directories such as `0000`.
fn is_shard_segment(segment: &str) -> bool {
    segment.len() == 4 && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Parent directory of a referenced file, as the raw string prefix before the
/// last separator (empty for a bare file name).
pub fn directory_of(file_path: &str) -> &str {
    match file_path.rfind('/') {
        Some(index) => {
            let dir = file_path[..index].trim_end_matches('/');
            if dir.is_empty() {
                "/"
            } else {
                dir
            }
        }
        None => "",
    }
}

/// Canonical storage directory for a raw directory path: normalised, with
/// trailing shard segments removed. Applying it twice changes nothing.
pub fn normalize_directory(dir: &str) -> String {
    let normalized = normalize_path(dir);
    let absolute = normalized.starts_with('/');
    let mut parts: Vec<&str> = normalized.split('/').collect();

    while parts.last().is_some_and(|last| is_shard_segment(last)) {
        parts.pop();
    }

    let joined = parts.join("/");
    if joined.is_empty() {
        return if absolute { "/".to_string() } else { ".".to_string() };
    }
    joined
}

/// Collapse the files referenced by one descriptor into the distinct set of
/// storage directories they live in, in sorted order.
pub fn referenced_paths_to_directories<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paths
        .into_iter()
        .map(|path| normalize_directory(directory_of(path.as_ref())))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
