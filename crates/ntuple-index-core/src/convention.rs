//! Provenance labels inferred from storage path conventions.
//!
//! Every function here is positional: it splits a normalised path into
//! segments and looks at neighbours of a marker segment. Inputs are always
//! normalised first so that `a//user/x/` and `a/user/x` agree.

use lazy_static::lazy_static;
use regex::Regex;

const BRANCH_MARKER: &str = "RunII_";
const DESCRIPTOR_EXT: &str = ".xml";
const OWNER_MARKERS: [&str; 2] = ["user", "group"];

lazy_static! {
    // Older releases name their branch directories e.g. MC_94X_v1
    static ref RELEASE_PREFIX: Regex = Regex::new(r"[0-9]+X_").unwrap();
}

/// Lexically normalise a `/`-separated path: collapse repeated separators,
/// drop `.` segments, fold `..` into its parent where possible and strip any
/// trailing separator. The filesystem is never consulted.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

fn segments(path: &str) -> Vec<String> {
    normalize_path(path).split('/').map(str::to_string).collect()
}

/// Owner of a storage path: the segment right after the first `user`
/// segment, or failing that the first `group` segment.
///
/// ```
/// use ntuple_index_core::convention::resolve_owner;
/// assert_eq!(
///     resolve_owner("/pnfs/desy.de/cms/tier2//store/user/abenecke/RunII_102X_v1/PUPPIStudies/"),
///     Some("abenecke".to_string())
/// );
/// assert_eq!(resolve_owner("/store/group/uhh/uhh2ntuples"), Some("uhh".to_string()));
/// assert_eq!(resolve_owner("/store/user"), None);
/// ```
pub fn resolve_owner(path: &str) -> Option<String> {
    let parts = segments(path);
    let marker_index = OWNER_MARKERS
        .iter()
        .find_map(|marker| parts.iter().position(|p| p == marker))?;
    parts.get(marker_index + 1).cloned()
}

fn looks_like_year(segment: &str) -> bool {
    (segment.contains("16") || segment.contains("17") || segment.contains("18"))
        && !segment.contains(DESCRIPTOR_EXT)
}

/// Dataset year of a descriptor path.
///
/// The year is the segment following the first `RunII_*` segment. Only when
/// no such segment exists is every segment tried in turn; that fallback
/// accepts anything containing 16, 17 or 18, so e.g. a `MC_2018_reco`
/// directory also qualifies.
pub fn resolve_year(path: &str) -> Option<String> {
    let parts = segments(path);

    if let Some(index) = parts.iter().position(|p| p.contains(BRANCH_MARKER)) {
        if index == parts.len() - 1 {
            return None;
        }
        let candidate = &parts[index + 1];
        return looks_like_year(candidate).then(|| candidate.clone());
    }

    parts.into_iter().find(|p| looks_like_year(p))
}

/// Branch label of a descriptor path: the first segment containing `RunII_`
/// or a release prefix such as `94X_`, ignoring descriptor file names.
pub fn resolve_branch(path: &str) -> Option<String> {
    segments(path).into_iter().find(|p| {
        (p.contains(BRANCH_MARKER) || RELEASE_PREFIX.is_match(p)) && !p.contains(DESCRIPTOR_EXT)
    })
}
