pub mod descriptors;
pub mod normalize;

pub use descriptors::{extract_referenced_files, find_descriptors, ReferencedFiles};
pub use normalize::{directory_of, normalize_directory, referenced_paths_to_directories};
