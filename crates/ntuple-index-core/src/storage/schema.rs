/// Descriptor metadata, one row per descriptor file.
pub const DESCRIPTOR_COLUMNS: &[&str] = &[
    "filepath TEXT NOT NULL",
    "branch TEXT NOT NULL",
    "year TEXT NOT NULL",
    "git_src TEXT",
];

/// Storage directories referenced by descriptors, one row per (descriptor, directory).
pub const NTUPLE_DIR_COLUMNS: &[&str] = &[
    "xml_filepath TEXT NOT NULL",
    "ntuple_dir TEXT NOT NULL",
    "size FLOAT",
    "user TEXT",
    "creation_time TEXT",
];

/// CRAB task directories found in a user's storage area.
pub const USER_DIR_COLUMNS: &[&str] = &[
    "dirname TEXT NOT NULL",
    "size FLOAT",
    "user TEXT",
    "creation_time TEXT",
];
