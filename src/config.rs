use fogmap_map::History;

use serde::Deserialize;

/// Settings of an [`EditSession`](crate::EditSession), usually read from a RON file.
///
/// Missing fields take their default value.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of snapshots kept for undo, including the current one. At least 1.
    pub history_capacity: usize,
    /// Decode tile files on the rayon thread pool when importing.
    pub parallel_import: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: History::DEFAULT_CAPACITY,
            parallel_import: true,
        }
    }
}

impl SessionConfig {
    pub fn read_file(path: &str) -> Result<Self, ron::Error> {
        let reader = std::fs::File::open(path)?;

        ron::de::from_reader(reader)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
