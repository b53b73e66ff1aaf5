use crate::archive::{ArchiveEntry, ArchiveError, ArchiveReader, ArchiveWriter};

use sled::Tree;

/// # Tile Database
///
/// Keeps the tile files of one map in a [`sled::Tree`] named `<map_name>-tiles`, keyed by their path inside of the archive
/// (e.g. `Sync/<filename>`). This is the same layout as an exported archive, so a map can be imported from and exported to
/// the database just like a `.zip` file.
pub struct TileDb {
    tree: Tree,
}

impl TileDb {
    pub fn open(map_name: &str, db: &sled::Db) -> sled::Result<Self> {
        let tree = db.open_tree(format!("{}-tiles", map_name))?;
        Ok(Self { tree })
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Blocks until everything written so far is durable.
    pub fn flush(&self) -> sled::Result<usize> {
        self.tree.flush()
    }
}

impl ArchiveReader for TileDb {
    fn entries(&mut self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let mut entries = Vec::with_capacity(self.tree.len());
        for kv in self.tree.iter() {
            let (key, value) = kv?;
            entries.push(ArchiveEntry::new(
                String::from_utf8_lossy(&key).into_owned(),
                value.to_vec(),
            ));
        }
        Ok(entries)
    }
}

impl ArchiveWriter for TileDb {
    /// Every export replaces the folder, so tiles that were erased since the last export do not come back.
    fn create_folder(&mut self, name: &str) -> Result<(), ArchiveError> {
        let prefix = format!("{}/", name);
        let mut removed = 0;
        for key in self.tree.scan_prefix(prefix.as_bytes()).keys() {
            self.tree.remove(key?)?;
            removed += 1;
        }
        if removed > 0 {
            log::debug!("Removed {} stale files from {}", removed, prefix);
        }
        Ok(())
    }

    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        self.tree.insert(name.as_bytes(), bytes)?;
        Ok(())
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_read_entries() {
        let db = sled::Config::default().temporary(true).open().unwrap();
        let mut tiles = TileDb::open("mymap", &db).unwrap();
        assert!(tiles.is_empty());

        tiles.create_folder("Sync").unwrap();
        tiles.put("Sync/b", &[2]).unwrap();
        tiles.put("Sync/a", &[1]).unwrap();

        assert_eq!(
            tiles.entries().unwrap(),
            vec![
                ArchiveEntry::new("Sync/a", vec![1]),
                ArchiveEntry::new("Sync/b", vec![2]),
            ]
        );
    }

    #[test]
    fn create_folder_drops_stale_files() {
        let db = sled::Config::default().temporary(true).open().unwrap();
        let mut tiles = TileDb::open("mymap", &db).unwrap();
        tiles.put("Sync/old", &[0]).unwrap();
        tiles.put("Other/keep", &[0]).unwrap();

        tiles.create_folder("Sync").unwrap();
        tiles.put("Sync/new", &[1]).unwrap();

        let names: Vec<_> = tiles.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Other/keep".to_owned(), "Sync/new".to_owned()]);
    }

    #[test]
    fn maps_do_not_share_trees() {
        let db = sled::Config::default().temporary(true).open().unwrap();
        let mut a = TileDb::open("a", &db).unwrap();
        let b = TileDb::open("b", &db).unwrap();
        a.put("Sync/x", &[1]).unwrap();
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }
}
