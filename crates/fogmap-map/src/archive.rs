//! The container that tile files are exchanged in.
//!
//! The map only needs to enumerate files and to put files under a folder, so any container format can sit behind
//! [`ArchiveReader`] and [`ArchiveWriter`].

use crate::tile::TileError;

use std::collections::BTreeMap;
use std::io::{self, Read, Seek, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("tile database error: {0}")]
    Db(#[from] sled::Error),
    #[error("failed to encode tile {filename}: {source}")]
    Tile {
        filename: String,
        #[source]
        source: TileError,
    },
}

/// One file in an archive. `name` is the full path inside of the archive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// The last component of `name`.
    pub fn file_name(&self) -> &str {
        self.name
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default()
    }

    /// Directories and hidden files are never tiles.
    pub fn is_tile_candidate(&self) -> bool {
        let file_name = self.file_name();
        !file_name.is_empty() && !file_name.starts_with('.')
    }
}

pub trait ArchiveReader {
    fn entries(&mut self) -> Result<Vec<ArchiveEntry>, ArchiveError>;
}

pub trait ArchiveWriter {
    /// Prepares `name` to receive files. Containers without a notion of folders can ignore this.
    fn create_folder(&mut self, _name: &str) -> Result<(), ArchiveError> {
        Ok(())
    }

    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError>;
}

/// An in-memory archive, ordered by name.
#[derive(Clone, Debug, Default)]
pub struct MemoryArchive {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<ArchiveEntry> for MemoryArchive {
    fn from_iter<I: IntoIterator<Item = ArchiveEntry>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().map(|e| (e.name, e.bytes)).collect(),
        }
    }
}

impl ArchiveReader for MemoryArchive {
    fn entries(&mut self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        Ok(self
            .files
            .iter()
            .map(|(name, bytes)| ArchiveEntry::new(name.clone(), bytes.clone()))
            .collect())
    }
}

impl ArchiveWriter for MemoryArchive {
    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        self.files.insert(name.to_owned(), bytes.to_vec());
        Ok(())
    }
}

/// Reads every file of a `.zip` archive.
pub struct ZipArchiveReader<R> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipArchiveReader<R> {
    pub fn new(reader: R) -> Result<Self, ArchiveError> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }
}

impl<R: Read + Seek> ArchiveReader for ZipArchiveReader<R> {
    fn entries(&mut self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            entries.push(ArchiveEntry::new(file.name(), bytes));
        }
        Ok(entries)
    }
}

/// Writes a `.zip` archive. Tile files are already compressed, so they are stored as-is.
pub struct ZipArchiveWriter<W: Write + Seek> {
    writer: ZipWriter<W>,
}

impl<W: Write + Seek> ZipArchiveWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: ZipWriter::new(inner),
        }
    }

    /// Writes the central directory and returns the inner writer.
    pub fn finish(self) -> Result<W, ArchiveError> {
        Ok(self.writer.finish()?)
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    }
}

impl<W: Write + Seek> ArchiveWriter for ZipArchiveWriter<W> {
    fn create_folder(&mut self, name: &str) -> Result<(), ArchiveError> {
        self.writer.add_directory(name, Self::options())?;
        Ok(())
    }

    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        self.writer.start_file(name, Self::options())?;
        self.writer.write_all(bytes)?;
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

    use std::io::Cursor;

    #[test]
    fn entry_file_names() {
        let entry = |name: &str| ArchiveEntry::new(name, Vec::new());
        assert_eq!(entry("Sync/abcdolhe").file_name(), "abcdolhe");
        assert_eq!(entry("a\\b\\c").file_name(), "c");
        assert_eq!(entry("plain").file_name(), "plain");
        assert!(entry("Sync/abcdolhe").is_tile_candidate());
        assert!(!entry("Sync/").is_tile_candidate());
        assert!(!entry("Sync/.DS_Store").is_tile_candidate());
    }

    #[test]
    fn zip_write_and_read() {
        let mut writer = ZipArchiveWriter::new(Cursor::new(Vec::new()));
        writer.create_folder("Sync").unwrap();
        writer.put("Sync/a", b"first").unwrap();
        writer.put("Sync/b", b"second").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut reader = ZipArchiveReader::new(Cursor::new(bytes)).unwrap();
        let entries = reader.entries().unwrap();
        assert_eq!(
            entries,
            vec![
                ArchiveEntry::new("Sync/a", b"first".to_vec()),
                ArchiveEntry::new("Sync/b", b"second".to_vec()),
            ]
        );
    }

    #[test]
    fn zip_reads_whole_large_entries() {
        let large: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        let mut writer = ZipArchiveWriter::new(Cursor::new(Vec::new()));
        writer.put("Sync/large", &large).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let entries = ZipArchiveReader::new(Cursor::new(bytes)).unwrap().entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].bytes, large);
    }

    #[test]
    fn memory_archive_round_trip() {
        let mut archive = MemoryArchive::new();
        archive.put("Sync/x", &[1, 2, 3]).unwrap();
        assert_eq!(archive.get("Sync/x"), Some(&[1u8, 2, 3][..]));
        let copy: MemoryArchive = archive.entries().unwrap().into_iter().collect();
        assert_eq!(copy.names().collect::<Vec<_>>(), vec!["Sync/x"]);
    }
}
