use crate::SessionConfig;

use fogmap_core::{Bbox, LngLat};
use fogmap_map::{Area, ArchiveError, ArchiveReader, ArchiveWriter, FogMap, History, ImportSummary};

/// # Edit Session
///
/// Owns the current [`FogMap`] and its undo [`History`]. All edits of one map go through a single session; the snapshots it
/// hands out can be read from any thread.
///
/// Methods that change the map return the [`Area`] that needs to be redrawn, or `None` if nothing changed.
pub struct EditSession {
    config: SessionConfig,
    fog_map: FogMap,
    history: History,
}

impl EditSession {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_map(FogMap::empty(), config)
    }

    pub fn with_map(fog_map: FogMap, config: SessionConfig) -> Self {
        let history = History::with_capacity(fog_map.clone(), config.history_capacity);
        Self {
            config,
            fog_map,
            history,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn fog_map(&self) -> &FogMap {
        &self.fog_map
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Makes `fog_map` the current snapshot and records it in the history, unless it already is the current snapshot.
    ///
    /// Returns `true` if the snapshot changed.
    pub fn apply(&mut self, fog_map: FogMap, area: Area) -> bool {
        if FogMap::ptr_eq(&self.fog_map, &fog_map) {
            return false;
        }
        self.history.append(fog_map.clone(), area);
        self.fog_map = fog_map;
        true
    }

    /// Replaces the whole map, e.g. after an import. The history restarts from an empty map, so the replacement itself can be
    /// undone but nothing before it.
    pub fn replace_map(&mut self, fog_map: FogMap) {
        log::debug!("Replacing map with {:?}", fog_map);
        self.fog_map = FogMap::empty();
        self.history = History::with_capacity(FogMap::empty(), self.config.history_capacity);
        self.apply(fog_map, Area::All);
    }

    /// Draws a polyline through `points` as one undoable edit.
    pub fn draw_path(&mut self, points: &[LngLat]) -> Option<Area> {
        if points.len() < 2 {
            return None;
        }
        let fog_map = points
            .windows(2)
            .fold(self.fog_map.clone(), |fog_map, segment| fog_map.add_line(segment[0], segment[1]));
        let area = Area::Bbox(Bbox::from_points(points.iter().copied())?);

        self.apply(fog_map, area).then(|| area)
    }

    /// Clears everything that touches `bbox` as one undoable edit.
    pub fn erase(&mut self, bbox: &Bbox) -> Option<Area> {
        let area = Area::Bbox(*bbox);
        let fog_map = self.fog_map.clear_bbox(bbox);

        self.apply(fog_map, area).then(|| area)
    }

    pub fn undo(&mut self) -> Option<Area> {
        let mut undone = None;
        self.history
            .undo(|fog_map, area| undone = Some((fog_map.clone(), *area)));
        undone.map(|(fog_map, area)| {
            self.fog_map = fog_map;
            area
        })
    }

    pub fn redo(&mut self) -> Option<Area> {
        let mut redone = None;
        self.history
            .redo(|fog_map, area| redone = Some((fog_map.clone(), *area)));
        redone.map(|(fog_map, area)| {
            self.fog_map = fog_map;
            area
        })
    }

    /// Replaces the map with the tiles found in `reader`. Directories and hidden files are ignored, and tile files that fail
    /// to decode are reported in the summary.
    pub fn import_archive(&mut self, reader: &mut impl ArchiveReader) -> Result<ImportSummary, ArchiveError> {
        let files = reader
            .entries()?
            .into_iter()
            .filter(|entry| {
                let keep = entry.is_tile_candidate();
                if !keep {
                    log::debug!("Ignoring archive entry {}", entry.name);
                }
                keep
            })
            .collect();
        let (fog_map, summary) = FogMap::create_from_files(files, self.config.parallel_import);
        self.replace_map(fog_map);

        Ok(summary)
    }

    /// Writes the current map into `writer`. Returns the number of tile files written.
    pub fn export_archive(&self, writer: &mut impl ArchiveWriter) -> Result<usize, ArchiveError> {
        self.fog_map.export_archive(writer)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
