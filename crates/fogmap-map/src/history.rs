use crate::FogMap;

use fogmap_core::Bbox;
use std::collections::VecDeque;

/// The region that changed between two snapshots, used to limit redrawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Area {
    All,
    Bbox(Bbox),
}

#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub map: FogMap,
    /// The region changed by the edit that produced `map`.
    pub area: Area,
}

/// # Edit History
///
/// A bounded, linear undo stack of [`FogMap`] snapshots with a cursor at the current snapshot.
///
/// Appending after an undo discards the redo branch. When the history is full, the oldest snapshot is evicted and the cursor
/// stays where it is.
#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    pos: usize,
    capacity: usize,
}

impl History {
    pub const DEFAULT_CAPACITY: usize = 20;

    pub fn new(initial: FogMap) -> Self {
        Self::with_capacity(initial, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(initial: FogMap, capacity: usize) -> Self {
        assert!(capacity >= 1, "history must hold at least the current snapshot");
        let mut entries = VecDeque::with_capacity(capacity);
        entries.push_back(HistoryEntry {
            map: initial,
            area: Area::All,
        });
        Self {
            entries,
            pos: 0,
            capacity,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.pos > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pos + 1 < self.entries.len()
    }

    pub fn append(&mut self, map: FogMap, area: Area) {
        self.entries.truncate(self.pos + 1);
        self.entries.push_back(HistoryEntry { map, area });
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        } else {
            self.pos += 1;
        }
    }

    /// Steps back one snapshot and calls `apply` with it and the area of the edit being undone.
    ///
    /// Returns `false` without calling `apply` if there is nothing to undo.
    pub fn undo(&mut self, apply: impl FnOnce(&FogMap, &Area)) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.pos -= 1;
        apply(&self.entries[self.pos].map, &self.entries[self.pos + 1].area);
        true
    }

    /// Steps forward one snapshot and calls `apply` with it and the area of the edit being redone.
    ///
    /// Returns `false` without calling `apply` if there is nothing to redo.
    pub fn redo(&mut self, apply: impl FnOnce(&FogMap, &Area)) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.pos += 1;
        let entry = &self.entries[self.pos];
        apply(&entry.map, &entry.area);
        true
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.pos]
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use crate::units::PixelUnits;

    /// A distinct snapshot for each `i`.
    fn edit(map: &FogMap, i: i64) -> FogMap {
        map.add_pixel_line(PixelUnits([i * 100, 0]), PixelUnits([i * 100 + 10, 5]))
    }

    fn area(i: i64) -> Area {
        Area::Bbox(Bbox::new(i as f64, 0.0, i as f64 + 1.0, 1.0))
    }

    fn history_with_edits(n: i64) -> (History, Vec<FogMap>) {
        let mut history = History::new(FogMap::empty());
        let mut maps = vec![FogMap::empty()];
        for i in 1..=n {
            let map = edit(maps.last().unwrap(), i);
            history.append(map.clone(), area(i));
            maps.push(map);
        }
        (history, maps)
    }

    #[test]
    fn starts_at_initial_snapshot() {
        let history = History::new(FogMap::empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(FogMap::ptr_eq(&history.current().map, &FogMap::empty()));
        assert_eq!(history.current().area, Area::All);
    }

    #[test]
    fn capacity_bounds_undo() {
        let (mut history, maps) = history_with_edits(25);
        assert_eq!(history.len(), 20);
        assert_eq!(history.pos(), 19);

        let mut undos = 0;
        while history.undo(|_, _| {}) {
            undos += 1;
        }
        assert_eq!(undos, 19);
        assert!(!history.can_undo());
        // The five oldest snapshots were evicted.
        assert!(FogMap::ptr_eq(&history.current().map, &maps[6]));
    }

    #[test]
    fn undo_reports_area_of_undone_edit() {
        let (mut history, maps) = history_with_edits(3);

        let mut seen = None;
        assert!(history.undo(|map, area| seen = Some((map.clone(), *area))));
        let (map, undone) = seen.unwrap();
        assert!(FogMap::ptr_eq(&map, &maps[2]));
        assert_eq!(undone, area(3));

        let mut seen = None;
        assert!(history.redo(|map, area| seen = Some((map.clone(), *area))));
        let (map, redone) = seen.unwrap();
        assert!(FogMap::ptr_eq(&map, &maps[3]));
        assert_eq!(redone, area(3));
    }

    #[test]
    fn undo_then_redo_restores_snapshots() {
        let (mut history, maps) = history_with_edits(5);

        for i in (0..5).rev() {
            assert!(history.undo(|map, _| assert!(FogMap::ptr_eq(map, &maps[i]))));
        }
        assert!(!history.undo(|_, _| panic!("nothing to undo")));
        for i in 1..=5 {
            assert!(history.redo(|map, _| assert!(FogMap::ptr_eq(map, &maps[i]))));
        }
        assert!(!history.redo(|_, _| panic!("nothing to redo")));
        assert!(FogMap::ptr_eq(&history.current().map, &maps[5]));
    }

    #[test]
    fn append_prunes_redo_branch() {
        let (mut history, maps) = history_with_edits(4);
        history.undo(|_, _| {});
        history.undo(|_, _| {});
        assert!(history.can_redo());

        let branch = edit(&maps[2], 99);
        history.append(branch.clone(), area(99));
        assert!(!history.can_redo());
        assert_eq!(history.len(), 4);
        assert_eq!(history.pos(), 3);
        assert!(FogMap::ptr_eq(&history.current().map, &branch));
    }

    #[test]
    fn capacity_of_one_keeps_only_current() {
        let mut history = History::with_capacity(FogMap::empty(), 1);
        let map = edit(&FogMap::empty(), 1);
        history.append(map.clone(), area(1));
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(FogMap::ptr_eq(&history.current().map, &map));
    }
}
