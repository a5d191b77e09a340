//! Column resolution: directory entry -> column record -> block slots.
//!
//! Resolution runs one map row at a time so a driver can interleave it with
//! other work. Problems with a single cell never abort the walk; the cell is
//! left (partly) empty and a [`DecodeWarning`] is recorded.

use std::fmt;
use std::sync::Arc;

use asphalt_format::ByteCursor;

use crate::block::{BlockRecord, ColumnRecord};
use crate::dmap::MapData;
use crate::{MAP_SIZE, MAX_Z};

/// What an unresolved reference pointed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reference {
    /// Directory entry past the end of the column data.
    ColumnOffset { offset: usize, available: usize },
    /// The directory itself is shorter than the map.
    DirectoryEntry { index: usize },
    /// Column slot naming a block index past the block table.
    BlockIndex { z: usize, index: u32, count: usize },
    /// Column slot above the highest storable z.
    Elevation { z: usize },
    /// The column declares more slots than the data holds.
    TruncatedColumn { declared: usize, present: usize },
}

/// Recoverable decode problem. The affected cell is treated as (partly) empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeWarning {
    UnresolvedReference { x: usize, y: usize, target: Reference },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let DecodeWarning::UnresolvedReference { x, y, target } = self;
        write!(f, "cell ({}, {}): ", x, y)?;
        match target {
            Reference::ColumnOffset { offset, available } => write!(
                f,
                "column offset {} outside {} bytes of column data",
                offset, available
            ),
            Reference::DirectoryEntry { index } => write!(f, "no directory entry {}", index),
            Reference::BlockIndex { z, index, count } => write!(
                f,
                "slot z={} names block {} of {}",
                z, index, count
            ),
            Reference::Elevation { z } => write!(f, "slot z={} above the map", z),
            Reference::TruncatedColumn { declared, present } => write!(
                f,
                "column declares {} slots, data holds {}",
                declared, present
            ),
        }
    }
}

/// Block indices of one cell by z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellStack {
    pub slots: [Option<u32>; MAX_Z],
}

impl CellStack {
    pub const EMPTY: CellStack = CellStack { slots: [None; MAX_Z] };

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// `(z, block index)` for populated slots, bottom up.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(z, s)| s.map(|b| (z, b)))
    }
}

/// Fully resolved 256x256x8 volume, sharing the block table with its [`MapData`].
#[derive(Clone, Debug)]
pub struct ResolvedMap {
    map: Arc<MapData>,
    cells: Vec<CellStack>,
    pub warnings: Vec<DecodeWarning>,
}

impl ResolvedMap {
    pub fn map(&self) -> &Arc<MapData> {
        &self.map
    }

    pub fn blocks(&self) -> &[BlockRecord] {
        &self.map.blocks
    }

    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> &CellStack {
        if x >= MAP_SIZE || y >= MAP_SIZE {
            return &CellStack::EMPTY;
        }
        &self.cells[y * MAP_SIZE + x]
    }

    /// Block occupying `(x, y, z)`, if any.
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> Option<&BlockRecord> {
        let index = (*self.cell(x, y).slots.get(z)?)?;
        self.map.blocks.get(index as usize)
    }

    /// Count of populated slots across the map.
    pub fn occupied_slots(&self) -> usize {
        self.cells.iter().map(|c| c.occupied().count()).sum()
    }
}

/// Row-at-a-time resolver over shared map data.
#[derive(Debug)]
pub struct ColumnResolver {
    map: Arc<MapData>,
    row: usize,
    cells: Vec<CellStack>,
    warnings: Vec<DecodeWarning>,
}

impl ColumnResolver {
    pub fn new(map: Arc<MapData>) -> Self {
        Self {
            map,
            row: 0,
            cells: Vec::with_capacity(MAP_SIZE * MAP_SIZE),
            warnings: Vec::new(),
        }
    }

    /// Rows resolved so far.
    #[inline]
    pub fn rows_done(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.row >= MAP_SIZE
    }

    /// Resolves the next row. Returns the row index, or `None` once all rows are done.
    pub fn step_row(&mut self) -> Option<usize> {
        if self.is_done() {
            return None;
        }
        let y = self.row;
        for x in 0..MAP_SIZE {
            let cell = resolve_cell(&self.map, x, y, &mut self.warnings);
            self.cells.push(cell);
        }
        self.row += 1;
        Some(y)
    }

    /// Resolves any remaining rows and returns the product.
    pub fn finish(mut self) -> ResolvedMap {
        while self.step_row().is_some() {}
        if !self.warnings.is_empty() {
            log::warn!(
                target: "map",
                "{} unresolved references; affected cells left empty",
                self.warnings.len()
            );
        }
        ResolvedMap {
            map: self.map,
            cells: self.cells,
            warnings: self.warnings,
        }
    }

    /// Resolves the whole map in one call.
    pub fn resolve_all(map: Arc<MapData>) -> ResolvedMap {
        ColumnResolver::new(map).finish()
    }
}

fn resolve_cell(map: &MapData, x: usize, y: usize, warnings: &mut Vec<DecodeWarning>) -> CellStack {
    let mut warn = |target: Reference| {
        let w = DecodeWarning::UnresolvedReference { x, y, target };
        log::debug!(target: "map", "{}", w);
        warnings.push(w);
    };

    let index = y * MAP_SIZE + x;
    let Some(offset) = map.column_offset(index) else {
        warn(Reference::DirectoryEntry { index });
        return CellStack::EMPTY;
    };
    if offset >= map.column_bytes.len() {
        warn(Reference::ColumnOffset {
            offset,
            available: map.column_bytes.len(),
        });
        return CellStack::EMPTY;
    }

    let mut cursor = ByteCursor::new(&map.column_bytes);
    cursor.set_pos(offset);
    let column: ColumnRecord = cursor.read_struct();

    let mut cell = CellStack::EMPTY;
    let declared = column.declared_slots();
    if column.blocks.len() < declared {
        warn(Reference::TruncatedColumn {
            declared,
            present: column.blocks.len(),
        });
    }
    for (z, block) in column.slots() {
        if z >= MAX_Z {
            warn(Reference::Elevation { z });
            continue;
        }
        if block as usize >= map.blocks.len() {
            warn(Reference::BlockIndex {
                z,
                index: block,
                count: map.blocks.len(),
            });
            continue;
        }
        cell.slots[z] = Some(block);
    }
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DIRECTORY_LEN;

    fn map_with(columns: &[u8], directory: &[(usize, u32)], blocks: usize) -> Arc<MapData> {
        let mut dir = vec![0u32; DIRECTORY_LEN];
        for &(i, o) in directory {
            dir[i] = o;
        }
        Arc::new(MapData {
            directory: dir,
            column_bytes: columns.to_vec(),
            blocks: vec![BlockRecord::default(); blocks],
            ..MapData::default()
        })
    }

    #[test]
    fn resolves_rows_in_order() {
        let map = map_with(&[2, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0], &[], 2);
        let mut r = ColumnResolver::new(map);
        assert_eq!(r.step_row(), Some(0));
        assert_eq!(r.step_row(), Some(1));
        assert_eq!(r.rows_done(), 2);
        let resolved = r.finish();
        assert_eq!(resolved.cell(5, 200).slots[0], Some(1));
        assert_eq!(resolved.cell(5, 200).slots[1], Some(0));
        assert!(resolved.block_at(0, 0, 1).is_some());
        assert!(resolved.block_at(0, 0, 2).is_none());
        assert_eq!(resolved.occupied_slots(), 2 * DIRECTORY_LEN);
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn out_of_range_block_index_is_skipped() {
        let map = map_with(&[1, 0, 0, 0, 9, 0, 0, 0], &[], 1);
        let resolved = ColumnResolver::resolve_all(map);
        assert!(resolved.cell(0, 0).is_empty());
        assert_eq!(resolved.warnings.len(), DIRECTORY_LEN);
        assert!(matches!(
            resolved.warnings[0],
            DecodeWarning::UnresolvedReference {
                target: Reference::BlockIndex { z: 0, index: 9, count: 1 },
                ..
            }
        ));
    }

    #[test]
    fn slots_above_the_map_are_dropped() {
        let mut col = vec![9u8, 6, 0, 0];
        for _ in 0..4 {
            col.extend_from_slice(&0u32.to_le_bytes());
        }
        let resolved = ColumnResolver::resolve_all(map_with(&col, &[], 1));
        let cell = resolved.cell(0, 0);
        assert_eq!(cell.occupied().map(|(z, _)| z).collect::<Vec<_>>(), vec![6, 7]);
        let per_cell: Vec<_> = resolved
            .warnings
            .iter()
            .filter(|w| matches!(w, DecodeWarning::UnresolvedReference { x: 0, y: 0, .. }))
            .collect();
        assert_eq!(per_cell.len(), 1);
        assert!(matches!(
            per_cell[0],
            DecodeWarning::UnresolvedReference {
                target: Reference::Elevation { z: 8 },
                ..
            }
        ));
    }

    #[test]
    fn short_directory_reports_missing_entries() {
        let map = Arc::new(MapData {
            directory: vec![0; 10],
            column_bytes: vec![0; 4],
            ..MapData::default()
        });
        let resolved = ColumnResolver::resolve_all(map);
        assert_eq!(resolved.warnings.len(), DIRECTORY_LEN - 10);
        assert_eq!(resolved.cell(300, 0), &CellStack::EMPTY);
    }
}
