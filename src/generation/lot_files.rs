use super::combined::CombinedCellMaps;
use super::density::ZombieDensityMap;
use super::grid::Grid;
use crate::codec::{CellGeometry, CellPosition, HeaderRoom, LotHeader, LotPackEncoder, Rect, RoomObject};
use crate::rooms::{Room, RoomGraph, ISO_LEVEL_SKEW};
use crate::tiles::{TileIndex, TileMetadata};
use crate::world::Orientation;

pub fn header_file_name(cell: CellPosition) -> String {
    format!("world_{}_{}.lotheader", cell.x, cell.y)
}

pub fn pack_file_name(cell: CellPosition) -> String {
    format!("world_{}_{}.lotpack", cell.x, cell.y)
}

/// Tiles with a metadata enum (doors, windows) inside a room, in cell-local squares.
///
/// Read straight from the composite: surviving rooms may reach past the grid.
pub fn room_objects(combined: &CombinedCellMaps, meta: &dyn TileMetadata, room: &Room, cell: &Rect) -> Vec<RoomObject> {
    let composite = combined.composite();
    let skew = match composite.orientation() {
        Orientation::Isometric => ISO_LEVEL_SKEW * room.level,
        _ => 0,
    };
    let mut objects = Vec::new();
    for rr in &room.rects {
        for y in rr.rect.y..rr.rect.bottom() {
            for x in rr.rect.x..rr.rect.right() {
                let (mx, my) = combined.to_combined(x, y);
                composite.for_each_cell_at(room.level, mx + skew, my + skew, |c| {
                    let meta_enum = meta.enum_value(c.tileset.normalized_name(), c.tile_id);
                    if meta_enum >= 0 {
                        objects.push(RoomObject { meta_enum, x: x - cell.x, y: y - cell.y });
                    }
                });
            }
        }
    }
    objects
}

pub struct HeaderInputs<'a> {
    pub version: i32,
    pub geometry: &'a CellGeometry,
    pub combined: &'a CombinedCellMaps,
    pub grid: &'a Grid,
    pub tiles: &'a TileIndex,
    pub graph: &'a RoomGraph,
    pub meta: &'a dyn TileMetadata,
    pub density: Option<&'a ZombieDensityMap>,
}

pub fn build_lot_header(inputs: &HeaderInputs) -> LotHeader {
    let cell = inputs.combined.cell();
    let cell_rect = inputs.geometry.cell_rect(cell);
    let chunks = inputs.geometry.chunks_per_cell();

    let rooms = inputs
        .graph
        .rooms
        .iter()
        .map(|room| HeaderRoom {
            name: room.name.clone(),
            level: room.level,
            rects: room.rects.iter().map(|r| r.rect.translated(-cell_rect.x, -cell_rect.y)).collect(),
            objects: room_objects(inputs.combined, inputs.meta, room, &cell_rect),
        })
        .collect();
    let buildings = inputs
        .graph
        .buildings
        .iter()
        .map(|b| b.rooms.iter().map(|&r| r as i32).collect())
        .collect();
    let zombie_density = match inputs.density {
        Some(map) => map.cell_densities(inputs.geometry, cell),
        None => vec![0; (chunks * chunks) as usize],
    };

    LotHeader {
        version: inputs.version,
        tile_names: inputs.tiles.used_tiles().map(|t| t.name.clone()).collect(),
        chunk_width: chunks,
        chunk_height: chunks,
        min_level: inputs.grid.min_level(),
        max_level: inputs.grid.max_level(),
        rooms,
        buildings,
        zombie_density,
    }
}

/// Encode the cell's squares, chunk by chunk, x outer, y inner.
pub fn build_lot_pack(version: i32, geometry: &CellGeometry, cell: CellPosition, grid: &Grid, tiles: &TileIndex) -> Vec<u8> {
    let rect = geometry.cell_rect(cell);
    let n = geometry.chunks_per_cell();
    let size = geometry.chunk_size;
    let mut encoder = LotPackEncoder::new(version, (n * n) as usize);
    let mut ids = Vec::new();

    for cx in 0..n {
        for cy in 0..n {
            encoder.begin_chunk();
            for z in grid.levels() {
                for x in rect.x + cx * size..rect.x + (cx + 1) * size {
                    for y in rect.y + cy * size..rect.y + (cy + 1) * size {
                        let square = grid.square(x, y, z);
                        if square.is_empty() {
                            encoder.push_empty();
                            continue;
                        }
                        ids.clear();
                        for e in &square.entries {
                            let tile = tiles.tile(e.gid);
                            assert!(tile.used, "tile {} in cell {} was never marked used", tile.name, cell);
                            ids.push(tile.id);
                        }
                        encoder.push_square(square.room_id, &ids);
                    }
                }
            }
            encoder.end_chunk();
        }
    }
    encoder.finish()
}
