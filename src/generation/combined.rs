use tracing::debug;

use crate::codec::{CellGeometry, CellPosition, Rect};
use crate::error::Result;
use crate::rooms::{room_rects_from_map, RoomRect};
use crate::world::{MapComposite, MapLoader, Orientation, WorldObject, WorldSpec};

/// A world object moved into world squares
#[derive(Debug, Clone)]
pub struct PlacedObject {
    pub kind: String,
    pub name: String,
    pub rect: Rect,
    pub level: i32,
    pub properties: std::collections::BTreeMap<String, String>,
}

impl PlacedObject {
    fn new(obj: &WorldObject, origin: (i32, i32)) -> Self {
        Self {
            kind: obj.kind.clone(),
            name: obj.name.clone(),
            rect: obj.rect().translated(origin.0, origin.1),
            level: obj.level,
            properties: obj.properties.clone(),
        }
    }
}

/// Every source cell overlapping one output cell, composited together.
///
/// The composite's origin is the top-left corner of the lowest source
/// cell; `to_combined` converts world squares into composite squares.
pub struct CombinedCellMaps {
    cell: CellPosition,
    geometry: CellGeometry,
    min_source: (i32, i32),
    composite: MapComposite,
    source_maps: usize,
    room_rects: Vec<RoomRect>,
    objects: Vec<PlacedObject>,
}

impl CombinedCellMaps {
    /// Load every map the cell needs: all source cells within `margin` squares
    /// of the cell, so buildings crossing a source seam are seen whole. The
    /// first map that fails to load fails the cell.
    pub fn load(
        world: &WorldSpec,
        loader: &mut dyn MapLoader,
        geometry: CellGeometry,
        cell: CellPosition,
        margin: i32,
    ) -> Result<Self> {
        let ((x0, y0), (x1, y1)) = Self::source_range(&geometry, cell, margin);
        let s = geometry.source_cell_size;
        let mut composite = MapComposite::new((x1 - x0 + 1) * s, (y1 - y0 + 1) * s, Orientation::default());
        let mut orientation = None;
        let mut source_maps = 0;
        let mut room_rects = Vec::new();
        let mut objects = Vec::new();

        for sy in y0..=y1 {
            for sx in x0..=x1 {
                let Some(source) = world.cell(sx, sy) else { continue };
                let offset = ((sx - x0) * s, (sy - y0) * s);
                let origin = (sx * s, sy * s);

                if let Some(path) = &source.map {
                    let map = loader.load_map(path)?;
                    orientation.get_or_insert(map.orientation);
                    room_rects.extend(room_rects_from_map(&map, origin, 0)?);
                    composite.add_sub_map(map, offset, 0);
                    source_maps += 1;
                }
                for lot in &source.lots {
                    let map = loader.load_map(&lot.map)?;
                    let lot_origin = (origin.0 + lot.x, origin.1 + lot.y);
                    room_rects.extend(room_rects_from_map(&map, lot_origin, lot.level)?);
                    composite.add_sub_map(map, (offset.0 + lot.x, offset.1 + lot.y), lot.level);
                }
                objects.extend(source.objects.iter().map(|o| PlacedObject::new(o, origin)));
            }
        }

        if let Some(orientation) = orientation {
            composite.set_orientation(orientation);
        }
        debug!(
            cell = %cell,
            sources = source_maps,
            placements = composite.placements().len(),
            room_rects = room_rects.len(),
            "combined cell maps"
        );
        Ok(Self {
            cell,
            geometry,
            min_source: (x0, y0),
            composite,
            source_maps,
            room_rects,
            objects,
        })
    }

    /// Source cells `load` reads for `cell`, inclusive range per axis
    pub fn source_range(geometry: &CellGeometry, cell: CellPosition, margin: i32) -> ((i32, i32), (i32, i32)) {
        geometry.sources_for_rect(&geometry.cell_rect(cell).inflated(margin))
    }

    pub fn cell(&self) -> CellPosition {
        self.cell
    }

    pub fn geometry(&self) -> CellGeometry {
        self.geometry
    }

    /// World squares of the output cell
    pub fn cell_rect(&self) -> Rect {
        self.geometry.cell_rect(self.cell)
    }

    /// World squares covered by the composite
    pub fn combined_rect(&self) -> Rect {
        let s = self.geometry.source_cell_size;
        Rect::new(
            self.min_source.0 * s,
            self.min_source.1 * s,
            self.composite.width(),
            self.composite.height(),
        )
    }

    pub fn to_combined(&self, wx: i32, wy: i32) -> (i32, i32) {
        let s = self.geometry.source_cell_size;
        (wx - self.min_source.0 * s, wy - self.min_source.1 * s)
    }

    pub fn to_world(&self, cx: i32, cy: i32) -> (i32, i32) {
        let s = self.geometry.source_cell_size;
        (cx + self.min_source.0 * s, cy + self.min_source.1 * s)
    }

    pub fn composite(&self) -> &MapComposite {
        &self.composite
    }

    /// Source cells with a base map
    pub fn source_maps(&self) -> usize {
        self.source_maps
    }

    pub fn is_empty(&self) -> bool {
        self.composite.placements().is_empty()
    }

    /// RoomDefs of every loaded map, in world squares
    pub fn room_rects(&self) -> &[RoomRect] {
        &self.room_rects
    }

    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }
}
