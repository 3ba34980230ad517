use crate::codec::Rect;
use crate::error::{Error, Result};
use crate::world::{Orientation, TileMap};

use super::graph::RoomRect;

/// Squares each level is shifted by in isometric maps
pub const ISO_LEVEL_SKEW: i32 = 3;

/// RoomDefs of `map` placed at world square `origin` and level offset `level`.
///
/// RoomDefs must lie inside their map. RoomDefs of isometric maps are
/// unskewed by their absolute level, group level plus `level`.
pub fn room_rects_from_map(map: &TileMap, origin: (i32, i32), level: i32) -> Result<Vec<RoomRect>> {
    let mut rects = Vec::new();
    for (group_level, obj) in map.room_defs() {
        let local = Rect::new(obj.x, obj.y, obj.width, obj.height);
        if local.is_empty() || !Rect::new(0, 0, map.width, map.height).contains_rect(&local) {
            return Err(Error::RoomDefOutOfBounds {
                name: obj.name.clone(),
                map: map.name.clone(),
                x: obj.x,
                y: obj.y,
                width: obj.width,
                height: obj.height,
            });
        }
        let z = group_level + level;
        let skew = match map.orientation {
            Orientation::Isometric => ISO_LEVEL_SKEW * z,
            _ => 0,
        };
        let world = local.translated(origin.0 - skew, origin.1 - skew);
        rects.push(RoomRect::new(obj.name.clone(), z, world, map.name.clone()));
    }
    Ok(rects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::map::testing::*;
    use crate::world::ObjectGroup;

    fn map_with_defs(orientation: Orientation, level: i32, defs: Vec<crate::world::MapObject>) -> TileMap {
        let mut map = blank_map("house.json", 30, 30, vec![]);
        map.orientation = orientation;
        map.object_groups.push(ObjectGroup { name: format!("{}_RoomDefs", level), level, objects: defs });
        map
    }

    #[test]
    fn test_room_defs_to_world() {
        let map = map_with_defs(Orientation::LevelIsometric, 1, vec![room_def("bedroom#1", 2, 3, 4, 5)]);
        let rects = room_rects_from_map(&map, (600, 300), 0).unwrap();
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].rect, Rect::new(602, 303, 4, 5));
        assert_eq!(rects[0].level, 1);
        assert_eq!(rects[0].map, "house.json");
        assert_eq!(rects[0].base_name(), "bedroom");
    }

    #[test]
    fn test_isometric_upper_level_unskewed() {
        let map = map_with_defs(Orientation::Isometric, 2, vec![room_def("attic", 10, 10, 4, 4)]);
        let rects = room_rects_from_map(&map, (0, 0), 0).unwrap();
        assert_eq!(rects[0].rect, Rect::new(4, 4, 4, 4));
        assert_eq!(rects[0].level, 2);
    }

    #[test]
    fn test_isometric_lot_level_adds_to_skew() {
        // group level 2 in a lot placed at level 1 sits on level 3
        let map = map_with_defs(Orientation::Isometric, 2, vec![room_def("attic", 10, 10, 4, 4)]);
        let rects = room_rects_from_map(&map, (20, 20), 1).unwrap();
        assert_eq!(rects[0].rect, Rect::new(21, 21, 4, 4));
        assert_eq!(rects[0].level, 3);
    }

    #[test]
    fn test_room_def_outside_map() {
        let map = map_with_defs(Orientation::LevelIsometric, 0, vec![room_def("yard", 28, 0, 5, 5)]);
        let err = room_rects_from_map(&map, (0, 0), 0).unwrap_err();
        assert!(matches!(err, Error::RoomDefOutOfBounds { ref name, .. } if name == "yard"));
        assert!(!err.is_fatal());
    }
}
