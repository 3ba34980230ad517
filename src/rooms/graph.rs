use std::collections::BTreeMap;

use ahash::AHashMap;
use tracing::{debug, info};

use super::spatial::SpatialRectIndex;
use crate::codec::Rect;

/// Marks a RoomDef as one fragment of a larger room: `kitchen#1`, `kitchen#2`
pub const MERGE_MARKER: char = '#';

/// A RoomDef rectangle in world squares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRect {
    pub name: String,
    pub level: i32,
    pub rect: Rect,
    /// Map the RoomDef was authored in
    pub map: String,
}

impl RoomRect {
    pub fn new(name: impl Into<String>, level: i32, rect: Rect, map: impl Into<String>) -> Self {
        Self { name: name.into(), level, rect, map: map.into() }
    }

    pub fn is_mergeable(&self) -> bool {
        self.name.contains(MERGE_MARKER)
    }

    /// Name without its `#tag`
    pub fn base_name(&self) -> &str {
        self.name.split(MERGE_MARKER).next().unwrap_or(&self.name)
    }
}

/// Rectangles share part of an edge. Touching at a single corner is not adjacency.
pub fn rects_adjacent(a: &Rect, b: &Rect) -> bool {
    let xo = a.right().min(b.right()) - a.x.max(b.x);
    let yo = a.bottom().min(b.bottom()) - a.y.max(b.y);
    (xo >= 0 && yo > 0) || (xo > 0 && yo >= 0)
}

/// Rectangles overlap or touch, corners included; used between floors.
fn rects_touch(a: &Rect, b: &Rect) -> bool {
    a.inflated(1).intersects(b)
}

/// Disjoint sets over `0..n` with path compression and union by size.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self { parent: (0..n).collect(), size: vec![1; n] }
    }

    pub fn find(&mut self, mut i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[i] != root {
            let next = self.parent[i];
            self.parent[i] = root;
            i = next;
        }
        root
    }

    /// Merge the sets of `a` and `b`; returns the surviving root.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return ra;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        ra
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: String,
    pub level: i32,
    /// In order of addition
    pub rects: Vec<RoomRect>,
    pub bounds: Rect,
    /// Index into `RoomGraph::buildings`
    pub building: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Building {
    /// Room ids, ascending
    pub rooms: Vec<usize>,
    pub bounds: Rect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomGraphStats {
    pub room_rects: usize,
    pub rooms: usize,
    pub buildings: usize,
    pub discarded_buildings: usize,
}

impl std::ops::AddAssign for RoomGraphStats {
    fn add_assign(&mut self, other: Self) {
        self.room_rects += other.room_rects;
        self.rooms += other.rooms;
        self.buildings += other.buildings;
        self.discarded_buildings += other.discarded_buildings;
    }
}

/// Merged rooms and buildings. A room's id is its index in `rooms`.
#[derive(Debug, Clone, Default)]
pub struct RoomGraph {
    pub rooms: Vec<Room>,
    pub buildings: Vec<Building>,
    pub stats: RoomGraphStats,
}

impl RoomGraph {
    /// Drop buildings whose top-left corner lies outside `cell`; the cell that
    /// contains it writes them instead. Room ids are renumbered.
    pub fn discard_foreign_buildings(&mut self, cell: &Rect) -> usize {
        let keep: Vec<bool> = self
            .buildings
            .iter()
            .map(|b| cell.contains(b.bounds.x, b.bounds.y))
            .collect();
        let discarded = keep.iter().filter(|k| !**k).count();
        if discarded == 0 {
            return 0;
        }

        let mut building_ids = vec![usize::MAX; self.buildings.len()];
        let mut buildings = Vec::new();
        for (i, b) in std::mem::take(&mut self.buildings).into_iter().enumerate() {
            if keep[i] {
                building_ids[i] = buildings.len();
                buildings.push(Building { rooms: Vec::new(), bounds: b.bounds });
            } else {
                debug!(x = b.bounds.x, y = b.bounds.y, rooms = b.rooms.len(), "discarding building of a neighbouring cell");
            }
        }

        let mut rooms = Vec::new();
        for mut room in std::mem::take(&mut self.rooms) {
            let id = building_ids[room.building];
            if id == usize::MAX {
                self.stats.room_rects -= room.rects.len();
                continue;
            }
            room.building = id;
            buildings[id].rooms.push(rooms.len());
            rooms.push(room);
        }

        self.rooms = rooms;
        self.buildings = buildings;
        self.stats.rooms = self.rooms.len();
        self.stats.buildings = self.buildings.len();
        self.stats.discarded_buildings += discarded;
        discarded
    }

    pub fn room(&self, id: usize) -> &Room {
        &self.rooms[id]
    }

    pub fn building_of(&self, room_id: usize) -> &Building {
        &self.buildings[self.rooms[room_id].building]
    }
}

/// Collects RoomDef rectangles and merges them into rooms and buildings.
pub struct RoomGraphBuilder {
    bounds: Rect,
    bucket_size: i32,
    rects: Vec<RoomRect>,
}

impl RoomGraphBuilder {
    /// `bounds` is the area covered by the rects, used to size the spatial indexes.
    pub fn new(bounds: Rect, bucket_size: i32) -> Self {
        Self { bounds, bucket_size, rects: Vec::new() }
    }

    pub fn add_rect(&mut self, rect: RoomRect) {
        self.rects.push(rect);
    }

    pub fn extend(&mut self, rects: impl IntoIterator<Item = RoomRect>) {
        self.rects.extend(rects);
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn build(self) -> RoomGraph {
        let room_of_rect = self.merge_rects();

        // rooms in order of their earliest rect
        let mut room_ids: AHashMap<usize, usize> = AHashMap::new();
        let mut rooms: Vec<Room> = Vec::new();
        for (i, rect) in self.rects.iter().enumerate() {
            let root = room_of_rect[i];
            match room_ids.get(&root) {
                Some(&id) => {
                    let room = &mut rooms[id];
                    room.bounds = room.bounds.united(&rect.rect);
                    room.rects.push(rect.clone());
                }
                None => {
                    room_ids.insert(root, rooms.len());
                    rooms.push(Room {
                        name: rect.base_name().to_string(),
                        level: rect.level,
                        rects: vec![rect.clone()],
                        bounds: rect.rect,
                        building: usize::MAX,
                    });
                }
            }
        }

        let buildings = Self::merge_rooms(self.bounds, self.bucket_size, &mut rooms);
        let stats = RoomGraphStats {
            room_rects: self.rects.len(),
            rooms: rooms.len(),
            buildings: buildings.len(),
            discarded_buildings: 0,
        };
        info!(rects = stats.room_rects, rooms = stats.rooms, buildings = stats.buildings, "merged rooms");
        RoomGraph { rooms, buildings, stats }
    }

    /// Root of each rect's room after merging `#`-tagged fragments per floor.
    fn merge_rects(&self) -> Vec<usize> {
        let mut uf = UnionFind::new(self.rects.len());
        let mut by_level: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (i, r) in self.rects.iter().enumerate() {
            by_level.entry(r.level).or_default().push(i);
        }

        for members in by_level.values() {
            let mut index = SpatialRectIndex::new(self.bounds, self.bucket_size);
            for &i in members {
                index.add(&self.rects[i].rect, i);
            }
            for &i in members {
                let a = &self.rects[i];
                if !a.is_mergeable() {
                    continue;
                }
                for j in index.overlapping(&a.rect.inflated(1)) {
                    let b = &self.rects[j];
                    if j == i || !b.is_mergeable() || a.base_name() != b.base_name() {
                        continue;
                    }
                    if rects_adjacent(&a.rect, &b.rect) {
                        uf.union(i, j);
                    }
                }
            }
        }

        (0..self.rects.len()).map(|i| uf.find(i)).collect()
    }

    /// Group rooms touching on any floor into buildings, filling `Room::building`.
    fn merge_rooms(bounds: Rect, bucket_size: i32, rooms: &mut [Room]) -> Vec<Building> {
        let mut uf = UnionFind::new(rooms.len());
        let mut index = SpatialRectIndex::new(bounds, bucket_size);
        for (i, room) in rooms.iter().enumerate() {
            index.add(&room.bounds, i);
        }
        for (i, room) in rooms.iter().enumerate() {
            for j in index.overlapping(&room.bounds.inflated(1)) {
                if j <= i || uf.find(i) == uf.find(j) {
                    continue;
                }
                let touching = room
                    .rects
                    .iter()
                    .any(|a| rooms[j].rects.iter().any(|b| rects_touch(&a.rect, &b.rect)));
                if touching {
                    uf.union(i, j);
                }
            }
        }

        let mut building_ids: AHashMap<usize, usize> = AHashMap::new();
        let mut buildings: Vec<Building> = Vec::new();
        for (i, room) in rooms.iter_mut().enumerate() {
            let root = uf.find(i);
            let id = *building_ids.entry(root).or_insert_with(|| {
                buildings.push(Building { rooms: Vec::new(), bounds: room.bounds });
                buildings.len() - 1
            });
            let building = &mut buildings[id];
            building.rooms.push(i);
            building.bounds = building.bounds.united(&room.bounds);
            room.building = id;
        }
        buildings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rr(name: &str, level: i32, x: i32, y: i32, w: i32, h: i32) -> RoomRect {
        RoomRect::new(name, level, Rect::new(x, y, w, h), "test.json")
    }

    fn build(rects: Vec<RoomRect>) -> RoomGraph {
        let mut builder = RoomGraphBuilder::new(Rect::new(0, 0, 300, 300), 10);
        builder.extend(rects);
        builder.build()
    }

    #[test]
    fn test_kitchen_fragments_merge() {
        let graph = build(vec![
            rr("kitchen#1", 0, 0, 0, 5, 5),
            rr("kitchen#2", 0, 5, 0, 5, 5),
            rr("bath", 0, 0, 5, 5, 5),
        ]);
        assert_eq!(graph.rooms.len(), 2);
        assert_eq!(graph.rooms[0].name, "kitchen");
        assert_eq!(graph.rooms[0].rects.len(), 2);
        assert_eq!(graph.rooms[0].bounds, Rect::new(0, 0, 10, 5));
        assert_eq!(graph.rooms[1].name, "bath");
        assert_eq!(graph.rooms[1].rects.len(), 1);
        // different rooms, same house
        assert_eq!(graph.buildings.len(), 1);
        assert_eq!(graph.buildings[0].rooms, vec![0, 1]);
    }

    #[test]
    fn test_corner_touch_not_adjacent() {
        let a = Rect::new(0, 0, 5, 5);
        let b = Rect::new(5, 5, 5, 5);
        assert!(a.inflated(1).intersects(&b));
        assert!(!rects_adjacent(&a, &b));
        assert!(rects_adjacent(&a, &Rect::new(5, 2, 5, 5)));
        assert!(rects_adjacent(&a, &Rect::new(2, 5, 5, 5)));
        assert!(!rects_adjacent(&a, &Rect::new(6, 0, 5, 5)));

        let graph = build(vec![rr("hall#a", 0, 0, 0, 5, 5), rr("hall#b", 0, 5, 5, 5, 5)]);
        assert_eq!(graph.rooms.len(), 2);
    }

    #[test]
    fn test_unmarked_rects_never_merge() {
        let graph = build(vec![rr("hall", 0, 0, 0, 5, 5), rr("hall", 0, 5, 0, 5, 5)]);
        assert_eq!(graph.rooms.len(), 2);
        assert_eq!(graph.buildings.len(), 1);
    }

    #[test]
    fn test_fragments_on_other_floor_stay_apart() {
        let graph = build(vec![rr("hall#a", 0, 0, 0, 5, 5), rr("hall#b", 1, 5, 0, 5, 5)]);
        assert_eq!(graph.rooms.len(), 2);
    }

    #[test]
    fn test_transitive_merge_across_buckets() {
        let graph = build(vec![
            rr("corridor#1", 0, 0, 0, 12, 3),
            rr("corridor#3", 0, 24, 0, 12, 3),
            rr("corridor#2", 0, 12, 0, 12, 3),
        ]);
        assert_eq!(graph.rooms.len(), 1);
        assert_eq!(graph.rooms[0].bounds, Rect::new(0, 0, 36, 3));
    }

    #[test]
    fn test_building_crosses_floors() {
        let graph = build(vec![
            rr("living", 0, 20, 20, 8, 8),
            rr("bedroom", 1, 27, 20, 5, 5),
            rr("shed", 0, 100, 100, 4, 4),
        ]);
        assert_eq!(graph.rooms.len(), 3);
        assert_eq!(graph.buildings.len(), 2);
        assert_eq!(graph.rooms[0].building, graph.rooms[1].building);
        assert_ne!(graph.rooms[0].building, graph.rooms[2].building);
    }

    #[test]
    fn test_room_ids_follow_first_rect() {
        let graph = build(vec![
            rr("b#1", 0, 50, 50, 3, 3),
            rr("a", 0, 0, 0, 3, 3),
            rr("b#2", 0, 53, 50, 3, 3),
        ]);
        let names: Vec<_> = graph.rooms.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_discard_foreign_buildings() {
        let mut builder = RoomGraphBuilder::new(Rect::new(0, 0, 600, 300), 16);
        builder.extend(vec![
            rr("porch", 0, 250, 10, 10, 4),
            rr("house", 0, 10, 10, 10, 10),
            rr("barn", 0, 300, 40, 10, 10),
        ]);
        let mut graph = builder.build();
        assert_eq!(graph.buildings.len(), 3);

        let cell = Rect::new(0, 0, 256, 256);
        assert_eq!(graph.discard_foreign_buildings(&cell), 1);
        let names: Vec<_> = graph.rooms.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["porch", "house"]);
        assert_eq!(graph.buildings[1].rooms, vec![1]);
        assert_eq!(graph.stats.rooms, 2);
        assert_eq!(graph.stats.room_rects, 2);
        assert_eq!(graph.stats.discarded_buildings, 1);
    }

    #[test]
    fn test_boundary_building_written_once() {
        // a barn straddling the seam between cells 0 and 1
        let rects = vec![rr("barn#w", 0, 250, 40, 6, 10), rr("barn#e", 0, 256, 40, 6, 10)];
        let mut kept = 0;
        for cx in 0..2 {
            let mut builder = RoomGraphBuilder::new(Rect::new(0, 0, 512, 256), 16);
            builder.extend(rects.clone());
            let mut graph = builder.build();
            graph.discard_foreign_buildings(&Rect::new(cx * 256, 0, 256, 256));
            kept += graph.buildings.len();
        }
        assert_eq!(kept, 1);
    }

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(3, 4);
        uf.union(1, 4);
        assert_eq!(uf.find(0), uf.find(3));
        assert_ne!(uf.find(2), uf.find(0));
    }
}
