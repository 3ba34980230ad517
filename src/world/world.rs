use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::Rect;
use crate::error::{Error, Result};

/// A sub-map placed inside a source cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldLot {
    pub map: PathBuf,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub level: i32,
}

/// A typed world object, e.g. a `Forest` zone, in cell-local coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObject {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl WorldObject {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// One authored source cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldCell {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub map: Option<PathBuf>,
    #[serde(default)]
    pub lots: Vec<WorldLot>,
    #[serde(default)]
    pub objects: Vec<WorldObject>,
}

/// World description: its size in source cells and the content of each cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSpec {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub cells: Vec<WorldCell>,
}

impl WorldSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let world: WorldSpec = serde_json::from_str(&data)?;
        world.validate()?;
        Ok(world)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(Error::Config(format!("world size {}x{}", self.width, self.height)));
        }
        for cell in &self.cells {
            if !self.contains(cell.x, cell.y) {
                return Err(Error::Config(format!(
                    "cell {},{} outside {}x{} world",
                    cell.x, cell.y, self.width, self.height
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&WorldCell> {
        self.cells.iter().find(|c| c.x == x && c.y == y)
    }

    /// Source cells that have a map, in authoring order
    pub fn cells_with_maps(&self) -> impl Iterator<Item = &WorldCell> {
        self.cells.iter().filter(|c| c.map.is_some())
    }
}
