use std::path::{Path, PathBuf};

use ahash::AHashSet;
use tracing::{debug, error, info, warn};

use super::combined::CombinedCellMaps;
use super::compositor::{stamp_rooms, GridCompositor};
use super::density::ZombieDensityMap;
use super::features::MapFeatures;
use super::jumbo::JumboTreeDensifier;
use super::lot_files::{build_lot_header, build_lot_pack, header_file_name, pack_file_name, HeaderInputs};
use crate::codec::{CellPosition, Rect};
use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::navigation::ChunkDataFile256;
use crate::rooms::RoomGraphBuilder;
use crate::tiles::{TileDefinitions, TileIndex, TileMetadata};
use crate::world::{JsonMapLoader, MapLoader, WorldCell, WorldSpec};

/// Counts for one cell, or summed over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub cells: usize,
    pub room_rects: usize,
    pub rooms: usize,
    pub buildings: usize,
    pub discarded_buildings: usize,
    pub used_tiles: usize,
    pub missing_tiles: usize,
    pub jumbo_trees: usize,
}

impl std::ops::AddAssign for GenerationStats {
    fn add_assign(&mut self, o: Self) {
        self.cells += o.cells;
        self.room_rects += o.room_rects;
        self.rooms += o.rooms;
        self.buildings += o.buildings;
        self.discarded_buildings += o.discarded_buildings;
        self.used_tiles += o.used_tiles;
        self.missing_tiles += o.missing_tiles;
        self.jumbo_trees += o.jumbo_trees;
    }
}

/// Outcome of a batch run. Failed cells are listed; the rest were written.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub written: Vec<CellPosition>,
    pub failures: Vec<(CellPosition, String)>,
    /// Set when a configuration error stopped the run
    pub aborted: Option<String>,
    pub stats: GenerationStats,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }
}

/// Encoded files of one cell, written together once all of them exist.
pub struct CellFiles {
    pub cell: CellPosition,
    pub files: Vec<(String, Vec<u8>)>,
    pub stats: GenerationStats,
}

/// Drives lot generation: one output cell at a time, each generated at most once per run.
pub struct LotFilesManager {
    config: GenerationConfig,
    world: WorldSpec,
    loader: Box<dyn MapLoader>,
    meta: Box<dyn TileMetadata>,
    density: Option<ZombieDensityMap>,
    tiles: TileIndex,
    done: AHashSet<CellPosition>,
    /// Source cells whose maps the loader may still hold
    resident: AHashSet<(i32, i32)>,
}

impl LotFilesManager {
    pub fn new(
        config: GenerationConfig,
        world: WorldSpec,
        loader: Box<dyn MapLoader>,
        meta: Box<dyn TileMetadata>,
        density: Option<ZombieDensityMap>,
    ) -> Self {
        Self {
            config,
            world,
            loader,
            meta,
            density,
            tiles: TileIndex::new(),
            done: AHashSet::new(),
            resident: AHashSet::new(),
        }
    }

    /// Load everything a run needs from disk. Errors here are configuration errors.
    pub fn open(config: GenerationConfig, world_path: &Path) -> Result<Self> {
        config.validate()?;
        let world = WorldSpec::load(world_path)
            .map_err(|e| Error::Config(format!("world {}: {}", world_path.display(), e)))?;
        let meta = TileDefinitions::load_dir(&config.tiles_dir)?;
        let density = match &config.density_map {
            Some(path) => {
                let map = ZombieDensityMap::load(path)?;
                map.check_covers(&config.geometry, world.width, world.height)?;
                Some(map)
            }
            None => None,
        };
        let maps_root = config.maps_dir.clone().unwrap_or_else(|| {
            world_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
        });
        info!(
            world = %world_path.display(),
            cells = world.cells.len(),
            tiles = meta.len(),
            maps = %maps_root.display(),
            "opened world"
        );
        Ok(Self::new(config, world, Box::new(JsonMapLoader::new(maps_root)), Box::new(meta), density))
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn is_done(&self, cell: CellPosition) -> bool {
        self.done.contains(&cell)
    }

    /// Every output cell touched by a source cell with a map
    pub fn generate_world(&mut self) -> GenerationReport {
        let sources: Vec<(i32, i32)> = self.world.cells_with_maps().map(|c| (c.x, c.y)).collect();
        self.generate_sources(&sources)
    }

    /// Output cells overlapping the given source cells, skipping cells already done.
    /// Maps are released once no pending cell of the remaining sources reads them.
    pub fn generate_sources(&mut self, sources: &[(i32, i32)]) -> GenerationReport {
        let mut report = GenerationReport::default();
        for (i, &(sx, sy)) in sources.iter().enumerate() {
            let (lo, hi) = self.config.geometry.cells_for_source(sx, sy);
            for cy in lo.y..=hi.y {
                for cx in lo.x..=hi.x {
                    let cell = CellPosition::new(cx, cy);
                    if !self.done.insert(cell) {
                        continue;
                    }
                    match self.generate_cell(cell) {
                        Ok(stats) => {
                            report.written.push(cell);
                            report.stats += stats;
                        }
                        Err(e) if e.is_fatal() => {
                            error!(cell = %cell, error = %e, "aborting run");
                            report.aborted = Some(e.to_string());
                            return report;
                        }
                        Err(e) => {
                            warn!(cell = %cell, error = %e, "cell failed");
                            report.failures.push((cell, e.to_string()));
                        }
                    }
                }
            }
            self.release_maps(&sources[i + 1..]);
        }
        info!(
            written = report.written.len(),
            failed = report.failures.len(),
            rooms = report.stats.rooms,
            buildings = report.stats.buildings,
            "generation finished"
        );
        report
    }

    /// Evict maps of resident source cells that no pending output cell of
    /// `remaining` reads. Returns the number of maps evicted.
    pub fn release_maps(&mut self, remaining: &[(i32, i32)]) -> usize {
        let geometry = self.config.geometry;
        let margin = self.config.building_margin;
        let mut needed: AHashSet<(i32, i32)> = AHashSet::new();
        for &(sx, sy) in remaining {
            let (lo, hi) = geometry.cells_for_source(sx, sy);
            for cy in lo.y..=hi.y {
                for cx in lo.x..=hi.x {
                    let cell = CellPosition::new(cx, cy);
                    if self.done.contains(&cell) {
                        continue;
                    }
                    let ((x0, y0), (x1, y1)) = CombinedCellMaps::source_range(&geometry, cell, margin);
                    for y in y0..=y1 {
                        for x in x0..=x1 {
                            needed.insert((x, y));
                        }
                    }
                }
            }
        }

        let released: Vec<(i32, i32)> = self.resident.iter().copied().filter(|s| !needed.contains(s)).collect();
        if released.is_empty() {
            return 0;
        }
        // lots are often shared between source cells
        let needed_paths: AHashSet<&Path> = needed
            .iter()
            .filter_map(|&(x, y)| self.world.cell(x, y))
            .flat_map(source_paths)
            .collect();
        let mut evicted = 0;
        for s in &released {
            self.resident.remove(s);
            let Some(source) = self.world.cell(s.0, s.1) else { continue };
            for path in source_paths(source) {
                if !needed_paths.contains(path) && self.loader.evict(path) {
                    evicted += 1;
                }
            }
        }
        debug!(sources = released.len(), maps = evicted, resident = self.resident.len(), "released maps");
        evicted
    }

    /// Build and write one cell's files. Nothing is left on disk if writing fails.
    pub fn generate_cell(&mut self, cell: CellPosition) -> Result<GenerationStats> {
        info!(cell = %cell, "generating cell");
        let files = self.build_cell(cell)?;
        self.write_cell(&files)?;
        self.done.insert(cell);
        debug!(cell = %cell, files = files.files.len(), "cell written");
        Ok(files.stats)
    }

    /// Run the whole pipeline for `cell` in memory.
    pub fn build_cell(&mut self, cell: CellPosition) -> Result<CellFiles> {
        let geometry = self.config.geometry;
        let margin = self.config.building_margin;
        let ((x0, y0), (x1, y1)) = CombinedCellMaps::source_range(&geometry, cell, margin);
        for sy in y0..=y1 {
            for sx in x0..=x1 {
                if self.world.cell(sx, sy).is_some() {
                    self.resident.insert((sx, sy));
                }
            }
        }
        let combined = CombinedCellMaps::load(&self.world, self.loader.as_mut(), geometry, cell, margin)?;
        let cell_rect = combined.cell_rect();

        self.tiles.clear();
        for ts in combined.composite().tilesets() {
            self.tiles.assign_first_gid(ts, self.meta.as_ref())?;
        }
        let jumbo_gid = self.tiles.register_image(
            &self.config.jumbo_tileset,
            self.config.jumbo_tile_count,
            self.meta.as_ref(),
        );

        let mut builder = RoomGraphBuilder::new(combined.combined_rect(), self.config.room_bucket_size);
        builder.extend(combined.room_rects().iter().cloned());
        let mut graph = builder.build();
        let discarded = graph.discard_foreign_buildings(&cell_rect);
        if discarded > 0 {
            debug!(cell = %cell, discarded, "buildings left to neighbouring cells");
        }

        let (mut grid, composite_stats) = GridCompositor::new(&combined).fill(&mut self.tiles);
        stamp_rooms(&mut grid, &graph);

        let seed = self.config.seed.map(|s| cell_seed(s, cell));
        let jumbo = JumboTreeDensifier::new(&self.config.jumbo_zones, jumbo_gid, self.config.jumbo_tile_count, seed)
            .apply(&mut grid, &mut self.tiles, combined.objects(), cell_rect);

        let header = build_lot_header(&HeaderInputs {
            version: self.config.lotheader_version,
            geometry: &geometry,
            combined: &combined,
            grid: &grid,
            tiles: &self.tiles,
            graph: &graph,
            meta: self.meta.as_ref(),
            density: self.density.as_ref(),
        });
        let mut files = vec![
            (header_file_name(cell), header.to_bytes()),
            (pack_file_name(cell), build_lot_pack(self.config.lotpack_version, &geometry, cell, &grid, &self.tiles)),
        ];
        if self.config.write_chunk_data {
            let data = ChunkDataFile256::build(&grid, &self.tiles, &geometry, cell, self.config.chunkdata_version);
            files.push((ChunkDataFile256::file_name(cell), data.to_bytes()));
        }
        if self.config.write_map_features {
            let features = MapFeatures::trace(&grid, &self.tiles, cell, cell_rect);
            files.push((MapFeatures::file_name(cell), features.to_json()?));
        }

        let stats = GenerationStats {
            cells: 1,
            room_rects: graph.stats.room_rects,
            rooms: graph.stats.rooms,
            buildings: graph.stats.buildings,
            discarded_buildings: graph.stats.discarded_buildings,
            used_tiles: self.tiles.used_count(),
            missing_tiles: composite_stats.missing_tiles,
            jumbo_trees: jumbo.promoted,
        };
        info!(
            cell = %cell,
            rooms = stats.rooms,
            buildings = stats.buildings,
            tiles = stats.used_tiles,
            jumbo = stats.jumbo_trees,
            "built cell"
        );
        Ok(CellFiles { cell, files, stats })
    }

    fn write_cell(&self, files: &CellFiles) -> Result<()> {
        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir)?;
        let mut written: Vec<PathBuf> = Vec::new();
        for (name, data) in &files.files {
            let path = dir.join(name);
            if let Err(e) = std::fs::write(&path, data) {
                written.push(path);
                for p in &written {
                    let _ = std::fs::remove_file(p);
                }
                warn!(cell = %files.cell, error = %e, "discarded partial output");
                return Err(e.into());
            }
            written.push(path);
        }
        Ok(())
    }

    /// World squares covered by the world, used to bound region requests
    pub fn world_rect(&self) -> Rect {
        let s = self.config.geometry.source_cell_size;
        Rect::new(0, 0, self.world.width * s, self.world.height * s)
    }
}

/// Map and lot paths of one source cell
fn source_paths(cell: &WorldCell) -> impl Iterator<Item = &Path> {
    cell.map.iter().map(PathBuf::as_path).chain(cell.lots.iter().map(|l| l.map.as_path()))
}

/// Per-cell seed, so a cell's layout doesn't depend on generation order.
fn cell_seed(seed: u64, cell: CellPosition) -> u64 {
    seed ^ ((cell.x as u32 as u64) << 32 | cell.y as u32 as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}
