use std::path::Path;

use image::RgbImage;
use tracing::info;

use crate::codec::{CellGeometry, CellPosition};
use crate::error::{Error, Result};

/// Zombie spawn density image. One pixel per legacy chunk; the red channel
/// is the density.
pub struct ZombieDensityMap {
    image: RgbImage,
}

impl ZombieDensityMap {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingDensityMap(path.to_path_buf()));
        }
        let image = image::open(path)
            .map_err(|e| Error::DensityMap { path: path.to_path_buf(), reason: e.to_string() })?
            .to_rgb8();
        info!(path = %path.display(), width = image.width(), height = image.height(), "loaded zombie density map");
        Ok(Self { image })
    }

    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Fail unless the image covers a world of `cells_wide x cells_high` source cells.
    pub fn check_covers(&self, geometry: &CellGeometry, cells_wide: i32, cells_high: i32) -> Result<()> {
        let per_cell = (geometry.source_cell_size / geometry.legacy_chunk_size) as u32;
        let need_width = cells_wide as u32 * per_cell;
        let need_height = cells_high as u32 * per_cell;
        if self.width() < need_width || self.height() < need_height {
            return Err(Error::DensityMapBounds {
                width: self.width(),
                height: self.height(),
                need_width,
                need_height,
            });
        }
        Ok(())
    }

    /// Density at a world square, sampled at legacy chunk resolution
    pub fn sample(&self, geometry: &CellGeometry, wx: i32, wy: i32) -> u8 {
        let px = wx.div_euclid(geometry.legacy_chunk_size);
        let py = wy.div_euclid(geometry.legacy_chunk_size);
        if px < 0 || py < 0 || px as u32 >= self.width() || py as u32 >= self.height() {
            return 0;
        }
        self.image.get_pixel(px as u32, py as u32).0[0]
    }

    /// One value per chunk of `cell`, x outer, y inner, taken at each chunk's top-left square.
    pub fn cell_densities(&self, geometry: &CellGeometry, cell: CellPosition) -> Vec<u8> {
        chunk_origins(geometry, cell)
            .map(|(wx, wy)| self.sample(geometry, wx, wy))
            .collect()
    }
}

/// World square at the top-left of every chunk of `cell`, x outer, y inner.
pub fn chunk_origins(geometry: &CellGeometry, cell: CellPosition) -> impl Iterator<Item = (i32, i32)> {
    let rect = geometry.cell_rect(cell);
    let n = geometry.chunks_per_cell();
    let size = geometry.chunk_size;
    (0..n).flat_map(move |cx| (0..n).map(move |cy| (rect.x + cx * size, rect.y + cy * size)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn map(width: u32, height: u32) -> ZombieDensityMap {
        let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 10 + y) as u8, 7, 7]));
        ZombieDensityMap::from_image(image)
    }

    #[test]
    fn test_samples_at_legacy_resolution() {
        let g = CellGeometry::cell256();
        let density = map(60, 60);
        assert_eq!(density.sample(&g, 0, 0), 0);
        assert_eq!(density.sample(&g, 19, 9), 10);
        assert_eq!(density.sample(&g, 256, 8), 250);
    }

    #[test]
    fn test_cell_densities_order() {
        let g = CellGeometry::cell256();
        let density = map(60, 60);
        let values = density.cell_densities(&g, CellPosition::new(0, 0));
        assert_eq!(values.len(), 32 * 32);
        // chunk (0,1) is the second value: world (0,8) -> pixel (0,0)
        assert_eq!(values[1], 0);
        // chunk (0,2): world (0,16) -> pixel (0,1)
        assert_eq!(values[2], 1);
        // chunk (2,0): world (16,0) -> pixel (1,0)
        assert_eq!(values[64], 10);
    }

    #[test]
    fn test_bounds_check() {
        let g = CellGeometry::cell256();
        let density = map(30, 60);
        assert!(density.check_covers(&g, 1, 2).is_ok());
        let err = density.check_covers(&g, 2, 2).unwrap_err();
        assert!(matches!(err, Error::DensityMapBounds { need_width: 60, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ZombieDensityMap::load(&dir.path().join("zombies.png")).err().unwrap();
        assert!(matches!(err, Error::MissingDensityMap(_)));
    }

    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zombies.png");
        RgbImage::from_pixel(30, 30, Rgb([200, 0, 0])).save(&path).unwrap();
        let density = ZombieDensityMap::load(&path).unwrap();
        assert_eq!(density.sample(&CellGeometry::cell256(), 100, 100), 200);
    }
}
