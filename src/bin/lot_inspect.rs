//! Print a summary of lotheader, lotpack or chunkdata files
//!
//! Run with: cargo run --bin lot-inspect -- lots/world_0_0.lotheader [lots/world_0_0.lotpack ...]

use std::path::PathBuf;

use clap::Parser;
use lotgen::codec::{decode_chunk_data, decode_lot_pack, BinaryReader, ChunkClass, ChunkRecord, LotHeader};
use lotgen::CellGeometry;

#[derive(Parser)]
#[command(name = "lot-inspect")]
#[command(about = "Decode lot files and print what they contain")]
struct Args {
    files: Vec<PathBuf>,

    #[arg(long, default_value = "256")]
    cell_size: i32,

    #[arg(long, default_value = "8")]
    chunk_size: i32,

    /// Level count of a lotpack without a lotheader next to it
    #[arg(long, default_value = "1")]
    levels: usize,

    /// Also list every room
    #[arg(long)]
    rooms: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let geometry = CellGeometry { cell_size: args.cell_size, chunk_size: args.chunk_size, ..CellGeometry::cell256() };
    geometry.validate()?;
    let chunks = (geometry.chunks_per_cell() * geometry.chunks_per_cell()) as usize;

    for path in &args.files {
        let data = std::fs::read(path)?;
        println!("{} ({} bytes)", path.display(), data.len());
        match path.extension().and_then(|e| e.to_str()) {
            Some("lotheader") => {
                let header = LotHeader::read(&mut BinaryReader::new(&data), chunks)?;
                println!("  version {}", header.version);
                println!("  {}x{} chunks, levels {}..={}", header.chunk_width, header.chunk_height, header.min_level, header.max_level);
                println!("  {} tiles, {} rooms, {} buildings", header.tile_names.len(), header.rooms.len(), header.buildings.len());
                let dense = header.zombie_density.iter().filter(|&&d| d > 0).count();
                println!("  zombie density: {} of {} chunks non-zero", dense, header.zombie_density.len());
                if args.rooms {
                    for (id, room) in header.rooms.iter().enumerate() {
                        println!(
                            "    [{}] {} level {}: {} rects, {} objects",
                            id,
                            room.name,
                            room.level,
                            room.rects.len(),
                            room.objects.len()
                        );
                    }
                }
            }
            Some("lotpack") => {
                let levels = match std::fs::read(path.with_extension("lotheader")) {
                    Ok(h) => {
                        let header = LotHeader::read(&mut BinaryReader::new(&h), chunks)?;
                        (header.max_level - header.min_level + 1) as usize
                    }
                    Err(_) => args.levels,
                };
                let pack = decode_lot_pack(&data, geometry.squares_per_chunk() * levels)?;
                let squares: usize = pack.chunks.iter().flatten().filter(|s| !s.is_empty()).count();
                let tiles: usize = pack.chunks.iter().flatten().map(|s| s.tiles.len()).sum();
                let empty_chunks = pack.chunks.iter().filter(|c| c.iter().all(|s| s.is_empty())).count();
                println!("  version {}, {} chunks ({} empty)", pack.version, pack.chunks.len(), empty_chunks);
                println!("  {} occupied squares, {} tiles", squares, tiles);
            }
            Some("bin") => {
                let (version, records) = decode_chunk_data(&data, chunks, geometry.squares_per_chunk())?;
                let mut counts = [0usize; 6];
                for record in &records {
                    let class = match record {
                        ChunkRecord::Uniform(class) => *class,
                        ChunkRecord::Regular(_) => ChunkClass::Regular,
                    };
                    counts[class as usize] += 1;
                }
                println!("  version {}, {} chunks", version, records.len());
                println!(
                    "  empty {} solid {} regular {} water {} room {} null {}",
                    counts[0], counts[1], counts[2], counts[3], counts[4], counts[5]
                );
            }
            _ => println!("  unknown file type"),
        }
    }
    Ok(())
}
