use crate::procgen::World;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Writes `terrain.obj`, `road.obj` and `trees.json` into `out_dir`,
/// creating it if needed. Returns the written paths.
pub fn export_world(world: &World, out_dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(out_dir)?;

    let terrain_path = out_dir.join("terrain.obj");
    fs::write(&terrain_path, world.terrain_mesh.export_obj("terrain"))?;

    let road_path = out_dir.join("road.obj");
    fs::write(&road_path, world.road.mesh.mesh.export_obj("road"))?;

    let trees_path = out_dir.join("trees.json");
    fs::write(&trees_path, serde_json::to_string_pretty(&world.trees)?)?;

    info!("Exported world to {}", out_dir.display());

    Ok(vec![terrain_path, road_path, trees_path])
}
