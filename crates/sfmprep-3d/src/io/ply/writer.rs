use std::io::{BufWriter, Write};
use std::path::Path;

use super::{PlyError, XYZRgbProperty};
use crate::pointcloud::PointCloud;

fn write_header<W: Write>(writer: &mut W, vertex_count: usize) -> Result<(), PlyError> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "element vertex {vertex_count}")?;
    for (data_type, name) in XYZRgbProperty::PROPERTIES {
        writeln!(writer, "property {data_type} {name}")?;
    }
    writeln!(writer, "end_header")?;
    Ok(())
}

/// Write a point cloud as binary little endian PLY into any writer.
///
/// Points without colors are written black.
///
/// # Arguments
///
/// * `writer` - The destination of the PLY data.
/// * `pointcloud` - The point cloud to serialize.
pub fn write_ply_binary_to<W: Write>(
    writer: &mut W,
    pointcloud: &PointCloud,
) -> Result<(), PlyError> {
    if let Some(colors) = pointcloud.colors() {
        if colors.len() != pointcloud.len() {
            return Err(PlyError::MismatchedColors(pointcloud.len(), colors.len()));
        }
    }

    write_header(writer, pointcloud.len())?;

    let config = bincode::config::standard();
    for (i, point) in pointcloud.points().iter().enumerate() {
        let color = pointcloud.colors().map_or([0, 0, 0], |colors| colors[i]);
        bincode::encode_into_std_write(XYZRgbProperty::new(point, &color), writer, config)?;
    }

    Ok(())
}

/// Write a point cloud to a binary little endian PLY file.
///
/// # Arguments
///
/// * `path` - The path of the PLY file to create. Overwritten if it exists.
/// * `pointcloud` - The point cloud to serialize.
pub fn write_ply_binary(path: impl AsRef<Path>, pointcloud: &PointCloud) -> Result<(), PlyError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_ply_binary_to(&mut writer, pointcloud)?;
    writer.flush()?;
    Ok(())
}
