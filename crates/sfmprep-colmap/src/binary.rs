use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use bincode::{config, Decode};

use crate::error::ColmapError;
use crate::types::{CameraModelId, ColmapCamera, ColmapImage, ColmapPoint3d};

// Guards against allocating from corrupt counts.
const MAX_ELEMENTS: u64 = 1 << 32;

#[derive(Debug, Decode)]
struct CameraRecord {
    camera_id: u32,
    model_id: i32,
    width: u64,
    height: u64,
}

#[derive(Debug, Decode)]
struct ImageRecord {
    image_id: u32,
    rotation: [f64; 4],
    translation: [f64; 3],
    camera_id: u32,
}

#[derive(Debug, Decode)]
struct Point2dRecord {
    x: f64,
    y: f64,
    point3d_id: i64,
}

#[derive(Debug, Decode)]
struct Point3dRecord {
    point3d_id: u64,
    xyz: [f64; 3],
    rgb: [u8; 3],
    error: f64,
}

#[derive(Debug, Decode)]
struct TrackRecord {
    image_id: u32,
    point2d_idx: u32,
}

/// Decode one fixed size little endian record.
fn decode<T: Decode<()>>(reader: &mut impl Read) -> Result<T, ColmapError> {
    let config = config::standard()
        .with_little_endian()
        .with_fixed_int_encoding();
    Ok(bincode::decode_from_std_read(reader, config)?)
}

fn decode_count(reader: &mut impl Read) -> Result<usize, ColmapError> {
    let n: u64 = decode(reader)?;
    if n > MAX_ELEMENTS {
        return Err(ColmapError::ParseError(format!(
            "Element count too large: {n}"
        )));
    }
    Ok(n as usize)
}

/// Read a null terminated string.
fn read_c_string(reader: &mut impl Read) -> Result<String, ColmapError> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte)?;
        match byte[0] {
            0 => break,
            b => bytes.push(b),
        }
    }
    String::from_utf8(bytes).map_err(|e| ColmapError::ParseError(e.to_string()))
}

fn open(path: impl AsRef<Path>) -> Result<BufReader<File>, ColmapError> {
    Ok(BufReader::new(File::open(path)?))
}

/// Read the cameras.bin file and return a vector of ColmapCamera structs.
///
/// # Arguments
///
/// * `path` - The path to the cameras.bin file.
pub fn read_cameras_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapCamera>, ColmapError> {
    let mut reader = open(path)?;
    let num_cameras = decode_count(&mut reader)?;

    let mut cameras = Vec::with_capacity(num_cameras);
    for _ in 0..num_cameras {
        let record: CameraRecord = decode(&mut reader)?;
        let model_id = CameraModelId::from_id(record.model_id)?;
        let params = (0..model_id.num_params())
            .map(|_| decode::<f64>(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;

        cameras.push(ColmapCamera {
            camera_id: record.camera_id,
            model_id,
            width: record.width as usize,
            height: record.height as usize,
            params,
        });
    }

    Ok(cameras)
}

/// Read the images.bin file and return a vector of ColmapImage structs.
///
/// # Arguments
///
/// * `path` - The path to the images.bin file.
pub fn read_images_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapImage>, ColmapError> {
    let mut reader = open(path)?;
    let num_images = decode_count(&mut reader)?;

    let mut images = Vec::with_capacity(num_images);
    for _ in 0..num_images {
        let record: ImageRecord = decode(&mut reader)?;
        let name = read_c_string(&mut reader)?;

        let num_points2d = decode_count(&mut reader)?;
        let mut points2d = Vec::with_capacity(num_points2d);
        for _ in 0..num_points2d {
            let point: Point2dRecord = decode(&mut reader)?;
            points2d.push((point.x, point.y, point.point3d_id));
        }

        images.push(ColmapImage {
            name,
            image_id: record.image_id,
            camera_id: record.camera_id,
            rotation: record.rotation,
            translation: record.translation,
            points2d,
        });
    }

    Ok(images)
}

/// Read the points3D.bin file and return a vector of ColmapPoint3d structs.
///
/// # Arguments
///
/// * `path` - The path to the points3D.bin file.
pub fn read_points3d_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapPoint3d>, ColmapError> {
    let mut reader = open(path)?;
    let num_points = decode_count(&mut reader)?;

    let mut points = Vec::with_capacity(num_points);
    for _ in 0..num_points {
        let record: Point3dRecord = decode(&mut reader)?;

        let track_length = decode_count(&mut reader)?;
        let mut track = Vec::with_capacity(track_length);
        for _ in 0..track_length {
            let entry: TrackRecord = decode(&mut reader)?;
            track.push((entry.image_id, entry.point2d_idx));
        }

        points.push(ColmapPoint3d {
            point3d_id: record.point3d_id,
            xyz: record.xyz,
            rgb: record.rgb,
            error: record.error,
            track,
        });
    }

    Ok(points)
}


#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;

    #[test]
    fn test_read_cameras_bin() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("cameras.bin");
        let camera = ColmapCamera {
            camera_id: 3,
            model_id: CameraModelId::SimpleRadial,
            width: 1920,
            height: 1080,
            params: vec![1000.0, 960.0, 540.0, -0.05],
        };
        write_cameras_bin(&path, std::slice::from_ref(&camera))?;

        let cameras = read_cameras_bin(&path)?;
        assert_eq!(cameras, vec![camera]);
        Ok(())
    }

    #[test]
    fn test_read_images_bin() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("images.bin");
        let image = ColmapImage {
            name: "frame_0001.png".to_string(),
            image_id: 1,
            camera_id: 1,
            rotation: [1.0, 0.0, 0.0, 0.0],
            translation: [0.1, 0.2, 0.3],
            points2d: vec![(1.0, 2.0, -1), (3.0, 4.0, 12)],
        };
        write_images_bin(&path, std::slice::from_ref(&image))?;

        let images = read_images_bin(&path)?;
        assert_eq!(images, vec![image]);
        Ok(())
    }

    #[test]
    fn test_read_points3d_bin() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("points3D.bin");
        let point = ColmapPoint3d {
            point3d_id: 12,
            xyz: [0.5, -1.0, 4.0],
            rgb: [10, 20, 30],
            error: 0.75,
            track: vec![(1, 1), (2, 0)],
        };
        write_points3d_bin(&path, std::slice::from_ref(&point))?;

        let points = read_points3d_bin(&path)?;
        assert_eq!(points, vec![point]);
        Ok(())
    }

    #[test]
    fn test_truncated_file() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("points3D.bin");
        std::fs::write(&path, 5u64.to_le_bytes())?;
        assert!(matches!(
            read_points3d_bin(&path),
            Err(ColmapError::DecodeError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_corrupt_count() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("images.bin");
        std::fs::write(&path, u64::MAX.to_le_bytes())?;
        assert!(matches!(
            read_images_bin(&path),
            Err(ColmapError::ParseError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_model_id() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("cameras.bin");
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&42i32.to_le_bytes());
        bytes.extend_from_slice(&640u64.to_le_bytes());
        bytes.extend_from_slice(&480u64.to_le_bytes());
        std::fs::write(&path, bytes)?;
        assert!(matches!(
            read_cameras_bin(&path),
            Err(ColmapError::ParseError(_))
        ));
        Ok(())
    }
}
