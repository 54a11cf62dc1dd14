/// Vertex layout written by the exporter: position as `float` and color as `uchar`.
///
/// Matches the layout COLMAP uses when exporting a sparse model to PLY.
#[derive(Debug, Clone, Copy, PartialEq, bincode::Encode)]
pub struct XYZRgbProperty {
    /// x coordinate
    pub x: f32,
    /// y coordinate
    pub y: f32,
    /// z coordinate
    pub z: f32,
    /// red channel
    pub red: u8,
    /// green channel
    pub green: u8,
    /// blue channel
    pub blue: u8,
}

impl XYZRgbProperty {
    /// The PLY property declarations of this vertex, in order.
    pub const PROPERTIES: [(&'static str, &'static str); 6] = [
        ("float", "x"),
        ("float", "y"),
        ("float", "z"),
        ("uchar", "red"),
        ("uchar", "green"),
        ("uchar", "blue"),
    ];

    /// Size in bytes of a serialized vertex.
    pub const SIZE: usize = 3 * 4 + 3;

    /// Create a vertex from a double precision point and a color.
    pub fn new(point: &[f64; 3], color: &[u8; 3]) -> Self {
        Self {
            x: point[0] as f32,
            y: point[1] as f32,
            z: point[2] as f32,
            red: color[0],
            green: color[1],
            blue: color[2],
        }
    }
}
