pub type Mat4 = nalgebra::Matrix4<f32>;
pub type Mat3 = nalgebra::Matrix3<f32>;

/// The bytes of a matrix in column-major order, the layout GLSL expects for
/// a `mat4` in a uniform block.
pub fn mat4_bytes(matrix: &Mat4) -> impl Iterator<Item = u8> + '_ {
    matrix.as_slice().iter().flat_map(|value| value.to_ne_bytes())
}

/// The bytes of a 3x3 matrix as a uniform block `mat3`: three columns,
/// each padded to four floats.
pub fn mat3_bytes(matrix: &Mat3) -> impl Iterator<Item = u8> + '_ {
    matrix.column_iter().flat_map(|column| {
        [column[0], column[1], column[2], 0.0]
            .into_iter()
            .flat_map(|value| value.to_ne_bytes())
    })
}
