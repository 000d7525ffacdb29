use glam::Vec3;

fn triangle_normal(positions: &[[f32; 3]], triangle: [usize; 3]) -> Option<Vec3> {
    let pnt_0 = Vec3::from_array(*positions.get(triangle[0])?);
    let pnt_1 = Vec3::from_array(*positions.get(triangle[1])?);
    let pnt_2 = Vec3::from_array(*positions.get(triangle[2])?);
    // Unnormalized, so larger faces weigh more
    Some((pnt_1 - pnt_0).cross(pnt_2 - pnt_0))
}

/// Calculate smooth vertex normals for a triangle list.
///
/// Vertices that belong to no valid triangle get `+Y`.
pub fn calculate_normal(positions: &[[f32; 3]], indices: Option<&[u32]>) -> Vec<[f32; 3]> {
    let mut buffer = vec![Vec3::ZERO; positions.len()];
    let mut accumulate = |triangle: [usize; 3]| {
        if let Some(normal) = triangle_normal(positions, triangle) {
            triangle.iter().for_each(|index| buffer[*index] += normal);
        }
    };
    match indices {
        Some(indices) => indices.chunks_exact(3).for_each(|triangle| {
            accumulate([
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ])
        }),
        None => (0..positions.len() / 3)
            .for_each(|triangle| accumulate([triangle * 3, triangle * 3 + 1, triangle * 3 + 2])),
    }
    buffer
        .into_iter()
        .map(|normal| normal.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod test {
    use super::calculate_normal;

    #[test]
    fn flat_triangle_faces_up() {
        let positions = [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
        let normals = calculate_normal(&positions, None);
        for normal in normals {
            assert_eq!(normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn indexed_quad_shares_normals() {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let indices = [0, 1, 2, 0, 2, 3];
        let normals = calculate_normal(&positions, Some(&indices));
        assert_eq!(normals.len(), 4);
        for normal in normals {
            assert_eq!(normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn out_of_range_index_is_skipped() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let indices = [0, 1, 7];
        let normals = calculate_normal(&positions, Some(&indices));
        assert_eq!(normals, vec![[0.0, 1.0, 0.0]; 2]);
    }
}
