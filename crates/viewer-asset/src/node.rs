use glam::{Mat4, Quat, Vec3};

use super::mesh::MeshAsset;

#[derive(Debug, Clone)]
pub struct MatrixNodeTransform(pub Mat4);

#[derive(Debug, Clone)]
pub struct DecomposedTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeTransform {
    Matrix(MatrixNodeTransform),
    Decomposed(DecomposedTransform),
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::Decomposed(DecomposedTransform::default())
    }
}

impl From<&DecomposedTransform> for Mat4 {
    fn from(value: &DecomposedTransform) -> Self {
        Mat4::from_scale_rotation_translation(value.scale, value.rotation, value.translation)
    }
}

impl From<&NodeTransform> for Mat4 {
    fn from(value: &NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => matrix.0,
            NodeTransform::Decomposed(decomposed) => decomposed.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeAsset {
    /// Index of the node in the source document.
    pub index: usize,
    pub name: Option<String>,
    pub transform: NodeTransform,
    pub mesh: Option<MeshAsset>,
    pub children: Vec<NodeAsset>,
}

impl NodeAsset {
    pub fn matrix(&self) -> Mat4 {
        (&self.transform).into()
    }
}

#[cfg(test)]
mod test {
    use glam::{Mat4, Quat, Vec3};

    use super::{DecomposedTransform, MatrixNodeTransform, NodeTransform};

    #[test]
    fn decomposed_transform_applies_scale_first() {
        let transform = NodeTransform::Decomposed(DecomposedTransform {
            translation: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(2.0),
        });
        let matrix: Mat4 = (&transform).into();
        let point = matrix.transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(point, Vec3::new(3.0, 2.0, 2.0));
    }

    #[test]
    fn matrix_transform_is_used_verbatim() {
        let source = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let transform = NodeTransform::Matrix(MatrixNodeTransform(source));
        let matrix: Mat4 = (&transform).into();
        assert_eq!(matrix, source);
    }
}
