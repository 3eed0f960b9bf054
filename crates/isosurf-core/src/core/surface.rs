use nalgebra::{Point3, Vector3};

/// A single surface vertex with its unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceVertex {
    pub normal: Vector3<f64>,
    pub position: Point3<f64>,
}

impl SurfaceVertex {
    pub fn new(normal: Vector3<f64>, position: Point3<f64>) -> Self {
        Self { normal, position }
    }
}

/// An unindexed triangle list. Every three consecutive vertices form one triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Isosurface {
    vertices: Vec<SurfaceVertex>,
}

impl Isosurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_vertices(vertices: Vec<SurfaceVertex>) -> Self {
        debug_assert_eq!(vertices.len() % 3, 0);
        Self { vertices }
    }

    #[inline]
    pub fn vertices(&self) -> &[SurfaceVertex] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = &[SurfaceVertex; 3]> + '_ {
        self.vertices
            .chunks_exact(3)
            .filter_map(|chunk| <&[SurfaceVertex; 3]>::try_from(chunk).ok())
    }

    /// Flattens the surface into `(nx, ny, nz, x, y, z)` records, the layout expected by
    /// interleaved vertex buffers.
    pub fn interleaved(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|v| {
                [
                    v.normal.x as f32,
                    v.normal.y as f32,
                    v.normal.z as f32,
                    v.position.x as f32,
                    v.position.y as f32,
                    v.position.z as f32,
                ]
            })
            .collect()
    }
}

/// The two lobes of a signed field, extracted at `+isovalue` and `-isovalue`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceResult {
    pub positive: Option<Isosurface>,
    pub negative: Option<Isosurface>,
}

impl SurfaceResult {
    pub fn triangle_count(&self) -> usize {
        self.surfaces().map(|(_, s)| s.triangle_count()).sum()
    }

    /// Iterates over the produced surfaces together with a label for their sign.
    pub fn surfaces(&self) -> impl Iterator<Item = (&'static str, &Isosurface)> + '_ {
        [("positive", &self.positive), ("negative", &self.negative)]
            .into_iter()
            .filter_map(|(label, surface)| surface.as_ref().map(|s| (label, s)))
    }
}
