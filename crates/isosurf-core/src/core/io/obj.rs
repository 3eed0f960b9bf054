use crate::core::surface::Isosurface;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes a surface as a Wavefront OBJ mesh with per-vertex normals.
///
/// The triangle list is unindexed, so vertex `n` and normal `n` are emitted for every
/// surface vertex and each face references them pairwise (`f a//a b//b c//c`).
pub fn write_obj(surface: &Isosurface, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "# isosurf surface")?;
    writeln!(writer, "# {} triangles", surface.triangle_count())?;

    for vertex in surface.vertices() {
        let p = &vertex.position;
        writeln!(writer, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }
    for vertex in surface.vertices() {
        let n = &vertex.normal;
        writeln!(writer, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
    }
    for t in 0..surface.triangle_count() {
        let (a, b, c) = (3 * t + 1, 3 * t + 2, 3 * t + 3);
        writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    Ok(())
}

pub fn write_obj_to_path<P: AsRef<Path>>(surface: &Isosurface, path: P) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_obj(surface, &mut writer)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::surface::SurfaceVertex;
    use nalgebra::{Point3, Vector3};

    fn two_triangles() -> Isosurface {
        let vertices = (0..6)
            .map(|i| SurfaceVertex::new(Vector3::x(), Point3::new(i as f64, 0.5, -1.0)))
            .collect();
        Isosurface::from_vertices(vertices)
    }

    #[test]
    fn writes_vertices_normals_and_faces() {
        let mut buffer = Vec::new();
        write_obj(&two_triangles(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 6);
        assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 6);
        assert!(text.contains("v 5.000000 0.500000 -1.000000\n"));
        assert!(text.contains("vn 1.000000 0.000000 0.000000\n"));
        assert!(text.contains("f 1//1 2//2 3//3\nf 4//4 5//5 6//6\n"));
    }

    #[test]
    fn empty_surface_writes_only_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.obj");
        write_obj_to_path(&Isosurface::new(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "# isosurf surface\n# 0 triangles\n");
    }
}
