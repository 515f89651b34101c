// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;
use std::path::Path;

use ndarray::Array2;

use crate::error::{FmmError, Result};
use crate::mesh::Mesh;

/// Supported file formats for nodal scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// NumPy .npy format, shaped `[height + 1, width + 1]`.
    Npy,
    /// Whitespace separated `x y value` rows (write only).
    Txt,
}

/// Infer the file format from a path's extension.
pub fn infer_format(path: &Path) -> Result<FileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "npy" => Ok(FileFormat::Npy),
        "txt" => Ok(FileFormat::Txt),
        _ => Err(FmmError::UnsupportedFileFormat(ext)),
    }
}

/// The array shape of a nodal field on `mesh`: rows are y, columns are x.
pub fn field_shape(mesh: &Mesh) -> [usize; 2] {
    [mesh.height() + 1, mesh.width() + 1]
}

/// Load a nodal field from a .npy file.
pub fn load_npy_field(path: &Path, mesh: &Mesh) -> Result<Vec<f64>> {
    // Try f64 first
    let arr: Array2<f64> = match ndarray_npy::read_npy(path) {
        Ok(a) => a,
        Err(_) => {
            // Try f32 and promote
            let arr32: Array2<f32> = ndarray_npy::read_npy(path)
                .map_err(|e| FmmError::UnsupportedDtype(format!("{}", e)))?;
            arr32.mapv(|v| v as f64)
        }
    };

    let expected = field_shape(mesh);
    if arr.shape() != expected {
        return Err(FmmError::ShapeMismatch {
            expected: expected.to_vec(),
            got: arr.shape().to_vec(),
        });
    }

    // Row-major order matches node numbering; Fortran-order files are relaid.
    Ok(arr.as_standard_layout().iter().copied().collect())
}

/// Save a nodal field to a .npy file.
pub fn save_npy_field(mesh: &Mesh, field: &[f64], path: &Path) -> Result<()> {
    check_field(mesh, field)?;
    let arr = Array2::from_shape_vec(field_shape(mesh), field.to_vec())
        .map_err(|e| FmmError::Other(format!("shape error: {}", e)))?;
    ndarray_npy::write_npy(path, &arr)
        .map_err(|e| FmmError::Other(format!("npy write error: {}", e)))?;
    Ok(())
}

/// Save a nodal field as `x y value` text rows, one per node.
pub fn save_txt_field(mesh: &Mesh, field: &[f64], path: &Path) -> Result<()> {
    check_field(mesh, field)?;
    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);
    for (node, value) in mesh.nodes.iter().zip(field) {
        writeln!(w, "{} {} {:.10e}", node.coord.x, node.coord.y, value)?;
    }
    w.flush()?;
    Ok(())
}

fn check_field(mesh: &Mesh, field: &[f64]) -> Result<()> {
    if field.len() != mesh.n_nodes() {
        return Err(FmmError::FieldLengthMismatch {
            expected: mesh.n_nodes(),
            got: field.len(),
        });
    }
    Ok(())
}

/// Save a nodal field, inferring format from the extension.
pub fn save_field(mesh: &Mesh, field: &[f64], path: &Path) -> Result<()> {
    match infer_format(path)? {
        FileFormat::Npy => save_npy_field(mesh, field, path),
        FileFormat::Txt => save_txt_field(mesh, field, path),
    }
}

/// Load a nodal field, inferring format from the extension.
pub fn load_field(path: &Path, mesh: &Mesh) -> Result<Vec<f64>> {
    match infer_format(path)? {
        FileFormat::Npy => load_npy_field(path, mesh),
        FileFormat::Txt => Err(FmmError::UnsupportedFileFormat(
            "txt (write only)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_field(mesh: &Mesh) -> Vec<f64> {
        mesh.nodes
            .iter()
            .map(|n| n.coord.x * 10.0 + n.coord.y)
            .collect()
    }

    #[test]
    fn npy_roundtrip() {
        let mesh = Mesh::new(4, 3).unwrap();
        let field = make_test_field(&mesh);
        let tmp = std::env::temp_dir().join("eikonal_fmm_test_roundtrip.npy");
        save_field(&mesh, &field, &tmp).unwrap();

        let loaded = load_field(&tmp, &mesh).unwrap();
        assert_eq!(loaded, field);
        // Row y, column x.
        assert_eq!(loaded[mesh.xy_to_index(3, 2)], 32.0);
        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn npy_shape_mismatch() {
        let mesh = Mesh::new(4, 3).unwrap();
        let field = make_test_field(&mesh);
        let tmp = std::env::temp_dir().join("eikonal_fmm_test_shape_mismatch.npy");
        save_field(&mesh, &field, &tmp).unwrap();

        let other = Mesh::new(3, 4).unwrap();
        let result = load_field(&tmp, &other);
        assert!(matches!(result, Err(FmmError::ShapeMismatch { .. })));
        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn txt_rows() {
        let mesh = Mesh::new(2, 1).unwrap();
        let field = make_test_field(&mesh);
        let tmp = std::env::temp_dir().join("eikonal_fmm_test_rows.txt");
        save_field(&mesh, &field, &tmp).unwrap();

        let text = std::fs::read_to_string(&tmp).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), mesh.n_nodes());
        assert!(lines[1].starts_with("1 0 "));
        let value: f64 = lines[4].split_whitespace().nth(2).unwrap().parse().unwrap();
        assert_eq!(value, 11.0);
        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn field_length_checked_on_save() {
        let mesh = Mesh::new(2, 2).unwrap();
        let tmp = std::env::temp_dir().join("eikonal_fmm_test_short.npy");
        let result = save_field(&mesh, &[1.0, 2.0], &tmp);
        assert!(matches!(result, Err(FmmError::FieldLengthMismatch { .. })));
    }

    #[test]
    fn unsupported_format() {
        let mesh = Mesh::new(2, 2).unwrap();
        let field = vec![0.0; mesh.n_nodes()];
        let result = save_field(&mesh, &field, Path::new("out.vtk"));
        assert!(matches!(result, Err(FmmError::UnsupportedFileFormat(_))));
        let result = load_field(Path::new("in.txt"), &mesh);
        assert!(matches!(result, Err(FmmError::UnsupportedFileFormat(_))));
    }
}
