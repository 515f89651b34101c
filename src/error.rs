// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

/// Errors that can occur during mesh construction, field I/O, or a march.
#[derive(Debug)]
pub enum FmmError {
    /// Mesh dimension is invalid (zero elements along an axis).
    InvalidMeshShape {
        /// The axis index (0 = x, 1 = y).
        axis: usize,
        /// The number of elements requested.
        size: usize,
    },
    /// A coordinate lies outside the mesh domain.
    OutsideDomain {
        /// The x coordinate.
        x: f64,
        /// The y coordinate.
        y: f64,
    },
    /// A scalar field does not have one entry per mesh node.
    FieldLengthMismatch {
        /// The number of mesh nodes.
        expected: usize,
        /// The length of the field provided.
        got: usize,
    },
    /// No zero crossing was found anywhere in the distance field.
    DegenerateFront,
    /// A frozen node had no valid neighbour data to build a velocity from.
    InconsistentVelocityData {
        /// The node whose velocity could not be computed.
        node: usize,
    },
    /// Array shape does not match expected shape.
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape encountered.
        got: Vec<usize>,
    },
    /// Unsupported data type in file.
    UnsupportedDtype(String),
    /// Unsupported file format (unrecognized extension).
    UnsupportedFileFormat(String),
    /// I/O error occurred.
    IoError(std::io::Error),
    /// Other error with a descriptive message.
    Other(String),
}

impl fmt::Display for FmmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FmmError::InvalidMeshShape { axis, size } => {
                write!(
                    f,
                    "invalid mesh shape: axis {} has {} elements (must be >= 1)",
                    axis, size
                )
            }
            FmmError::OutsideDomain { x, y } => {
                write!(f, "coordinate ({}, {}) lies outside the mesh domain", x, y)
            }
            FmmError::FieldLengthMismatch { expected, got } => {
                write!(
                    f,
                    "field length mismatch: mesh has {} nodes, field has {} entries",
                    expected, got
                )
            }
            FmmError::DegenerateFront => {
                write!(f, "degenerate front: no zero contour found in distance field")
            }
            FmmError::InconsistentVelocityData { node } => {
                write!(
                    f,
                    "inconsistent velocity data: node {} has no neighbour to extend from",
                    node
                )
            }
            FmmError::ShapeMismatch { expected, got } => {
                write!(f, "shape mismatch: expected {:?}, got {:?}", expected, got)
            }
            FmmError::UnsupportedDtype(dtype) => {
                write!(f, "unsupported dtype: {}", dtype)
            }
            FmmError::UnsupportedFileFormat(ext) => {
                write!(f, "unsupported file format: {}", ext)
            }
            FmmError::IoError(e) => write!(f, "I/O error: {}", e),
            FmmError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FmmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FmmError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FmmError {
    fn from(e: std::io::Error) -> Self {
        FmmError::IoError(e)
    }
}

/// Convenience type alias for Results with FmmError.
pub type Result<T> = std::result::Result<T, FmmError>;
