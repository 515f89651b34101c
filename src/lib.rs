// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Fast Marching Method reinitialisation for level sets on a fixed grid.
//!
//! This library rebuilds a signed distance function from the sign pattern of
//! a level-set field on a rectangular mesh of unit elements, by solving the
//! eikonal equation |∇φ| = 1 outwards from the zero contour. A paired scalar
//! field (typically a boundary velocity) can be extended off the front at the
//! same time, so that its gradient is orthogonal to the distance gradient.

#![warn(missing_docs)]

/// Error types for the library.
pub mod error;
/// Fast Marching Method solver.
pub mod fmm;
/// Binary min-heap with stable handles for trial nodes.
pub mod heap;
/// File I/O for nodal scalar fields.
pub mod io;
/// Fixed-grid level-set mesh.
pub mod mesh;
/// Eikonal stencil and front interpolation kernels.
pub mod update_kernels;

pub use crate::error::{FmmError, Result};
pub use crate::fmm::{FastMarching, MarchStats, NodeStatus, ProgressInfo};
pub use crate::mesh::{Coord, Direction, Mesh};
