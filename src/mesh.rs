// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{FmmError, Result};

/// A point in the mesh plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    /// The x position.
    pub x: f64,
    /// The y position.
    pub y: f64,
}

impl Coord {
    /// Create a coordinate from its components.
    pub fn new(x: f64, y: f64) -> Self {
        Coord { x, y }
    }
}

/// Neighbour directions, in the order used by [`Node::neighbours`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Negative x.
    Left = 0,
    /// Positive x.
    Right = 1,
    /// Negative y.
    Down = 2,
    /// Positive y.
    Up = 3,
}

impl Direction {
    /// All directions, ordered left, right, down, up.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Down,
        Direction::Up,
    ];

    /// Index into a node's neighbour array.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The axis this direction runs along (0 = x, 1 = y).
    #[inline]
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    /// The direction pointing the other way along the same axis.
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
        }
    }

    /// The two directions along an axis.
    #[inline]
    pub fn along(axis: usize) -> [Direction; 2] {
        if axis == 0 {
            [Direction::Left, Direction::Right]
        } else {
            [Direction::Down, Direction::Up]
        }
    }
}

/// A fixed-grid node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node coordinate.
    pub coord: Coord,
    /// Nearest neighbours ordered left, right, down, up. Directions that leave
    /// the domain hold the mesh node count.
    pub neighbours: [usize; 4],
    /// Elements the node belongs to (1 at a corner, 2 on an edge, 4 inside).
    pub elements: Vec<usize>,
    /// Whether the node lies on the domain boundary.
    pub is_domain: bool,
    /// Whether the node is permanently excluded from the march.
    pub is_masked: bool,
}

/// A unit square cell.
#[derive(Debug, Clone)]
pub struct Element {
    /// Element centre.
    pub coord: Coord,
    /// Node indices, anticlockwise from the bottom left.
    pub nodes: [usize; 4],
    /// Material area fraction.
    pub area: f64,
}

/// The level-set domain: a `width × height` grid of unit elements.
///
/// Nodes are numbered row by row from the bottom left, so node `(x, y)` has
/// index `y * (width + 1) + x` and element `(x, y)` has index `y * width + x`.
/// The mesh is not periodic.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Grid elements.
    pub elements: Vec<Element>,
    /// Grid nodes.
    pub nodes: Vec<Node>,
    width: usize,
    height: usize,
}

impl Mesh {
    /// Create a mesh with `width` elements along x and `height` along y.
    ///
    /// # Errors
    /// Returns an error if either dimension is zero.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        for (axis, &size) in [width, height].iter().enumerate() {
            if size == 0 {
                return Err(FmmError::InvalidMeshShape { axis, size });
            }
        }

        let n_nodes = (width + 1) * (height + 1);
        let mut mesh = Mesh {
            elements: Vec::with_capacity(width * height),
            nodes: Vec::with_capacity(n_nodes),
            width,
            height,
        };
        mesh.initialise_nodes();
        mesh.initialise_elements();
        Ok(mesh)
    }

    fn initialise_nodes(&mut self) {
        let n_nodes = (self.width + 1) * (self.height + 1);
        for y in 0..=self.height {
            for x in 0..=self.width {
                let neighbours = [
                    if x > 0 {
                        self.xy_to_index(x - 1, y)
                    } else {
                        n_nodes
                    },
                    if x < self.width {
                        self.xy_to_index(x + 1, y)
                    } else {
                        n_nodes
                    },
                    if y > 0 {
                        self.xy_to_index(x, y - 1)
                    } else {
                        n_nodes
                    },
                    if y < self.height {
                        self.xy_to_index(x, y + 1)
                    } else {
                        n_nodes
                    },
                ];
                self.nodes.push(Node {
                    coord: Coord::new(x as f64, y as f64),
                    neighbours,
                    elements: Vec::with_capacity(4),
                    is_domain: x == 0 || y == 0 || x == self.width || y == self.height,
                    is_masked: false,
                });
            }
        }
    }

    fn initialise_elements(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let id = self.elements.len();
                let nodes = [
                    self.xy_to_index(x, y),
                    self.xy_to_index(x + 1, y),
                    self.xy_to_index(x + 1, y + 1),
                    self.xy_to_index(x, y + 1),
                ];
                for &node in &nodes {
                    self.nodes[node].elements.push(id);
                }
                self.elements.push(Element {
                    coord: Coord::new(x as f64 + 0.5, y as f64 + 0.5),
                    nodes,
                    area: 1.0,
                });
            }
        }
    }

    /// Number of elements along x.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of elements along y.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of nodes. Also the "no neighbour" sentinel.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of elements.
    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Node index for integer grid position `(x, y)`.
    #[inline]
    pub fn xy_to_index(&self, x: usize, y: usize) -> usize {
        y * (self.width + 1) + x
    }

    /// The neighbour of `node` in direction `dir`, or `None` at the domain edge.
    #[inline]
    pub fn neighbour(&self, node: usize, dir: Direction) -> Option<usize> {
        let n = self.nodes[node].neighbours[dir.index()];
        (n < self.nodes.len()).then_some(n)
    }

    fn check_inside(&self, x: f64, y: f64) -> Result<()> {
        let inside = x >= 0.0 && y >= 0.0 && x <= self.width as f64 && y <= self.height as f64;
        if inside {
            Ok(())
        } else {
            Err(FmmError::OutsideDomain { x, y })
        }
    }

    /// Index of the node closest to a point.
    ///
    /// # Errors
    /// Returns an error if the point lies outside the domain.
    pub fn closest_node(&self, point: Coord) -> Result<usize> {
        self.closest_node_xy(point.x, point.y)
    }

    /// Index of the node closest to `(x, y)`.
    ///
    /// # Errors
    /// Returns an error if the point lies outside the domain.
    pub fn closest_node_xy(&self, x: f64, y: f64) -> Result<usize> {
        self.check_inside(x, y)?;
        Ok(self.xy_to_index(x.round() as usize, y.round() as usize))
    }

    /// Index of the element containing a point.
    ///
    /// # Errors
    /// Returns an error if the point lies outside the domain.
    pub fn element_at(&self, point: Coord) -> Result<usize> {
        self.element_at_xy(point.x, point.y)
    }

    /// Index of the element containing `(x, y)`. Points on the right or top
    /// domain edge belong to the last cell along that axis.
    ///
    /// # Errors
    /// Returns an error if the point lies outside the domain.
    pub fn element_at_xy(&self, x: f64, y: f64) -> Result<usize> {
        self.check_inside(x, y)?;
        let ex = (x.floor() as usize).min(self.width - 1);
        let ey = (y.floor() as usize).min(self.height - 1);
        Ok(ey * self.width + ex)
    }

    /// Flag a node as excluded from (or included in) future marches.
    pub fn set_masked(&mut self, node: usize, masked: bool) {
        self.nodes[node].is_masked = masked;
    }

    /// Number of masked nodes.
    pub fn masked_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_masked).count()
    }
}
