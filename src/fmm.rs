// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{FmmError, Result};
use crate::heap::{HeapHandle, NodeHeap};
use crate::mesh::{Direction, Mesh};
use crate::update_kernels::{
    crossing_fraction, extension_velocity, front_distance, front_velocity, solve_stencil, AxisTerm,
};

/// Propagation status of a node during a march.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Far field, not yet reached.
    None,
    /// In the heap with a tentative distance.
    Trial,
    /// Distance is final.
    Frozen,
    /// Excluded from the march.
    Masked,
}

/// Progress information passed to the optional callback after every round.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Number of rounds completed so far.
    pub round: u64,
    /// Unsigned distance shared by the nodes frozen this round.
    pub key: f64,
    /// Number of nodes frozen in this round.
    pub frozen_this_round: usize,
    /// Number of nodes frozen so far, including the initial front.
    pub frozen_total: usize,
    /// Number of trial nodes left in the heap.
    pub trial: usize,
    /// Elapsed time since the march started.
    pub elapsed: Duration,
}

/// Summary of a completed march.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarchStats {
    /// Nodes frozen directly from the zero contour.
    pub initially_frozen: usize,
    /// Nodes frozen in total.
    pub frozen: usize,
    /// Number of wavefront rounds.
    pub rounds: u64,
    /// Non-masked nodes the front never reached. Their values are untouched.
    pub unreached: usize,
    /// Masked nodes.
    pub masked: usize,
    /// Wall time of the march.
    pub elapsed: Duration,
}

/// The caller's fields for the duration of one march.
struct Fields<'a> {
    distance: &'a mut [f64],
    velocity: Option<&'a mut [f64]>,
}

/// Fast Marching Method solver for signed distance reinitialisation and
/// velocity extension on a [`Mesh`].
///
/// Each march starts from the sign pattern of the input distance field: nodes
/// next to the zero contour are frozen at a sub-grid interpolated distance,
/// then the front is swept outwards in order of increasing unsigned distance
/// using a second-order upwind stencil. Nodes that share the smallest trial
/// distance are frozen together in one round.
///
/// The solver can be reused; status is rebuilt from the mesh mask on every
/// march.
pub struct FastMarching<'m> {
    mesh: &'m Mesh,
    status: Vec<NodeStatus>,
    handles: Vec<Option<HeapHandle>>,
    heap: NodeHeap,
    distance_copy: Vec<f64>,
    velocity_copy: Vec<f64>,
    progress_callback: Option<Box<dyn FnMut(ProgressInfo)>>,
}

impl<'m> FastMarching<'m> {
    /// Create a solver for the given mesh.
    pub fn new(mesh: &'m Mesh) -> Self {
        let n = mesh.n_nodes();
        FastMarching {
            mesh,
            status: vec![NodeStatus::None; n],
            handles: vec![None; n],
            heap: NodeHeap::default(),
            distance_copy: Vec::with_capacity(n),
            velocity_copy: Vec::new(),
            progress_callback: None,
        }
    }

    /// Set a progress callback invoked after every wavefront round (builder method).
    pub fn with_progress(mut self, callback: Box<dyn FnMut(ProgressInfo)>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Get a reference to the mesh.
    pub fn mesh(&self) -> &Mesh {
        self.mesh
    }

    /// Status of a node after the most recent march.
    ///
    /// After a failed march every node reports [`NodeStatus::None`] or
    /// [`NodeStatus::Masked`].
    pub fn status(&self, node: usize) -> NodeStatus {
        self.status[node]
    }

    /// Whether the trial heap is empty.
    pub fn heap_is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Reinitialise `distance` to a signed distance function.
    ///
    /// Only the sign pattern near the zero contour is used as input. On return
    /// every node reachable from the front holds its distance to the front,
    /// with the sign it came in with.
    ///
    /// # Errors
    /// Returns an error if the field length does not match the mesh, or if the
    /// field has no zero contour. On error the field is left as it was passed
    /// in and node status is reset to the mesh mask.
    pub fn march(&mut self, distance: &mut [f64]) -> Result<MarchStats> {
        self.run(Fields {
            distance,
            velocity: None,
        })
    }

    /// Reinitialise `distance` and extend `velocity` off the front so that
    /// its gradient is orthogonal to the distance gradient.
    ///
    /// Velocity values are only read at nodes adjacent to the zero contour.
    ///
    /// # Errors
    /// As [`FastMarching::march`], and additionally if a velocity cannot be
    /// built for a frozen node. On error both fields are left as passed in.
    pub fn march_with_velocity(
        &mut self,
        distance: &mut [f64],
        velocity: &mut [f64],
    ) -> Result<MarchStats> {
        self.check_len(velocity.len())?;
        self.run(Fields {
            distance,
            velocity: Some(velocity),
        })
    }

    fn check_len(&self, got: usize) -> Result<()> {
        let expected = self.mesh.n_nodes();
        if got != expected {
            return Err(FmmError::FieldLengthMismatch { expected, got });
        }
        Ok(())
    }

    fn run(&mut self, mut fields: Fields<'_>) -> Result<MarchStats> {
        self.check_len(fields.distance.len())?;
        let start = Instant::now();

        self.reset(&fields);
        let result = self.execute(&mut fields, start);

        if result.is_err() {
            fields.distance.copy_from_slice(&self.distance_copy);
            if let Some(velocity) = fields.velocity.as_deref_mut() {
                velocity.copy_from_slice(&self.velocity_copy);
            }
            self.reset_status();
        }
        result
    }

    /// Status from the mesh mask alone, with an empty heap.
    fn reset_status(&mut self) {
        for (status, node) in self.status.iter_mut().zip(&self.mesh.nodes) {
            *status = if node.is_masked {
                NodeStatus::Masked
            } else {
                NodeStatus::None
            };
        }
        self.handles.fill(None);
        self.heap = NodeHeap::default();
    }

    fn reset(&mut self, fields: &Fields<'_>) {
        self.reset_status();

        self.distance_copy.clear();
        self.distance_copy.extend_from_slice(fields.distance);
        self.velocity_copy.clear();
        if let Some(velocity) = fields.velocity.as_deref() {
            self.velocity_copy.extend_from_slice(velocity);
        }
    }

    fn execute(&mut self, fields: &mut Fields<'_>, start: Instant) -> Result<MarchStats> {
        let initially_frozen = self.initialise_frozen(fields)?;
        self.initialise_heap();
        self.initialise_trial(fields);
        debug!(
            initially_frozen,
            trial = self.heap.len(),
            "front initialised"
        );

        let rounds = self.solve(fields, initially_frozen, start)?;

        let count = |s: NodeStatus| self.status.iter().filter(|&&x| x == s).count();
        let stats = MarchStats {
            initially_frozen,
            frozen: count(NodeStatus::Frozen),
            rounds,
            unreached: count(NodeStatus::None),
            masked: count(NodeStatus::Masked),
            elapsed: start.elapsed(),
        };

        if stats.unreached > 0 {
            warn!(
                unreached = stats.unreached,
                "nodes not reachable from the front were left unchanged"
            );
        }
        info!(
            frozen = stats.frozen,
            rounds = stats.rounds,
            elapsed_ms = stats.elapsed.as_secs_f64() * 1e3,
            "march complete"
        );
        Ok(stats)
    }

    /// Freeze the nodes on and immediately next to the zero contour.
    fn initialise_frozen(&mut self, fields: &mut Fields<'_>) -> Result<usize> {
        let mesh = self.mesh;
        let track_velocity = fields.velocity.is_some();
        let mut n_frozen = 0;

        for (status, &phi) in self.status.iter_mut().zip(&self.distance_copy) {
            if *status == NodeStatus::None && phi == 0.0 {
                *status = NodeStatus::Frozen;
                n_frozen += 1;
            }
        }

        for i in 0..mesh.n_nodes() {
            if self.status[i] != NodeStatus::None {
                continue;
            }
            let phi = self.distance_copy[i];

            // Per axis, the nearest crossing and the velocity interpolated there.
            let mut crossings: [Option<(f64, f64)>; 2] = [None; 2];
            for dir in Direction::ALL {
                let Some(j) = mesh.neighbour(i, dir) else {
                    continue;
                };
                if self.status[j] == NodeStatus::Masked {
                    continue;
                }
                let Some(d) = crossing_fraction(phi, self.distance_copy[j]) else {
                    continue;
                };
                let axis = dir.axis();
                if crossings[axis].map_or(true, |(best, _)| d < best) {
                    let v = if track_velocity {
                        let (vi, vj) = (self.velocity_copy[i], self.velocity_copy[j]);
                        vi + d * (vj - vi)
                    } else {
                        0.0
                    };
                    crossings[axis] = Some((d, v));
                }
            }

            let Some(dist) = front_distance(crossings.map(|c| c.map(|(d, _)| d))) else {
                continue;
            };
            fields.distance[i] = if phi < 0.0 { -dist } else { dist };
            self.status[i] = NodeStatus::Frozen;
            n_frozen += 1;

            if let Some(velocity) = fields.velocity.as_deref_mut() {
                velocity[i] = front_velocity(crossings)
                    .ok_or(FmmError::InconsistentVelocityData { node: i })?;
            }
        }

        if n_frozen == 0 {
            return Err(FmmError::DegenerateFront);
        }
        Ok(n_frozen)
    }

    fn initialise_heap(&mut self) {
        let max_size = self
            .status
            .iter()
            .filter(|&&s| s == NodeStatus::None)
            .count();
        self.heap = NodeHeap::with_capacity(max_size);
    }

    /// Push every far-field node with a frozen neighbour into the heap.
    fn initialise_trial(&mut self, fields: &mut Fields<'_>) {
        let mesh = self.mesh;
        for i in 0..mesh.n_nodes() {
            if self.status[i] != NodeStatus::None {
                continue;
            }
            let touches_front = Direction::ALL.iter().any(|&dir| {
                mesh.neighbour(i, dir)
                    .is_some_and(|j| self.status[j] == NodeStatus::Frozen)
            });
            if !touches_front {
                continue;
            }

            let d = {
                let distance: &[f64] = fields.distance;
                self.update_node(i, distance)
                    .unwrap_or_else(|| self.nearest_frozen_estimate(i, distance))
            };
            fields.distance[i] = d;
            self.status[i] = NodeStatus::Trial;
            self.handles[i] = Some(self.heap.push(i, d.abs()));
        }
    }

    /// March the front until no trial nodes remain. Returns the number of rounds.
    fn solve(
        &mut self,
        fields: &mut Fields<'_>,
        initially_frozen: usize,
        start: Instant,
    ) -> Result<u64> {
        let mesh = self.mesh;
        let mut to_freeze: Vec<usize> = Vec::new();
        let mut rounds = 0u64;
        let mut frozen_total = initially_frozen;

        while let Some((node, key)) = self.heap.pop() {
            to_freeze.clear();
            self.freeze(node, fields)?;
            to_freeze.push(node);

            // Nodes tied at the same distance form one front.
            while self.heap.peek() == Some(key) {
                let Some((next, _)) = self.heap.pop() else {
                    break;
                };
                self.freeze(next, fields)?;
                to_freeze.push(next);
            }

            for &frozen in &to_freeze {
                for dir in Direction::ALL {
                    let Some(nb) = mesh.neighbour(frozen, dir) else {
                        continue;
                    };
                    match self.status[nb] {
                        NodeStatus::Masked => {}
                        NodeStatus::Frozen => {
                            // Jump the frozen node: its outward neighbour may
                            // now have a second-order stencil.
                            if let Some(far) = mesh.neighbour(nb, dir) {
                                if self.status[far] == NodeStatus::Trial {
                                    self.relax(far, fields);
                                }
                            }
                        }
                        NodeStatus::None | NodeStatus::Trial => self.relax(nb, fields),
                    }
                }
            }

            rounds += 1;
            frozen_total += to_freeze.len();
            if let Some(cb) = self.progress_callback.as_mut() {
                cb(ProgressInfo {
                    round: rounds,
                    key,
                    frozen_this_round: to_freeze.len(),
                    frozen_total,
                    trial: self.heap.len(),
                    elapsed: start.elapsed(),
                });
            }
        }

        Ok(rounds)
    }

    fn freeze(&mut self, node: usize, fields: &mut Fields<'_>) -> Result<()> {
        self.status[node] = NodeStatus::Frozen;
        self.handles[node] = None;
        if let Some(velocity) = fields.velocity.as_deref_mut() {
            self.finalise_velocity(node, fields.distance, velocity)?;
        }
        Ok(())
    }

    /// Recompute a non-frozen node and move it into (or within) the heap.
    fn relax(&mut self, node: usize, fields: &mut Fields<'_>) {
        let Some(d) = self.update_node(node, fields.distance) else {
            return;
        };
        fields.distance[node] = d;
        match self.status[node] {
            NodeStatus::Trial => {
                if let Some(handle) = self.handles[node] {
                    self.heap.set(handle, d.abs());
                }
            }
            NodeStatus::None => {
                self.status[node] = NodeStatus::Trial;
                self.handles[node] = Some(self.heap.push(node, d.abs()));
            }
            NodeStatus::Frozen | NodeStatus::Masked => {}
        }
    }

    /// Tentative distance of `node` from its frozen neighbours, or `None` if
    /// the local quadratic has no real root.
    fn update_node(&self, node: usize, distance: &[f64]) -> Option<f64> {
        let mut terms: [Option<AxisTerm>; 2] = [None; 2];

        for (axis, term) in terms.iter_mut().enumerate() {
            let Some((dir, n1)) = self.nearest_frozen_along(node, axis, distance) else {
                continue;
            };
            let dist1 = distance[n1];

            let dist2 = self
                .mesh
                .neighbour(n1, dir)
                .filter(|&n2| self.status[n2] == NodeStatus::Frozen)
                .map(|n2| distance[n2])
                .filter(|&dist2| {
                    (dist2 <= dist1 && dist1 >= 0.0) || (dist2 >= dist1 && dist1 <= 0.0)
                });

            *term = Some(match dist2 {
                Some(dist2) => AxisTerm::SecondOrder(dist1, dist2),
                None => AxisTerm::FirstOrder(dist1),
            });
        }

        solve_stencil(terms, self.distance_copy[node] > 0.0)
    }

    /// The frozen neighbour along `axis` closest to the front.
    fn nearest_frozen_along(
        &self,
        node: usize,
        axis: usize,
        distance: &[f64],
    ) -> Option<(Direction, usize)> {
        let mut best: Option<(Direction, usize)> = None;
        for dir in Direction::along(axis) {
            let Some(n) = self.mesh.neighbour(node, dir) else {
                continue;
            };
            if self.status[n] != NodeStatus::Frozen {
                continue;
            }
            if best.map_or(true, |(_, b)| distance[n].abs() < distance[b].abs()) {
                best = Some((dir, n));
            }
        }
        best
    }

    /// One grid step beyond the nearest frozen neighbour, on the node's own
    /// side of the front. Used when a seed node's stencil has no real root.
    fn nearest_frozen_estimate(&self, node: usize, distance: &[f64]) -> f64 {
        let nearest = (0..2)
            .filter_map(|axis| self.nearest_frozen_along(node, axis, distance))
            .map(|(_, n)| distance[n])
            .min_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);
        if self.distance_copy[node] > 0.0 {
            nearest + 1.0
        } else {
            nearest - 1.0
        }
    }

    /// Set the extension velocity of a newly frozen node from its upwind
    /// frozen neighbours.
    fn finalise_velocity(&self, node: usize, distance: &[f64], velocity: &mut [f64]) -> Result<()> {
        let mut samples: [Option<(f64, f64)>; 2] = [None; 2];
        for (axis, sample) in samples.iter_mut().enumerate() {
            if let Some((_, n)) = self.nearest_frozen_along(node, axis, distance) {
                *sample = Some((distance[node] - distance[n], velocity[n]));
            }
        }
        velocity[node] =
            extension_velocity(samples).ok_or(FmmError::InconsistentVelocityData { node })?;
        Ok(())
    }
}
