// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The proximity connection graph.
//!
//! Candidate pairs are found through a uniform grid whose cell size equals
//! the cutoff, so each particle only checks its own and neighbouring cells.
//! Candidates are then accepted greedily, shortest first, up to the edge
//! budget.

use ahash::{AHashMap, AHashSet};

use super::particle::{ConnectionEdge, Particle};

/// Offsets of the neighbouring cells checked for each particle. Only half
/// the neighbourhood is visited so every pair is seen once.
const HALF_NEIGHBOURHOOD: [(i32, i32); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f32,
    a: usize,
    b: usize,
}

/// Builds the connection graph for `particles`.
///
/// Pairs closer than `cutoff` qualify; at most `max_edges` are kept, and
/// at most `max_per_particle` per particle when set. Ties are broken by
/// particle id so the result is deterministic.
pub fn build_edges(
    particles: &[Particle],
    cutoff: f32,
    max_edges: usize,
    max_per_particle: Option<usize>,
) -> Vec<ConnectionEdge> {
    if max_edges == 0 || particles.len() < 2 || !(cutoff.is_finite() && cutoff > 0.0) {
        return Vec::new();
    }
    if max_per_particle == Some(0) {
        return Vec::new();
    }

    let cell_of = |i: usize| {
        let p = particles[i].position;
        ((p.x / cutoff).floor() as i32, (p.y / cutoff).floor() as i32)
    };

    let mut grid: AHashMap<(i32, i32), Vec<usize>> = AHashMap::new();
    for (i, p) in particles.iter().enumerate() {
        if p.position.is_finite() {
            grid.entry(cell_of(i)).or_default().push(i);
        }
    }

    let cutoff_sq = cutoff * cutoff;
    let mut candidates = Vec::new();
    let mut consider = |a: usize, b: usize| {
        let d_sq = particles[a].position.distance_squared(particles[b].position);
        if d_sq < cutoff_sq {
            candidates.push(Candidate {
                distance: d_sq.sqrt(),
                a,
                b,
            });
        }
    };

    for (&(cx, cy), members) in &grid {
        for (k, &a) in members.iter().enumerate() {
            for &b in &members[k + 1..] {
                consider(a, b);
            }
        }
        for (dx, dy) in HALF_NEIGHBOURHOOD {
            // Cells past the i32 range cannot exist: the cast saturates.
            let (Some(nx), Some(ny)) = (cx.checked_add(dx), cy.checked_add(dy)) else {
                continue;
            };
            if let Some(neighbours) = grid.get(&(nx, ny)) {
                for &a in members {
                    for &b in neighbours {
                        consider(a, b);
                    }
                }
            }
        }
    }

    candidates.sort_by(|x, y| {
        x.distance.total_cmp(&y.distance).then_with(|| {
            let kx = ordered_ids(particles, x);
            let ky = ordered_ids(particles, y);
            kx.cmp(&ky)
        })
    });

    let mut links = vec![0usize; particles.len()];
    let mut edges = Vec::with_capacity(max_edges.min(candidates.len()));
    for c in candidates {
        if edges.len() >= max_edges {
            break;
        }
        if let Some(limit) = max_per_particle {
            if links[c.a] >= limit || links[c.b] >= limit {
                continue;
            }
        }
        links[c.a] += 1;
        links[c.b] += 1;
        let (a, b) = ordered_ids(particles, &c);
        edges.push(ConnectionEdge {
            a,
            b,
            distance: c.distance,
            opacity: (1.0 - c.distance / cutoff).clamp(0.0, 1.0),
        });
    }
    edges
}

fn ordered_ids(particles: &[Particle], c: &Candidate) -> (u64, u64) {
    let (a, b) = (particles[c.a].id, particles[c.b].id);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Connection graph cached between rebuilds.
#[derive(Debug, Clone, Default)]
pub struct ConnectionGraph {
    edges: Vec<ConnectionEdge>,
    ticks_since_rebuild: u32,
    built: bool,
}

impl ConnectionGraph {
    /// An empty graph that rebuilds on the first tick.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current edges.
    pub fn edges(&self) -> &[ConnectionEdge] {
        &self.edges
    }

    /// Forces a rebuild on the next tick.
    pub fn invalidate(&mut self) {
        self.built = false;
    }

    /// Rebuilds every `interval` ticks; in between, drops edges whose
    /// endpoints no longer exist. Returns `true` on a rebuild.
    pub fn tick(
        &mut self,
        particles: &[Particle],
        interval: u32,
        cutoff: f32,
        max_edges: usize,
        max_per_particle: Option<usize>,
    ) -> bool {
        self.ticks_since_rebuild = self.ticks_since_rebuild.saturating_add(1);
        if !self.built || self.ticks_since_rebuild >= interval.max(1) {
            self.edges = build_edges(particles, cutoff, max_edges, max_per_particle);
            self.ticks_since_rebuild = 0;
            self.built = true;
            return true;
        }

        let alive: AHashSet<u64> = particles.iter().map(|p| p.id).collect();
        self.edges
            .retain(|e| alive.contains(&e.a) && alive.contains(&e.b));
        false
    }
}
