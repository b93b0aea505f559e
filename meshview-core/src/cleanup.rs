/// Mesh repair passes run after CAD triangulation
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::dedup::VertexDedup;
use crate::geometry::Mesh;

impl Mesh {
    /// Merges vertices with bit-identical positions and remaps triangles.
    ///
    /// The first occurrence keeps its color and normal. Returns the number of
    /// vertices removed.
    pub fn remove_duplicated_vertices(&mut self) -> usize {
        let mut first_seen: HashMap<[u64; 3], u32> = HashMap::new();
        let mut remap = Vec::with_capacity(self.vertices.len());
        let mut kept = Vec::new();
        for (index, vertex) in self.vertices.iter().enumerate() {
            let next = kept.len() as u32;
            let target = *first_seen.entry(VertexDedup::key(vertex)).or_insert_with(|| {
                kept.push(index);
                next
            });
            remap.push(target);
        }

        let removed = self.vertices.len() - kept.len();
        if removed == 0 {
            return 0;
        }
        self.vertices = kept.iter().map(|&i| self.vertices[i]).collect();
        if let Some(colors) = &mut self.colors {
            *colors = kept.iter().map(|&i| colors[i]).collect();
        }
        if let Some(normals) = &mut self.normals {
            *normals = kept.iter().map(|&i| normals[i]).collect();
        }
        for triangle in &mut self.triangles {
            *triangle = triangle.map(|i| remap[i as usize]);
        }
        removed
    }

    /// Drops triangles with a repeated corner index or zero area.
    pub fn remove_degenerate_triangles(&mut self) -> usize {
        let before = self.triangles.len();
        let triangles = std::mem::take(&mut self.triangles);
        self.triangles = triangles
            .into_iter()
            .filter(|t| {
                t[0] != t[1] && t[1] != t[2] && t[0] != t[2] && self.triangle_area(t) > 0.0
            })
            .collect();
        before - self.triangles.len()
    }

    /// Keeps the first of any triangles over the same three vertices,
    /// regardless of winding.
    pub fn remove_duplicated_triangles(&mut self) -> usize {
        let before = self.triangles.len();
        let mut seen = HashSet::new();
        self.triangles.retain(|t| {
            let mut key = *t;
            key.sort_unstable();
            seen.insert(key)
        });
        before - self.triangles.len()
    }

    /// Removes triangles until no edge is shared by more than two of them.
    ///
    /// On each over-shared edge the smallest-area triangles go first; ties
    /// fall to the later triangle. Edges are visited in sorted order so the
    /// result does not depend on hashing.
    pub fn remove_non_manifold_edges(&mut self) -> usize {
        let before = self.triangles.len();
        loop {
            let mut edges: BTreeMap<(u32, u32), Vec<usize>> = BTreeMap::new();
            for (index, t) in self.triangles.iter().enumerate() {
                for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                    edges.entry((a.min(b), a.max(b))).or_default().push(index);
                }
            }

            let mut removed = vec![false; self.triangles.len()];
            let mut any = false;
            for sharing in edges.values().filter(|s| s.len() > 2) {
                let mut live: Vec<usize> =
                    sharing.iter().copied().filter(|&i| !removed[i]).collect();
                live.sort_by(|&a, &b| {
                    let area_a = self.triangle_area(&self.triangles[a]);
                    let area_b = self.triangle_area(&self.triangles[b]);
                    area_a.total_cmp(&area_b).then(b.cmp(&a))
                });
                while live.len() > 2 {
                    removed[live.remove(0)] = true;
                    any = true;
                }
            }
            if !any {
                break;
            }

            let mut flags = removed.into_iter();
            self.triangles.retain(|_| !flags.next().unwrap_or(false));
        }
        before - self.triangles.len()
    }
}
