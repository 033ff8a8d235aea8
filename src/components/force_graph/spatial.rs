//! Spatial indexes for the pairwise forces.
//!
//! Charge uses a Barnes-Hut quadtree: a cell far enough from the query point
//! acts as one body at its center of mass. Collision only ever involves
//! near neighbors, so it walks a uniform grid whose cells are as wide as the
//! largest contact distance.

use std::collections::HashMap;

/// Points per leaf before it splits.
const LEAF_CAPACITY: usize = 4;
/// Coincident points stop splitting here and share a leaf.
const MAX_DEPTH: usize = 24;

#[derive(Clone, Debug)]
struct Cell {
	/// Center of the square.
	cx: f64,
	cy: f64,
	half: f64,
	count: f64,
	sum_x: f64,
	sum_y: f64,
	children: Option<[usize; 4]>,
	points: Vec<usize>,
}

impl Cell {
	fn new(cx: f64, cy: f64, half: f64) -> Self {
		Self {
			cx,
			cy,
			half,
			count: 0.0,
			sum_x: 0.0,
			sum_y: 0.0,
			children: None,
			points: Vec::new(),
		}
	}

	fn quadrant(&self, p: (f64, f64)) -> usize {
		usize::from(p.0 >= self.cx) | (usize::from(p.1 >= self.cy) << 1)
	}

	fn add(&mut self, p: (f64, f64)) {
		self.count += 1.0;
		self.sum_x += p.0;
		self.sum_y += p.1;
	}

	/// Squared distance from `p` to the nearest point of the square.
	fn gap2(&self, p: (f64, f64)) -> f64 {
		let dx = ((p.0 - self.cx).abs() - self.half).max(0.0);
		let dy = ((p.1 - self.cy).abs() - self.half).max(0.0);
		dx * dx + dy * dy
	}
}

/// Barnes-Hut quadtree over a position slice.
#[derive(Clone, Debug, Default)]
pub struct QuadTree {
	cells: Vec<Cell>,
}

impl QuadTree {
	/// Build over every finite position; non-finite ones are left out.
	pub fn new(pos: &[(f64, f64)]) -> Self {
		let finite = || pos.iter().filter(|p| p.0.is_finite() && p.1.is_finite());
		let Some(&(x0, y0)) = finite().next() else {
			return Self::default();
		};
		let (min_x, min_y, max_x, max_y) = finite().fold((x0, y0, x0, y0), |(a, b, c, d), &(x, y)| {
			(a.min(x), b.min(y), c.max(x), d.max(y))
		});
		let half = (max_x - min_x).max(max_y - min_y) / 2.0 + 1.0;
		let mut tree = Self {
			cells: vec![Cell::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0, half)],
		};
		for (slot, &p) in pos.iter().enumerate() {
			if p.0.is_finite() && p.1.is_finite() {
				tree.insert(slot, p, pos);
			}
		}
		tree
	}

	fn insert(&mut self, slot: usize, p: (f64, f64), pos: &[(f64, f64)]) {
		let mut at = 0;
		let mut depth = 0;
		loop {
			self.cells[at].add(p);
			if self.cells[at].children.is_none() {
				if self.cells[at].points.len() < LEAF_CAPACITY || depth >= MAX_DEPTH {
					self.cells[at].points.push(slot);
					return;
				}
				self.split(at, pos);
			}
			let cell = &self.cells[at];
			let Some(children) = cell.children else {
				return;
			};
			at = children[cell.quadrant(p)];
			depth += 1;
		}
	}

	fn split(&mut self, at: usize, pos: &[(f64, f64)]) {
		let (cx, cy, half) = (self.cells[at].cx, self.cells[at].cy, self.cells[at].half / 2.0);
		let first = self.cells.len();
		for q in 0..4 {
			let ox = if q & 1 == 1 { half } else { -half };
			let oy = if q & 2 == 2 { half } else { -half };
			self.cells.push(Cell::new(cx + ox, cy + oy, half));
		}
		let children = [first, first + 1, first + 2, first + 3];
		let points = std::mem::take(&mut self.cells[at].points);
		self.cells[at].children = Some(children);
		for slot in points {
			let child = children[self.cells[at].quadrant(pos[slot])];
			self.cells[child].add(pos[slot]);
			self.cells[child].points.push(slot);
		}
	}

	/// Visit the bodies acting on `slot` within `distance_max`.
	///
	/// `visit(dx, dy, weight)` gets the vector from the point to the body
	/// and how many nodes the body stands for. A cell of width `w` at
	/// distance `d` is taken whole when `w / d < theta`.
	pub fn for_each_body(
		&self,
		slot: usize,
		pos: &[(f64, f64)],
		theta: f64,
		distance_max: f64,
		mut visit: impl FnMut(f64, f64, f64),
	) {
		let Some(&p) = pos.get(slot) else {
			return;
		};
		if self.cells.is_empty() {
			return;
		}
		let max2 = distance_max * distance_max;
		let theta2 = theta * theta;
		let mut stack = vec![0];
		while let Some(at) = stack.pop() {
			let cell = &self.cells[at];
			if cell.count == 0.0 || cell.gap2(p) >= max2 {
				continue;
			}
			match cell.children {
				Some(children) => {
					let dx = cell.sum_x / cell.count - p.0;
					let dy = cell.sum_y / cell.count - p.1;
					let dist2 = dx * dx + dy * dy;
					let width = 2.0 * cell.half;
					if cell.gap2(p) > 0.0 && width * width < theta2 * dist2 {
						if dist2 < max2 {
							visit(dx, dy, cell.count);
						}
					} else {
						stack.extend(children);
					}
				}
				None => {
					for &other in cell.points.iter().filter(|&&o| o != slot) {
						let (dx, dy) = separation(p, pos[other], other);
						if dx * dx + dy * dy < max2 {
							visit(dx, dy, 1.0);
						}
					}
				}
			}
		}
	}
}

/// Uniform bucket grid for fixed-reach neighbor queries.
#[derive(Clone, Debug)]
pub struct NeighborGrid {
	cell: f64,
	buckets: HashMap<(i64, i64), Vec<usize>>,
}

impl NeighborGrid {
	/// Bucket every finite position into square cells of side `cell`.
	pub fn new(pos: &[(f64, f64)], cell: f64) -> Self {
		let cell = if cell.is_finite() && cell > 0.0 { cell } else { 1.0 };
		let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
		for (slot, &p) in pos.iter().enumerate() {
			if p.0.is_finite() && p.1.is_finite() {
				buckets.entry(key(p, cell)).or_default().push(slot);
			}
		}
		Self { cell, buckets }
	}

	/// Call `visit(i, j)` once for every pair `i < j` in the same or an
	/// adjacent cell. Pairs closer than the cell size are never missed.
	pub fn for_each_pair(&self, pos: &[(f64, f64)], mut visit: impl FnMut(usize, usize)) {
		for (i, &p) in pos.iter().enumerate() {
			if !(p.0.is_finite() && p.1.is_finite()) {
				continue;
			}
			let (kx, ky) = key(p, self.cell);
			for ox in -1..=1 {
				for oy in -1..=1 {
					let Some(bucket) = self.buckets.get(&(kx + ox, ky + oy)) else {
						continue;
					};
					for &j in bucket.iter().filter(|&&j| j > i) {
						visit(i, j);
					}
				}
			}
		}
	}
}

fn key(p: (f64, f64), cell: f64) -> (i64, i64) {
	((p.0 / cell).floor() as i64, (p.1 / cell).floor() as i64)
}

/// Vector from `a` to `b`, nudged apart deterministically when coincident.
pub fn separation(a: (f64, f64), b: (f64, f64), salt: usize) -> (f64, f64) {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	if dx * dx + dy * dy > 1e-12 {
		(dx, dy)
	} else {
		let angle = salt as f64 * 2.399_963;
		(1e-3 * angle.cos(), 1e-3 * angle.sin())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scatter(n: usize) -> Vec<(f64, f64)> {
		(0..n)
			.map(|i| {
				let t = i as f64 * 2.399_963;
				let r = 8.0 * (i as f64).sqrt();
				(r * t.cos(), r * t.sin())
			})
			.collect()
	}

	fn brute_pairs(pos: &[(f64, f64)], reach: f64) -> Vec<(usize, usize)> {
		let mut pairs = Vec::new();
		for i in 0..pos.len() {
			for j in (i + 1)..pos.len() {
				let (dx, dy) = (pos[j].0 - pos[i].0, pos[j].1 - pos[i].1);
				if dx * dx + dy * dy < reach * reach {
					pairs.push((i, j));
				}
			}
		}
		pairs
	}

	#[test]
	fn test_grid_finds_every_close_pair_once() {
		let pos = scatter(400);
		let grid = NeighborGrid::new(&pos, 20.0);
		let mut found = Vec::new();
		grid.for_each_pair(&pos, |i, j| {
			let (dx, dy) = (pos[j].0 - pos[i].0, pos[j].1 - pos[i].1);
			if dx * dx + dy * dy < 400.0 {
				found.push((i, j));
			}
		});
		found.sort_unstable();
		assert_eq!(found, brute_pairs(&pos, 20.0));
	}

	#[test]
	fn test_grid_skips_far_pairs() {
		let pos = vec![(0.0, 0.0), (5.0, 0.0), (500.0, 500.0)];
		let mut visited = Vec::new();
		NeighborGrid::new(&pos, 10.0).for_each_pair(&pos, |i, j| visited.push((i, j)));
		assert_eq!(visited, vec![(0, 1)]);
	}

	#[test]
	fn test_exact_quadtree_matches_direct_sum() {
		let pos = scatter(300);
		let tree = QuadTree::new(&pos);
		for slot in [0, 17, 150, 299] {
			let (mut fx, mut fy) = (0.0, 0.0);
			tree.for_each_body(slot, &pos, 0.0, 120.0, |dx, dy, w| {
				fx += dx * w / (dx * dx + dy * dy);
				fy += dy * w / (dx * dx + dy * dy);
			});
			let (mut ex, mut ey) = (0.0, 0.0);
			for (other, &q) in pos.iter().enumerate() {
				let (dx, dy) = (q.0 - pos[slot].0, q.1 - pos[slot].1);
				if other != slot && dx * dx + dy * dy < 120.0 * 120.0 {
					ex += dx / (dx * dx + dy * dy);
					ey += dy / (dx * dx + dy * dy);
				}
			}
			assert!((fx - ex).abs() < 1e-9 && (fy - ey).abs() < 1e-9);
		}
	}

	#[test]
	fn test_approximation_stays_close_and_counts_every_body() {
		let pos = scatter(500);
		let tree = QuadTree::new(&pos);
		let mut weight = 0.0;
		tree.for_each_body(0, &pos, 0.9, f64::INFINITY, |_, _, w| weight += w);
		assert_eq!(weight, 499.0);
	}

	#[test]
	fn test_coincident_points_do_not_recurse_forever() {
		let pos = vec![(3.0, 3.0); 40];
		let tree = QuadTree::new(&pos);
		let mut bodies = 0;
		tree.for_each_body(0, &pos, 0.9, 10.0, |_, _, _| bodies += 1);
		assert_eq!(bodies, 39);
	}
}
