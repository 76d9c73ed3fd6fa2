//! Position-based passes applied after each `force_graph` step: link length
//! relaxation, collision separation and centering.

/// A node as seen by the relaxation passes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	/// Pinned bodies are never moved.
	pub fixed: bool,
}

/// A spring between two bodies with a rest length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
	pub a: usize,
	pub b: usize,
	pub distance: f64,
}

const MIN_DIST: f64 = 1e-3;

/// Move both ends of every link toward its rest length.
pub fn relax_links(bodies: &mut [Body], links: &[Link], strength: f64) {
	for link in links {
		if link.a == link.b || link.a >= bodies.len() || link.b >= bodies.len() {
			continue;
		}
		let (a, b) = (bodies[link.a], bodies[link.b]);
		let (dx, dy) = (b.x - a.x, b.y - a.y);
		let dist = (dx * dx + dy * dy).sqrt().max(MIN_DIST);
		let k = (dist - link.distance) / dist * strength;
		let share = match (a.fixed, b.fixed) {
			(true, true) => continue,
			(true, false) | (false, true) => 1.0,
			(false, false) => 0.5,
		};
		if !a.fixed {
			bodies[link.a].x += dx * k * share;
			bodies[link.a].y += dy * k * share;
		}
		if !b.fixed {
			bodies[link.b].x -= dx * k * share;
			bodies[link.b].y -= dy * k * share;
		}
	}
}

/// Push apart bodies whose padded circles overlap.
pub fn resolve_collisions(bodies: &mut [Body], padding: f64, strength: f64) {
	let n = bodies.len();
	for i in 0..n {
		for j in (i + 1)..n {
			let (a, b) = (bodies[i], bodies[j]);
			if a.fixed && b.fixed {
				continue;
			}
			let min = a.radius + b.radius + 2.0 * padding;
			let (mut dx, mut dy) = (b.x - a.x, b.y - a.y);
			let mut dist = (dx * dx + dy * dy).sqrt();
			if dist >= min {
				continue;
			}
			if dist < MIN_DIST {
				// Coincident: split along a direction derived from the pair.
				let angle = (i * 31 + j * 17) as f64;
				(dx, dy, dist) = (angle.cos(), angle.sin(), 1.0);
			}
			let push = (min - dist) / dist * strength;
			let share = if a.fixed || b.fixed { 1.0 } else { 0.5 };
			if !a.fixed {
				bodies[i].x -= dx * push * share;
				bodies[i].y -= dy * push * share;
			}
			if !b.fixed {
				bodies[j].x += dx * push * share;
				bodies[j].y += dy * push * share;
			}
		}
	}
}

/// Shift free bodies so the centroid drifts toward the origin.
pub fn recenter(bodies: &mut [Body], strength: f64) {
	if bodies.is_empty() {
		return;
	}
	let n = bodies.len() as f64;
	let (cx, cy) = bodies
		.iter()
		.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x / n, sy + b.y / n));
	for b in bodies.iter_mut().filter(|b| !b.fixed) {
		b.x -= cx * strength;
		b.y -= cy * strength;
	}
}
