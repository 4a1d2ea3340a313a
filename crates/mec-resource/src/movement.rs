//! Movement models.
//!
//! The simulation only ever reads a user's position and asks it to advance;
//! it never interprets how the position was produced.  Everything that
//! satisfies [`MovementModel`] can drive a user, including adapters over
//! recorded mobility traces.

use mec_core::{Aabb2, UserRng, Vec2};

use crate::{ResourceError, ResourceResult};

/// Position source for one user.
pub trait MovementModel: Send {
    /// Current position.
    fn position(&self) -> Vec2;

    /// Advance by `dt` simulated seconds.
    fn step(&mut self, dt: f64);
}

// ── StaticMovement ────────────────────────────────────────────────────────────

/// Never moves.
#[derive(Copy, Clone, Debug)]
pub struct StaticMovement(pub Vec2);

impl MovementModel for StaticMovement {
    fn position(&self) -> Vec2 {
        self.0
    }

    fn step(&mut self, _dt: f64) {}
}

// ── LinearMovement ────────────────────────────────────────────────────────────

/// Random-waypoint movement: head straight for a random destination inside
/// `area` at `speed` units/s, then pick a new one.
pub struct LinearMovement {
    pos:         Vec2,
    destination: Vec2,
    speed:       f64,
    area:        Aabb2,
    rng:         UserRng,
}

impl LinearMovement {
    pub fn new(initial: Vec2, speed: f64, area: Aabb2, mut rng: UserRng) -> Self {
        let destination = random_point(&mut rng, &area);
        Self { pos: initial, destination, speed, area, rng }
    }

    pub fn destination(&self) -> Vec2 {
        self.destination
    }
}

impl MovementModel for LinearMovement {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn step(&mut self, dt: f64) {
        let travel = self.speed * dt;
        let to_dest = self.destination - self.pos;
        let dist = to_dest.length();
        if dist <= travel {
            self.pos = self.destination;
            self.destination = random_point(&mut self.rng, &self.area);
        } else {
            self.pos = self.pos + to_dest * (travel / dist);
        }
    }
}

// ── BrownianMovement ──────────────────────────────────────────────────────────

/// Uniform random displacement of up to `speed * dt` per axis, wrapped back
/// into `area`.
pub struct BrownianMovement {
    pos:   Vec2,
    speed: f64,
    area:  Aabb2,
    rng:   UserRng,
}

impl BrownianMovement {
    pub fn new(initial: Vec2, speed: f64, area: Aabb2, rng: UserRng) -> Self {
        Self { pos: area.wrap(initial), speed, area, rng }
    }
}

impl MovementModel for BrownianMovement {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn step(&mut self, dt: f64) {
        let reach = self.speed * dt;
        let dx = self.rng.uniform(-reach, reach);
        let dy = self.rng.uniform(-reach, reach);
        self.pos = self.area.wrap(self.pos + Vec2::new(dx, dy));
    }
}

// ── TraceMovement ─────────────────────────────────────────────────────────────

/// Replays a fixed list of positions, one per step, then stays on the last.
#[derive(Clone, Debug)]
pub struct TraceMovement {
    points: Vec<Vec2>,
    cursor: usize,
}

impl TraceMovement {
    pub fn new(points: Vec<Vec2>) -> ResourceResult<Self> {
        if points.is_empty() {
            return Err(ResourceError::EmptyTrace);
        }
        Ok(Self { points, cursor: 0 })
    }

    /// `true` once the last position has been reached.
    pub fn finished(&self) -> bool {
        self.cursor + 1 >= self.points.len()
    }
}

impl MovementModel for TraceMovement {
    fn position(&self) -> Vec2 {
        self.points[self.cursor]
    }

    fn step(&mut self, _dt: f64) {
        if !self.finished() {
            self.cursor += 1;
        }
    }
}

// ── MovementKind ──────────────────────────────────────────────────────────────

/// Movement model selector for randomly spawned populations.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovementKind {
    Static,
    Linear { speed: f64 },
    Brownian { speed: f64 },
}

impl MovementKind {
    /// Instantiate the model at `initial`, confined to `area`.
    pub fn build(self, initial: Vec2, area: Aabb2, rng: UserRng) -> Box<dyn MovementModel> {
        match self {
            MovementKind::Static            => Box::new(StaticMovement(initial)),
            MovementKind::Linear { speed }   => Box::new(LinearMovement::new(initial, speed, area, rng)),
            MovementKind::Brownian { speed } => Box::new(BrownianMovement::new(initial, speed, area, rng)),
        }
    }
}

fn random_point(rng: &mut UserRng, area: &Aabb2) -> Vec2 {
    Vec2::new(rng.uniform(area.min.x, area.max.x), rng.uniform(area.min.y, area.max.y))
}
