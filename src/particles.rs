use std::f32::consts::TAU;
use std::time::Duration;

use crate::Cell;
use crate::grid::Grid;

use rand::Rng;

const BURST_SIZE: usize = 10;
/// Cells per second squared.
const GRAVITY: f32 = 6.0;
/// Fraction of horizontal speed lost per second.
const DRAG: f32 = 1.2;
const UPWARD_KICK: f32 = 2.0;

pub struct Particle {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    age: f32,
    lifetime: f32,
}

impl Particle {
    /// Board cell the particle is over, if it is on the board at all.
    pub fn cell(&self, grid: &Grid) -> Option<Cell> {
        let cell = (self.x.round() as i32, self.y.round() as i32);
        grid.contains(cell).then(|| cell)
    }

    /// 1.0 when fresh, falling to 0.0 at the end of its life.
    pub fn strength(&self) -> f32 {
        (1.0 - self.age / self.lifetime).max(0.0)
    }
}

/// Short-lived sparks thrown off when the snake eats.
#[derive(Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        ParticleSystem { particles: Vec::new() }
    }

    pub fn burst<R: Rng + ?Sized>(&mut self, at: Cell, rng: &mut R) {
        for _ in 0..BURST_SIZE {
            let angle = rng.gen_range(0.0..TAU);
            let speed = rng.gen_range(2.0..5.0);
            self.particles.push(Particle {
                x: at.0 as f32,
                y: at.1 as f32,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed - UPWARD_KICK,
                age: 0.0,
                lifetime: rng.gen_range(0.8..1.2),
            });
        }
    }

    pub fn update(&mut self, dt: Duration) {
        let dt = dt.as_secs_f32();

        for p in self.particles.iter_mut() {
            p.age += dt;
            p.vx *= (1.0 - DRAG * dt).max(0.0);
            p.vy += GRAVITY * dt;
            p.x += p.vx * dt;
            p.y += p.vy * dt;
        }

        self.particles.retain(|p| p.age < p.lifetime);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
