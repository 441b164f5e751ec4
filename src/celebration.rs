use rand::seq::SliceRandom;
use rand::Rng;
use std::time::SystemTime;

const SYMBOLS: [char; 6] = ['*', '+', 'o', '.', 'x', '~'];
const GRAVITY: f64 = 12.0;

/// Single piece of confetti with toy physics.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    vel_x: f64,
    vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    age: f64,
    max_age: f64,
}

impl Particle {
    fn new(x: f64, y: f64) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            x,
            y,
            vel_x: rng.gen_range(-6.0..6.0),
            vel_y: rng.gen_range(-9.0..-3.0),
            symbol: *SYMBOLS.choose(&mut rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..6),
            age: 0.0,
            max_age: rng.gen_range(1.5..3.0),
        }
    }

    /// Advance by `dt` seconds; false once the particle expires.
    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += GRAVITY * dt;
        self.age += dt;
        self.age < self.max_age
    }
}

/// Confetti burst shown once when a fresh score lands on the board.
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    pub is_active: bool,
    last_update: SystemTime,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            is_active: false,
            last_update: SystemTime::now(),
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16) {
        self.width = f64::from(width.max(1));
        self.height = f64::from(height.max(1));
        self.last_update = SystemTime::now();
        self.particles.clear();

        let mut rng = rand::thread_rng();
        for _ in 0..120 {
            let x = rng.gen_range(0.0..self.width);
            let y = rng.gen_range(self.height * 0.5..self.height);
            self.particles.push(Particle::new(x, y));
        }
        self.is_active = true;
    }

    /// Advance the animation on each tick; deactivates itself when the
    /// last particle dies.
    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }
        let now = SystemTime::now();
        let dt = now
            .duration_since(self.last_update)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
            .min(0.1);
        self.last_update = now;

        self.particles.retain_mut(|p| p.update(dt));
        if self.particles.is_empty() {
            self.is_active = false;
        }
    }

    /// Particles currently inside the drawable area.
    pub fn visible(&self, width: u16, height: u16) -> impl Iterator<Item = &Particle> {
        let (w, h) = (f64::from(width), f64::from(height));
        self.particles
            .iter()
            .filter(move |p| p.x >= 0.0 && p.x < w && p.y >= 0.0 && p.y < h)
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
