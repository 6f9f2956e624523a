use rand::seq::SliceRandom;
use rand::Rng;

const GRAVITY: f64 = 12.0;
const DURATION_SECS: f64 = 3.0;
const SPARKS: usize = 30;
const SPARK_SYMBOLS: [char; 6] = ['*', '+', 'o', '.', '\u{2726}', '\u{2605}'];
const BANNERS: [&str; 4] = ["NEW RECORD!", "PERSONAL BEST!", "BEAST MODE!", "UNSTOPPABLE!"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    /// Falls under gravity and fades out.
    Spark,
    /// Flies to its slot in the banner and stays there.
    Letter { target_x: i32, target_y: i32 },
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    pub kind: ParticleKind,
}

impl Particle {
    fn spark<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-4.0..4.0),
            vel_y: rng.gen_range(-6.0..-1.0),
            symbol: *SPARK_SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..6),
            age: 0.0,
            max_age: rng.gen_range(1.5..DURATION_SECS),
            kind: ParticleKind::Spark,
        }
    }

    fn letter(x: f64, y: f64, target_x: i32, target_y: i32, symbol: char, color: usize) -> Self {
        Self {
            x,
            y,
            vel_x: target_x as f64 - x,
            vel_y: target_y as f64 - y,
            symbol,
            color_index: color,
            age: 0.0,
            max_age: DURATION_SECS,
            kind: ParticleKind::Letter { target_x, target_y },
        }
    }

    /// Returns false once the particle has expired.
    fn update(&mut self, dt: f64) -> bool {
        match self.kind {
            ParticleKind::Letter { target_x, target_y } => {
                let (tx, ty) = (target_x as f64, target_y as f64);
                if ((tx - self.x).powi(2) + (ty - self.y).powi(2)).sqrt() > 0.5 {
                    self.x += self.vel_x * dt * 2.0;
                    self.y += self.vel_y * dt * 2.0;
                    self.vel_x = tx - self.x;
                    self.vel_y = ty - self.y;
                } else {
                    self.x = tx;
                    self.y = ty;
                }
            }
            ParticleKind::Spark => {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_y += GRAVITY * dt;
            }
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// Fireworks shown over the game over screen when a new high score is set.
#[derive(Debug, Default)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    pub banner: String,
    elapsed: f64,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.particles.is_empty()
    }

    pub fn start(&mut self, width: u16, height: u16) {
        let mut rng = rand::thread_rng();
        self.particles.clear();
        self.elapsed = 0.0;
        self.width = width as f64;
        self.height = height as f64;
        self.banner = BANNERS.choose(&mut rng).unwrap_or(&BANNERS[0]).to_string();

        let cx = self.width / 2.0;
        let cy = self.height / 2.0;
        let left = (cx - self.banner.chars().count() as f64 / 2.0).round() as i32;
        let row = (cy - 3.0).max(0.0) as i32;
        let color = rng.gen_range(0..6);

        for (i, ch) in self.banner.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let sx = cx + rng.gen_range(-12.0..12.0);
            let sy = cy + rng.gen_range(-4.0..4.0);
            self.particles
                .push(Particle::letter(sx, sy, left + i as i32, row, ch, color));
        }

        for _ in 0..SPARKS {
            let sx = cx + rng.gen_range(-20.0..20.0);
            let sy = cy + rng.gen_range(-6.0..6.0);
            self.particles.push(Particle::spark(sx, sy, &mut rng));
        }
    }

    /// Step the animation by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        if !self.is_active() {
            return;
        }

        self.elapsed += dt;
        if self.elapsed >= DURATION_SECS {
            self.particles.clear();
            return;
        }

        let (w, h) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            let alive = p.update(dt);
            match p.kind {
                ParticleKind::Letter { .. } => alive,
                ParticleKind::Spark => alive && p.y < h + 2.0 && p.x > -2.0 && p.x < w + 2.0,
            }
        });
    }

    pub fn stop(&mut self) {
        self.particles.clear();
    }
}
