//! Object spawning and particle bursts

use glam::Vec2;
use rand::Rng;

use super::state::{GameObject, GameState, Particle, PlayArea};
use crate::tuning::Tuning;

/// Spawn one object at the bottom edge of the play area.
///
/// Returns the new object's id, or `None` when the area has not been laid
/// out yet (a zero-sized area would produce degenerate positions).
pub fn spawn_object(
    state: &mut GameState,
    area: PlayArea,
    difficulty: u32,
    tuning: &Tuning,
) -> Option<u32> {
    if !area.is_laid_out() {
        log::debug!("Play area not laid out, skipping spawn");
        return None;
    }

    let tier = difficulty.max(1) as f32;
    let rng = &mut state.rng;

    let size = rng.random_range(tuning.min_object_size..=tuning.max_object_size);
    // Keep the whole box inside the width; a too-narrow area pins it to x = 0
    let x = rng.random_range(0.0..=(area.width - size).max(0.0));
    let vx = (rng.random::<f32>() - 0.5) * tuning.horizontal_speed_spread * tier;
    let vy = -rng.random_range(tuning.min_rise_speed..=tuning.max_rise_speed) * tier;
    let color = pick_color(rng, &tuning.colors);

    let id = state.next_entity_id();
    state.objects.push(GameObject {
        id,
        pos: Vec2::new(x, area.height),
        vel: Vec2::new(vx, vy),
        size,
        color,
    });
    Some(id)
}

/// Emit a burst of particles centred on `at`
pub fn burst(state: &mut GameState, at: Vec2, color: &str, tuning: &Tuning) {
    let speed = tuning.particle_speed;
    let rng = &mut state.rng;
    state.particles.extend((0..tuning.burst_particles).map(|_| Particle {
        pos: at,
        vel: Vec2::new(
            (rng.random::<f32>() - 0.5) * speed,
            (rng.random::<f32>() - 0.5) * speed,
        ),
        size: rng.random_range(tuning.min_particle_size..=tuning.max_particle_size),
        color: color.to_string(),
        life: tuning.particle_life,
    }));
}

fn pick_color(rng: &mut impl Rng, colors: &[String]) -> String {
    if colors.is_empty() {
        return String::new();
    }
    colors[rng.random_range(0..colors.len())].clone()
}
