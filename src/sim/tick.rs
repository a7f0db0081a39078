//! Per-frame simulation step
//!
//! Advances objects and particles by one frame, then prunes whatever left
//! the play area or burned out. Touches nothing but the two collections.

use super::state::{GameObject, GameState, Particle, PlayArea};

/// Advance the world by one animation frame
pub fn tick(state: &mut GameState, area: PlayArea, particle_decay: f32) {
    state.frames += 1;
    state.objects = advance_objects(std::mem::take(&mut state.objects), area);
    state.particles = advance_particles(std::mem::take(&mut state.particles), particle_decay);
}

/// Move every object by its velocity, dropping those fully outside `area`
pub fn advance_objects(objects: Vec<GameObject>, area: PlayArea) -> Vec<GameObject> {
    objects
        .into_iter()
        .map(|mut obj| {
            obj.pos += obj.vel;
            obj
        })
        .filter(|obj| area.contains(obj.pos, obj.size))
        .collect()
}

/// Move, age and shrink every particle, dropping the dead ones
pub fn advance_particles(particles: Vec<Particle>, decay: f32) -> Vec<Particle> {
    particles
        .into_iter()
        .map(|mut p| {
            p.pos += p.vel;
            p.life = p.life.saturating_sub(1);
            p.size = (p.size * decay).max(0.0);
            p
        })
        .filter(|p| p.life > 0)
        .collect()
}
