//! Collision detection and combat resolution
//!
//! Contacts are detected with AABB overlap, or injected by a host whose own
//! physics engine reports overlaps. Either way they resolve through
//! [`resolve_contact`].

use serde::{Deserialize, Serialize};

use super::spawn::spawn_dust_burst;
use super::state::{EntityId, ParticleKind, RunnerEvent, RunnerState};
use super::tick::add_score;
use crate::persistence::KeyValueStore;

/// Player overlap with another entity group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
    Obstacle(EntityId),
    Fire(EntityId),
    Dragon(EntityId),
}

/// What a contact did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Stale entity, inactive game, or a non-stomp dragon touch
    Ignored,
    GameOver,
    DragonHit { remaining: u8 },
    DragonDefeated,
}

/// All player overlaps this tick, in a stable order (obstacles, fire, dragons; by id)
pub fn detect_contacts(state: &RunnerState) -> Vec<Contact> {
    let player = state.player.aabb();
    let mut contacts = Vec::new();

    contacts.extend(
        state
            .obstacles
            .iter()
            .filter(|o| o.alive && player.overlaps(&o.aabb()))
            .map(|o| Contact::Obstacle(o.id)),
    );
    contacts.extend(
        state
            .particles
            .iter()
            .filter(|p| p.alive && p.kind == ParticleKind::Fire && player.overlaps(&p.aabb()))
            .map(|p| Contact::Fire(p.id)),
    );
    contacts.extend(
        state
            .dragons
            .iter()
            .filter(|d| d.alive && player.overlaps(&d.aabb()))
            .map(|d| Contact::Dragon(d.id)),
    );
    contacts
}

/// Apply one contact to the game
pub fn resolve_contact(
    state: &mut RunnerState,
    contact: Contact,
    store: &mut dyn KeyValueStore,
) -> ContactOutcome {
    if !state.game_active {
        return ContactOutcome::Ignored;
    }

    match contact {
        Contact::Obstacle(id) => {
            if state.obstacles.iter().any(|o| o.id == id && o.alive) {
                game_over(state, store);
                ContactOutcome::GameOver
            } else {
                ContactOutcome::Ignored
            }
        }
        Contact::Fire(id) => {
            let lethal = state
                .particles
                .iter()
                .any(|p| p.id == id && p.alive && p.kind == ParticleKind::Fire);
            if lethal {
                game_over(state, store);
                ContactOutcome::GameOver
            } else {
                ContactOutcome::Ignored
            }
        }
        Contact::Dragon(id) => stomp(state, id),
    }
}

/// Damage a dragon if the player is coming down on it
fn stomp(state: &mut RunnerState, id: EntityId) -> ContactOutcome {
    // Side or upward touches are not combat
    if !state.player.is_descending() {
        return ContactOutcome::Ignored;
    }

    let knockback = state.tuning.dragon_knockback;
    let (remaining, pos) = match state.dragon_mut(id) {
        Some(dragon) if dragon.alive && dragon.health > 0 => {
            dragon.health -= 1;
            if dragon.health > 0 {
                dragon.pos.x += knockback;
            }
            (dragon.health, dragon.pos)
        }
        _ => return ContactOutcome::Ignored,
    };

    // Bounce off so one landing counts once
    state.player.vel_y = state.tuning.stomp_bounce;
    state.player.grounded = false;

    if remaining == 0 {
        state.kill_dragon(id);
        let reward = state.tuning.dragon_reward;
        add_score(state, reward);
        for _ in 0..state.tuning.defeat_dust_bursts {
            spawn_dust_burst(state, pos);
        }
        state.events.push(RunnerEvent::DragonDefeated);
        log::info!("Dragon #{} defeated (+{})", id.0, reward);
        ContactOutcome::DragonDefeated
    } else {
        spawn_dust_burst(state, pos);
        state.events.push(RunnerEvent::DragonHit { remaining });
        log::debug!("Dragon #{} hit, {} health left", id.0, remaining);
        ContactOutcome::DragonHit { remaining }
    }
}

/// Freeze the run, stop its timers and persist the best score
pub fn game_over(state: &mut RunnerState, store: &mut dyn KeyValueStore) {
    if !state.game_active {
        return;
    }
    state.game_active = false;
    state.cancel_timers();

    let score = state.display_score();
    let new_record = state.highscore.submit(store, score);
    let best = state.highscore.best();
    state.events.push(RunnerEvent::GameOver {
        score,
        best,
        new_record,
    });
    log::info!("Game over: score {} (best {})", score, best);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::runner::*;
    use crate::highscores::RUNNER_HIGHSCORE_KEY;
    use crate::persistence::MemoryStore;
    use crate::sim::runner::spawn::{spawn_dragon, spawn_obstacle};
    use crate::sim::runner::state::ObstacleKind;
    use crate::tuning::RunnerTuning;

    fn level_two_with_dragon() -> (RunnerState, EntityId) {
        let mut state = RunnerState::new(21, RunnerTuning::default());
        state.score = 300.0;
        state.level = 2;
        let id = spawn_dragon(&mut state);
        (state, id)
    }

    fn descend(state: &mut RunnerState) {
        state.player.grounded = false;
        state.player.vel_y = 200.0;
    }

    #[test]
    fn test_obstacle_contact_ends_game() {
        let mut store = MemoryStore::new();
        let mut state = RunnerState::new(1, RunnerTuning::default());
        state.score = 123.7;
        let id = spawn_obstacle(&mut state, ObstacleKind::Barrel);

        let outcome = resolve_contact(&mut state, Contact::Obstacle(id), &mut store);
        assert_eq!(outcome, ContactOutcome::GameOver);
        assert!(!state.game_active);
        assert_eq!(state.pending_timers(), 0);
        assert_eq!(store.get(RUNNER_HIGHSCORE_KEY).as_deref(), Some("123"));

        // Terminal: further contacts are ignored
        assert_eq!(
            resolve_contact(&mut state, Contact::Obstacle(id), &mut store),
            ContactOutcome::Ignored
        );
    }

    #[test]
    fn test_detects_overlapping_obstacle() {
        let mut state = RunnerState::new(1, RunnerTuning::default());
        let id = spawn_obstacle(&mut state, ObstacleKind::Box);
        assert!(detect_contacts(&state).is_empty());

        state.obstacles[0].pos.x = PLAYER_X + 10.0;
        assert_eq!(detect_contacts(&state), vec![Contact::Obstacle(id)]);
    }

    #[test]
    fn test_side_touch_does_not_damage_dragon() {
        let mut store = MemoryStore::new();
        let (mut state, id) = level_two_with_dragon();

        state.player.vel_y = 0.0;
        assert_eq!(
            resolve_contact(&mut state, Contact::Dragon(id), &mut store),
            ContactOutcome::Ignored
        );
        state.player.vel_y = -300.0;
        assert_eq!(
            resolve_contact(&mut state, Contact::Dragon(id), &mut store),
            ContactOutcome::Ignored
        );
        assert_eq!(state.dragons[0].health, 3);
        assert!(state.game_active);
    }

    #[test]
    fn test_three_stomps_defeat_dragon_once() {
        let mut store = MemoryStore::new();
        let (mut state, id) = level_two_with_dragon();
        let start_score = state.score;
        let start_x = state.dragons[0].pos.x;

        descend(&mut state);
        assert_eq!(
            resolve_contact(&mut state, Contact::Dragon(id), &mut store),
            ContactOutcome::DragonHit { remaining: 2 }
        );
        assert_eq!(state.dragons[0].pos.x, start_x - 30.0);
        assert!(state.player.vel_y < 0.0);

        descend(&mut state);
        assert_eq!(
            resolve_contact(&mut state, Contact::Dragon(id), &mut store),
            ContactOutcome::DragonHit { remaining: 1 }
        );
        assert_eq!(state.score, start_score);

        descend(&mut state);
        assert_eq!(
            resolve_contact(&mut state, Contact::Dragon(id), &mut store),
            ContactOutcome::DragonDefeated
        );
        assert_eq!(state.score, start_score + 50.0);
        assert!(!state.dragons[0].alive);

        // Dead dragons cannot pay out twice
        descend(&mut state);
        assert_eq!(
            resolve_contact(&mut state, Contact::Dragon(id), &mut store),
            ContactOutcome::Ignored
        );
        assert_eq!(state.score, start_score + 50.0);
    }

    #[test]
    fn test_defeat_emits_several_dust_bursts() {
        let mut store = MemoryStore::new();
        let (mut state, id) = level_two_with_dragon();
        state.dragons[0].health = 1;

        descend(&mut state);
        resolve_contact(&mut state, Contact::Dragon(id), &mut store);
        let dust = state
            .particles
            .iter()
            .filter(|p| p.kind == ParticleKind::Dust)
            .count() as u32;
        let t = &state.tuning;
        assert_eq!(dust, t.defeat_dust_bursts * t.dust_particles_per_burst);
    }

    #[test]
    fn test_game_over_keeps_higher_stored_best() {
        let mut store = MemoryStore::new();
        store.set(RUNNER_HIGHSCORE_KEY, "900").unwrap();
        let mut state = RunnerState::new(1, RunnerTuning::default());
        state.load_highscore(&store);
        state.score = 40.0;

        game_over(&mut state, &mut store);
        assert_eq!(store.get(RUNNER_HIGHSCORE_KEY).as_deref(), Some("900"));
        assert_eq!(
            state.drain_events().last(),
            Some(&RunnerEvent::GameOver {
                score: 40,
                best: 900,
                new_record: false
            })
        );
    }
}
