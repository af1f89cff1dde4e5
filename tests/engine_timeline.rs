//! End-to-end timelines against a manual clock

use approx::assert_relative_eq;
use gesture_score::composition::NoteEvent;
use gesture_score::engine::offline::bounce;
use gesture_score::engine::{Engine, ManualClock, NoteLog};
use gesture_score::performer::PerformerSnapshot;
use gesture_score::sequencing::harmony::default_progression;
use gesture_score::voices::Role;
use gesture_score::{EngineConfig, EngineError};

const STEP: f64 = 0.125;

fn config() -> EngineConfig {
    EngineConfig::default()
        .bpm(120.0)
        .root(73.42)
        .progression(default_progression(), 4)
}

fn step_of(note: &NoteEvent) -> u64 {
    (note.start_time / STEP).round() as u64 % 16
}

fn performer(id: u32) -> PerformerSnapshot {
    PerformerSnapshot::new(id, 0.6, 0.0, 0.3)
}

#[test]
fn test_lone_performer_intro_then_main() {
    let notes = bounce(config(), 17.0, |_| vec![performer(0)]).expect("bounce");

    let intro: Vec<_> = notes.iter().filter(|n| n.start_time < 8.0).collect();
    assert_eq!(intro.len(), 4, "one downbeat per bar");
    for note in &intro {
        assert_eq!(note.role, Role::Bass);
        assert_eq!(step_of(note), 0);
        assert_relative_eq!(note.frequency_hz, 73.42, epsilon = 1e-3);
    }

    // Main: root on 1 and 3, fifths before each
    let main: Vec<_> = notes
        .iter()
        .filter(|n| n.start_time >= 8.5 && n.start_time < 16.0)
        .collect();
    assert!(main.iter().all(|n| n.role == Role::Bass));
    assert!(main.iter().any(|n| step_of(n) == 6));
    assert!(main.iter().any(|n| step_of(n) == 14));
    assert!(main.iter().all(|n| [0, 6, 8, 14].contains(&step_of(n))));
}

#[test]
fn test_chords_change_on_bar_boundaries() {
    let notes = bounce(config(), 17.0, |_| vec![performer(0)]).expect("bounce");
    let downbeat = |t: f64| {
        notes
            .iter()
            .find(|n| (n.start_time - t).abs() < 1e-9)
            .map(|n| n.frequency_hz)
    };

    // Bars 0-3: Dm in root position
    assert_relative_eq!(downbeat(0.0).unwrap_or(0.0), 73.42, epsilon = 1e-3);
    assert_relative_eq!(downbeat(6.0).unwrap_or(0.0), 73.42, epsilon = 1e-3);
    // Bar 8 starts the third chord, F, in root position
    let f = 73.42 * 2f32.powf(3.0 / 12.0);
    assert_relative_eq!(downbeat(16.0).unwrap_or(0.0), f, epsilon = 1e-3);
}

#[test]
fn test_two_performers_bring_kick_to_point_four() {
    let clock = ManualClock::new();
    let mut engine = Engine::start(config(), clock.clone(), NoteLog::new()).expect("engine starts");

    let mut n = 0u64;
    while clock_time(n) <= 20.0 {
        clock.set(clock_time(n));
        engine.update_performers(&[performer(0), performer(1)]);
        engine.poll();
        n += 1;
    }

    assert_relative_eq!(engine.kick_level(), 0.4, epsilon = 1e-3);

    let kicks: Vec<_> = engine
        .instrument()
        .notes()
        .iter()
        .filter(|n| n.role == Role::Kick)
        .collect();
    assert!(!kicks.is_empty());
    assert!(kicks.iter().all(|n| n.performer_id.is_none()));
    assert!(kicks.iter().all(|n| step_of(n) % 4 == 0));
    let last = kicks.last().map(|n| n.velocity).unwrap_or(0.0);
    assert_relative_eq!(last, 0.4, epsilon = 1e-3);
}

fn clock_time(n: u64) -> f64 {
    n as f64 * 0.025
}

#[test]
fn test_departure_fades_out_then_silence() {
    let notes = bounce(config(), 30.0, |t| {
        if t < 12.0 {
            vec![performer(0)]
        } else {
            vec![]
        }
    })
    .expect("bounce");

    // Grace ends near 14 s, outro lasts 4 s
    let outro: Vec<_> = notes
        .iter()
        .filter(|n| n.start_time > 14.2 && n.start_time < 17.9)
        .collect();
    assert!(!outro.is_empty());
    assert!(outro.iter().all(|n| [0, 8].contains(&step_of(n))));

    let main_velocity = notes
        .iter()
        .find(|n| n.start_time > 9.0)
        .map(|n| n.velocity)
        .unwrap_or(0.0);
    assert_relative_eq!(outro[0].velocity, main_velocity * 0.5, epsilon = 1e-5);

    assert!(notes.iter().all(|n| n.start_time < 18.3));
}

#[test]
fn test_unavailable_clock_is_an_error() {
    let result = Engine::start(config(), ManualClock::unavailable(), NoteLog::new());
    assert!(matches!(result, Err(EngineError::ClockUnavailable(_))));
}
