//! Session controller tests.
//!
//! Covers: snapshot round trip, empty-store loads, save priority,
//! command-before-action ordering, state transitions, fatal engine errors,
//! the display-driven run loop and episode counters across a load.

mod support;

use procgen_core::{
    command::SessionCommand,
    display::ScriptedDisplay,
    error::{InteractiveError, SessionError},
    factory::{ChannelKeys, DisplayGeometry, VisionMode},
    input::{InputBatch, Key},
    session::{Session, SessionState},
};
use support::{init_logging, CounterEnv, LEFT, RIGHT};

fn running(env: CounterEnv) -> Session<CounterEnv> {
    init_logging();
    let geometry = DisplayGeometry { width: 12, height: 12 };
    let mut session = Session::new(env, ChannelKeys::for_vision(VisionMode::Agent), geometry, false);
    session.start().unwrap();
    session
}

fn position(session: &Session<CounterEnv>) -> i64 {
    session.env().expect("session still running").position
}

fn idle() -> InputBatch {
    InputBatch::new(1.0 / 15.0)
}

fn right() -> InputBatch {
    idle().press(Key::Right)
}

fn save() -> InputBatch {
    idle().press(Key::LeftShift).click(Key::F1)
}

fn load() -> InputBatch {
    idle().click(Key::F1)
}

#[test]
fn save_then_load_restores_saved_state() {
    let mut session = running(CounterEnv::new(1, 1));
    for _ in 0..3 {
        session.tick(&right()).unwrap();
    }
    assert_eq!(position(&session), 3);

    session.tick(&save()).unwrap();
    session.tick(&right()).unwrap();
    session.tick(&right()).unwrap();
    assert_eq!(position(&session), 5);

    let outcome = session.tick(&load()).unwrap();
    assert_eq!(outcome.command, Some(SessionCommand::LoadState));
    assert_eq!(position(&session), 3);
    assert_eq!(session.summary().loads, 1);
}

#[test]
fn repeated_loads_restore_the_same_snapshot() {
    let mut session = running(CounterEnv::new(1, 1));
    session.tick(&right()).unwrap();
    session.tick(&save()).unwrap();

    for _ in 0..3 {
        session.tick(&right()).unwrap();
        session.tick(&load()).unwrap();
        assert_eq!(position(&session), 1);
        assert!(!session.snapshots().is_empty());
    }
}

#[test]
fn load_with_nothing_saved_is_a_noop() {
    let mut session = running(CounterEnv::new(1, 1));
    session.tick(&right()).unwrap();
    session.tick(&right()).unwrap();

    let outcome = session.tick(&load()).unwrap();
    assert_eq!(outcome.command, Some(SessionCommand::LoadState));
    assert_eq!(position(&session), 2);
    assert!(session.snapshots().is_empty());
    assert_eq!(session.summary().ignored_loads, 1);
    assert_eq!(session.state(), SessionState::Running);
}

#[test]
fn save_takes_priority_over_load_in_the_same_tick() {
    let mut session = running(CounterEnv::new(1, 1));
    session.tick(&save()).unwrap(); // slot holds position 0
    session.tick(&right()).unwrap();
    session.tick(&right()).unwrap();

    // Modifier held and snapshot key clicked: a load would also match F1.
    let outcome = session.tick(&save()).unwrap();
    assert_eq!(outcome.command, Some(SessionCommand::SaveState));
    assert_eq!(position(&session), 2, "state must not be restored");

    let saved = session.snapshots().load().expect("snapshot present");
    assert_eq!(saved.state, serde_json::to_vec(&2i64).unwrap());
}

#[test]
fn save_captures_state_before_the_ticks_action() {
    let mut session = running(CounterEnv::new(1, 1));
    session.tick(&right()).unwrap();

    session.tick(&save().press(Key::Right)).unwrap();
    assert_eq!(position(&session), 2);

    session.tick(&load()).unwrap();
    assert_eq!(position(&session), 1);
}

#[test]
fn load_lands_before_the_ticks_action() {
    let mut session = running(CounterEnv::new(1, 1));
    session.tick(&save()).unwrap();
    session.tick(&right()).unwrap();
    session.tick(&right()).unwrap();

    let outcome = session.tick(&load().press(Key::Left)).unwrap();
    assert_eq!(outcome.action, LEFT);
    assert_eq!(position(&session), -1);
}

#[test]
fn command_keys_are_not_forwarded_as_actions() {
    let mut session = running(CounterEnv::new(1, 1));
    let outcome = session.tick(&save()).unwrap();
    assert_eq!(outcome.action, 4, "snapshot keys should map to the no-op action");

    let outcome = session.tick(&right()).unwrap();
    assert_eq!(outcome.action, RIGHT);
}

#[test]
fn every_tick_steps_exactly_once() {
    let mut session = running(CounterEnv::new(1, 1));
    let batches = [idle(), save(), load(), right()];
    for (i, batch) in batches.iter().enumerate() {
        let outcome = session.tick(batch).unwrap();
        assert_eq!(outcome.step, i as u64 + 1);
        assert_eq!(outcome.tick, i as u64 + 1);
    }
}

#[test]
fn transitions_are_enforced() {
    init_logging();
    let geometry = DisplayGeometry { width: 12, height: 12 };
    let keys = ChannelKeys::for_vision(VisionMode::Agent);
    let mut session = Session::new(CounterEnv::new(1, 1), keys, geometry, false);
    assert_eq!(session.state(), SessionState::Ready);

    let err = session.tick(&idle()).unwrap_err();
    assert!(matches!(
        err,
        InteractiveError::Session(SessionError::InvalidTransition { state: SessionState::Ready, .. })
    ));

    session.start().unwrap();
    assert!(session.start().is_err());

    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.env().is_none(), "engine must be released on stop");
    assert!(session.tick(&idle()).is_err());

    session.stop(); // idempotent
    assert_eq!(session.state(), SessionState::Stopped);
}

#[test]
fn engine_failure_is_fatal_and_propagates() {
    let mut session = running(CounterEnv::new(1, 1).failing_at(2));
    session.tick(&right()).unwrap();

    let err = session.tick(&right()).unwrap_err();
    assert!(matches!(err, InteractiveError::Env(_)), "got {err:?}");
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.env().is_none());
}

#[test]
fn agent_mode_shows_the_raw_observation() {
    let mut session = running(CounterEnv::new(3, 5));
    let outcome = session.tick(&right()).unwrap();
    assert_eq!((outcome.frame.height, outcome.frame.width), (3, 5));
    assert_eq!(outcome.frame.pixels[0], 1);
}

#[test]
fn run_loops_until_the_display_closes() {
    init_logging();
    let geometry = DisplayGeometry { width: 24, height: 36 };
    let keys = ChannelKeys::for_vision(VisionMode::Human);
    let mut session = Session::new(CounterEnv::new(3, 2), keys, geometry, false);
    let mut display = ScriptedDisplay::new([right(), save(), right(), load()]);

    let summary = session.run(&mut display).unwrap();

    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.saves, 1);
    assert_eq!(summary.loads, 1);
    assert_eq!(session.state(), SessionState::Stopped);

    // Initial frame plus one per tick, all from the info channel.
    assert_eq!(display.shown.len(), 5);
    for (frame, shown_geometry) in &display.shown {
        assert_eq!((frame.height, frame.width), (6, 4));
        assert_eq!(*shown_geometry, geometry);
    }
}

#[test]
fn run_stops_the_session_when_the_engine_fails() {
    init_logging();
    let geometry = DisplayGeometry { width: 12, height: 12 };
    let keys = ChannelKeys::for_vision(VisionMode::Agent);
    let mut session = Session::new(CounterEnv::new(1, 1).failing_at(3), keys, geometry, false);
    let mut display = ScriptedDisplay::new([right(), right(), right(), right()]);

    assert!(session.run(&mut display).is_err());
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(display.shown.len(), 3, "no frame is presented for the failed tick");
}

#[test]
fn episode_ends_are_counted_with_their_return() {
    let mut session = running(CounterEnv::new(1, 1).with_episode_length(2));
    let done: Vec<bool> = (0..5).map(|_| session.tick(&right()).unwrap().episode_done).collect();

    assert_eq!(done, vec![false, true, false, true, false]);
    assert_eq!(session.summary().episodes_completed, 2);
    assert_eq!(session.summary().last_episode_return, Some(1.0));
}

#[test]
fn load_rewinds_the_running_episode_counters() {
    let mut session = running(CounterEnv::new(1, 1).with_episode_length(3));
    session.tick(&right()).unwrap();
    session.tick(&save()).unwrap();
    assert!(session.tick(&right()).unwrap().episode_done);
    assert_eq!(session.summary().last_episode_length, Some(3));

    // Back to one step into the episode; the steps played since the save
    // no longer count toward it.
    session.tick(&load()).unwrap();
    session.tick(&right()).unwrap();
    assert!(session.tick(&right()).unwrap().episode_done);
    assert_eq!(session.summary().episodes_completed, 2);
    assert_eq!(session.summary().last_episode_length, Some(4));
    assert_eq!(session.summary().last_episode_return, Some(1.0));
}

#[test]
fn modifier_and_snapshot_key_clicked_in_one_json_batch_saves() {
    let mut session = running(CounterEnv::new(1, 1));
    session.tick(&right()).unwrap();
    let batch: InputBatch =
        serde_json::from_str(r#"{"dt":0.066,"clicked":["LEFT_SHIFT","F1"]}"#).unwrap();

    let outcome = session.tick(&batch).unwrap();
    assert_eq!(outcome.command, Some(SessionCommand::SaveState));
    assert_eq!(session.summary().saves, 1);
    assert_eq!(session.summary().loads + session.summary().ignored_loads, 0);
}

#[test]
fn snapshot_slot_survives_stop() {
    let mut session = running(CounterEnv::new(1, 1));
    session.tick(&right()).unwrap();
    session.tick(&save()).unwrap();
    session.stop();

    assert!(session.env().is_none());
    let saved = session.snapshots().load().expect("slot kept after stop");
    assert_eq!(saved.taken_at, 1);
    assert_eq!(saved.episode_steps, 1);
}
