//! Behavior of the recording session state machine, driven tick by tick.

use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use sysrecord::commands::SessionHandle;
use sysrecord::session::test_utils::{ManualClock, ManualTicker, TickerCall};
use sysrecord::session::{
    controller::TickOutcome, RecordingInterval, SessionController, SessionError, TIMESTAMP_FORMAT,
};
use sysrecord::{Clock, Sample, SessionState};
use tokio::sync::watch;

mod helpers;
use helpers::{
    mock_sampler::FixedSampler,
    mock_store::MemoryStore,
    recording_observer::{ObservedEvent, RecordingObserver},
};

struct Harness {
    controller: SessionController,
    clock: ManualClock,
    ticker: ManualTicker,
    store: MemoryStore,
    observer: RecordingObserver,
    sampler: FixedSampler,
}

fn harness() -> Harness {
    harness_with_store(MemoryStore::new())
}

fn harness_with_store(store: MemoryStore) -> Harness {
    let clock = ManualClock::at_fixed_start();
    let ticker = ManualTicker::new();
    let observer = RecordingObserver::new();
    let sampler = FixedSampler::new(Sample::new(10.0, 20.0, 30.0));
    let controller = SessionController::new(
        Box::new(sampler.clone()),
        Box::new(store.clone()),
        Arc::new(observer.clone()),
        RecordingInterval::from_secs(1).unwrap(),
    )
    .with_clock(Box::new(clock.clone()))
    .with_ticker(Box::new(ticker.clone()));
    Harness {
        controller,
        clock,
        ticker,
        store,
        observer,
        sampler,
    }
}

#[test]
fn test_start_enters_recording_with_zero_elapsed() {
    for secs in [1u64, 2, 5, 60, 3600] {
        let mut h = harness();
        let interval = h.controller.start(&secs.to_string()).unwrap();

        assert_eq!(interval.as_secs(), secs);
        assert_eq!(h.controller.state(), SessionState::Recording);
        assert_eq!(h.controller.elapsed_seconds(), 0);
        assert_eq!(h.controller.started_at(), Some(h.clock.now()));
        assert_eq!(h.controller.ticker_period(), Some(Duration::from_secs(secs)));
        assert_eq!(h.ticker.calls(), vec![TickerCall::Start(Duration::from_secs(secs))]);
    }
}

#[test]
fn test_start_publishes_state_and_zero_elapsed() {
    let mut h = harness();
    h.controller.start("2").unwrap();
    assert_eq!(
        h.observer.events(),
        vec![
            ObservedEvent::State(SessionState::Recording),
            ObservedEvent::Elapsed(0)
        ]
    );
}

#[test]
fn test_stop_resets_to_idle_from_any_state() {
    // From idle.
    let mut h = harness();
    h.controller.stop();
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.controller.elapsed_seconds(), 0);

    // From a session that has accumulated elapsed time.
    let mut h = harness();
    h.controller.start("1").unwrap();
    h.clock.advance(Duration::from_secs(7));
    h.controller.on_tick();
    assert_eq!(h.controller.elapsed_seconds(), 7);

    h.controller.stop();
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.controller.elapsed_seconds(), 0);
    assert_eq!(h.controller.started_at(), None);
    assert_eq!(h.controller.ticker_period(), None);
    assert_eq!(h.observer.elapsed_updates().last(), Some(&0));
}

#[test]
fn test_stop_twice_matches_stop_once() {
    let mut h = harness();
    h.controller.start("1").unwrap();
    h.controller.stop();
    let once = (h.controller.status(), h.ticker.calls(), h.observer.events());

    h.controller.stop();
    let twice = (h.controller.status(), h.ticker.calls(), h.observer.events());
    assert_eq!(once, twice);
}

#[test]
fn test_start_while_recording_restarts_at_new_interval() {
    let mut h = harness();
    h.controller.start("5").unwrap();
    h.clock.advance(Duration::from_secs(12));
    h.controller.on_tick();
    assert_eq!(h.controller.elapsed_seconds(), 12);

    h.controller.start("10").unwrap();
    assert_eq!(h.controller.state(), SessionState::Recording);
    assert_eq!(h.controller.elapsed_seconds(), 0);
    assert_eq!(h.controller.started_at(), Some(h.clock.now()));
    assert_eq!(h.controller.ticker_period(), Some(Duration::from_secs(10)));
    assert_eq!(h.controller.status().interval_seconds, Some(10));
    assert_eq!(
        h.ticker.calls(),
        vec![
            TickerCall::Start(Duration::from_secs(5)),
            TickerCall::Start(Duration::from_secs(10)),
        ]
    );

    // Elapsed time now counts from the restart.
    h.clock.advance(Duration::from_secs(10));
    h.controller.on_tick();
    assert_eq!(h.controller.elapsed_seconds(), 10);
}

#[test]
fn test_invalid_interval_leaves_controller_idle() {
    for input in ["0", "-1", "abc", "", "86401", "9223372036854775807"] {
        let mut h = harness();
        let err = h.controller.start(input).unwrap_err();
        assert!(
            matches!(err, SessionError::InvalidInterval { .. }),
            "unexpected error for {:?}: {:?}",
            input,
            err
        );
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(h.controller.ticker_period(), None);
        assert!(h.ticker.calls().is_empty(), "no ticker for {:?}", input);
        assert!(h.observer.events().is_empty());
    }
}

#[test]
fn test_invalid_interval_does_not_disturb_running_session() {
    let mut h = harness();
    h.controller.start("3").unwrap();
    h.clock.advance(Duration::from_secs(4));
    h.controller.on_tick();

    assert!(h.controller.start("abc").is_err());
    assert_eq!(h.controller.state(), SessionState::Recording);
    assert_eq!(h.controller.elapsed_seconds(), 4);
    assert_eq!(h.controller.ticker_period(), Some(Duration::from_secs(3)));
}

#[test]
fn test_five_ticks_persist_five_rows_with_increasing_timestamps() {
    let mut h = harness();
    h.controller.start("1").unwrap();
    for _ in 0..5 {
        h.clock.advance(Duration::from_secs(1));
        assert_eq!(h.controller.on_tick(), TickOutcome::Recorded);
    }

    let rows = h.store.rows();
    assert_eq!(rows.len(), 5);
    let times: Vec<NaiveDateTime> = rows
        .iter()
        .map(|(ts, _)| NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).unwrap())
        .collect();
    assert!(times.windows(2).all(|w| w[0] < w[1]), "{:?}", rows);
    assert!(rows
        .iter()
        .all(|(_, sample)| *sample == Sample::new(10.0, 20.0, 30.0)));
    assert_eq!(h.observer.elapsed_updates(), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_timestamps_use_day_month_year_layout() {
    let mut h = harness();
    h.controller.start("1").unwrap();
    h.clock.advance(Duration::from_secs(1));
    h.controller.on_tick();

    assert_eq!(h.store.rows()[0].0, "15-06-2024 12:00:01");
}

#[test]
fn test_idle_ticks_publish_but_never_append() {
    let mut h = harness();
    for _ in 0..3 {
        h.clock.advance(Duration::from_secs(1));
        assert_eq!(h.controller.on_tick(), TickOutcome::Displayed);
    }
    assert_eq!(h.controller.refresh_display(), TickOutcome::Displayed);

    assert_eq!(h.store.attempts(), 0);
    assert_eq!(h.observer.samples(), 4);
    assert!(h.observer.elapsed_updates().is_empty());
    assert_eq!(h.sampler.calls(), 4);
}

#[test]
fn test_ticks_after_stop_do_not_append() {
    let mut h = harness();
    h.controller.start("1").unwrap();
    h.clock.advance(Duration::from_secs(1));
    h.controller.on_tick();
    h.controller.stop();

    h.clock.advance(Duration::from_secs(1));
    assert_eq!(h.controller.on_tick(), TickOutcome::Displayed);
    assert_eq!(h.store.rows().len(), 1);
}

#[test]
fn test_shutdown_closes_store_exactly_once() {
    let mut h = harness();
    h.controller.start("1").unwrap();

    h.controller.shutdown().unwrap();
    h.controller.shutdown().unwrap();

    assert_eq!(h.store.close_calls(), 1);
    assert_eq!(h.controller.state(), SessionState::Idle);
}

#[test]
fn test_failed_close_is_reported_as_shutdown_error() {
    let mut h = harness_with_store(MemoryStore::new().fail_close());
    let err = h.controller.shutdown().unwrap_err();
    assert!(matches!(err, SessionError::Shutdown(_)));

    // The store is gone either way; nothing is closed twice.
    assert!(h.controller.shutdown().is_ok());
    assert_eq!(h.store.close_calls(), 1);
}

#[tokio::test]
async fn test_run_handles_commands_and_ticks_until_shutdown() {
    let Harness {
        controller,
        clock,
        ticker,
        store,
        ..
    } = harness();
    let (session, commands_rx) = SessionHandle::channel(4);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(controller.run(commands_rx, shutdown_rx));

    session.start(Some("1")).await.unwrap();
    clock.advance(Duration::from_secs(1));
    ticker.fire();
    tokio::time::timeout(Duration::from_secs(1), async {
        while store.rows().is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("tick was not handled");

    let status = session.status().await.unwrap();
    assert_eq!(status.state, SessionState::Recording);
    assert_eq!(status.elapsed_seconds, 1);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
    assert_eq!(store.close_calls(), 1);
    assert!(matches!(
        session.stop().await,
        Err(SessionError::ControllerGone)
    ));
}
