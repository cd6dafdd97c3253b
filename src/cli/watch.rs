use std::time::Duration;

use anyhow::Result;
use tokio::{select, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    core::{format::Unit, profile::Profile},
    notes::period::period_id,
    storage::{entities::NoteEntity, kv_store::KeyValueStore, records::load_note},
    utils::clock::Clock,
};

use super::dashboard::{Dashboard, FrameSink};

/// How often the dashboard is recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    EverySecond,
    EveryMinute,
}

impl Cadence {
    /// Seconds only move when they are visible: either the seconds unit or the active hours
    /// countdown is on screen.
    pub fn for_view(unit: Unit, show_active: bool) -> Self {
        if unit == Unit::Seconds || unit == Unit::Digits || show_active {
            Cadence::EverySecond
        } else {
            Cadence::EveryMinute
        }
    }

    pub fn period(&self) -> Duration {
        match self {
            Cadence::EverySecond => Duration::from_secs(1),
            Cadence::EveryMinute => Duration::from_secs(60),
        }
    }
}

/// Notes edited elsewhere show up on screen within this delay.
const NOTE_REFRESH: Duration = Duration::from_secs(60);

struct CachedNote {
    id: String,
    note: NoteEntity,
    read_at: Instant,
}

/// Redraws the dashboard until cancelled. Every tick is an independent recomputation from the
/// clock and the profile snapshot.
pub struct Watcher<S, F> {
    store: S,
    sink: F,
    clock: Box<dyn Clock>,
    shutdown: CancellationToken,
    profile: Profile,
    unit: Unit,
    show_active: bool,
}

impl<S: KeyValueStore, F: FrameSink> Watcher<S, F> {
    pub fn new(
        store: S,
        sink: F,
        clock: Box<dyn Clock>,
        shutdown: CancellationToken,
        profile: Profile,
        unit: Unit,
        show_active: bool,
    ) -> Self {
        Self {
            store,
            sink,
            clock,
            shutdown,
            profile,
            unit,
            show_active,
        }
    }

    /// Reads the note for the period `id` when the period changed since the last read or the
    /// cached copy is older than [NOTE_REFRESH].
    async fn refresh_note(&self, cached: &mut Option<CachedNote>, id: String) {
        let now = self.clock.instant();
        let fresh = cached
            .as_ref()
            .is_some_and(|v| v.id == id && now.duration_since(v.read_at) < NOTE_REFRESH);
        if fresh {
            return;
        }
        let scope = self.profile.default_note_scope;
        let note = load_note(&self.store, scope, &id)
            .await
            .inspect_err(|e| error!("Failed to load {scope} note {id}: {e:?}"))
            .unwrap_or_default();
        *cached = Some(CachedNote {
            id,
            note,
            read_at: now,
        });
    }

    /// Executes the redraw loop.
    pub async fn run(mut self) -> Result<()> {
        let cadence = Cadence::for_view(self.unit, self.show_active);
        info!("Watching with cadence {cadence:?}");

        let mut note = None;
        let mut tick_point = self.clock.instant();
        loop {
            tick_point += cadence.period();

            let now = self.clock.now();
            let scope = self.profile.default_note_scope;
            self.refresh_note(&mut note, period_id(scope, now.date_naive()))
                .await;
            let text = note
                .as_ref()
                .map(|v| v.note.text.clone())
                .unwrap_or_default();

            let frame = Dashboard::compute(&now, &self.profile, self.unit, self.show_active)
                .with_note(scope, text);
            debug!("Showing frame for {now}");
            self.sink.show(&frame)?;

            select! {
                _ = self.shutdown.cancelled() => {
                    info!("Stopped watching");
                    return Ok(())
                }
                _ = self.clock.sleep_until(tick_point) => ()
            }
        }
    }
}

/// Cancels `cancelation` on Ctrl-C.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, Local, NaiveDate, TimeZone};
    use tempfile::tempdir;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use crate::{
        cli::dashboard::MockFrameSink,
        core::{
            format::Unit,
            profile::{NoteScope, Profile},
        },
        notes::period::day_id,
        storage::{entities::NoteEntity, kv_store::FileStore, records::save_note},
        utils::{clock::Clock, logging::TEST_LOGGING},
    };

    use super::{Cadence, Watcher};

    #[derive(Clone)]
    struct TestClock {
        start_time: DateTime<Local>,
        reference: Instant,
    }

    #[async_trait]
    impl Clock for TestClock {
        fn now(&self) -> DateTime<Local> {
            self.start_time + self.reference.elapsed()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    fn test_clock() -> TestClock {
        let start = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        TestClock {
            start_time: Local.from_local_datetime(&start).earliest().unwrap(),
            reference: Instant::now(),
        }
    }

    #[test]
    fn test_cadence_for_view() {
        assert_eq!(Cadence::for_view(Unit::Seconds, false), Cadence::EverySecond);
        assert_eq!(Cadence::for_view(Unit::Years, true), Cadence::EverySecond);
        assert_eq!(Cadence::for_view(Unit::Days, false), Cadence::EveryMinute);
        assert_eq!(Cadence::EveryMinute.period(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_ticks_every_second() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;
        let clock = test_clock();
        save_note(
            &store,
            NoteScope::Day,
            &day_id(clock.start_time.date_naive()),
            &NoteEntity::new("write tests"),
        )
        .await?;

        let mut sink = MockFrameSink::new();
        sink.expect_show()
            .withf(|frame| {
                matches!(&frame.note, Some((_, text)) if text == "write tests")
                    && frame.active.is_some()
            })
            .times(3)
            .returning(|_| Ok(()));

        let shutdown = CancellationToken::new();
        let watcher = Watcher::new(
            &store,
            sink,
            Box::new(clock),
            shutdown.clone(),
            Profile::default(),
            Unit::Seconds,
            true,
        );

        let (_, result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(2500)).await;
                shutdown.cancel()
            },
            watcher.run(),
        );
        result
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_ticks_every_minute() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;

        let mut sink = MockFrameSink::new();
        sink.expect_show()
            .withf(|frame| frame.active.is_none())
            .times(3)
            .returning(|_| Ok(()));

        let shutdown = CancellationToken::new();
        let watcher = Watcher::new(
            store,
            sink,
            Box::new(test_clock()),
            shutdown.clone(),
            Profile::default(),
            Unit::Days,
            false,
        );

        let (_, result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_secs(150)).await;
                shutdown.cancel()
            },
            watcher.run(),
        );
        result
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_picks_up_edited_note() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;
        let clock = test_clock();
        let id = day_id(clock.start_time.date_naive());
        save_note(&store, NoteScope::Day, &id, &NoteEntity::new("before")).await?;

        let shown = Arc::new(Mutex::new(Vec::new()));
        let mut sink = MockFrameSink::new();
        let frames = shown.clone();
        sink.expect_show().returning(move |frame| {
            let text = frame.note.as_ref().map(|(_, v)| v.clone()).unwrap_or_default();
            frames.lock().unwrap().push(text);
            Ok(())
        });

        let shutdown = CancellationToken::new();
        let watcher = Watcher::new(
            &store,
            sink,
            Box::new(clock),
            shutdown.clone(),
            Profile::default(),
            Unit::Days,
            false,
        );

        let (edit, result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                let saved =
                    save_note(&store, NoteScope::Day, &id, &NoteEntity::new("after")).await;
                tokio::time::sleep(Duration::from_secs(100)).await;
                shutdown.cancel();
                saved
            },
            watcher.run(),
        );
        edit?;
        result?;

        assert_eq!(*shown.lock().unwrap(), vec!["before", "after", "after"]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_stops_on_sink_error() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;

        let mut sink = MockFrameSink::new();
        sink.expect_show()
            .times(1)
            .returning(|_| Err(anyhow!("terminal closed")));

        let watcher = Watcher::new(
            store,
            sink,
            Box::new(test_clock()),
            CancellationToken::new(),
            Profile::default(),
            Unit::Seconds,
            false,
        );

        assert!(watcher.run().await.is_err());
        Ok(())
    }
}
