//! Offline rendering against a manual clock.

use super::{Engine, ManualClock, NoteLog};
use crate::composition::NoteEvent;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::performer::PerformerSnapshot;

/// Run an engine for `seconds` of simulated time and collect every note.
///
/// The clock steps by the configured poll interval. Before each poll
/// `script(now)` supplies the performer batch for that instant, so any
/// timeline (a fixed scene, an [`Autopilot`](crate::performer::Autopilot),
/// recorded input) can be replayed. Notes scheduled inside the final
/// look-ahead window may start slightly after `seconds`.
pub fn bounce<F>(config: EngineConfig, seconds: f64, mut script: F) -> Result<Vec<NoteEvent>>
where
    F: FnMut(f64) -> Vec<PerformerSnapshot>,
{
    let clock = ManualClock::new();
    let interval = config.poll_interval.as_secs_f64();
    let mut engine = Engine::start(config, clock.clone(), NoteLog::new())?;

    let mut n: u64 = 0;
    loop {
        let now = n as f64 * interval;
        if now > seconds {
            break;
        }
        clock.set(now);
        engine.update_performers(&script(now));
        engine.poll();
        n += 1;
    }

    let notes = engine.into_instrument().into_notes();
    log::info!("bounced {:.1}s, {} notes", seconds, notes.len());
    Ok(notes)
}
