//! Fixed-rate frame loop driving the world and the network session.

use std::thread;
use std::time::{Duration, Instant};

use client::{ClientSession, Transport};
use serde::Serialize;
use tracing::{debug, info};

use crate::adapter::{apply_inbound, outbound_envelope};
use crate::pilot::Pilot;
use crate::world::LocalWorld;

/// Paces a loop to a fixed number of ticks per second.
///
/// A tick that overruns its deadline pushes the schedule back instead of
/// being followed by a burst of catch-up ticks.
#[derive(Debug, Clone)]
pub struct FixedTicker {
    interval: Duration,
    next: Instant,
}

impl FixedTicker {
    /// `tick_rate` is clamped to at least one tick per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let interval = Duration::from_secs(1) / tick_rate.max(1);
        Self {
            interval,
            next: Instant::now() + interval,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Simulated milliseconds per tick, at least one.
    #[must_use]
    pub fn dt_ms(&self) -> u64 {
        u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX).max(1)
    }

    /// Sleeps until the next deadline. Returns `true` if the deadline had
    /// already passed.
    pub fn wait(&mut self) -> bool {
        let now = Instant::now();
        if now >= self.next {
            self.next = now + self.interval;
            return true;
        }
        thread::sleep(self.next - now);
        self.next += self.interval;
        false
    }
}

/// Totals for one [`run_loop`] call, printed by the `horde-sim` binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub ticks: u32,
    pub tick_rate: u32,
    pub connection: String,
    pub session_id: Option<u64>,
    pub frames_sent: u64,
    pub frames_received: u64,
    pub snapshots_applied: u64,
    pub snapshots_dropped: u64,
    pub receive_errors: u64,
    pub send_errors: u64,
    pub late_ticks: u32,
    pub shots: u64,
    pub kills: u64,
    pub contacts: u64,
    pub game_overs: u32,
    pub final_score: u64,
    pub final_wave: u32,
    pub remote_players: usize,
    pub elapsed_ms: u64,
}

/// Runs `ticks` ticks of send, poll, apply, step.
///
/// The network half of every tick is a no-op once the session is offline.
/// Send and receive errors are counted and logged; they never end the loop.
pub fn run_loop<T: Transport, P: Pilot>(
    session: &mut ClientSession<T>,
    world: &mut LocalWorld,
    pilot: &mut P,
    ticks: u32,
    tick_rate: u32,
) -> RunReport {
    let started = Instant::now();
    let mut ticker = FixedTicker::new(tick_rate);
    let dt_ms = ticker.dt_ms();
    let mut report = RunReport {
        ticks,
        tick_rate,
        ..RunReport::default()
    };

    for tick in 0..ticks {
        if let Err(err) = session.send(&outbound_envelope(world)) {
            report.send_errors += 1;
            debug!(tick, error = %err, "send failed");
        }
        match session.poll_receive() {
            Ok(Some(inbound)) => {
                apply_inbound(world, inbound, session.identity());
                report.snapshots_applied += 1;
            }
            Ok(None) => {}
            Err(err) => {
                report.receive_errors += 1;
                debug!(tick, error = %err, "receive failed");
            }
        }

        let input = pilot.next_input(world);
        let events = world.step(dt_ms, &input);
        report.shots += u64::from(events.shots);
        report.kills += u64::from(events.kills);
        report.contacts += u64::from(events.contacts);
        if events.game_over {
            report.game_overs += 1;
            info!(tick, score = world.score(), wave = world.wave(), "game over");
        }
        if events.wave_advanced {
            debug!(tick, wave = world.wave(), "wave advanced");
        }

        if tick + 1 < ticks && ticker.wait() {
            report.late_ticks += 1;
        }
    }

    let stats = session.stats();
    report.connection = session.state().to_string();
    report.session_id = session.identity().map(protocol::SessionId::raw);
    report.frames_sent = stats.frames_sent;
    report.frames_received = stats.frames_received;
    report.snapshots_dropped = stats.snapshots_dropped;
    report.final_score = world.score();
    report.final_wave = world.wave();
    report.remote_players = world.remote_players.len();
    report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    report
}
