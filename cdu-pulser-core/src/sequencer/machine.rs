//! Pulse sequencer
//!
//! Drives one relay at a time from the pending queue:
//!
//! ```text
//!   Idle ──(queue non-empty)──▶ OnDelay ──(on_ms elapsed)──▶ RechargeDelay
//!    ▲                            ▲                              │
//!    │                            └──(recharge elapsed, queued)──┤
//!    └────────────────(recharge elapsed, queue empty)────────────┘
//! ```
//!
//! The machine is polled: `tick` never waits, performs at most one
//! transition, and issues at most one output write.

use core::fmt;

use super::state::{PulserState, Request, Transition};
use crate::config::PulserConfig;
use crate::queue::{PulseQueue, QueueFull, DEFAULT_QUEUE_CAPACITY};
use crate::time::{self, Millis};
use crate::traits::{Level, MonotonicClock, RelayId, RelayOutputs};

/// Errors reported by the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseError<E> {
    /// No free queue slot; the request was dropped and the queue is unchanged
    QueueFull,
    /// Relay index beyond the board's channel count
    InvalidRelay(RelayId),
    /// The board failed a write; the transition was still taken
    Output(E),
}

impl<E> From<QueueFull> for PulseError<E> {
    fn from(_: QueueFull) -> Self {
        PulseError::QueueFull
    }
}

impl<E: fmt::Debug> fmt::Display for PulseError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PulseError::QueueFull => f.write_str("pulse queue full"),
            PulseError::InvalidRelay(relay) => write!(f, "relay {} not on board", relay),
            PulseError::Output(e) => write!(f, "relay output write failed: {:?}", e),
        }
    }
}

/// CDU pulse sequencer
///
/// Owns the relay board and the pending queue. Callers must serialize
/// access (one polling task, or a mutex around `tick`/`request_pulse`).
pub struct PulseSequencer<R, const N: usize = DEFAULT_QUEUE_CAPACITY> {
    outputs: R,
    config: PulserConfig,
    queue: PulseQueue<N>,
    state: PulserState,
}

impl<R: RelayOutputs, const N: usize> PulseSequencer<R, N> {
    /// Create a sequencer and release every relay on the board
    pub fn new(mut outputs: R, config: PulserConfig) -> Result<Self, R::Error> {
        outputs.set_all(config.inactive_level())?;

        Ok(Self {
            outputs,
            config,
            queue: PulseQueue::new(),
            state: PulserState::Idle,
        })
    }

    /// Queue a pulse for `relay` and advance the machine once
    ///
    /// A request made while idle starts its pulse immediately. The advance
    /// may instead release the head relay if its deadline has passed, so the
    /// returned slot is taken after it. Asking for a relay that is already
    /// pending returns its slot without scheduling a second pulse.
    pub fn request_pulse(
        &mut self,
        relay: RelayId,
        now: Millis,
    ) -> Result<Request, PulseError<R::Error>> {
        if !self.outputs.is_valid(relay) {
            return Err(PulseError::InvalidRelay(relay));
        }

        if let Some(slot) = self.queue.position(relay) {
            return Ok(Request::AlreadyQueued(slot));
        }

        self.queue.enqueue(relay)?;
        let transition = self.tick(now)?;
        // Still queued: a release pops the old head, never the new tail
        let slot = self.queue.position(relay).unwrap_or(0);

        Ok(Request::Queued { slot, transition })
    }

    /// Advance the machine by at most one transition
    pub fn tick(&mut self, now: Millis) -> Result<Transition, PulseError<R::Error>> {
        match self.state {
            PulserState::Idle => match self.queue.front() {
                Some(relay) => self.energize(relay, now),
                None => Ok(Transition::None),
            },
            PulserState::OnDelay { relay, deadline } => {
                if !time::deadline_reached(now, deadline) {
                    return Ok(Transition::None);
                }

                let written = self.outputs.set_output(relay, self.config.inactive_level());
                self.queue.pop_front();
                self.state = PulserState::RechargeDelay {
                    deadline: time::deadline_after(now, self.config.recharge_ms()),
                };
                written.map_err(PulseError::Output)?;

                Ok(Transition::Released(relay))
            }
            PulserState::RechargeDelay { deadline } => {
                if !time::deadline_reached(now, deadline) {
                    return Ok(Transition::None);
                }

                match self.queue.front() {
                    Some(relay) => self.energize(relay, now),
                    None => {
                        self.state = PulserState::Idle;
                        Ok(Transition::Idle)
                    }
                }
            }
        }
    }

    /// Tick using the current time of `clock`
    pub fn poll<C: MonotonicClock + ?Sized>(
        &mut self,
        clock: &C,
    ) -> Result<Transition, PulseError<R::Error>> {
        self.tick(clock.now_ms())
    }

    fn energize(
        &mut self,
        relay: RelayId,
        now: Millis,
    ) -> Result<Transition, PulseError<R::Error>> {
        let written = self.outputs.set_output(relay, self.config.active_level());
        self.state = PulserState::OnDelay {
            relay,
            deadline: time::deadline_after(now, self.config.on_ms()),
        };
        written.map_err(PulseError::Output)?;

        Ok(Transition::Energized(relay))
    }

    /// Current state
    pub fn state(&self) -> PulserState {
        self.state
    }

    /// Relay currently energized, if any
    pub fn energized(&self) -> Option<RelayId> {
        self.state.energized()
    }

    /// Pending requests, head first (includes the relay being pulsed)
    pub fn pending(&self) -> &PulseQueue<N> {
        &self.queue
    }

    /// Check if nothing is firing, recharging or pending
    pub fn is_idle(&self) -> bool {
        self.state.is_idle() && self.queue.is_empty()
    }

    /// Timing configuration
    pub fn config(&self) -> &PulserConfig {
        &self.config
    }

    /// The relay board
    pub fn outputs(&self) -> &R {
        &self.outputs
    }

    /// Level currently commanded for `relay`
    pub fn commanded_level(&self, relay: RelayId) -> Level {
        if self.energized() == Some(relay) {
            self.config.active_level()
        } else {
            self.config.inactive_level()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use proptest::prelude::*;
    use std::vec::Vec;

    /// Mock board recording every write
    struct MockBoard {
        levels: [Level; 16],
        writes: Vec<(RelayId, Level)>,
        fail_writes: bool,
    }

    impl MockBoard {
        fn new() -> Self {
            Self {
                levels: [Level::Low; 16],
                writes: Vec::new(),
                fail_writes: false,
            }
        }

        fn count_at(&self, level: Level) -> usize {
            self.levels.iter().filter(|&&l| l == level).count()
        }
    }

    impl RelayOutputs for MockBoard {
        type Error = ();

        fn channel_count(&self) -> u8 {
            16
        }

        fn set_output(&mut self, relay: RelayId, level: Level) -> Result<(), ()> {
            self.writes.push((relay, level));
            if self.fail_writes {
                return Err(());
            }
            self.levels[relay as usize] = level;
            Ok(())
        }

        fn set_all(&mut self, level: Level) -> Result<(), ()> {
            self.levels = [level; 16];
            Ok(())
        }
    }

    struct FakeClock(Cell<Millis>);

    impl MonotonicClock for FakeClock {
        fn now_ms(&self) -> Millis {
            self.0.get()
        }
    }

    fn sequencer(on_ms: u32, recharge_ms: u32) -> PulseSequencer<MockBoard> {
        let config = PulserConfig::new(on_ms, recharge_ms, Level::High).unwrap();
        PulseSequencer::new(MockBoard::new(), config).unwrap()
    }

    #[test]
    fn test_single_pulse_scenario() {
        let mut seq = sequencer(100, 500);

        assert_eq!(
            seq.request_pulse(3, 0),
            Ok(Request::Queued {
                slot: 0,
                transition: Transition::Energized(3)
            })
        );
        assert_eq!(
            seq.state(),
            PulserState::OnDelay {
                relay: 3,
                deadline: 100
            }
        );
        assert_eq!(seq.outputs().levels[3], Level::High);

        assert_eq!(seq.tick(99), Ok(Transition::None));
        assert_eq!(seq.tick(100), Ok(Transition::Released(3)));
        assert_eq!(seq.outputs().levels[3], Level::Low);
        assert!(seq.pending().is_empty());
        assert_eq!(seq.state(), PulserState::RechargeDelay { deadline: 600 });

        assert_eq!(seq.tick(599), Ok(Transition::None));
        assert_eq!(seq.tick(600), Ok(Transition::Idle));
        assert_eq!(seq.state(), PulserState::Idle);
        assert!(seq.is_idle());
    }

    #[test]
    fn test_idle_ticks_do_nothing() {
        let mut seq = sequencer(100, 500);

        for now in (0..10_000).step_by(7) {
            assert_eq!(seq.tick(now), Ok(Transition::None));
        }
        assert_eq!(seq.state(), PulserState::Idle);
        assert!(seq.outputs().writes.is_empty());
    }

    #[test]
    fn test_fifo_with_recharge_gap() {
        let mut seq = sequencer(100, 500);

        seq.request_pulse(1, 0).unwrap();
        assert_eq!(
            seq.request_pulse(2, 10),
            Ok(Request::Queued {
                slot: 1,
                transition: Transition::None
            })
        );
        assert_eq!(seq.energized(), Some(1));

        assert_eq!(seq.tick(100), Ok(Transition::Released(1)));
        // Relay 2 waits for the full recharge interval
        assert_eq!(seq.tick(101), Ok(Transition::None));
        assert_eq!(seq.tick(599), Ok(Transition::None));
        assert_eq!(seq.energized(), None);

        assert_eq!(seq.tick(600), Ok(Transition::Energized(2)));
        assert_eq!(seq.tick(700), Ok(Transition::Released(2)));
        assert_eq!(seq.tick(1200), Ok(Transition::Idle));

        assert_eq!(
            seq.outputs().writes,
            [
                (1, Level::High),
                (1, Level::Low),
                (2, Level::High),
                (2, Level::Low)
            ]
        );
    }

    #[test]
    fn test_request_during_recharge_waits() {
        let mut seq = sequencer(100, 500);

        seq.request_pulse(4, 0).unwrap();
        seq.tick(100).unwrap();

        // Queue refills mid-recharge: no immediate pulse
        assert_eq!(
            seq.request_pulse(5, 300),
            Ok(Request::Queued {
                slot: 0,
                transition: Transition::None
            })
        );
        assert_eq!(seq.energized(), None);

        assert_eq!(seq.tick(600), Ok(Transition::Energized(5)));
    }

    #[test]
    fn test_request_after_idle_fires_immediately() {
        let mut seq = sequencer(100, 500);

        seq.request_pulse(4, 0).unwrap();
        seq.tick(100).unwrap();
        seq.tick(600).unwrap();

        seq.request_pulse(6, 5_000).unwrap();
        assert_eq!(
            seq.state(),
            PulserState::OnDelay {
                relay: 6,
                deadline: 5_100
            }
        );
    }

    #[test]
    fn test_duplicate_request_is_idempotent() {
        let mut seq = sequencer(100, 500);

        seq.request_pulse(7, 0).unwrap();
        seq.request_pulse(8, 0).unwrap();

        // Relay 7 is firing at the head
        assert_eq!(seq.request_pulse(7, 50), Ok(Request::AlreadyQueued(0)));
        assert_eq!(seq.request_pulse(8, 50), Ok(Request::AlreadyQueued(1)));
        assert_eq!(seq.pending().len(), 2);

        seq.tick(100).unwrap();
        seq.tick(600).unwrap();
        seq.tick(700).unwrap();
        assert_eq!(seq.tick(1200), Ok(Transition::Idle));

        // One pulse each
        let energized = seq
            .outputs()
            .writes
            .iter()
            .filter(|(_, level)| *level == Level::High)
            .count();
        assert_eq!(energized, 2);
    }

    #[test]
    fn test_queue_full() {
        let config = PulserConfig::new(100, 500, Level::High).unwrap();
        let mut seq: PulseSequencer<MockBoard, 2> =
            PulseSequencer::new(MockBoard::new(), config).unwrap();

        seq.request_pulse(0, 0).unwrap();
        seq.request_pulse(1, 0).unwrap();
        assert_eq!(seq.request_pulse(2, 0), Err(PulseError::QueueFull));
        assert_eq!(seq.pending().len(), 2);
        assert_eq!(seq.request_pulse(1, 0), Ok(Request::AlreadyQueued(1)));

        // Head frees its slot once released
        seq.tick(100).unwrap();
        assert_eq!(seq.request_pulse(2, 100).map(|r| r.slot()), Ok(1));
    }

    #[test]
    fn test_request_past_deadline_reports_release() {
        let mut seq = sequencer(100, 500);
        seq.request_pulse(1, 0).unwrap();

        // No tick between the deadline and the request: the request's own
        // advance releases relay 1, leaving relay 2 at the head
        assert_eq!(
            seq.request_pulse(2, 150),
            Ok(Request::Queued {
                slot: 0,
                transition: Transition::Released(1)
            })
        );
        assert_eq!(seq.state(), PulserState::RechargeDelay { deadline: 650 });
        assert_eq!(seq.pending().front(), Some(2));
        assert_eq!(seq.outputs().writes, [(1, Level::High), (1, Level::Low)]);

        assert_eq!(seq.tick(650), Ok(Transition::Energized(2)));
    }

    #[test]
    fn test_request_after_recharge_reports_energize() {
        let mut seq = sequencer(100, 500);
        seq.request_pulse(1, 0).unwrap();
        seq.tick(100).unwrap();

        assert_eq!(
            seq.request_pulse(2, 700),
            Ok(Request::Queued {
                slot: 0,
                transition: Transition::Energized(2)
            })
        );
    }

    #[test]
    fn test_invalid_relay_rejected() {
        let mut seq = sequencer(100, 500);

        assert_eq!(seq.request_pulse(16, 0), Err(PulseError::InvalidRelay(16)));
        assert!(seq.pending().is_empty());
        assert!(seq.outputs().writes.is_empty());
    }

    #[test]
    fn test_active_low_is_symmetric() {
        let config = PulserConfig::new(100, 500, Level::Low).unwrap();
        let mut seq: PulseSequencer<MockBoard> =
            PulseSequencer::new(MockBoard::new(), config).unwrap();

        // Every relay released (high) at start-up
        assert_eq!(seq.outputs().count_at(Level::High), 16);

        seq.request_pulse(2, 0).unwrap();
        seq.request_pulse(9, 0).unwrap();
        seq.tick(100).unwrap();
        seq.tick(600).unwrap();
        seq.tick(700).unwrap();

        assert_eq!(
            seq.outputs().writes,
            [
                (2, Level::Low),
                (2, Level::High),
                (9, Level::Low),
                (9, Level::High)
            ]
        );
        assert_eq!(seq.outputs().count_at(Level::High), 16);
    }

    #[test]
    fn test_wraparound_timing() {
        let mut seq = sequencer(100, 500);
        let start = u32::MAX - 40;

        seq.request_pulse(3, start).unwrap();
        assert_eq!(seq.tick(u32::MAX), Ok(Transition::None));
        assert_eq!(seq.tick(58), Ok(Transition::None));
        assert_eq!(seq.tick(59), Ok(Transition::Released(3)));
        assert_eq!(seq.tick(558), Ok(Transition::None));
        assert_eq!(seq.tick(559), Ok(Transition::Idle));
    }

    #[test]
    fn test_one_transition_per_tick() {
        let mut seq = sequencer(100, 500);

        seq.request_pulse(1, 0).unwrap();
        seq.request_pulse(2, 0).unwrap();

        // Far past every deadline: still one step at a time, and recharge
        // restarts from the release
        assert_eq!(seq.tick(10_000), Ok(Transition::Released(1)));
        assert_eq!(seq.tick(10_000), Ok(Transition::None));
        assert_eq!(seq.tick(10_500), Ok(Transition::Energized(2)));
    }

    #[test]
    fn test_output_error_is_not_retried() {
        let mut seq = sequencer(100, 500);
        seq.request_pulse(3, 0).unwrap();

        seq.outputs.fail_writes = true;
        assert_eq!(seq.tick(100), Err(PulseError::Output(())));
        assert_eq!(seq.state(), PulserState::RechargeDelay { deadline: 600 });
        assert!(seq.pending().is_empty());

        // No second release attempt
        assert_eq!(seq.tick(200), Ok(Transition::None));
        assert_eq!(seq.outputs().writes.len(), 2);
    }

    #[test]
    fn test_poll_uses_clock() {
        let mut seq = sequencer(100, 500);
        let clock = FakeClock(Cell::new(0));

        seq.request_pulse(0, clock.now_ms()).unwrap();
        clock.0.set(100);
        assert_eq!(seq.poll(&clock), Ok(Transition::Released(0)));
    }

    #[derive(Debug, Clone)]
    enum Step {
        Request(RelayId),
        Advance(u32),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0u8..16).prop_map(Step::Request),
            (0u32..400).prop_map(Step::Advance),
        ]
    }

    struct Observer {
        recharge_ms: u32,
        last_release: Option<Millis>,
        fired: Vec<RelayId>,
    }

    impl Observer {
        fn observe(
            &mut self,
            seq: &PulseSequencer<MockBoard>,
            transition: Transition,
            now: Millis,
        ) -> Result<(), TestCaseError> {
            prop_assert!(seq.outputs().count_at(Level::High) <= 1);
            for relay in 0..16u8 {
                prop_assert_eq!(seq.outputs().levels[relay as usize], seq.commanded_level(relay));
            }
            match transition {
                Transition::Energized(relay) => {
                    if let Some(released) = self.last_release {
                        prop_assert!(time::elapsed(released, now) >= self.recharge_ms);
                    }
                    self.fired.push(relay);
                }
                Transition::Released(_) => self.last_release = Some(now),
                Transition::None | Transition::Idle => {}
            }
            Ok(())
        }
    }

    proptest! {
        #[test]
        fn prop_single_relay_and_recharge_gap(
            start in any::<u32>(),
            steps in proptest::collection::vec(step_strategy(), 1..200),
        ) {
            const ON: u32 = 50;
            const RECHARGE: u32 = 200;

            let mut seq = sequencer(ON, RECHARGE);
            let mut now = start;
            let mut observer = Observer {
                recharge_ms: RECHARGE,
                last_release: None,
                fired: Vec::new(),
            };
            let mut expected: Vec<RelayId> = Vec::new();

            for step in steps {
                match step {
                    Step::Request(relay) => {
                        let transition = match seq.request_pulse(relay, now) {
                            Ok(Request::Queued { slot, transition }) => {
                                prop_assert_eq!(seq.pending().position(relay), Some(slot));
                                expected.push(relay);
                                transition
                            }
                            _ => Transition::None,
                        };
                        observer.observe(&seq, transition, now)?;
                    }
                    Step::Advance(dt) => {
                        now = now.wrapping_add(dt);
                        let transition = seq.tick(now).unwrap();
                        observer.observe(&seq, transition, now)?;
                    }
                }
            }

            // Drain whatever is left
            for _ in 0..(3 * expected.len() + 3) {
                now = now.wrapping_add(RECHARGE);
                let transition = seq.tick(now).unwrap();
                observer.observe(&seq, transition, now)?;
            }

            prop_assert!(seq.is_idle());
            prop_assert_eq!(observer.fired, expected);
        }
    }
}
