//! Pulse sequencing task
//!
//! Owns the sequencer and the relay board. Requests arrive over
//! [`REQUEST_CHANNEL`]; between requests the machine is polled on a fixed
//! tick so timed transitions happen within a millisecond of their deadline.

use cdu_pulser_core::time::Millis;
use cdu_pulser_core::traits::{MonotonicClock, RelayOutputs};
use cdu_pulser_core::{PulseError, PulseSequencer, Request, Transition};
use cdu_pulser_protocol::DecoderReply;
use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};

use crate::board::{Board, BoardError, EmbassyClock};
use crate::channels::{send_reply, SequencerRequest, REQUEST_CHANNEL};

/// Poll interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 1;

/// Sequencer over the fitted board with the default queue depth
pub type Sequencer = PulseSequencer<Board>;

/// Pulser task - serializes requests and ticks onto the sequencer
#[embassy_executor::task]
pub async fn pulser_task(mut sequencer: Sequencer) {
    info!(
        "Pulser task started ({} relays, queue depth {})",
        sequencer.outputs().channel_count(),
        sequencer.pending().capacity()
    );

    let clock = EmbassyClock;
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        match select(REQUEST_CHANNEL.receive(), ticker.next()).await {
            Either::First(request) => handle_request(&mut sequencer, request, clock.now_ms()),
            Either::Second(()) => match sequencer.poll(&clock) {
                Ok(transition) => log_transition(transition),
                Err(e) => report_error(e),
            },
        }
    }
}

fn handle_request(sequencer: &mut Sequencer, request: SequencerRequest, now: Millis) {
    let relay = match request {
        SequencerRequest::Pulse(relay) => relay,
        SequencerRequest::Status => {
            send_reply(DecoderReply::Status {
                state: sequencer.state().code(),
                pending: slot_byte(sequencer.pending().len()),
            });
            return;
        }
    };

    let reply = match sequencer.request_pulse(relay, now) {
        Ok(Request::Queued { slot, transition }) => {
            debug!("Relay {} queued at slot {}", relay, slot);
            log_transition(transition);
            DecoderReply::Queued {
                relay,
                slot: slot_byte(slot),
            }
        }
        Ok(Request::AlreadyQueued(slot)) => {
            debug!("Relay {} already pending at slot {}", relay, slot);
            DecoderReply::AlreadyQueued {
                relay,
                slot: slot_byte(slot),
            }
        }
        Err(PulseError::QueueFull) => {
            warn!("Pulse queue full, dropping relay {}", relay);
            DecoderReply::QueueFull { relay }
        }
        Err(PulseError::InvalidRelay(relay)) => {
            warn!("Relay {} is not on the board", relay);
            DecoderReply::Rejected { relay }
        }
        Err(PulseError::Output(e)) => {
            // The request was queued before the write failed
            error!("Board write failed: {}", e);
            match sequencer.pending().position(relay) {
                Some(slot) => DecoderReply::Queued {
                    relay,
                    slot: slot_byte(slot),
                },
                None => DecoderReply::Rejected { relay },
            }
        }
    };

    send_reply(reply);
}

fn log_transition(transition: Transition) {
    match transition {
        Transition::None => {}
        Transition::Energized(relay) => debug!("Relay {} energized", relay),
        Transition::Released(relay) => debug!("Relay {} released, recharging", relay),
        Transition::Idle => debug!("Recharge complete, idle"),
    }
}

fn report_error(e: PulseError<BoardError>) {
    match e {
        PulseError::Output(e) => error!("Board write failed: {}", e),
        other => warn!("Sequencer error: {}", other),
    }
}

fn slot_byte(slot: usize) -> u8 {
    u8::try_from(slot).unwrap_or(u8::MAX)
}
