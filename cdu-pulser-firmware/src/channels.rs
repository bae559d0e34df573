//! Inter-task communication channels
//!
//! The pulser task owns the sequencer; everything else reaches it through
//! these bounded channels.

use cdu_pulser_core::traits::RelayId;
use cdu_pulser_protocol::DecoderReply;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Channel capacity for sequencer requests
const REQUEST_CHANNEL_SIZE: usize = 8;

/// Channel capacity for outgoing replies
const REPLY_CHANNEL_SIZE: usize = 8;

/// Work for the pulser task
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SequencerRequest {
    /// Queue a pulse on a relay
    Pulse(RelayId),
    /// Report sequencer state
    Status,
}

/// Requests from the host link to the pulser task
pub static REQUEST_CHANNEL: Channel<CriticalSectionRawMutex, SequencerRequest, REQUEST_CHANNEL_SIZE> =
    Channel::new();

/// Replies waiting to be written to the host
pub static REPLY_CHANNEL: Channel<CriticalSectionRawMutex, DecoderReply, REPLY_CHANNEL_SIZE> =
    Channel::new();

/// Queue a reply, dropping it if the transmitter has fallen behind
pub fn send_reply(reply: DecoderReply) {
    if REPLY_CHANNEL.try_send(reply).is_err() {
        defmt::warn!("Reply channel full, dropping {}", reply);
    }
}
