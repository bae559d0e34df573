//! Host UART receive task
//!
//! Receives frames from the host, resolves accessory addresses, and hands
//! pulse work to the pulser task.

use cdu_pulser_core::turnout::{TurnoutDirection, TurnoutMap};
use cdu_pulser_protocol::{DecoderReply, FrameParser, HostCommand};
use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use crate::channels::{send_reply, SequencerRequest, REQUEST_CHANNEL};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Host RX task - receives and parses frames from the host
#[embassy_executor::task]
pub async fn host_rx_task(mut rx: BufferedUartRx, turnouts: TurnoutMap) {
    info!("Host RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
        };

        for &byte in &buf[..n] {
            match parser.feed(byte) {
                Ok(Some(frame)) => match HostCommand::from_frame(&frame) {
                    Ok(cmd) => handle_command(cmd, &turnouts).await,
                    Err(e) => warn!("Bad host command: {}", e),
                },
                Ok(None) => {}
                Err(e) => warn!("Frame parse error: {:?}", e),
            }
        }
    }
}

/// Handle a parsed host command
async fn handle_command(cmd: HostCommand, turnouts: &TurnoutMap) {
    match cmd {
        HostCommand::Pulse { relay } => {
            REQUEST_CHANNEL.send(SequencerRequest::Pulse(relay)).await;
        }
        HostCommand::Accessory { address, thrown } => {
            let direction = if thrown {
                TurnoutDirection::Thrown
            } else {
                TurnoutDirection::Closed
            };
            match turnouts.relay_for(address, direction) {
                Some(relay) => {
                    debug!("Turnout {} {} -> relay {}", address, direction, relay);
                    REQUEST_CHANNEL.send(SequencerRequest::Pulse(relay)).await;
                }
                None => {
                    warn!("Accessory address {} not mapped", address);
                    send_reply(DecoderReply::UnknownAddress { address });
                }
            }
        }
        HostCommand::Status => {
            REQUEST_CHANNEL.send(SequencerRequest::Status).await;
        }
        HostCommand::Ping => {
            trace!("PING received");
            send_reply(DecoderReply::Pong);
        }
    }
}
