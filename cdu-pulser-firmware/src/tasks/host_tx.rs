//! Host UART transmit task
//!
//! Writes decoder replies back to the host in arrival order.

use cdu_pulser_protocol::MAX_FRAME_SIZE;
use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::REPLY_CHANNEL;

/// Host TX task - sends reply frames to the host
#[embassy_executor::task]
pub async fn host_tx_task(mut tx: BufferedUartTx) {
    info!("Host TX task started");

    let mut buf = [0u8; MAX_FRAME_SIZE];

    loop {
        let reply = REPLY_CHANNEL.receive().await;

        let len = match reply.to_frame().encode(&mut buf) {
            Ok(len) => len,
            Err(e) => {
                warn!("Failed to encode {}: {:?}", reply, e);
                continue;
            }
        };

        if let Err(e) = tx.write_all(&buf[..len]).await {
            warn!("Failed to send {}: {:?}", reply, e);
        } else {
            trace!("Sent {}", reply);
        }
    }
}
