//! Driver spawns and manages the reader and writer tasks

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::events::BusEvent;
use super::state::BusShared;
use crate::codec::{DecodeStatus, FrameDecoder};
use crate::handler;
use crate::transport::{ReadOutcome, Transport};
use crate::types::CecCommand;

/// Size of one transport read.
const READ_BUFFER: usize = 256;

/// Join handles of the driver tasks.
pub(crate) struct DriverTasks {
    pub(crate) reader: JoinHandle<()>,
    pub(crate) writer: JoinHandle<()>,
}

/// Driver spawns the tasks that move bytes between the transport and the bus.
///
/// The reader owns the frame decoder and dispatches completed commands while
/// holding the bus lock. The writer drains commands queued by dispatch and by
/// background checks, so replies never block the reader.
pub(crate) struct Driver;

impl Driver {
    pub(crate) fn spawn(
        shared: Arc<BusShared>,
        transport: Arc<dyn Transport>,
        outbound: mpsc::UnboundedReceiver<CecCommand>,
    ) -> DriverTasks {
        let reader = tokio::spawn(Self::reader_task(shared.clone(), transport));
        let writer = tokio::spawn(Self::writer_task(shared, outbound));
        DriverTasks { reader, writer }
    }

    /// Reader task - decodes the byte stream and routes frames
    async fn reader_task(shared: Arc<BusShared>, transport: Arc<dyn Transport>) {
        info!("Bus reader task started");
        let cancel = shared.cancel.clone();
        let read_timeout = shared.config.read_timeout();
        let mut decoder = FrameDecoder::new();
        let mut buf = [0u8; READ_BUFFER];
        let mut frame_count = 0u64;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Bus reader cancelled");
                    break;
                }
                result = transport.read(&mut buf, read_timeout) => result,
            };

            match result {
                Ok(ReadOutcome::Data(n)) => {
                    trace!(bytes = n, "Read from transport");
                    let faults = decoder.framing_faults();
                    for byte in &buf[..n] {
                        if let DecodeStatus::FrameComplete(frame) = decoder.push_received_byte(*byte) {
                            frame_count += 1;
                            trace!(frame = %frame, "Frame {}", frame_count);
                            shared.lock_state().receive_frame(frame);
                        }
                    }
                    if decoder.framing_faults() > faults {
                        warn!(
                            total = decoder.framing_faults(),
                            "Discarded malformed adapter frame"
                        );
                    }
                }
                Ok(ReadOutcome::Timeout) => continue,
                Err(e) => {
                    // The transport owner handles reconnection.
                    error!("Transport error, stopping reader: {}", e);
                    let mut state = shared.lock_state();
                    state.mark_closed();
                    state.publish(BusEvent::TransportClosed);
                    break;
                }
            }
        }

        let discarded = shared.lock_state().discarded_commands();
        info!(
            "Bus reader task ended (processed {} frames, {} framing faults, {} discarded commands)",
            frame_count,
            decoder.framing_faults(),
            discarded
        );
    }

    /// Writer task - transmits commands queued by dispatch
    async fn writer_task(shared: Arc<BusShared>, mut outbound: mpsc::UnboundedReceiver<CecCommand>) {
        debug!("Bus writer task started");
        let cancel = shared.cancel.clone();

        loop {
            let command = tokio::select! {
                _ = cancel.cancelled() => break,
                command = outbound.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };
            if let Err(e) = handler::transmit(&shared, command, true).await {
                debug!("Queued command not delivered: {}", e);
            }
        }

        debug!("Bus writer task ended");
    }
}
