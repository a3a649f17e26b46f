//! Host and worker ends of a channel pair.
//!
//! Frames are plain `String`s. Sending is fire-and-forget; the only failure a
//! sender can observe is that the peer has gone away.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::trace;

use crate::envelope::{Envelope, HostMessage, WorkerMessage};
use crate::error::{ChannelError, ChannelResult};

/// Creates a connected host/worker port pair.
pub fn pair() -> (HostPort, WorkerPort) {
    let (to_worker, from_host) = unbounded();
    let (to_host, from_worker) = unbounded();
    (
        HostPort {
            outbound: Outbound { tx: to_worker },
            inbound: from_worker,
        },
        WorkerPort {
            tx: to_host,
            rx: from_host,
        },
    )
}

/// Cloneable host → worker sender handed to modules.
#[derive(Clone, Debug)]
pub struct Outbound {
    tx: Sender<String>,
}

impl Outbound {
    pub fn send(&self, message: &HostMessage) -> ChannelResult<()> {
        self.send_envelope(&message.to_envelope()?)
    }

    pub fn send_envelope(&self, envelope: &Envelope) -> ChannelResult<()> {
        let frame = envelope.encode()?;
        trace!("host -> worker {frame}");
        self.tx.send(frame).map_err(|_| ChannelError::Closed)
    }
}

/// Host end of the channel.
#[derive(Debug)]
pub struct HostPort {
    outbound: Outbound,
    inbound: Receiver<String>,
}

impl HostPort {
    pub fn outbound(&self) -> Outbound {
        self.outbound.clone()
    }

    pub fn send(&self, message: &HostMessage) -> ChannelResult<()> {
        self.outbound.send(message)
    }

    /// Returns the next inbound frame without blocking.
    pub fn try_recv(&self) -> ChannelResult<Option<String>> {
        match self.inbound.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ChannelError::Closed),
        }
    }

    /// Waits up to `timeout` for the next inbound frame.
    pub fn recv_timeout(&self, timeout: Duration) -> ChannelResult<Option<String>> {
        match self.inbound.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::Closed),
        }
    }
}

/// Worker end of the channel.
#[derive(Debug)]
pub struct WorkerPort {
    tx: Sender<String>,
    rx: Receiver<String>,
}

impl WorkerPort {
    pub fn send(&self, message: &WorkerMessage) -> ChannelResult<()> {
        let frame = message.to_envelope().encode()?;
        trace!("worker -> host {frame}");
        self.tx.send(frame).map_err(|_| ChannelError::Closed)
    }

    /// Sends a raw frame; used to exercise the host's handling of foreign input.
    pub fn send_raw(&self, frame: impl Into<String>) -> ChannelResult<()> {
        self.tx.send(frame.into()).map_err(|_| ChannelError::Closed)
    }

    /// Blocks until the next frame arrives or the host hangs up.
    pub fn recv(&self) -> ChannelResult<String> {
        self.rx.recv().map_err(|_| ChannelError::Closed)
    }

    pub fn try_recv(&self) -> ChannelResult<Option<String>> {
        match self.rx.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ChannelError::Closed),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> ChannelResult<Option<String>> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::Closed),
        }
    }
}
