//! A communication channel used to send/receive messages to/from another party.

use std::{fmt, future::Future, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tokio::{
    sync::mpsc::{Receiver, Sender, channel},
    time::timeout,
};
use tracing::trace;

use crate::config::Config;

/// Errors related to sending / receiving / (de-)serializing messages.
#[derive(Debug, thiserror::Error)]
#[error("channel error during {phase}: {reason}")]
pub struct Error {
    /// The protocol phase during which the error occurred.
    pub phase: String,
    /// The specific error that was raised.
    pub reason: ErrorKind,
}

/// The specific error that occurred when trying to send / receive a message.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The (serialized) message could not be received over the channel.
    #[error("could not receive message: {0}")]
    RecvError(String),
    /// The (serialized) message could not be sent over the channel.
    #[error("could not send message: {0}")]
    SendError(String),
    /// The message could not be (de-)serialized.
    #[error("could not (de-)serialize message: {0}")]
    SerdeError(String),
    /// The message is a Vec, but not of the expected length.
    #[error("expected {expected} elements, but received {actual}")]
    InvalidLength {
        /// The number of elements the receiver expected.
        expected: usize,
        /// The number of elements actually received.
        actual: usize,
    },
}

/// A communication channel used to send/receive messages to/from another party.
///
/// Messages between any ordered pair of parties must be delivered reliably and in order. The
/// `phase` is a human-readable label of the protocol step, used for logging and errors.
pub trait Channel {
    /// The error that can occur sending messages over the channel.
    type SendError: fmt::Debug;
    /// The error that can occur receiving messages over the channel.
    type RecvError: fmt::Debug;

    /// Sends a message to the party with the given index (must be between `0..participants`).
    fn send_bytes_to(
        &mut self,
        party: usize,
        phase: &str,
        msg: Vec<u8>,
    ) -> impl Future<Output = Result<(), Self::SendError>> + Send;

    /// Awaits a response from the party with the given index (must be between `0..participants`).
    fn recv_bytes_from(
        &mut self,
        party: usize,
        phase: &str,
    ) -> impl Future<Output = Result<Vec<u8>, Self::RecvError>> + Send;
}

/// Serializes and sends an MPC message to the other party.
pub async fn send_to<C: Channel, T: Serialize + ?Sized>(
    channel: &mut C,
    party: usize,
    phase: &str,
    msg: &T,
) -> Result<(), Error> {
    let msg = bincode::serialize(msg).map_err(|e| Error {
        phase: format!("sending {phase}"),
        reason: ErrorKind::SerdeError(format!("{e:?}")),
    })?;
    channel
        .send_bytes_to(party, phase, msg)
        .await
        .map_err(|e| Error {
            phase: phase.to_string(),
            reason: ErrorKind::SendError(format!("{e:?}")),
        })
}

/// Receives and deserializes an MPC message from the other party.
pub async fn recv_from<C: Channel, T: DeserializeOwned>(
    channel: &mut C,
    party: usize,
    phase: &str,
) -> Result<T, Error> {
    let msg = channel
        .recv_bytes_from(party, phase)
        .await
        .map_err(|e| Error {
            phase: phase.to_string(),
            reason: ErrorKind::RecvError(format!("{e:?}")),
        })?;
    bincode::deserialize(&msg).map_err(|e| Error {
        phase: format!("receiving {phase}"),
        reason: ErrorKind::SerdeError(format!("{e:?}")),
    })
}

/// Receives and deserializes a Vec from the other party (while checking the length).
pub async fn recv_vec_from<C: Channel, T: DeserializeOwned>(
    channel: &mut C,
    party: usize,
    phase: &str,
    len: usize,
) -> Result<Vec<T>, Error> {
    let v: Vec<T> = recv_from(channel, party, phase).await?;
    if v.len() == len {
        Ok(v)
    } else {
        Err(Error {
            phase: phase.to_string(),
            reason: ErrorKind::InvalidLength {
                expected: len,
                actual: v.len(),
            },
        })
    }
}

/// Messages and bytes sent over a [`SimpleChannel`], useful for measuring communication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// The number of messages sent.
    pub msgs_sent: usize,
    /// The total number of bytes sent.
    pub bytes_sent: usize,
}

/// A simple in-process channel using [`Sender`] and [`Receiver`].
#[derive(Debug)]
pub struct SimpleChannel {
    s: Vec<Option<Sender<Vec<u8>>>>,
    r: Vec<Option<Receiver<Vec<u8>>>>,
    recv_timeout: Duration,
    stats: Stats,
}

impl SimpleChannel {
    /// Creates channels for N parties to communicate with each other.
    pub fn channels(parties: usize) -> Vec<Self> {
        Self::with_config(parties, &Config::default())
    }

    /// Creates channels for N parties, using the receive timeout of the config.
    pub fn with_config(parties: usize, config: &Config) -> Vec<Self> {
        let buffer_capacity = 1024;
        let mut channels: Vec<_> = (0..parties)
            .map(|_| SimpleChannel {
                s: (0..parties).map(|_| None).collect(),
                r: (0..parties).map(|_| None).collect(),
                recv_timeout: config.recv_timeout,
                stats: Stats::default(),
            })
            .collect();
        for a in 0..parties {
            for b in (a + 1)..parties {
                let (send_a_to_b, recv_a_to_b) = channel(buffer_capacity);
                let (send_b_to_a, recv_b_to_a) = channel(buffer_capacity);
                channels[a].s[b] = Some(send_a_to_b);
                channels[b].s[a] = Some(send_b_to_a);
                channels[a].r[b] = Some(recv_b_to_a);
                channels[b].r[a] = Some(recv_a_to_b);
            }
        }
        channels
    }

    /// Returns how much has been sent over this channel so far.
    pub fn stats(&self) -> Stats {
        self.stats
    }
}

#[derive(Debug, thiserror::Error)]
/// The error raised by `send` and `recv` calls of a [`SimpleChannel`].
pub enum SimpleChannelError {
    /// There is no connection to the party (e.g. a party trying to talk to itself).
    #[error("no connection to party {0}")]
    NoSuchPeer(usize),
    /// The channel has been closed.
    #[error("the channel has been closed")]
    Closed,
    /// No message was received before the timeout.
    #[error("no message was received before the timeout")]
    TimeoutElapsed,
}

impl Channel for SimpleChannel {
    type SendError = SimpleChannelError;
    type RecvError = SimpleChannelError;

    async fn send_bytes_to(
        &mut self,
        p: usize,
        phase: &str,
        msg: Vec<u8>,
    ) -> Result<(), SimpleChannelError> {
        trace!(to = p, phase, bytes = msg.len(), "sending msg");
        let len = msg.len();
        self.s
            .get(p)
            .and_then(Option::as_ref)
            .ok_or(SimpleChannelError::NoSuchPeer(p))?
            .send(msg)
            .await
            .map_err(|_| SimpleChannelError::Closed)?;
        self.stats.msgs_sent += 1;
        self.stats.bytes_sent += len;
        Ok(())
    }

    async fn recv_bytes_from(
        &mut self,
        p: usize,
        phase: &str,
    ) -> Result<Vec<u8>, SimpleChannelError> {
        let recv_timeout = self.recv_timeout;
        let receiver = self
            .r
            .get_mut(p)
            .and_then(Option::as_mut)
            .ok_or(SimpleChannelError::NoSuchPeer(p))?;
        match timeout(recv_timeout, receiver.recv()).await {
            Ok(Some(msg)) => {
                trace!(from = p, phase, bytes = msg.len(), "received msg");
                Ok(msg)
            }
            Ok(None) => Err(SimpleChannelError::Closed),
            Err(_) => Err(SimpleChannelError::TimeoutElapsed),
        }
    }
}
