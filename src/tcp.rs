//! A [`Channel`] over TCP connections between all pairs of parties.
//!
//! Every message is sent as a frame: its length as a little-endian `u32`, followed by the bytes
//! of the message. When a connection is established, the connecting party first sends its own
//! index as a little-endian `u32`. Each party connects to all parties with a lower index and
//! accepts connections from all parties with a higher index.

use std::{net::SocketAddr, time::Duration};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    time::{sleep, timeout},
};
use tracing::{Level, debug, instrument, trace};

use crate::{channel::Channel, config::Config};

/// Errors that can occur while connecting or talking to other parties over TCP.
#[derive(Debug, thiserror::Error)]
pub enum TcpError {
    /// An I/O error on one of the sockets.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// No address was configured for the party.
    #[error("no address for party {0}")]
    MissingAddress(usize),
    /// There is no connection to the party (e.g. a party trying to talk to itself).
    #[error("no connection to party {0}")]
    NoSuchPeer(usize),
    /// A connecting peer announced an index it is not allowed to use.
    #[error("unexpected handshake from party {0}")]
    Handshake(usize),
    /// A frame is larger than the configured maximum.
    #[error("frame of {0} bytes exceeds the maximum frame length")]
    FrameTooLarge(usize),
    /// No message was received before the timeout.
    #[error("no message was received before the timeout")]
    TimeoutElapsed,
}

#[derive(Debug)]
struct Peer {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

impl Peer {
    fn new(stream: TcpStream) -> Result<Self, TcpError> {
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        Ok(Self { reader, writer })
    }
}

/// Length-prefixed TCP connections from one party to all others.
#[derive(Debug)]
pub struct TcpChannel {
    party: usize,
    peers: Vec<Option<Peer>>,
    recv_timeout: Duration,
    max_frame_len: usize,
}

impl TcpChannel {
    /// Listens on the address of `party` and connects to all other parties in `addrs`.
    pub async fn connect(
        party: usize,
        addrs: &[SocketAddr],
        config: &Config,
    ) -> Result<Self, TcpError> {
        let addr = addrs.get(party).ok_or(TcpError::MissingAddress(party))?;
        let listener = TcpListener::bind(addr).await?;
        Self::establish(party, listener, addrs, config).await
    }

    /// Connects to all other parties in `addrs`, accepting connections on `listener`.
    #[instrument(level = Level::DEBUG, skip_all, fields(party = party), err)]
    pub async fn establish(
        party: usize,
        listener: TcpListener,
        addrs: &[SocketAddr],
        config: &Config,
    ) -> Result<Self, TcpError> {
        let parties = addrs.len();
        if party >= parties {
            return Err(TcpError::MissingAddress(party));
        }
        let mut peers: Vec<Option<Peer>> = (0..parties).map(|_| None).collect();
        for (p, addr) in addrs.iter().enumerate().take(party) {
            let mut stream = connect_with_retry(*addr, config).await?;
            stream.write_all(&(party as u32).to_le_bytes()).await?;
            debug!(to = p, "connected");
            peers[p] = Some(Peer::new(stream)?);
        }
        for _ in (party + 1)..parties {
            let (mut stream, _) = listener.accept().await?;
            let mut id = [0; 4];
            timeout(config.recv_timeout, stream.read_exact(&mut id))
                .await
                .map_err(|_| TcpError::TimeoutElapsed)??;
            let p = u32::from_le_bytes(id) as usize;
            if p <= party || p >= parties || peers[p].is_some() {
                return Err(TcpError::Handshake(p));
            }
            debug!(from = p, "accepted");
            peers[p] = Some(Peer::new(stream)?);
        }
        Ok(Self {
            party,
            peers,
            recv_timeout: config.recv_timeout,
            max_frame_len: config.max_frame_len.min(u32::MAX as usize),
        })
    }

    /// The index of this party.
    pub fn party(&self) -> usize {
        self.party
    }

    fn peer(&mut self, p: usize) -> Result<&mut Peer, TcpError> {
        self.peers
            .get_mut(p)
            .and_then(Option::as_mut)
            .ok_or(TcpError::NoSuchPeer(p))
    }
}

async fn connect_with_retry(addr: SocketAddr, config: &Config) -> Result<TcpStream, TcpError> {
    let mut attempts = 0;
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) if attempts < config.connect_retries => {
                attempts += 1;
                trace!(%addr, attempts, "could not connect: {e}");
                sleep(config.connect_retry_delay).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// The length prefix of a frame, which must fit both the maximum and a `u32`.
fn frame_len(len: usize, max_frame_len: usize) -> Result<u32, TcpError> {
    if len > max_frame_len {
        return Err(TcpError::FrameTooLarge(len));
    }
    u32::try_from(len).map_err(|_| TcpError::FrameTooLarge(len))
}

impl Channel for TcpChannel {
    type SendError = TcpError;
    type RecvError = TcpError;

    async fn send_bytes_to(&mut self, p: usize, phase: &str, msg: Vec<u8>) -> Result<(), TcpError> {
        let len = frame_len(msg.len(), self.max_frame_len)?;
        trace!(to = p, phase, bytes = msg.len(), "sending msg");
        let peer = self.peer(p)?;
        peer.writer.write_all(&len.to_le_bytes()).await?;
        peer.writer.write_all(&msg).await?;
        peer.writer.flush().await?;
        Ok(())
    }

    async fn recv_bytes_from(&mut self, p: usize, phase: &str) -> Result<Vec<u8>, TcpError> {
        let recv_timeout = self.recv_timeout;
        let max_frame_len = self.max_frame_len;
        let peer = self.peer(p)?;
        let frame = async {
            let mut len = [0; 4];
            peer.reader.read_exact(&mut len).await?;
            let len = u32::from_le_bytes(len) as usize;
            if len > max_frame_len {
                return Err(TcpError::FrameTooLarge(len));
            }
            let mut msg = vec![0; len];
            peer.reader.read_exact(&mut msg).await?;
            Ok(msg)
        };
        let msg = timeout(recv_timeout, frame)
            .await
            .map_err(|_| TcpError::TimeoutElapsed)??;
        trace!(from = p, phase, bytes = msg.len(), "received msg");
        Ok(msg)
    }
}
