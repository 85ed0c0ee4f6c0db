//! The per-party execution context: party identity, channel, randomness and preprocessing.

use std::collections::VecDeque;

use serde::{Serialize, de::DeserializeOwned};
use subtle::ConstantTimeEq;
use tracing::{Level, instrument, warn};

use crate::{
    backend::{beaver::TripleShare, replicated::ZeroSharing},
    channel::{self, Channel},
    error::Error,
    prg::Prg,
};

/// Everything a single party needs to take part in a computation.
///
/// A context is owned by exactly one party and must only be used by one computation at a time.
/// All parties must call the collective operations of their contexts in the same order.
#[derive(Debug)]
pub struct Context<C: Channel> {
    party: usize,
    parties: usize,
    channel: C,
    prg: Prg,
    triples: VecDeque<TripleShare>,
    zero_sharing: Option<ZeroSharing>,
    aborted: bool,
}

impl<C: Channel> Context<C> {
    /// Creates the context of `party` in a computation between `parties` parties.
    pub fn new(party: usize, parties: usize, channel: C) -> Result<Self, Error> {
        if parties < 2 {
            return Err(Error::TooFewParties(parties));
        }
        if party >= parties {
            return Err(Error::PartyDoesNotExist(party));
        }
        Ok(Self {
            party,
            parties,
            channel,
            prg: Prg::new(),
            triples: VecDeque::new(),
            zero_sharing: None,
            aborted: false,
        })
    }

    /// Replaces the OS-seeded PRG, e.g. with a deterministic one for tests.
    pub fn with_prg(mut self, prg: Prg) -> Self {
        self.prg = prg;
        self
    }

    /// The index of this party.
    pub fn party(&self) -> usize {
        self.party
    }

    /// The total number of parties.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// All parties except this one, in ascending order.
    pub fn peers(&self) -> impl Iterator<Item = usize> + use<C> {
        let me = self.party;
        (0..self.parties).filter(move |p| *p != me)
    }

    /// The underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Consumes the context and returns its channel.
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// The PRG of this party.
    pub fn prg(&mut self) -> &mut Prg {
        &mut self.prg
    }

    /// Whether an earlier communication failure aborted this context.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Number of multiplication triples that are still available.
    pub fn remaining_triples(&self) -> usize {
        self.triples.len()
    }

    pub(crate) fn check_party(&self, party: usize) -> Result<(), Error> {
        if party < self.parties {
            Ok(())
        } else {
            Err(Error::PartyDoesNotExist(party))
        }
    }

    /// Validates the receivers of a reveal, sorted and without duplicates.
    pub(crate) fn receivers(&self, receivers: &[usize]) -> Result<Vec<usize>, Error> {
        receivers.iter().try_for_each(|r| self.check_party(*r))?;
        let mut receivers = receivers.to_vec();
        receivers.sort_unstable();
        receivers.dedup();
        Ok(receivers)
    }

    pub(crate) fn check_not_aborted(&self) -> Result<(), Error> {
        if self.aborted {
            Err(Error::Aborted)
        } else {
            Ok(())
        }
    }

    pub(crate) fn add_triples(&mut self, triples: Vec<TripleShare>) {
        self.triples.extend(triples);
    }

    pub(crate) fn next_triple(&mut self) -> Result<TripleShare, Error> {
        self.triples
            .pop_front()
            .ok_or(Error::MissingPreprocessing("no multiplication triples left"))
    }

    pub(crate) fn zero_sharing_mut(&mut self) -> Option<&mut ZeroSharing> {
        self.zero_sharing.as_mut()
    }

    pub(crate) fn set_zero_sharing(&mut self, zero_sharing: ZeroSharing) {
        self.zero_sharing = Some(zero_sharing);
    }

    /// Sends a message over the channel, aborting the context if that fails.
    pub(crate) async fn send<T: Serialize + ?Sized>(
        &mut self,
        party: usize,
        phase: &str,
        msg: &T,
    ) -> Result<(), Error> {
        self.check_not_aborted()?;
        match channel::send_to(&mut self.channel, party, phase, msg).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(party = self.party, to = party, "{e}, aborting");
                self.aborted = true;
                Err(e.into())
            }
        }
    }

    /// Receives a message over the channel, aborting the context if that fails.
    pub(crate) async fn recv<T: DeserializeOwned>(
        &mut self,
        party: usize,
        phase: &str,
    ) -> Result<T, Error> {
        self.check_not_aborted()?;
        match channel::recv_from(&mut self.channel, party, phase).await {
            Ok(msg) => Ok(msg),
            Err(e) => {
                warn!(party = self.party, from = party, "{e}, aborting");
                self.aborted = true;
                Err(e.into())
            }
        }
    }

    /// Receives a vector of exactly `len` elements, aborting the context if that fails.
    pub(crate) async fn recv_vec<T: DeserializeOwned>(
        &mut self,
        party: usize,
        phase: &str,
        len: usize,
    ) -> Result<Vec<T>, Error> {
        self.check_not_aborted()?;
        match channel::recv_vec_from(&mut self.channel, party, phase, len).await {
            Ok(msg) => Ok(msg),
            Err(e) => {
                warn!(party = self.party, from = party, "{e}, aborting");
                self.aborted = true;
                Err(e.into())
            }
        }
    }

    /// Checks that all parties hold the same public view, by exchanging its hash.
    ///
    /// Secret positions must be `None` in the view, so they are compared only by position.
    #[instrument(level = Level::DEBUG, skip_all, fields(party = self.party), err)]
    pub(crate) async fn check_public_view(&mut self, view: &[Option<bool>]) -> Result<(), Error> {
        let hash = blake3::hash(&encode_view(view));
        let hash = *hash.as_bytes();
        for p in self.peers() {
            self.send(p, "public view", &hash).await?;
        }
        let mut mismatch = None;
        for p in self.peers() {
            let theirs: [u8; 32] = self.recv(p, "public view").await?;
            if mismatch.is_none() && !bool::from(theirs.ct_eq(&hash)) {
                mismatch = Some(p);
            }
        }
        match mismatch {
            None => Ok(()),
            Some(party) => {
                warn!(party = self.party, with = party, "public views differ, aborting");
                self.aborted = true;
                Err(Error::ConstantMismatch { party })
            }
        }
    }
}

fn encode_view(view: &[Option<bool>]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + view.len());
    bytes.extend((view.len() as u64).to_le_bytes());
    bytes.extend(view.iter().map(|b| match b {
        None => 2,
        Some(false) => 0,
        Some(true) => 1,
    }));
    bytes
}

#[cfg(test)]
mod tests {
    use super::Context;
    use crate::{channel::SimpleChannel, error::Error};

    #[test]
    fn rejects_invalid_party_indices() {
        let mut channels = SimpleChannel::channels(2);
        let ch = channels.pop().unwrap();
        assert!(matches!(
            Context::new(2, 2, ch),
            Err(Error::PartyDoesNotExist(2))
        ));
        let ch = channels.pop().unwrap();
        assert!(matches!(Context::new(0, 1, ch), Err(Error::TooFewParties(1))));
    }

    #[test]
    fn peers_skip_own_index() {
        let mut channels = SimpleChannel::channels(3);
        let ch = channels.remove(1);
        let ctx = Context::new(1, 3, ch).unwrap();
        assert_eq!(ctx.peers().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[tokio::test]
    async fn failed_send_aborts_context() {
        let mut channels = SimpleChannel::channels(2);
        drop(channels.pop());
        let mut ctx = Context::new(0, 2, channels.pop().unwrap()).unwrap();
        let err = ctx.send(1, "gone", &true).await.unwrap_err();
        assert!(matches!(err, Error::Channel(_)));
        assert!(ctx.is_aborted());
        let err = ctx.recv::<bool>(1, "gone").await.unwrap_err();
        assert!(matches!(err, Error::Aborted));
    }

    #[tokio::test]
    async fn missing_triples_are_reported() {
        let mut channels = SimpleChannel::channels(2);
        let mut ctx = Context::new(1, 2, channels.pop().unwrap()).unwrap();
        assert!(matches!(
            ctx.next_triple(),
            Err(Error::MissingPreprocessing(_))
        ));
    }
}
