//! Beaver multiplication triples, handed out by a trusted dealer.
//!
//! The dealer is not one of the computing parties, it is an extra endpoint of the channel (usually
//! at index `parties`). Each party asks the dealer for the same number of triples before the
//! computation starts, every AND of two secret GMW bits then consumes one triple.

use serde::{Deserialize, Serialize};
use tracing::{Level, debug, instrument, warn};

use crate::{
    backend::gmw::SecureMultiply,
    channel::{Channel, recv_from, send_to},
    context::Context,
    error::Error,
    prg::Prg,
};

/// One party's XOR share of a triple `(a, b, c)` with `c = a & b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TripleShare {
    pub(crate) a: bool,
    pub(crate) b: bool,
    pub(crate) c: bool,
}

#[derive(Debug, Serialize, Deserialize)]
enum DealerMsg {
    Triples(Vec<TripleShare>),
    Abort(String),
}

/// The largest number of triples the dealer hands out to each party in one batch.
pub const MAX_TRIPLES: usize = 1 << 24;

/// Runs the trusted dealer, serving one batch of triples to each of the `parties` parties.
///
/// Returns the number of triples that each party received. If the parties disagree on the number
/// of triples, or ask for more than [`MAX_TRIPLES`], every party is told to abort.
#[instrument(level = Level::DEBUG, skip_all, fields(parties = parties), err)]
pub async fn deal_triples(
    channel: &mut impl Channel,
    parties: usize,
    prg: &mut Prg,
) -> Result<usize, Error> {
    let mut count = None;
    for p in 0..parties {
        let requested: u64 = recv_from(channel, p, "triple count (dealer)").await?;
        let requested = usize::try_from(requested).unwrap_or(usize::MAX);
        match count {
            Some(expected) if expected != requested => {
                let e = Error::PreprocessingMismatch {
                    expected,
                    actual: requested,
                };
                return abort_all(channel, parties, e).await;
            }
            _ => count = Some(requested),
        }
    }
    let count = count.unwrap_or_default();
    if count > MAX_TRIPLES {
        let e = Error::TooManyTriples {
            requested: count,
            max: MAX_TRIPLES,
        };
        return abort_all(channel, parties, e).await;
    }
    let mut triples: Vec<Vec<TripleShare>> =
        (0..parties).map(|_| Vec::with_capacity(count)).collect();
    for _ in 0..count {
        let a = prg.rand_bool();
        let b = prg.rand_bool();
        let a_shares = xor_shares(prg, parties, a);
        let b_shares = xor_shares(prg, parties, b);
        let c_shares = xor_shares(prg, parties, a & b);
        for (p, triples) in triples.iter_mut().enumerate() {
            triples.push(TripleShare {
                a: a_shares[p],
                b: b_shares[p],
                c: c_shares[p],
            });
        }
    }
    for (p, triples) in triples.into_iter().enumerate() {
        send_to(channel, p, "triples (dealer)", &DealerMsg::Triples(triples)).await?;
    }
    debug!(count, "dealt triples");
    Ok(count)
}

async fn abort_all(
    channel: &mut impl Channel,
    parties: usize,
    e: Error,
) -> Result<usize, Error> {
    warn!("{e}, aborting preprocessing");
    for p in 0..parties {
        send_to(channel, p, "triples (dealer)", &DealerMsg::Abort(e.to_string())).await?;
    }
    Err(e)
}

fn xor_shares(prg: &mut Prg, parties: usize, bit: bool) -> Vec<bool> {
    let mut shares: Vec<bool> = (1..parties).map(|_| prg.rand_bool()).collect();
    let last = shares.iter().fold(bit, |acc, s| acc ^ s);
    shares.push(last);
    shares
}

/// Multiplication of GMW shares using triples from a trusted dealer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Beaver;

impl Beaver {
    /// Requests `count` triples from the `dealer` and stores them in the context.
    ///
    /// All parties must request the same number of triples, otherwise the dealer aborts.
    #[instrument(level = Level::DEBUG, skip_all, fields(party = ctx.party(), dealer = dealer, count = count), err)]
    pub async fn preprocess<C: Channel>(
        ctx: &mut Context<C>,
        dealer: usize,
        count: usize,
    ) -> Result<(), Error> {
        ctx.send(dealer, "triple count (dealer)", &(count as u64))
            .await?;
        match ctx.recv(dealer, "triples (dealer)").await? {
            DealerMsg::Triples(triples) if triples.len() == count => {
                ctx.add_triples(triples);
                Ok(())
            }
            DealerMsg::Triples(triples) => Err(Error::PreprocessingMismatch {
                expected: count,
                actual: triples.len(),
            }),
            DealerMsg::Abort(reason) => Err(Error::PreprocessingRejected(reason)),
        }
    }
}

impl SecureMultiply for Beaver {
    async fn multiply<C: Channel>(ctx: &mut Context<C>, x: bool, y: bool) -> Result<bool, Error> {
        let TripleShare { a, b, c } = ctx.next_triple()?;
        let (d_share, e_share) = (x ^ a, y ^ b);
        let peers: Vec<usize> = ctx.peers().collect();
        for &p in &peers {
            ctx.send(p, "open d, e (beaver)", &(d_share, e_share))
                .await?;
        }
        let (mut d, mut e) = (d_share, e_share);
        for &p in &peers {
            let (d_p, e_p): (bool, bool) = ctx.recv(p, "open d, e (beaver)").await?;
            d ^= d_p;
            e ^= e_p;
        }
        let mut z = c ^ (d & b) ^ (e & a);
        if ctx.party() == 0 {
            z ^= d & e;
        }
        Ok(z)
    }
}
