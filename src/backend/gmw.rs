//! GMW-style XOR sharing among any number of parties.
//!
//! A secret bit `x` is split into one share per party, such that `x` is the XOR of all shares.
//! XOR gates are local, AND gates of two secret bits are delegated to a [`SecureMultiply`] scheme.
//!
//! Inputs can also come from a client outside the computing parties, which deals its shares with
//! [`share_from_client`], and outputs can be opened to such a client with
//! [`reconstruct_at_client`].

use std::{fmt, marker::PhantomData};

use tracing::{Level, instrument};

use crate::{
    backend::{BaseBit, ClientIo, Multiply, beaver::Beaver, check_client, check_dealer},
    channel::{Channel, recv_vec_from, send_to},
    context::Context,
    error::Error,
    prg::Prg,
    ring::{BooleanRing, Ring},
};

/// A way of multiplying two XOR-shared secret bits.
#[allow(async_fn_in_trait)]
pub trait SecureMultiply: Clone + fmt::Debug {
    /// Computes a share of `x & y` from the shares `x` and `y`.
    async fn multiply<C: Channel>(ctx: &mut Context<C>, x: bool, y: bool) -> Result<bool, Error>;
}

/// Marker for GMW bits without any multiplication, supporting only linear circuits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoMultiply;

/// A XOR-shared bit, or a public constant.
///
/// The multiplication scheme `M` is part of the type: `GmwBit<Beaver>` implements [`Multiply`],
/// while `GmwBit<NoMultiply>` only supports XOR and AND with public constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GmwBit<M = Beaver> {
    share: bool,
    is_constant: bool,
    multiply: PhantomData<M>,
}

impl<M> GmwBit<M> {
    fn secret(share: bool) -> Self {
        Self {
            share,
            is_constant: false,
            multiply: PhantomData,
        }
    }

    fn public(value: bool) -> Self {
        Self {
            share: value,
            is_constant: true,
            multiply: PhantomData,
        }
    }

    /// This party's share (the value itself for a public constant).
    pub fn local_share(&self) -> bool {
        self.share
    }
}

impl<M: Clone + fmt::Debug> BaseBit for GmwBit<M> {
    fn constant(value: bool) -> Self {
        Self::public(value)
    }

    fn public_value(&self) -> Option<bool> {
        self.is_constant.then_some(self.share)
    }

    #[instrument(level = Level::TRACE, skip_all, fields(party = ctx.party(), dealer = dealer), err)]
    async fn share<C: Channel>(
        ctx: &mut Context<C>,
        dealer: usize,
        clear: Option<bool>,
    ) -> Result<Self, Error> {
        let share = match check_dealer(ctx, dealer, clear)? {
            Some(clear) => {
                // parties 0..P-1 get random bits, the last party gets the correction
                let last = ctx.parties() - 1;
                let mut correction = clear;
                let mut own = None;
                for p in 0..ctx.parties() {
                    let share = if p < last {
                        let r = ctx.prg().rand_bool();
                        correction = BooleanRing::sub(correction, r);
                        r
                    } else {
                        correction
                    };
                    if p == dealer {
                        own = Some(share);
                    } else {
                        ctx.send(p, "share (gmw)", &share).await?;
                    }
                }
                own.ok_or(Error::PartyDoesNotExist(dealer))?
            }
            None => ctx.recv(dealer, "share (gmw)").await?,
        };
        Ok(Self::secret(share))
    }

    #[instrument(level = Level::TRACE, skip_all, fields(party = ctx.party()), err)]
    async fn reveal<C: Channel>(
        &self,
        ctx: &mut Context<C>,
        receivers: &[usize],
    ) -> Result<Option<bool>, Error> {
        let receivers = ctx.receivers(receivers)?;
        ctx.check_not_aborted()?;
        let me = ctx.party();
        let is_receiver = receivers.contains(&me);
        if let Some(value) = self.public_value() {
            return Ok(is_receiver.then_some(value));
        }
        for &r in receivers.iter().filter(|r| **r != me) {
            ctx.send(r, "reveal (gmw)", &self.share).await?;
        }
        if !is_receiver {
            return Ok(None);
        }
        let mut value = self.share;
        for p in ctx.peers() {
            let share: bool = ctx.recv(p, "reveal (gmw)").await?;
            value = BooleanRing::add(value, share);
        }
        Ok(Some(value))
    }

    fn xor<C: Channel>(ctx: &Context<C>, l: &Self, r: &Self) -> Self {
        match (l.public_value(), r.public_value()) {
            (Some(l), Some(r)) => Self::public(BooleanRing::add(l, r)),
            (Some(c), None) | (None, Some(c)) => {
                let secret = if l.is_constant { r } else { l };
                if ctx.party() == 0 {
                    Self::secret(BooleanRing::add(secret.share, c))
                } else {
                    Self::secret(secret.share)
                }
            }
            (None, None) => Self::secret(BooleanRing::add(l.share, r.share)),
        }
    }

    fn and_public(l: &Self, r: &Self) -> Result<Self, Error> {
        match (l.public_value(), r.public_value()) {
            (Some(l), Some(r)) => Ok(Self::public(BooleanRing::mul(l, r))),
            (Some(false), None) | (None, Some(false)) => Ok(Self::public(BooleanRing::zero())),
            (Some(true), None) => Ok(r.clone()),
            (None, Some(true)) => Ok(l.clone()),
            (None, None) => Err(Error::Unsupported(
                "AND of two secret bits needs a multiplication scheme",
            )),
        }
    }
}

impl<M: SecureMultiply> Multiply for GmwBit<M> {
    #[instrument(level = Level::TRACE, skip_all, fields(party = ctx.party()), err)]
    async fn and<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        if l.is_constant || r.is_constant {
            return Self::and_public(l, r);
        }
        ctx.check_not_aborted()?;
        let share = M::multiply(ctx, l.share, r.share).await?;
        Ok(Self::secret(share))
    }
}

impl<M: Clone + fmt::Debug> ClientIo for GmwBit<M> {
    #[instrument(level = Level::TRACE, skip_all, fields(party = ctx.party(), client = client), err)]
    async fn receive_from_client<C: Channel>(
        ctx: &mut Context<C>,
        client: usize,
        len: usize,
    ) -> Result<Vec<Self>, Error> {
        check_client(ctx, client)?;
        let shares: Vec<bool> = ctx.recv_vec(client, "share from client (gmw)", len).await?;
        Ok(shares.into_iter().map(Self::secret).collect())
    }

    #[instrument(level = Level::TRACE, skip_all, fields(party = ctx.party(), client = client), err)]
    async fn reveal_to_client<C: Channel>(
        ctx: &mut Context<C>,
        client: usize,
        bits: &[Self],
    ) -> Result<(), Error> {
        check_client(ctx, client)?;
        let me = ctx.party();
        // a constant counts as party 0's share
        let shares: Vec<bool> = bits
            .iter()
            .map(|bit| match bit.public_value() {
                Some(value) => me == 0 && value,
                None => bit.share,
            })
            .collect();
        ctx.send(client, "reveal to client (gmw)", &shares).await
    }
}

/// Secret-shares the bits `clear` of an input client among the `parties` computing parties.
///
/// Runs on the client's own channel endpoint. The parties receive their shares with
/// [`ClientIo::receive_from_client`].
#[instrument(level = Level::DEBUG, skip_all, fields(parties = parties, len = clear.len()), err)]
pub async fn share_from_client(
    channel: &mut impl Channel,
    parties: usize,
    prg: &mut Prg,
    clear: &[bool],
) -> Result<(), Error> {
    if parties < 2 {
        return Err(Error::TooFewParties(parties));
    }
    let mut correction = clear.to_vec();
    for p in 0..parties - 1 {
        let share: Vec<bool> = clear.iter().map(|_| prg.rand_bool()).collect();
        for (c, s) in correction.iter_mut().zip(&share) {
            *c = BooleanRing::sub(*c, *s);
        }
        send_to(channel, p, "share from client (gmw)", &share).await?;
    }
    send_to(channel, parties - 1, "share from client (gmw)", &correction).await?;
    Ok(())
}

/// Reconstructs `len` bits at an output client from the shares of all `parties` parties.
///
/// Runs on the client's own channel endpoint, while the parties call
/// [`ClientIo::reveal_to_client`].
#[instrument(level = Level::DEBUG, skip_all, fields(parties = parties, len = len), err)]
pub async fn reconstruct_at_client(
    channel: &mut impl Channel,
    parties: usize,
    len: usize,
) -> Result<Vec<bool>, Error> {
    let mut value = vec![false; len];
    for p in 0..parties {
        let shares: Vec<bool> = recv_vec_from(channel, p, "reveal to client (gmw)", len).await?;
        for (v, s) in value.iter_mut().zip(shares) {
            *v = BooleanRing::add(*v, s);
        }
    }
    Ok(value)
}
