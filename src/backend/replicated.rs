//! 2-out-of-3 replicated sharing among exactly 3 parties.
//!
//! A secret bit `x = x0 ^ x1 ^ x2` is held such that party `i` knows the pair `(x_i, x_{i-1})`
//! (indices mod 3). Any two parties can reconstruct `x`, no single party learns anything about
//! it. AND gates need one message per party, masked by a fresh sharing of zero that the parties
//! derive from pairwise PRG seeds set up once per context with [`setup`].
//!
//! A client outside the 3 parties can deal an input with [`share_from_client`] and open an output
//! with [`reconstruct_at_client`], which checks that the two copies of each component agree.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{Level, debug, instrument};

use crate::{
    backend::{BaseBit, ClientIo, Multiply, check_client, check_dealer},
    channel::{Channel, recv_vec_from, send_to},
    context::Context,
    error::Error,
    prg::Prg,
    ring::{BooleanRing, Ring},
};

const PARTIES: usize = 3;

fn next(party: usize) -> usize {
    (party + 1) % PARTIES
}

fn prev(party: usize) -> usize {
    (party + PARTIES - 1) % PARTIES
}

fn check_parties<C: Channel>(ctx: &Context<C>) -> Result<(), Error> {
    if ctx.parties() == PARTIES {
        Ok(())
    } else {
        Err(Error::WrongPartyCount {
            expected: PARTIES,
            actual: ctx.parties(),
        })
    }
}

/// Two PRGs, one shared with the next and one with the previous party.
///
/// The XOR of the outputs over all 3 parties is always zero.
#[derive(Debug)]
pub(crate) struct ZeroSharing {
    mine: ChaCha20Rng,
    prev: ChaCha20Rng,
}

impl ZeroSharing {
    fn next_bit(&mut self) -> bool {
        let mine: bool = self.mine.random();
        let prev: bool = self.prev.random();
        BooleanRing::add(mine, prev)
    }
}

/// Exchanges PRG seeds with the neighbouring parties, needed before any secret AND.
///
/// Each party sends a fresh seed to the next party and receives one from the previous party.
#[instrument(level = Level::DEBUG, skip_all, fields(party = ctx.party()), err)]
pub async fn setup<C: Channel>(ctx: &mut Context<C>) -> Result<(), Error> {
    check_parties(ctx)?;
    let me = ctx.party();
    let seed = ctx.prg().rand_seed();
    ctx.send(next(me), "zero sharing seed (replicated)", &seed)
        .await?;
    let prev_seed: [u8; 32] = ctx.recv(prev(me), "zero sharing seed (replicated)").await?;
    ctx.set_zero_sharing(ZeroSharing {
        mine: ChaCha20Rng::from_seed(seed),
        prev: ChaCha20Rng::from_seed(prev_seed),
    });
    debug!("zero sharing is set up");
    Ok(())
}

/// A replicated secret bit, or a public constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicatedBit {
    a: bool,
    b: bool,
    is_constant: bool,
}

impl ReplicatedBit {
    fn secret(a: bool, b: bool) -> Self {
        Self {
            a,
            b,
            is_constant: false,
        }
    }

    /// This party's pair of components `(x_i, x_{i-1})`.
    pub fn components(&self) -> (bool, bool) {
        (self.a, self.b)
    }

    fn add_constant(&self, party: usize, c: bool) -> Self {
        match party {
            0 => Self::secret(BooleanRing::add(self.a, c), self.b),
            1 => Self::secret(self.a, BooleanRing::add(self.b, c)),
            _ => *self,
        }
    }
}

impl BaseBit for ReplicatedBit {
    fn constant(value: bool) -> Self {
        Self {
            a: value,
            b: value,
            is_constant: true,
        }
    }

    fn public_value(&self) -> Option<bool> {
        self.is_constant.then_some(self.a)
    }

    #[instrument(level = Level::TRACE, skip_all, fields(party = ctx.party(), dealer = dealer), err)]
    async fn share<C: Channel>(
        ctx: &mut Context<C>,
        dealer: usize,
        clear: Option<bool>,
    ) -> Result<Self, Error> {
        check_parties(ctx)?;
        let me = ctx.party();
        match check_dealer(ctx, dealer, clear)? {
            Some(clear) => {
                let x0 = ctx.prg().rand_bool();
                let x1 = ctx.prg().rand_bool();
                let x2 = BooleanRing::sub(BooleanRing::sub(clear, x0), x1);
                let xs = [x0, x1, x2];
                for p in ctx.peers() {
                    ctx.send(p, "share (replicated)", &(xs[p], xs[prev(p)]))
                        .await?;
                }
                Ok(Self::secret(xs[me], xs[prev(me)]))
            }
            None => {
                let (a, b): (bool, bool) = ctx.recv(dealer, "share (replicated)").await?;
                Ok(Self::secret(a, b))
            }
        }
    }

    #[instrument(level = Level::TRACE, skip_all, fields(party = ctx.party()), err)]
    async fn reveal<C: Channel>(
        &self,
        ctx: &mut Context<C>,
        receivers: &[usize],
    ) -> Result<Option<bool>, Error> {
        check_parties(ctx)?;
        let receivers = ctx.receivers(receivers)?;
        ctx.check_not_aborted()?;
        let me = ctx.party();
        let is_receiver = receivers.contains(&me);
        if let Some(value) = self.public_value() {
            return Ok(is_receiver.then_some(value));
        }
        // the receiver r lacks x_{r+1}, held as `a` by r+1 and as `b` by r-1
        for &r in &receivers {
            if me == next(r) {
                ctx.send(r, "reveal (replicated)", &self.a).await?;
            } else if me == prev(r) {
                ctx.send(r, "reveal (replicated)", &self.b).await?;
            }
        }
        if !is_receiver {
            return Ok(None);
        }
        let from_next: bool = ctx.recv(next(me), "reveal (replicated)").await?;
        let from_prev: bool = ctx.recv(prev(me), "reveal (replicated)").await?;
        if from_next != from_prev {
            return Err(Error::InconsistentShares(next(me)));
        }
        let value = BooleanRing::add(BooleanRing::add(self.a, self.b), from_next);
        Ok(Some(value))
    }

    fn xor<C: Channel>(ctx: &Context<C>, l: &Self, r: &Self) -> Self {
        match (l.public_value(), r.public_value()) {
            (Some(l), Some(r)) => Self::constant(BooleanRing::add(l, r)),
            (Some(c), None) => r.add_constant(ctx.party(), c),
            (None, Some(c)) => l.add_constant(ctx.party(), c),
            (None, None) => Self::secret(BooleanRing::add(l.a, r.a), BooleanRing::add(l.b, r.b)),
        }
    }

    fn and_public(l: &Self, r: &Self) -> Result<Self, Error> {
        match (l.public_value(), r.public_value()) {
            (Some(l), Some(r)) => Ok(Self::constant(BooleanRing::mul(l, r))),
            (Some(false), None) | (None, Some(false)) => Ok(Self::constant(BooleanRing::zero())),
            (Some(true), None) => Ok(*r),
            (None, Some(true)) => Ok(*l),
            (None, None) => Err(Error::Unsupported(
                "AND of two secret bits needs a multiplication scheme",
            )),
        }
    }
}

impl Multiply for ReplicatedBit {
    #[instrument(level = Level::TRACE, skip_all, fields(party = ctx.party()), err)]
    async fn and<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        if l.is_constant || r.is_constant {
            return Self::and_public(l, r);
        }
        check_parties(ctx)?;
        ctx.check_not_aborted()?;
        let alpha = ctx
            .zero_sharing_mut()
            .ok_or(Error::MissingPreprocessing(
                "the zero sharing of the replicated backend is not set up",
            ))?
            .next_bit();
        let cross = BooleanRing::add(
            BooleanRing::mul(l.a, r.b),
            BooleanRing::mul(l.b, r.a),
        );
        let z = BooleanRing::add(
            BooleanRing::add(BooleanRing::mul(l.a, r.a), cross),
            alpha,
        );
        let me = ctx.party();
        ctx.send(next(me), "and (replicated)", &z).await?;
        let z_prev: bool = ctx.recv(prev(me), "and (replicated)").await?;
        Ok(Self::secret(z, z_prev))
    }
}

impl ClientIo for ReplicatedBit {
    #[instrument(level = Level::TRACE, skip_all, fields(party = ctx.party(), client = client), err)]
    async fn receive_from_client<C: Channel>(
        ctx: &mut Context<C>,
        client: usize,
        len: usize,
    ) -> Result<Vec<Self>, Error> {
        check_parties(ctx)?;
        check_client(ctx, client)?;
        let components: Vec<(bool, bool)> = ctx
            .recv_vec(client, "share from client (replicated)", len)
            .await?;
        Ok(components
            .into_iter()
            .map(|(a, b)| Self::secret(a, b))
            .collect())
    }

    #[instrument(level = Level::TRACE, skip_all, fields(party = ctx.party(), client = client), err)]
    async fn reveal_to_client<C: Channel>(
        ctx: &mut Context<C>,
        client: usize,
        bits: &[Self],
    ) -> Result<(), Error> {
        check_parties(ctx)?;
        check_client(ctx, client)?;
        let me = ctx.party();
        let components: Vec<(bool, bool)> = bits
            .iter()
            .map(|bit| match bit.public_value() {
                Some(c) => Self::secret(false, false).add_constant(me, c).components(),
                None => bit.components(),
            })
            .collect();
        ctx.send(client, "reveal to client (replicated)", &components)
            .await
    }
}

/// Secret-shares the bits `clear` of an input client among the 3 parties.
///
/// Runs on the client's own channel endpoint. The parties receive their components with
/// [`ClientIo::receive_from_client`].
#[instrument(level = Level::DEBUG, skip_all, fields(len = clear.len()), err)]
pub async fn share_from_client(
    channel: &mut impl Channel,
    prg: &mut Prg,
    clear: &[bool],
) -> Result<(), Error> {
    let mut components: Vec<Vec<(bool, bool)>> = (0..PARTIES)
        .map(|_| Vec::with_capacity(clear.len()))
        .collect();
    for &x in clear {
        let x0 = prg.rand_bool();
        let x1 = prg.rand_bool();
        let xs = [x0, x1, BooleanRing::sub(BooleanRing::sub(x, x0), x1)];
        for (p, components) in components.iter_mut().enumerate() {
            components.push((xs[p], xs[prev(p)]));
        }
    }
    for (p, components) in components.iter().enumerate() {
        send_to(channel, p, "share from client (replicated)", components).await?;
    }
    Ok(())
}

/// Reconstructs `len` bits at an output client from the components of all 3 parties.
///
/// Fails with [`Error::InconsistentShares`] if a party's copy of its predecessor's component
/// differs from the original.
#[instrument(level = Level::DEBUG, skip_all, fields(len = len), err)]
pub async fn reconstruct_at_client(
    channel: &mut impl Channel,
    len: usize,
) -> Result<Vec<bool>, Error> {
    let mut components: Vec<Vec<(bool, bool)>> = Vec::with_capacity(PARTIES);
    for p in 0..PARTIES {
        components.push(recv_vec_from(channel, p, "reveal to client (replicated)", len).await?);
    }
    let mut value = Vec::with_capacity(len);
    for i in 0..len {
        let mut x = false;
        for p in 0..PARTIES {
            let (a, b) = components[p][i];
            if b != components[prev(p)][i].0 {
                return Err(Error::InconsistentShares(p));
            }
            x = BooleanRing::add(x, a);
        }
        value.push(x);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{ReplicatedBit, reconstruct_at_client, setup};
    use crate::{
        backend::{BaseBit, Multiply},
        channel::{SimpleChannel, send_to},
        error::Error,
        simulate::simulate,
    };

    #[tokio::test]
    async fn components_are_replicated() -> Result<(), Error> {
        let components = simulate(3, |mut ctx| async move {
            let clear = (ctx.party() == 1).then_some(true);
            let bit = ReplicatedBit::share(&mut ctx, 1, clear).await?;
            Ok(bit.components())
        })
        .await?;
        for i in 0..3 {
            assert_eq!(components[i].1, components[(i + 2) % 3].0);
        }
        assert!(components[0].0 ^ components[1].0 ^ components[2].0);
        Ok(())
    }

    #[tokio::test]
    async fn and_truth_table() -> Result<(), Error> {
        for x in [false, true] {
            for y in [false, true] {
                let revealed = simulate(3, |mut ctx| async move {
                    setup(&mut ctx).await?;
                    let me = ctx.party();
                    let x = ReplicatedBit::share(&mut ctx, 0, (me == 0).then_some(x)).await?;
                    let y = ReplicatedBit::share(&mut ctx, 1, (me == 1).then_some(y)).await?;
                    let z = ReplicatedBit::and(&mut ctx, &x, &y).await?;
                    let z = ReplicatedBit::and(&mut ctx, &z, &ReplicatedBit::constant(true)).await?;
                    z.reveal(&mut ctx, &[0, 1, 2]).await
                })
                .await?;
                assert_eq!(revealed, vec![Some(x & y); 3]);
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn xor_with_constants() -> Result<(), Error> {
        let revealed = simulate(3, |mut ctx| async move {
            let me = ctx.party();
            let x = ReplicatedBit::share(&mut ctx, 2, (me == 2).then_some(true)).await?;
            let one = ReplicatedBit::constant(true);
            let not_x = ReplicatedBit::xor(&ctx, &one, &x);
            let x_again = ReplicatedBit::xor(&ctx, &not_x, &one);
            let zero = ReplicatedBit::xor(&ctx, &x_again, &x);
            Ok((
                not_x.reveal(&mut ctx, &[0]).await?,
                x_again.reveal(&mut ctx, &[1]).await?,
                zero.reveal(&mut ctx, &[2]).await?,
            ))
        })
        .await?;
        assert_eq!(revealed[0].0, Some(false));
        assert_eq!(revealed[1].1, Some(true));
        assert_eq!(revealed[2].2, Some(false));
        Ok(())
    }

    #[tokio::test]
    async fn and_without_setup_fails() {
        let err = simulate(3, |mut ctx| async move {
            let me = ctx.party();
            let x = ReplicatedBit::share(&mut ctx, 0, (me == 0).then_some(true)).await?;
            ReplicatedBit::and(&mut ctx, &x, &x).await
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::MissingPreprocessing(_)));
    }

    #[tokio::test]
    async fn needs_exactly_three_parties() {
        let err = simulate(4, |mut ctx| async move {
            let me = ctx.party();
            ReplicatedBit::share(&mut ctx, 0, (me == 0).then_some(true)).await
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            Error::WrongPartyCount {
                expected: 3,
                actual: 4
            }
        ));
    }

    #[tokio::test]
    async fn client_detects_inconsistent_components() -> Result<(), Error> {
        let mut channels = SimpleChannel::channels(4);
        let mut client = channels.pop().unwrap();
        let sent = [(true, false), (false, true), (false, true)];
        for (p, channel) in channels.iter_mut().enumerate() {
            send_to(channel, 3, "components", &vec![sent[p]]).await?;
        }
        let err = reconstruct_at_client(&mut client, 1).await.unwrap_err();
        assert!(matches!(err, Error::InconsistentShares(2)));
        Ok(())
    }
}
