//! Boolean gates on single (secret or public) bits, generic over the sharing scheme.

use crate::{
    backend::{BaseBit, Multiply},
    channel::Channel,
    context::Context,
    error::Error,
};

/// A bit that is either a public constant or secret-shared with the backend `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bit<B> {
    repr: B,
}

impl<B> Bit<B> {
    /// Wraps a backend bit.
    pub fn from_base(repr: B) -> Self {
        Self { repr }
    }

    /// The backend representation of the bit.
    pub fn base(&self) -> &B {
        &self.repr
    }

    /// Unwraps the backend representation of the bit.
    pub fn into_base(self) -> B {
        self.repr
    }
}

impl<B: BaseBit> Bit<B> {
    /// A public constant.
    pub fn constant(value: bool) -> Self {
        Self::from_base(B::constant(value))
    }

    /// Whether the bit is a public constant.
    pub fn is_constant(&self) -> bool {
        self.repr.is_constant()
    }

    /// The value of a public constant, `None` if the bit is secret.
    pub fn public_value(&self) -> Option<bool> {
        self.repr.public_value()
    }

    /// Secret-shares a bit held in the clear by the `dealer`.
    pub async fn share<C: Channel>(
        ctx: &mut Context<C>,
        dealer: usize,
        clear: Option<bool>,
    ) -> Result<Self, Error> {
        Ok(Self::from_base(B::share(ctx, dealer, clear).await?))
    }

    /// Opens the bit to the `receivers`, all other parties get `None`.
    pub async fn reveal<C: Channel>(
        &self,
        ctx: &mut Context<C>,
        receivers: &[usize],
    ) -> Result<Option<bool>, Error> {
        self.repr.reveal(ctx, receivers).await
    }

    /// Opens the bit to every party.
    pub async fn reveal_to_all<C: Channel>(&self, ctx: &mut Context<C>) -> Result<bool, Error> {
        let all: Vec<usize> = (0..ctx.parties()).collect();
        self.reveal(ctx, &all)
            .await?
            .ok_or(Error::PartyDoesNotExist(ctx.party()))
    }

    /// `l ^ r`, computed locally.
    pub fn xor<C: Channel>(ctx: &Context<C>, l: &Self, r: &Self) -> Self {
        Self::from_base(B::xor(ctx, &l.repr, &r.repr))
    }

    /// `!v`, computed locally.
    pub fn not<C: Channel>(ctx: &Context<C>, v: &Self) -> Self {
        Self::xor(ctx, v, &Self::constant(true))
    }

    /// `l == r`, computed locally.
    pub fn eq<C: Channel>(ctx: &Context<C>, l: &Self, r: &Self) -> Self {
        Self::not(ctx, &Self::xor(ctx, l, r))
    }

    /// `l != r`, computed locally.
    pub fn neq<C: Channel>(ctx: &Context<C>, l: &Self, r: &Self) -> Self {
        Self::xor(ctx, l, r)
    }

    /// `l & r` where at least one side is a public constant, computed locally.
    pub fn and_public(l: &Self, r: &Self) -> Result<Self, Error> {
        Ok(Self::from_base(B::and_public(&l.repr, &r.repr)?))
    }

    /// Checks that all parties agree on whether (and to what) the bit is a public constant.
    pub async fn verify_public<C: Channel>(&self, ctx: &mut Context<C>) -> Result<(), Error> {
        ctx.check_public_view(&[self.public_value()]).await
    }
}

impl<B: Multiply> Bit<B> {
    /// `l & r`, which needs communication if both bits are secret.
    pub async fn and<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        Ok(Self::from_base(B::and(ctx, &l.repr, &r.repr).await?))
    }

    /// `l | r`, computed as `(l ^ r) ^ (l & r)`.
    pub async fn or<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        let and = Self::and(ctx, l, r).await?;
        Ok(Self::xor(ctx, &Self::xor(ctx, l, r), &and))
    }

    /// `if cond { t } else { f }`, computed as `f ^ (cond & (t ^ f))`.
    pub async fn mux<C: Channel>(
        ctx: &mut Context<C>,
        cond: &Self,
        t: &Self,
        f: &Self,
    ) -> Result<Self, Error> {
        let diff = Self::xor(ctx, t, f);
        let selected = Self::and(ctx, cond, &diff).await?;
        Ok(Self::xor(ctx, f, &selected))
    }
}

#[cfg(test)]
mod tests {
    use super::Bit;
    use crate::{
        backend::{beaver::Beaver, gmw::GmwBit, replicated::ReplicatedBit},
        error::{Error, ErrorKind},
        simulate::{simulate, simulate_with_dealer},
    };

    #[tokio::test]
    async fn or_and_mux_truth_tables() -> Result<(), Error> {
        for x in [false, true] {
            for y in [false, true] {
                for c in [false, true] {
                    let revealed = simulate_with_dealer(2, 2, |mut ctx| async move {
                        let me = ctx.party();
                        let xs = Bit::<GmwBit<Beaver>>::share(&mut ctx, 0, (me == 0).then_some(x))
                            .await?;
                        let ys = Bit::share(&mut ctx, 1, (me == 1).then_some(y)).await?;
                        let cs = Bit::constant(c);
                        let or = Bit::or(&mut ctx, &xs, &ys).await?;
                        let mux = Bit::mux(&mut ctx, &cs, &xs, &ys).await?;
                        let mux_secret = Bit::mux(&mut ctx, &xs, &cs, &ys).await?;
                        Ok((
                            or.reveal_to_all(&mut ctx).await?,
                            mux.reveal_to_all(&mut ctx).await?,
                            mux_secret.reveal_to_all(&mut ctx).await?,
                        ))
                    })
                    .await?;
                    let expected = (x | y, if c { x } else { y }, if x { c } else { y });
                    assert_eq!(revealed, vec![expected; 2]);
                }
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn eq_and_not_are_local() -> Result<(), Error> {
        let results = simulate(3, |mut ctx| async move {
            let me = ctx.party();
            let x = Bit::<ReplicatedBit>::share(&mut ctx, 0, (me == 0).then_some(true)).await?;
            let y = Bit::share(&mut ctx, 2, (me == 2).then_some(true)).await?;
            let sent = ctx.channel().stats().msgs_sent;
            let eq = Bit::eq(&ctx, &x, &y);
            let neq = Bit::neq(&ctx, &x, &y);
            let not = Bit::not(&ctx, &x);
            assert_eq!(ctx.channel().stats().msgs_sent, sent);
            Ok((
                eq.reveal_to_all(&mut ctx).await?,
                neq.reveal_to_all(&mut ctx).await?,
                not.reveal_to_all(&mut ctx).await?,
            ))
        })
        .await?;
        assert_eq!(results, vec![(true, false, false); 3]);
        Ok(())
    }

    #[tokio::test]
    async fn verify_public_detects_disagreement() {
        let err = simulate(2, |mut ctx| async move {
            let bit = Bit::<GmwBit<Beaver>>::constant(ctx.party() == 0);
            bit.verify_public(&mut ctx).await
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstantMismatch);
    }

    #[tokio::test]
    async fn verify_public_accepts_agreement() -> Result<(), Error> {
        simulate(2, |mut ctx| async move {
            let me = ctx.party();
            let secret = Bit::<GmwBit<Beaver>>::share(&mut ctx, 0, (me == 0).then_some(true))
                .await?;
            Bit::<GmwBit<Beaver>>::constant(true).verify_public(&mut ctx).await?;
            secret.verify_public(&mut ctx).await
        })
        .await?;
        Ok(())
    }
}
