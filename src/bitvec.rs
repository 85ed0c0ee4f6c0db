//! Fixed-length vectors of bits with element-wise gates.

use std::ops::Index;

use crate::{
    backend::{BaseBit, ClientIo, Multiply},
    bit::Bit,
    channel::Channel,
    context::Context,
    error::Error,
};

/// An ordered sequence of bits, sharing the same backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVector<B> {
    bits: Vec<Bit<B>>,
}

impl<B> BitVector<B> {
    /// Creates a vector from individual bits.
    pub fn new(bits: Vec<Bit<B>>) -> Self {
        Self { bits }
    }

    /// The number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the vector has no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The bit at position `i`, if it exists.
    pub fn get(&self, i: usize) -> Option<&Bit<B>> {
        self.bits.get(i)
    }

    /// Iterates over the bits.
    pub fn iter(&self) -> std::slice::Iter<'_, Bit<B>> {
        self.bits.iter()
    }

    /// The bits as a slice.
    pub fn as_slice(&self) -> &[Bit<B>] {
        &self.bits
    }

    /// Unwraps the bits.
    pub fn into_bits(self) -> Vec<Bit<B>> {
        self.bits
    }

    fn check_len(&self, other: &Self) -> Result<(), Error> {
        if self.len() == other.len() {
            Ok(())
        } else {
            Err(Error::LengthMismatch {
                left: self.len(),
                right: other.len(),
            })
        }
    }
}

impl<B> Index<usize> for BitVector<B> {
    type Output = Bit<B>;

    fn index(&self, i: usize) -> &Bit<B> {
        &self.bits[i]
    }
}

impl<B> FromIterator<Bit<B>> for BitVector<B> {
    fn from_iter<I: IntoIterator<Item = Bit<B>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, B> IntoIterator for &'a BitVector<B> {
    type Item = &'a Bit<B>;
    type IntoIter = std::slice::Iter<'a, Bit<B>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<B: BaseBit> BitVector<B> {
    /// A vector of public constants.
    pub fn constant(bits: &[bool]) -> Self {
        bits.iter().map(|b| Bit::constant(*b)).collect()
    }

    /// The values of the bits if all of them are public constants.
    pub fn public_bits(&self) -> Option<Vec<bool>> {
        self.iter().map(Bit::public_value).collect()
    }

    /// Secret-shares `len` bits held in the clear by the `dealer`.
    ///
    /// The dealer passes exactly `len` bits, all other parties pass `None`.
    pub async fn share<C: Channel>(
        ctx: &mut Context<C>,
        dealer: usize,
        len: usize,
        clear: Option<&[bool]>,
    ) -> Result<Self, Error> {
        if let Some(clear) = clear.filter(|_| ctx.party() == dealer) {
            if clear.len() != len {
                return Err(Error::LengthMismatch {
                    left: len,
                    right: clear.len(),
                });
            }
        }
        let mut bits = Vec::with_capacity(len);
        for i in 0..len {
            let bit = clear.and_then(|clear| clear.get(i).copied());
            bits.push(Bit::share(ctx, dealer, bit).await?);
        }
        Ok(Self::new(bits))
    }

    /// Opens all bits to the `receivers`, all other parties get `None`.
    pub async fn reveal<C: Channel>(
        &self,
        ctx: &mut Context<C>,
        receivers: &[usize],
    ) -> Result<Option<Vec<bool>>, Error> {
        let mut bits = Vec::with_capacity(self.len());
        for bit in self {
            bits.push(bit.reveal(ctx, receivers).await?);
        }
        Ok(bits.into_iter().collect())
    }

    /// Opens all bits to every party.
    pub async fn reveal_to_all<C: Channel>(
        &self,
        ctx: &mut Context<C>,
    ) -> Result<Vec<bool>, Error> {
        let mut bits = Vec::with_capacity(self.len());
        for bit in self {
            bits.push(bit.reveal_to_all(ctx).await?);
        }
        Ok(bits)
    }

    /// Element-wise XOR, computed locally.
    pub fn xor<C: Channel>(ctx: &Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        l.check_len(r)?;
        Ok(l.iter().zip(r).map(|(l, r)| Bit::xor(ctx, l, r)).collect())
    }

    /// Element-wise NOT, computed locally.
    pub fn not<C: Channel>(ctx: &Context<C>, v: &Self) -> Self {
        v.iter().map(|b| Bit::not(ctx, b)).collect()
    }

    /// Element-wise inequality, computed locally.
    pub fn neq<C: Channel>(ctx: &Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        Self::xor(ctx, l, r)
    }

    /// Element-wise AND where every pair has at least one public constant.
    pub fn and_public(l: &Self, r: &Self) -> Result<Self, Error> {
        l.check_len(r)?;
        l.iter().zip(r).map(|(l, r)| Bit::and_public(l, r)).collect()
    }

    /// Checks that all parties agree on which bits are public constants, and on their values.
    pub async fn verify_public<C: Channel>(&self, ctx: &mut Context<C>) -> Result<(), Error> {
        let view: Vec<Option<bool>> = self.iter().map(Bit::public_value).collect();
        ctx.check_public_view(&view).await
    }
}

impl<B: ClientIo> BitVector<B> {
    /// Receives this party's shares of `len` bits dealt by the input `client`.
    pub async fn from_client<C: Channel>(
        ctx: &mut Context<C>,
        client: usize,
        len: usize,
    ) -> Result<Self, Error> {
        let bits = B::receive_from_client(ctx, client, len).await?;
        Ok(bits.into_iter().map(Bit::from_base).collect())
    }

    /// Sends this party's shares of the vector to the output `client`.
    pub async fn reveal_to_client<C: Channel>(
        &self,
        ctx: &mut Context<C>,
        client: usize,
    ) -> Result<(), Error> {
        let bits: Vec<B> = self.iter().map(|bit| bit.base().clone()).collect();
        B::reveal_to_client(ctx, client, &bits).await
    }
}

impl<B: Multiply> BitVector<B> {
    /// Element-wise AND.
    pub async fn and<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        l.check_len(r)?;
        let mut bits = Vec::with_capacity(l.len());
        for (l, r) in l.iter().zip(r) {
            bits.push(Bit::and(ctx, l, r).await?);
        }
        Ok(Self::new(bits))
    }

    /// Element-wise OR.
    pub async fn or<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        l.check_len(r)?;
        let mut bits = Vec::with_capacity(l.len());
        for (l, r) in l.iter().zip(r) {
            bits.push(Bit::or(ctx, l, r).await?);
        }
        Ok(Self::new(bits))
    }

    /// A single bit that is set iff the vectors are equal in every position.
    ///
    /// All positions are combined, regardless of intermediate values.
    pub async fn eq<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Bit<B>, Error> {
        l.check_len(r)?;
        let mut eq = Bit::constant(true);
        for (l, r) in l.iter().zip(r) {
            let bit_eq = Bit::eq(ctx, l, r);
            eq = Bit::and(ctx, &eq, &bit_eq).await?;
        }
        Ok(eq)
    }

    /// Selects `t` if `cond` is set, otherwise `f`, element-wise.
    pub async fn mux<C: Channel>(
        ctx: &mut Context<C>,
        cond: &Bit<B>,
        t: &Self,
        f: &Self,
    ) -> Result<Self, Error> {
        t.check_len(f)?;
        let mut bits = Vec::with_capacity(t.len());
        for (t, f) in t.iter().zip(f) {
            bits.push(Bit::mux(ctx, cond, t, f).await?);
        }
        Ok(Self::new(bits))
    }
}
