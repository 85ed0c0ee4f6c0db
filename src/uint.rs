//! Unsigned integers of a fixed bit width, with arithmetic and comparison circuits.
//!
//! An integer is a vector of `N` bits, least significant bit first. All arithmetic wraps modulo
//! `2^N`. Every circuit evaluates all of its gates regardless of the (secret) operand values, so
//! that the communication pattern never depends on secrets. Operands that are public constants
//! are folded locally by the gates and never cause any communication.

use crate::{
    backend::{BaseBit, ClientIo, Multiply},
    bit::Bit,
    bitvec::BitVector,
    channel::Channel,
    context::Context,
    error::Error,
    ring::ArithmeticRing,
};

/// An unsigned integer of `N` bits (`1 <= N <= 128`), secret-shared with the backend `B`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UInt<B, const N: usize> {
    bits: BitVector<B>,
}

/// An 8-bit unsigned integer.
pub type UInt8<B> = UInt<B, 8>;
/// A 16-bit unsigned integer.
pub type UInt16<B> = UInt<B, 16>;
/// A 32-bit unsigned integer.
pub type UInt32<B> = UInt<B, 32>;
/// A 64-bit unsigned integer.
pub type UInt64<B> = UInt<B, 64>;

impl<B, const N: usize> UInt<B, N> {
    const VALID_WIDTH: () = assert!(N >= 1 && N <= 128, "UInt needs between 1 and 128 bits");

    /// The bits of the integer, least significant first.
    pub fn bits(&self) -> &BitVector<B> {
        &self.bits
    }

    /// Unwraps the bits of the integer, least significant first.
    pub fn into_bits(self) -> BitVector<B> {
        self.bits
    }

    /// Interprets exactly `N` bits (least significant first) as an integer.
    pub fn from_bit_vector(bits: BitVector<B>) -> Result<Self, Error> {
        let () = Self::VALID_WIDTH;
        if bits.len() == N {
            Ok(Self { bits })
        } else {
            Err(Error::LengthMismatch {
                left: N,
                right: bits.len(),
            })
        }
    }

    fn from_vec(bits: Vec<Bit<B>>) -> Self {
        let () = Self::VALID_WIDTH;
        Self {
            bits: BitVector::new(bits),
        }
    }
}

impl<B: BaseBit, const N: usize> UInt<B, N> {
    /// A public constant, reduced modulo `2^N`.
    pub fn constant(value: u128) -> Self {
        let bits = ArithmeticRing::<N>::to_bits(ArithmeticRing::<N>::reduce(value));
        Self::from_vec(bits.into_iter().map(Bit::constant).collect())
    }

    /// A public constant from exactly `N` bits, least significant first.
    pub fn from_bits(bits: &[bool]) -> Result<Self, Error> {
        Self::from_bit_vector(BitVector::constant(bits))
    }

    /// Whether every bit is a public constant.
    pub fn is_constant(&self) -> bool {
        self.bits.iter().all(Bit::is_constant)
    }

    /// The bits of a public constant, least significant first.
    pub fn to_bits(&self) -> Result<Vec<bool>, Error> {
        self.bits.public_bits().ok_or(Error::NotPublic)
    }

    /// The value of a public constant.
    pub fn value(&self) -> Result<u128, Error> {
        Ok(ArithmeticRing::<N>::from_bits(&self.to_bits()?))
    }

    /// Secret-shares an integer held in the clear by the `dealer`.
    pub async fn share<C: Channel>(
        ctx: &mut Context<C>,
        dealer: usize,
        clear: Option<u128>,
    ) -> Result<Self, Error> {
        let () = Self::VALID_WIDTH;
        let clear = clear.map(|v| ArithmeticRing::<N>::to_bits(ArithmeticRing::<N>::reduce(v)));
        let bits = BitVector::share(ctx, dealer, N, clear.as_deref()).await?;
        Ok(Self { bits })
    }

    /// Opens the integer to the `receivers`, all other parties get `None`.
    pub async fn reveal<C: Channel>(
        &self,
        ctx: &mut Context<C>,
        receivers: &[usize],
    ) -> Result<Option<u128>, Error> {
        let bits = self.bits.reveal(ctx, receivers).await?;
        Ok(bits.map(|bits| ArithmeticRing::<N>::from_bits(&bits)))
    }

    /// Opens the integer to every party.
    pub async fn reveal_to_all<C: Channel>(&self, ctx: &mut Context<C>) -> Result<u128, Error> {
        let bits = self.bits.reveal_to_all(ctx).await?;
        Ok(ArithmeticRing::<N>::from_bits(&bits))
    }

    /// Bitwise XOR, computed locally.
    pub fn xor<C: Channel>(ctx: &Context<C>, l: &Self, r: &Self) -> Self {
        Self::from_vec(zip_map(l, r, |l, r| Bit::xor(ctx, l, r)))
    }

    /// Bitwise NOT, computed locally.
    pub fn not<C: Channel>(ctx: &Context<C>, v: &Self) -> Self {
        Self::from_vec(v.bits.iter().map(|b| Bit::not(ctx, b)).collect())
    }

    /// Checks that all parties agree on which bits are public constants, and on their values.
    pub async fn verify_public<C: Channel>(&self, ctx: &mut Context<C>) -> Result<(), Error> {
        self.bits.verify_public(ctx).await
    }
}

impl<B: ClientIo, const N: usize> UInt<B, N> {
    /// Receives this party's shares of an integer dealt by the input `client`.
    ///
    /// The client deals the `N` bits of its value, least significant first.
    pub async fn from_client<C: Channel>(ctx: &mut Context<C>, client: usize) -> Result<Self, Error> {
        let () = Self::VALID_WIDTH;
        let bits = BitVector::from_client(ctx, client, N).await?;
        Ok(Self { bits })
    }

    /// Sends this party's shares of the integer to the output `client`.
    pub async fn reveal_to_client<C: Channel>(
        &self,
        ctx: &mut Context<C>,
        client: usize,
    ) -> Result<(), Error> {
        self.bits.reveal_to_client(ctx, client).await
    }
}

impl<B: Multiply, const N: usize> UInt<B, N> {
    /// `l + r mod 2^N`, as a ripple-carry adder with `N - 1` AND gates.
    pub async fn add<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        let sum = add_bits(ctx, l.bits.as_slice(), r.bits.as_slice()).await?;
        Ok(Self::from_vec(sum))
    }

    /// `l - r mod 2^N`, as a ripple-borrow subtractor.
    pub async fn sub<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        let (diff, _) = sub_bits(ctx, l.bits.as_slice(), r.bits.as_slice()).await?;
        Ok(Self::from_vec(diff))
    }

    /// `l * r mod 2^N`, by shifting and adding partial products.
    pub async fn mul<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        let mut product: Vec<Bit<B>> = (0..N).map(|_| Bit::constant(false)).collect();
        for i in 0..N {
            let mut partial = Vec::with_capacity(N - i);
            for l in &l.bits.as_slice()[..N - i] {
                partial.push(Bit::and(ctx, l, &r.bits[i]).await?);
            }
            let sum = add_bits(ctx, &product[i..], &partial).await?;
            for (j, bit) in sum.into_iter().enumerate() {
                product[i + j] = bit;
            }
        }
        Ok(Self::from_vec(product))
    }

    /// `l / r`, rounded down. Dividing by zero yields `2^N - 1`.
    pub async fn div<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        let (quotient, _) = div_rem_bits(ctx, l.bits.as_slice(), r.bits.as_slice()).await?;
        Ok(Self::from_vec(quotient))
    }

    /// `l mod r`. The remainder of a division by zero is `l`.
    pub async fn rem<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error> {
        let (_, remainder) = div_rem_bits(ctx, l.bits.as_slice(), r.bits.as_slice()).await?;
        Ok(Self::from_vec(remainder))
    }

    /// `l == r`.
    pub async fn eq<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Bit<B>, Error> {
        BitVector::eq(ctx, &l.bits, &r.bits).await
    }

    /// `l != r`.
    pub async fn ne<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Bit<B>, Error> {
        let eq = Self::eq(ctx, l, r).await?;
        Ok(Bit::not(ctx, &eq))
    }

    /// `l < r`, the borrow out of `l - r`.
    pub async fn lt<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Bit<B>, Error> {
        let (_, borrow) = sub_bits(ctx, l.bits.as_slice(), r.bits.as_slice()).await?;
        Ok(borrow)
    }

    /// `l > r`.
    pub async fn gt<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Bit<B>, Error> {
        Self::lt(ctx, r, l).await
    }

    /// `l <= r`.
    pub async fn le<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Bit<B>, Error> {
        let gt = Self::gt(ctx, l, r).await?;
        Ok(Bit::not(ctx, &gt))
    }

    /// `l >= r`.
    pub async fn ge<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Bit<B>, Error> {
        let lt = Self::lt(ctx, l, r).await?;
        Ok(Bit::not(ctx, &lt))
    }

    /// Selects `t` if `cond` is set, otherwise `f`.
    pub async fn mux<C: Channel>(
        ctx: &mut Context<C>,
        cond: &Bit<B>,
        t: &Self,
        f: &Self,
    ) -> Result<Self, Error> {
        let bits = BitVector::mux(ctx, cond, &t.bits, &f.bits).await?;
        Ok(Self { bits })
    }
}

fn zip_map<B, const N: usize>(
    l: &UInt<B, N>,
    r: &UInt<B, N>,
    mut f: impl FnMut(&Bit<B>, &Bit<B>) -> Bit<B>,
) -> Vec<Bit<B>> {
    l.bits.iter().zip(&r.bits).map(|(l, r)| f(l, r)).collect()
}

/// Adds two equally long bit slices, dropping the carry out of the top bit.
async fn add_bits<B: Multiply, C: Channel>(
    ctx: &mut Context<C>,
    a: &[Bit<B>],
    b: &[Bit<B>],
) -> Result<Vec<Bit<B>>, Error> {
    let n = a.len().min(b.len());
    let mut sum = Vec::with_capacity(n);
    let mut carry = Bit::constant(false);
    for i in 0..n {
        let a_xor_c = Bit::xor(ctx, &a[i], &carry);
        let b_xor_c = Bit::xor(ctx, &b[i], &carry);
        sum.push(Bit::xor(ctx, &a[i], &b_xor_c));
        if i + 1 < n {
            let t = Bit::and(ctx, &a_xor_c, &b_xor_c).await?;
            carry = Bit::xor(ctx, &carry, &t);
        }
    }
    Ok(sum)
}

/// Subtracts two equally long bit slices, returning the difference and the borrow out.
async fn sub_bits<B: Multiply, C: Channel>(
    ctx: &mut Context<C>,
    a: &[Bit<B>],
    b: &[Bit<B>],
) -> Result<(Vec<Bit<B>>, Bit<B>), Error> {
    let n = a.len().min(b.len());
    let mut diff = Vec::with_capacity(n);
    let mut borrow = Bit::constant(false);
    for i in 0..n {
        let a_xor_b = Bit::xor(ctx, &a[i], &b[i]);
        let b_xor_borrow = Bit::xor(ctx, &b[i], &borrow);
        diff.push(Bit::xor(ctx, &a_xor_b, &borrow));
        let t = Bit::and(ctx, &a_xor_b, &b_xor_borrow).await?;
        borrow = Bit::xor(ctx, &borrow, &t);
    }
    Ok((diff, borrow))
}

/// Restoring long division, returning the quotient and the remainder.
async fn div_rem_bits<B: Multiply, C: Channel>(
    ctx: &mut Context<C>,
    a: &[Bit<B>],
    b: &[Bit<B>],
) -> Result<(Vec<Bit<B>>, Vec<Bit<B>>), Error> {
    let n = a.len().min(b.len());
    // overflow[i] is set iff b has a set bit at position n - i or above, so b << i >= 2^n
    let mut overflow = Vec::with_capacity(n);
    overflow.push(Bit::constant(false));
    for i in 1..n {
        let prev: &Bit<B> = &overflow[i - 1];
        let next = Bit::or(ctx, prev, &b[n - i]).await?;
        overflow.push(next);
    }
    let mut remainder = a[..n].to_vec();
    let mut quotient: Vec<Bit<B>> = (0..n).map(|_| Bit::constant(false)).collect();
    for i in (0..n).rev() {
        let (diff, borrow) = sub_bits(ctx, &remainder[i..], &b[..n - i]).await?;
        let borrow = Bit::or(ctx, &borrow, &overflow[i]).await?;
        for (j, diff) in diff.iter().enumerate() {
            remainder[i + j] = Bit::mux(ctx, &borrow, &remainder[i + j], diff).await?;
        }
        quotient[i] = Bit::not(ctx, &borrow);
    }
    Ok((quotient, remainder))
}

#[cfg(test)]
mod tests {
    use super::{UInt, UInt8, UInt64};
    use crate::{
        backend::{beaver::Beaver, gmw::GmwBit},
        bit::Bit,
        channel::SimpleChannel,
        context::Context,
        error::Error,
        simulate::simulate_with_dealer,
    };

    type Gmw = GmwBit<Beaver>;

    fn local_context() -> Context<SimpleChannel> {
        let mut channels = SimpleChannel::channels(2);
        Context::new(0, 2, channels.remove(0)).unwrap()
    }

    #[test]
    fn constants_are_reduced() {
        assert_eq!(UInt8::<Gmw>::constant(300).value().unwrap(), 44);
        assert_eq!(UInt::<Gmw, 1>::constant(3).value().unwrap(), 1);
        assert_eq!(
            UInt::<Gmw, 128>::constant(u128::MAX).value().unwrap(),
            u128::MAX
        );
        let bits = UInt8::<Gmw>::constant(6).to_bits().unwrap();
        assert_eq!(
            bits,
            vec![false, true, true, false, false, false, false, false]
        );
        assert_eq!(UInt8::<Gmw>::from_bits(&bits).unwrap().value().unwrap(), 6);
    }

    #[test]
    fn from_bits_checks_width() {
        let err = UInt8::<Gmw>::from_bits(&[true; 7]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { left: 8, right: 7 }));
    }

    #[tokio::test]
    async fn constant_circuits_are_evaluated_locally() -> Result<(), Error> {
        let mut ctx = local_context();
        let a = UInt8::<Gmw>::constant(200);
        let b = UInt8::<Gmw>::constant(7);
        assert_eq!(UInt::add(&mut ctx, &a, &b).await?.value()?, 207);
        assert_eq!(UInt::sub(&mut ctx, &b, &a).await?.value()?, 63);
        assert_eq!(UInt::mul(&mut ctx, &a, &b).await?.value()?, 120);
        assert_eq!(UInt::div(&mut ctx, &a, &b).await?.value()?, 28);
        assert_eq!(UInt::rem(&mut ctx, &a, &b).await?.value()?, 4);
        assert_eq!(UInt::lt(&mut ctx, &a, &b).await?.public_value(), Some(false));
        assert_eq!(UInt::ge(&mut ctx, &a, &b).await?.public_value(), Some(true));
        assert_eq!(ctx.channel().stats().msgs_sent, 0);
        Ok(())
    }

    #[tokio::test]
    async fn division_by_zero() -> Result<(), Error> {
        let mut ctx = local_context();
        let a = UInt8::<Gmw>::constant(77);
        let zero = UInt8::<Gmw>::constant(0);
        assert_eq!(UInt::div(&mut ctx, &a, &zero).await?.value()?, 255);
        assert_eq!(UInt::rem(&mut ctx, &a, &zero).await?.value()?, 77);
        Ok(())
    }

    #[tokio::test]
    async fn secret_values_are_not_public() -> Result<(), Error> {
        let results = simulate_with_dealer(2, 0, |mut ctx| async move {
            let me = ctx.party();
            let x = UInt8::<Gmw>::share(&mut ctx, 0, (me == 0).then_some(5)).await?;
            Ok(matches!(x.value(), Err(Error::NotPublic)))
        })
        .await?;
        assert_eq!(results, vec![true, true]);
        Ok(())
    }

    #[tokio::test]
    async fn secret_add_end_to_end() -> Result<(), Error> {
        let results = simulate_with_dealer(3, 63, |mut ctx| async move {
            let me = ctx.party();
            let x = UInt64::<Gmw>::share(&mut ctx, 0, (me == 0).then_some(2_000_000)).await?;
            let y = UInt64::<Gmw>::share(&mut ctx, 1, (me == 1).then_some(3_000_000)).await?;
            let sum = UInt::add(&mut ctx, &x, &y).await?;
            sum.reveal_to_all(&mut ctx).await
        })
        .await?;
        assert_eq!(results, vec![5_000_000; 3]);
        Ok(())
    }

    #[tokio::test]
    async fn secret_mux_and_comparisons() -> Result<(), Error> {
        let results = simulate_with_dealer(2, 64, |mut ctx| async move {
            let me = ctx.party();
            let x = UInt8::<Gmw>::share(&mut ctx, 0, (me == 0).then_some(42)).await?;
            let y = UInt8::<Gmw>::share(&mut ctx, 1, (me == 1).then_some(17)).await?;
            let lt = UInt::lt(&mut ctx, &x, &y).await?;
            let max = UInt::mux(&mut ctx, &lt, &y, &x).await?;
            let eq = UInt::eq(&mut ctx, &x, &x).await?;
            let cond = Bit::constant(true);
            let picked = UInt::mux(&mut ctx, &cond, &y, &x).await?;
            Ok((
                max.reveal_to_all(&mut ctx).await?,
                eq.reveal_to_all(&mut ctx).await?,
                picked.reveal_to_all(&mut ctx).await?,
            ))
        })
        .await?;
        assert_eq!(results, vec![(42, true, 17); 2]);
        Ok(())
    }
}
