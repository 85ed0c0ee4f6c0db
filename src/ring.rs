//! The algebra that secret shares live in.
//!
//! Boolean shares are elements of Z_2, where addition is XOR and multiplication is AND. Integer
//! constants of width `N` are elements of Z_2^N. Sharing schemes fold public constants using the
//! ring operations instead of hard-coding them.

use std::fmt;

/// A commutative ring with one.
pub trait Ring {
    /// The type of the ring elements.
    type Element: Copy + PartialEq + fmt::Debug;

    /// The additive identity.
    fn zero() -> Self::Element;
    /// The multiplicative identity.
    fn one() -> Self::Element;
    /// Ring addition.
    fn add(l: Self::Element, r: Self::Element) -> Self::Element;
    /// The additive inverse.
    fn neg(v: Self::Element) -> Self::Element;
    /// Ring multiplication.
    fn mul(l: Self::Element, r: Self::Element) -> Self::Element;

    /// Ring subtraction.
    fn sub(l: Self::Element, r: Self::Element) -> Self::Element {
        Self::add(l, Self::neg(r))
    }
}

/// Z_2, the ring of boolean shares.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanRing;

impl Ring for BooleanRing {
    type Element = bool;

    fn zero() -> bool {
        false
    }

    fn one() -> bool {
        true
    }

    fn add(l: bool, r: bool) -> bool {
        l ^ r
    }

    fn neg(v: bool) -> bool {
        v
    }

    fn mul(l: bool, r: bool) -> bool {
        l & r
    }
}

/// Z_2^N for `1 <= N <= 128`, with elements stored in the low bits of a `u128`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticRing<const N: usize>;

impl<const N: usize> ArithmeticRing<N> {
    /// All `N` low bits set, the largest element of the ring.
    pub const MASK: u128 = if N >= 128 {
        u128::MAX
    } else {
        (1u128 << N) - 1
    };

    /// Maps an arbitrary integer into the ring.
    pub fn reduce(v: u128) -> u128 {
        v & Self::MASK
    }

    /// Unsigned division, where dividing by zero yields the all-ones element.
    pub fn div(l: u128, r: u128) -> u128 {
        let (l, r) = (Self::reduce(l), Self::reduce(r));
        if r == 0 { Self::MASK } else { l / r }
    }

    /// Unsigned remainder, where the remainder of a division by zero is the dividend.
    pub fn rem(l: u128, r: u128) -> u128 {
        let (l, r) = (Self::reduce(l), Self::reduce(r));
        if r == 0 { l } else { l % r }
    }

    /// The `N` bits of an element, least significant first.
    pub fn to_bits(v: u128) -> Vec<bool> {
        (0..N).map(|i| (v >> i) & 1 == 1).collect()
    }

    /// Assembles an element from bits given least significant first.
    pub fn from_bits(bits: &[bool]) -> u128 {
        bits.iter()
            .take(N)
            .enumerate()
            .fold(0, |acc, (i, b)| acc | ((*b as u128) << i))
    }
}

impl<const N: usize> Ring for ArithmeticRing<N> {
    type Element = u128;

    fn zero() -> u128 {
        0
    }

    fn one() -> u128 {
        Self::reduce(1)
    }

    fn add(l: u128, r: u128) -> u128 {
        Self::reduce(l.wrapping_add(r))
    }

    fn neg(v: u128) -> u128 {
        Self::reduce(v.wrapping_neg())
    }

    fn mul(l: u128, r: u128) -> u128 {
        Self::reduce(l.wrapping_mul(r))
    }
}

#[cfg(test)]
mod tests {
    use super::{ArithmeticRing, BooleanRing, Ring};

    #[test]
    fn boolean_ring_is_xor_and() {
        for l in [false, true] {
            for r in [false, true] {
                assert_eq!(BooleanRing::add(l, r), l ^ r);
                assert_eq!(BooleanRing::mul(l, r), l & r);
                assert_eq!(BooleanRing::sub(l, r), l ^ r);
            }
        }
    }

    #[test]
    fn arithmetic_ring_wraps() {
        type R = ArithmeticRing<8>;
        assert_eq!(R::add(200, 100), 44);
        assert_eq!(R::sub(3, 5), 254);
        assert_eq!(R::mul(16, 17), 16);
        assert_eq!(R::neg(1), 255);
        assert_eq!(ArithmeticRing::<128>::add(u128::MAX, 1), 0);
        assert_eq!(ArithmeticRing::<1>::MASK, 1);
    }

    #[test]
    fn division_by_zero_is_all_ones() {
        type R = ArithmeticRing<16>;
        assert_eq!(R::div(1234, 0), 0xffff);
        assert_eq!(R::rem(1234, 0), 1234);
        assert_eq!(R::div(1234, 10), 123);
        assert_eq!(R::rem(1234, 10), 4);
    }

    #[test]
    fn bits_are_least_significant_first() {
        type R = ArithmeticRing<4>;
        assert_eq!(R::to_bits(0b0110), vec![false, true, true, false]);
        assert_eq!(R::from_bits(&[true, false, true, true]), 0b1101);
    }
}
