//! Sharing schemes for single bits.
//!
//! A backend decides how a bit is split into shares, how a sharing is opened and how the XOR and
//! AND gates act on shares. Every backend also tracks public constants, which never cause any
//! communication. Backends that can multiply two secret bits implement [`Multiply`], so that
//! circuits needing secret-secret AND gates are rejected by the type checker for all others.
//!
//! * [`gmw`]: XOR sharing among any number of parties (at least 2).
//! * [`replicated`]: 2-out-of-3 replicated sharing among exactly 3 parties.
//! * [`beaver`]: multiplication triples from a trusted dealer, used by [`gmw`].

use std::fmt;

use crate::{channel::Channel, context::Context, error::Error};

pub mod beaver;
pub mod gmw;
pub mod replicated;

/// The operations every sharing scheme provides for a single bit.
#[allow(async_fn_in_trait)]
pub trait BaseBit: Clone + fmt::Debug + Sized {
    /// Creates a public constant, known to every party.
    fn constant(value: bool) -> Self;

    /// The value of a public constant, `None` for a secret bit.
    fn public_value(&self) -> Option<bool>;

    /// Whether the bit is a public constant.
    fn is_constant(&self) -> bool {
        self.public_value().is_some()
    }

    /// Secret-shares the bit that the `dealer` holds in the clear.
    ///
    /// The dealer must pass `Some(value)`, all other parties pass `None`.
    async fn share<C: Channel>(
        ctx: &mut Context<C>,
        dealer: usize,
        clear: Option<bool>,
    ) -> Result<Self, Error>;

    /// Opens the bit to the `receivers`, which get `Some(value)`; all other parties get `None`.
    async fn reveal<C: Channel>(
        &self,
        ctx: &mut Context<C>,
        receivers: &[usize],
    ) -> Result<Option<bool>, Error>;

    /// XOR of two bits, computed locally.
    fn xor<C: Channel>(ctx: &Context<C>, l: &Self, r: &Self) -> Self;

    /// AND of two bits, one of which must be a public constant. Computed locally.
    fn and_public(l: &Self, r: &Self) -> Result<Self, Error>;
}

/// Sharing schemes that can compute the AND of two secret bits.
#[allow(async_fn_in_trait)]
pub trait Multiply: BaseBit {
    /// AND of two bits, which needs one round of communication if both are secret.
    async fn and<C: Channel>(ctx: &mut Context<C>, l: &Self, r: &Self) -> Result<Self, Error>;
}

/// Sharing schemes that take inputs from, and deliver outputs to, clients outside the computation.
///
/// A client is a channel endpoint with an index of at least `parties`. It takes no part in the
/// gates, it only deals the shares of its input or reconstructs an output from the shares of all
/// computing parties. The client side of each scheme is a free function of its module.
#[allow(async_fn_in_trait)]
pub trait ClientIo: BaseBit {
    /// Receives this party's shares of `len` bits that the input `client` secret-shared.
    async fn receive_from_client<C: Channel>(
        ctx: &mut Context<C>,
        client: usize,
        len: usize,
    ) -> Result<Vec<Self>, Error>;

    /// Sends this party's shares of `bits` to the output `client`.
    async fn reveal_to_client<C: Channel>(
        ctx: &mut Context<C>,
        client: usize,
        bits: &[Self],
    ) -> Result<(), Error>;
}

/// Validates the roles of a sharing and returns the clear value if this party is the dealer.
pub(crate) fn check_dealer<C: Channel>(
    ctx: &Context<C>,
    dealer: usize,
    clear: Option<bool>,
) -> Result<Option<bool>, Error> {
    ctx.check_party(dealer)?;
    ctx.check_not_aborted()?;
    if ctx.party() == dealer {
        clear.map(Some).ok_or(Error::MissingDealerInput)
    } else {
        Ok(None)
    }
}

/// Validates that `client` is an endpoint outside the computing parties.
pub(crate) fn check_client<C: Channel>(ctx: &Context<C>, client: usize) -> Result<(), Error> {
    if client < ctx.parties() {
        return Err(Error::NotAClient(client));
    }
    ctx.check_not_aborted()
}
