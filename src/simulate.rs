//! Runs all parties of a computation in a single process, connected by [`SimpleChannel`]s.
//!
//! Useful for tests, benchmarks and for trying out circuits before deploying them over TCP.

use std::future::Future;

use futures::future::{try_join, try_join_all};

use crate::{
    backend::beaver::{Beaver, deal_triples},
    channel::SimpleChannel,
    context::Context,
    error::Error,
    prg::Prg,
};

/// Runs `f` once for each of the `parties` parties and returns their outputs in party order.
///
/// Fails with the first error returned by any party.
pub async fn simulate<T, F, Fut>(parties: usize, f: F) -> Result<Vec<T>, Error>
where
    F: Fn(Context<SimpleChannel>) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let contexts = SimpleChannel::channels(parties)
        .into_iter()
        .enumerate()
        .map(|(p, channel)| Context::new(p, parties, channel))
        .collect::<Result<Vec<_>, _>>()?;
    try_join_all(contexts.into_iter().map(f)).await
}

/// Like [`simulate`], but with a trusted dealer that hands `triples` Beaver triples to every party
/// before `f` is called.
///
/// The dealer is connected as an extra endpoint with index `parties`.
pub async fn simulate_with_dealer<T, F, Fut>(
    parties: usize,
    triples: usize,
    f: F,
) -> Result<Vec<T>, Error>
where
    F: Fn(Context<SimpleChannel>) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut channels = SimpleChannel::channels(parties + 1);
    let Some(mut dealer_channel) = channels.pop() else {
        return Err(Error::TooFewParties(parties));
    };
    let dealer = async move {
        let mut prg = Prg::new();
        deal_triples(&mut dealer_channel, parties, &mut prg).await
    };
    let f = &f;
    let computation = try_join_all(channels.into_iter().enumerate().map(|(p, channel)| {
        async move {
            let mut ctx = Context::new(p, parties, channel)?;
            Beaver::preprocess(&mut ctx, parties, triples).await?;
            f(ctx).await
        }
    }));
    let (_, outputs) = try_join(dealer, computation).await?;
    Ok(outputs)
}
