use bitshare::{
    backend::replicated::{self, ReplicatedBit},
    bit::Bit,
    bitvec::BitVector,
    channel::SimpleChannel,
    context::Context,
    error::{Error, ErrorKind},
    prg::Prg,
    simulate::simulate,
    uint::{UInt, UInt16},
};
use futures::future::{try_join, try_join_all};

type RBit = Bit<ReplicatedBit>;

#[tokio::test]
async fn eval_and_or_mux_on_three_parties() -> Result<(), Error> {
    for x in [true, false] {
        for y in [true, false] {
            for z in [true, false] {
                let outputs = simulate(3, |mut ctx| async move {
                    replicated::setup(&mut ctx).await?;
                    let me = ctx.party();
                    let xs = RBit::share(&mut ctx, 0, (me == 0).then_some(x)).await?;
                    let ys = RBit::share(&mut ctx, 1, (me == 1).then_some(y)).await?;
                    let zs = RBit::share(&mut ctx, 2, (me == 2).then_some(z)).await?;
                    let and = RBit::and(&mut ctx, &xs, &ys).await?;
                    let or = RBit::or(&mut ctx, &and, &zs).await?;
                    let mux = RBit::mux(&mut ctx, &zs, &xs, &ys).await?;
                    Ok((
                        or.reveal_to_all(&mut ctx).await?,
                        mux.reveal_to_all(&mut ctx).await?,
                    ))
                })
                .await?;
                let expected = ((x & y) | z, if z { x } else { y });
                assert_eq!(outputs, vec![expected; 3]);
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn integer_circuits_on_replicated_shares() -> Result<(), Error> {
    let outputs = simulate(3, |mut ctx| async move {
        replicated::setup(&mut ctx).await?;
        let me = ctx.party();
        let x = UInt16::<ReplicatedBit>::share(&mut ctx, 0, (me == 0).then_some(1234)).await?;
        let y = UInt16::<ReplicatedBit>::share(&mut ctx, 2, (me == 2).then_some(56)).await?;
        let sum = UInt::add(&mut ctx, &x, &y).await?;
        let diff = UInt::sub(&mut ctx, &y, &x).await?;
        let product = UInt::mul(&mut ctx, &x, &y).await?;
        let quotient = UInt::div(&mut ctx, &x, &y).await?;
        let remainder = UInt::rem(&mut ctx, &x, &y).await?;
        let gt = UInt::gt(&mut ctx, &x, &y).await?;
        Ok((
            sum.reveal_to_all(&mut ctx).await?,
            diff.reveal_to_all(&mut ctx).await?,
            product.reveal_to_all(&mut ctx).await?,
            quotient.reveal_to_all(&mut ctx).await?,
            remainder.reveal_to_all(&mut ctx).await?,
            gt.reveal_to_all(&mut ctx).await?,
        ))
    })
    .await?;
    let expected = (
        1290,
        (56u128 + 65536 - 1234) % 65536,
        (1234 * 56) % 65536,
        1234 / 56,
        1234 % 56,
        true,
    );
    assert_eq!(outputs, vec![expected; 3]);
    Ok(())
}

#[tokio::test]
async fn reveal_to_a_single_party() -> Result<(), Error> {
    for receiver in 0..3 {
        let outputs = simulate(3, |mut ctx| async move {
            let me = ctx.party();
            let x = RBit::share(&mut ctx, 1, (me == 1).then_some(true)).await?;
            x.reveal(&mut ctx, &[receiver]).await
        })
        .await?;
        for (p, output) in outputs.into_iter().enumerate() {
            assert_eq!(output, (p == receiver).then_some(true));
        }
    }
    Ok(())
}

#[tokio::test]
async fn two_parties_are_not_enough() {
    let err = simulate(2, |mut ctx| async move { replicated::setup(&mut ctx).await })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
}

#[tokio::test]
async fn input_and_output_client() -> Result<(), Error> {
    for (x, y) in [(false, false), (true, false), (true, true)] {
        let mut channels = SimpleChannel::channels(4);
        let mut client = channels.pop().unwrap();
        let client = async move {
            replicated::share_from_client(&mut client, &mut Prg::new(), &[x, y]).await?;
            replicated::reconstruct_at_client(&mut client, 3).await
        };
        let computation = try_join_all(channels.into_iter().enumerate().map(|(p, ch)| async move {
            let mut ctx = Context::new(p, 3, ch)?;
            replicated::setup(&mut ctx).await?;
            let inputs = BitVector::<ReplicatedBit>::from_client(&mut ctx, 3, 2).await?;
            let and = RBit::and(&mut ctx, &inputs[0], &inputs[1]).await?;
            let outputs = BitVector::new(vec![and, RBit::constant(true), inputs[0].clone()]);
            outputs.reveal_to_client(&mut ctx, 3).await
        }));
        let (revealed, _) = try_join(client, computation).await?;
        assert_eq!(revealed, vec![x & y, true, x]);
    }
    Ok(())
}
