use std::net::SocketAddr;

use bitshare::{
    backend::replicated::{self, ReplicatedBit},
    config::Config,
    context::Context,
    error::Error,
    tcp::TcpChannel,
    uint::{UInt, UInt32},
};
use futures::future::try_join_all;
use tokio::net::TcpListener;

async fn connect_all(parties: usize) -> Vec<TcpChannel> {
    let mut listeners = vec![];
    let mut addrs: Vec<SocketAddr> = vec![];
    for _ in 0..parties {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        addrs.push(listener.local_addr().unwrap());
        listeners.push(listener);
    }
    let config = Config::default();
    try_join_all(
        listeners
            .into_iter()
            .enumerate()
            .map(|(p, listener)| TcpChannel::establish(p, listener, &addrs, &config)),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn replicated_sum_over_tcp() -> Result<(), Error> {
    let channels = connect_all(3).await;
    let outputs = try_join_all(channels.into_iter().enumerate().map(|(p, channel)| async move {
        let mut ctx = Context::new(p, 3, channel)?;
        replicated::setup(&mut ctx).await?;
        let mut sum = UInt32::<ReplicatedBit>::constant(0);
        for dealer in 0..3 {
            let input = (p == dealer).then_some(1000 * (dealer as u128 + 1));
            let x = UInt32::share(&mut ctx, dealer, input).await?;
            sum = UInt::add(&mut ctx, &sum, &x).await?;
        }
        sum.reveal(&mut ctx, &[0]).await
    }))
    .await?;
    assert_eq!(outputs, vec![Some(6000), None, None]);
    Ok(())
}

#[tokio::test]
async fn missing_address_is_reported() {
    let addrs: Vec<SocketAddr> = vec![];
    let err = TcpChannel::connect(0, &addrs, &Config::default())
        .await
        .unwrap_err();
    assert!(matches!(err, bitshare::tcp::TcpError::MissingAddress(0)));
}
