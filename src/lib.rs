//! A Rust implementation of semi-honest secure multi-party computation (MPC) on secret-shared
//! bits.
//!
//! Each party holds shares of secret bits, such that no party alone learns anything about the
//! secrets. Boolean gates are evaluated on the shares, and integer circuits (addition,
//! subtraction, multiplication, division and comparisons) are built from these gates. Only the
//! final results are revealed, to the parties that are meant to learn them.
//!
//! ## Features
//!
//! - XOR sharing among any number of parties, with Beaver triples from a trusted dealer
//! - 2-out-of-3 replicated sharing among 3 parties, without any preprocessing
//! - Public constants that are folded locally and never cause any communication
//! - Input and output clients that take no part in the computation itself
//! - Unsigned integers of any width between 1 and 128 bits
//! - In-process channels for testing and TCP channels for deployment
//!
//! ## Main Components
//!
//! The crate is structured into several modules:
//!
//! * [`context`]: The [`context::Context`] of a single party, holding its channel and randomness.
//! * [`backend`]: The sharing schemes, [`backend::gmw`] and [`backend::replicated`].
//! * [`bit`], [`bitvec`] and [`uint`]: Gates and circuits, generic over the sharing scheme.
//! * [`channel`] and [`tcp`]: Communication abstractions for exchanging data between parties.
//! * [`simulate`]: Runs all parties of a computation in a single process.
//!
//! ## Basic Usage
//!
//! To run an MPC computation, each participating party needs to:
//!
//! 1. Set up communication channels with other parties
//! 2. Create a [`context::Context`] and run the preprocessing of the sharing scheme
//! 3. Secret-share the private inputs
//! 4. Evaluate the circuit on the shares
//! 5. Reveal the results to the parties that should learn them
//!
//! ## Example
//!
//! ```
//! use bitshare::{
//!     backend::{beaver::Beaver, gmw::GmwBit},
//!     simulate::simulate_with_dealer,
//!     uint::UInt64,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), bitshare::error::Error> {
//! // 3 parties, each with 63 multiplication triples (one per AND gate of a 64-bit adder)
//! let sums = simulate_with_dealer(3, 63, |mut ctx| async move {
//!     let me = ctx.party();
//!     let x = UInt64::<GmwBit<Beaver>>::share(&mut ctx, 0, (me == 0).then_some(2_000_000)).await?;
//!     let y = UInt64::<GmwBit<Beaver>>::share(&mut ctx, 1, (me == 1).then_some(3_000_000)).await?;
//!     let sum = UInt64::add(&mut ctx, &x, &y).await?;
//!     sum.reveal_to_all(&mut ctx).await
//! })
//! .await?;
//! assert_eq!(sums, vec![5_000_000; 3]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Properties
//!
//! This implementation provides security against semi-honest adversaries: parties follow the
//! protocol, but may try to learn more than they should from the messages they receive. It does
//! not protect against parties that deviate from the protocol.
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backend;
pub mod bit;
pub mod bitvec;
pub mod channel;
pub mod config;
pub mod context;
pub mod error;
pub mod prg;
pub mod ring;
pub mod simulate;
pub mod tcp;
pub mod uint;
