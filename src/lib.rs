//! Block-gated token sale paid in the chain's native currency.
//!
//! The sale hands out tokens it holds on an ERC20 Token Ledger at a fixed price per token, starting at a
//! configured block, refunding any overpayment and forwarding the proceeds to a treasury wallet. The owner can
//! adjust price and start block until a freeze block, change owner and wallet at any time, and halt purchasing.
//! The program is ABI-equivalent with Solidity, which means you can call it from both Solidity and Rust. To do
//! this, run `cargo stylus export-abi`.
//!
//! The settlement logic lives in plain Rust ([`Sale`], [`Ledger`]) and runs off chain against [`MemoryLedger`];
//! the `contract` module adapts it to Stylus storage and host calls.

// Allow `cargo stylus export-abi` to generate a main function.
#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]

extern crate alloc;

#[cfg(target_arch = "wasm32")]
#[global_allocator]
static ALLOC: mini_alloc::MiniAlloc = mini_alloc::MiniAlloc::INIT;

pub mod config;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod memory;
pub mod purchase;
pub mod sale;

#[cfg(any(target_arch = "wasm32", feature = "export-abi"))]
pub mod contract;

#[cfg(feature = "export-abi")]
pub use contract::print_abi;

pub use config::SaleConfig;
pub use errors::SaleError;
pub use ledger::{Effect, Ledger, Rejected, UnitOfWork};
pub use memory::MemoryLedger;
pub use purchase::{Quote, Settlement};
pub use sale::{Env, Phase, Sale};
