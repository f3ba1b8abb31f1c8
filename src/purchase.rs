//! Purchase settlement.
//!
//! Checks run first and in a fixed order, each with its own revert reason. The
//! token transfer to the buyer comes next: it is what lowers the remaining
//! supply, so anything reached through the later value transfers already sees
//! the reduced supply. Proceeds go to the wallet and the overpayment back to the
//! buyer last. A failure at any step undoes every earlier one.

use alloc::vec::Vec;
use alloy_primitives::{Address, U256};

use crate::errors::{
    BelowMinimumPurchase, InsufficientSupply, RefundFailed, SaleError, SaleNotActive, TokenTransferFailed,
    TreasuryTransferFailed, ZeroPayment,
};
use crate::events::TokensPurchased;
use crate::ledger::{Effect, Ledger, UnitOfWork};
use crate::sale::{Env, Phase, Sale};

/// What a payment buys at a given price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    /// Whole tokens bought
    pub tokens: U256,
    /// Part of the payment kept, `tokens * price`
    pub cost: U256,
    /// Part of the payment returned, always below the price
    pub refund: U256,
}

impl Quote {
    pub fn new(value: U256, price: U256) -> Result<Self, SaleError> {
        if value.is_zero() {
            return Err(SaleError::ZeroPayment(ZeroPayment {}));
        }

        let tokens = value / price;
        if tokens.is_zero() {
            return Err(SaleError::BelowMinimumPurchase(BelowMinimumPurchase { value, price }));
        }

        // tokens * price <= value, so neither step can overflow or underflow
        let cost = tokens * price;
        Ok(Self { tokens, cost, refund: value - cost })
    }
}

/// A completed purchase and the transfers it made, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub buyer: Address,
    pub quote: Quote,
    pub effects: Vec<Effect>,
}

impl Settlement {
    pub fn event(&self) -> TokensPurchased {
        TokensPurchased { buyer: self.buyer, tokens: self.quote.tokens, cost: self.quote.cost }
    }
}

impl Sale {
    /// Sell the caller as many whole tokens as the attached value pays for.
    ///
    /// # Arguments
    ///
    /// * `env` - Invocation context; `env.value` is the payment, already held by the sale
    /// * `ledger` - Token Ledger and native transfers the settlement goes through
    pub fn purchase_tokens<L: Ledger>(&self, env: &Env, ledger: &mut L) -> Result<Settlement, SaleError> {
        let remaining = self.remaining_supply(env, ledger)?;

        let phase = self.phase(env.block, remaining);
        if matches!(phase, Phase::Pending | Phase::Halted) {
            return Err(SaleError::SaleNotActive(SaleNotActive { phase: phase.code() }));
        }

        let quote = Quote::new(env.value, self.price)?;

        // also covers an exhausted sale, since any whole token exceeds zero
        if quote.tokens > remaining {
            return Err(SaleError::InsufficientSupply(InsufficientSupply {
                requested: quote.tokens,
                remaining,
            }));
        }

        let effects = settle(ledger, env.caller, self.wallet, &quote)?;

        Ok(Settlement { buyer: env.caller, quote, effects })
    }
}

fn settle<L: Ledger>(ledger: &mut L, buyer: Address, wallet: Address, quote: &Quote) -> Result<Vec<Effect>, SaleError> {
    let mut work = UnitOfWork::begin(ledger);

    work.apply(Effect::Tokens { to: buyer, amount: quote.tokens })
        .map_err(|_| SaleError::TokenTransferFailed(TokenTransferFailed {}))?;

    work.apply(Effect::Value { to: wallet, amount: quote.cost })
        .map_err(|_| SaleError::TreasuryTransferFailed(TreasuryTransferFailed {}))?;

    if !quote.refund.is_zero() {
        work.apply(Effect::Value { to: buyer, amount: quote.refund })
            .map_err(|_| SaleError::RefundFailed(RefundFailed {}))?;
    }

    Ok(work.commit())
}
