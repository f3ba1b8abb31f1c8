//! Adapter over the two external capabilities a purchase relies on: moving
//! tokens out of the sale on the Token Ledger and moving native value out of
//! the sale. Both fail the same way so settlement can treat them alike.

use alloc::vec::Vec;
use alloy_primitives::{Address, U256};

/// An external transfer did not complete. Never retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rejected;

/// A transfer out of the sale that has been applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Tokens { to: Address, amount: U256 },
    Value { to: Address, amount: U256 },
}

pub trait Ledger {
    /// Balance of `account` on the Token Ledger
    fn token_balance(&mut self, account: Address) -> Result<U256, Rejected>;

    /// Move `amount` tokens from the sale to `to`
    fn send_tokens(&mut self, to: Address, amount: U256) -> Result<(), Rejected>;

    /// Move `amount` of native value from the sale to `to`
    fn send_value(&mut self, to: Address, amount: U256) -> Result<(), Rejected>;

    /// Reverse an effect this ledger applied earlier in the same invocation.
    ///
    /// Hosts that revert the whole invocation on failure leave this empty.
    fn undo(&mut self, effect: Effect);
}

/// Transaction boundary around a sequence of transfers.
///
/// Every applied effect is logged. Unless [`UnitOfWork::commit`] is reached,
/// dropping the unit undoes the log newest first, so a failure midway leaves
/// the ledger as it was before [`UnitOfWork::begin`].
pub struct UnitOfWork<'a, L: Ledger> {
    ledger: &'a mut L,
    applied: Vec<Effect>,
    committed: bool,
}

impl<'a, L: Ledger> UnitOfWork<'a, L> {
    pub fn begin(ledger: &'a mut L) -> Self {
        Self { ledger, applied: Vec::new(), committed: false }
    }

    pub fn apply(&mut self, effect: Effect) -> Result<(), Rejected> {
        match effect {
            Effect::Tokens { to, amount } => self.ledger.send_tokens(to, amount)?,
            Effect::Value { to, amount } => self.ledger.send_value(to, amount)?,
        }
        self.applied.push(effect);

        Ok(())
    }

    pub fn applied(&self) -> &[Effect] {
        &self.applied
    }

    /// Keep every applied effect and hand back the log.
    pub fn commit(mut self) -> Vec<Effect> {
        self.committed = true;
        core::mem::take(&mut self.applied)
    }
}

impl<L: Ledger> Drop for UnitOfWork<'_, L> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some(effect) = self.applied.pop() {
            self.ledger.undo(effect);
        }
    }
}
