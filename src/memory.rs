//! In-memory host for running a sale off chain: a Token Ledger, a native
//! balance book and the payable-call envelope around a purchase.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt;
use alloy_primitives::{Address, U256};

use crate::ledger::{Effect, Ledger, Rejected};

/// A native value transfer the sale attempted, with the sale's token balance
/// at the moment the value left. Refused attempts are recorded too.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueAttempt {
    pub to: Address,
    pub amount: U256,
    pub sale_supply: U256,
}

/// Runs on every value transfer out of the sale, with the ledger as the
/// receiving account would see it.
type ValueHook = Box<dyn FnMut(&mut MemoryLedger)>;

pub struct MemoryLedger {
    sale: Address,
    tokens: BTreeMap<Address, U256>,
    value: BTreeMap<Address, U256>,
    refusing: BTreeSet<Address>,
    token_halted: bool,
    attempts: Vec<ValueAttempt>,
    on_value: Option<ValueHook>,
}

impl fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryLedger")
            .field("sale", &self.sale)
            .field("tokens", &self.tokens)
            .field("value", &self.value)
            .field("refusing", &self.refusing)
            .field("token_halted", &self.token_halted)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl MemoryLedger {
    /// Ledger where `sale` holds the whole `inventory`.
    pub fn new(sale: Address, inventory: U256) -> Self {
        Self {
            sale,
            tokens: BTreeMap::from([(sale, inventory)]),
            value: BTreeMap::new(),
            refusing: BTreeSet::new(),
            token_halted: false,
            attempts: Vec::new(),
            on_value: None,
        }
    }

    pub fn sale(&self) -> Address {
        self.sale
    }

    /// Credit native value to `account` out of thin air.
    pub fn fund(&mut self, account: Address, amount: U256) {
        credit(&mut self.value, account, amount);
    }

    /// Make every native transfer to `account` fail.
    pub fn refuse_value(&mut self, account: Address) {
        self.refusing.insert(account);
    }

    pub fn accept_value(&mut self, account: Address) {
        self.refusing.remove(&account);
    }

    /// Make the Token Ledger reject every transfer out of the sale.
    pub fn halt_token(&mut self, halted: bool) {
        self.token_halted = halted;
    }

    /// Call `hook` whenever value leaves the sale, before the transfer lands.
    ///
    /// This is where a receiving account would run its own code. The hook is
    /// detached while it runs, so value it causes to move does not call it again.
    pub fn on_value_transfer(&mut self, hook: impl FnMut(&mut MemoryLedger) + 'static) {
        self.on_value = Some(Box::new(hook));
    }

    pub fn token_balance_of(&self, account: Address) -> U256 {
        self.tokens.get(&account).copied().unwrap_or_default()
    }

    pub fn value_balance_of(&self, account: Address) -> U256 {
        self.value.get(&account).copied().unwrap_or_default()
    }

    pub fn value_attempts(&self) -> &[ValueAttempt] {
        &self.attempts
    }

    /// Ordinary token transfer between holders.
    pub fn transfer_tokens(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Rejected> {
        move_between(&mut self.tokens, from, to, amount)
    }

    /// Run `invocation` as a payable call from `payer`.
    ///
    /// `amount` moves to the sale before the invocation starts and moves back
    /// if it fails, leaving only the attempt itself observable.
    ///
    /// # Panics
    ///
    /// If `payer` does not hold `amount`; fund accounts up front.
    pub fn payable<T, E>(
        &mut self,
        payer: Address,
        amount: U256,
        invocation: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let sale = self.sale;
        if move_between(&mut self.value, payer, sale, amount).is_err() {
            panic!("{payer} cannot pay {amount}");
        }

        let outcome = invocation(self);
        if outcome.is_err() {
            // the payment was sitting on the sale untouched by the failed invocation
            let _ = move_between(&mut self.value, sale, payer, amount);
        }

        outcome
    }
}

impl Ledger for MemoryLedger {
    fn token_balance(&mut self, account: Address) -> Result<U256, Rejected> {
        Ok(self.token_balance_of(account))
    }

    fn send_tokens(&mut self, to: Address, amount: U256) -> Result<(), Rejected> {
        if self.token_halted {
            return Err(Rejected);
        }
        move_between(&mut self.tokens, self.sale, to, amount)
    }

    fn send_value(&mut self, to: Address, amount: U256) -> Result<(), Rejected> {
        let sale_supply = self.token_balance_of(self.sale);
        self.attempts.push(ValueAttempt { to, amount, sale_supply });

        if let Some(mut hook) = self.on_value.take() {
            hook(self);
            self.on_value = Some(hook);
        }

        if self.refusing.contains(&to) {
            return Err(Rejected);
        }
        move_between(&mut self.value, self.sale, to, amount)
    }

    fn undo(&mut self, effect: Effect) {
        let sale = self.sale;
        // undo only ever returns what was just moved, so the source holds it
        let _ = match effect {
            Effect::Tokens { to, amount } => move_between(&mut self.tokens, to, sale, amount),
            Effect::Value { to, amount } => move_between(&mut self.value, to, sale, amount),
        };
    }
}

fn credit(book: &mut BTreeMap<Address, U256>, account: Address, amount: U256) {
    let balance = book.entry(account).or_default();
    *balance = balance.saturating_add(amount);
}

fn move_between(book: &mut BTreeMap<Address, U256>, from: Address, to: Address, amount: U256) -> Result<(), Rejected> {
    let balance = book.get(&from).copied().unwrap_or_default();
    let remaining = balance.checked_sub(amount).ok_or(Rejected)?;
    book.insert(from, remaining);
    credit(book, to, amount);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const SALE: Address = address!("4000000000000000000000000000000000000004");
    const EDWHALE: Address = address!("7000000000000000000000000000000000000007");
    const JAMES: Address = address!("5000000000000000000000000000000000000005");

    #[test]
    fn inventory_starts_on_the_sale() {
        let ledger = MemoryLedger::new(SALE, U256::from(1_000u64));

        assert_eq!(ledger.sale(), SALE);
        assert_eq!(ledger.token_balance_of(SALE), U256::from(1_000u64));
        assert_eq!(ledger.token_balance_of(JAMES), U256::ZERO);
    }

    #[test]
    fn holders_transfer_among_themselves() {
        let mut ledger = MemoryLedger::new(SALE, U256::from(1_000u64));
        ledger.send_tokens(EDWHALE, U256::from(100u64)).unwrap();

        ledger.transfer_tokens(EDWHALE, JAMES, U256::from(10u64)).unwrap();
        assert_eq!(ledger.token_balance_of(EDWHALE), U256::from(90u64));
        assert_eq!(ledger.token_balance_of(JAMES), U256::from(10u64));

        assert_eq!(ledger.transfer_tokens(JAMES, EDWHALE, U256::from(11u64)), Err(Rejected));
    }

    #[test]
    fn failed_payable_call_returns_the_payment() {
        let mut ledger = MemoryLedger::new(SALE, U256::from(1_000u64));
        ledger.fund(EDWHALE, U256::from(500u64));

        let outcome: Result<(), Rejected> = ledger.payable(EDWHALE, U256::from(300u64), |ledger| {
            assert_eq!(ledger.value_balance_of(SALE), U256::from(300u64));
            Err(Rejected)
        });

        assert_eq!(outcome, Err(Rejected));
        assert_eq!(ledger.value_balance_of(EDWHALE), U256::from(500u64));
        assert_eq!(ledger.value_balance_of(SALE), U256::ZERO);
    }

    #[test]
    fn refusing_accounts_and_halted_token() {
        let mut ledger = MemoryLedger::new(SALE, U256::from(10u64));
        ledger.fund(SALE, U256::from(10u64));

        ledger.refuse_value(JAMES);
        assert_eq!(ledger.send_value(JAMES, U256::from(1u64)), Err(Rejected));
        ledger.accept_value(JAMES);
        assert_eq!(ledger.send_value(JAMES, U256::from(1u64)), Ok(()));
        assert_eq!(ledger.value_attempts().len(), 2);

        ledger.halt_token(true);
        assert_eq!(ledger.send_tokens(JAMES, U256::from(1u64)), Err(Rejected));
        ledger.halt_token(false);
        assert_eq!(ledger.send_tokens(JAMES, U256::from(1u64)), Ok(()));
    }

    #[test]
    fn value_hook_sees_each_transfer_once() {
        use alloc::rc::Rc;
        use core::cell::Cell;

        let mut ledger = MemoryLedger::new(SALE, U256::from(10u64));
        ledger.fund(SALE, U256::from(10u64));

        let calls = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&calls);
        ledger.on_value_transfer(move |ledger| {
            seen.set(seen.get() + 1);
            // nested transfers do not trigger the hook again
            ledger.send_value(EDWHALE, U256::from(1u64)).unwrap();
        });

        ledger.send_value(JAMES, U256::from(2u64)).unwrap();
        ledger.send_value(JAMES, U256::from(2u64)).unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(ledger.value_balance_of(JAMES), U256::from(4u64));
        assert_eq!(ledger.value_balance_of(EDWHALE), U256::from(2u64));
        assert_eq!(ledger.value_attempts().len(), 4);
    }

    #[test]
    #[should_panic]
    fn paying_without_funds_is_a_setup_error() {
        let mut ledger = MemoryLedger::new(SALE, U256::from(10u64));
        let _: Result<(), Rejected> = ledger.payable(JAMES, U256::from(1u64), |_| Ok(()));
    }
}
