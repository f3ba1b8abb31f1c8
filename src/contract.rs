//! On-chain entrypoint.
//!
//! Storage holds the sale parameters. Each public method loads them into a
//! [`Sale`], runs the operation, writes back the one field it changed and logs
//! the resulting record. Returning an error reverts the transaction, which is
//! what makes a failed purchase leave no trace on the Token Ledger or on any
//! native balance.

use stylus_sdk::{
    alloy_primitives::{Address, U256, U64},
    block,
    call::{self, Call},
    contract, evm, msg,
    prelude::*,
};

use crate::config::SaleConfig;
use crate::errors::{AlreadyInitialized, NotInitialized, SaleError};
use crate::ledger::{Effect, Ledger, Rejected};
use crate::sale::{Env, Sale};

sol_interface! {
    interface IERC20 {
        function balanceOf(address) external view returns (uint256);
        function transfer(address, uint256) external returns (bool);
    }
}

sol_storage! {
    #[entrypoint]
    pub struct TokenSale {
        bool initialized;       // Set once by `init`
        address owner;          // Sale administrator
        address wallet;         // Treasury receiving proceeds
        address token;          // Token Ledger holding the inventory
        uint256 price;          // Native units per token
        uint64 start_block;     // First block purchases are accepted
        uint64 freeze_block;    // Price and start block are fixed from here on
        bool emergency_flag;    // Halts purchasing while set
    }
}

/// Token Ledger and native transfers as seen from inside the contract
struct EvmLedger {
    token: Address,
}

impl Ledger for EvmLedger {
    fn token_balance(&mut self, account: Address) -> Result<U256, Rejected> {
        IERC20::new(self.token).balance_of(Call::new(), account).map_err(|_| Rejected)
    }

    fn send_tokens(&mut self, to: Address, amount: U256) -> Result<(), Rejected> {
        match IERC20::new(self.token).transfer(Call::new(), to, amount) {
            Ok(true) => Ok(()),
            _ => Err(Rejected),
        }
    }

    fn send_value(&mut self, to: Address, amount: U256) -> Result<(), Rejected> {
        call::transfer_eth(to, amount).map_err(|_| Rejected)
    }

    // the revert of the enclosing transaction undoes applied transfers
    fn undo(&mut self, _effect: Effect) {}
}

/// External methods for `TokenSale`
#[public]
impl TokenSale {
    /// Configure the sale. Can only run once.
    ///
    /// Whoever calls it first picks the owner, so deploy and initialize from the same
    /// account in consecutive transactions and check the `SaleInitialized` record.
    ///
    /// # Arguments
    ///
    /// * `owner` - Account allowed to administer the sale
    /// * `wallet` - Treasury receiving the proceeds
    /// * `token` - ERC20 holding the inventory; fund this contract's balance to stock the sale
    /// * `price` - Wei per smallest token unit
    /// * `start_block` - First block purchases are accepted at
    /// * `freeze_block` - Block from which price and start block become immutable
    pub fn init(
        &mut self,
        owner: Address,
        wallet: Address,
        token: Address,
        price: U256,
        start_block: u64,
        freeze_block: u64,
    ) -> Result<(), SaleError> {
        if self.initialized.get() {
            return Err(SaleError::AlreadyInitialized(AlreadyInitialized {}));
        }

        let sale = Sale::new(SaleConfig { owner, wallet, token, price, start_block, freeze_block })?;

        self.initialized.set(true);
        self.owner.set(sale.owner());
        self.wallet.set(sale.wallet());
        self.token.set(sale.token());
        self.price.set(sale.price());
        self.start_block.set(U64::from(sale.start_block()));
        self.freeze_block.set(U64::from(sale.freeze_block()));
        self.emergency_flag.set(sale.emergency_flag());

        evm::log(sale.initialized_event());
        Ok(())
    }

    /// Buy as many whole tokens as the attached value pays for, returning the amount bought
    #[payable]
    pub fn purchase_tokens(&mut self) -> Result<U256, SaleError> {
        let sale = self.stored_sale()?;
        let env = Self::env();

        let settlement = sale.purchase_tokens(&env, &mut EvmLedger { token: sale.token() })?;
        stylus_sdk::console!(
            "purchase by {} of {} tokens, refund {}",
            env.caller,
            settlement.quote.tokens,
            settlement.quote.refund
        );

        evm::log(settlement.event());
        Ok(settlement.quote.tokens)
    }

    /// Hand administration over to another account
    ///
    /// # Arguments
    ///
    /// * `new_owner` - Account that becomes the only administrator
    pub fn change_owner(&mut self, new_owner: Address) -> Result<(), SaleError> {
        let mut sale = self.stored_sale()?;
        let event = sale.change_owner(&Self::env(), new_owner)?;

        self.owner.set(sale.owner());
        evm::log(event);
        Ok(())
    }

    /// Set the price, only before the freeze block
    ///
    /// # Arguments
    ///
    /// * `new_price` - Wei per smallest token unit, never zero
    pub fn change_price(&mut self, new_price: U256) -> Result<(), SaleError> {
        let mut sale = self.stored_sale()?;
        let event = sale.change_price(&Self::env(), new_price)?;

        self.price.set(sale.price());
        evm::log(event);
        Ok(())
    }

    /// Redirect future proceeds
    ///
    /// # Arguments
    ///
    /// * `new_wallet` - Treasury receiving the proceeds from now on
    pub fn change_wallet(&mut self, new_wallet: Address) -> Result<(), SaleError> {
        let mut sale = self.stored_sale()?;
        let event = sale.change_wallet(&Self::env(), new_wallet)?;

        self.wallet.set(sale.wallet());
        evm::log(event);
        Ok(())
    }

    /// Move the start of the sale, only before the freeze block
    ///
    /// # Arguments
    ///
    /// * `new_start_block` - First block purchases will be accepted at
    pub fn change_start_block(&mut self, new_start_block: u64) -> Result<(), SaleError> {
        let mut sale = self.stored_sale()?;
        let event = sale.change_start_block(&Self::env(), new_start_block)?;

        self.start_block.set(U64::from(sale.start_block()));
        evm::log(event);
        Ok(())
    }

    /// Halt purchasing, or resume it when already halted
    pub fn emergency_toggle(&mut self) -> Result<(), SaleError> {
        let mut sale = self.stored_sale()?;
        let event = sale.emergency_toggle(&Self::env())?;
        stylus_sdk::console!("emergency flag now {}", event.emergencyFlag);

        self.emergency_flag.set(sale.emergency_flag());
        evm::log(event);
        Ok(())
    }

    /// Account allowed to administer the sale
    pub fn owner(&self) -> Result<Address, SaleError> {
        Ok(self.stored_sale()?.owner())
    }

    /// Treasury receiving the proceeds
    pub fn wallet(&self) -> Result<Address, SaleError> {
        Ok(self.stored_sale()?.wallet())
    }

    /// Token Ledger holding the inventory
    pub fn token(&self) -> Result<Address, SaleError> {
        Ok(self.stored_sale()?.token())
    }

    /// Wei per smallest token unit
    pub fn price(&self) -> Result<U256, SaleError> {
        Ok(self.stored_sale()?.price())
    }

    /// First block purchases are accepted at
    pub fn start_block(&self) -> Result<u64, SaleError> {
        Ok(self.stored_sale()?.start_block())
    }

    /// Block from which price and start block can no longer change
    pub fn freeze_block(&self) -> Result<u64, SaleError> {
        Ok(self.stored_sale()?.freeze_block())
    }

    /// Whether purchasing is halted
    pub fn emergency_flag(&self) -> Result<bool, SaleError> {
        Ok(self.stored_sale()?.emergency_flag())
    }

    /// Tokens the sale still holds on the Token Ledger
    pub fn remaining_supply(&self) -> Result<U256, SaleError> {
        let sale = self.stored_sale()?;
        sale.remaining_supply(&Self::env(), &mut EvmLedger { token: sale.token() })
    }

    /// 0 Pending, 1 Active, 2 Halted, 3 Exhausted
    pub fn phase(&self) -> Result<u8, SaleError> {
        let sale = self.stored_sale()?;
        let env = Self::env();
        let remaining = sale.remaining_supply(&env, &mut EvmLedger { token: sale.token() })?;

        Ok(sale.phase(env.block, remaining).code())
    }
}

// Internal methods for `TokenSale`
impl TokenSale {
    fn env() -> Env {
        Env::new(msg::sender(), block::number(), contract::address()).with_value(msg::value())
    }

    fn stored_sale(&self) -> Result<Sale, SaleError> {
        if !self.initialized.get() {
            return Err(SaleError::NotInitialized(NotInitialized {}));
        }

        Ok(Sale {
            owner: self.owner.get(),
            wallet: self.wallet.get(),
            token: self.token.get(),
            price: self.price.get(),
            start_block: self.start_block.get().to::<u64>(),
            freeze_block: self.freeze_block.get().to::<u64>(),
            emergency_flag: self.emergency_flag.get(),
        })
    }
}
