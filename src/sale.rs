//! The sale state record, its administration and its derived phase.
//!
//! A [`Sale`] holds every parameter the owner can administer. It never stores
//! the remaining supply: that lives on the Token Ledger as the sale's own
//! balance and is read fresh on every invocation.

use alloy_primitives::{Address, U256};

use crate::config::SaleConfig;
use crate::errors::{ConfigurationFrozen, SaleError, TokenTransferFailed, Unauthorized, ZeroAddress, ZeroPrice};
use crate::events::{EmergencyToggled, OwnerChanged, PriceChanged, SaleInitialized, StartBlockChanged, WalletChanged};
use crate::ledger::Ledger;

/// Context of a single invocation, supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Env {
    /// Account that made the call
    pub caller: Address,
    /// Current block height
    pub block: u64,
    /// Address of the sale itself, which holds the unsold tokens
    pub this: Address,
    /// Native value attached to the call
    pub value: U256,
}

impl Env {
    pub fn new(caller: Address, block: u64, this: Address) -> Self {
        Self { caller, block, this, value: U256::ZERO }
    }

    pub fn with_value(self, value: U256) -> Self {
        Self { value, ..self }
    }
}

/// Purchasing status, derived on every call and never cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Pending = 0,
    Active = 1,
    Halted = 2,
    Exhausted = 3,
}

impl Phase {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sale {
    pub(crate) owner: Address,
    pub(crate) wallet: Address,
    pub(crate) token: Address,
    pub(crate) price: U256,
    pub(crate) start_block: u64,
    pub(crate) freeze_block: u64,
    pub(crate) emergency_flag: bool,
}

impl Sale {
    /// Create a sale from validated configuration. The emergency flag starts cleared.
    pub fn new(config: SaleConfig) -> Result<Self, SaleError> {
        config.validate()?;

        Ok(Self {
            owner: config.owner,
            wallet: config.wallet,
            token: config.token,
            price: config.price,
            start_block: config.start_block,
            freeze_block: config.freeze_block,
            emergency_flag: false,
        })
    }

    /// Record announcing the parameters the sale was created with
    pub fn initialized_event(&self) -> SaleInitialized {
        SaleInitialized {
            owner: self.owner,
            wallet: self.wallet,
            token: self.token,
            price: self.price,
            startBlock: U256::from(self.start_block),
            freezeBlock: U256::from(self.freeze_block),
        }
    }

    /// Account allowed to administer the sale
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Treasury receiving the proceeds
    pub fn wallet(&self) -> Address {
        self.wallet
    }

    /// Token Ledger the inventory is held on
    pub fn token(&self) -> Address {
        self.token
    }

    /// Native units per smallest token unit
    pub fn price(&self) -> U256 {
        self.price
    }

    /// First block purchases are accepted at
    pub fn start_block(&self) -> u64 {
        self.start_block
    }

    /// See [`Sale::is_frozen`]
    pub fn freeze_block(&self) -> u64 {
        self.freeze_block
    }

    /// Set while purchasing is halted
    pub fn emergency_flag(&self) -> bool {
        self.emergency_flag
    }

    /// Whether price and start block can no longer be changed at `block`
    pub fn is_frozen(&self, block: u64) -> bool {
        block >= self.freeze_block
    }

    /// Phase at `block`, given what the sale still holds. The flag wins over the
    /// block, and the block over the supply.
    pub fn phase(&self, block: u64, remaining_supply: U256) -> Phase {
        if self.emergency_flag {
            Phase::Halted
        } else if block < self.start_block {
            Phase::Pending
        } else if remaining_supply.is_zero() {
            Phase::Exhausted
        } else {
            Phase::Active
        }
    }

    /// Tokens still held by the sale on the Token Ledger.
    pub fn remaining_supply<L: Ledger>(&self, env: &Env, ledger: &mut L) -> Result<U256, SaleError> {
        ledger
            .token_balance(env.this)
            .map_err(|_| SaleError::TokenTransferFailed(TokenTransferFailed {}))
    }

    /// Hand administration over to `new_owner`.
    ///
    /// # Arguments
    ///
    /// * `env` - Invocation context; only the current owner may call
    /// * `new_owner` - Account that becomes the only administrator
    pub fn change_owner(&mut self, env: &Env, new_owner: Address) -> Result<OwnerChanged, SaleError> {
        self.validate_sender_is_owner(env)?;
        validate_address(new_owner)?;

        let previous_owner = core::mem::replace(&mut self.owner, new_owner);
        Ok(OwnerChanged { previousOwner: previous_owner, newOwner: new_owner })
    }

    /// Set the price for every later purchase.
    ///
    /// # Arguments
    ///
    /// * `env` - Invocation context; owner only, and only before the freeze block
    /// * `new_price` - Native units per token, never zero
    pub fn change_price(&mut self, env: &Env, new_price: U256) -> Result<PriceChanged, SaleError> {
        self.validate_sender_is_owner(env)?;
        self.validate_not_frozen(env)?;
        validate_price(new_price)?;

        let old_price = core::mem::replace(&mut self.price, new_price);
        Ok(PriceChanged { actor: env.caller, oldPrice: old_price, newPrice: new_price })
    }

    /// Send later proceeds to `new_wallet`. Allowed at any block.
    pub fn change_wallet(&mut self, env: &Env, new_wallet: Address) -> Result<WalletChanged, SaleError> {
        self.validate_sender_is_owner(env)?;
        validate_address(new_wallet)?;

        let old_wallet = core::mem::replace(&mut self.wallet, new_wallet);
        Ok(WalletChanged { actor: env.caller, oldWallet: old_wallet, newWallet: new_wallet })
    }

    /// Move the first block purchases are accepted at.
    ///
    /// # Arguments
    ///
    /// * `env` - Invocation context; owner only, and only before the freeze block
    /// * `new_start_block` - Any block, including one already passed
    pub fn change_start_block(&mut self, env: &Env, new_start_block: u64) -> Result<StartBlockChanged, SaleError> {
        self.validate_sender_is_owner(env)?;
        self.validate_not_frozen(env)?;

        let old_start_block = core::mem::replace(&mut self.start_block, new_start_block);
        Ok(StartBlockChanged {
            actor: env.caller,
            oldStartBlock: U256::from(old_start_block),
            newStartBlock: U256::from(new_start_block),
        })
    }

    /// Flip the emergency flag. Only purchasing looks at it.
    pub fn emergency_toggle(&mut self, env: &Env) -> Result<EmergencyToggled, SaleError> {
        self.validate_sender_is_owner(env)?;

        self.emergency_flag = !self.emergency_flag;
        Ok(EmergencyToggled { actor: env.caller, emergencyFlag: self.emergency_flag })
    }

    fn validate_sender_is_owner(&self, env: &Env) -> Result<(), SaleError> {
        if env.caller != self.owner {
            return Err(SaleError::Unauthorized(Unauthorized { caller: env.caller }));
        }

        Ok(())
    }

    fn validate_not_frozen(&self, env: &Env) -> Result<(), SaleError> {
        if self.is_frozen(env.block) {
            return Err(SaleError::ConfigurationFrozen(ConfigurationFrozen {
                block: U256::from(env.block),
                freezeBlock: U256::from(self.freeze_block),
            }));
        }

        Ok(())
    }
}

/// Reject the zero address where an account must be reachable
pub(crate) fn validate_address(value: Address) -> Result<(), SaleError> {
    if value.is_zero() {
        return Err(SaleError::ZeroAddress(ZeroAddress {}));
    }

    Ok(())
}

pub(crate) fn validate_price(price: U256) -> Result<(), SaleError> {
    if price.is_zero() {
        return Err(SaleError::ZeroPrice(ZeroPrice {}));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const OWNER: Address = address!("1000000000000000000000000000000000000001");
    const WALLET: Address = address!("2000000000000000000000000000000000000002");
    const TOKEN: Address = address!("3000000000000000000000000000000000000003");
    const SALE: Address = address!("4000000000000000000000000000000000000004");
    const JAMES: Address = address!("5000000000000000000000000000000000000005");
    const MIGUEL: Address = address!("6000000000000000000000000000000000000006");

    fn sale() -> Sale {
        Sale::new(SaleConfig {
            owner: OWNER,
            wallet: WALLET,
            token: TOKEN,
            price: U256::from(1_000u64),
            start_block: 100,
            freeze_block: 80,
        })
        .unwrap()
    }

    fn as_owner(block: u64) -> Env {
        Env::new(OWNER, block, SALE)
    }

    #[test]
    fn non_owner_cannot_administer() {
        let mut sale = sale();
        let before = sale.clone();
        let james = Env::new(JAMES, 10, SALE);
        let unauthorized = SaleError::Unauthorized(Unauthorized { caller: JAMES });

        assert_eq!(sale.change_owner(&james, JAMES), Err(unauthorized.clone()));
        assert_eq!(sale.change_price(&james, U256::from(1u64)), Err(unauthorized.clone()));
        assert_eq!(sale.change_wallet(&james, JAMES), Err(unauthorized.clone()));
        assert_eq!(sale.change_start_block(&james, 1), Err(unauthorized.clone()));
        assert_eq!(sale.emergency_toggle(&james), Err(unauthorized));
        assert_eq!(sale, before);
    }

    #[test]
    fn ownership_moves_and_comes_back() {
        let mut sale = sale();

        let event = sale.change_owner(&as_owner(10), MIGUEL).unwrap();
        assert_eq!(event, OwnerChanged { previousOwner: OWNER, newOwner: MIGUEL });
        assert_eq!(sale.owner(), MIGUEL);

        // the old owner lost its rights
        assert!(sale.change_owner(&as_owner(10), OWNER).is_err());

        sale.change_owner(&Env::new(MIGUEL, 10, SALE), OWNER).unwrap();
        assert_eq!(sale.owner(), OWNER);
    }

    #[test]
    fn setters_touch_only_their_field() {
        let mut sale = sale();
        let env = as_owner(10);

        let event = sale.change_price(&env, U256::from(2_666u64)).unwrap();
        assert_eq!(event.oldPrice, U256::from(1_000u64));
        assert_eq!(event.newPrice, U256::from(2_666u64));
        assert_eq!(event.actor, OWNER);

        sale.change_start_block(&env, 2_666).unwrap();
        sale.change_wallet(&env, address!("0000000000000000000000000000000000000001")).unwrap();

        assert_eq!(sale.price(), U256::from(2_666u64));
        assert_eq!(sale.start_block(), 2_666);
        assert_eq!(sale.wallet(), address!("0000000000000000000000000000000000000001"));
        assert_eq!(sale.owner(), OWNER);
        assert_eq!(sale.token(), TOKEN);
        assert_eq!(sale.freeze_block(), 80);
        assert!(!sale.emergency_flag());
    }

    #[test]
    fn price_and_start_block_freeze_at_freeze_block() {
        let mut sale = sale();

        assert!(sale.change_price(&as_owner(79), U256::from(5u64)).is_ok());

        for block in [80, 81, 1_000] {
            let frozen = SaleError::ConfigurationFrozen(ConfigurationFrozen {
                block: U256::from(block),
                freezeBlock: U256::from(80u64),
            });
            assert_eq!(sale.change_price(&as_owner(block), U256::from(7u64)), Err(frozen.clone()));
            assert_eq!(sale.change_start_block(&as_owner(block), 1), Err(frozen));
        }
        assert_eq!(sale.price(), U256::from(5u64));
        assert_eq!(sale.start_block(), 100);

        // wallet, owner and the emergency flag stay administrable
        assert!(sale.change_wallet(&as_owner(1_000), JAMES).is_ok());
        assert!(sale.emergency_toggle(&as_owner(1_000)).is_ok());
    }

    #[test]
    fn zero_price_and_zero_addresses_are_rejected() {
        let mut sale = sale();
        let env = as_owner(10);

        assert_eq!(sale.change_price(&env, U256::ZERO), Err(SaleError::ZeroPrice(ZeroPrice {})));
        assert_eq!(sale.change_owner(&env, Address::ZERO), Err(SaleError::ZeroAddress(ZeroAddress {})));
        assert_eq!(sale.change_wallet(&env, Address::ZERO), Err(SaleError::ZeroAddress(ZeroAddress {})));
    }

    #[test]
    fn emergency_toggle_round_trips() {
        let mut sale = sale();
        let env = as_owner(500);

        assert!(sale.emergency_toggle(&env).unwrap().emergencyFlag);
        assert_eq!(sale.phase(500, U256::from(1u64)), Phase::Halted);

        assert!(!sale.emergency_toggle(&env).unwrap().emergencyFlag);
        assert_eq!(sale.phase(500, U256::from(1u64)), Phase::Active);
    }

    #[test]
    fn phase_follows_block_flag_and_supply() {
        let mut sale = sale();
        let supply = U256::from(10u64);

        assert_eq!(sale.phase(0, supply), Phase::Pending);
        assert_eq!(sale.phase(99, supply), Phase::Pending);
        assert_eq!(sale.phase(100, supply), Phase::Active);
        assert_eq!(sale.phase(100, U256::ZERO), Phase::Exhausted);

        sale.emergency_toggle(&as_owner(0)).unwrap();
        assert_eq!(sale.phase(99, supply), Phase::Halted);
        assert_eq!(sale.phase(100, U256::ZERO), Phase::Halted);
    }
}
