use alloy_primitives::{Address, U256};

use crate::errors::SaleError;
use crate::sale::{validate_address, validate_price};

/// Parameters a sale is created with.
///
/// Token metadata (name, symbol, decimals) and the initial inventory belong to
/// the Token Ledger; the sale only needs to know where that ledger lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleConfig {
    /// Account allowed to administer the sale
    pub owner: Address,
    /// Treasury receiving the proceeds
    pub wallet: Address,
    /// Token Ledger the inventory is held on
    pub token: Address,
    /// Cost of one token in the smallest native unit
    pub price: U256,
    /// First block purchases are accepted at
    pub start_block: u64,
    /// First block at which price and start block can no longer change
    pub freeze_block: u64,
}

impl SaleConfig {
    pub fn validate(&self) -> Result<(), SaleError> {
        validate_address(self.owner)?;
        validate_address(self.wallet)?;
        validate_address(self.token)?;
        validate_price(self.price)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ZeroAddress, ZeroPrice};
    use alloy_primitives::address;

    fn config() -> SaleConfig {
        SaleConfig {
            owner: address!("1000000000000000000000000000000000000001"),
            wallet: address!("2000000000000000000000000000000000000002"),
            token: address!("3000000000000000000000000000000000000003"),
            price: U256::from(1_000u64),
            start_block: 10,
            freeze_block: 10,
        }
    }

    #[test]
    fn accepts_a_complete_configuration() {
        assert_eq!(config().validate(), Ok(()));
    }

    #[test]
    fn rejects_missing_accounts() {
        for broken in [
            SaleConfig { owner: Address::ZERO, ..config() },
            SaleConfig { wallet: Address::ZERO, ..config() },
            SaleConfig { token: Address::ZERO, ..config() },
        ] {
            assert_eq!(broken.validate(), Err(SaleError::ZeroAddress(ZeroAddress {})));
        }
    }

    #[test]
    fn rejects_free_tokens() {
        let broken = SaleConfig { price: U256::ZERO, ..config() };
        assert_eq!(broken.validate(), Err(SaleError::ZeroPrice(ZeroPrice {})));
    }

    #[test]
    fn start_and_freeze_blocks_are_independent() {
        let gap = SaleConfig { start_block: 50, freeze_block: 20, ..config() };
        assert!(gap.validate().is_ok());

        let late_freeze = SaleConfig { start_block: 20, freeze_block: 50, ..config() };
        assert!(late_freeze.validate().is_ok());
    }
}
