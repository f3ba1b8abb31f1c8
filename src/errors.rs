//! Revert reasons of the sale, ABI-encoded as Solidity custom errors.

use alloy_sol_types::sol;
use stylus_sdk::prelude::*;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    error NotInitialized();
    #[derive(Debug, PartialEq, Eq)]
    error AlreadyInitialized();
    #[derive(Debug, PartialEq, Eq)]
    error Unauthorized(address caller);
    #[derive(Debug, PartialEq, Eq)]
    error ConfigurationFrozen(uint256 block, uint256 freezeBlock);
    #[derive(Debug, PartialEq, Eq)]
    error ZeroAddress();
    #[derive(Debug, PartialEq, Eq)]
    error ZeroPrice();
    #[derive(Debug, PartialEq, Eq)]
    error SaleNotActive(uint8 phase);
    #[derive(Debug, PartialEq, Eq)]
    error ZeroPayment();
    #[derive(Debug, PartialEq, Eq)]
    error BelowMinimumPurchase(uint256 value, uint256 price);
    #[derive(Debug, PartialEq, Eq)]
    error InsufficientSupply(uint256 requested, uint256 remaining);
    #[derive(Debug, PartialEq, Eq)]
    error TokenTransferFailed();
    #[derive(Debug, PartialEq, Eq)]
    error TreasuryTransferFailed();
    #[derive(Debug, PartialEq, Eq)]
    error RefundFailed();
}

/// Every way a sale invocation can fail. Any of these aborts the whole invocation.
#[derive(SolidityError, Clone, Debug, PartialEq, Eq)]
pub enum SaleError {
    NotInitialized(NotInitialized),
    AlreadyInitialized(AlreadyInitialized),
    Unauthorized(Unauthorized),
    ConfigurationFrozen(ConfigurationFrozen),
    ZeroAddress(ZeroAddress),
    ZeroPrice(ZeroPrice),
    SaleNotActive(SaleNotActive),
    ZeroPayment(ZeroPayment),
    BelowMinimumPurchase(BelowMinimumPurchase),
    InsufficientSupply(InsufficientSupply),
    TokenTransferFailed(TokenTransferFailed),
    TreasuryTransferFailed(TreasuryTransferFailed),
    RefundFailed(RefundFailed),
}
