//! Audit records emitted by the sale once an invocation has fully succeeded.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    event SaleInitialized(
        address indexed owner,
        address indexed wallet,
        address indexed token,
        uint256 price,
        uint256 startBlock,
        uint256 freezeBlock
    );

    #[derive(Debug, PartialEq, Eq)]
    event OwnerChanged(address indexed previousOwner, address indexed newOwner);

    #[derive(Debug, PartialEq, Eq)]
    event PriceChanged(address indexed actor, uint256 oldPrice, uint256 newPrice);

    #[derive(Debug, PartialEq, Eq)]
    event WalletChanged(address indexed actor, address oldWallet, address newWallet);

    #[derive(Debug, PartialEq, Eq)]
    event StartBlockChanged(address indexed actor, uint256 oldStartBlock, uint256 newStartBlock);

    #[derive(Debug, PartialEq, Eq)]
    event EmergencyToggled(address indexed actor, bool emergencyFlag);

    #[derive(Debug, PartialEq, Eq)]
    event TokensPurchased(address indexed buyer, uint256 tokens, uint256 cost);
}
