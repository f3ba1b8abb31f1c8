//! Client for a deployed sale: optionally initializes it from `.env`, prints
//! its parameters and buys `PURCHASE_TOKENS` tokens at the current price.

use std::io::{BufRead, BufReader};
use std::str::FromStr;
use std::sync::Arc;

use dotenv::dotenv;
use ethers::{
    middleware::SignerMiddleware,
    prelude::abigen,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, TransactionReceipt, U256},
};
use eyre::{eyre, WrapErr};
use token_sale_ledger::SaleConfig;

/// Your private key file path.
const PRIV_KEY_PATH: &str = "PRIV_KEY_PATH";

/// Stylus RPC endpoint url.
const RPC_URL: &str = "RPC_URL";

/// Deployed program address.
const STYLUS_CONTRACT_ADDRESS: &str = "STYLUS_CONTRACT_ADDRESS";

/// Whole tokens to buy, skipped when unset.
const PURCHASE_TOKENS: &str = "PURCHASE_TOKENS";

abigen!(
    TokenSale,
    r#"[
        function init(address owner, address wallet, address token, uint256 price, uint64 start_block, uint64 freeze_block) external
        function purchaseTokens() external payable returns (uint256)
        function owner() external view returns (address)
        function wallet() external view returns (address)
        function token() external view returns (address)
        function price() external view returns (uint256)
        function startBlock() external view returns (uint64)
        function freezeBlock() external view returns (uint64)
        function emergencyFlag() external view returns (bool)
        function remainingSupply() external view returns (uint256)
        function phase() external view returns (uint8)
    ]"#
);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();

    let priv_key_path = var(PRIV_KEY_PATH)?;
    let rpc_url = var(RPC_URL)?;
    let contract_address = var(STYLUS_CONTRACT_ADDRESS)?;

    let provider = Provider::<Http>::try_from(rpc_url)?;
    let address: Address = contract_address.parse()?;

    let privkey = read_secret_from_file(&priv_key_path)?;
    let wallet = LocalWallet::from_str(&privkey)?;
    let chain_id = provider.get_chainid().await?.as_u64();
    let client = Arc::new(SignerMiddleware::new(provider, wallet.clone().with_chain_id(chain_id)));

    let sale = TokenSale::new(address, client);

    if let Some(config) = sale_config_from_env()? {
        let call = sale.init(
            to_ethers_address(config.owner),
            to_ethers_address(config.wallet),
            to_ethers_address(config.token),
            U256::from_big_endian(&config.price.to_be_bytes::<32>()),
            config.start_block,
            config.freeze_block,
        );
        let receipt = call.send().await?.await?;
        println!("initialized sale in tx {}", tx_hash(receipt.as_ref()));

        // init is open to anyone until it has run once
        let owner = sale.owner().call().await?;
        eyre::ensure!(owner == to_ethers_address(config.owner), "sale was initialized by someone else, owner {owner:?}");
    }

    let price = sale.price().call().await?;
    println!("owner = {:?}", sale.owner().call().await?);
    println!("wallet = {:?}", sale.wallet().call().await?);
    println!("token = {:?}", sale.token().call().await?);
    println!("price = {price}");
    println!("start block = {}", sale.start_block().call().await?);
    println!("freeze block = {}", sale.freeze_block().call().await?);
    println!("emergency flag = {}", sale.emergency_flag().call().await?);
    println!("remaining supply = {}", sale.remaining_supply().call().await?);
    println!("phase = {}", sale.phase().call().await?);

    if let Ok(tokens) = std::env::var(PURCHASE_TOKENS) {
        let tokens = U256::from_dec_str(&tokens).wrap_err("PURCHASE_TOKENS is not a number")?;
        let call = sale.purchase_tokens().value(tokens * price);
        let receipt = call.send().await?.await?;
        println!("bought {tokens} tokens in tx {}", tx_hash(receipt.as_ref()));
        println!("remaining supply = {}", sale.remaining_supply().call().await?);
    }

    Ok(())
}

fn var(name: &str) -> eyre::Result<String> {
    std::env::var(name).map_err(|_| eyre!("No {} env var set", name))
}

/// Sale parameters for `init`, present only when `SALE_OWNER` is set.
fn sale_config_from_env() -> eyre::Result<Option<SaleConfig>> {
    if std::env::var("SALE_OWNER").is_err() {
        return Ok(None);
    }

    let address = |name: &str| -> eyre::Result<alloy_primitives::Address> {
        alloy_primitives::Address::from_str(&var(name)?).wrap_err_with(|| format!("{name} is not an address"))
    };
    let block = |name: &str| -> eyre::Result<u64> {
        var(name)?.parse().wrap_err_with(|| format!("{name} is not a block number"))
    };

    let config = SaleConfig {
        owner: address("SALE_OWNER")?,
        wallet: address("SALE_WALLET")?,
        token: address("SALE_TOKEN")?,
        price: alloy_primitives::U256::from_str(&var("SALE_PRICE")?).wrap_err("SALE_PRICE is not a number")?,
        start_block: block("SALE_START_BLOCK")?,
        freeze_block: block("SALE_FREEZE_BLOCK")?,
    };
    config.validate().map_err(|err| eyre!("invalid sale configuration: {err:?}"))?;

    Ok(Some(config))
}

fn to_ethers_address(address: alloy_primitives::Address) -> Address {
    Address::from(address.into_array())
}

fn tx_hash(receipt: Option<&TransactionReceipt>) -> String {
    receipt
        .map(|receipt| format!("0x{}", hex::encode(receipt.transaction_hash)))
        .unwrap_or_else(|| "<pending>".to_string())
}

fn read_secret_from_file(fpath: &str) -> eyre::Result<String> {
    let f = std::fs::File::open(fpath)?;
    let mut buf_reader = BufReader::new(f);
    let mut secret = String::new();
    buf_reader.read_line(&mut secret)?;
    Ok(secret.trim().to_string())
}
