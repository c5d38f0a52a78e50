use anyhow::{Context, Result, bail};
use clmm_client::{
    config::ClientConfig,
    price::{Price, is_within_pool_bounds, sqrt_price_x64_to_price, to_sqrt_price_x64},
    utils,
};

const USAGE: &str = "usage: clmm-client <amount_x> <decimals_x> <amount_y> <decimals_y>";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    // Conversion is offline; the endpoint is only checked when configured.
    if std::env::var_os("RPC_URL").is_some() {
        let config = ClientConfig::from_env().context("ledger configuration")?;
        tracing::info!(
            rpc_url = %config.rpc_url,
            skip_preflight = config.skip_preflight,
            commitment = %config.preflight_commitment,
            "[INIT] ledger endpoint"
        );
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [amount_x, decimals_x, amount_y, decimals_y] = args.as_slice() else {
        bail!(USAGE);
    };

    let amount_x: u128 = amount_x.parse().context("amount_x")?;
    let amount_y: u128 = amount_y.parse().context("amount_y")?;
    let decimals_x = utils::parse_decimals(decimals_x)?;
    let decimals_y = utils::parse_decimals(decimals_y)?;

    let price = Price::from_amounts(amount_x, decimals_x, amount_y, decimals_y);
    let sqrt_price_x64 = to_sqrt_price_x64(&price)?;
    let decoded = sqrt_price_x64_to_price(sqrt_price_x64);

    tracing::info!(
        %amount_x,
        decimals_x,
        %amount_y,
        decimals_y,
        %sqrt_price_x64,
        in_pool_bounds = is_within_pool_bounds(sqrt_price_x64),
        "[PRICE] converted"
    );
    println!("sqrt_price_x64 = {sqrt_price_x64}");
    println!("decoded price  = {decoded}");
    Ok(())
}
