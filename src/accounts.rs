//! On-chain account records and address derivation.
//!
//! Records are plain data. Addresses are derived by free functions from the
//! program id and a seed list, so the record types carry no behavior tied to
//! where they live.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use ethers::utils::{hex, keccak256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ClientError, Result};
use crate::price::{is_within_pool_bounds, sqrt_price_x64_to_price};

/// Number of ticks stored in one tick-array account.
pub const TICK_ARRAY_SIZE: i32 = 88;

const DERIVATION_MARKER: &[u8] = b"ProgramDerivedAddress";

pub mod seeds {
    pub const WHIRLPOOL: &[u8] = b"whirlpool";
    pub const POSITION: &[u8] = b"position";
    pub const TICK_ARRAY: &[u8] = b"tick_array";
}

/// 32-byte account address, shown and serialized as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw)
            .map_err(|e| ClientError::InvalidAccount(format!("address {s:?}: {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            ClientError::InvalidAccount(format!("address must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Derive a program-owned address from its seeds.
///
/// Each seed carries a little-endian `u64` length prefix, so `["ab", "c"]`
/// and `["a", "bc"]` differ whatever the seed sizes.
pub fn derive_address(program_id: &Address, seeds: &[&[u8]]) -> Address {
    let mut preimage = Vec::with_capacity(64 + seeds.iter().map(|s| s.len() + 8).sum::<usize>());
    preimage.extend_from_slice(program_id.as_ref());
    for seed in seeds {
        preimage.extend_from_slice(&(seed.len() as u64).to_le_bytes());
        preimage.extend_from_slice(seed);
    }
    preimage.extend_from_slice(DERIVATION_MARKER);
    Address(keccak256(preimage))
}

pub fn whirlpool_address(
    program_id: &Address,
    config: &Address,
    mint_a: &Address,
    mint_b: &Address,
    tick_spacing: u16,
) -> Address {
    derive_address(
        program_id,
        &[
            seeds::WHIRLPOOL,
            config.as_ref(),
            mint_a.as_ref(),
            mint_b.as_ref(),
            &tick_spacing.to_le_bytes(),
        ],
    )
}

pub fn position_address(program_id: &Address, position_mint: &Address) -> Address {
    derive_address(program_id, &[seeds::POSITION, position_mint.as_ref()])
}

/// Tick arrays are keyed by the decimal string of their start index.
pub fn tick_array_address(program_id: &Address, whirlpool: &Address, start_tick_index: i32) -> Address {
    let start = start_tick_index.to_string();
    derive_address(
        program_id,
        &[seeds::TICK_ARRAY, whirlpool.as_ref(), start.as_bytes()],
    )
}

/// Start index of the tick array holding `tick`, rounding toward negative infinity.
///
/// `None` for a zero spacing or when the start index falls outside `i32`.
pub fn tick_array_start_index(tick: i32, tick_spacing: u16) -> Option<i32> {
    let span = (tick_spacing as i32).checked_mul(TICK_ARRAY_SIZE)?;
    if span == 0 {
        return None;
    }
    tick.div_euclid(span).checked_mul(span)
}

/// Pool account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Whirlpool {
    pub whirlpools_config: Address,
    pub token_mint_a: Address,
    pub token_vault_a: Address,
    pub token_mint_b: Address,
    pub token_vault_b: Address,
    pub tick_spacing: u16,
    /// Hundredths of a basis point.
    pub fee_rate: u16,
    pub protocol_fee_rate: u16,
    pub liquidity: u128,
    /// Current price as `sqrt_price_x64`.
    pub sqrt_price: u128,
    pub tick_current_index: i32,
}

impl Whirlpool {
    /// Current price of token A in token B.
    pub fn price(&self) -> BigDecimal {
        sqrt_price_x64_to_price(self.sqrt_price)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_spacing == 0 {
            return Err(ClientError::InvalidAccount(
                "tick spacing must be non-zero".to_string(),
            ));
        }
        if !is_within_pool_bounds(self.sqrt_price) {
            return Err(ClientError::InvalidAccount(format!(
                "sqrt price {} outside pool bounds",
                self.sqrt_price
            )));
        }
        Ok(())
    }
}

/// Liquidity position account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub whirlpool: Address,
    pub position_mint: Address,
    pub liquidity: u128,
    pub tick_lower_index: i32,
    pub tick_upper_index: i32,
}

impl Position {
    /// Lower bound inclusive, upper bound exclusive.
    pub fn contains_tick(&self, tick: i32) -> bool {
        self.tick_lower_index <= tick && tick < self.tick_upper_index
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tick {
    pub initialized: bool,
    pub liquidity_net: i128,
    pub liquidity_gross: u128,
}

/// Tick-array account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickArray {
    pub whirlpool: Address,
    pub start_tick_index: i32,
    pub ticks: Vec<Tick>,
}

impl TickArray {
    /// Tick stored for `tick_index`, if it is aligned and falls in this array.
    pub fn tick_at(&self, tick_index: i32, tick_spacing: u16) -> Option<&Tick> {
        let spacing = tick_spacing as i32;
        if spacing == 0 || tick_index < self.start_tick_index {
            return None;
        }
        let delta = tick_index.checked_sub(self.start_tick_index)?;
        if delta % spacing != 0 {
            return None;
        }
        self.ticks.get((delta / spacing) as usize)
    }
}

/// Token balance account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccount {
    pub mint: Address,
    pub owner: Address,
    pub amount: u64,
}
