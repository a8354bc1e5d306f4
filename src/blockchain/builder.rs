//! Unsigned transaction assembly.
//!
//! # Responsibilities
//! - Combine destination, payload, sender, nonce, fee policy and chain id
//! - Reject parameters that would produce a malformed transaction
//! - Apply the fee policy verbatim (no estimation)

use alloy::consensus::{TxEip1559, TxLegacy};
use alloy::primitives::{Address, Bytes, TxKind, U256};
use serde::{Deserialize, Serialize};

use crate::blockchain::types::{ChainId, DispatchError, DispatchResult};

/// Default gas limit for contract calls.
pub const DEFAULT_GAS_LIMIT: u64 = 8_000_000;

/// Default max fee per gas: 26 gwei.
pub const DEFAULT_MAX_FEE_PER_GAS: u64 = 26_000_000_000;

/// Default max priority fee per gas: 1 gwei.
pub const DEFAULT_MAX_PRIORITY_FEE_PER_GAS: u64 = 1_000_000_000;

/// Gas and fee parameters, applied as given.
///
/// On legacy chains `max_fee_per_gas` is used as the gas price and the
/// priority fee is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeePolicy {
    /// Gas limit in units.
    pub gas_limit: u64,

    /// Max fee per gas in wei.
    pub max_fee_per_gas: u64,

    /// Max priority fee per gas in wei.
    pub max_priority_fee_per_gas: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            max_fee_per_gas: DEFAULT_MAX_FEE_PER_GAS,
            max_priority_fee_per_gas: DEFAULT_MAX_PRIORITY_FEE_PER_GAS,
        }
    }
}

/// Transaction envelope family used on a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeeMarket {
    /// EIP-1559 dynamic fee transaction (type 2).
    #[default]
    Eip1559,
    /// Legacy transaction with EIP-155 replay protection.
    Legacy,
}

impl FeeMarket {
    /// Fee market for a chain given its EIP-1559 support flag.
    pub fn from_support(support_eip1559: bool) -> Self {
        if support_eip1559 {
            Self::Eip1559
        } else {
            Self::Legacy
        }
    }
}

/// A fully parameterized transaction awaiting a signature.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    from: Address,
    to: Address,
    nonce: u64,
    payload: Bytes,
    gas_limit: u64,
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
    chain_id: ChainId,
    fee_market: FeeMarket,
}

impl UnsignedTransaction {
    pub fn from(&self) -> Address {
        self.from
    }

    pub fn to(&self) -> Address {
        self.to
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn max_fee_per_gas(&self) -> u128 {
        self.max_fee_per_gas
    }

    pub fn max_priority_fee_per_gas(&self) -> u128 {
        self.max_priority_fee_per_gas
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn fee_market(&self) -> FeeMarket {
        self.fee_market
    }

    /// EIP-1559 consensus form.
    pub(crate) fn to_eip1559(&self) -> TxEip1559 {
        TxEip1559 {
            chain_id: self.chain_id.0,
            nonce: self.nonce,
            gas_limit: self.gas_limit,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            to: TxKind::Call(self.to),
            value: U256::ZERO,
            access_list: Default::default(),
            input: self.payload.clone(),
        }
    }

    /// Legacy consensus form with EIP-155 chain id.
    pub(crate) fn to_legacy(&self) -> TxLegacy {
        TxLegacy {
            chain_id: Some(self.chain_id.0),
            nonce: self.nonce,
            gas_price: self.max_fee_per_gas,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.to),
            value: U256::ZERO,
            input: self.payload.clone(),
        }
    }
}

/// Parse an address, rejecting empty or malformed input.
pub fn parse_address(text: &str) -> DispatchResult<Address> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DispatchError::InvalidTransactionParameters(
            "address is empty".to_string(),
        ));
    }
    trimmed.parse().map_err(|e| {
        DispatchError::InvalidTransactionParameters(format!("invalid address '{}': {}", trimmed, e))
    })
}

/// Largest chain id whose EIP-155 `v` (`chain_id * 2 + 36`) fits in a `u64`.
pub const MAX_LEGACY_CHAIN_ID: u64 = (u64::MAX - 36) / 2;

/// Build an unsigned contract call.
///
/// `nonce` must be the sender's next unused transaction count, read just
/// before this call.
pub fn build_transaction(
    from: Address,
    to: Address,
    payload: Bytes,
    chain_id: ChainId,
    nonce: u64,
    fee_policy: &FeePolicy,
    fee_market: FeeMarket,
) -> DispatchResult<UnsignedTransaction> {
    if chain_id.0 == 0 {
        return Err(DispatchError::InvalidTransactionParameters(
            "chain id must be non-zero".to_string(),
        ));
    }
    if fee_market == FeeMarket::Legacy && chain_id.0 > MAX_LEGACY_CHAIN_ID {
        return Err(DispatchError::InvalidTransactionParameters(format!(
            "chain id {} is too large for a legacy transaction",
            chain_id
        )));
    }
    if from == Address::ZERO {
        return Err(DispatchError::InvalidTransactionParameters(
            "sender address is empty".to_string(),
        ));
    }
    if to == Address::ZERO {
        return Err(DispatchError::InvalidTransactionParameters(
            "destination address is empty".to_string(),
        ));
    }
    if fee_policy.gas_limit == 0 {
        return Err(DispatchError::InvalidTransactionParameters(
            "gas limit must be non-zero".to_string(),
        ));
    }
    if fee_policy.max_priority_fee_per_gas > fee_policy.max_fee_per_gas {
        return Err(DispatchError::InvalidTransactionParameters(format!(
            "max priority fee {} exceeds max fee {}",
            fee_policy.max_priority_fee_per_gas, fee_policy.max_fee_per_gas
        )));
    }

    let tx = UnsignedTransaction {
        from,
        to,
        nonce,
        payload,
        gas_limit: fee_policy.gas_limit,
        max_fee_per_gas: u128::from(fee_policy.max_fee_per_gas),
        max_priority_fee_per_gas: u128::from(fee_policy.max_priority_fee_per_gas),
        chain_id,
        fee_market,
    };

    tracing::debug!(
        from = %tx.from,
        to = %tx.to,
        nonce = tx.nonce,
        chain_id = chain_id.0,
        gas_limit = tx.gas_limit,
        fee_market = ?fee_market,
        "Transaction built"
    );

    Ok(tx)
}
