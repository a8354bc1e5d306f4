//! Transaction signing.
//!
//! # Security
//! - Keys come from the command line or one environment variable, read by
//!   the CLI argument parser
//! - Keys are never logged, serialized, or echoed in errors
//!
//! Signatures are secp256k1 with RFC 6979 nonces, so identical inputs give
//! identical signatures.

use alloy::consensus::{SignableTransaction, Signed, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, Signature, TxHash, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;

use crate::blockchain::builder::{FeeMarket, UnsignedTransaction};
use crate::blockchain::types::{DispatchError, DispatchResult};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "CHAIN_DISPATCH_PRIVATE_KEY";

/// A signed transaction ready for broadcast.
///
/// Consumed by value on submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    unsigned: UnsignedTransaction,
    signature: Signature,
    signing_hash: B256,
    hash: TxHash,
    raw: Bytes,
}

impl SignedTransaction {
    /// The transaction that was signed.
    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn r(&self) -> U256 {
        self.signature.r()
    }

    pub fn s(&self) -> U256 {
        self.signature.s()
    }

    /// The `v` value as it appears on the wire: the y-parity for typed
    /// transactions, `chain_id * 2 + 35 + parity` for legacy ones.
    ///
    /// `None` when the legacy value does not fit in a `u64`, which
    /// `build_transaction` already refuses.
    pub fn v(&self) -> Option<u64> {
        let parity = u64::from(self.signature.v());
        match self.unsigned.fee_market() {
            FeeMarket::Eip1559 => Some(parity),
            FeeMarket::Legacy => self
                .unsigned
                .chain_id()
                .0
                .checked_mul(2)
                .and_then(|v| v.checked_add(35 + parity)),
        }
    }

    /// Locally computed transaction hash.
    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// EIP-2718 encoded bytes for `eth_sendRawTransaction`.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Recover the address that produced the signature.
    pub fn recover_signer(&self) -> DispatchResult<Address> {
        self.signature
            .recover_address_from_prehash(&self.signing_hash)
            .map_err(|e| DispatchError::InvalidKey(format!("signature does not recover: {}", e)))
    }
}

/// Signer holding one private key.
#[derive(Clone)]
pub struct TxSigner {
    signer: PrivateKeySigner,
}

impl std::fmt::Debug for TxSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxSigner")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

impl TxSigner {
    /// Create a signer from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> DispatchResult<Self> {
        // Strip 0x prefix if present
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        if key_hex.is_empty() {
            return Err(DispatchError::InvalidKey("private key is empty".to_string()));
        }

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| DispatchError::InvalidKey(format!("Invalid private key format: {}", e)))?;

        tracing::debug!(address = %signer.address(), "Signer initialized");

        Ok(Self { signer })
    }

    /// Address derived from the key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a transaction built for this signer's address.
    pub fn sign(&self, tx: UnsignedTransaction) -> DispatchResult<SignedTransaction> {
        if tx.from() != self.address() {
            return Err(DispatchError::InvalidTransactionParameters(format!(
                "transaction sender {} does not match signing key address {}",
                tx.from(),
                self.address()
            )));
        }

        let (envelope, signature, signing_hash) = match tx.fee_market() {
            FeeMarket::Eip1559 => {
                let signed = self.sign_consensus(tx.to_eip1559())?;
                let (signature, signing_hash) = (*signed.signature(), signed.signature_hash());
                (TxEnvelope::from(signed), signature, signing_hash)
            }
            FeeMarket::Legacy => {
                let signed = self.sign_consensus(tx.to_legacy())?;
                let (signature, signing_hash) = (*signed.signature(), signed.signature_hash());
                (TxEnvelope::from(signed), signature, signing_hash)
            }
        };

        let hash = *envelope.tx_hash();
        let raw = Bytes::from(envelope.encoded_2718());

        tracing::debug!(tx_hash = %hash, nonce = tx.nonce(), "Transaction signed");

        Ok(SignedTransaction {
            unsigned: tx,
            signature,
            signing_hash,
            hash,
            raw,
        })
    }

    fn sign_consensus<T>(&self, tx: T) -> DispatchResult<Signed<T>>
    where
        T: SignableTransaction<Signature>,
    {
        let signature = self
            .signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| DispatchError::InvalidKey(format!("Signing failed: {}", e)))?;
        Ok(tx.into_signed(signature))
    }
}

/// Sign `tx` with a hex-encoded private key.
pub fn sign(tx: UnsignedTransaction, private_key_hex: &str) -> DispatchResult<SignedTransaction> {
    TxSigner::from_private_key(private_key_hex)?.sign(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::builder::{build_transaction, FeePolicy, MAX_LEGACY_CHAIN_ID};
    use crate::blockchain::types::ChainId;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn unsigned(from: Address, fee_market: FeeMarket) -> UnsignedTransaction {
        build_transaction(
            from,
            Address::repeat_byte(0xaa),
            Bytes::from_static(&[0x01, 0x02, 0x03, 0x04]),
            ChainId(56),
            3,
            &FeePolicy::default(),
            fee_market,
        )
        .unwrap()
    }

    #[test]
    fn test_signer_from_private_key() {
        let signer = TxSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(signer.address().to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_signer_with_0x_prefix() {
        let signer = TxSigner::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(signer.address().to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_invalid_private_key() {
        let result = TxSigner::from_private_key("invalid_key");
        assert!(matches!(result, Err(DispatchError::InvalidKey(_))));
        assert!(!result.unwrap_err().to_string().contains("invalid_key"));

        assert!(matches!(
            TxSigner::from_private_key("0x"),
            Err(DispatchError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = TxSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let debug = format!("{:?}", signer);
        assert!(!debug.contains(TEST_PRIVATE_KEY));
        assert!(debug.to_lowercase().contains(TEST_ADDRESS));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let signer = TxSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let first = signer.sign(unsigned(signer.address(), FeeMarket::Eip1559)).unwrap();
        let second =
            sign(unsigned(signer.address(), FeeMarket::Eip1559), TEST_PRIVATE_KEY).unwrap();

        assert_eq!(first.signature(), second.signature());
        assert_eq!(first.raw(), second.raw());
        assert_eq!(first.hash(), second.hash());
    }

    #[test]
    fn test_signature_recovers_to_key_address() {
        let signer = TxSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();
        for fee_market in [FeeMarket::Eip1559, FeeMarket::Legacy] {
            let signed = signer.sign(unsigned(signer.address(), fee_market)).unwrap();
            assert_eq!(signed.recover_signer().unwrap(), signer.address());
        }
    }

    #[test]
    fn test_envelope_shape() {
        let signer = TxSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();

        let typed = signer.sign(unsigned(signer.address(), FeeMarket::Eip1559)).unwrap();
        assert_eq!(typed.raw()[0], 0x02);
        assert!(typed.v().unwrap() <= 1);

        let legacy = signer.sign(unsigned(signer.address(), FeeMarket::Legacy)).unwrap();
        // RLP list prefix, no type byte
        assert!(legacy.raw()[0] >= 0xc0);
        let v = legacy.v().unwrap();
        assert!(v == 56 * 2 + 35 || v == 56 * 2 + 36);
        assert_ne!(typed.hash(), legacy.hash());
    }

    #[test]
    fn test_legacy_v_at_largest_chain_id() {
        let signer = TxSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let tx = build_transaction(
            signer.address(),
            Address::repeat_byte(0xaa),
            Bytes::new(),
            ChainId(MAX_LEGACY_CHAIN_ID),
            0,
            &FeePolicy::default(),
            FeeMarket::Legacy,
        )
        .unwrap();

        let v = signer.sign(tx).unwrap().v().unwrap();
        assert!(v >= MAX_LEGACY_CHAIN_ID * 2 + 35);
    }

    #[test]
    fn test_sender_mismatch_rejected() {
        let signer = TxSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let err = signer
            .sign(unsigned(Address::repeat_byte(9), FeeMarket::Eip1559))
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTransactionParameters(_)));
    }
}
