//! On-disk record shapes for the metadata registry and batch files.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// One entry of `deployment/contracts.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContractRecord {
    /// Logical contract name, e.g. `UxuyProtocol`.
    pub contract_name: String,

    /// ABI document path, relative to the ABI directory.
    pub abi_file: String,

    /// Deployed addresses, one per chain.
    #[serde(default)]
    pub deployment: Vec<DeploymentRecord>,
}

/// A contract address on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeploymentRecord {
    pub chain_id: u64,
    pub address: String,
}

/// One entry of `chains/chains.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainRecord {
    pub id: u64,

    /// RPC endpoints in preference order.
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Whether the chain accepts EIP-1559 transactions.
    #[serde(default = "default_support_eip1559")]
    pub support_eip1559: bool,
}

fn default_support_eip1559() -> bool {
    true
}

/// One entry of an account batch file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BatchRecord {
    pub chain_id: u64,

    /// Account records passed through to the contract call untouched.
    ///
    /// Integers wider than 64 bits are kept as decimal strings.
    #[serde(default, deserialize_with = "deserialize_accounts")]
    pub accounts: Vec<Value>,
}

fn deserialize_accounts<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let accounts = Vec::<LosslessValue>::deserialize(deserializer)?;
    Ok(accounts.into_iter().map(|v| v.0).collect())
}

/// Largest magnitude an `f64` holds without rounding.
const F64_EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;

/// A JSON value that never rounds integers.
///
/// `serde_json::Number` tops out at 64 bits, while token quotas routinely
/// exceed that. Wider integers become decimal strings, which the encoder
/// coerces like any other numeric string.
struct LosslessValue(Value);

impl<'de> Deserialize<'de> for LosslessValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LosslessVisitor).map(LosslessValue)
    }
}

struct LosslessVisitor;

impl<'de> Visitor<'de> for LosslessVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Value, E> {
        Ok(match i64::try_from(v) {
            Ok(small) => Value::Number(small.into()),
            Err(_) => Value::String(v.to_string()),
        })
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Value, E> {
        Ok(match u64::try_from(v) {
            Ok(small) => Value::Number(small.into()),
            Err(_) => Value::String(v.to_string()),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        // Integers past 128 bits arrive here already rounded
        if v.abs() >= F64_EXACT_LIMIT {
            return Err(E::custom(format!(
                "number {} cannot be represented exactly, quote it as a string",
                v
            )));
        }
        Ok(Number::from_f64(v).map_or(Value::Null, Value::Number))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        LosslessValue::deserialize(deserializer).map(|v| v.0)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(LosslessValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = Map::new();
        while let Some((key, LosslessValue(value))) = map.next_entry::<String, LosslessValue>()? {
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_record_defaults() {
        let chains: Vec<ChainRecord> = serde_yaml::from_str(
            r#"
- id: 56
  endpoints:
    - https://bsc-dataseed.binance.org
- id: 66
  endpoints: []
  support_eip1559: false
"#,
        )
        .unwrap();

        assert_eq!(chains.len(), 2);
        assert!(chains[0].support_eip1559);
        assert_eq!(chains[0].endpoints, vec!["https://bsc-dataseed.binance.org"]);
        assert!(!chains[1].support_eip1559);
    }

    #[test]
    fn test_contract_record_parse() {
        let contracts: Vec<ContractRecord> = serde_yaml::from_str(
            r#"
- contract_name: UxuyProtocol
  abi_file: protocol.abi
  deployment:
    - chain_id: 56
      address: "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
"#,
        )
        .unwrap();

        assert_eq!(contracts[0].contract_name, "UxuyProtocol");
        assert_eq!(contracts[0].deployment[0].chain_id, 56);
    }

    #[test]
    fn test_batch_accounts_are_opaque() {
        let batch: Vec<BatchRecord> = serde_yaml::from_str(
            r#"
- chain_id: 56
  accounts:
    - account: "0x0000000000000000000000000000000000000001"
      quota: 10
"#,
        )
        .unwrap();

        assert_eq!(batch[0].accounts[0]["quota"], serde_json::json!(10));
    }

    #[test]
    fn test_batch_quota_wider_than_u64_is_kept_exact() {
        let batch: Vec<BatchRecord> = serde_yaml::from_str(
            r#"
- chain_id: 56
  accounts:
    - account: "0x0000000000000000000000000000000000000001"
      quota: 4171864654411494500000
      nested: [18446744073709551616, -9223372036854775809, 1.5, null]
"#,
        )
        .unwrap();

        let account = &batch[0].accounts[0];
        assert_eq!(account["quota"], serde_json::json!("4171864654411494500000"));
        assert_eq!(
            account["nested"],
            serde_json::json!(["18446744073709551616", "-9223372036854775809", 1.5, null])
        );
    }

    #[test]
    fn test_batch_quota_past_128_bits_must_be_quoted() {
        let err = serde_yaml::from_str::<Vec<BatchRecord>>(
            r#"
- chain_id: 56
  accounts:
    - quota: 1000000000000000000000000000000000000000000
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("quote it as a string"));
    }
}
