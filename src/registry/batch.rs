//! Account batch files.
//!
//! A batch file lists account records per chain. Only the record for the
//! active chain is used; its accounts are passed to the contract untouched.

use std::path::Path;

use serde_json::Value;

use crate::blockchain::types::{ChainId, DispatchError, DispatchResult};
use crate::registry::reader::read_yaml;
use crate::registry::types::BatchRecord;

/// Accounts scoped to one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBatch {
    chain_id: ChainId,
    accounts: Vec<Value>,
}

impl AccountBatch {
    pub fn new(chain_id: ChainId, accounts: Vec<Value>) -> Self {
        Self { chain_id, accounts }
    }

    /// Load the batch for `chain_id` from a YAML batch file.
    ///
    /// A file without a record for the chain yields an empty batch.
    pub async fn load(path: &Path, chain_id: ChainId) -> DispatchResult<Self> {
        let records: Vec<BatchRecord> = read_yaml(path).await?;
        let batch = Self::select(records, chain_id)?;

        tracing::debug!(
            path = %path.display(),
            chain_id = chain_id.0,
            accounts = batch.len(),
            "Account batch loaded"
        );

        Ok(batch)
    }

    /// Pick the record for `chain_id` out of parsed batch records.
    pub fn select(records: Vec<BatchRecord>, chain_id: ChainId) -> DispatchResult<Self> {
        let mut matching = records.into_iter().filter(|r| r.chain_id == chain_id.0);

        let accounts = match matching.next() {
            Some(record) => record.accounts,
            None => Vec::new(),
        };
        if matching.next().is_some() {
            return Err(DispatchError::Registry(format!(
                "batch file lists chain {} more than once",
                chain_id
            )));
        }

        Ok(Self { chain_id, accounts })
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn accounts(&self) -> &[Value] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Consume the batch, returning its accounts.
    pub fn into_accounts(self) -> Vec<Value> {
        self.accounts
    }
}
