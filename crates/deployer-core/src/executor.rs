//! The seam to the remote execution client.
//!
//! Transaction submission, confirmation waiting and gas estimation all live
//! behind [`Executor`]. The orchestrator treats every call as a blocking
//! request/response and never retries.

use crate::artifact::Artifact;
use crate::types::{Address, DeploymentResult, Receipt};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Failure reported by the execution client. The message is surfaced as-is.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExecutorError {
    pub message: String,
}

impl ExecutorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeployRequest {
    pub component: String,
    pub artifact: Artifact,
    pub args: Vec<serde_json::Value>,
    pub gas: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRequest {
    /// Registry name of the component being called.
    pub target: String,
    pub address: Address,
    pub method: String,
    pub args: Vec<serde_json::Value>,
}

pub trait Executor {
    fn deploy(&mut self, request: &DeployRequest) -> Result<DeploymentResult, ExecutorError>;

    fn call(&mut self, request: &CallRequest) -> Result<Receipt, ExecutorError>;

    /// Current head of the target chain.
    fn block_number(&mut self) -> Result<u64, ExecutorError>;
}

// ---------------------------------------------------------------------------
// SimulatedExecutor
// ---------------------------------------------------------------------------

/// One operation seen by the simulated executor, in submission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalEntry {
    Deploy {
        component: String,
        contract: String,
        address: Address,
        args: Vec<serde_json::Value>,
        gas: u64,
        links: Vec<String>,
    },
    Call {
        target: String,
        method: String,
        args: Vec<serde_json::Value>,
    },
}

/// An in-process executor that never touches a network.
///
/// Addresses and transaction hashes are derived from the sender and a nonce
/// with SHA-256, so the same sender and sequence of operations always yield
/// the same registry. Each transaction mines one block.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    sender: Address,
    nonce: u64,
    block: u64,
    journal: Vec<JournalEntry>,
}

impl SimulatedExecutor {
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            nonce: 0,
            block: 0,
            journal: Vec::new(),
        }
    }

    pub fn with_start_block(mut self, block: u64) -> Self {
        self.block = block;
        self
    }

    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    pub fn deploy_count(&self) -> usize {
        self.journal
            .iter()
            .filter(|e| matches!(e, JournalEntry::Deploy { .. }))
            .count()
    }

    pub fn call_count(&self) -> usize {
        self.journal.len() - self.deploy_count()
    }

    fn digest(&self, tag: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.sender.hex_digits().as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(tag);
        hasher.finalize().into()
    }

    fn next_receipt(&mut self, gas: Option<u64>) -> Receipt {
        let hash = self.digest(b"tx");
        let tx_hash = format!("0x{}", hex::encode(hash));
        self.nonce += 1;
        self.block += 1;
        Receipt {
            tx_hash: Some(tx_hash),
            block_number: Some(self.block),
            gas_used: gas,
            extra: serde_json::Value::Null,
        }
    }
}

impl Executor for SimulatedExecutor {
    fn deploy(&mut self, request: &DeployRequest) -> Result<DeploymentResult, ExecutorError> {
        if request.artifact.bytecode.contains("__") {
            return Err(ExecutorError::new(format!(
                "bytecode for '{}' still has unresolved library placeholders",
                request.component
            )));
        }
        let hash = self.digest(b"create");
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        let address = Address::from_bytes(&bytes);
        let receipt = self.next_receipt(Some(request.gas));

        self.journal.push(JournalEntry::Deploy {
            component: request.component.clone(),
            contract: request.artifact.contract_name.clone(),
            address: address.clone(),
            args: request.args.clone(),
            gas: request.gas,
            links: request.artifact.links.keys().cloned().collect(),
        });
        Ok(DeploymentResult { address, receipt })
    }

    fn call(&mut self, request: &CallRequest) -> Result<Receipt, ExecutorError> {
        let receipt = self.next_receipt(None);
        self.journal.push(JournalEntry::Call {
            target: request.target.clone(),
            method: request.method.clone(),
            args: request.args.clone(),
        });
        Ok(receipt)
    }

    fn block_number(&mut self) -> Result<u64, ExecutorError> {
        Ok(self.block)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
