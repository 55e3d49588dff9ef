//! Decoding replay engine output.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TraceError;
use crate::predecessors::TxOutcome;

/// Trace of one block transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxTraceResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TxTraceResult {
    /// Stands in for a block transaction the engine never saw.
    pub fn placeholder(reason: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.result.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    /// Filled by the next engine result, in order.
    Payload,
    Placeholder { tx_index: usize, reason: String },
}

/// Where each payload sent in a block trace sits among the block's
/// transactions.
///
/// A transaction contributes one slot per Ethereum message, or a single
/// placeholder slot if it did not decode or carried no Ethereum message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockLayout {
    slots: Vec<Slot>,
}

impl BlockLayout {
    pub fn new(outcomes: &[TxOutcome]) -> Self {
        let slots = outcomes
            .iter()
            .flat_map(|outcome| match outcome {
                TxOutcome::Decoded { payloads, .. } if !payloads.is_empty() => {
                    vec![Slot::Payload; payloads.len()]
                }
                TxOutcome::Decoded { tx_index, .. } => vec![Slot::Placeholder {
                    tx_index: *tx_index,
                    reason: "not an ethereum transaction".to_owned(),
                }],
                TxOutcome::Skipped { tx_index, reason } => vec![Slot::Placeholder {
                    tx_index: *tx_index,
                    reason: format!("failed to decode transaction: {reason}"),
                }],
            })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn payload_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Payload))
            .count()
    }

    /// Lays engine results out over the slots.
    ///
    /// Engines either answer once per submitted payload, in which case the
    /// placeholders are filled in here, or once per slot, in which case the
    /// results are taken as they are.
    pub fn fill(&self, results: Vec<TxTraceResult>) -> Result<Vec<TxTraceResult>, TraceError> {
        if results.len() == self.payload_count() {
            return self.scatter(results);
        }
        if results.len() == self.len() {
            return Ok(results);
        }
        Err(TraceError::MalformedResponse(format!(
            "expected {} or {} block trace results, got {}",
            self.payload_count(),
            self.len(),
            results.len()
        )))
    }

    fn scatter(&self, results: Vec<TxTraceResult>) -> Result<Vec<TxTraceResult>, TraceError> {
        let received = results.len();
        let mut results = results.into_iter();
        let mut filled = Vec::with_capacity(self.len());
        for slot in &self.slots {
            let result = match slot {
                Slot::Payload => results.next().ok_or_else(|| {
                    TraceError::MalformedResponse(format!(
                        "{received} block trace results for {} payloads",
                        self.payload_count()
                    ))
                })?,
                Slot::Placeholder { reason, .. } => TxTraceResult::placeholder(reason.as_str()),
            };
            filled.push(result);
        }
        match results.len() {
            0 => Ok(filled),
            extra => Err(TraceError::MalformedResponse(format!(
                "{extra} block trace results left over after filling {} slots",
                self.len()
            ))),
        }
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, TraceError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut de)
        .map_err(|e| TraceError::MalformedResponse(e.to_string()))?;
    de.end()
        .map_err(|e| TraceError::MalformedResponse(e.to_string()))?;
    Ok(value)
}

/// Output of a single transaction or call trace: one JSON value, whatever
/// shape the selected tracer produces.
pub fn decode_tx_trace(bytes: &[u8]) -> Result<Value, TraceError> {
    decode(bytes)
}

pub fn decode_block_trace(bytes: &[u8]) -> Result<Vec<TxTraceResult>, TraceError> {
    decode(bytes)
}
