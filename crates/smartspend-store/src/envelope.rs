//! Versioned container written to storage
//!
//! Wire shape: `{"version": <u32>, "state": { <slice>: [...], ... }}`

use serde::{Deserialize, Serialize};

use crate::slice::StoreState;
use crate::Result;

#[derive(Serialize)]
struct Envelope<'a, S> {
    version: u32,
    state: &'a S,
}

pub(crate) fn encode<S: Serialize>(version: u32, state: &S) -> Result<String> {
    Ok(serde_json::to_string(&Envelope { version, state })?)
}

/// Envelope as read back, before the state is trusted to match `S`.
#[derive(Debug, Deserialize)]
pub(crate) struct StoredEnvelope {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub state: serde_json::Value,
}

impl StoredEnvelope {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn into_state<S: StoreState>(self) -> Result<S> {
        if self.state.is_null() {
            return Ok(S::default());
        }
        Ok(serde_json::from_value(self.state)?)
    }
}
