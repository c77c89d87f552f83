//! Occupancy feed boundary.
//!
//! Rows arrive loosely typed: any field may be missing, null, a number or a
//! string. Nothing here interprets them; `crate::ingest` turns them into
//! [`Reading`](crate::db::Reading)s or drops them.

mod thingspeak;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::SLOT_COUNT;
use crate::error::FetchError;

pub use thingspeak::ThingSpeakClient;

/// One row exactly as the feed delivered it. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    #[serde(default)]
    pub entry_id: Option<Value>,
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub field1: Option<Value>,
    #[serde(default)]
    pub field2: Option<Value>,
    #[serde(default)]
    pub field3: Option<Value>,
    #[serde(default)]
    pub field4: Option<Value>,
    #[serde(default)]
    pub field5: Option<Value>,
    #[serde(default)]
    pub field6: Option<Value>,
    #[serde(default)]
    pub field7: Option<Value>,
    #[serde(default)]
    pub field8: Option<Value>,
}

impl RawReading {
    /// Slot fields in slot order (`field1` first).
    pub fn slot_fields(&self) -> [Option<&Value>; SLOT_COUNT] {
        [
            self.field1.as_ref(),
            self.field2.as_ref(),
            self.field3.as_ref(),
            self.field4.as_ref(),
            self.field5.as_ref(),
            self.field6.as_ref(),
            self.field7.as_ref(),
            self.field8.as_ref(),
        ]
    }
}

/// Source of raw readings, newest `limit` rows per call.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, limit: usize) -> Result<Vec<RawReading>, FetchError>;
}
