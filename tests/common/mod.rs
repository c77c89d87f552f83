#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use parkwatch_lib::{FeedClient, FetchError, RawReading};

/// Feed that replays queued responses, then keeps serving `fallback`.
pub struct ScriptedFeed {
    queued: Mutex<VecDeque<Result<Vec<RawReading>, FetchError>>>,
    fallback: Vec<RawReading>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedFeed {
    pub fn serving(rows: Vec<RawReading>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: rows,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn then_fail_first(self, status: u16) -> Self {
        self.queued
            .lock()
            .unwrap()
            .push_back(Err(FetchError::Status { status }));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl FeedClient for ScriptedFeed {
    async fn fetch(&self, limit: usize) -> Result<Vec<RawReading>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.queued.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => Ok(self.fallback.iter().take(limit).cloned().collect()),
        }
    }
}

pub fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A feed row with every slot present, values rendered as strings like the feed does.
pub fn raw_row(entry_id: i64, created_at: &str, slots: [i64; 8]) -> RawReading {
    let mut value = json!({ "entry_id": entry_id, "created_at": created_at });
    for (index, slot) in slots.iter().enumerate() {
        value[format!("field{}", index + 1)] = json!(slot.to_string());
    }
    serde_json::from_value(value).unwrap()
}

/// Slots with the first `occupied` of them set, spilling extra units into slot 8.
pub fn slots_for(occupied: i64) -> [i64; 8] {
    let mut slots = [0; 8];
    for (index, slot) in slots.iter_mut().enumerate() {
        if (index as i64) < occupied.min(8) {
            *slot = 1;
        }
    }
    if occupied > 8 {
        slots[7] += occupied - 8;
    }
    slots
}

pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
