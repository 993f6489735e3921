use crate::{
    Error,
    Result,
    slots::{
        self,
        OUTCOME_COUNT,
        Reels,
        Symbol,
    },
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    cmp::Reverse,
    collections::BTreeMap,
    sync::{
        Mutex,
        MutexGuard,
    },
};

/// Point-in-time copy of the counters, taken under the history lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryCounts {
    pub total: u64,
    pub self_triggered: u64,
    pub by_outcome: [u64; OUTCOME_COUNT],
    pub by_symbol: BTreeMap<Symbol, u64>,
}

impl Default for HistoryCounts {
    fn default() -> Self {
        Self {
            total: 0,
            self_triggered: 0,
            by_outcome: [0; OUTCOME_COUNT],
            by_symbol: Symbol::ALL.into_iter().map(|symbol| (symbol, 0)).collect(),
        }
    }
}

impl HistoryCounts {
    pub fn occurrence_of(&self, outcome: u8) -> Result<u64> {
        slots::decode(outcome)?;
        Ok(self.by_outcome[usize::from(outcome) - 1])
    }

    pub fn symbol_count(&self, symbol: Symbol) -> u64 {
        self.by_symbol.get(&symbol).copied().unwrap_or_default()
    }

    /// Outcome codes ordered by occurrence (descending when `top`), ties broken by
    /// ascending code, truncated to `n`.
    pub fn extreme_outcomes(&self, top: bool, n: usize) -> Vec<u8> {
        let mut outcomes: Vec<u8> = (1..=OUTCOME_COUNT as u8).collect();
        let count = |outcome: &u8| self.by_outcome[usize::from(*outcome) - 1];
        // stable sorts keep the ascending code order within equal counts
        if top {
            outcomes.sort_by_key(|outcome| Reverse(count(outcome)));
        } else {
            outcomes.sort_by_key(count);
        }
        outcomes.truncate(n);
        outcomes
    }
}

/// On-disk layout of the history file.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryRecord {
    count: u64,
    #[serde(default, alias = "self_test_count")]
    self_trigger_count: u64,
    occurrences_by_value: Vec<u64>,
    occurrences_by_slot: BTreeMap<String, u64>,
}

impl From<&HistoryCounts> for HistoryRecord {
    fn from(counts: &HistoryCounts) -> Self {
        Self {
            count: counts.total,
            self_trigger_count: counts.self_triggered,
            occurrences_by_value: counts.by_outcome.to_vec(),
            occurrences_by_slot: counts
                .by_symbol
                .iter()
                .map(|(symbol, count)| (symbol.name().to_string(), *count))
                .collect(),
        }
    }
}

impl TryFrom<HistoryRecord> for HistoryCounts {
    type Error = Error;

    fn try_from(record: HistoryRecord) -> Result<Self> {
        let by_outcome: [u64; OUTCOME_COUNT] = record
            .occurrences_by_value
            .try_into()
            .map_err(|values: Vec<u64>| {
                Error::Format(format!(
                    "occurrences_by_value holds {} entries, expected {OUTCOME_COUNT}",
                    values.len()
                ))
            })?;
        let mut by_symbol = HistoryCounts::default().by_symbol;
        for (name, count) in record.occurrences_by_slot {
            let symbol = Symbol::from_name(&name)
                .ok_or_else(|| Error::Format(format!("unknown slot: {name}")))?;
            by_symbol.insert(symbol, count);
        }
        Ok(Self {
            total: record.count,
            self_triggered: record.self_trigger_count,
            by_outcome,
            by_symbol,
        })
    }
}

/// Running slot machine statistics, shared by the polling loop and the spammer.
#[derive(Debug, Default)]
pub struct History {
    counts: Mutex<HistoryCounts>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: HistoryCounts) -> Self {
        Self {
            counts: Mutex::new(counts),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryCounts> {
        // counters stay consistent even if a holder panicked; nothing panics under the lock
        self.counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count one observed outcome and return the reels it resolved to.
    pub fn record(&self, outcome: u8) -> Result<Reels> {
        let reels = slots::decode(outcome)?;
        let mut counts = self.lock();
        counts.total += 1;
        counts.by_outcome[usize::from(outcome) - 1] += 1;
        for symbol in reels {
            *counts.by_symbol.entry(symbol).or_default() += 1;
        }
        Ok(reels)
    }

    /// Must follow the `record` of the same throw.
    pub fn record_self_triggered(&self) {
        self.lock().self_triggered += 1;
    }

    pub fn occurrence_of(&self, outcome: u8) -> Result<u64> {
        self.lock().occurrence_of(outcome)
    }

    pub fn extreme_outcomes(&self, top: bool, n: usize) -> Vec<u8> {
        self.lock().extreme_outcomes(top, n)
    }

    pub fn counts(&self) -> HistoryCounts {
        self.lock().clone()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let counts = self.lock();
        serde_json::to_vec(&HistoryRecord::from(&*counts))
            .map_err(|e| Error::Format(format!("failed to encode history: {e}")))
    }

    /// Replace every counter with the ones encoded in `bytes`.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<()> {
        let record: HistoryRecord =
            serde_json::from_slice(bytes).map_err(|e| Error::Format(e.to_string()))?;
        let restored = HistoryCounts::try_from(record)?;
        let outcome_sum: u64 = restored.by_outcome.iter().sum();
        if outcome_sum != restored.total {
            tracing::warn!(
                "history count {} disagrees with per-outcome sum {}",
                restored.total,
                outcome_sum
            );
        }
        *self.lock() = restored;
        Ok(())
    }
}
