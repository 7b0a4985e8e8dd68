//! AuditTrail - append-only annotation log
//!
//! Records every state-changing action against a transaction, withdrawal
//! request, earning record or ledger balance. Entries are never mutated or
//! deleted; terminal entities keep their history.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which family of entity an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Transaction,
    Withdrawal,
    Earning,
    Ledger,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Transaction => "transaction",
            EntityKind::Withdrawal => "withdrawal",
            EntityKind::Earning => "earning",
            EntityKind::Ledger => "ledger",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(EntityKind::Transaction),
            "withdrawal" => Ok(EntityKind::Withdrawal),
            "earning" => Ok(EntityKind::Earning),
            "ledger" => Ok(EntityKind::Ledger),
            _ => Err(()),
        }
    }
}

/// One audit record. `at` is unix millis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub kind: EntityKind,
    pub entity_id: String,
    pub actor: String,
    pub action: String,
    pub note: Option<String>,
    pub at: i64,
}

/// Keyed append-only log. One entry per state-changing action.
#[derive(Debug, Default)]
pub struct AuditTrail {
    entries: DashMap<(EntityKind, String), Vec<AuditEntry>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry. There is deliberately no update or delete API.
    pub fn record(
        &self,
        kind: EntityKind,
        entity_id: &str,
        actor: &str,
        action: &str,
        note: Option<&str>,
    ) {
        let entry = AuditEntry {
            kind,
            entity_id: entity_id.to_string(),
            actor: actor.to_string(),
            action: action.to_string(),
            note: note.map(str::to_string),
            at: chrono::Utc::now().timestamp_millis(),
        };
        info!(
            kind = %kind,
            entity_id = %entity_id,
            actor = %actor,
            action = %action,
            "audit"
        );
        self.entries
            .entry((kind, entity_id.to_string()))
            .or_default()
            .push(entry);
    }

    /// All entries for one entity, in append (= timestamp) order.
    pub fn entries_for(&self, kind: EntityKind, entity_id: &str) -> Vec<AuditEntry> {
        self.entries
            .get(&(kind, entity_id.to_string()))
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Total entries across all entities.
    pub fn entry_count(&self) -> usize {
        self.entries.iter().map(|e| e.value().len()).sum()
    }
}
