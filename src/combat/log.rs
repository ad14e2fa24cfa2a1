//! Combat logging
//!
//! Records damage, healing, zone lifecycle and deaths for post-run analysis.
//! Diagnostics go through `bevy::log`; this log is the gameplay record.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ConfigError;

/// Display identifier of a unit in the log, e.g. "Bog Mender #2"
pub type CombatantId = String;

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Timestamp in seconds since the log was cleared
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    /// Machine-readable payload for aggregations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Defense buff applied
    Buff,
    /// Zone opened
    ZoneOpened,
    /// Zone started closing
    ZoneClosed,
    /// Unit died
    Death,
    /// Configuration problem absorbed at runtime
    ConfigError,
    /// Scenario event (start, end, unload)
    MatchEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructuredEventData {
    Damage {
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
        is_killing_blow: bool,
    },
    Healing {
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
    },
    Death {
        victim: CombatantId,
        killer: Option<CombatantId>,
    },
}

/// The combat log resource storing all events
#[derive(Resource, Debug, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current time
    pub match_time: f32,
}

impl CombatLog {
    /// Clear the log for a new run
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
            data: None,
        });
    }

    pub fn log_damage(
        &mut self,
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
        is_killing_blow: bool,
        message: String,
    ) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type: CombatLogEventType::Damage,
            message,
            data: Some(StructuredEventData::Damage {
                source,
                target,
                ability,
                amount,
                is_killing_blow,
            }),
        });
    }

    pub fn log_healing(
        &mut self,
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
        message: String,
    ) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type: CombatLogEventType::Healing,
            message,
            data: Some(StructuredEventData::Healing {
                source,
                target,
                ability,
                amount,
            }),
        });
    }

    pub fn log_death(&mut self, victim: CombatantId, killer: Option<CombatantId>, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type: CombatLogEventType::Death,
            message,
            data: Some(StructuredEventData::Death { victim, killer }),
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn count(&self, event_type: CombatLogEventType) -> usize {
        self.entries.iter().filter(|e| e.event_type == event_type).count()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Total damage dealt by `source`, grouped by ability
    pub fn damage_by_ability(&self, source: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for entry in &self.entries {
            if let Some(StructuredEventData::Damage {
                source: s,
                ability,
                amount,
                ..
            }) = &entry.data
            {
                if s == source {
                    *totals.entry(ability.clone()).or_insert(0.0) += amount;
                }
            }
        }
        totals
    }

    pub fn damage_taken_by(&self, target: &str) -> f32 {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.data {
                Some(StructuredEventData::Damage { target: t, amount, .. }) if t == target => {
                    Some(*amount)
                }
                _ => None,
            })
            .sum()
    }

    pub fn healing_received_by(&self, target: &str) -> f32 {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.data {
                Some(StructuredEventData::Healing { target: t, amount, .. }) if t == target => {
                    Some(*amount)
                }
                _ => None,
            })
            .sum()
    }

    /// Number of killing blows landed by `source`
    pub fn killing_blows(&self, source: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| {
                matches!(
                    &entry.data,
                    Some(StructuredEventData::Damage { source: s, is_killing_blow: true, .. }) if s == source
                )
            })
            .count()
    }

    /// Units that died, in order
    pub fn deaths(&self) -> Vec<&CombatantId> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.data {
                Some(StructuredEventData::Death { victim, .. }) => Some(victim),
                _ => None,
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(&self.entries).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Write the log as JSON. Returns the path written.
    pub fn save_to_file(&self, path: &str) -> Result<String, ConfigError> {
        let contents = self.to_json()?;
        std::fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.into(),
            source,
        })?;
        Ok(path.to_string())
    }
}
