use serde::Serialize;
use std::collections::VecDeque;
use utoipa::ToSchema;

use crate::units::UnitSystem;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistoryPoint {
    pub time_label: String,
    pub speed_value: f64,
}

/// Replace-all payload for a chart sink.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartSeries {
    pub unit: UnitSystem,
    pub speed_unit: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
struct Entry {
    label: String,
    speed_mps: f64,
}

/// Bounded FIFO of speed readings for charting.
///
/// Points are kept in m/s and converted to the active unit on read, so a
/// unit switch never accumulates rounding error.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    unit: UnitSystem,
    entries: VecDeque<Entry>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize, unit: UnitSystem) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            unit,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Buffer sized to hold `chart_duration_seconds` worth of samples at
    /// one sample per `update_interval_ms`.
    pub fn for_duration(
        chart_duration_seconds: u64,
        update_interval_ms: u64,
        unit: UnitSystem,
    ) -> Self {
        Self::new(
            duration_capacity(chart_duration_seconds, update_interval_ms),
            unit,
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn unit(&self) -> UnitSystem {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, speed_mps: f64, label: impl Into<String>) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Entry {
            label: label.into(),
            speed_mps,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Shrinking drops the oldest points first.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn rebase(&mut self, old: UnitSystem, new: UnitSystem) {
        if old == new {
            return;
        }
        if old != self.unit {
            log::warn!(
                "history rebase from {} but buffer is in {}; using buffer unit",
                old,
                self.unit
            );
        }
        self.unit = new;
    }

    pub fn points(&self) -> Vec<HistoryPoint> {
        self.entries
            .iter()
            .map(|e| HistoryPoint {
                time_label: e.label.clone(),
                speed_value: self.unit.to_display_speed(e.speed_mps),
            })
            .collect()
    }

    pub fn series(&self) -> ChartSeries {
        let (labels, values) = self
            .entries
            .iter()
            .map(|e| (e.label.clone(), self.unit.to_display_speed(e.speed_mps)))
            .unzip();
        ChartSeries {
            unit: self.unit,
            speed_unit: self.unit.speed_label().to_string(),
            labels,
            values,
        }
    }
}

pub fn duration_capacity(chart_duration_seconds: u64, update_interval_ms: u64) -> usize {
    let interval = update_interval_ms.max(1);
    let total_ms = chart_duration_seconds.saturating_mul(1000);
    total_ms.div_ceil(interval).max(1) as usize
}
