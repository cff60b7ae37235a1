//! Derived-metrics engine.
//!
//! Pure transformations from a raw [`PredictionResult`] to the figures the
//! dashboard shows: loss totals, system efficiency, peak production month
//! and chart-ready series. Everything here is side-effect free and total —
//! degenerate inputs (empty series, empty breakdown, zero energy) produce
//! sentinels and zeros, never NaN, infinity or a panic.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::prediction::{LossBreakdown, PredictionResult};

/// Fixed calendar labels, index 0 = January.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Label shown when a peak month cannot be determined.
pub const NO_PEAK_LABEL: &str = "N/A";

/// Headline figures computed from a prediction result. Never persisted;
/// rebuilt from scratch for every result.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DerivedMetrics {
    /// Sum of all loss categories (kWh)
    pub total_losses_kwh: f64,
    /// annual / (annual + losses), as a percentage
    pub system_efficiency_pct: f64,
    /// Index of the best month (0 = January), `null` when the series is empty
    pub peak_month_index: Option<usize>,
    /// Calendar label of the best month, "N/A" when the series is empty
    pub peak_month: String,
    /// Energy of the best month (kWh), 0 when the series is empty
    pub peak_month_value_kwh: f64,
}

impl DerivedMetrics {
    pub fn from_result(result: &PredictionResult) -> Self {
        let total_losses_kwh = total_losses(&result.loss_breakdown_kwh);
        let peak = peak_month(&result.monthly_energy_kwh);
        Self {
            total_losses_kwh,
            system_efficiency_pct: system_efficiency(result.annual_energy_kwh, total_losses_kwh),
            peak_month_index: peak.index,
            peak_month: peak.label.to_string(),
            peak_month_value_kwh: peak.value_kwh,
        }
    }
}

/// Parallel label/value vectors, shaped for a bar or doughnut chart.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakMonth {
    /// Index into [`MONTH_LABELS`], `None` for an empty series
    pub index: Option<usize>,
    pub label: &'static str,
    pub value_kwh: f64,
}

/// Sum of every category in the breakdown. Non-finite values count as 0, so
/// the total is always finite.
#[must_use]
pub fn total_losses(breakdown: &LossBreakdown) -> f64 {
    breakdown
        .iter()
        .map(|(_, v)| if v.is_finite() { *v } else { 0.0 })
        .sum()
}

/// `annual / (annual + losses) * 100`, with the degenerate all-zero system
/// defined as 0 % rather than dividing by zero.
#[must_use]
pub fn system_efficiency(annual_energy_kwh: f64, total_losses_kwh: f64) -> f64 {
    let denominator = annual_energy_kwh + total_losses_kwh;
    if denominator != 0.0 {
        annual_energy_kwh / denominator * 100.0
    } else {
        0.0
    }
}

/// Single linear scan for the best month. Ties keep the first index
/// attaining the maximum.
#[must_use]
pub fn peak_month(monthly_energy_kwh: &[f64]) -> PeakMonth {
    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in monthly_energy_kwh.iter().enumerate() {
        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((index, value)),
        }
    }
    match best {
        Some((index, value_kwh)) => PeakMonth {
            index: Some(index),
            label: MONTH_LABELS.get(index).copied().unwrap_or(NO_PEAK_LABEL),
            value_kwh,
        },
        None => PeakMonth {
            index: None,
            label: NO_PEAK_LABEL,
            value_kwh: 0.0,
        },
    }
}

/// "soiling" → "Soiling", "nameplate_rating" → "Nameplate Rating".
/// ASCII case folding only.
#[must_use]
pub fn format_loss_label(raw_key: &str) -> String {
    raw_key
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pair the 12 fixed month labels with the monthly values; a short or
/// missing input pads the remaining months with 0.
#[must_use]
pub fn monthly_series(monthly_energy_kwh: &[f64]) -> ChartSeries {
    ChartSeries {
        labels: MONTH_LABELS.iter().map(|l| l.to_string()).collect(),
        values: (0..MONTH_LABELS.len())
            .map(|i| monthly_energy_kwh.get(i).copied().unwrap_or(0.0))
            .collect(),
    }
}

/// Parallel (label, value) series for the loss chart, preserving the
/// breakdown's insertion order — the upstream service's map order is
/// significant and must survive into the chart.
#[must_use]
pub fn loss_series(breakdown: &LossBreakdown) -> ChartSeries {
    ChartSeries {
        labels: breakdown
            .iter()
            .map(|(category, _)| format_loss_label(category.as_ref()))
            .collect(),
        values: breakdown.iter().map(|(_, v)| *v).collect(),
    }
}
