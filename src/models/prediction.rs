use indexmap::IndexMap;
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::system::LossCategory;

// ─── Prediction service wire types ───────────────────────────────────────────

/// Annual forecast returned by the prediction service.
///
/// Decoding is deliberately lenient: a partial or sloppy payload still
/// yields a usable result. Missing fields default to zero/empty and
/// non-numeric entries coerce to 0, so the dashboard renders best-effort
/// instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionResult {
    /// Predicted yearly energy yield (kWh)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub annual_energy_kwh: f64,
    /// Predicted energy per calendar month, index 0 = January (kWh)
    #[serde(default, deserialize_with = "lenient_f64_seq")]
    pub monthly_energy_kwh: Vec<f64>,
    /// Delivered / theoretical energy fraction (IEC 61724), conventionally 0…1
    #[serde(default, deserialize_with = "lenient_f64")]
    pub performance_ratio: f64,
    /// Energy lost per category (kWh)
    #[serde(default)]
    pub loss_breakdown_kwh: LossBreakdown,
}

/// Per-category energy losses, preserving the service's map order.
///
/// Iteration order is significant downstream (chart series mirror it), so
/// this wraps an insertion-ordered map. Categories outside [`LossCategory`]
/// are dropped here, at the single decoding boundary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, ToSchema)]
#[schema(value_type = Object)]
pub struct LossBreakdown(pub IndexMap<LossCategory, f64>);

impl LossBreakdown {
    pub fn iter(&self) -> impl Iterator<Item = (&LossCategory, &f64)> {
        self.0.iter()
    }
}

impl FromIterator<(LossCategory, f64)> for LossBreakdown {
    fn from_iter<I: IntoIterator<Item = (LossCategory, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for LossBreakdown {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut breakdown = IndexMap::with_capacity(raw.len());
        for (key, value) in raw {
            // Unknown categories from the service are ignored, not stored.
            if let Ok(category) = key.parse::<LossCategory>() {
                breakdown.insert(category, finite_or_zero(&value));
            }
        }
        Ok(Self(breakdown))
    }
}

/// Structured error body the service sends on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceErrorBody {
    pub error: Option<String>,
}

// ─── Lenient numeric decoding ────────────────────────────────────────────────

fn finite_or_zero(value: &Value) -> f64 {
    value.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(finite_or_zero(&value))
}

fn lenient_f64_seq<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.iter().map(finite_or_zero).collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(D::Error::custom(format!(
            "expected an array of monthly values, got {other}"
        ))),
    }
}
