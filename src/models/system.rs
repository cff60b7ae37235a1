use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, EnumString};
use utoipa::ToSchema;

// ─── System configuration ────────────────────────────────────────────────────

/// Full description of a photovoltaic installation, as edited in the session.
///
/// Serialized field names are exactly the wire shape of the prediction
/// service's `POST /api/v1/predict` body, so this struct doubles as the
/// request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SystemConfiguration {
    pub location: Location,
    pub array: ArrayConfig,
    pub module_params: ModuleParams,
    pub inverter_params: InverterParams,
    pub loss_params: LossParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    /// Geographic latitude (°, -90…+90 advisory)
    pub latitude: f64,
    /// Geographic longitude (°, -180…+180 advisory)
    pub longitude: f64,
    /// Site altitude above sea level (m)
    pub altitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArrayConfig {
    /// Panel tilt from horizontal (°, 0…90 advisory)
    pub tilt: f64,
    /// Panel azimuth from North, clockwise (°, 0…360 advisory)
    pub azimuth: f64,
    pub stringing: Stringing,
}

/// Electrical arrangement: modules in series per string, strings in parallel
/// per inverter. Counts are advisory integers but share the uniform numeric
/// edit contract with every other leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Stringing {
    pub modules_per_string: f64,
    pub strings_per_inverter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModuleParams {
    /// Nameplate module power at STC (W)
    pub power: f64,
    /// Power temperature coefficient (%/°C, typically negative)
    pub temp_coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InverterParams {
    /// Rated inverter AC power (W)
    pub power: f64,
    /// Peak conversion efficiency (%)
    pub efficiency: f64,
}

impl Default for SystemConfiguration {
    /// Session defaults: a 50 kW rooftop array in central London.
    fn default() -> Self {
        Self {
            location: Location {
                latitude: 51.5074,
                longitude: -0.1278,
                altitude: 11.0,
            },
            array: ArrayConfig {
                tilt: 35.0,
                azimuth: 180.0,
                stringing: Stringing {
                    modules_per_string: 20.0,
                    strings_per_inverter: 10.0,
                },
            },
            module_params: ModuleParams {
                power: 400.0,
                temp_coefficient: -0.35,
            },
            inverter_params: InverterParams {
                power: 50000.0,
                efficiency: 96.5,
            },
            loss_params: LossParams::default(),
        }
    }
}

// ─── Loss categories ─────────────────────────────────────────────────────────

/// Closed set of loss categories the service models. Anything outside this
/// set coming back from the service is dropped at the deserialization
/// boundary rather than silently iterated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
    EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LossCategory {
    Soiling,
    Shading,
    Snow,
    Mismatch,
    Wiring,
    Connections,
    Lid,
    Nameplate,
    Age,
    Availability,
}

/// Expected system losses, one percentage per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LossParams {
    pub soiling: f64,
    pub shading: f64,
    pub snow: f64,
    pub mismatch: f64,
    pub wiring: f64,
    pub connections: f64,
    pub lid: f64,
    pub nameplate: f64,
    pub age: f64,
    pub availability: f64,
}

impl Default for LossParams {
    fn default() -> Self {
        Self {
            soiling: 2.0,
            shading: 1.0,
            snow: 0.5,
            mismatch: 2.0,
            wiring: 2.0,
            connections: 0.5,
            lid: 1.5,
            nameplate: 1.0,
            age: 0.0,
            availability: 3.0,
        }
    }
}

impl LossParams {
    #[allow(dead_code)]
    pub fn get(&self, category: LossCategory) -> f64 {
        match category {
            LossCategory::Soiling => self.soiling,
            LossCategory::Shading => self.shading,
            LossCategory::Snow => self.snow,
            LossCategory::Mismatch => self.mismatch,
            LossCategory::Wiring => self.wiring,
            LossCategory::Connections => self.connections,
            LossCategory::Lid => self.lid,
            LossCategory::Nameplate => self.nameplate,
            LossCategory::Age => self.age,
            LossCategory::Availability => self.availability,
        }
    }

    pub fn set(&mut self, category: LossCategory, value: f64) {
        match category {
            LossCategory::Soiling => self.soiling = value,
            LossCategory::Shading => self.shading = value,
            LossCategory::Snow => self.snow = value,
            LossCategory::Mismatch => self.mismatch = value,
            LossCategory::Wiring => self.wiring = value,
            LossCategory::Connections => self.connections = value,
            LossCategory::Lid => self.lid = value,
            LossCategory::Nameplate => self.nameplate = value,
            LossCategory::Age => self.age = value,
            LossCategory::Availability => self.availability = value,
        }
    }
}

// ─── Mutation commands ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationField {
    Latitude,
    Longitude,
    Altitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArrayField {
    Tilt,
    Azimuth,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StringingField {
    ModulesPerString,
    StringsPerInverter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModuleField {
    Power,
    TempCoefficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InverterField {
    Power,
    Efficiency,
}

/// Partial location update emitted by the map picker; unspecified fields
/// keep their current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationPatch {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

/// A single configuration edit. `value` is the raw user input — number or
/// string — and is coerced through [`coerce_numeric`], so no command can
/// fail or leave a non-finite number behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "set", rename_all = "snake_case")]
pub enum ConfigCommand {
    Location { field: LocationField, value: Value },
    Array { field: ArrayField, value: Value },
    Stringing { field: StringingField, value: Value },
    ModuleParams { field: ModuleField, value: Value },
    InverterParams { field: InverterField, value: Value },
    LossParams { category: LossCategory, value: Value },
    PatchLocation { patch: LocationPatch },
}

/// Coerce raw user input to a finite f64; anything unparseable becomes 0.
pub fn coerce_numeric(raw: &Value) -> f64 {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

impl SystemConfiguration {
    /// Single reducer for every configuration edit. Writes exactly one
    /// field (or merges a location patch) and leaves siblings untouched.
    pub fn apply(&mut self, command: &ConfigCommand) {
        match command {
            ConfigCommand::Location { field, value } => {
                let v = coerce_numeric(value);
                match field {
                    LocationField::Latitude => self.location.latitude = v,
                    LocationField::Longitude => self.location.longitude = v,
                    LocationField::Altitude => self.location.altitude = v,
                }
            }
            ConfigCommand::Array { field, value } => {
                let v = coerce_numeric(value);
                match field {
                    ArrayField::Tilt => self.array.tilt = v,
                    ArrayField::Azimuth => self.array.azimuth = v,
                }
            }
            ConfigCommand::Stringing { field, value } => {
                let v = coerce_numeric(value);
                match field {
                    StringingField::ModulesPerString => {
                        self.array.stringing.modules_per_string = v;
                    }
                    StringingField::StringsPerInverter => {
                        self.array.stringing.strings_per_inverter = v;
                    }
                }
            }
            ConfigCommand::ModuleParams { field, value } => {
                let v = coerce_numeric(value);
                match field {
                    ModuleField::Power => self.module_params.power = v,
                    ModuleField::TempCoefficient => self.module_params.temp_coefficient = v,
                }
            }
            ConfigCommand::InverterParams { field, value } => {
                let v = coerce_numeric(value);
                match field {
                    InverterField::Power => self.inverter_params.power = v,
                    InverterField::Efficiency => self.inverter_params.efficiency = v,
                }
            }
            ConfigCommand::LossParams { category, value } => {
                self.loss_params.set(*category, coerce_numeric(value));
            }
            ConfigCommand::PatchLocation { patch } => self.patch_location(patch),
        }
    }

    pub fn patch_location(&mut self, patch: &LocationPatch) {
        if let Some(lat) = patch.latitude {
            self.location.latitude = lat;
        }
        if let Some(lon) = patch.longitude {
            self.location.longitude = lon;
        }
        if let Some(alt) = patch.altitude {
            self.location.altitude = alt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(42.5), 42.5)]
    #[case(json!("42.5"), 42.5)]
    #[case(json!("  -0.35 "), -0.35)]
    #[case(json!("abc"), 0.0)]
    #[case(json!(""), 0.0)]
    #[case(json!(null), 0.0)]
    #[case(json!(true), 0.0)]
    #[case(json!("inf"), 0.0)]
    #[case(json!("NaN"), 0.0)]
    #[case(json!([1.0]), 0.0)]
    fn coercion_degrades_to_zero(#[case] raw: Value, #[case] expected: f64) {
        assert_eq!(coerce_numeric(&raw), expected);
    }

    #[test]
    fn invalid_edit_zeroes_field_and_leaves_siblings() {
        let mut config = SystemConfiguration::default();
        config.apply(&ConfigCommand::Location {
            field: LocationField::Latitude,
            value: json!("abc"),
        });
        assert_eq!(config.location.latitude, 0.0);
        assert_eq!(config.location.longitude, -0.1278);
        assert_eq!(config.location.altitude, 11.0);
    }

    #[test]
    fn out_of_range_values_are_accepted_unclamped() {
        // Range hints are advisory; validation belongs to the service.
        let mut config = SystemConfiguration::default();
        config.apply(&ConfigCommand::Array {
            field: ArrayField::Tilt,
            value: json!(120.0),
        });
        assert_eq!(config.array.tilt, 120.0);
    }

    #[test]
    fn stringing_edit_reaches_nested_record() {
        let mut config = SystemConfiguration::default();
        config.apply(&ConfigCommand::Stringing {
            field: StringingField::ModulesPerString,
            value: json!("24"),
        });
        assert_eq!(config.array.stringing.modules_per_string, 24.0);
        assert_eq!(config.array.stringing.strings_per_inverter, 10.0);
        assert_eq!(config.array.tilt, 35.0);
    }

    #[test]
    fn loss_edit_touches_one_category() {
        let mut config = SystemConfiguration::default();
        config.apply(&ConfigCommand::LossParams {
            category: LossCategory::Snow,
            value: json!(4.5),
        });
        assert_eq!(config.loss_params.snow, 4.5);
        assert_eq!(config.loss_params.soiling, 2.0);
        assert_eq!(config.loss_params.get(LossCategory::Snow), 4.5);
    }

    #[test]
    fn location_patch_preserves_unspecified_fields() {
        let mut config = SystemConfiguration::default();
        config.apply(&ConfigCommand::PatchLocation {
            patch: LocationPatch {
                latitude: Some(48.8566),
                longitude: Some(2.3522),
                altitude: None,
            },
        });
        assert_eq!(config.location.latitude, 48.8566);
        assert_eq!(config.location.longitude, 2.3522);
        assert_eq!(config.location.altitude, 11.0);
    }

    #[test]
    fn wire_round_trip_reproduces_numeric_fields() {
        let config = SystemConfiguration::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SystemConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn wire_field_names_match_prediction_service_contract() {
        let value = serde_json::to_value(SystemConfiguration::default()).unwrap();
        assert_eq!(value["module_params"]["temp_coefficient"], json!(-0.35));
        assert_eq!(value["inverter_params"]["efficiency"], json!(96.5));
        assert_eq!(value["array"]["stringing"]["modules_per_string"], json!(20.0));
        assert_eq!(value["loss_params"]["availability"], json!(3.0));
    }

    #[test]
    fn command_deserializes_from_tagged_json() {
        let cmd: ConfigCommand = serde_json::from_value(json!({
            "set": "loss_params",
            "category": "wiring",
            "value": "2.5"
        }))
        .unwrap();
        let mut config = SystemConfiguration::default();
        config.apply(&cmd);
        assert_eq!(config.loss_params.wiring, 2.5);
    }
}
