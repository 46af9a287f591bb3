use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Connection technology tag reported per operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
pub enum ConnectionTech {
    #[serde(rename = "4G")]
    #[strum(serialize = "4G")]
    FourG,
    #[serde(rename = "5G")]
    #[strum(serialize = "5G")]
    FiveG,
    #[serde(rename = "LTE")]
    #[strum(serialize = "LTE")]
    Lte,
    #[serde(rename = "5G-SA")]
    #[strum(serialize = "5G-SA")]
    FiveGSa,
    #[serde(rename = "H+")]
    #[strum(serialize = "H+")]
    HPlus,
}

/// Qualitative signal bucket. Caller-supplied, not derived from strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
pub enum SignalStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// One carrier entry in a scan result.
///
/// Numeric fields coming from the insight model are passed through without
/// clamping; only mock data guarantees the documented 0-100 ranges.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorResult {
    pub id: String,
    pub name: String,
    pub strength: i64,
    pub latency: i64,
    #[serde(rename = "type")]
    pub tech: ConnectionTech,
    pub status: SignalStatus,
    pub color: String,
    #[serde(flatten)]
    pub extension: Option<OperatorExtension>,
}

/// Extended fields added by later scanner revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorExtension {
    pub integrity_score: i64,
    pub bands: Vec<String>,
    pub verified: bool,
}

/// Ambient connection metadata snapshot supplied by the client, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub downlink: f64,
    pub effective_type: String,
    pub rtt: i64,
}

impl Default for NetworkStats {
    fn default() -> Self {
        Self {
            downlink: 0.0,
            effective_type: "unknown".to_string(),
            rtt: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
}

pub const DEFAULT_COLOR: &str = "#64748b";

const OPERATOR_COLORS: &[(&str, &str)] = &[
    ("Telkomsel", "#f43f5e"),
    ("XL Axiata", "#2563eb"),
    ("Indosat Ooredoo Hutchison", "#f59e0b"),
    ("Indosat", "#f59e0b"),
    ("Tri", "#7c3aed"),
    ("Smartfren", "#db2777"),
];

/// Display color for a carrier name. Case-sensitive; unknown names get the
/// neutral default.
pub fn resolve_color(name: &str) -> &'static str {
    OPERATOR_COLORS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_colors() {
        for (name, color) in OPERATOR_COLORS {
            assert_eq!(resolve_color(name), *color);
        }
    }

    #[test]
    fn unknown_name_gets_default() {
        assert_eq!(resolve_color("Vodafone"), DEFAULT_COLOR);
        // lookup is case-sensitive
        assert_eq!(resolve_color("telkomsel"), DEFAULT_COLOR);
    }

    #[test]
    fn tech_tags_on_the_wire() {
        let json = serde_json::to_string(&ConnectionTech::FiveGSa).unwrap();
        assert_eq!(json, "\"5G-SA\"");
        let parsed: ConnectionTech = serde_json::from_str("\"H+\"").unwrap();
        assert_eq!(parsed, ConnectionTech::HPlus);
    }

    #[test]
    fn extension_omitted_when_absent() {
        let op = OperatorResult {
            id: "1".to_string(),
            name: "Telkomsel".to_string(),
            strength: 92,
            latency: 18,
            tech: ConnectionTech::FiveG,
            status: SignalStatus::Excellent,
            color: resolve_color("Telkomsel").to_string(),
            extension: None,
        };
        let value = serde_json::to_value(&op).unwrap();
        assert!(value.get("integrityScore").is_none());
        assert_eq!(value["type"], "5G");
    }
}
