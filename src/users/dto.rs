use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Calorie target as clients send it: a JSON number, a numeric string, or an
/// explicit null to unset. Normalized to `Option<f64>` on the way in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalorieTarget(pub Option<f64>);

impl<'de> Deserialize<'de> for CalorieTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        match value {
            None | Some(serde_json::Value::Null) => Ok(Self(None)),
            Some(serde_json::Value::Number(n)) => n
                .as_f64()
                .map(|v| Self(Some(v)))
                .ok_or_else(|| de::Error::custom("target is not a representable number")),
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(|v| Self(Some(v)))
                .map_err(|_| de::Error::custom("target must be numeric")),
            Some(other) => Err(de::Error::custom(format!(
                "unsupported target value: {other}"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateCalorieTargetRequest {
    pub target: CalorieTarget,
}

#[derive(Debug, Serialize)]
pub struct CalorieTargetResponse {
    pub target: Option<f64>,
}
