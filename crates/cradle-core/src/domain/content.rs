//! Week content: the structured record served by the tiered cache.

use serde::{Deserialize, Serialize};

/// AI-generated informational content for one pregnancy week.
///
/// Field names serialize in camelCase to match the JSON stored in the
/// shared cache tier; the round trip must be exact because the shared
/// tier is the system of record between processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekContent {
    pub week: u32,

    // 胎児サイズ（静的データ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baby_size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baby_size_cm: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baby_weight_g: Option<String>,

    // 生成コンテンツ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maternal_changes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_foods: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safe_exercises: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_sign: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_support: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkup: Option<String>,
}

impl WeekContent {
    /// Minimal content with only the week number set (tests and stubs).
    pub fn bare(week: u32) -> Self {
        Self {
            week,
            baby_size: None,
            baby_size_cm: None,
            baby_weight_g: None,
            development: None,
            maternal_changes: None,
            tip: None,
            recommended_foods: Vec::new(),
            safe_exercises: Vec::new(),
            warning_sign: None,
            emotional_support: None,
            checkup: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_roundtrips_exactly() {
        let content = WeekContent {
            development: Some("neural tube forming".to_string()),
            maternal_changes: Some("fatigue".to_string()),
            tip: Some("folic acid".to_string()),
            recommended_foods: vec!["spinach".to_string(), "lentils".to_string()],
            warning_sign: Some("severe cramping".to_string()),
            ..WeekContent::bare(7)
        };

        let s = serde_json::to_string(&content).unwrap();
        let back: WeekContent = serde_json::from_str(&s).unwrap();
        assert_eq!(back, content);
    }

    #[test]
    fn serializes_camel_case_and_omits_empty() {
        let content = WeekContent {
            maternal_changes: Some("none yet".to_string()),
            ..WeekContent::bare(3)
        };

        let v: serde_json::Value = serde_json::to_value(&content).unwrap();
        assert_eq!(v["week"], 3);
        assert_eq!(v["maternalChanges"], "none yet");
        assert!(v.get("recommendedFoods").is_none());
        assert!(v.get("babySize").is_none());
    }
}
