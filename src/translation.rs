use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Localisation lookup used for synthetic row names and CSV headers.
pub trait Translator {
    /// Resolves `key`, substituting `{{name}}` placeholders from `params`.
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String;

    fn t(&self, key: &str) -> String {
        self.translate(key, &[])
    }
}

fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{{{}}}}}", name), value)
    })
}

/// Any `Fn(&str) -> String` lookup works as a translator.
impl<F> Translator for F
where
    F: Fn(&str) -> String,
{
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        interpolate(&self(key), params)
    }
}

/// Echoes keys back; handy when the caller localises later.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTranslator;

impl Translator for KeyTranslator {
    fn translate(&self, key: &str, _params: &[(&str, &str)]) -> String {
        key.to_string()
    }
}

/// Translator backed by a flat key -> template map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapTranslator {
    pub entries: HashMap<String, String>,
}

impl MapTranslator {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl Translator for MapTranslator {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        // Missing keys fall back to the key itself, like i18next does
        let template = self.entries.get(key).map(String::as_str).unwrap_or(key);
        interpolate(template, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_translator_echoes() {
        assert_eq!(KeyTranslator.t("report.title"), "report.title");
    }

    #[test]
    fn test_map_translator_interpolates() {
        let t = MapTranslator::default()
            .with_entry("summary", "{{name}} yhteensä")
            .with_entry("plain", "Investointiosa");

        assert_eq!(t.translate("summary", &[("name", "8 03 Kadut")]), "8 03 Kadut yhteensä");
        assert_eq!(t.t("plain"), "Investointiosa");
        assert_eq!(t.t("missing.key"), "missing.key");
    }

    #[test]
    fn test_closure_translator() {
        let t = |key: &str| match key {
            "summary" => "{{name}} total".to_string(),
            other => other.to_uppercase(),
        };
        assert_eq!(t.translate("summary", &[("name", "Streets")]), "Streets total");
        assert_eq!(Translator::t(&t, "months.may"), "MONTHS.MAY");
    }

    #[test]
    fn test_map_translator_from_json() {
        let t = MapTranslator::from_json(r#"{ "a": "A" }"#).unwrap();
        assert_eq!(t.t("a"), "A");
    }
}
