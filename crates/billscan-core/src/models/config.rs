//! Provider keyword configuration and built-in fallbacks.
//!
//! Configuration lives in a JSON file shaped `{"<provider>": {"settings":
//! {...}}}`. Every settings group carries a built-in default so a missing or
//! unparseable file degrades to the defaults instead of failing the request.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Search window used when a keyword definition gives none.
pub const DEFAULT_SEARCH_WINDOW: usize = 50;

/// Top-level keywords file: provider name mapped to its entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordsFile(pub HashMap<String, ProviderEntry>);

/// One provider's block in the keywords file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderEntry {
    #[serde(default)]
    pub settings: ProviderSettings,
}

/// Resolved, fully-populated settings for one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Terms that disqualify a phone match from being a contact.
    pub exclude_keywords: Vec<String>,

    /// Parent keywords (with optional sub-keys) for per-contact charges.
    pub required_keywords: Vec<KeywordDef>,

    /// Monetary sentences scanned on the bill-summary page.
    pub inline_sentences: Vec<SummaryKeyword>,

    /// Section marker and late-fee term for the account-level charges scan.
    pub account_level_keywords: AccountLevelKeywords,

    /// Keywords scanned within the previous-balance section.
    pub previous_balance_keywords: Vec<SummaryKeyword>,

    /// Phrases identifying the provider; at least one must appear in the
    /// document's leading pages.
    pub document_markers: Vec<String>,

    /// Sub-key ukeys whose matches are rejected when followed by a dash
    /// (disambiguates truncated recurring-charge labels).
    pub dash_guard_ukeys: Vec<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            exclude_keywords: vec![
                "in".to_string(),
                "pay".to_string(),
                "auto".to_string(),
                "device".to_string(),
            ],
            required_keywords: vec![
                KeywordDef::Structured(StructuredKeyword {
                    keyword: "Monthly Charges".to_string(),
                    name: None,
                    ukey: Some("monthly".to_string()),
                    search_range: Some(SearchRange::Chars(50)),
                    sub_keys: Vec::new(),
                }),
                KeywordDef::Structured(StructuredKeyword {
                    keyword: "BUS UNL Pro 5G Smartphone".to_string(),
                    name: None,
                    ukey: Some("smartphone".to_string()),
                    search_range: Some(SearchRange::Chars(50)),
                    sub_keys: Vec::new(),
                }),
            ],
            inline_sentences: vec![
                SummaryKeyword::detailed("Total Amount Due", "total_amount_due"),
                SummaryKeyword::detailed("Amount Due", "amount_due"),
                SummaryKeyword::detailed("Balance Due", "balance_due"),
            ],
            account_level_keywords: AccountLevelKeywords::default(),
            previous_balance_keywords: vec![
                SummaryKeyword::Detailed(SummaryKeywordDef {
                    keyword: "Previous Balance".to_string(),
                    name: Some("Previous Balance".to_string()),
                    ukey: Some("previous_balance".to_string()),
                    header: Some("h1".to_string()),
                    is_child: false,
                    include_contact: false,
                }),
                SummaryKeyword::Detailed(SummaryKeywordDef {
                    keyword: "Total Payments".to_string(),
                    name: Some("Total Payments".to_string()),
                    ukey: Some("total_payments".to_string()),
                    header: Some("h2".to_string()),
                    is_child: false,
                    include_contact: false,
                }),
            ],
            document_markers: vec!["verizon.com/business".to_string(), "verizon".to_string()],
            dash_guard_ukeys: vec!["accesscharge12m".to_string()],
        }
    }
}

impl ProviderSettings {
    /// Load one provider's settings from a keywords file.
    ///
    /// Any failure (missing file, bad JSON, unknown provider) falls back to
    /// the built-in defaults; configuration never hard-fails a request.
    pub fn from_file(path: &Path, provider: &str) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "failed to read keywords file {}: {e}, using built-in defaults",
                    path.display()
                );
                return Self::default();
            }
        };

        match serde_json::from_str::<KeywordsFile>(&content) {
            Ok(file) => match file.0.get(provider) {
                Some(entry) => entry.settings.clone(),
                None => {
                    warn!("no settings for provider {provider}, using built-in defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(
                    "failed to parse keywords file {}: {e}, using built-in defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Write a keywords file containing this provider's settings.
    pub fn write_file(&self, path: &Path, provider: &str) -> std::io::Result<()> {
        let mut file = KeywordsFile::default();
        file.0.insert(
            provider.to_string(),
            ProviderEntry {
                settings: self.clone(),
            },
        );
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

/// A keyword entry: either a bare string or a structured definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeywordDef {
    Plain(String),
    Structured(StructuredKeyword),
}

/// A structured parent keyword with optional sub-keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredKeyword {
    pub keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ukey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_range: Option<SearchRange>,
    #[serde(default, rename = "sub_key", skip_serializing_if = "Vec::is_empty")]
    pub sub_keys: Vec<SubKeywordDef>,
}

/// A sub-key definition under a parent keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubKeywordDef {
    pub keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ukey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_range: Option<SearchRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_pattern: Option<String>,
    #[serde(default, rename = "isInstallment")]
    pub is_installment: bool,
    #[serde(default, rename = "hasExpiration")]
    pub has_expiration: bool,
    #[serde(default, rename = "allowMultiple")]
    pub allow_multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A search window given as a character count, a `{start, end}` span, or a
/// numeric string. Empty strings mean "inherit".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchRange {
    Chars(usize),
    Span { start: usize, end: usize },
    Text(String),
}

impl SearchRange {
    /// Resolve a window to a character count, falling back to `inherit`.
    pub fn resolve(range: Option<&SearchRange>, inherit: usize) -> usize {
        match range {
            None => inherit,
            Some(SearchRange::Chars(0)) => inherit,
            Some(SearchRange::Chars(n)) => *n,
            Some(SearchRange::Span { start, end }) => end.saturating_sub(*start) + 1,
            Some(SearchRange::Text(s)) => s.trim().parse().unwrap_or(inherit),
        }
    }
}

/// Keywords for document-level scans (inline sentences, previous balance):
/// bare strings or definitions with display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryKeyword {
    Plain(String),
    Detailed(SummaryKeywordDef),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryKeywordDef {
    pub keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ukey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, rename = "isChild")]
    pub is_child: bool,
    #[serde(default, rename = "includeContact")]
    pub include_contact: bool,
}

impl SummaryKeyword {
    fn detailed(keyword: &str, ukey: &str) -> Self {
        SummaryKeyword::Detailed(SummaryKeywordDef {
            keyword: keyword.to_string(),
            name: None,
            ukey: Some(ukey.to_string()),
            header: None,
            is_child: false,
            include_contact: false,
        })
    }

    /// Built-in keyword with a fixed display name and ukey.
    pub(crate) fn with_metadata(keyword: &str, name: &str, ukey: &str) -> Self {
        SummaryKeyword::Detailed(SummaryKeywordDef {
            keyword: keyword.to_string(),
            name: Some(name.to_string()),
            ukey: Some(ukey.to_string()),
            header: None,
            is_child: false,
            include_contact: false,
        })
    }

    pub fn keyword(&self) -> &str {
        match self {
            SummaryKeyword::Plain(s) => s,
            SummaryKeyword::Detailed(d) => &d.keyword,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            SummaryKeyword::Plain(s) => s.clone(),
            SummaryKeyword::Detailed(d) => d.name.clone().unwrap_or_else(|| d.keyword.clone()),
        }
    }

    pub fn ukey(&self) -> String {
        match self {
            SummaryKeyword::Plain(s) => derive_ukey(s),
            SummaryKeyword::Detailed(d) => {
                d.ukey.clone().unwrap_or_else(|| derive_ukey(&d.keyword))
            }
        }
    }

    pub fn header(&self) -> Option<String> {
        match self {
            SummaryKeyword::Plain(_) => None,
            SummaryKeyword::Detailed(d) => d.header.clone(),
        }
    }

    pub fn is_child(&self) -> bool {
        match self {
            SummaryKeyword::Plain(_) => false,
            SummaryKeyword::Detailed(d) => d.is_child,
        }
    }

    pub fn include_contact(&self) -> bool {
        match self {
            SummaryKeyword::Plain(_) => false,
            SummaryKeyword::Detailed(d) => d.include_contact,
        }
    }
}

/// Markers for the account-level charges scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountLevelKeywords {
    pub search_term: String,
    pub late_fee_sentence: String,
}

impl Default for AccountLevelKeywords {
    fn default() -> Self {
        Self {
            search_term: "Account Level Charges Details".to_string(),
            late_fee_sentence: "Late Fee".to_string(),
        }
    }
}

/// Derive a ukey from a keyword by lower-casing and underscoring spaces.
pub fn derive_ukey(keyword: &str) -> String {
    keyword.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_cover_every_group() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.exclude_keywords.len(), 4);
        assert_eq!(settings.required_keywords.len(), 2);
        assert_eq!(settings.inline_sentences.len(), 3);
        assert_eq!(settings.previous_balance_keywords.len(), 2);
        assert_eq!(settings.account_level_keywords.late_fee_sentence, "Late Fee");
        assert_eq!(settings.dash_guard_ukeys, vec!["accesscharge12m"]);
    }

    #[test]
    fn test_parse_structured_and_plain_keywords() {
        let json = r#"{
            "verizon": {
                "settings": {
                    "required_keywords": [
                        "Surcharges",
                        {
                            "keyword": "Monthly Charges",
                            "ukey": "monthly",
                            "search_range": {"start": 1, "end": 120},
                            "sub_key": [
                                {
                                    "keyword": "Line Access",
                                    "ukey": "line_access",
                                    "allowMultiple": true,
                                    "category": "access"
                                }
                            ]
                        }
                    ]
                }
            }
        }"#;

        let file: KeywordsFile = serde_json::from_str(json).unwrap();
        let settings = &file.0["verizon"].settings;
        assert_eq!(settings.required_keywords.len(), 2);

        match &settings.required_keywords[0] {
            KeywordDef::Plain(s) => assert_eq!(s, "Surcharges"),
            other => panic!("expected plain keyword, got {other:?}"),
        }
        match &settings.required_keywords[1] {
            KeywordDef::Structured(kw) => {
                assert_eq!(kw.ukey.as_deref(), Some("monthly"));
                assert_eq!(kw.sub_keys.len(), 1);
                assert!(kw.sub_keys[0].allow_multiple);
            }
            other => panic!("expected structured keyword, got {other:?}"),
        }

        // Untouched groups fall back to defaults.
        assert_eq!(settings.exclude_keywords, ProviderSettings::default().exclude_keywords);
    }

    #[test]
    fn test_search_range_resolution() {
        assert_eq!(SearchRange::resolve(None, 50), 50);
        assert_eq!(SearchRange::resolve(Some(&SearchRange::Chars(75)), 50), 75);
        assert_eq!(
            SearchRange::resolve(Some(&SearchRange::Span { start: 1, end: 120 }), 50),
            120
        );
        assert_eq!(
            SearchRange::resolve(Some(&SearchRange::Text("".to_string())), 80),
            80
        );
        assert_eq!(
            SearchRange::resolve(Some(&SearchRange::Text("30".to_string())), 80),
            30
        );
    }

    #[test]
    fn test_unparseable_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, "{ not json").unwrap();

        let settings = ProviderSettings::from_file(&path, "verizon");
        assert_eq!(settings.document_markers, ProviderSettings::default().document_markers);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = ProviderSettings::from_file(Path::new("/nonexistent/keywords.json"), "verizon");
        assert_eq!(settings.exclude_keywords, ProviderSettings::default().exclude_keywords);
    }

    #[test]
    fn test_derive_ukey() {
        assert_eq!(derive_ukey("Total Amount Due"), "total_amount_due");
    }
}
