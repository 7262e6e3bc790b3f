//! Keyword configuration normalization into flat search specs.

use crate::models::config::{
    DEFAULT_SEARCH_WINDOW, KeywordDef, SearchRange, StructuredKeyword, SubKeywordDef, derive_ukey,
};

/// A single resolved search instruction for the association engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpec {
    pub search_term: String,
    pub display_name: String,
    pub ukey: String,
    /// Characters scanned after an occurrence for the associated value.
    pub search_window: usize,
    pub is_child: bool,
    pub parent_ukey: Option<String>,
    pub parent_term: Option<String>,
    /// Custom occurrence pattern; a case-insensitive literal match of
    /// `search_term` is used when absent.
    pub pattern_override: Option<String>,
    pub is_installment: bool,
    pub has_expiration: bool,
    pub allow_multiple: bool,
    pub category: String,
}

impl SearchSpec {
    fn plain(keyword: &str) -> Self {
        Self {
            search_term: keyword.to_string(),
            display_name: keyword.to_string(),
            ukey: derive_ukey(keyword),
            search_window: DEFAULT_SEARCH_WINDOW,
            is_child: false,
            parent_ukey: None,
            parent_term: None,
            pattern_override: None,
            is_installment: false,
            has_expiration: false,
            allow_multiple: false,
            category: String::new(),
        }
    }
}

/// Flatten keyword definitions into an ordered spec list: each parent
/// immediately followed by its children.
pub fn normalize_keywords(defs: &[KeywordDef]) -> Vec<SearchSpec> {
    let mut specs = Vec::new();

    for def in defs {
        match def {
            KeywordDef::Plain(keyword) => {
                if keyword.is_empty() {
                    continue;
                }
                specs.push(SearchSpec::plain(keyword));
            }
            KeywordDef::Structured(kw) => {
                if kw.keyword.is_empty() {
                    continue;
                }
                let parent_window =
                    SearchRange::resolve(kw.search_range.as_ref(), DEFAULT_SEARCH_WINDOW);
                specs.push(parent_spec(kw, parent_window));
                for sub in &kw.sub_keys {
                    if sub.keyword.is_empty() {
                        continue;
                    }
                    specs.push(child_spec(kw, sub, parent_window));
                }
            }
        }
    }

    specs
}

fn parent_spec(kw: &StructuredKeyword, window: usize) -> SearchSpec {
    SearchSpec {
        search_term: kw.keyword.clone(),
        display_name: kw.name.clone().unwrap_or_else(|| kw.keyword.clone()),
        ukey: kw.ukey.clone().unwrap_or_else(|| derive_ukey(&kw.keyword)),
        search_window: window,
        ..SearchSpec::plain(&kw.keyword)
    }
}

fn child_spec(parent: &StructuredKeyword, sub: &SubKeywordDef, parent_window: usize) -> SearchSpec {
    SearchSpec {
        search_term: sub.keyword.clone(),
        display_name: sub.name.clone().unwrap_or_else(|| sub.keyword.clone()),
        ukey: sub.ukey.clone().unwrap_or_else(|| derive_ukey(&sub.keyword)),
        search_window: SearchRange::resolve(sub.search_range.as_ref(), parent_window),
        is_child: true,
        parent_ukey: Some(
            parent
                .ukey
                .clone()
                .unwrap_or_else(|| derive_ukey(&parent.keyword)),
        ),
        parent_term: Some(parent.keyword.clone()),
        pattern_override: sub
            .keyword_pattern
            .as_deref()
            .map(|p| strip_quotes(p).to_string()),
        is_installment: sub.is_installment,
        has_expiration: sub.has_expiration,
        allow_multiple: sub.allow_multiple,
        category: sub.category.clone().unwrap_or_default(),
    }
}

/// Strip a matched pair of surrounding quote characters from a pattern.
fn strip_quotes(pattern: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(stripped) = pattern
            .strip_prefix(quote)
            .and_then(|p| p.strip_suffix(quote))
        {
            return stripped;
        }
    }
    pattern
}
