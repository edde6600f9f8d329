//! Structured search options and their query-string form
//!
//! Mirrors the fields of the advanced search form:
//! `all "exact" any -none #ht lang:en from:f1 OR from:f2 to:t1 @m1 near:"place" :) :( include:retweets`

use serde::Deserialize;

/// Structured search options, loadable from the `[search]` config table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchOptions {
    /// All of these words (comma separated)
    pub allwords: Option<String>,

    /// Any of these words (comma separated)
    pub anywords: Option<String>,

    /// This exact phrase
    pub exactphrase: Option<String>,

    /// None of these words (comma separated)
    pub nonewords: Option<String>,

    /// These hashtags (whitespace separated, `#` optional)
    pub hashtags: Option<String>,

    /// Written in this language
    pub lang: Option<String>,

    /// From these accounts (whitespace separated, `@` optional)
    pub fromusers: Option<String>,

    /// To these accounts
    pub tousers: Option<String>,

    /// Mentioning these accounts
    pub mentionusers: Option<String>,

    /// Near this place
    pub place: Option<String>,

    #[serde(default)]
    pub positive: bool,

    #[serde(default)]
    pub negative: bool,

    #[serde(default)]
    pub retweets: bool,
}

impl SearchOptions {
    /// Overlays `overrides` on top of `self`; any value set in `overrides` wins
    pub fn merge(self, overrides: SearchOptions) -> SearchOptions {
        SearchOptions {
            allwords: overrides.allwords.or(self.allwords),
            anywords: overrides.anywords.or(self.anywords),
            exactphrase: overrides.exactphrase.or(self.exactphrase),
            nonewords: overrides.nonewords.or(self.nonewords),
            hashtags: overrides.hashtags.or(self.hashtags),
            lang: overrides.lang.or(self.lang),
            fromusers: overrides.fromusers.or(self.fromusers),
            tousers: overrides.tousers.or(self.tousers),
            mentionusers: overrides.mentionusers.or(self.mentionusers),
            place: overrides.place.or(self.place),
            positive: overrides.positive || self.positive,
            negative: overrides.negative || self.negative,
            retweets: overrides.retweets || self.retweets,
        }
    }

    /// Returns true if no option that narrows the query is set
    pub fn is_empty(&self) -> bool {
        self.query_terms().is_empty()
    }

    /// Builds the query terms in form order, without date bounds
    pub fn query_terms(&self) -> Vec<String> {
        let mut q = Vec::new();

        if let Some(words) = non_blank(&self.allwords) {
            q.push(comma_list(words).join(" AND "));
        }

        if let Some(words) = non_blank(&self.anywords) {
            q.push(comma_list(words).join(" OR "));
        }

        if let Some(phrase) = non_blank(&self.exactphrase) {
            q.push(format!("\"{}\"", phrase.trim()));
        }

        if let Some(words) = non_blank(&self.nonewords) {
            let excluded: Vec<String> = comma_list(words)
                .into_iter()
                .map(|w| format!("-{}", w))
                .collect();
            q.push(excluded.join(" "));
        }

        if let Some(tags) = non_blank(&self.hashtags) {
            q.push(prefixed(tags, "#", '#').join(" OR "));
        }

        if let Some(lang) = non_blank(&self.lang) {
            q.push(format!("lang:{}", lang.trim()));
        }

        if let Some(users) = non_blank(&self.fromusers) {
            q.push(prefixed(users, "from:", '@').join(" OR "));
        }

        if let Some(users) = non_blank(&self.tousers) {
            q.push(prefixed(users, "to:", '@').join(" OR "));
        }

        if let Some(users) = non_blank(&self.mentionusers) {
            q.push(prefixed(users, "@", '@').join(" OR "));
        }

        if let Some(place) = non_blank(&self.place) {
            q.push(format!("near:{}", place.trim()));
        }

        if self.positive {
            q.push(":)".to_string());
        }

        if self.negative {
            q.push(":(".to_string());
        }

        if self.retweets {
            q.push("include:retweets".to_string());
        }

        q
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn comma_list(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Splits on whitespace, strips one leading `strip` char and adds `prefix`
fn prefixed(value: &str, prefix: &str, strip: char) -> Vec<String> {
    value
        .split_whitespace()
        .map(|item| item.strip_prefix(strip).unwrap_or(item))
        .filter(|item| !item.is_empty())
        .map(|item| format!("{}{}", prefix, item))
        .collect()
}
