//! Filter text parsing

use super::FilterTag;
use std::collections::BTreeMap;

/// Parsed contents of the collection search box
///
/// Built once per filter text change and read for every node the view asks
/// about. Parsing never fails: anything that isn't a well-formed `tag:value`
/// token for a known tag becomes free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    free_text: String,
    tags: BTreeMap<FilterTag, String>,
}

impl FilterQuery {
    pub fn parse(text: &str) -> Self {
        let mut words: Vec<String> = Vec::new();
        let mut tags = BTreeMap::new();

        for token in text.split_whitespace() {
            let Some((name, value)) = token.split_once(':') else {
                words.push(token.to_string());
                continue;
            };

            let name = name.trim();
            let value = value.replace(':', "");
            let value = value.trim();

            match FilterTag::from_name(name) {
                Some(tag) if !value.is_empty() => {
                    // Repeated tags keep the last value
                    tags.insert(tag, value.to_string());
                }
                _ => {
                    let word = token.replace(':', "");
                    if !word.is_empty() {
                        words.push(word);
                    }
                }
            }
        }

        Self {
            free_text: words.join(" "),
            tags,
        }
    }

    /// Free-text remainder, tokens joined by single spaces
    pub fn free_text(&self) -> &str {
        &self.free_text
    }

    pub fn tags(&self) -> &BTreeMap<FilterTag, String> {
        &self.tags
    }

    pub fn tag(&self, tag: FilterTag) -> Option<&str> {
        self.tags.get(&tag).map(String::as_str)
    }

    /// True when the query accepts every node
    pub fn is_empty(&self) -> bool {
        self.free_text.is_empty() && self.tags.is_empty()
    }
}
