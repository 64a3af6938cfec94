//! Utterance catalog: lengths and category labels, loaded from a pair of
//! positionally aligned text tables.

use std::fs;
use std::path::Path;

use crate::{AllocError, Result};

/// Immutable per-utterance metadata for one allocation run.
///
/// Indexed 0..N-1 in load order. The category table must list the same
/// utterances in the same order as the length table; this is a strict
/// positional check, not a join on ids.
#[derive(Debug, Clone)]
pub struct Catalog {
    ids: Vec<String>,
    lengths: Vec<u64>,
    categories: Vec<u32>,
    max_length: u64,
    distinct_categories: Vec<u32>,
}

impl Catalog {
    /// Load a catalog from `utt2len` and `utt2lang` files on disk.
    pub fn load(utt2len: &Path, utt2lang: &Path) -> Result<Self> {
        let lengths_raw =
            fs::read_to_string(utt2len).map_err(|e| AllocError::io(utt2len, e))?;
        let categories_raw =
            fs::read_to_string(utt2lang).map_err(|e| AllocError::io(utt2lang, e))?;
        Self::parse(&lengths_raw, &categories_raw)
    }

    /// Parse catalog tables from in-memory text.
    pub fn parse(utt2len: &str, utt2lang: &str) -> Result<Self> {
        let mut ids = Vec::new();
        let mut lengths = Vec::new();
        for line in utt2len.lines().filter(|l| !l.trim().is_empty()) {
            let (id, value) = split_record(line, "utt2len")?;
            let length: u64 = value.parse().map_err(|_| {
                AllocError::Format(format!("bad length in utt2len line '{}'", line))
            })?;
            if length < 1 {
                return Err(AllocError::Format(format!(
                    "utterance '{}' has zero length",
                    id
                )));
            }
            ids.push(id.to_string());
            lengths.push(length);
        }
        if ids.is_empty() {
            return Err(AllocError::Format("utt2len table is empty".into()));
        }

        let mut categories = Vec::new();
        for line in utt2lang.lines().filter(|l| !l.trim().is_empty()) {
            let (id, value) = split_record(line, "utt2lang")?;
            let position = categories.len();
            if position >= ids.len() {
                return Err(AllocError::Format(format!(
                    "utt2lang has more records than utt2len (extra line '{}')",
                    line
                )));
            }
            if ids[position] != id {
                return Err(AllocError::Format(format!(
                    "utt2lang utterance '{}' at position {} does not match utt2len utterance '{}'",
                    id, position, ids[position]
                )));
            }
            let category: u32 = value.parse().map_err(|_| {
                AllocError::Format(format!("bad category in utt2lang line '{}'", line))
            })?;
            categories.push(category);
        }
        if categories.len() != ids.len() {
            return Err(AllocError::Format(format!(
                "utt2lang has {} records but utt2len has {}",
                categories.len(),
                ids.len()
            )));
        }

        let max_length = lengths.iter().copied().max().unwrap_or(0);
        // First-appearance order keeps category selection deterministic.
        let mut distinct_categories = Vec::new();
        for &category in &categories {
            if !distinct_categories.contains(&category) {
                distinct_categories.push(category);
            }
        }

        Ok(Self {
            ids,
            lengths,
            categories,
            max_length,
            distinct_categories,
        })
    }

    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    pub fn length(&self, index: usize) -> u64 {
        self.lengths[index]
    }

    pub fn category(&self, index: usize) -> u32 {
        self.categories[index]
    }

    pub fn num_utterances(&self) -> usize {
        self.ids.len()
    }

    pub fn max_length(&self) -> u64 {
        self.max_length
    }

    pub fn distinct_categories(&self) -> &[u32] {
        &self.distinct_categories
    }

    /// Histogram width when no explicit override is supplied.
    pub fn derived_num_categories(&self) -> u32 {
        self.categories.iter().copied().max().unwrap_or(0) + 1
    }
}

fn split_record<'a>(line: &'a str, table: &str) -> Result<(&'a str, &'a str)> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(id), Some(value), None) => Ok((id, value)),
        _ => Err(AllocError::Format(format!(
            "bad line in {} table: '{}'",
            table, line
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::Catalog;
    use crate::AllocError;

    const UTT2LEN: &str = "utt_a 120\nutt_b 400\nutt_c 75\n";
    const UTT2LANG: &str = "utt_a 0\nutt_b 2\nutt_c 0\n";

    #[test]
    fn parses_aligned_tables() {
        let catalog = Catalog::parse(UTT2LEN, UTT2LANG).unwrap();
        assert_eq!(catalog.num_utterances(), 3);
        assert_eq!(catalog.id(1), "utt_b");
        assert_eq!(catalog.length(1), 400);
        assert_eq!(catalog.category(1), 2);
        assert_eq!(catalog.max_length(), 400);
        assert_eq!(catalog.distinct_categories(), &[0, 2]);
        assert_eq!(catalog.derived_num_categories(), 3);
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = Catalog::parse("utt_a 120 extra\n", "utt_a 0\n").unwrap_err();
        assert!(matches!(err, AllocError::Format(_)));
    }

    #[test]
    fn rejects_non_integer_length() {
        let err = Catalog::parse("utt_a twelve\n", "utt_a 0\n").unwrap_err();
        assert!(matches!(err, AllocError::Format(_)));
    }

    #[test]
    fn rejects_misaligned_utterance_id() {
        let bad_lang = "utt_a 0\nutt_x 2\nutt_c 0\n";
        let err = Catalog::parse(UTT2LEN, bad_lang).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, AllocError::Format(_)));
        assert!(message.contains("utt_x"));
    }

    #[test]
    fn rejects_short_category_table() {
        let err = Catalog::parse(UTT2LEN, "utt_a 0\n").unwrap_err();
        assert!(matches!(err, AllocError::Format(_)));
    }

    #[test]
    fn rejects_long_category_table() {
        let err = Catalog::parse("utt_a 120\n", UTT2LANG).unwrap_err();
        assert!(matches!(err, AllocError::Format(_)));
    }

    #[test]
    fn rejects_empty_tables() {
        let err = Catalog::parse("", "").unwrap_err();
        assert!(matches!(err, AllocError::Format(_)));
    }

    #[test]
    fn rejects_zero_length_utterance() {
        let err = Catalog::parse("utt_a 0\n", "utt_a 0\n").unwrap_err();
        assert!(matches!(err, AllocError::Format(_)));
    }
}
