//! Helpers for neutralization records.
//!
//! Record descriptions have the form `subtype|antibody|ic50[,ic50...]`, with
//! IC50 values optionally prefixed by `<` or `>` for censored measurements.
//! Record IDs carry at least four `|`-separated fields; an empty last field
//! marks a sample held out as test data.
//!
//! [`RecordFilter`] holds the reference-sequence IDs and the IC50 cap, and can
//! build a [`ClassExtractor`] over [`SeqRecord`]s directly.

use std::collections::HashSet;
use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::class::{ClassExtractor, Measurement};
use crate::error::{Error, Result};
use crate::utils::mean;

/// Default upper bound applied to every parsed IC50 value.
pub const DEFAULT_IC50_CAP: f64 = 25.0;

/// An identified sequence record with its free-text description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqRecord {
    pub id: String,
    pub description: String,
}

impl SeqRecord {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// Split `s` on the last `n - 1` occurrences of `|`, left to right.
fn rsplit_fields(s: &str, n: usize) -> Vec<&str> {
    let mut parts: Vec<&str> = s.rsplitn(n, '|').collect();
    parts.reverse();
    parts
}

/// Subtype field of a description, upper-cased.
pub fn parse_subtype(description: &str) -> String {
    rsplit_fields(description, 3)[0].to_uppercase()
}

/// Replace the IC50 field of a description, padding missing fields.
pub fn set_ic50(description: &str, ic50: f64) -> String {
    let mut fields: Vec<String> = rsplit_fields(description, 3)
        .into_iter()
        .map(str::to_owned)
        .collect();
    fields.resize(3, String::new());
    fields[2] = ic50.to_string();
    fields.join("|")
}

/// Which records are reference sequences, and how IC50 values are capped.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    /// IDs of reference sequences, compared after trimming whitespace.
    #[builder(default)]
    pub refseq_ids: HashSet<String>,

    /// Cap applied to every parsed IC50. Default: 25.0.
    #[builder(default = DEFAULT_IC50_CAP)]
    pub ic50_cap: f64,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RecordFilter {
    pub fn is_refseq(&self, id: &str) -> bool {
        self.refseq_ids.contains(id.trim())
    }

    /// Whether `id` marks held-out test data.
    ///
    /// Reference sequences are never test data. Other IDs must have at least
    /// four `|`-separated fields.
    pub fn is_testdata(&self, id: &str) -> Result<bool> {
        if self.is_refseq(id) {
            return Ok(false);
        }
        let fields = rsplit_fields(id, 4);
        if fields.len() < 4 {
            return Err(Error::MalformedId { id: id.to_owned() });
        }
        Ok(fields[3].is_empty())
    }

    /// IC50 values from a description, each capped at `ic50_cap`.
    pub fn parse_ic50s(&self, description: &str) -> Result<Vec<f64>> {
        let malformed = || Error::MalformedIc50 {
            description: description.to_owned(),
        };

        let fields = rsplit_fields(description, 3);
        let field = fields.get(2).ok_or_else(malformed)?;
        field
            .split(',')
            .map(|raw| {
                raw.trim()
                    .trim_start_matches(['<', '>'])
                    .parse::<f64>()
                    .map(|v| v.min(self.ic50_cap))
                    .map_err(|_| malformed())
            })
            .collect()
    }

    /// Mean of the capped IC50 values.
    pub fn noise(&self, description: &str) -> Result<f64> {
        let values = self.parse_ic50s(description)?;
        mean(&values).ok_or_else(|| Error::MalformedIc50 {
            description: description.to_owned(),
        })
    }

    /// A class extractor reading IC50 replicates from record descriptions and
    /// skipping reference sequences and test data.
    ///
    /// IDs too short to tell whether they are test data are kept, with a
    /// warning.
    pub fn class_extractor(self) -> ClassExtractor<SeqRecord> {
        let filter = Arc::new(self);
        let skip_filter = Arc::clone(&filter);

        ClassExtractor::new(move |record: &SeqRecord| {
            filter
                .parse_ic50s(&record.description)
                .map(Measurement::Replicates)
        })
        .with_skip(move |record: &SeqRecord| {
            if skip_filter.is_refseq(&record.id) {
                return true;
            }
            match skip_filter.is_testdata(&record.id) {
                Ok(testdata) => testdata,
                Err(err) => {
                    log::warn!("{err}, keeping record");
                    false
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> RecordFilter {
        RecordFilter::builder()
            .refseq_ids(HashSet::from(["HXB2".to_string()]))
            .build()
    }

    #[test]
    fn refseq_ignores_surrounding_whitespace() {
        assert!(filter().is_refseq(" HXB2\t"));
        assert!(!filter().is_refseq("HXB3"));
    }

    #[test]
    fn testdata_uses_last_field() {
        let f = filter();
        assert!(f.is_testdata("a|b|c|").unwrap());
        assert!(!f.is_testdata("a|b|c|d").unwrap());
        assert!(f.is_testdata("x|a|b|c|").unwrap());
        assert!(!f.is_testdata("HXB2").unwrap());
        assert!(matches!(
            f.is_testdata("a|b|c"),
            Err(Error::MalformedId { .. })
        ));
    }

    #[test]
    fn ic50s_are_stripped_and_capped() {
        let values = filter().parse_ic50s("B|VRC01| <0.5 , >50,3").unwrap();
        assert_eq!(values, vec![0.5, 25.0, 3.0]);
    }

    #[test]
    fn ic50_field_may_contain_extra_pipes_on_the_left() {
        let values = filter().parse_ic50s("x|B|VRC01|1.5").unwrap();
        assert_eq!(values, vec![1.5]);
    }

    #[test]
    fn unparseable_ic50_is_an_error() {
        assert!(matches!(
            filter().parse_ic50s("B|VRC01|n/a"),
            Err(Error::MalformedIc50 { .. })
        ));
        assert!(matches!(
            filter().parse_ic50s("B|VRC01"),
            Err(Error::MalformedIc50 { .. })
        ));
    }

    #[test]
    fn noise_is_mean() {
        assert_eq!(filter().noise("B|ab|1,3").unwrap(), 2.0);
    }

    #[test]
    fn subtype_is_upper_cased() {
        assert_eq!(parse_subtype("c|VRC01|1.0"), "C");
        assert_eq!(parse_subtype("ac|x|y|VRC01|1.0"), "AC|X|Y");
    }

    #[test]
    fn set_ic50_pads_missing_fields() {
        assert_eq!(set_ic50("B|VRC01|1,2", 3.5), "B|VRC01|3.5");
        assert_eq!(set_ic50("B", 2.0), "B||2");
    }
}
