//! Core data types for population series
//!
//! This module defines the fundamental types shared by the poller and the chart:
//! - `AnimalCount`: One yearly observation of herbivore and carnivore totals
//! - `ResultPayload`: The `{ "res": [...] }` document the simulation publishes
//! - `Series`: An ordered, immutable collection of observations
//! - `SeriesSummary`: Headline statistics for display

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::error::{SeriesError, SeriesResult};

/// A single yearly population observation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AnimalCount {
    /// Simulation year
    pub year: u32,
    /// Number of herbivores alive at the end of the year
    pub num_herbs: u32,
    /// Number of carnivores alive at the end of the year
    pub num_carns: u32,
}

impl AnimalCount {
    /// Create a new observation
    pub fn new(year: u32, num_herbs: u32, num_carns: u32) -> Self {
        Self {
            year,
            num_herbs,
            num_carns,
        }
    }
}

/// Wire format of the result file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultPayload {
    pub res: Vec<AnimalCount>,
}

/// An ordered collection of observations, as decoded
///
/// Order is preserved exactly as received. Use [`Series::check_order`] to
/// verify that years are strictly ascending before charting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    samples: Vec<AnimalCount>,
}

impl Series {
    /// Create a series from samples in the given order
    pub fn new(samples: Vec<AnimalCount>) -> Self {
        Self { samples }
    }

    /// An empty series
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[AnimalCount] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The last sample in series order
    pub fn latest(&self) -> Option<&AnimalCount> {
        self.samples.last()
    }

    /// Years in series order
    pub fn years(&self) -> Vec<u32> {
        self.samples.iter().map(|s| s.year).collect()
    }

    /// Verify that years are unique and ascending
    pub fn check_order(&self) -> SeriesResult<()> {
        let mut seen = HashSet::with_capacity(self.samples.len());
        for sample in &self.samples {
            if !seen.insert(sample.year) {
                return Err(SeriesError::DuplicateYear(sample.year));
            }
        }

        for pair in self.samples.windows(2) {
            if pair[1].year < pair[0].year {
                return Err(SeriesError::OutOfOrder {
                    previous: pair[0].year,
                    next: pair[1].year,
                });
            }
        }

        Ok(())
    }

    /// Merge another series into this one by year
    ///
    /// Samples from `newer` replace samples with the same year. The result is
    /// sorted by year.
    pub fn merged_with(&self, newer: &Series) -> Series {
        let mut by_year: BTreeMap<u32, AnimalCount> =
            self.samples.iter().map(|s| (s.year, *s)).collect();
        for sample in &newer.samples {
            by_year.insert(sample.year, *sample);
        }
        Series::new(by_year.into_values().collect())
    }

    /// Compute headline statistics
    pub fn summary(&self) -> SeriesSummary {
        let peak_herbivores = self
            .samples
            .iter()
            .max_by_key(|s| s.num_herbs)
            .map(|s| Peak {
                year: s.year,
                count: s.num_herbs,
            });
        let peak_carnivores = self
            .samples
            .iter()
            .max_by_key(|s| s.num_carns)
            .map(|s| Peak {
                year: s.year,
                count: s.num_carns,
            });

        SeriesSummary {
            samples: self.samples.len(),
            first_year: self.samples.first().map(|s| s.year),
            last_year: self.samples.last().map(|s| s.year),
            latest: self.samples.last().copied(),
            peak_herbivores,
            peak_carnivores,
        }
    }
}

impl From<ResultPayload> for Series {
    fn from(payload: ResultPayload) -> Self {
        Series::new(payload.res)
    }
}

impl From<Vec<AnimalCount>> for Series {
    fn from(samples: Vec<AnimalCount>) -> Self {
        Series::new(samples)
    }
}

/// Highest count seen and the year it occurred
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Peak {
    pub year: u32,
    pub count: u32,
}

/// Headline statistics for a series
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeriesSummary {
    pub samples: usize,
    pub first_year: Option<u32>,
    pub last_year: Option<u32>,
    pub latest: Option<AnimalCount>,
    pub peak_herbivores: Option<Peak>,
    pub peak_carnivores: Option<Peak>,
}

impl std::fmt::Display for SeriesSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.first_year, self.last_year, self.latest) {
            (Some(first), Some(last), Some(latest)) => write!(
                f,
                "{} samples, years {}-{}, latest herbivores={} carnivores={}",
                self.samples, first, last, latest.num_herbs, latest.num_carns
            ),
            _ => write!(f, "no samples"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> Series {
        Series::new(vec![
            AnimalCount::new(0, 10, 0),
            AnimalCount::new(10, 140, 2),
            AnimalCount::new(20, 95, 9),
        ])
    }

    #[test]
    fn test_check_order_accepts_ascending() {
        assert!(sample_series().check_order().is_ok());
        assert!(Series::empty().check_order().is_ok());
    }

    #[test]
    fn test_check_order_rejects_duplicates() {
        let series = Series::new(vec![AnimalCount::new(5, 1, 1), AnimalCount::new(5, 2, 2)]);
        assert_eq!(series.check_order(), Err(SeriesError::DuplicateYear(5)));
    }

    #[test]
    fn test_check_order_rejects_descending() {
        let series = Series::new(vec![AnimalCount::new(7, 1, 1), AnimalCount::new(3, 2, 2)]);
        assert_eq!(
            series.check_order(),
            Err(SeriesError::OutOfOrder {
                previous: 7,
                next: 3
            })
        );
    }

    #[test]
    fn test_merge_prefers_newer_and_sorts() {
        let older = Series::new(vec![AnimalCount::new(0, 10, 0), AnimalCount::new(10, 20, 1)]);
        let newer = Series::new(vec![AnimalCount::new(20, 30, 4), AnimalCount::new(10, 25, 2)]);

        let merged = older.merged_with(&newer);
        assert_eq!(merged.years(), vec![0, 10, 20]);
        assert_eq!(merged.samples()[1], AnimalCount::new(10, 25, 2));
    }

    #[test]
    fn test_summary() {
        let summary = sample_series().summary();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.first_year, Some(0));
        assert_eq!(summary.last_year, Some(20));
        assert_eq!(summary.peak_herbivores, Some(Peak { year: 10, count: 140 }));
        assert_eq!(summary.peak_carnivores, Some(Peak { year: 20, count: 9 }));
        assert_eq!(
            summary.to_string(),
            "3 samples, years 0-20, latest herbivores=95 carnivores=9"
        );
    }

    #[test]
    fn test_summary_empty() {
        let summary = Series::empty().summary();
        assert_eq!(summary.samples, 0);
        assert!(summary.latest.is_none());
        assert_eq!(summary.to_string(), "no samples");
    }
}
