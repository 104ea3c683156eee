use crate::csv_io::CsvSink;
use crate::date::{half_year_index, HalfYear};
use anyhow::Result;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Counts per half-year (rows) and series (columns). Every period of the
/// index is present even when all its counts are zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrendTable {
    pub periods: Vec<HalfYear>,
    pub series: Vec<String>,
    pub counts: Vec<Vec<u64>>, // [period][series]
}

impl TrendTable {
    pub fn new(first_year: i32, last_year: i32, series: Vec<String>) -> Self {
        let periods = half_year_index(first_year, last_year);
        let counts = vec![vec![0; series.len()]; periods.len()];
        Self { periods, series, counts }
    }

    /// Count one observation. Missing dates, periods outside the index and
    /// unknown series are ignored; returns whether it was counted.
    pub fn add(&mut self, when: Option<OffsetDateTime>, series: &str) -> bool {
        let Some(dt) = when else { return false };
        let hy = HalfYear::from_date(dt.date());
        let (Some(row), Some(col)) =
            (self.periods.iter().position(|p| *p == hy), self.series.iter().position(|s| s == series))
        else {
            return false;
        };
        self.counts[row][col] += 1;
        true
    }

    pub fn get(&self, period: HalfYear, series: &str) -> u64 {
        match (self.periods.iter().position(|p| *p == period), self.series.iter().position(|s| s == series)) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// `BiAnnual,<series...>` with one row per period.
    pub fn write_csv(&self, dest: &Path) -> Result<PathBuf> {
        let mut sink = CsvSink::create(dest)?;
        let mut header = vec!["BiAnnual".to_string()];
        header.extend(self.series.iter().cloned());
        sink.write_record(&header)?;
        for (p, row) in self.periods.iter().zip(&self.counts) {
            let mut rec = vec![p.to_string()];
            rec.extend(row.iter().map(u64::to_string));
            sink.write_record(&rec)?;
        }
        sink.finish()
    }
}

/// Build a trend table from `(timestamp, series)` observations.
pub fn trend_table<'a, I>(observations: I, series: &[String], first_year: i32, last_year: i32) -> TrendTable
where
    I: IntoIterator<Item = (Option<OffsetDateTime>, &'a str)>,
{
    let mut t = TrendTable::new(first_year, last_year, series.to_vec());
    for (when, s) in observations {
        t.add(when, s);
    }
    t
}
