use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Half-year period labeled "YYYY-H1" (Jan..Jun) or "YYYY-H2" (Jul..Dec).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HalfYear {
    pub year: i32,
    pub half: u8, // 1..=2
}

impl HalfYear {
    /// `None` unless `half` is 1 or 2.
    pub fn new(year: i32, half: u8) -> Option<Self> {
        (1..=2).contains(&half).then_some(Self { year, half })
    }
    pub fn first(year: i32) -> Self {
        Self { year, half: 1 }
    }
    pub fn second(year: i32) -> Self {
        Self { year, half: 2 }
    }
    pub fn from_date(date: Date) -> Self {
        let month = date.month() as u8;
        Self { year: date.year(), half: if month <= 6 { 1 } else { 2 } }
    }
    pub fn next(self) -> Self {
        if self.half == 1 {
            Self { year: self.year, half: 2 }
        } else {
            Self { year: self.year + 1, half: 1 }
        }
    }
}

impl fmt::Display for HalfYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-H{}", self.year, self.half)
    }
}

impl FromStr for HalfYear {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, h) = s.split_once("-H").ok_or("expected YYYY-H1 or YYYY-H2")?;
        let year: i32 = y.parse().map_err(|_| "invalid year")?;
        let half: u8 = h.parse().map_err(|_| "invalid half")?;
        Self::new(year, half).ok_or_else(|| "half must be H1 or H2".to_string())
    }
}

/// Inclusive iteration from `start` to `end` (if `start` <= `end`), else empty.
pub fn iter_half_years(start: HalfYear, end: HalfYear) -> impl Iterator<Item = HalfYear> {
    let mut curr = if start <= end { Some(start) } else { None };
    std::iter::from_fn(move || {
        let ret = curr?;
        curr = Some(ret.next()).filter(|n| *n <= end);
        Some(ret)
    })
}

/// Complete period index for `first_year`-H1 ..= `last_year`-H2.
pub fn half_year_index(first_year: i32, last_year: i32) -> Vec<HalfYear> {
    iter_half_years(HalfYear::first(first_year), HalfYear::second(last_year)).collect()
}

/// Parse the timestamp shapes produced by the collectors:
/// RFC3339, "YYYY-MM-DD HH:MM:SSZ" (Stack Exchange title attribute),
/// "YYYY-MM-DDTHH:MM:SS", "YYYY-MM-DD HH:MM:SS UTC" (Reddit), bare dates
/// and unix epoch seconds. Offsetless values are taken as UTC.
/// Anything else coerces to `None`.
pub fn parse_post_time(raw: &str) -> Option<OffsetDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }
    if let Ok(secs) = s.parse::<i64>() {
        return OffsetDateTime::from_unix_timestamp(secs).ok();
    }

    let s = s.strip_suffix(" UTC").or_else(|| s.strip_suffix('Z')).unwrap_or(s).trim();
    let with_space = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let with_t = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let with_t_frac = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    for fd in [with_space, with_t, with_t_frac] {
        if let Ok(pdt) = PrimitiveDateTime::parse(s, fd) {
            return Some(pdt.assume_utc());
        }
    }
    let date_only = format_description!("[year]-[month]-[day]");
    let head = s.get(..10).unwrap_or(s);
    Date::parse(head, date_only).ok().map(|d| d.midnight().assume_utc())
}

/// Render a timestamp the way all CSV outputs carry it.
pub fn format_post_time(dt: OffsetDateTime) -> String {
    let fd = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    dt.format(fd).unwrap_or_default()
}
