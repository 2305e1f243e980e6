//! Monthly grouping of daily sales.

use super::error::InvalidPeriod;
use crate::models::DailySaleEntry;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::fmt;
use std::ops::Add;

/// A calendar month. Only constructible for months chrono can represent,
/// including the first day of the following month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, InvalidPeriod> {
        let period = Self { year, month };
        period.bounds()?;
        Ok(period)
    }

    /// Parse the `YYYY-MM` form used by the month picker.
    pub fn parse(s: &str) -> Result<Self, InvalidPeriod> {
        let invalid = || InvalidPeriod(format!("'{}' is not a YYYY-MM month", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Half-open window `[first day of month, first day of next month)`.
    pub fn bounds(&self) -> Result<(NaiveDate, NaiveDate), InvalidPeriod> {
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| InvalidPeriod(format!("{}-{:02} is not a calendar month", self.year, self.month)))?;
        let (next_year, next_month) = if self.month == 12 {
            let year = self.year.checked_add(1).ok_or_else(|| {
                InvalidPeriod(format!("{}-{:02} has no following month", self.year, self.month))
            })?;
            (year, 1)
        } else {
            (self.year, self.month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(|| {
            InvalidPeriod(format!("{}-{:02} has no following month", self.year, self.month))
        })?;
        Ok((start, end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Buying and selling value totals. Exact decimal sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Subtotal {
    pub bpx: Decimal,
    pub spx: Decimal,
}

impl Subtotal {
    pub fn margin(&self) -> Decimal {
        self.spx.saturating_sub(self.bpx)
    }
}

impl Add for Subtotal {
    type Output = Subtotal;

    fn add(self, rhs: Self) -> Self::Output {
        Subtotal {
            bpx: self.bpx.saturating_add(rhs.bpx),
            spx: self.spx.saturating_add(rhs.spx),
        }
    }
}

impl<'a> From<&'a DailySaleEntry> for Subtotal {
    fn from(entry: &'a DailySaleEntry) -> Self {
        Subtotal {
            bpx: entry.bpx,
            spx: entry.spx,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub entries: Vec<DailySaleEntry>,
    pub subtotal: Subtotal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyReport {
    pub period: YearMonth,
    pub groups: Vec<DayGroup>,
    pub grand_total: Subtotal,
}

impl MonthlyReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Entries in report order.
    pub fn entries(&self) -> impl Iterator<Item = &DailySaleEntry> {
        self.groups.iter().flat_map(|g| g.entries.iter())
    }
}

/// Group the entries of `period` by calendar day.
///
/// Entries outside the month are dropped. The rest are ordered by date, then
/// by creation time; entries created at the same instant keep their input
/// order. The grand total is accumulated from the day subtotals so the two
/// always agree.
pub fn aggregate_month(
    entries: &[DailySaleEntry],
    period: YearMonth,
) -> Result<MonthlyReport, InvalidPeriod> {
    let (start, end) = period.bounds()?;

    let mut in_month: Vec<&DailySaleEntry> = entries
        .iter()
        .filter(|e| e.date >= start && e.date < end)
        .collect();
    in_month.sort_by_key(|e| (e.date, e.created_utc));

    let mut groups: Vec<DayGroup> = Vec::new();
    for entry in in_month {
        match groups.last_mut() {
            Some(group) if group.date == entry.date => {
                group.subtotal = group.subtotal + Subtotal::from(entry);
                group.entries.push(entry.clone());
            }
            _ => groups.push(DayGroup {
                date: entry.date,
                entries: vec![entry.clone()],
                subtotal: Subtotal::from(entry),
            }),
        }
    }

    let grand_total = groups
        .iter()
        .fold(Subtotal::default(), |acc, g| acc + g.subtotal);

    Ok(MonthlyReport {
        period,
        groups,
        grand_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn entry(date: (i32, u32, u32), spx: i64, seq: i64) -> DailySaleEntry {
        DailySaleEntry {
            entry_id: Uuid::new_v4(),
            ledger: "gifts".to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            item: format!("item-{}", seq),
            code: None,
            quantity: 1,
            unit: "Pc".to_string(),
            bpx: Decimal::new(spx * 7, 1),
            spx: Decimal::from(spx),
            created_utc: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::seconds(seq),
        }
    }

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    #[test]
    fn march_scenario_subtotals_and_grand_total() {
        let entries = vec![
            entry((2024, 3, 5), 1000, 1),
            entry((2024, 3, 5), 2000, 2),
            entry((2024, 3, 6), 500, 3),
        ];
        let report = aggregate_month(&entries, march()).unwrap();

        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].subtotal.spx, Decimal::from(3000));
        assert_eq!(report.groups[1].subtotal.spx, Decimal::from(500));
        assert_eq!(report.grand_total.spx, Decimal::from(3500));
        assert_eq!(report.grand_total.bpx, Decimal::from(2450));
        assert_eq!(report.grand_total.margin(), Decimal::from(1050));
    }

    #[test]
    fn first_day_of_month_is_in_and_first_day_of_next_is_out() {
        let entries = vec![entry((2024, 3, 1), 10, 1), entry((2024, 4, 1), 20, 2)];
        let report = aggregate_month(&entries, march()).unwrap();

        let dates: Vec<_> = report.groups.iter().map(|g| g.date).collect();
        assert_eq!(dates, vec![NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()]);

        let april = aggregate_month(&entries, YearMonth::new(2024, 4).unwrap()).unwrap();
        assert_eq!(april.grand_total.spx, Decimal::from(20));
    }

    #[test]
    fn same_day_entries_keep_creation_order() {
        let entries = vec![
            entry((2024, 3, 9), 3, 30),
            entry((2024, 3, 2), 1, 10),
            entry((2024, 3, 9), 2, 20),
        ];
        let report = aggregate_month(&entries, march()).unwrap();
        let items: Vec<_> = report.entries().map(|e| e.item.as_str()).collect();
        assert_eq!(items, vec!["item-10", "item-20", "item-30"]);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let mut a = entry((2024, 3, 9), 3, 5);
        let mut b = entry((2024, 3, 9), 4, 5);
        a.item = "first".to_string();
        b.item = "second".to_string();
        let report = aggregate_month(&[a, b], march()).unwrap();
        let items: Vec<_> = report.entries().map(|e| e.item.as_str()).collect();
        assert_eq!(items, vec!["first", "second"]);
    }

    #[test]
    fn empty_month_is_an_empty_report() {
        let report = aggregate_month(&[], march()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.grand_total, Subtotal::default());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (start, end) = YearMonth::new(2023, 12).unwrap().bounds().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn out_of_range_months_are_invalid_periods() {
        assert!(YearMonth::new(2024, 0).is_err());
        assert!(YearMonth::new(2024, 13).is_err());
        assert!(YearMonth::new(i32::MAX, 12).is_err());
        assert!(YearMonth::parse("2024-3x").is_err());
        assert!(YearMonth::parse("March").is_err());
    }

    #[test]
    fn parses_month_picker_format() {
        let period = YearMonth::parse("2024-03").unwrap();
        assert_eq!(period, march());
        assert_eq!(period.to_string(), "2024-03");
    }

    proptest! {
        #[test]
        fn grand_total_equals_sum_of_day_subtotals(
            rows in prop::collection::vec((1u32..=31, 0i64..1_000_000, 0i64..1_000_000), 0..60)
        ) {
            let entries: Vec<DailySaleEntry> = rows
                .iter()
                .enumerate()
                .filter_map(|(i, (day, bpx, spx))| {
                    let date = NaiveDate::from_ymd_opt(2024, 3, *day)?;
                    let mut e = entry((2024, 3, 1), 0, i as i64);
                    e.date = date;
                    e.bpx = Decimal::new(*bpx, 2);
                    e.spx = Decimal::new(*spx, 2);
                    Some(e)
                })
                .collect();

            let report = aggregate_month(&entries, march()).unwrap();

            let bpx: Decimal = report.groups.iter().map(|g| g.subtotal.bpx).sum();
            let spx: Decimal = report.groups.iter().map(|g| g.subtotal.spx).sum();
            prop_assert_eq!(report.grand_total.bpx, bpx);
            prop_assert_eq!(report.grand_total.spx, spx);

            let direct: Decimal = entries.iter().map(|e| e.spx).sum();
            prop_assert_eq!(report.grand_total.spx, direct);
            prop_assert_eq!(report.entries().count(), entries.len());
        }
    }
}
