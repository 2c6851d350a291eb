use jiff::civil::Date;
use jiff::{Span, ToSpan};

use crate::error::Error;

/// The size of a calendar period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// An inclusive range of civil dates. Always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Signed calendar offsets, applied by [`shift_date`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateShift {
    pub days: i64,
    pub weeks: i64,
    pub months: i64,
    pub years: i64,
}

impl DateShift {
    pub fn months(months: i64) -> Self {
        DateShift {
            months,
            ..Default::default()
        }
    }

    pub fn days(days: i64) -> Self {
        DateShift {
            days,
            ..Default::default()
        }
    }
}

/// Returns the first date of the period containing `date`.
///
/// Weeks start on Monday, quarters on the first day of their 3-month block.
pub fn interval_start(date: Date, granularity: Granularity) -> Result<Date, Error> {
    let start = match granularity {
        Granularity::Day => date,
        Granularity::Week => {
            let offset = i64::from(date.weekday().to_monday_one_offset()) - 1;
            date.checked_sub(offset.days())?
        }
        Granularity::Month => date.first_of_month(),
        Granularity::Quarter => {
            let quarter_month = (date.month() - 1) / 3 * 3 + 1;
            Date::new(date.year(), quarter_month, 1)?
        }
        Granularity::Year => date.first_of_year(),
    };

    Ok(start)
}

/// Returns the last date of the period containing `date`.
///
/// A date that already sits on the period's last day comes back unchanged, it never rolls
/// over into the next period.
pub fn interval_end(date: Date, granularity: Granularity) -> Result<Date, Error> {
    let end = match granularity {
        Granularity::Day => date,
        Granularity::Week => {
            let remaining = 7 - i64::from(date.weekday().to_monday_one_offset());
            date.checked_add(remaining.days())?
        }
        Granularity::Month => date.last_of_month(),
        Granularity::Quarter => {
            let quarter_start = interval_start(date, Granularity::Quarter)?;
            quarter_start.checked_add(2.months())?.last_of_month()
        }
        Granularity::Year => date.last_of_year(),
    };

    Ok(end)
}

/// Both ends of the period containing `date`.
pub fn interval(date: Date, granularity: Granularity) -> Result<DateRange, Error> {
    DateRange::new(
        interval_start(date, granularity)?,
        interval_end(date, granularity)?,
    )
}

/// Calendar-aware shift.
///
/// Years and months go first and clamp the day to the length of the target month
/// (2024-01-31 plus one month is 2024-02-29), then weeks and days are added.
pub fn shift_date(date: Date, shift: DateShift) -> Result<Date, Error> {
    let calendar_part = Span::new()
        .try_years(shift.years)?
        .try_months(shift.months)?;
    let day_part = Span::new().try_weeks(shift.weeks)?.try_days(shift.days)?;

    let shifted = date.checked_add(calendar_part)?.checked_add(day_part)?;

    Ok(shifted)
}

/// Splits `[start, end]` into consecutive buckets of `months_per_bucket` months.
///
/// The iterator is lazy and can be cloned to walk the buckets again. The last bucket is
/// clipped to `end`.
pub fn split_into_buckets(
    start: Date,
    end: Date,
    months_per_bucket: u32,
) -> Result<MonthBuckets, Error> {
    if months_per_bucket == 0 {
        return Err(Error::InvalidBucketSize);
    }

    let range = DateRange::new(start, end)?;
    let step = Span::new().try_months(i64::from(months_per_bucket))?;

    Ok(MonthBuckets {
        next_start: Some(range.start),
        end: range.end,
        step,
    })
}

#[derive(Debug, Clone)]
pub struct MonthBuckets {
    next_start: Option<Date>,
    end: Date,
    step: Span,
}

impl Iterator for MonthBuckets {
    type Item = DateRange;

    fn next(&mut self) -> Option<DateRange> {
        let start = self.next_start.take()?;

        if start > self.end {
            return None;
        }

        // Running off the calendar just means this is the last bucket.
        let bucket_end = start
            .checked_add(self.step)
            .and_then(|date| date.yesterday())
            .map(|date| date.min(self.end))
            .unwrap_or(self.end);

        self.next_start = bucket_end.tomorrow().ok();

        Some(DateRange {
            start,
            end: bucket_end,
        })
    }
}

/// The month bucket as it appears inside object names, for example `20230301-20230331`.
pub fn month_bucket_tag(date: Date) -> Result<String, Error> {
    let month = interval(date, Granularity::Month)?;

    Ok(format!(
        "{}-{}",
        month.start.strftime("%Y%m%d"),
        month.end.strftime("%Y%m%d")
    ))
}

/// Full English month name, for example `March`.
pub fn month_name(date: Date) -> String {
    date.strftime("%B").to_string()
}

/// Parses the `Date` cell of a usage export.
///
/// Exports write `M/D/YYYY`, re-saved files tend to carry ISO dates, sometimes with a time
/// attached. A trailing time is ignored either way.
pub fn parse_report_date(raw: &str) -> Result<Date, Error> {
    let invalid = || Error::InvalidDate(raw.to_owned());

    let date_part = raw
        .trim()
        .split(['T', ' '])
        .next()
        .filter(|part| !part.is_empty())
        .ok_or_else(invalid)?;

    if date_part.contains('/') {
        let mut parts = date_part.split('/');
        let (Some(month), Some(day), Some(year), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let month = month.parse::<i8>().map_err(|_| invalid())?;
        let day = day.parse::<i8>().map_err(|_| invalid())?;
        let year = year.parse::<i16>().map_err(|_| invalid())?;

        return Date::new(year, month, day).map_err(|_| invalid());
    }

    date_part.parse::<Date>().map_err(|_| invalid())
}
