use std::str::FromStr;

use jiff::Zoned;
use jiff::civil::Date;

use super::interval::{DateRange, DateShift, Granularity, interval, shift_date};
use crate::error::Error;

/// The reporting windows a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    /// From the start of the current month to its end.
    MonthToDate,
    /// The whole month before the current one.
    PreviousMonth,
    /// Explicit dates, the end defaults to today.
    Custom,
    /// The whole month containing the start date.
    CustomMonth,
}

impl RequestType {
    /// The short symbolic name, as used in bindings and logs.
    pub fn symbol(&self) -> &'static str {
        match self {
            RequestType::MonthToDate => "MTD",
            RequestType::PreviousMonth => "PM",
            RequestType::Custom => "Custom",
            RequestType::CustomMonth => "CustomMonth",
        }
    }
}

impl FromStr for RequestType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");

        match normalized.as_str() {
            "mtd" | "monthtodate" => Ok(RequestType::MonthToDate),
            "pm" | "previousmonth" => Ok(RequestType::PreviousMonth),
            "custom" => Ok(RequestType::Custom),
            "custommonth" => Ok(RequestType::CustomMonth),
            _ => Err(Error::InvalidRequestType(s.to_owned())),
        }
    }
}

/// Turns a symbolic request into concrete dates, relative to `today`.
pub fn resolve_request_range(
    request: RequestType,
    start: Option<Date>,
    end: Option<Date>,
    today: Date,
) -> Result<DateRange, Error> {
    match request {
        RequestType::MonthToDate => {
            let current = interval(today, Granularity::Month)?;

            // On the 1st the current month has nothing in it yet, report the previous one.
            if today == current.start() {
                let previous_month = shift_date(current.start(), DateShift::months(-1))?;

                return interval(previous_month, Granularity::Month);
            }

            Ok(current)
        }

        RequestType::PreviousMonth => {
            let previous_month = shift_date(today, DateShift::months(-1))?;

            interval(previous_month, Granularity::Month)
        }

        RequestType::Custom => {
            let start = start.ok_or_else(|| Error::MissingStartDate(request.symbol().to_owned()))?;

            DateRange::new(start, end.unwrap_or(today))
        }

        RequestType::CustomMonth => {
            let start = start.ok_or_else(|| Error::MissingStartDate(request.symbol().to_owned()))?;

            interval(start, Granularity::Month)
        }
    }
}

/// Same as [`resolve_request_range`], against the local clock.
pub fn resolve_request_range_now(
    request: RequestType,
    start: Option<Date>,
    end: Option<Date>,
) -> Result<DateRange, Error> {
    resolve_request_range(request, start, end, Zoned::now().date())
}
