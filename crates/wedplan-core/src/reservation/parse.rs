//! Strict `yy-mm-dd` and `hh:mm` parsing for reservation slots.

use chrono::{NaiveDate, NaiveTime};

use crate::error::{CoreError, CoreResult};

pub const DATE_FORMAT_MESSAGE: &str = "reservation_date must be in yy-mm-dd format";
pub const DATE_CALENDAR_MESSAGE: &str = "reservation_date is not a valid calendar date";
pub const TIME_FORMAT_MESSAGE: &str = "reservation_time must be in hh:mm format";

/// Two ASCII digits at `at`, if both are digits.
fn two_digits(bytes: &[u8], at: usize) -> Option<u32> {
    let hi = *bytes.get(at)?;
    let lo = *bytes.get(at + 1)?;
    if hi.is_ascii_digit() && lo.is_ascii_digit() {
        Some(u32::from(hi - b'0') * 10 + u32::from(lo - b'0'))
    } else {
        None
    }
}

/// Parse `yy-mm-dd`; the year is `2000 + yy`.
///
/// A string of the wrong shape and a well-shaped string naming a day that
/// does not exist fail with different messages.
pub fn parse_reservation_date(raw: &str) -> CoreResult<NaiveDate> {
    let format_error = || CoreError::validation("reservation_date", DATE_FORMAT_MESSAGE);

    let bytes = raw.as_bytes();
    if bytes.len() != 8 || bytes[2] != b'-' || bytes[5] != b'-' {
        return Err(format_error());
    }
    let yy = two_digits(bytes, 0).ok_or_else(format_error)?;
    let mm = two_digits(bytes, 3).ok_or_else(format_error)?;
    let dd = two_digits(bytes, 6).ok_or_else(format_error)?;

    // yy < 100, so the cast is lossless.
    NaiveDate::from_ymd_opt(2000 + yy as i32, mm, dd)
        .ok_or_else(|| CoreError::validation("reservation_date", DATE_CALENDAR_MESSAGE))
}

/// Parse `hh:mm` with `hh < 24` and `mm < 60`.
pub fn parse_reservation_time(raw: &str) -> CoreResult<NaiveTime> {
    let format_error = || CoreError::validation("reservation_time", TIME_FORMAT_MESSAGE);

    let bytes = raw.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(format_error());
    }
    let hh = two_digits(bytes, 0).ok_or_else(format_error)?;
    let mm = two_digits(bytes, 3).ok_or_else(format_error)?;
    if hh >= 24 || mm >= 60 {
        return Err(format_error());
    }
    NaiveTime::from_hms_opt(hh, mm, 0).ok_or_else(format_error)
}
