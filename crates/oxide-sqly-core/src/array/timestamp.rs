//! Timestamp text in the form exchanged with PostgreSQL.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike};

use super::ArrayError;

/// Formats `t` as `YYYY-MM-DD HH:MM:SS[.fraction]` followed by its offset.
///
/// The offset is `Z` for UTC, otherwise `+HH:MM` with `:SS` appended when the
/// offset has a seconds part. Years before 1 are printed as `1 - year` with a
/// ` BC` suffix, so year 0 is `0001 ... BC`.
#[must_use]
pub fn format_timestamp(t: &DateTime<FixedOffset>) -> String {
    let local = t.naive_local();
    let (year, bc) = if local.year() <= 0 {
        (1 - local.year(), true)
    } else {
        (local.year(), false)
    };

    let mut out = format!(
        "{year:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        local.month(),
        local.day(),
        local.hour(),
        local.minute(),
        local.second()
    );

    let nanos = local.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }

    let offset = t.offset().local_minus_utc();
    if offset == 0 {
        out.push('Z');
    } else {
        let sign = if offset < 0 { '-' } else { '+' };
        let abs = offset.unsigned_abs();
        out.push_str(&format!("{sign}{:02}:{:02}", abs / 3600, abs % 3600 / 60));
        if abs % 60 != 0 {
            out.push_str(&format!(":{:02}", abs % 60));
        }
    }

    if bc {
        out.push_str(" BC");
    }
    out
}

/// Parses the text produced by [`format_timestamp`].
///
/// A missing offset is read as UTC.
///
/// # Errors
///
/// Returns `ArrayError::Timestamp` if the text is not a valid timestamp.
pub fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, ArrayError> {
    let invalid = || ArrayError::Timestamp(s.to_string());

    let (body, bc) = s.strip_suffix(" BC").map_or((s, false), |body| (body, true));
    let (date, rest) = body.split_once(' ').ok_or_else(invalid)?;

    let mut parts = date.splitn(3, '-');
    let mut next_num = || -> Result<i64, ArrayError> {
        parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)
    };
    let year = next_num()?;
    let month = next_num()?;
    let day = next_num()?;
    let year = if bc { 1 - year } else { year };

    let zone_at = rest.find(['Z', '+', '-']).unwrap_or(rest.len());
    let (clock, zone) = rest.split_at(zone_at);

    let (hms, fraction) = clock
        .split_once('.')
        .map_or((clock, None), |(hms, fraction)| (hms, Some(fraction)));
    let mut fields = hms.split(':').map(str::parse::<u32>);
    let mut field = || fields.next().and_then(Result::ok).ok_or_else(invalid);
    let (hour, minute, second) = (field()?, field()?, field()?);

    let nanos = match fraction {
        Some(f) if !f.is_empty() && f.len() <= 9 && f.bytes().all(|b| b.is_ascii_digit()) => {
            let padded = format!("{f:0<9}");
            padded.parse::<u32>().map_err(|_| invalid())?
        }
        Some(_) => return Err(invalid()),
        None => 0,
    };

    let offset = parse_offset(zone).ok_or_else(invalid)?;

    let naive = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .zip(u32::try_from(day).ok())
        .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
        .and_then(|d| d.and_hms_nano_opt(hour, minute, second, nanos))
        .ok_or_else(invalid)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(invalid)
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    if zone.is_empty() || zone == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = match zone.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let mut secs = 0i32;
    for (part, scale) in zone[1..].split(':').zip([3600, 60, 1]) {
        secs += part.parse::<i32>().ok()? * scale;
    }
    FixedOffset::east_opt(sign * secs)
}
