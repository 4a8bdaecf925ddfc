//! DATE and TIMESTAMP decoding
//!
//! DATE is seven bytes: century and year (each excess-100), month, day, then
//! hour, minute and second (each excess-1). TIMESTAMP appends a big-endian
//! nanosecond count; TIMESTAMP WITH TIME ZONE appends two offset bytes and
//! stores the date and time in UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

const DATE_LENGTH: usize = 7;
const TIMESTAMP_LENGTH: usize = 11;
const TIMESTAMP_TZ_LENGTH: usize = 13;

const TZ_HOUR_OFFSET: i32 = 20;
const TZ_MINUTE_OFFSET: i32 = 60;
const HAS_REGION_ID: u8 = 0x80;

/// Decode a DATE, or a TIMESTAMP ignoring anything after the seconds
pub fn decode_oracle_date(data: &[u8]) -> Result<NaiveDateTime> {
    if data.len() < DATE_LENGTH {
        return Err(Error::DataConversion(format!(
            "DATE requires {} bytes, got {}",
            DATE_LENGTH,
            data.len()
        )));
    }
    let year = (data[0] as i32 - 100) * 100 + (data[1] as i32 - 100);
    let nanos = if data.len() >= TIMESTAMP_LENGTH {
        u32::from_be_bytes([data[7], data[8], data[9], data[10]])
    } else {
        0
    };

    NaiveDate::from_ymd_opt(year, data[2] as u32, data[3] as u32)
        .and_then(|d| {
            d.and_hms_nano_opt(
                data[4].wrapping_sub(1) as u32,
                data[5].wrapping_sub(1) as u32,
                data[6].wrapping_sub(1) as u32,
                nanos,
            )
        })
        .ok_or_else(|| Error::DataConversion(format!("invalid DATE bytes {}", hex::encode(data))))
}

/// Decode a TIMESTAMP
pub fn decode_oracle_timestamp(data: &[u8]) -> Result<NaiveDateTime> {
    decode_oracle_date(data)
}

/// Decode a TIMESTAMP WITH TIME ZONE into the server-supplied offset
///
/// Values without offset bytes are treated as UTC. Named time zone regions
/// are not supported.
pub fn decode_oracle_timestamp_tz(data: &[u8]) -> Result<DateTime<FixedOffset>> {
    let utc = decode_oracle_date(data)?;
    let offset_seconds = if data.len() >= TIMESTAMP_TZ_LENGTH && data[11] != 0 {
        if data[11] & HAS_REGION_ID != 0 {
            return Err(Error::Unsupported("named time zone regions".to_string()));
        }
        let hours = data[11] as i32 - TZ_HOUR_OFFSET;
        let minutes = data[12] as i32 - TZ_MINUTE_OFFSET;
        hours * 3600 + minutes * 60
    } else {
        0
    };
    let offset = FixedOffset::east_opt(offset_seconds)
        .ok_or_else(|| Error::DataConversion(format!("invalid time zone offset {}s", offset_seconds)))?;
    Ok(utc.and_utc().with_timezone(&offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_decode_date() {
        // 2024-03-15 10:30:45
        let dt = decode_oracle_date(&[120, 124, 3, 15, 11, 31, 46]).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 15));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (10, 30, 45));
    }

    #[test]
    fn test_decode_timestamp_fraction() {
        let dt = decode_oracle_timestamp(&[120, 124, 1, 1, 1, 1, 1, 0x07, 0x5b, 0xcd, 0x15]).unwrap();
        assert_eq!(dt.nanosecond(), 123_456_789);
    }

    #[test]
    fn test_decode_timestamp_tz() {
        // 12:00 UTC rendered at +05:30
        let data = [120, 124, 6, 1, 13, 1, 1, 0, 0, 0, 0, 25, 90];
        let dt = decode_oracle_timestamp_tz(&data).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!((dt.hour(), dt.minute()), (17, 30));
    }

    #[test]
    fn test_region_id_unsupported() {
        let data = [120, 124, 6, 1, 13, 1, 1, 0, 0, 0, 0, 0x81, 0x10];
        assert!(matches!(
            decode_oracle_timestamp_tz(&data),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_invalid_date() {
        assert!(decode_oracle_date(&[120, 124, 2, 30, 1, 1, 1]).is_err());
        assert!(decode_oracle_date(&[120, 124]).is_err());
    }
}
