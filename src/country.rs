//! Leaf-value to country-code resolution.
//!
//! The code table is a fixed asset of the legacy format: leaf values
//! index it after subtracting the segment count. It is a process-wide
//! constant shared by every engine instance and is never reloaded with
//! the database.

use crate::db::DatabaseHeader;
use crate::error::{Error, Result};

/// Sentinel returned for unassigned, unresolvable, or invalid addresses.
pub const UNKNOWN_COUNTRY_CODE: &str = "--";

/// Country codes in legacy table order. Entry 0 is the unknown sentinel;
/// A1/A2/O1 are the historical anonymous-proxy/satellite/other buckets.
#[rustfmt::skip]
pub(crate) static COUNTRY_CODES: [&str; 256] = [
    "--","AP","EU","AD","AE","AF","AG","AI","AL","AM","CW",
    "AO","AQ","AR","AS","AT","AU","AW","AZ","BA","BB",
    "BD","BE","BF","BG","BH","BI","BJ","BM","BN","BO",
    "BR","BS","BT","BV","BW","BY","BZ","CA","CC","CD",
    "CF","CG","CH","CI","CK","CL","CM","CN","CO","CR",
    "CU","CV","CX","CY","CZ","DE","DJ","DK","DM","DO",
    "DZ","EC","EE","EG","EH","ER","ES","ET","FI","FJ",
    "FK","FM","FO","FR","SX","GA","GB","GD","GE","GF",
    "GH","GI","GL","GM","GN","GP","GQ","GR","GS","GT",
    "GU","GW","GY","HK","HM","HN","HR","HT","HU","ID",
    "IE","IL","IN","IO","IQ","IR","IS","IT","JM","JO",
    "JP","KE","KG","KH","KI","KM","KN","KP","KR","KW",
    "KY","KZ","LA","LB","LC","LI","LK","LR","LS","LT",
    "LU","LV","LY","MA","MC","MD","MG","MH","MK","ML",
    "MM","MN","MO","MP","MQ","MR","MS","MT","MU","MV",
    "MW","MX","MY","MZ","NA","NC","NE","NF","NG","NI",
    "NL","NO","NP","NR","NU","NZ","OM","PA","PE","PF",
    "PG","PH","PK","PL","PM","PN","PR","PS","PT","PW",
    "PY","QA","RE","RO","RU","RW","SA","SB","SC","SD",
    "SE","SG","SH","SI","SJ","SK","SL","SM","SN","SO",
    "SR","ST","SV","SY","SZ","TC","TD","TF","TG","TH",
    "TJ","TK","TM","TN","TO","TL","TR","TT","TV","TW",
    "TZ","UA","UG","UM","US","UY","UZ","VA","VC","VE",
    "VG","VI","VN","VU","WF","WS","YE","YT","RS","ZA",
    "ZM","ME","ZW","A1","A2","O1","AX","GG","IM","JE",
    "BL","MF","BQ","SS","O1",
];

/// Map a terminating leaf value to its 2-letter country code.
///
/// Leaf value 0 past the segment count means "no country assigned";
/// anything beyond the table is a broken database, not a guessable code.
pub fn resolve(record_index: u32, header: &DatabaseHeader) -> Result<&'static str> {
    let adjusted = record_index.checked_sub(header.segment_count).ok_or_else(|| {
        Error::Corrupt(format!(
            "leaf value {} below segment count {}",
            record_index, header.segment_count
        ))
    })?;
    if adjusted == 0 {
        return Ok(UNKNOWN_COUNTRY_CODE);
    }
    COUNTRY_CODES
        .get(adjusted as usize)
        .copied()
        .ok_or_else(|| Error::Corrupt(format!("country index {} out of range", adjusted)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::format::{DatabaseHeader, Edition, COUNTRY_BEGIN, STANDARD_RECORD_LENGTH};

    fn header() -> DatabaseHeader {
        DatabaseHeader {
            edition: Edition::Country,
            record_width: STANDARD_RECORD_LENGTH,
            segment_count: COUNTRY_BEGIN,
        }
    }

    #[test]
    fn test_table_shape() {
        assert_eq!(COUNTRY_CODES.len(), 256);
        assert_eq!(COUNTRY_CODES[0], UNKNOWN_COUNTRY_CODE);
        // Spot checks against the legacy numbering.
        assert_eq!(COUNTRY_CODES[1], "AP");
        // The first row carries 11 entries, so CU opens the sixth row
        // at index 51, not 50.
        assert_eq!(COUNTRY_CODES[55], "CZ");
        assert_eq!(COUNTRY_CODES[56], "DE");
        assert_eq!(COUNTRY_CODES[74], "FR");
        assert_eq!(COUNTRY_CODES[77], "GB");
        assert_eq!(COUNTRY_CODES[111], "JP");
        assert_eq!(COUNTRY_CODES[225], "US");
        assert_eq!(COUNTRY_CODES[255], "O1");
        assert!(COUNTRY_CODES.iter().all(|c| c.len() == 2));
    }

    #[test]
    fn test_resolve_known_codes() {
        let h = header();
        assert_eq!(resolve(COUNTRY_BEGIN, &h).unwrap(), "--");
        assert_eq!(resolve(COUNTRY_BEGIN + 77, &h).unwrap(), "GB");
        assert_eq!(resolve(COUNTRY_BEGIN + 225, &h).unwrap(), "US");
    }

    #[test]
    fn test_resolve_out_of_range_is_corrupt() {
        let h = header();
        assert!(matches!(
            resolve(COUNTRY_BEGIN + 256, &h),
            Err(Error::Corrupt(_))
        ));
        assert!(matches!(resolve(0, &h), Err(Error::Corrupt(_))));
    }
}
