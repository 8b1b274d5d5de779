use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Parse ett datum från en sträng (flexibelt format)
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Försök olika format
    let formats = [
        "%Y-%m-%d",    // 2024-01-15
        "%Y/%m/%d",    // 2024/01/15
        "%d-%m-%Y",    // 15-01-2024
        "%Y%m%d",      // 20240115
    ];

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    parse_slash_date(s, DateConvention::Disambiguated).ok()
}

/// Formatera ett datum för visning
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Midnatt UTC för ett datum
pub fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Kanonisk tidsstämpel, t.ex. `2025-03-03T00:00:00.000Z`
pub fn canonical_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Tolka en tidsstämpel: RFC 3339 i första hand, annars ett datum enligt
/// `parse_date` som midnatt UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_date(s).map(start_of_day_utc))
}

/// Serde: tidsstämpel i en inläst fil som inte går att tolka blir `now`
pub fn deserialize_timestamp_or_now<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(lenient_timestamp(raw).unwrap_or_else(Utc::now))
}

/// Serde: tidsstämpel i en inläst fil som inte går att tolka blir `None`
pub fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(lenient_timestamp(raw))
}

fn lenient_timestamp(raw: Option<Value>) -> Option<DateTime<Utc>> {
    match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => {
            let parsed = value.as_str().and_then(parse_timestamp);
            if parsed.is_none() {
                warn!("Kunde inte tolka datum {}, värdet ignoreras", value);
            }
            parsed
        }
    }
}

/// Redan maskinläsbar tidsstämpel: innehåller både `T` och `Z`
pub fn is_canonical_timestamp(s: &str) -> bool {
    s.contains('T') && s.contains('Z')
}

/// Hur de två första delarna i `a/b/år` ska tolkas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateConvention {
    /// Första delen är dag, andra är månad. Inget byte.
    Positional,
    /// Den del som är större än 12 är dagen. Är båda ≤ 12 tolkas det som
    /// dag först. Är båda > 12 är datumet ogiltigt.
    Disambiguated,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlashDateError {
    #[error("Förväntade tre numeriska delar: '{0}'")]
    Malformed(String),
    #[error("Inget giltigt kalenderdatum: '{0}'")]
    InvalidDate(String),
}

/// Tolka `a/b/år` där tvåsiffriga år räknas som 2000-talet.
///
/// Datumet kontrolleras strikt mot kalendern; 31/02 eller månad 13 rullar
/// inte över till nästa månad eller år.
pub fn parse_slash_date(input: &str, convention: DateConvention) -> Result<NaiveDate, SlashDateError> {
    let malformed = || SlashDateError::Malformed(input.to_string());

    let parts: Vec<&str> = input.trim().split('/').collect();
    if parts.len() != 3 {
        return Err(malformed());
    }

    let mut nums = [0u32; 3];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        *slot = part.trim().parse().map_err(|_| malformed())?;
    }

    let [first, second, year] = nums;
    let year = if year < 100 { year + 2000 } else { year };

    let (day, month) = match convention {
        DateConvention::Positional => (first, second),
        DateConvention::Disambiguated => {
            if first > 12 && second > 12 {
                return Err(SlashDateError::InvalidDate(input.to_string()));
            } else if second > 12 {
                (second, first)
            } else {
                (first, second)
            }
        }
    };

    i32::try_from(year)
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        .ok_or_else(|| SlashDateError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-15"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("15/01/2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("invalid"), None);
    }

    #[test]
    fn test_unambiguous_and_day_first_dates() {
        for convention in [DateConvention::Positional, DateConvention::Disambiguated] {
            assert_eq!(parse_slash_date("03/03/25", convention), Ok(ymd(2025, 3, 3)));
            assert_eq!(parse_slash_date("13/05/24", convention), Ok(ymd(2024, 5, 13)));
        }
    }

    #[test]
    fn test_month_first_input_diverges_between_conventions() {
        // Andra delen > 12: bara den disambiguerande tolkningen byter plats.
        // Positionell tolkning rullade tidigare över månad 13 till januari
        // året efter (05/13/24 -> 2025-01-05). Det är borttaget med avsikt;
        // ett omöjligt datum ger fel i stället för ett annat datum.
        assert_eq!(
            parse_slash_date("05/13/24", DateConvention::Disambiguated),
            Ok(ymd(2024, 5, 13))
        );
        assert_eq!(
            parse_slash_date("05/13/24", DateConvention::Positional),
            Err(SlashDateError::InvalidDate("05/13/24".into()))
        );
    }

    #[test]
    fn test_both_ambiguous_parts_default_to_day_first() {
        assert_eq!(
            parse_slash_date("04/05/2023", DateConvention::Disambiguated),
            Ok(ymd(2023, 5, 4))
        );
    }

    #[test]
    fn test_rejects_malformed_and_impossible_dates() {
        assert!(matches!(
            parse_slash_date("2024-01-15", DateConvention::Positional),
            Err(SlashDateError::Malformed(_))
        ));
        assert!(matches!(
            parse_slash_date("aa/01/24", DateConvention::Positional),
            Err(SlashDateError::Malformed(_))
        ));
        assert!(matches!(
            parse_slash_date("1/2/3/4", DateConvention::Positional),
            Err(SlashDateError::Malformed(_))
        ));
        assert!(matches!(
            parse_slash_date("31/02/24", DateConvention::Positional),
            Err(SlashDateError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_slash_date("14/13/24", DateConvention::Disambiguated),
            Err(SlashDateError::InvalidDate(_))
        ));
    }

    #[derive(Debug, serde::Deserialize)]
    struct Stamped {
        #[serde(default = "Utc::now", deserialize_with = "deserialize_timestamp_or_now")]
        at: DateTime<Utc>,
        #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
        seen: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_parse_timestamp_accepts_rfc3339_and_legacy_dates() {
        assert_eq!(
            parse_timestamp("2025-03-03T10:00:00.000Z"),
            Some(start_of_day_utc(ymd(2025, 3, 3)) + chrono::Duration::hours(10))
        );
        assert_eq!(parse_timestamp("03/03/25"), Some(start_of_day_utc(ymd(2025, 3, 3))));
        assert_eq!(parse_timestamp("igår"), None);
    }

    #[test]
    fn test_lenient_deserializers_never_reject_the_record() {
        let before = Utc::now();

        let legacy: Stamped = serde_json::from_str(r#"{"at":"03/03/25","seen":"13/05/24"}"#).unwrap();
        assert_eq!(legacy.at, start_of_day_utc(ymd(2025, 3, 3)));
        assert_eq!(legacy.seen, Some(start_of_day_utc(ymd(2024, 5, 13))));

        let garbage: Stamped = serde_json::from_str(r#"{"at":"inte ett datum","seen":42}"#).unwrap();
        assert!(garbage.at >= before);
        assert_eq!(garbage.seen, None);

        let missing: Stamped = serde_json::from_str(r#"{"seen":null}"#).unwrap();
        assert!(missing.at >= before);
        assert_eq!(missing.seen, None);
    }

    #[test]
    fn test_canonical_timestamp() {
        let ts = canonical_timestamp(start_of_day_utc(ymd(2025, 3, 3)));
        assert_eq!(ts, "2025-03-03T00:00:00.000Z");
        assert!(is_canonical_timestamp(&ts));
        assert!(!is_canonical_timestamp("03/03/25"));
    }
}
