use std::cmp::Ordering;
use std::fmt;

/// Both axes are bounded by +/-180. Latitude is deliberately not held to +/-90: clients of the
/// herd have always been accepted with this wider bound.
const COORDINATE_BOUND: f64 = 180.0;

/// Coordinates as reported by a client, e.g. `+34.068930-118.445127`. The raw token is kept so
/// every response echoes exactly what the client sent.
#[derive(Clone, Debug, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
    raw: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinatesError {
    #[error("expected exactly two signed decimal numbers in {0:?}")]
    Malformed(String),
    #[error("coordinate {0} outside [-180, 180]")]
    OutOfRange(f64),
}

impl Coordinates {
    pub fn parse(raw: &str) -> Result<Self, CoordinatesError> {
        let numbers = signed_numbers(raw).ok_or_else(|| CoordinatesError::Malformed(raw.to_string()))?;
        if numbers.len() != 2 {
            return Err(CoordinatesError::Malformed(raw.to_string()));
        }

        for value in numbers.iter() {
            if !(-COORDINATE_BOUND..=COORDINATE_BOUND).contains(value) {
                return Err(CoordinatesError::OutOfRange(*value));
            }
        }

        Ok(Coordinates {
            latitude: numbers[0],
            longitude: numbers[1],
            raw: raw.to_string(),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// Splits `raw` into numbers that each start with `+` or `-` followed by digits and dots. Returns
// None if anything else is present.
fn signed_numbers(raw: &str) -> Option<Vec<f64>> {
    let mut numbers = Vec::with_capacity(2);
    let mut rest = raw;

    while let Some(sign) = rest.chars().next() {
        if sign != '+' && sign != '-' {
            return None;
        }

        let body_len = rest[1..]
            .find(|c: char| c == '+' || c == '-')
            .unwrap_or(rest.len() - 1);
        let (number, tail) = rest.split_at(1 + body_len);
        let body = &number[1..];
        if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return None;
        }

        let magnitude: f64 = body.parse().ok()?;
        numbers.push(if sign == '-' { -magnitude } else { magnitude });
        rest = tail;
    }

    Some(numbers)
}

/// Client supplied report time in (fractional) seconds since the epoch, e.g.
/// `1621464827.959498503`. Echoed verbatim in responses and used as the freshness marker for
/// propagated updates. Ordering is exact on the decimal digits; `seconds()` is only an
/// approximation for skew.
#[derive(Clone, Debug)]
pub struct Timestamp {
    seconds: f64,
    exact: ExactDecimal,
    raw: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("not a plain decimal number: {0:?}")]
pub struct TimestampError(String);

impl Timestamp {
    pub fn parse(raw: &str) -> Result<Self, TimestampError> {
        let exact = ExactDecimal::parse(raw).ok_or_else(|| TimestampError(raw.to_string()))?;
        match raw.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() => Ok(Timestamp {
                seconds,
                exact,
                raw: raw.to_string(),
            }),
            _ => Err(TimestampError(raw.to_string())),
        }
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

// `1.5` and `1.50` are equal, `1621464827.959498503` is less than `1621464827.959498513`.
impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.exact == other.exact
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.exact.cmp(&other.exact)
    }
}

// `[+-]digits[.digits]` split into digit strings with leading integer zeros and trailing
// fraction zeros removed. Zero is never negative.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ExactDecimal {
    negative: bool,
    integer: String,
    fraction: String,
}

impl ExactDecimal {
    fn parse(raw: &str) -> Option<Self> {
        let (negative, unsigned) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            _ => (false, raw),
        };
        let (integer, fraction) = match unsigned.find('.') {
            Some(dot) => (&unsigned[..dot], &unsigned[dot + 1..]),
            None => (unsigned, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if integer.len() + fraction.len() == 0 || !all_digits(integer) || !all_digits(fraction) {
            return None;
        }

        let integer = integer.trim_start_matches('0').to_string();
        let fraction = fraction.trim_end_matches('0').to_string();
        let negative = negative && !(integer.is_empty() && fraction.is_empty());

        Some(ExactDecimal {
            negative,
            integer,
            fraction,
        })
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        // Without leading zeros a longer integer part is larger. Without trailing zeros the
        // fraction digits compare lexicographically.
        self.integer
            .len()
            .cmp(&other.integer.len())
            .then_with(|| self.integer.cmp(&other.integer))
            .then_with(|| self.fraction.cmp(&other.fraction))
    }
}

impl Ord for ExactDecimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for ExactDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The latest known location of one client.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationRecord {
    pub client_id: String,
    pub coordinates: Coordinates,
    pub reported_at: Timestamp,
}

impl LocationRecord {
    pub(crate) fn update_key(&self) -> UpdateKey {
        UpdateKey {
            client_id: self.client_id.clone(),
            reported_at: self.reported_at.as_str().to_string(),
        }
    }
}

/// Identity of one update as it floods the mesh.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub(crate) struct UpdateKey {
    client_id: String,
    reported_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_coordinates() {
        let coordinates = Coordinates::parse("+34.068930-118.445127").unwrap();
        assert_eq!(coordinates.latitude(), 34.068930);
        assert_eq!(coordinates.longitude(), -118.445127);
        assert_eq!(coordinates.as_str(), "+34.068930-118.445127");

        let coordinates = Coordinates::parse("-180+180").unwrap();
        assert_eq!(coordinates.latitude(), -180.0);
        assert_eq!(coordinates.longitude(), 180.0);
    }

    #[test]
    fn latitude_uses_the_wide_bound() {
        let coordinates = Coordinates::parse("+120.5+10").unwrap();
        assert_eq!(coordinates.latitude(), 120.5);
    }

    #[test]
    fn reject_malformed_coordinates() {
        for raw in &[
            "",
            "34.068930-118.445127",
            "+34.068930",
            "+34.068930-118.445127+1",
            "+34.06a930-118.445127",
            "+-118.445127",
            "+.-1",
            "+1.2.3-4",
            "+34.068930 -118.445127",
        ] {
            assert!(
                matches!(Coordinates::parse(raw), Err(CoordinatesError::Malformed(_))),
                "accepted {:?}",
                raw
            );
        }
    }

    #[test]
    fn reject_out_of_range_coordinates() {
        assert_eq!(
            Coordinates::parse("+180.0001+0"),
            Err(CoordinatesError::OutOfRange(180.0001))
        );
        assert_eq!(
            Coordinates::parse("+0-200"),
            Err(CoordinatesError::OutOfRange(-200.0))
        );
    }

    #[test]
    fn parse_timestamp() {
        let timestamp = Timestamp::parse("1621464827.959498503").unwrap();
        assert_eq!(timestamp.as_str(), "1621464827.959498503");
        assert!((timestamp.seconds() - 1621464827.959498503).abs() < 1e-6);

        assert!(Timestamp::parse("nope").is_err());
        assert!(Timestamp::parse("inf").is_err());
        assert!(Timestamp::parse("NaN").is_err());
        assert!(Timestamp::parse("").is_err());
        assert!(Timestamp::parse(".").is_err());
        assert!(Timestamp::parse("1e9").is_err());
        assert!(Timestamp::parse("1.2.3").is_err());
    }

    #[test]
    fn timestamps_order_by_value() {
        let earlier = Timestamp::parse("100.5").unwrap();
        let later = Timestamp::parse("100.75").unwrap();
        assert!(later > earlier);
        assert_eq!(Timestamp::parse("1.5").unwrap(), Timestamp::parse("1.50").unwrap());
    }

    #[test]
    fn timestamps_order_exactly() {
        let ts = |raw: &str| Timestamp::parse(raw).unwrap();

        // Closer together than an f64 can resolve at this magnitude.
        assert!(ts("1621464827.959498513") > ts("1621464827.959498503"));
        assert!(ts("1621464827.9594985031") > ts("1621464827.959498503"));
        assert!(ts("10") > ts("9.999999999999"));
        assert!(ts("-1.5") < ts("-1.25"));
        assert!(ts("-0.1") < ts("0"));
        assert_eq!(ts("-0.000"), ts("+0"));
        assert_eq!(ts("007.10"), ts("7.1"));
        assert_eq!(ts(".5"), ts("0.5"));
        assert_eq!(ts("5."), ts("5"));
    }
}
