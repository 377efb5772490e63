use crate::directory::{Coordinates, CoordinatesError, LocationRecord, Timestamp, TimestampError};
use crate::gossip::{UpdateMessage, VisitedListError, VisitedSet, UPDATE_KEYWORD};
use std::ops::RangeInclusive;

pub(crate) const REPORT_LOCATION_KEYWORD: &str = "IAMAT";
pub(crate) const QUERY_NEARBY_KEYWORD: &str = "WHATSAT";

const RADIUS_KM_RANGE: RangeInclusive<i64> = 1..=50;
const MAX_RESULTS_RANGE: RangeInclusive<i64> = 1..=20;

/// One parsed request line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Request {
    /// `IAMAT <client_id> <coordinates> <reported_at>`
    ReportLocation(LocationRecord),
    /// `WHATSAT <client_id> <radius_km> <max_results>`
    QueryNearby(NearbyQuery),
    /// `UPDATE <client_id> <coordinates> <reported_at> <visited>`
    PropagatedUpdate(UpdateMessage),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NearbyQuery {
    pub(crate) client_id: String,
    pub(crate) radius_km: u32,
    pub(crate) max_results: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("Empty request")]
    Empty,
    #[error("Unknown command {0:?}")]
    UnknownCommand(String),
    #[error("{command} takes {expected} arguments, got {actual}")]
    ArgumentCount {
        command: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Bad coordinates: {0}")]
    Coordinates(CoordinatesError),
    #[error("Bad timestamp: {0}")]
    Timestamp(TimestampError),
    #[error("{name} is not an integer: {value:?}")]
    NotAnInteger { name: &'static str, value: String },
    #[error("{name} {value} outside [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("Bad visited list: {0}")]
    VisitedList(VisitedListError),
}

impl Request {
    pub(crate) fn parse(line: &str) -> Result<Self, RequestError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (command, args) = tokens.split_first().ok_or(RequestError::Empty)?;

        match *command {
            REPORT_LOCATION_KEYWORD => {
                expect_arg_count(REPORT_LOCATION_KEYWORD, args, 3)?;
                let record = parse_record(args[0], args[1], args[2])?;

                Ok(Request::ReportLocation(record))
            }
            QUERY_NEARBY_KEYWORD => {
                expect_arg_count(QUERY_NEARBY_KEYWORD, args, 3)?;
                let radius_km = parse_bounded_int("radius_km", args[1], RADIUS_KM_RANGE)?;
                let max_results = parse_bounded_int("max_results", args[2], MAX_RESULTS_RANGE)?;

                // Both values are small and positive after the range check.
                Ok(Request::QueryNearby(NearbyQuery {
                    client_id: args[0].to_string(),
                    radius_km: radius_km as u32,
                    max_results: max_results as usize,
                }))
            }
            UPDATE_KEYWORD => {
                expect_arg_count(UPDATE_KEYWORD, args, 4)?;
                let record = parse_record(args[0], args[1], args[2])?;
                let visited = VisitedSet::decode(args[3]).map_err(RequestError::VisitedList)?;

                Ok(Request::PropagatedUpdate(UpdateMessage { record, visited }))
            }
            other => Err(RequestError::UnknownCommand(other.to_string())),
        }
    }
}

fn expect_arg_count(command: &'static str, args: &[&str], expected: usize) -> Result<(), RequestError> {
    if args.len() != expected {
        return Err(RequestError::ArgumentCount {
            command,
            expected,
            actual: args.len(),
        });
    }

    Ok(())
}

fn parse_record(client_id: &str, coordinates: &str, reported_at: &str) -> Result<LocationRecord, RequestError> {
    Ok(LocationRecord {
        client_id: client_id.to_string(),
        coordinates: Coordinates::parse(coordinates).map_err(RequestError::Coordinates)?,
        reported_at: Timestamp::parse(reported_at).map_err(RequestError::Timestamp)?,
    })
}

fn parse_bounded_int(name: &'static str, raw: &str, range: RangeInclusive<i64>) -> Result<i64, RequestError> {
    let value: i64 = raw.parse().map_err(|_| RequestError::NotAnInteger {
        name,
        value: raw.to_string(),
    })?;

    if !range.contains(&value) {
        return Err(RequestError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        });
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_report_location() {
        let request = Request::parse("IAMAT kiwi.cs.ucla.edu +34.068930-118.445127 1621464827.959498503").unwrap();

        match request {
            Request::ReportLocation(record) => {
                assert_eq!(record.client_id, "kiwi.cs.ucla.edu");
                assert_eq!(record.coordinates.as_str(), "+34.068930-118.445127");
                assert_eq!(record.reported_at.as_str(), "1621464827.959498503");
            }
            other => panic!("Unexpected request: {:?}", other),
        }
    }

    #[test]
    fn extra_whitespace_between_tokens_is_fine() {
        let request = Request::parse("  IAMAT \t kiwi  +1+1   5 ").unwrap();
        assert!(matches!(request, Request::ReportLocation(_)));
    }

    #[test]
    fn reject_bad_report_location() {
        assert_eq!(
            Request::parse("IAMAT kiwi +1+1"),
            Err(RequestError::ArgumentCount {
                command: "IAMAT",
                expected: 3,
                actual: 2
            })
        );
        assert!(matches!(
            Request::parse("IAMAT kiwi +1+1 5 extra"),
            Err(RequestError::ArgumentCount { .. })
        ));
        assert!(matches!(
            Request::parse("IAMAT kiwi 1+1 5"),
            Err(RequestError::Coordinates(_))
        ));
        assert!(matches!(
            Request::parse("IAMAT kiwi +1+181 5"),
            Err(RequestError::Coordinates(CoordinatesError::OutOfRange(_)))
        ));
        assert!(matches!(
            Request::parse("IAMAT kiwi +1+1 yesterday"),
            Err(RequestError::Timestamp(_))
        ));
    }

    #[test]
    fn parse_query_nearby() {
        assert_eq!(
            Request::parse("WHATSAT kiwi.cs.ucla.edu 10 5"),
            Ok(Request::QueryNearby(NearbyQuery {
                client_id: "kiwi.cs.ucla.edu".to_string(),
                radius_km: 10,
                max_results: 5,
            }))
        );
        assert!(Request::parse("WHATSAT kiwi 1 1").is_ok());
        assert!(Request::parse("WHATSAT kiwi 50 20").is_ok());
    }

    #[test]
    fn reject_bad_query_nearby() {
        for line in &[
            "WHATSAT kiwi 0 5",
            "WHATSAT kiwi 51 5",
            "WHATSAT kiwi 10 0",
            "WHATSAT kiwi 10 21",
            "WHATSAT kiwi 100 100",
            "WHATSAT kiwi -5 5",
        ] {
            assert!(
                matches!(Request::parse(line), Err(RequestError::OutOfRange { .. })),
                "accepted {:?}",
                line
            );
        }

        assert!(matches!(
            Request::parse("WHATSAT kiwi 10.5 5"),
            Err(RequestError::NotAnInteger { name: "radius_km", .. })
        ));
        assert!(matches!(
            Request::parse("WHATSAT kiwi 10 five"),
            Err(RequestError::NotAnInteger { name: "max_results", .. })
        ));
        assert!(matches!(
            Request::parse("WHATSAT kiwi 10"),
            Err(RequestError::ArgumentCount { .. })
        ));
    }

    #[test]
    fn parse_propagated_update() {
        let request = Request::parse("UPDATE kiwi +1.5-2.5 100.25 Bailey,Campbell").unwrap();

        match request {
            Request::PropagatedUpdate(message) => {
                assert_eq!(message.record.client_id, "kiwi");
                assert_eq!(message.record.reported_at.as_str(), "100.25");
                assert!(message.visited.contains(&"Bailey".into()));
                assert!(message.visited.contains(&"Campbell".into()));
            }
            other => panic!("Unexpected request: {:?}", other),
        }
    }

    #[test]
    fn reject_bad_propagated_update() {
        assert!(matches!(
            Request::parse("UPDATE kiwi +1+1 100"),
            Err(RequestError::ArgumentCount { .. })
        ));
        assert!(matches!(
            Request::parse("UPDATE kiwi +1+1 100 Bailey,,Bona"),
            Err(RequestError::VisitedList(_))
        ));
    }

    #[test]
    fn reject_unknown_and_empty() {
        assert_eq!(
            Request::parse("FLUFFYDOG"),
            Err(RequestError::UnknownCommand("FLUFFYDOG".to_string()))
        );
        assert_eq!(
            Request::parse("iamat kiwi +1+1 5"),
            Err(RequestError::UnknownCommand("iamat".to_string()))
        );
        assert_eq!(Request::parse(""), Err(RequestError::Empty));
        assert_eq!(Request::parse("   "), Err(RequestError::Empty));
    }
}
