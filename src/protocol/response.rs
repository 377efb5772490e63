use crate::directory::LocationRecord;
use crate::topology::ServerId;

const LOCATION_KEYWORD: &str = "AT";

/// `AT <server_id> <skew> <client_id> <coordinates> <reported_at>\n`, where skew is
/// `now - reported_at` at the time the reply is built.
pub(crate) fn location_header(server_id: &ServerId, now_epoch_seconds: f64, record: &LocationRecord) -> String {
    let skew = now_epoch_seconds - record.reported_at.seconds();

    format!(
        "{} {} {} {} {} {}\n",
        LOCATION_KEYWORD,
        server_id,
        format_skew(skew),
        record.client_id,
        record.coordinates,
        record.reported_at
    )
}

/// Header, single-line places payload, then the blank line that terminates the reply.
pub(crate) fn nearby_reply(header: &str, places_payload: &str) -> String {
    format!("{}{}\n\n", header, places_payload)
}

/// Any request we can't serve is echoed back behind a `?`.
pub(crate) fn rejection(line: &str) -> String {
    format!("?{}\n", line)
}

fn format_skew(skew: f64) -> String {
    format!("{:+.9}", skew)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{Coordinates, Timestamp};

    fn record(reported_at: &str) -> LocationRecord {
        LocationRecord {
            client_id: "kiwi.cs.ucla.edu".to_string(),
            coordinates: Coordinates::parse("+34.068930-118.445127").unwrap(),
            reported_at: Timestamp::parse(reported_at).unwrap(),
        }
    }

    #[test]
    fn header_echoes_verbatim_tokens() {
        let header = location_header(&"Bailey".into(), 1621464837.75, &record("1621464827.5"));
        assert_eq!(
            header,
            "AT Bailey +10.250000000 kiwi.cs.ucla.edu +34.068930-118.445127 1621464827.5\n"
        );
    }

    #[test]
    fn skew_keeps_its_sign() {
        assert_eq!(format_skew(0.5), "+0.500000000");
        assert_eq!(format_skew(-2.25), "-2.250000000");
        assert_eq!(format_skew(0.0), "+0.000000000");
    }

    #[test]
    fn rejection_echoes_line() {
        assert_eq!(rejection("FLUFFYDOG"), "?FLUFFYDOG\n");
        assert_eq!(rejection(""), "?\n");
    }

    #[test]
    fn nearby_reply_ends_with_blank_line() {
        assert_eq!(nearby_reply("AT x\n", "{}"), "AT x\n{}\n\n");
    }
}
