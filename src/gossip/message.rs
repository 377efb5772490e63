use crate::directory::LocationRecord;
use crate::gossip::visited::VisitedSet;
use bytes::{BufMut, Bytes, BytesMut};

pub(crate) const UPDATE_KEYWORD: &str = "UPDATE";

/// UpdateMessage is the payload flooded between mesh members:
///
/// `UPDATE <client_id> <coordinates> <reported_at> <visited>\n`
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UpdateMessage {
    pub(crate) record: LocationRecord,
    pub(crate) visited: VisitedSet,
}

impl UpdateMessage {
    pub(crate) fn encode(&self) -> Bytes {
        let visited = self.visited.encode();
        let fields = [
            UPDATE_KEYWORD,
            self.record.client_id.as_str(),
            self.record.coordinates.as_str(),
            self.record.reported_at.as_str(),
            visited.as_str(),
        ];

        let len: usize = fields.iter().map(|field| field.len() + 1).sum();
        let mut bytes = BytesMut::with_capacity(len);
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                bytes.put_u8(b' ');
            }
            bytes.put_slice(field.as_bytes());
        }
        bytes.put_u8(b'\n');

        bytes.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{Coordinates, Timestamp};

    #[test]
    fn encode_update_line() {
        let message = UpdateMessage {
            record: LocationRecord {
                client_id: "kiwi.cs.ucla.edu".to_string(),
                coordinates: Coordinates::parse("+34.068930-118.445127").unwrap(),
                reported_at: Timestamp::parse("1621464827.959498503").unwrap(),
            },
            visited: VisitedSet::decode("Campbell,Bailey").unwrap(),
        };

        assert_eq!(
            &message.encode()[..],
            &b"UPDATE kiwi.cs.ucla.edu +34.068930-118.445127 1621464827.959498503 Bailey,Campbell\n"[..]
        );
    }
}
