//! Client request parsing and wire encoding.
//!
//! A request is a single message of up to four `/`-separated tokens, each
//! shaped `name = 'value'`. Field order is positional and load-bearing:
//! movie, location, date, time. The token's name label is carried on the
//! wire but not matched against the position — this is inherited from the
//! wire format and must be preserved for compatibility. An empty value
//! means "match any"; missing trailing tokens are treated the same way.

use thiserror::Error;

/// Field labels in wire order. The first slot carries the label `name`
/// even though it holds the movie title.
pub const FIELD_NAMES: [&str; 4] = ["name", "location", "date", "time"];

/// A decoded search request. `None` = unset ("match any").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub movie: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl Request {
    /// Set fields with their wire labels, in field order.
    pub fn set_fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        FIELD_NAMES
            .into_iter()
            .zip([&self.movie, &self.location, &self.date, &self.time])
            .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut Option<String>> {
        match index {
            0 => Some(&mut self.movie),
            1 => Some(&mut self.location),
            2 => Some(&mut self.date),
            3 => Some(&mut self.time),
            _ => None,
        }
    }
}

/// Request decode error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("request is not valid utf-8")]
    NotUtf8,
    #[error("empty request")]
    Empty,
    #[error("malformed field token: {0:?}")]
    MalformedField(String),
}

/// Decode one request message.
///
/// Tolerates fewer than four tokens (missing trailing fields are unset) and
/// ignores tokens past the fourth. Fails only when a consumed token cannot
/// be split into a well-formed `name = 'value'` pair.
pub fn decode_request(raw: &[u8]) -> Result<Request, ParseError> {
    let text = std::str::from_utf8(raw).map_err(|_| ParseError::NotUtf8)?;

    let mut request = Request::default();
    let mut index = 0;
    // Empty tokens are skipped, matching strtok semantics for the delimiter.
    for token in text.split('/').filter(|t| !t.is_empty()) {
        let Some(slot) = request.slot_mut(index) else {
            break;
        };
        let value = parse_field(token)?;
        if !value.is_empty() {
            *slot = Some(value.to_string());
        }
        index += 1;
    }

    if index == 0 {
        return Err(ParseError::Empty);
    }
    Ok(request)
}

/// Extract the value from a `name = 'value'` token.
fn parse_field(token: &str) -> Result<&str, ParseError> {
    let malformed = || ParseError::MalformedField(token.to_string());
    let (name, quoted) = token.split_once(" = ").ok_or_else(malformed)?;
    if name.is_empty() {
        return Err(malformed());
    }
    quoted
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .ok_or_else(malformed)
}

/// Encode a request into its wire form: all four fields in order, unset
/// fields carried as empty values.
pub fn encode_wire(request: &Request) -> String {
    let values = [
        &request.movie,
        &request.location,
        &request.date,
        &request.time,
    ];
    FIELD_NAMES
        .into_iter()
        .zip(values)
        .map(|(name, value)| format!("{} = '{}'", name, value.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_full_request() {
        let raw = b"name = 'Inception'/location = 'Denver, CO'/date = 'July 4'/time = '7:30 pm'";
        let req = decode_request(raw).unwrap();
        assert_eq!(req.movie.as_deref(), Some("Inception"));
        assert_eq!(req.location.as_deref(), Some("Denver, CO"));
        assert_eq!(req.date.as_deref(), Some("July 4"));
        assert_eq!(req.time.as_deref(), Some("7:30 pm"));
    }

    #[test]
    fn decode_empty_values_are_unset() {
        let raw = b"name = 'Inception'/location = ''/date = ''/time = ''";
        let req = decode_request(raw).unwrap();
        assert_eq!(req.movie.as_deref(), Some("Inception"));
        assert!(req.location.is_none());
        assert!(req.date.is_none());
        assert!(req.time.is_none());
    }

    #[test]
    fn decode_tolerates_missing_trailing_fields() {
        let req = decode_request(b"name = 'Up'/location = 'Boise, ID'").unwrap();
        assert_eq!(req.movie.as_deref(), Some("Up"));
        assert_eq!(req.location.as_deref(), Some("Boise, ID"));
        assert!(req.date.is_none());
        assert!(req.time.is_none());
    }

    #[test]
    fn decode_is_positional_not_name_matched() {
        // The second slot is the location no matter what the label says.
        let req = decode_request(b"name = 'Up'/date = 'Boise, ID'").unwrap();
        assert_eq!(req.location.as_deref(), Some("Boise, ID"));
        assert!(req.date.is_none());
    }

    #[test]
    fn decode_rejects_malformed_tokens() {
        assert!(matches!(
            decode_request(b"name: Inception"),
            Err(ParseError::MalformedField(_))
        ));
        assert!(matches!(
            decode_request(b"name = Inception"),
            Err(ParseError::MalformedField(_))
        ));
        assert!(matches!(
            decode_request(b" = 'Inception'"),
            Err(ParseError::MalformedField(_))
        ));
        assert_eq!(decode_request(b""), Err(ParseError::Empty));
        assert_eq!(decode_request(b"///"), Err(ParseError::Empty));
        assert_eq!(decode_request(b"\xff\xfe"), Err(ParseError::NotUtf8));
    }

    #[test]
    fn wire_roundtrip_preserves_set_fields() {
        let req = Request {
            movie: Some("Inception".into()),
            location: None,
            date: Some("July 4".into()),
            time: None,
        };
        let decoded = decode_request(encode_wire(&req).as_bytes()).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn wire_roundtrip_all_unset() {
        let req = Request::default();
        let decoded = decode_request(encode_wire(&req).as_bytes()).unwrap();
        assert_eq!(decoded, req);
    }
}
