//! Downstream query construction.

use std::borrow::Cow;

use crate::request::Request;

/// Base query sent when no fields are set.
pub const QUERY_BASE: &str = "SELECT * FROM movie_times";

const FILTER_INTRO: &str = " WHERE ";
const FILTER_JOIN: &str = " AND ";

/// Build the downstream query for a decoded request.
///
/// Every set field contributes one `name = 'value'` predicate, joined by
/// `AND` in field order after a single `WHERE`. No set fields, no filter
/// clause. Embedded single quotes are doubled so a value cannot break out
/// of its predicate.
pub fn build_query(request: &Request) -> String {
    let mut query = String::from(QUERY_BASE);
    let mut first = true;
    for (name, value) in request.set_fields() {
        query.push_str(if first { FILTER_INTRO } else { FILTER_JOIN });
        query.push_str(name);
        query.push_str(" = '");
        query.push_str(&escape(value));
        query.push('\'');
        first = false;
    }
    query
}

fn escape(value: &str) -> Cow<'_, str> {
    if value.contains('\'') {
        Cow::Owned(value.replace('\'', "''"))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::decode_request;

    #[test]
    fn no_fields_yields_base_query() {
        assert_eq!(build_query(&Request::default()), QUERY_BASE);
    }

    #[test]
    fn single_field_has_no_and() {
        let req = Request {
            movie: Some("Inception".into()),
            ..Default::default()
        };
        let query = build_query(&req);
        assert_eq!(query, "SELECT * FROM movie_times WHERE name = 'Inception'");
        assert!(!query.contains(" AND "));
    }

    #[test]
    fn n_fields_yield_n_minus_one_ands_in_field_order() {
        let req = Request {
            movie: Some("Up".into()),
            location: Some("Boise, ID".into()),
            time: Some("7:30 pm".into()),
            ..Default::default()
        };
        let query = build_query(&req);
        assert_eq!(
            query,
            "SELECT * FROM movie_times WHERE name = 'Up' AND location = 'Boise, ID' AND time = '7:30 pm'"
        );
        assert_eq!(query.matches(" AND ").count(), 2);
    }

    #[test]
    fn skipped_fields_do_not_reorder_predicates() {
        let req = Request {
            location: Some("Denver, CO".into()),
            date: Some("July 4".into()),
            ..Default::default()
        };
        assert_eq!(
            build_query(&req),
            "SELECT * FROM movie_times WHERE location = 'Denver, CO' AND date = 'July 4'"
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let req = Request {
            movie: Some("Ocean's Eleven".into()),
            ..Default::default()
        };
        assert_eq!(
            build_query(&req),
            "SELECT * FROM movie_times WHERE name = 'Ocean''s Eleven'"
        );
    }

    #[test]
    fn end_to_end_single_name_scenario() {
        let req = decode_request(b"name = 'Inception'/location = ''/date = ''/time = ''").unwrap();
        let query = build_query(&req);
        assert!(query.ends_with("WHERE name = 'Inception'"));
    }
}
