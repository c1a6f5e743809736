use crate::classifier::host_matches;
use crate::types::{truncate_chars, Operation};
use log::warn;
use serde::Serialize;
use url::Url;

const RPC_BODY_CHARS: usize = 100;
const SELECT_CHARS: usize = 50;
const PARAM_VALUE_CHARS: usize = 30;
const API_KEY_PARAM: &str = "apikey";

/// Semantics recovered from a backend REST URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestCall {
    pub table: String,
    pub operation: Operation,
    pub query_params: Option<String>,
}

/// Maps a backend URL, verb and optional body to `{table, operation, query}`.
///
/// Returns `None` for unparsable URLs and for hosts outside `backend_domain`.
pub fn decode(
    url: &str,
    method: &str,
    request_body: Option<&str>,
    backend_domain: &str,
) -> Option<RestCall> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Could not decode backend URL {:?}: {}", url, e);
            return None;
        }
    };

    let host = parsed.host_str()?;
    if !host_matches(host, backend_domain) {
        return None;
    }

    let path = parsed.path();
    let path_and_query = match parsed.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    if path.contains("/auth/") {
        return Some(decode_auth(path, &path_and_query));
    }

    if let Some(idx) = path.find("/rest/v1/") {
        let rest = &path[idx + "/rest/v1/".len()..];
        return Some(decode_rest(rest, &parsed, method, request_body));
    }

    if path.contains("/realtime/") {
        return Some(RestCall {
            table: "realtime".to_string(),
            operation: Operation::Realtime,
            query_params: None,
        });
    }

    let table = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or("unknown")
        .to_string();
    let operation = if method.eq_ignore_ascii_case("GET") {
        Operation::Select
    } else {
        Operation::Rpc
    };

    Some(RestCall {
        table,
        operation,
        query_params: None,
    })
}

/// `path_and_query` starts with `path`, so a marker found in the path can
/// index into it and keep the query string.
fn decode_auth(path: &str, path_and_query: &str) -> RestCall {
    let tail = ["/auth/v1/", "/auth/"]
        .iter()
        .find_map(|&marker| {
            path.find(marker)
                .map(|idx| &path_and_query[idx + marker.len()..])
        })
        .unwrap_or_default();

    RestCall {
        table: "auth".to_string(),
        operation: Operation::Auth,
        query_params: Some(tail.to_string()),
    }
}

fn decode_rest(rest: &str, parsed: &Url, method: &str, request_body: Option<&str>) -> RestCall {
    if let Some(function) = rest.strip_prefix("rpc/") {
        let name = function.split('/').next().unwrap_or_default();
        return RestCall {
            table: non_empty_or_unknown(name),
            operation: Operation::Rpc,
            query_params: request_body.map(|body| truncate_chars(body, RPC_BODY_CHARS).to_string()),
        };
    }

    let table = rest.split('/').next().unwrap_or_default();

    RestCall {
        table: non_empty_or_unknown(table),
        operation: Operation::from_method(method),
        query_params: describe_query(parsed),
    }
}

/// Renders `select: <cols> | k=v, k=v`, leaving out the API key.
fn describe_query(parsed: &Url) -> Option<String> {
    let mut select = None;
    let mut filters = Vec::new();

    for (key, value) in parsed.query_pairs() {
        if key == "select" {
            if select.is_none() {
                select = Some(format!("select: {}", truncate_chars(&value, SELECT_CHARS)));
            }
        } else if key != API_KEY_PARAM {
            filters.push(format!("{}={}", key, truncate_chars(&value, PARAM_VALUE_CHARS)));
        }
    }

    let filters = if filters.is_empty() {
        None
    } else {
        Some(filters.join(", "))
    };

    match (select, filters) {
        (Some(select), Some(filters)) => Some(format!("{} | {}", select, filters)),
        (Some(select), None) => Some(select),
        (None, Some(filters)) => Some(filters),
        (None, None) => None,
    }
}

fn non_empty_or_unknown(segment: &str) -> String {
    if segment.is_empty() {
        "unknown".to_string()
    } else {
        segment.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "example-backend.co";
    const JOBS_URL: &str =
        "https://proj.example-backend.co/rest/v1/jobs?select=id,title&user_id=eq.abc&apikey=xyz";

    fn call(table: &str, operation: Operation, query: Option<&str>) -> RestCall {
        RestCall {
            table: table.to_string(),
            operation,
            query_params: query.map(str::to_string),
        }
    }

    #[test]
    fn table_select_with_filters() {
        assert_eq!(
            decode(JOBS_URL, "GET", None, DOMAIN),
            Some(call("jobs", Operation::Select, Some("select: id,title | user_id=eq.abc")))
        );
    }

    #[test]
    fn verb_decides_crud_operation() {
        let op = |method| decode(JOBS_URL, method, None, DOMAIN).map(|c| c.operation);
        assert_eq!(op("POST"), Some(Operation::Insert));
        assert_eq!(op("PATCH"), Some(Operation::Update));
        assert_eq!(op("DELETE"), Some(Operation::Delete));
        assert_eq!(op("PUT"), Some(Operation::Select));
    }

    #[test]
    fn rpc_uses_function_name_and_body() {
        assert_eq!(
            decode(
                "https://proj.example-backend.co/rest/v1/rpc/compute_match",
                "POST",
                Some(r#"{"a":1}"#),
                DOMAIN
            ),
            Some(call("compute_match", Operation::Rpc, Some(r#"{"a":1}"#)))
        );

        let decoded = decode(
            "https://proj.example-backend.co/rest/v1/rpc/compute_match?apikey=xyz",
            "POST",
            None,
            DOMAIN,
        );
        assert_eq!(decoded, Some(call("compute_match", Operation::Rpc, None)));
    }

    #[test]
    fn rpc_body_is_truncated() {
        let body = "x".repeat(250);
        let decoded = decode(
            "https://proj.example-backend.co/rest/v1/rpc/f",
            "POST",
            Some(&body),
            DOMAIN,
        )
        .unwrap();
        assert_eq!(decoded.query_params.unwrap().len(), 100);
    }

    #[test]
    fn auth_keeps_tail_with_query() {
        assert_eq!(
            decode(
                "https://proj.example-backend.co/auth/v1/token?grant_type=password",
                "POST",
                None,
                DOMAIN
            ),
            Some(call("auth", Operation::Auth, Some("token?grant_type=password")))
        );
        assert_eq!(
            decode("https://proj.example-backend.co/auth/callback", "GET", None, DOMAIN),
            Some(call("auth", Operation::Auth, Some("callback")))
        );
    }

    #[test]
    fn auth_marker_is_taken_from_path_not_query() {
        assert_eq!(
            decode(
                "https://proj.example-backend.co/auth/callback?next=/auth/v1/x",
                "GET",
                None,
                DOMAIN
            ),
            Some(call("auth", Operation::Auth, Some("callback?next=/auth/v1/x")))
        );
    }

    #[test]
    fn realtime_and_fallback() {
        assert_eq!(
            decode("https://proj.example-backend.co/realtime/v1/websocket", "GET", None, DOMAIN),
            Some(call("realtime", Operation::Realtime, None))
        );
        assert_eq!(
            decode("https://proj.example-backend.co/storage/v1/object/avatar", "GET", None, DOMAIN),
            Some(call("avatar", Operation::Select, None))
        );
        assert_eq!(
            decode("https://proj.example-backend.co/functions/v1/send/", "POST", None, DOMAIN),
            Some(call("send", Operation::Rpc, None))
        );
        assert_eq!(
            decode("https://proj.example-backend.co/", "GET", None, DOMAIN),
            Some(call("unknown", Operation::Select, None))
        );
    }

    #[test]
    fn long_values_are_truncated_in_query_description() {
        let url = format!(
            "https://proj.example-backend.co/rest/v1/jobs?select={}&note=eq.{}",
            "c".repeat(80),
            "v".repeat(80)
        );
        let query = decode(&url, "GET", None, DOMAIN).unwrap().query_params.unwrap();
        let expected = format!("select: {} | note=eq.{}", "c".repeat(50), "v".repeat(27));
        assert_eq!(query, expected);
    }

    #[test]
    fn filters_only_and_no_query() {
        assert_eq!(
            decode(
                "https://proj.example-backend.co/rest/v1/jobs?id=eq.4&apikey=k",
                "GET",
                None,
                DOMAIN
            ),
            Some(call("jobs", Operation::Select, Some("id=eq.4")))
        );
        assert_eq!(
            decode("https://proj.example-backend.co/rest/v1/jobs/42", "DELETE", None, DOMAIN),
            Some(call("jobs", Operation::Delete, None))
        );
    }

    #[test]
    fn foreign_or_broken_urls_decode_to_none() {
        assert_eq!(decode("not a url", "GET", None, DOMAIN), None);
        assert_eq!(decode("https://api.example.com/rest/v1/jobs", "GET", None, DOMAIN), None);
        assert_eq!(decode("mailto:someone@example-backend.co", "GET", None, DOMAIN), None);
    }
}
