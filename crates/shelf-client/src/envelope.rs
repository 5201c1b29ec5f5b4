//! Decoding of the API's JSON envelopes.
//!
//! List endpoints come in two shapes. Books nest the page inside `data`:
//! `{result, message, data: {data: [...], pageNumber, ...}}`. Categories,
//! staff and users put the items in `data` and the paging beside it:
//! `{result, message, data: [...], pageNumber, ...}`. Both decode to the same
//! [`ListResult`].

use http::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shelf_query::{ListRequest, ListResult};

use crate::error::FetchError;
use crate::models::DropdownOption;

const SUCCESS: &str = "success";

/// Just enough of an envelope to decide success.
#[derive(Debug, Default, Deserialize)]
struct Outcome {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paging {
    page_number: Option<u32>,
    page_size: Option<u32>,
    total_pages: Option<u32>,
    total_count: Option<u64>,
    has_previous_page: Option<bool>,
    has_next_page: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Nested<T> {
    data: Vec<T>,
    #[serde(flatten)]
    paging: Paging,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListData<T> {
    Nested(Nested<T>),
    Flat(Vec<T>),
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: ListData<T>,
    #[serde(flatten)]
    paging: Paging,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptionsBody {
    Bare(Vec<DropdownOption>),
    Enveloped { data: Vec<DropdownOption> },
}

/// Fail unless the status is 2xx and the envelope says `"success"`.
fn check(status: StatusCode, body: &str) -> Result<(), FetchError> {
    let outcome: Outcome = serde_json::from_str(body).unwrap_or_default();
    if !status.is_success() {
        return Err(FetchError::api(status, outcome.message));
    }
    match outcome.result.as_deref() {
        Some(SUCCESS) => Ok(()),
        _ => Err(FetchError::api(status, outcome.message)),
    }
}

pub fn decode_list<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    request: &ListRequest,
) -> Result<ListResult<T>, FetchError> {
    check(status, body)?;
    let envelope: ListEnvelope<T> = serde_json::from_str(body)?;

    let (items, paging) = match envelope.data {
        ListData::Nested(nested) => (nested.data, nested.paging),
        ListData::Flat(items) => (items, envelope.paging),
    };

    let page_number = paging.page_number.unwrap_or(request.page_number);
    let page_size = paging.page_size.unwrap_or(request.page_size);
    let total_count = paging.total_count.unwrap_or(items.len() as u64);
    let mut result = ListResult::derived(items, page_number, page_size, total_count);
    if let Some(total_pages) = paging.total_pages {
        result.total_pages = total_pages;
        result.has_next_page = page_number < total_pages;
    }
    if let Some(has_previous) = paging.has_previous_page {
        result.has_previous_page = has_previous;
    }
    if let Some(has_next) = paging.has_next_page {
        result.has_next_page = has_next;
    }
    Ok(result)
}

/// Reference endpoints return a bare option array; an enveloped array is
/// accepted as well.
pub fn decode_options(status: StatusCode, body: &str) -> Result<Vec<DropdownOption>, FetchError> {
    if !status.is_success() {
        let outcome: Outcome = serde_json::from_str(body).unwrap_or_default();
        return Err(FetchError::api(status, outcome.message));
    }
    match serde_json::from_str::<OptionsBody>(body)? {
        OptionsBody::Bare(options) => Ok(options),
        OptionsBody::Enveloped { data } => {
            check(status, body)?;
            Ok(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shelf_query::{ListQuery, Sort};

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: String,
    }

    fn request(page: u32) -> ListRequest {
        let mut q = ListQuery::new(10, Sort::desc("createdat"));
        q.set_page(page);
        q.to_request()
    }

    #[test]
    fn nested_list_envelope() {
        let body = json!({
            "result": "success",
            "data": {
                "data": [{"id": "b1"}, {"id": "b2"}],
                "pageNumber": 2,
                "pageSize": 10,
                "totalPages": 3,
                "totalCount": 23,
                "hasPreviousPage": true,
                "hasNextPage": true
            }
        })
        .to_string();

        let page: ListResult<Row> = decode_list(StatusCode::OK, &body, &request(2)).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page_number, 2);
        assert_eq!(page.total_count, 23);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous_page && page.has_next_page);
    }

    #[test]
    fn flat_list_envelope() {
        let body = json!({
            "result": "success",
            "message": "ok",
            "data": [{"id": "c1"}],
            "pageNumber": 1,
            "pageSize": 10,
            "totalPages": 1,
            "totalCount": 1,
            "hasPreviousPage": false,
            "hasNextPage": false
        })
        .to_string();

        let page: ListResult<Row> = decode_list(StatusCode::OK, &body, &request(1)).unwrap();
        assert_eq!(page.items, vec![Row { id: "c1".into() }]);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next_page);
    }

    #[test]
    fn missing_paging_is_derived_from_request() {
        let body = json!({ "result": "success", "data": [{"id": "u1"}, {"id": "u2"}] }).to_string();
        let page: ListResult<Row> = decode_list(StatusCode::OK, &body, &request(1)).unwrap();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.total_count, 2);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn non_success_result_is_an_api_error() {
        let body = json!({ "result": "error", "message": "Token expired", "data": null }).to_string();
        let err = decode_list::<Row>(StatusCode::OK, &body, &request(1)).unwrap_err();
        assert_eq!(
            err,
            FetchError::api(StatusCode::OK, Some("Token expired".into()))
        );
    }

    #[test]
    fn non_2xx_without_json_body() {
        let err =
            decode_list::<Row>(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", &request(1))
                .unwrap_err();
        assert_eq!(err, FetchError::api(StatusCode::BAD_GATEWAY, None));
    }

    #[test]
    fn malformed_success_is_a_decode_error() {
        let body = json!({ "result": "success", "data": {"rows": []} }).to_string();
        let err = decode_list::<Row>(StatusCode::OK, &body, &request(1)).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn options_bare_and_enveloped() {
        let bare = json!([{"value": "c1", "label": "Fiction"}]).to_string();
        let options = decode_options(StatusCode::OK, &bare).unwrap();
        assert_eq!(options[0].label, "Fiction");

        let wrapped = json!({
            "result": "success",
            "data": [{"value": "c2", "label": "History"}]
        })
        .to_string();
        let options = decode_options(StatusCode::OK, &wrapped).unwrap();
        assert_eq!(options[0].value, "c2");
    }

    #[test]
    fn options_failure_carries_message() {
        let body = json!({ "result": "error", "message": "maintenance" }).to_string();
        let err = decode_options(StatusCode::SERVICE_UNAVAILABLE, &body).unwrap_err();
        assert_eq!(err.user_message("fallback"), "maintenance");
    }
}
