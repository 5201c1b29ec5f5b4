use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use serde_json::json;
use shelf_client::*;
use shelf_query::{ListQuery, Sort};

/// Accept one connection, answer it with `status_line` and `body`, and hand
/// back the request head that was received.
fn serve_once(status_line: &'static str, body: String) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut head = String::new();
        loop {
            let mut line = String::new();
            let n = reader.read_line(&mut line).unwrap();
            if n == 0 || line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        head
    });

    (format!("http://{addr}"), handle)
}

fn client_for(base: &str) -> HttpClient {
    HttpClient::new(ClientConfig {
        api_base_url: format!("{base}/api/cms"),
        reference_api_base_url: format!("{base}/api/common/reference"),
        token: Some("secret".into()),
        timeout_secs: 5,
    })
}

#[tokio::test]
async fn list_fetch_sends_flattened_query_and_token() {
    let body = json!({
        "result": "success",
        "data": {
            "data": [
                {"id": "b-1", "title": "Dune", "author": "Frank Herbert"},
                {"id": "b-2", "title": "Dune Messiah", "author": "Frank Herbert"}
            ],
            "pageNumber": 1,
            "pageSize": 10,
            "totalPages": 1,
            "totalCount": 2,
            "hasPreviousPage": false,
            "hasNextPage": false
        }
    })
    .to_string();
    let (base, server) = serve_once("200 OK", body);

    let fetcher: HttpListFetcher<Book> =
        HttpListFetcher::new(client_for(&base), "/books/list", "search");
    let mut query = ListQuery::new(10, Sort::desc("createdat"));
    query.set_free_text("dune");
    query.set_filter("categoryId", "c-1");
    query.set_filter("author", "");

    let page = fetcher.fetch(query.to_request()).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].title, "Dune Messiah");
    assert_eq!(page.total_count, 2);

    let head = server.join().unwrap();
    let request_line = head.lines().next().unwrap();
    assert_eq!(
        request_line,
        "GET /api/cms/books/list?search=dune&categoryId=c-1&sortBy=createdat&isAscending=false&pageNumber=1&pageSize=10 HTTP/1.1"
    );
    assert!(head.to_lowercase().contains("authorization: bearer secret"));
}

#[tokio::test]
async fn list_fetch_surfaces_server_message_on_failure() {
    let body = json!({ "result": "error", "message": "Forbidden for this role" }).to_string();
    let (base, server) = serve_once("403 Forbidden", body);

    let fetcher: HttpListFetcher<Staff> =
        HttpListFetcher::new(client_for(&base), "/staff/list", "fullName");
    let request = ListQuery::new(10, Sort::desc("createdat")).to_request();

    let err = fetcher.fetch(request).await.unwrap_err();
    assert_eq!(err.user_message("Failed to load staff"), "Forbidden for this role");
    assert!(matches!(err, FetchError::Api { status, .. } if status.as_u16() == 403));
    server.join().unwrap();
}

#[tokio::test]
async fn reference_fetch_is_unauthenticated() {
    let body = json!([
        {"value": "c-1", "label": "Fiction"},
        {"value": "c-2", "label": "History"}
    ])
    .to_string();
    let (base, server) = serve_once("200 OK", body);

    let source = HttpReferenceSource::book_categories(client_for(&base));
    let options = source.fetch_options().await.unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].label, "Fiction");

    let head = server.join().unwrap();
    assert!(head.starts_with("GET /api/common/reference/book-categories HTTP/1.1"));
    assert!(!head.to_lowercase().contains("authorization"));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher: HttpListFetcher<User> =
        HttpListFetcher::new(client_for(&format!("http://{addr}")), "/users/list", "searchKeyword");
    let request = ListQuery::new(10, Sort::desc("createdat")).to_request();

    let err = fetcher.fetch(request).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}
