use mockito::{Matcher, Server};
use search_gateway::engine::{
    document_index_definition, provision_index, ConnectionSupervisor, ElasticsearchClient,
    EngineError, SearchEngine, StoredDocument,
};
use search_gateway::retry::RetryPolicy;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn client(server: &Server) -> ElasticsearchClient {
    ElasticsearchClient::new(&server.url(), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_ping() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("HEAD", "/")
        .with_status(200)
        .create_async()
        .await;

    client(&server).ping().await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ping_unreachable() {
    let es = ElasticsearchClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
    let err = es.ping().await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)));
}

#[tokio::test]
async fn test_index_exists() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", "/documents")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("HEAD", "/notes")
        .with_status(200)
        .create_async()
        .await;

    let es = client(&server);
    assert!(!es.index_exists("documents").await.unwrap());
    assert!(es.index_exists("notes").await.unwrap());
}

#[tokio::test]
async fn test_create_index_sends_mapping() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/documents")
        .match_body(Matcher::Json(json!({
            "mappings": {
                "properties": {
                    "id": {"type": "keyword"},
                    "text": {"type": "text"}
                }
            }
        })))
        .with_status(200)
        .with_body(r#"{"acknowledged":true}"#)
        .create_async()
        .await;

    client(&server)
        .create_index("documents", &document_index_definition())
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_provision_skips_existing_index() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", "/documents")
        .with_status(200)
        .create_async()
        .await;
    let create = server
        .mock("PUT", "/documents")
        .expect(0)
        .create_async()
        .await;

    assert!(!provision_index(&client(&server), "documents").await.unwrap());
    create.assert_async().await;
}

#[tokio::test]
async fn test_create_index_tolerates_existing_index() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", "/documents")
        .with_status(400)
        .with_body(
            json!({"error": {"type": "resource_already_exists_exception"}, "status": 400})
                .to_string(),
        )
        .create_async()
        .await;

    client(&server)
        .create_index("documents", &json!({}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_index_document_returns_engine_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(r"^/documents/_doc".to_string()))
        .match_body(Matcher::Json(json!({"text": "hello"})))
        .with_status(201)
        .with_body(r#"{"_index":"documents","_id":"q1xT0JIBf3","result":"created"}"#)
        .create_async()
        .await;

    let id = client(&server)
        .index_document("documents", None, &StoredDocument::text("hello"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(id, "q1xT0JIBf3");
}

#[tokio::test]
async fn test_index_document_with_fixed_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", Matcher::Regex(r"^/documents/_doc/7".to_string()))
        .match_body(Matcher::Json(json!({"id": "7", "text": "seven"})))
        .with_status(200)
        .with_body(r#"{"_id":"7","result":"updated"}"#)
        .create_async()
        .await;

    let id = client(&server)
        .index_document("documents", Some("7"), &StoredDocument::with_id("7", "seven"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(id, "7");
}

#[tokio::test]
async fn test_get_document() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/documents/_doc/1")
        .with_status(200)
        .with_body(
            json!({"_id": "1", "found": true, "_source": {"id": "1", "text": "India"}}).to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/documents/_doc/2")
        .with_status(404)
        .with_body(json!({"_id": "2", "found": false}).to_string())
        .create_async()
        .await;

    let es = client(&server);
    let hit = es.get_document("documents", "1").await.unwrap().unwrap();
    assert_eq!(hit.id, "1");
    assert_eq!(hit.source.text, "India");

    assert!(es.get_document("documents", "2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_and_delete_missing_document() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", Matcher::Regex(r"^/documents/_update/9".to_string()))
        .match_body(Matcher::Json(json!({"doc": {"text": "new"}})))
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("DELETE", Matcher::Regex(r"^/documents/_doc/9".to_string()))
        .with_status(404)
        .with_body(r#"{"result":"not_found"}"#)
        .create_async()
        .await;

    let es = client(&server);
    let err = es.update_text("documents", "9", "new").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = es.delete_document("documents", "9").await.unwrap_err();
    assert_eq!(err.to_string(), "Document 9 not found");
}

#[tokio::test]
async fn test_search_parses_hits() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/documents/_search")
        .match_body(Matcher::Json(json!({
            "query": {"match": {"text": "capital"}},
            "size": 10
        })))
        .with_status(200)
        .with_body(
            json!({
                "hits": {
                    "total": {"value": 2},
                    "hits": [
                        {"_id": "4", "_score": 1.9, "_source": {"id": "4", "text": "New Delhi is the capital city of India."}},
                        {"_id": "x9", "_score": 0.4, "_source": {"text": "capital letters"}}
                    ]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let hits = client(&server)
        .search("documents", Some("capital"), 10)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "4");
    assert_eq!(hits[0].score, Some(1.9));
    assert_eq!(hits[1].source.id, None);
}

#[tokio::test]
async fn test_search_without_query_matches_all() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/documents/_search")
        .match_body(Matcher::PartialJson(json!({"query": {"match_all": {}}})))
        .with_status(200)
        .with_body(r#"{"hits":{"hits":[]}}"#)
        .create_async()
        .await;

    let hits = client(&server).search("documents", None, 1000).await.unwrap();
    mock.assert_async().await;
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_count() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/documents/_count")
        .with_status(200)
        .with_body(r#"{"count":4}"#)
        .create_async()
        .await;

    assert_eq!(client(&server).count("documents").await.unwrap(), 4);
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/documents/_count")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let err = client(&server).count("documents").await.unwrap_err();
    assert!(matches!(err, EngineError::Status { status: 500, ref body } if body == "boom"));
}

#[tokio::test]
async fn test_supervisor_connects_and_provisions() {
    let mut server = Server::new_async().await;
    let ping = server
        .mock("HEAD", "/")
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("GET", "/_cluster/health")
        .with_status(200)
        .with_body(r#"{"cluster_name":"docker-cluster","status":"yellow"}"#)
        .create_async()
        .await;
    server
        .mock("HEAD", "/documents")
        .with_status(404)
        .create_async()
        .await;
    let create = server
        .mock("PUT", "/documents")
        .with_status(200)
        .with_body(r#"{"acknowledged":true}"#)
        .expect(1)
        .create_async()
        .await;

    let supervisor = ConnectionSupervisor::new(
        Arc::new(client(&server)),
        "documents",
        RetryPolicy::new(3, Duration::from_millis(10)),
    );
    supervisor.connect().await.unwrap();
    // already connected: no further traffic
    supervisor.acquire().await.unwrap();

    ping.assert_async().await;
    create.assert_async().await;
}

#[tokio::test]
async fn test_supervisor_refuses_red_cluster() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", "/")
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("GET", "/_cluster/health")
        .with_status(200)
        .with_body(r#"{"status":"red"}"#)
        .create_async()
        .await;

    let supervisor = ConnectionSupervisor::new(
        Arc::new(client(&server)),
        "documents",
        RetryPolicy::new(2, Duration::from_millis(10)),
    );
    let err = supervisor.connect().await.err().unwrap();
    assert!(matches!(err, EngineError::Unavailable(_)));
    assert!(!supervisor.is_connected());
}
