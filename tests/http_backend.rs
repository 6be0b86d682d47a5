use serde_json::json;
use transcript_notes_lib::api::{
    AnnotationBackend, AnnotationOperation, ApiError, AttachmentFile, CaptureControl, HttpBackend,
    SegmentSource,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&server.uri(), None, None).unwrap()
}

#[tokio::test]
async fn test_fetch_segments_decodes_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "S1",
                "audio_url": "https://bucket.s3.amazonaws.com/audio_1.m4a",
                "text": "good morning everyone",
                "comments": [{"id": "A1", "text": "great point", "attachments": []}]
            },
            {
                "id": "S2",
                "audio_url": "https://bucket.s3.amazonaws.com/audio_2.m4a",
                "text": "let's begin"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let segments = backend(&server).await.fetch_segments().await.unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].annotations[0].id, "A1");
    assert!(segments[1].annotations.is_empty());
}

#[tokio::test]
async fn test_fetch_segments_maps_status_and_body_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transcriptions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    let backend = backend(&server).await;

    assert_eq!(
        backend.fetch_segments().await.unwrap_err(),
        ApiError::BackendRejected {
            status: 503,
            body: "warming up".to_string()
        }
    );
    assert!(matches!(
        backend.fetch_segments().await.unwrap_err(),
        ApiError::DecodeFailure(_)
    ));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_failure() {
    let backend = HttpBackend::new("http://127.0.0.1:9", None, None).unwrap();

    let err = backend.fetch_segments().await.unwrap_err();

    assert!(matches!(err, ApiError::TransportFailure(_)));
}

#[tokio::test]
async fn test_create_posts_multipart_and_returns_server_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/S1/comments"))
        .and(body_string_contains("name=\"text\""))
        .and(body_string_contains("great point"))
        .and(body_string_contains("filename=\"notes.txt\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "A1",
            "text": "great point",
            "attachments": ["https://files.example.test/notes.txt"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = vec![AttachmentFile::new("notes.txt", b"agenda".to_vec()).with_mime("text/plain")];
    let created = backend(&server)
        .await
        .create("S1", "great point", &files)
        .await
        .unwrap();

    assert_eq!(created.id, "A1");
    assert_eq!(
        created.attachments,
        vec!["https://files.example.test/notes.txt".to_string()]
    );
}

#[tokio::test]
async fn test_update_puts_to_segment_comments_with_id_field() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/S1/comments"))
        .and(body_string_contains("name=\"id\""))
        .and(body_string_contains("A1"))
        .and(body_string_contains("reworded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "A1",
            "text": "reworded"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = backend(&server)
        .await
        .update("S1", "A1", "reworded", &[])
        .await
        .unwrap();

    assert_eq!(updated.text, "reworded");
    assert!(updated.attachments.is_empty());
}

#[tokio::test]
async fn test_delete_failure_names_operation_and_target() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/S1/comments/A1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server).await.delete("S1", "A1").await.unwrap_err();

    assert_eq!(err.operation, AnnotationOperation::Delete);
    assert_eq!(err.target, "A1");
    assert!(matches!(err.source, ApiError::BackendRejected { status: 404, .. }));
}

#[tokio::test]
async fn test_create_failure_targets_segment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/S9/comments"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = backend(&server)
        .await
        .create("S9", "hello", &[])
        .await
        .unwrap_err();

    assert_eq!(err.operation, AnnotationOperation::Create);
    assert_eq!(err.target, "S9");
}

#[tokio::test]
async fn test_comments_can_live_on_a_separate_host() {
    let transcripts = MockServer::start().await;
    let comments = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/S1/comments/A1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&comments)
        .await;

    let comments_url = format!("{}/", comments.uri());
    let backend = HttpBackend::new(&transcripts.uri(), Some(comments_url.as_str()), None).unwrap();

    backend.delete("S1", "A1").await.unwrap();
}

#[tokio::test]
async fn test_capture_control_and_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/startListening"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Listening..."))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stopListening"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/conversation-summary"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"summary": "Team agreed on scope."})),
        )
        .mount(&server)
        .await;
    let backend = backend(&server).await;

    backend.start_listening().await.unwrap();
    assert!(matches!(
        backend.stop_listening().await.unwrap_err(),
        ApiError::BackendRejected { status: 500, .. }
    ));
    assert_eq!(
        backend.conversation_summary().await.unwrap(),
        "Team agreed on scope."
    );
}
