//! Blocking and cooperative binding must agree: the same request content
//! yields the same values and the same errors, whether it arrives buffered
//! or as a chunked body stream.

use bindery::extract::MultiMap;
use bindery::prelude::*;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Response, Uri};
use proptest::prelude::*;
use serde_json::{json, Value};

fn echo(args: Values) -> Response<Bytes> {
    JsonResponse::new(args.into_json()).into_response()
}

fn signature() -> Signature {
    let auth = dependency_fn(
        "auth",
        Signature::new("auth").param("authorization", FieldType::String, Header::required()),
        |args: &Values| Ok(json!({"user": args.raw("authorization").cloned()})),
    );
    Signature::new("update")
        .param("item_id", FieldType::Integer, Path::required())
        .param("tags", FieldType::array(FieldType::String), Query::default_value(json!([])))
        .param("session", FieldType::String, Cookie::optional())
        .param("name", FieldType::String, Body::required().min_length(1))
        .param("qty", FieldType::Integer, Body::default_value(1).ge(1.0).le(99.0))
        .depends("auth", Depends::new(auth))
}

fn views() -> (std::sync::Arc<View>, std::sync::Arc<AsyncView>) {
    let mut app = Bindery::setup("http").unwrap();
    let sig = signature();
    let blocking = app
        .view(ViewOptions::new().path("/sync/{item_id}").method("PUT"), &sig, echo)
        .unwrap();
    let cooperative = app
        .async_view(
            ViewOptions::new().path("/async/{item_id}").method("PUT"),
            &sig,
            |args: Values| async move { echo(args) },
        )
        .unwrap();
    (blocking, cooperative)
}

struct Case {
    uri: &'static str,
    item_id: &'static str,
    headers: Vec<(&'static str, &'static str)>,
    body: Option<Value>,
}

impl Case {
    fn buffered(&self) -> RequestParts {
        let mut builder = RequestParts::builder()
            .method(Method::PUT)
            .uri(self.uri)
            .path_param("item_id", self.item_id);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        match &self.body {
            Some(body) => builder.json(body).build(),
            None => builder.build(),
        }
    }

    fn streamed(&self, chunk_size: usize) -> StreamingRequest {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            headers.append(*name, HeaderValue::from_static(*value));
        }
        let mut chunks = Vec::new();
        if let Some(body) = &self.body {
            headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            let bytes = serde_json::to_vec(body).unwrap();
            chunks = bytes
                .chunks(chunk_size.max(1))
                .map(Bytes::copy_from_slice)
                .collect();
        }
        let uri: Uri = self.uri.parse().unwrap();
        StreamingRequest::from_chunks(Method::PUT, uri, headers, chunks)
            .with_path_params(MultiMap::from_pairs([("item_id", self.item_id)]))
    }
}

fn cases() -> Vec<Case> {
    vec![
        Case {
            uri: "/x/7?tags=a&tags=b",
            item_id: "7",
            headers: vec![("authorization", "Bearer t"), ("cookie", "session=s1")],
            body: Some(json!({"name": "lamp", "qty": 3})),
        },
        Case {
            uri: "/x/7",
            item_id: "7",
            headers: vec![("authorization", "Bearer t")],
            body: Some(json!({"name": "lamp"})),
        },
        Case {
            uri: "/x/seven",
            item_id: "seven",
            headers: vec![],
            body: Some(json!({"name": "", "qty": 100})),
        },
        Case {
            uri: "/x/1?tags=only",
            item_id: "1",
            headers: vec![("authorization", "Bearer t")],
            body: None,
        },
    ]
}

#[tokio::test]
async fn buffered_and_streamed_requests_bind_identically() {
    let (blocking, cooperative) = views();
    for case in cases() {
        let expected = blocking.bind(&case.buffered());
        let from_buffer = cooperative.bind(&case.buffered()).await;
        let from_stream = cooperative.bind(&case.streamed(4)).await;
        assert_eq!(expected, from_buffer, "{}", case.uri);
        assert_eq!(expected, from_stream, "{}", case.uri);
    }
}

#[tokio::test]
async fn handler_responses_match() {
    let (blocking, cooperative) = views();
    for case in cases() {
        let sync_response = blocking.call(&case.buffered(), Values::new());
        let async_response = cooperative.call(&case.streamed(3), Values::new()).await;
        assert_eq!(sync_response.status(), async_response.status(), "{}", case.uri);
        assert_eq!(sync_response.body(), async_response.body(), "{}", case.uri);
    }
}

#[test]
fn first_case_binds_every_source() {
    let (blocking, _) = views();
    let values = blocking.bind(&cases()[0].buffered()).unwrap();
    assert_eq!(
        values.into_json(),
        json!({
            "item_id": 7,
            "tags": ["a", "b"],
            "session": "s1",
            "name": "lamp",
            "qty": 3,
            "auth": {"user": "Bearer t"}
        })
    );
}

#[test]
fn invalid_case_collects_every_error() {
    let (blocking, _) = views();
    let errors = blocking.bind(&cases()[2].buffered()).unwrap_err();
    let locs: Vec<_> = errors.iter().map(|e| e.loc.join(".")).collect();
    assert_eq!(
        locs,
        ["path.item_id", "body.name", "body.qty", "header.authorization"]
    );
}

proptest! {
    #[test]
    fn chunking_never_changes_the_result(chunk_size in 1usize..64, qty in -5i64..120) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (blocking, cooperative) = views();
        let case = Case {
            uri: "/x/3",
            item_id: "3",
            headers: vec![("authorization", "Bearer t")],
            body: Some(json!({"name": "n", "qty": qty})),
        };
        let expected = blocking.bind(&case.buffered());
        let streamed = rt.block_on(cooperative.bind(&case.streamed(chunk_size)));
        prop_assert_eq!(expected.is_ok(), (1..=99).contains(&qty));
        prop_assert_eq!(expected, streamed);
    }
}
