//! End-to-end binding tests.
//!
//! Views are registered through [`Bindery`] and driven with in-memory
//! requests, checking both the values a handler receives and the error list
//! returned when binding fails.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bindery::core::ParamDecl;
use bindery::prelude::*;
use bytes::Bytes;
use http::{Response, StatusCode};
use proptest::prelude::*;
use serde_json::{json, Value};

fn echo(args: Values) -> Response<Bytes> {
    JsonResponse::new(args.into_json()).into_response()
}

fn body_json(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

fn get(uri: &str) -> RequestParts {
    RequestParts::builder().uri(uri).build()
}

#[test]
fn scalar_query_fields_are_coerced() {
    let mut app = Bindery::setup("http").unwrap();
    let sig = Signature::new("search")
        .param("q", FieldType::String, Query::required())
        .param("page", FieldType::Integer, Query::required())
        .param("ratio", FieldType::Number, Query::required())
        .param("exact", FieldType::Boolean, Query::required());
    let view = app
        .view(ViewOptions::new().path("/search").method("GET"), &sig, echo)
        .unwrap();

    let response = view.call(&get("/search?q=lamp&page=3&ratio=0.5&exact=true"), Values::new());
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(&response),
        json!({"q": "lamp", "page": 3, "ratio": 0.5, "exact": true})
    );
}

#[test]
fn missing_required_field_short_circuits() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let mut app = Bindery::setup("http").unwrap();
    let sig = Signature::new("search")
        .param("q", FieldType::String, Query::required())
        .param("page", FieldType::Integer, Query::default_value(1));
    let view = app
        .view(ViewOptions::new().path("/search").method("GET"), &sig, |args: Values| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            echo(args)
        })
        .unwrap();

    let errors = view.bind(&get("/search?page=2")).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].loc, ["query", "q"]);
    assert_eq!(errors[0].error_type, "value_error.missing");

    let response = view.call(&get("/search?page=2"), Values::new());
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(&response),
        json!([{"loc": ["query", "q"], "msg": "field required", "type": "value_error.missing"}])
    );
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);
}

#[test]
fn ge_constraint_round_trip() {
    let mut app = Bindery::setup("http").unwrap();
    let sig = Signature::new("check")
        .param("a", FieldType::Integer, Query::required().ge(100.0))
        .param("b", FieldType::String, Query::required());
    let view = app
        .view(ViewOptions::new().path("/check").method("GET"), &sig, echo)
        .unwrap();

    let values = view.bind(&get("/check?a=150&b=x")).unwrap();
    assert_eq!(values.into_json(), json!({"a": 150, "b": "x"}));

    let errors = view.bind(&get("/check?a=50&b=x")).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].loc, ["query", "a"]);
    assert_eq!(errors[0].error_type, "value_error.number.not_ge");
    assert_eq!(errors[0].ctx, Some(json!({"limit_value": 100})));
}

#[test]
fn sequence_and_scalar_accessors() {
    let mut app = Bindery::setup("http").unwrap();
    let sig = Signature::new("filter")
        .param("tags", FieldType::array(FieldType::String), Query::required())
        .param("name", FieldType::String, Query::required());
    let view = app
        .view(ViewOptions::new().path("/filter").method("GET"), &sig, echo)
        .unwrap();

    let single = view.bind(&get("/filter?tags=red&name=a&name=b")).unwrap();
    assert_eq!(single.into_json(), json!({"tags": ["red"], "name": "a"}));

    let many = view.bind(&get("/filter?tags=red&tags=blue&name=a")).unwrap();
    assert_eq!(many.raw("tags"), Some(&json!(["red", "blue"])));
}

#[test]
fn every_source_kind_binds() {
    let mut app = Bindery::setup("http").unwrap();
    let sig = Signature::new("update_item")
        .param("item_id", FieldType::Integer, Path::required())
        .param("x_request_id", FieldType::String, Header::required())
        .param("session", FieldType::String, Cookie::required())
        .param("dry_run", FieldType::Boolean, Query::default_value(false))
        .param("name", FieldType::String, Body::required().min_length(1))
        .param("price", FieldType::Number, Body::required().gt(0.0));
    let view = app
        .view(ViewOptions::new().path("/items/{item_id}").method("PUT"), &sig, echo)
        .unwrap();

    let req = RequestParts::builder()
        .method(http::Method::PUT)
        .uri("/items/42")
        .path_param("item_id", "42")
        .header("X-Request-Id", "abc")
        .header("Cookie", "session=s1; theme=dark")
        .json(&json!({"name": "lamp", "price": 9.5}))
        .build();

    assert_eq!(
        view.bind(&req).unwrap().into_json(),
        json!({
            "item_id": 42,
            "x_request_id": "abc",
            "session": "s1",
            "dry_run": false,
            "name": "lamp",
            "price": 9.5
        })
    );
}

#[test]
fn errors_from_several_sources_are_all_reported() {
    let mut app = Bindery::setup("http").unwrap();
    let sig = Signature::new("create")
        .param("token", FieldType::String, Header::required())
        .param("name", FieldType::String, Body::required())
        .param("qty", FieldType::Integer, Body::required().le(10.0));
    let view = app
        .view(ViewOptions::new().path("/orders").method("POST"), &sig, echo)
        .unwrap();

    let req = RequestParts::builder()
        .method(http::Method::POST)
        .uri("/orders")
        .json(&json!({"qty": 11}))
        .build();
    let errors = view.bind(&req).unwrap_err();
    let locs: Vec<_> = errors.iter().map(|e| e.loc.join(".")).collect();
    assert_eq!(locs, ["header.token", "body.name", "body.qty"]);
}

#[test]
fn form_fields_bind_from_urlencoded_body() {
    let mut app = Bindery::setup("http").unwrap();
    let sig = Signature::new("login")
        .param("username", FieldType::String, Form::required())
        .param("remember", FieldType::Boolean, Form::default_value(false));
    let view = app
        .view(ViewOptions::new().path("/login").method("POST"), &sig, echo)
        .unwrap();

    let req = RequestParts::builder()
        .method(http::Method::POST)
        .uri("/login")
        .form("username=ada&remember=1")
        .build();
    assert_eq!(
        view.bind(&req).unwrap().into_json(),
        json!({"username": "ada", "remember": true})
    );
}

#[test]
fn query_mode_binds_query_and_passes_untyped_through() {
    let mut app = Bindery::setup("query").unwrap();
    let sig = Signature::new("v")
        .param("q", FieldType::String, Query::required())
        .untyped("name");
    let view = app.view(ViewOptions::new().path("/v").method("GET"), &sig, echo).unwrap();

    assert_eq!(view.meta().schema().fields().len(), 1);
    assert_eq!(view.meta().manager().passthrough(), ["name"]);

    let body_sig = Signature::new("b").param("name", FieldType::String, Body::required());
    let err = app
        .view(ViewOptions::new().path("/b").method("POST"), &body_sig, echo)
        .unwrap_err();
    assert!(matches!(err, RegistrationError::UnsupportedDescriptor { .. }));

    let args: Values = [("name".to_owned(), json!("from-framework"))].into_iter().collect();
    let response = view.call(&get("/v?q=x"), args);
    assert_eq!(body_json(&response), json!({"name": "from-framework", "q": "x"}));
}

#[test]
fn custom_error_handler_from_setup() {
    let handler = error_handler_fn(|view: &bindery::router::ViewMeta, errors: Vec<FieldError>| {
        JsonResponse::new(json!({"view": view.name(), "count": errors.len()}))
            .with_status(StatusCode::BAD_REQUEST)
            .into_response()
    });
    let setup = Setup::from_mode("http").unwrap().with_error_handler(Arc::new(handler));
    let mut app = Bindery::with_setup(setup).unwrap();
    let sig = Signature::new("needs_q").param("q", FieldType::String, Query::required());
    let view = app.view(ViewOptions::new().path("/q").method("GET"), &sig, echo).unwrap();

    let response = view.call(&get("/q"), Values::new());
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&response), json!({"view": "needs_q", "count": 1}));
}

#[test]
fn registration_errors_abort() {
    let mut app = Bindery::setup("http").unwrap();
    let sig = Signature::new("v").param("q", FieldType::String, Query::required());
    app.view(ViewOptions::new().path("/v").method("GET"), &sig, echo).unwrap();

    let err = app
        .view(ViewOptions::new().path("/v").method("GET"), &sig, echo)
        .unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateRoute { .. }));

    let no_default = Signature::new("bad").push(ParamDecl {
        name: "q".to_owned(),
        ty: Some(FieldType::String),
        default: None,
    });
    let err = app
        .view(ViewOptions::new().path("/bad").method("GET"), &no_default, echo)
        .unwrap_err();
    assert!(matches!(err, RegistrationError::MissingDefault { .. }));
    assert_eq!(app.registry().len(), 1);
}

proptest! {
    #[test]
    fn integer_query_values_coerce(n in any::<i64>()) {
        let mut app = Bindery::setup("http").unwrap();
        let sig = Signature::new("n").param("n", FieldType::Integer, Query::required());
        let view = app.view(ViewOptions::new().path("/n").method("GET"), &sig, echo).unwrap();

        let values = view.bind(&get(&format!("/n?n={n}"))).unwrap();
        prop_assert_eq!(values.get::<i64>("n").unwrap(), n);
    }

    #[test]
    fn ge_bound_is_inclusive(a in 0i64..200) {
        let mut app = Bindery::setup("http").unwrap();
        let sig = Signature::new("a").param("a", FieldType::Integer, Query::required().ge(100.0));
        let view = app.view(ViewOptions::new().path("/a").method("GET"), &sig, echo).unwrap();

        let result = view.bind(&get(&format!("/a?a={a}")));
        prop_assert_eq!(result.is_ok(), a >= 100);
    }
}
