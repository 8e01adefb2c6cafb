//! Bind metrics recorded through a scoped Prometheus recorder.

use std::sync::Arc;

use bindery::prelude::*;
use bytes::Bytes;
use http::Response;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;

fn echo(args: Values) -> Response<Bytes> {
    JsonResponse::new(args.into_json()).into_response()
}

#[test]
fn bind_outcomes_and_dependency_calls_are_counted() {
    let shared: Arc<dyn Dependency> = Arc::new(dependency_fn(
        "current_user",
        Signature::new("current_user"),
        |_: &Values| Ok(json!("ada")),
    ));
    let sig = Signature::new("search")
        .param("q", FieldType::String, Query::required())
        .depends("user", Depends::from_arc(Arc::clone(&shared)))
        .depends("again", Depends::from_arc(shared));

    let mut app = Bindery::setup("http").unwrap();
    let view = app
        .view(ViewOptions::new().path("/search").method("GET"), &sig, echo)
        .unwrap();

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::with_local_recorder(&recorder, || {
        view.bind(&RequestParts::builder().uri("/search?q=a").build()).unwrap();
        view.bind(&RequestParts::builder().uri("/search").build()).unwrap_err();
    });

    let rendered = handle.render();
    assert!(rendered.contains(r#"bindery_bind_total{view="search",outcome="ok"} 1"#), "{rendered}");
    assert!(rendered.contains(r#"bindery_bind_total{view="search",outcome="invalid"} 1"#), "{rendered}");
    assert!(rendered.contains(r#"bindery_bind_errors_total{view="search",kind="query"} 1"#), "{rendered}");
    assert!(
        rendered.contains(r#"bindery_dependency_calls_total{dependency="current_user"} 2"#),
        "{rendered}"
    );
    assert!(
        rendered.contains(r#"bindery_dependency_cache_hits_total{dependency="current_user"} 2"#),
        "{rendered}"
    );
}
