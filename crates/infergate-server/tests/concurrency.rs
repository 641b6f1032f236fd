#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use axum::http::StatusCode;
use futures_util::future::join_all;
use tower::ServiceExt;

use common::*;
use infergate_server::obs::metrics::LATENCY_BUCKETS_SECONDS;

const N: usize = 1000;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_predicts_lose_no_updates() {
    let state = iris_state();
    let router = app(&state);

    let tasks = (0..N).map(|i| {
        let router = router.clone();
        tokio::spawn(async move {
            // Every tenth request is invalid and must not be counted.
            let req = if i % 10 == 0 {
                post_predict(r#"{"sepal_length":5.1}"#)
            } else {
                post_predict(SETOSA)
            };
            router.oneshot(req).await.unwrap().status()
        })
    });
    let statuses: Vec<StatusCode> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let ok = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let rejected = statuses
        .iter()
        .filter(|s| **s == StatusCode::UNPROCESSABLE_ENTITY)
        .count();
    assert_eq!(ok, N - N / 10);
    assert_eq!(rejected, N / 10);

    let m = state.metrics();
    assert_eq!(m.requests.get(), ok as u64);
    assert_eq!(m.rejected.get(), rejected as u64);

    let snap = m.latency.snapshot();
    assert_eq!(snap.count, ok as u64);
    for w in snap.buckets.windows(2) {
        assert!(w[0] <= w[1]);
    }
    assert!(snap.buckets[LATENCY_BUCKETS_SECONDS.len() - 1] <= snap.count);

    // The exported text agrees with the registry.
    let (_, resp) = send(router, get("/metrics")).await;
    let text = body_text(resp).await;
    assert_eq!(
        sample(&text, "inference_requests_total"),
        Some(ok.to_string())
    );
    assert_eq!(
        sample(&text, "inference_request_latency_seconds_count"),
        Some(ok.to_string())
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scrapes_during_load_stay_consistent() {
    let state = stub_state(Behavior::Class(1));
    let router = app(&state);

    let writers = (0..200).map(|_| {
        let router = router.clone();
        tokio::spawn(async move { router.oneshot(post_predict(SETOSA)).await.unwrap().status() })
    });
    let readers = (0..50).map(|_| {
        let router = router.clone();
        tokio::spawn(async move {
            let resp = router.oneshot(get("/metrics")).await.unwrap();
            let text = body_text(resp).await;
            let inf: u64 = sample(&text, "inference_request_latency_seconds_bucket{le=\"+Inf\"}")
                .unwrap()
                .parse()
                .unwrap();
            let count: u64 = sample(&text, "inference_request_latency_seconds_count")
                .unwrap()
                .parse()
                .unwrap();
            let top: u64 = sample(&text, "inference_request_latency_seconds_bucket{le=\"5.0\"}")
                .unwrap()
                .parse()
                .unwrap();
            assert_eq!(inf, count);
            assert!(top <= count);
        })
    });

    let (w, r) = tokio::join!(join_all(writers), join_all(readers));
    for s in w {
        assert_eq!(s.unwrap(), StatusCode::OK);
    }
    for res in r {
        res.unwrap();
    }
    assert_eq!(state.metrics().requests.get(), 200);
}
