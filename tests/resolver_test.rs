//! Resolver 生命周期、插件注册表和负载均衡 Channel 测试

mod common;

use common::{BlockingSink, RecordingSink, ScriptedClient, addresses, entry, response};
use flare_discovery_core::{
    BalanceChannelSink, ClientOptions, ErrorCode, FixedRetryPolicy, ResolverBuilder,
    ResolverHandle, ResolverPlugin, ResolverState, SchemeRegistry, StateSink, WatchSink,
    connect_balanced,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 模拟注册中心：每次查询延迟返回，避免测试中空转
async fn mock_registry(service: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/health/service/{}", service)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Consul-Index", "11")
                .set_body_json(json!([
                    {
                        "Node": { "Address": "10.0.0.1" },
                        "Service": {
                            "ID": "hello-127.0.0.1-50051",
                            "Service": service,
                            "Tags": [service],
                            "Address": "127.0.0.1",
                            "Port": 50051
                        },
                        "Checks": [{ "Status": "passing" }]
                    }
                ]))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;
    server
}

fn consul_target(server: &MockServer, service: &str) -> String {
    format!("consul://127.0.0.1:{}/{}", server.address().port(), service)
}

#[tokio::test]
async fn test_resolver_lifecycle() {
    let client = Arc::new(ScriptedClient::new(vec![response(3, vec![entry("10.0.0.1", 9000)])]));
    let sink = Arc::new(RecordingSink::default());
    let drained = client.drained.clone();

    let builder = ResolverBuilder::new().with_retry_policy(Arc::new(FixedRetryPolicy::new(Duration::ZERO)));
    let target = builder.parse_target("consul://localhost:8500/svc").unwrap();
    let resolver = builder.build_with_client(target, client.clone(), sink.clone()).unwrap();

    assert_eq!(resolver.state(), ResolverState::Watching);
    assert_eq!(resolver.target().service_name(), "svc");

    drained.notified().await;
    resolver.resolve_now();
    assert_eq!(resolver.state(), ResolverState::Watching);

    resolver.close();
    resolver.close();
    assert_eq!(resolver.state(), ResolverState::Closed);

    let state = resolver.shutdown().await.unwrap();
    assert_eq!(state.last_index(), 3);
    assert_eq!(sink.snapshots(), vec![addresses(&[("10.0.0.1", 9000)])]);
    // 首次查询 + 挂起的第二次查询，resolve_now 不会触发额外查询
    assert_eq!(client.queries().len(), 2);
}

#[tokio::test]
async fn test_resolver_builds_against_registry() {
    let server = mock_registry("hello").await;
    let (sink, mut rx) = WatchSink::channel();

    let builder = ResolverBuilder::new()
        .with_options(ClientOptions::default().with_interval(Duration::from_secs(1)));
    let resolver = builder.build(&consul_target(&server, "hello"), Arc::new(sink)).unwrap();

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("snapshot should arrive")
        .unwrap();
    assert_eq!(*rx.borrow(), addresses(&[("127.0.0.1", 50051)]));

    let state = resolver.shutdown().await.unwrap();
    assert!(state.last_index() >= 11);
}

#[test]
fn test_build_rejects_invalid_targets() {
    let builder = ResolverBuilder::new();

    let cases = [
        ("", ErrorCode::MissingAddress),
        ("consul://", ErrorCode::MissingAddress),
        ("consul://localhost:8500", ErrorCode::InvalidUri),
        ("consul://localhost:99999/hello", ErrorCode::InvalidUri),
        ("dns://localhost:8500/hello", ErrorCode::UnsupportedScheme),
    ];
    for (raw, code) in cases {
        let (sink, _rx) = WatchSink::channel();
        match builder.build(raw, Arc::new(sink)) {
            Ok(_) => panic!("target {raw:?} should be rejected"),
            Err(err) => assert_eq!(err.code(), code, "target {raw:?}"),
        }
    }
}

#[test]
fn test_build_outside_runtime_fails() {
    let (sink, _rx) = WatchSink::channel();
    match ResolverBuilder::new().build("consul://localhost:8500/hello", Arc::new(sink)) {
        Ok(_) => panic!("resolver should require a runtime"),
        Err(err) => assert_eq!(err.code(), ErrorCode::InternalError),
    }
}

#[tokio::test]
async fn test_scheme_registry_dispatch() {
    let server = mock_registry("orders").await;

    let mut registry = SchemeRegistry::new();
    assert!(registry.register(Arc::new(ResolverBuilder::new())).is_none());
    assert!(registry.register(Arc::new(ResolverBuilder::new())).is_some());
    assert_eq!(registry.schemes(), vec!["consul".to_string()]);
    assert_eq!(registry.get("CONSUL").unwrap().scheme(), "consul");

    let (sink, mut rx) = WatchSink::channel();
    let handle = registry
        .build(&consul_target(&server, "orders"), Arc::new(sink))
        .unwrap();
    assert_eq!(handle.state(), ResolverState::Watching);

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("snapshot should arrive")
        .unwrap();
    assert_eq!(rx.borrow().len(), 1);

    handle.resolve_now();
    handle.close();
    assert_eq!(handle.state(), ResolverState::Closed);

    let (sink, _rx) = WatchSink::channel();
    match registry.build("etcd://localhost:2379/orders", Arc::new(sink)) {
        Ok(_) => panic!("unknown scheme should be rejected"),
        Err(err) => assert_eq!(err.code(), ErrorCode::UnsupportedScheme),
    }

    let (sink, _rx) = WatchSink::channel();
    match registry.build("localhost:8500/orders", Arc::new(sink)) {
        Ok(_) => panic!("uri without scheme should be rejected"),
        Err(err) => assert_eq!(err.code(), ErrorCode::InvalidUri),
    }
}

#[tokio::test]
async fn test_watch_sink_without_receivers() {
    let (sink, rx) = WatchSink::channel();
    drop(rx);
    let err = sink
        .update_addresses(&addresses(&[("10.0.0.1", 9000)]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::SinkUnavailable);
}

#[tokio::test]
async fn test_balance_sink_diffs_snapshots() {
    let (_channel, sink) = BalanceChannelSink::balance_channel(16, Some(Duration::from_secs(1)));

    sink.update_addresses(&addresses(&[("127.0.0.1", 50051), ("127.0.0.1", 50052)]))
        .await
        .unwrap();
    assert_eq!(
        sink.applied().await,
        addresses(&[("127.0.0.1", 50051), ("127.0.0.1", 50052)])
    );

    sink.update_addresses(&addresses(&[("127.0.0.1", 50052)])).await.unwrap();
    assert_eq!(sink.applied().await, addresses(&[("127.0.0.1", 50052)]));

    // 相同快照不产生任何变化
    sink.update_addresses(&addresses(&[("127.0.0.1", 50052)])).await.unwrap();
    assert_eq!(sink.applied().await, addresses(&[("127.0.0.1", 50052)]));
}

#[tokio::test]
async fn test_connect_balanced() {
    let server = mock_registry("hello").await;
    let builder = ResolverBuilder::new()
        .with_options(ClientOptions::default().with_interval(Duration::from_secs(1)));

    let (_channel, resolver) =
        connect_balanced(&builder, &consul_target(&server, "hello"), Duration::from_secs(1)).unwrap();
    assert_eq!(resolver.state(), ResolverState::Watching);
    assert_eq!(resolver.target().service_name(), "hello");
    resolver.shutdown().await.unwrap();

    match connect_balanced(&builder, "consul://localhost:8500", Duration::from_secs(1)) {
        Ok(_) => panic!("invalid target should be rejected"),
        Err(err) => assert_eq!(err.code(), ErrorCode::InvalidUri),
    }
}

#[tokio::test]
async fn test_close_interrupts_blocked_push() {
    let client = Arc::new(ScriptedClient::new(vec![response(1, vec![entry("10.0.0.1", 9000)])]));
    let sink = Arc::new(BlockingSink::default());
    let started = sink.started.clone();

    let builder = ResolverBuilder::new();
    let target = builder.parse_target("localhost/svc").unwrap();
    let resolver = builder.build_with_client(target, client, sink).unwrap();

    started.notified().await;
    resolver.close();

    let state = tokio::time::timeout(Duration::from_secs(3), resolver.shutdown())
        .await
        .expect("watcher should stop after close")
        .unwrap();
    assert_eq!(state.last_index(), 1);
    assert_eq!(state.addresses(), &addresses(&[("10.0.0.1", 9000)]));
}

#[tokio::test]
async fn test_close_with_full_balance_channel() {
    // 地址数超过 Channel 缓冲区，且没有请求驱动 Channel 消费事件
    let entries = (0..100u16).map(|i| entry("10.0.0.1", 9000 + i)).collect();
    let client = Arc::new(ScriptedClient::new(vec![response(1, entries)]));
    let (_channel, sink) = BalanceChannelSink::balance_channel(64, Some(Duration::from_secs(1)));

    let builder = ResolverBuilder::new();
    let target = builder.parse_target("localhost/svc").unwrap();
    let resolver = builder.build_with_client(target, client, Arc::new(sink)).unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    resolver.close();

    let state = tokio::time::timeout(Duration::from_secs(3), resolver.shutdown())
        .await
        .expect("watcher should stop after close")
        .unwrap();
    assert_eq!(state.addresses().len(), 100);
}
