//! 真实 Consul 集成测试
//!
//! 需要运行中的 Consul agent，默认忽略，使用 `cargo test --test consul_live_test -- --ignored` 运行。
//!
//! 启动 Consul：
//! ```bash
//! docker run -d --name consul-test -p 8500:8500 hashicorp/consul:1.17 agent -dev -client=0.0.0.0
//! ```

use flare_discovery_core::{
    ClientBuilder, ClientOptions, HealthQuery, Registrar, RegistryClient, ServiceInstanceDescriptor,
};
use std::sync::Arc;
use std::time::Duration;

/// Consul 地址，可以通过环境变量 CONSUL_ADDR 覆盖
fn consul_addr() -> String {
    std::env::var("CONSUL_ADDR").unwrap_or_else(|_| "127.0.0.1:8500".to_string())
}

#[tokio::test]
#[ignore]
async fn test_register_query_deregister() {
    let options = ClientOptions::default().with_interval(Duration::from_secs(1));
    let client = Arc::new(ClientBuilder::new(consul_addr()).options(options).build().unwrap());
    let registrar = Registrar::with_client(client.clone());

    let descriptor = ServiceInstanceDescriptor::new("flaretest", "127.0.0.1", 59051)
        .with_health_check_interval(Duration::from_secs(30));
    let registration = registrar.register_with_http_check(&descriptor).await.unwrap();

    // 新注册的实例在第一次检查前处于 critical，因此不过滤健康状态
    let query = HealthQuery::new("flaretest")
        .with_tag("flaretest")
        .with_passing_only(false);
    let response = client.health_service(&query).await.unwrap();
    assert!(response.index > 0);
    assert!(response.entries.iter().any(|e| e.id == registration.id));

    registrar.deregister(&registration.id).await.unwrap();

    let response = client.health_service(&query).await.unwrap();
    assert!(response.entries.iter().all(|e| e.id != registration.id));
}
