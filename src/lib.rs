//! Flare Discovery Core Library
//!
//! Consul-backed service registration and name resolution for gRPC clients:
//! target parsing, long-poll watching with backoff, address snapshots for
//! tonic load-balanced channels, and a scheme-keyed resolver plugin registry.

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod registry;
pub mod retry;

// Re-exports
pub use client::{ClientBuilder, ConsulClient, HealthQuery, HealthResponse, RegistryClient};
pub use config::{ClientOptions, Config, LoggingConfig, WatchConfig};
pub use discovery::{
    AddressSet, BalanceChannelSink, CheckStatus, NetworkAddress, Resolver, ResolverBuilder,
    ResolverHandle, ResolverPlugin, ResolverState, SchemeRegistry, ServiceEntry, StateSink,
    Target, WatchSink, WatchState, Watcher, connect_balanced,
};
pub use error::{DiscoveryError, ErrorBuilder, ErrorCategory, ErrorCode, Result};
pub use logging::init_logging;
pub use registry::{
    CheckKind, HealthCheckDescriptor, Registrar, ServiceInstanceDescriptor, ServiceRegistration,
};
pub use retry::{ExponentialBackoffPolicy, FixedRetryPolicy, RetryPolicy};
