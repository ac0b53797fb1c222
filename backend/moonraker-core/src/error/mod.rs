pub mod config;
pub mod http_client;
pub mod readiness;
pub mod rpc;
pub mod transport;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    HttpClient(#[from] http_client::HttpClientError),

    #[error(transparent)]
    Transport(#[from] transport::TransportError),

    #[error(transparent)]
    Rpc(#[from] rpc::RpcError),

    #[error(transparent)]
    Readiness(#[from] readiness::ReadinessError),
}
