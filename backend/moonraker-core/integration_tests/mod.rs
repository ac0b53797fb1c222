mod error;
mod http_client;
mod session;
