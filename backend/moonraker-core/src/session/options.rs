use crate::correlator::DEFAULT_RPC_TIMEOUT;
use crate::http_client::DEFAULT_HTTP_TIMEOUT;
use crate::readiness::ReadinessPolicy;

use models::ObjectSubscription;

use std::time::Duration;

pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Timings and toggles for one session. `Default` matches production values.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub rpc_timeout: Duration,
    pub http_timeout: Duration,
    pub readiness: ReadinessPolicy,
    /// How long [`MoonrakerSession::shutdown`](super::MoonrakerSession::shutdown)
    /// waits for the peer to acknowledge the close frame.
    pub close_grace: Duration,
    pub probe_reachability: bool,
    pub subscription: ObjectSubscription,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            readiness: ReadinessPolicy::default(),
            close_grace: DEFAULT_CLOSE_GRACE,
            probe_reachability: true,
            subscription: ObjectSubscription::default(),
        }
    }
}
