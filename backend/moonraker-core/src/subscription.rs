use crate::PRINTER_OBJECTS_SUBSCRIBE_METHOD;
use crate::correlator::Correlator;
use crate::error::rpc::RpcError;
use crate::transport::FrameSink;

use models::ObjectSubscription;

use log::info;
use serde_json::Value;

/// Subscribe to status notifications for `objects`.
///
/// Any correlated response counts as success; its content is returned as-is
/// and not inspected. Call only after the readiness handshake.
pub async fn subscribe_status<S: FrameSink>(
    correlator: &mut Correlator<S>,
    objects: &ObjectSubscription,
) -> Result<Value, RpcError> {
    let params = serde_json::to_value(objects)?;
    let result = correlator
        .issue(PRINTER_OBJECTS_SUBSCRIBE_METHOD, Some(params))
        .await?;

    let names: Vec<&str> = objects.objects.keys().map(String::as_str).collect();
    info!("Subscription successful ({}), ready to notify", names.join(", "));

    Ok(result)
}
