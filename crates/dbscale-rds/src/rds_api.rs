//! Capacity changes through the RDS API.

use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_sdk_rds::Client;
use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use tracing::{debug, info};

use dbscale_core::{CapacityApplier, CapacityTier, CommunicationError, ConfigError, ConfigResult};

/// Sent with every change: a scaling point not found in time is forced.
pub const TIMEOUT_ACTION: &str = "ForceApplyCapacityChange";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Bounds the API call. The capacity change itself completes asynchronously.
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters of one `ModifyCurrentDBClusterCapacity` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityRequest {
    pub db_cluster_identifier: String,
    pub capacity: i32,
    pub seconds_before_timeout: i32,
}

/// Applies capacity via `ModifyCurrentDBClusterCapacity`.
#[derive(Debug, Clone)]
pub struct RdsApiApplier {
    client: Client,
    db_identifier: String,
}

impl RdsApiApplier {
    /// Client configured from the standard AWS environment.
    pub async fn from_env(db_identifier: impl Into<String>) -> Self {
        let timeout_config = TimeoutConfig::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .operation_timeout(API_TIMEOUT)
            .build();
        let aws_config = aws_config::from_env()
            .timeout_config(timeout_config)
            .load()
            .await;
        Self::new(Client::new(&aws_config), db_identifier)
    }

    pub fn new(client: Client, db_identifier: impl Into<String>) -> Self {
        Self {
            client,
            db_identifier: db_identifier.into(),
        }
    }

    /// Build the request for moving to `scale`.
    pub fn request(&self, scale: &str, timeout_secs: u64) -> ConfigResult<CapacityRequest> {
        Ok(CapacityRequest {
            db_cluster_identifier: self.db_identifier.clone(),
            capacity: parse_capacity(scale)?,
            seconds_before_timeout: i32::try_from(timeout_secs).unwrap_or(i32::MAX),
        })
    }
}

impl CapacityApplier for RdsApiApplier {
    async fn apply(&self, scale: &str, timeout_secs: u64) -> Result<(), CommunicationError> {
        let request = self
            .request(scale, timeout_secs)
            .map_err(|e| CommunicationError::Apply(e.to_string()))?;
        debug!(?request, "modifying cluster capacity");

        let output = self
            .client
            .modify_current_db_cluster_capacity()
            .db_cluster_identifier(&request.db_cluster_identifier)
            .capacity(request.capacity)
            .seconds_before_timeout(request.seconds_before_timeout)
            .timeout_action(TIMEOUT_ACTION)
            .send()
            .await
            .map_err(apply_error)?;

        info!(
            db = %request.db_cluster_identifier,
            capacity = request.capacity,
            pending = ?output.pending_capacity(),
            current = ?output.current_capacity(),
            timeout_secs,
            "requested cluster capacity change"
        );
        Ok(())
    }
}

/// Service faults keep their error code; transport failures keep the
/// full source chain.
fn apply_error<E, R>(err: SdkError<E, R>) -> CommunicationError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err {
        SdkError::ServiceError(service) => {
            let fault = service.err();
            CommunicationError::Apply(format!(
                "{}: {}",
                fault.code().unwrap_or("unknown fault"),
                fault.message().unwrap_or("no message")
            ))
        }
        other => CommunicationError::Apply(DisplayErrorContext(&other).to_string()),
    }
}

fn parse_capacity(scale: &str) -> ConfigResult<i32> {
    match scale.parse::<i32>() {
        Ok(capacity) if capacity >= 0 => Ok(capacity),
        _ => Err(ConfigError::InvalidValue {
            field: "tier scale",
            reason: format!("{scale:?} is not a numeric capacity"),
        }),
    }
}

/// Every tier name must be a numeric capacity the RDS API accepts.
pub fn validate_scale_labels<'a>(tiers: impl IntoIterator<Item = &'a CapacityTier>) -> ConfigResult<()> {
    for tier in tiers {
        parse_capacity(tier.name())?;
    }
    Ok(())
}
