use std::convert::TryInto;
use std::time::Duration;

use async_trait::async_trait;
use crazyflie_lib::subsystems::log::{LogPeriod, LogStream};
use crazyflie_lib::Crazyflie;
use crazyflie_link::LinkContext;

use crate::telemetry::{LogConfig, TelemetryFrame};
use crate::toc_cache::FileTocCache;
use crate::vehicle::{Commander, Setpoint, TelemetryStream, Vehicle};
use crate::{Error, Result};

/// # A connected Crazyflie
///
/// Owns the link context and the [Crazyflie] connection. Dropping it disconnects the Crazyflie.
///
/// See the [crate root documentation](crate) for how it is used by a [Pilot](crate::Pilot).
pub struct ConnectedCrazyflie {
    uri: String,
    crazyflie: Crazyflie,
    _context: LinkContext,
}

/// Open a link to `uri` and connect the Crazyflie
///
/// The log and param TOCs are fetched from `toc_cache` when present, otherwise downloaded and stored in it.
///
/// Any failure, from opening the radio to downloading the TOCs, is reported as [Error::Connection].
pub async fn connect(uri: &str, toc_cache: FileTocCache) -> Result<ConnectedCrazyflie> {
    let context = LinkContext::new();

    log::debug!("Opening link to {}", uri);
    let crazyflie = Crazyflie::connect_from_uri(&context, uri, toc_cache)
        .await
        .map_err(|e| Error::Connection {
            uri: uri.to_owned(),
            reason: format!("{:?}", e),
        })?;

    Ok(ConnectedCrazyflie {
        uri: uri.to_owned(),
        crazyflie,
        _context: context,
    })
}

impl ConnectedCrazyflie {
    /// Access to the underlying Crazyflie, for subsystems not covered by [Vehicle]
    pub fn crazyflie(&self) -> &Crazyflie {
        &self.crazyflie
    }
}

#[async_trait]
impl Commander for ConnectedCrazyflie {
    async fn send(&self, setpoint: Setpoint) -> Result<()> {
        let commander = &self.crazyflie.commander;
        match setpoint {
            Setpoint::Rpyt {
                roll,
                pitch,
                yawrate,
                thrust,
            } => {
                commander
                    .setpoint_rpyt(roll, pitch, yawrate, thrust)
                    .await?
            }
            Setpoint::Position { x, y, z, yaw } => {
                commander.setpoint_position(x, y, z, yaw).await?
            }
            Setpoint::VelocityWorld {
                vx,
                vy,
                vz,
                yawrate,
            } => {
                commander
                    .setpoint_velocity_world(vx, vy, vz, yawrate)
                    .await?
            }
            Setpoint::Stop => commander.setpoint_stop().await?,
            Setpoint::NotifyStop { remain_valid_ms } => {
                commander.notify_setpoint_stop(remain_valid_ms).await?
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Vehicle for ConnectedCrazyflie {
    fn uri(&self) -> &str {
        &self.uri
    }

    async fn start_telemetry(&self, config: &LogConfig) -> Result<Box<dyn TelemetryStream>> {
        config.validate()?;

        let toc = self.crazyflie.log.names();
        let missing = config.names().find(|name| !toc.iter().any(|n| n == name));
        if let Some(missing) = missing {
            return Err(Error::VariableNotFound(missing.to_owned()));
        }

        let mut block = self.crazyflie.log.create_block().await?;
        for name in config.names() {
            block.add_variable(name).await?;
        }

        let period: LogPeriod = Duration::from_millis(config.period_ms as u64).try_into()?;
        let stream = block.start(period).await?;

        log::debug!("Log block {} started every {}ms", config.name, config.period_ms);

        Ok(Box::new(CrazyflieTelemetry {
            config: config.clone(),
            stream,
        }))
    }

    async fn disconnect(&self) {
        self.crazyflie.disconnect().await;
    }

    async fn wait_disconnect(&self) -> String {
        self.crazyflie.wait_disconnect().await
    }
}

struct CrazyflieTelemetry {
    config: LogConfig,
    stream: LogStream,
}

#[async_trait]
impl TelemetryStream for CrazyflieTelemetry {
    async fn next_frame(&mut self) -> Result<TelemetryFrame> {
        let data = self.stream.next().await?;

        // The log data is keyed by name, frames keep the block declaration order
        let values = self
            .config
            .names()
            .filter_map(|name| {
                data.data
                    .get(name)
                    .map(|value| (name.to_owned(), value.to_f64_lossy()))
            })
            .collect();

        Ok(TelemetryFrame::new(data.timestamp, values))
    }

    async fn stop(self: Box<Self>) -> Result<()> {
        let _block = self.stream.stop().await?;
        Ok(())
    }
}
