//! Trigger source commands.
//!
//! Both trigger sources share `TRIG`, so changing one of them means reading
//! the register first and writing back the other source unchanged. The read
//! and the write happen in one session.

use crate::channel::Session;
use crate::commands::{CommandHandler, execute_in, read_register};
use crate::error::{Error, Result};
use crate::protocol::{Command, registers};
use crate::transport::Transport;
use crate::types::{TriggerConfig, TriggerSource};

async fn read_trigger<T: Transport>(session: &mut Session<'_, T>) -> Result<TriggerConfig> {
    let code: String = read_register(session, &registers::TRIG).await?;
    TriggerConfig::parse(&code).ok_or_else(|| Error::Parse {
        register: registers::TRIG.name.to_string(),
        value: code,
    })
}

impl<T: Transport> CommandHandler<T> {
    /// Gets both trigger sources.
    pub async fn get_trigger(&self) -> Result<TriggerConfig> {
        let mut session = self.channel.session().await;
        read_trigger(&mut session).await
    }

    /// Gets the flashlamp trigger source.
    pub async fn get_flashlamp_trigger(&self) -> Result<TriggerSource> {
        Ok(self.get_trigger().await?.flashlamp)
    }

    /// Gets the Q-switch trigger source.
    pub async fn get_qswitch_trigger(&self) -> Result<TriggerSource> {
        Ok(self.get_trigger().await?.qswitch)
    }

    /// Sets the trigger sources.
    ///
    /// A `None` source keeps its current value, which is read from the
    /// laser before writing. Returns the configuration written.
    pub async fn set_trigger(
        &self,
        flashlamp: Option<TriggerSource>,
        qswitch: Option<TriggerSource>,
    ) -> Result<TriggerConfig> {
        self.check_writable(&registers::TRIG)?;
        let mut session = self.channel.session().await;

        let config = match (flashlamp, qswitch) {
            (Some(flashlamp), Some(qswitch)) => TriggerConfig { flashlamp, qswitch },
            _ => {
                let current = read_trigger(&mut session).await?;
                TriggerConfig {
                    flashlamp: flashlamp.unwrap_or(current.flashlamp),
                    qswitch: qswitch.unwrap_or(current.qswitch),
                }
            }
        };

        tracing::info!("setting trigger sources to {config}");
        execute_in(&mut session, &Command::write(&registers::TRIG, config.code())).await?;
        Ok(config)
    }

    /// Sets the flashlamp trigger source, keeping the Q-switch source.
    pub async fn set_flashlamp_trigger(&self, source: TriggerSource) -> Result<()> {
        self.set_trigger(Some(source), None).await.map(|_| ())
    }

    /// Sets the Q-switch trigger source, keeping the flashlamp source.
    pub async fn set_qswitch_trigger(&self, source: TriggerSource) -> Result<()> {
        self.set_trigger(None, Some(source)).await.map(|_| ())
    }
}
