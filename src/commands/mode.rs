//! Operating mode commands.
//!
//! The three mode registers are read and written inside one session, so the
//! keep-alive poll cannot land between them. The laser has no transaction
//! support: if the second or third write fails, the registers are left
//! holding a mix of old and new values and [`CommandHandler::get_mode`]
//! reports whatever that mix decodes to.

use crate::commands::{CommandHandler, execute_in, read_register};
use crate::error::Result;
use crate::protocol::{Command, registers};
use crate::transport::Transport;
use crate::types::{Mode, ModeParams, ModeRegisters, ModeSettings};

impl<T: Transport> CommandHandler<T> {
    /// Reads `QSPAR1..3`.
    pub async fn get_mode_registers(&self) -> Result<ModeRegisters> {
        let mut session = self.channel.session().await;
        Ok(ModeRegisters {
            qspar1: read_register(&mut session, &registers::QSPAR1).await?,
            qspar2: read_register(&mut session, &registers::QSPAR2).await?,
            qspar3: read_register(&mut session, &registers::QSPAR3).await?,
        })
    }

    /// Writes `QSPAR1..3` as given, without validation.
    pub async fn set_mode_registers(&self, values: ModeRegisters) -> Result<()> {
        let mut session = self.channel.session().await;
        for (register, value) in [
            (registers::QSPAR1, values.qspar1),
            (registers::QSPAR2, values.qspar2),
            (registers::QSPAR3, values.qspar3),
        ] {
            execute_in(&mut session, &Command::write(&register, value)).await?;
        }
        Ok(())
    }

    /// Gets the current operating mode.
    pub async fn get_mode(&self) -> Result<Mode> {
        Ok(self.get_mode_registers().await?.mode())
    }

    /// Gets the current operating mode with its parameters.
    pub async fn get_mode_settings(&self) -> Result<ModeSettings> {
        Ok(self.get_mode_registers().await?.settings())
    }

    /// Sets the operating mode.
    ///
    /// Settings are validated first; an invalid request fails with
    /// `Error::Validation` and writes nothing.
    pub async fn set_mode(&self, settings: ModeSettings) -> Result<()> {
        let values = settings.to_registers()?;
        tracing::info!("setting {} mode: {:?}", settings.mode(), values);
        self.set_mode_registers(values).await
    }

    /// Sets the operating mode from loosely specified parameters.
    ///
    /// Missing or invalid parameters fail with `Error::Validation` before
    /// anything is written.
    pub async fn set_mode_with(&self, mode: Mode, params: &ModeParams) -> Result<()> {
        let settings = ModeSettings::from_params(mode, params)?;
        self.set_mode(settings).await
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::tests::handler;
    use crate::error::Error;
    use crate::types::{Mode, ModeParams, ModeSettings};

    #[tokio::test]
    async fn test_scan_round_trip() {
        let (commands, handle) = handler(false);
        handle.set_register("QSPAR1", "7");

        commands
            .set_mode(ModeSettings::Scan {
                shots_per_cycle: 10,
                total_length: 20,
            })
            .await
            .unwrap();

        assert_eq!(commands.get_mode().await.unwrap(), Mode::Scan);
        assert_eq!(handle.register("QSPAR1").as_deref(), Some("0"));
        assert_eq!(handle.register("QSPAR2").as_deref(), Some("20"));
        assert_eq!(handle.register("QSPAR3").as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn test_burst_and_divider() {
        let (commands, handle) = handler(false);

        let burst = ModeSettings::Burst {
            cycles: 2,
            shots_per_cycle: 5,
            total_length: 10,
        };
        commands.set_mode(burst).await.unwrap();
        assert_eq!(commands.get_mode_settings().await.unwrap(), burst);

        commands
            .set_mode_with(Mode::Divider, &ModeParams::new().divider(3))
            .await
            .unwrap();
        assert_eq!(
            commands.get_mode_settings().await.unwrap(),
            ModeSettings::Divider { divider: 3 }
        );
        assert_eq!(handle.register("QSPAR3").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_invalid_mode_writes_nothing() {
        let (commands, handle) = handler(true);

        let err = commands
            .set_mode(ModeSettings::Burst {
                cycles: 2,
                shots_per_cycle: 50,
                total_length: 10,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }), "{err}");

        let err = commands
            .set_mode_with(Mode::Burst, &ModeParams::new().shots_per_cycle(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }), "{err}");

        assert!(handle.writes().is_empty());
        assert!(handle.sent().is_empty());
    }

    #[tokio::test]
    async fn test_decode_follows_registers() {
        let (commands, handle) = handler(false);
        for (q1, q2, q3, expected) in [
            ("0", "5", "1", Mode::Divider),
            ("1", "5", "1", Mode::Burst),
            ("0", "5", "3", Mode::Scan),
            ("0", "0", "0", Mode::Scan),
        ] {
            handle.set_register("QSPAR1", q1);
            handle.set_register("QSPAR2", q2);
            handle.set_register("QSPAR3", q3);
            assert_eq!(commands.get_mode().await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_partial_write_failure() {
        let (commands, handle) = handler(false);
        handle.script("QSPAR2 40", &["ERROR 5"]);

        let err = commands
            .set_mode(ModeSettings::Burst {
                cycles: 4,
                shots_per_cycle: 10,
                total_length: 40,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));

        // First write landed, the rest did not.
        assert_eq!(handle.writes(), vec!["QSPAR1 4", "QSPAR2 40"]);
        assert_eq!(handle.register("QSPAR1").as_deref(), Some("4"));
        assert_eq!(handle.register("QSPAR2").as_deref(), Some("20"));
    }
}
