//! Link startup sequence

use rcserial_hal::{StartupError, UartDriver};

use crate::config::RemoteConfig;

/// Validate, configure, assign pins and install, in that order
///
/// Stops at the first failure and hands it to the caller. Nothing is
/// retried here; whether to try again is the application's decision.
pub fn bring_up<D: UartDriver>(
    mut driver: D,
    config: &RemoteConfig,
) -> Result<D::Installed, StartupError> {
    config.validate()?;
    driver.configure(&config.uart)?;
    driver.assign_pins(config.pins)?;
    Ok(driver.install(&config.buffers)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcserial_hal::{
        BufferConfig, ConfigError, DriverInitError, PinAssignment, PinError, UartConfig,
    };

    /// Driver that records which steps ran
    #[derive(Default)]
    struct StepDriver {
        fail_configure: bool,
        fail_pins: bool,
        configured: bool,
        pins: Option<PinAssignment>,
    }

    impl UartDriver for StepDriver {
        type Installed = (UartConfig, PinAssignment, BufferConfig);

        fn configure(&mut self, _config: &UartConfig) -> Result<(), ConfigError> {
            if self.fail_configure {
                return Err(ConfigError::UnsupportedDataBits);
            }
            self.configured = true;
            Ok(())
        }

        fn assign_pins(&mut self, pins: PinAssignment) -> Result<(), PinError> {
            if self.fail_pins {
                return Err(PinError::NotWired(pins.tx));
            }
            self.pins = Some(pins);
            Ok(())
        }

        fn install(self, buffers: &BufferConfig) -> Result<Self::Installed, DriverInitError> {
            if !self.configured {
                return Err(DriverInitError::NotConfigured);
            }
            let pins = self.pins.ok_or(DriverInitError::PinsNotAssigned)?;
            buffers.check(&BufferConfig {
                rx_ring: 2048,
                tx_ring: 2048,
                event_queue_depth: 10,
            })?;
            Ok((UartConfig::REMOTE, pins, *buffers))
        }
    }

    #[test]
    fn test_bring_up_default() {
        let (uart, pins, buffers) = bring_up(StepDriver::default(), &RemoteConfig::DEFAULT).unwrap();
        assert_eq!(uart, UartConfig::REMOTE);
        assert_eq!(pins, PinAssignment::new(16, 17));
        assert_eq!(buffers.event_queue_depth, 10);
    }

    #[test]
    fn test_invalid_config_never_reaches_driver() {
        let mut config = RemoteConfig::DEFAULT;
        config.uart.baudrate = 0;
        let result = bring_up(StepDriver::default(), &config);
        assert_eq!(
            result.err(),
            Some(StartupError::Config(ConfigError::InvalidBaudrate(0)))
        );
    }

    #[test]
    fn test_configure_failure_surfaces() {
        let driver = StepDriver {
            fail_configure: true,
            ..Default::default()
        };
        assert_eq!(
            bring_up(driver, &RemoteConfig::DEFAULT).err(),
            Some(StartupError::Config(ConfigError::UnsupportedDataBits))
        );
    }

    #[test]
    fn test_pin_failure_surfaces() {
        let driver = StepDriver {
            fail_pins: true,
            ..Default::default()
        };
        assert_eq!(
            bring_up(driver, &RemoteConfig::DEFAULT).err(),
            Some(StartupError::Pin(PinError::NotWired(16)))
        );
    }

    #[test]
    fn test_install_failure_surfaces() {
        let mut config = RemoteConfig::DEFAULT;
        config.buffers.rx_ring = 1 << 20;
        assert_eq!(
            bring_up(StepDriver::default(), &config).err(),
            Some(StartupError::DriverInit(DriverInitError::RxBufferTooLarge {
                requested: 1 << 20,
                available: 2048,
            }))
        );
    }
}
