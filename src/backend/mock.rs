use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::GpioError;
use crate::gpio::{Direction, GpioBackend, Level, PinConfiguration, Pull};

/// In-memory stand-in for the GPIO hardware.
#[derive(Default)]
pub struct MockGpioBackend {
    pins: RwLock<FxHashMap<u32, MockPinState>>, // keyed by the pin id the controller passes
    driven: RwLock<FxHashMap<u32, u8>>,
    faulty: RwLock<FxHashSet<u32>>,
}

#[derive(Clone)]
struct MockPinState {
    settings: PinConfiguration,
    value: u8,
}

impl MockGpioBackend {
    /// Simulates an external signal on `pin`; `read` returns `raw` from now on.
    pub fn drive(&self, pin: u32, raw: u8) {
        self.driven.write().insert(pin, raw);
    }

    /// Makes every operation on `pin` fail.
    pub fn fail(&self, pin: u32) {
        self.faulty.write().insert(pin);
    }

    fn check_fault(&self, pin: u32) -> Result<(), GpioError> {
        if self.faulty.read().contains(&pin) {
            return Err(GpioError(format!("pin {pin} is faulty")));
        }
        Ok(())
    }
}

impl GpioBackend for MockGpioBackend {
    fn setup(&self, pin: u32, direction: Direction, pull: Pull) -> Result<(), GpioError> {
        self.check_fault(pin)?;

        let value = match pull {
            Pull::PullUp => Self::HIGH,
            Pull::None | Pull::PullDown => Self::LOW,
        };
        self.pins.write().insert(
            pin,
            MockPinState {
                settings: PinConfiguration { direction, pull },
                value,
            },
        );

        Ok(())
    }

    fn read(&self, pin: u32) -> Result<u8, GpioError> {
        self.check_fault(pin)?;

        if let Some(raw) = self.driven.read().get(&pin) {
            return Ok(*raw);
        }
        self.pins
            .read()
            .get(&pin)
            .map(|state| state.value)
            .ok_or_else(|| GpioError(format!("pin {pin} has not been set up")))
    }

    fn write(&self, pin: u32, level: Level) -> Result<(), GpioError> {
        self.check_fault(pin)?;

        let mut pins = self.pins.write();
        let state = pins
            .get_mut(&pin)
            .ok_or_else(|| GpioError(format!("pin {pin} has not been set up")))?;
        if state.settings.direction != Direction::Output {
            return Err(GpioError(format!("pin {pin} is not configured as an output")));
        }

        state.value = match level {
            Level::Low => Self::LOW,
            Level::High => Self::HIGH,
        };
        Ok(())
    }
}
