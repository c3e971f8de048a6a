use std::path::PathBuf;

use libgpiod::{chip::Chip, line, request};
use parking_lot::{FairMutex, RwLock, RwLockUpgradableReadGuard};
use rustc_hash::FxHashMap;

use crate::error::GpioError;
use crate::gpio::{Direction, GpioBackend, Level, Pull};
use crate::topology;

/// Drives the header pins through a libgpiod line request per pin.
///
/// `setup` takes board pin numbers and requests the line whose offset is the
/// matching chip GPIO number. `read` and `write` only reach pins that were
/// set up before.
pub struct LibgpiodBackend {
    chip: String,
    pins: RwLock<FxHashMap<u32, PinHandle>>, // keyed by board pin
}

struct PinHandle {
    line: u32,
    direction: Direction,
    gpiod_handle: FairMutex<GpiodHandle>,
}

struct GpiodHandle {
    request: request::Request,
}

impl GpiodHandle {
    fn new(chip: &str, line_cfg: &line::Config) -> Result<Self, GpioError> {
        let chip = Self::open_chip(chip)?;
        let request = Self::request_lines(&chip, line_cfg)?;
        Ok(Self { request })
    }

    fn open_chip(path: &str) -> Result<Chip, GpioError> {
        let p = PathBuf::from(path);
        Chip::open(&p).map_err(|e| GpioError(format!("open chip {path}: {e}")))
    }

    fn request_lines(chip: &Chip, line_cfg: &line::Config) -> Result<request::Request, GpioError> {
        let mut req_cfg =
            request::Config::new().map_err(|e| GpioError(format!("request config: {e}")))?;
        req_cfg
            .set_consumer(env!("CARGO_PKG_NAME"))
            .map_err(|e| GpioError(format!("request consumer: {e}")))?;
        chip.request_lines(Some(&req_cfg), line_cfg)
            .map_err(|e| GpioError(format!("request lines: {e}")))
    }
}

impl LibgpiodBackend {
    /// Checks that `chip` can be opened; lines are requested lazily by `setup`.
    pub fn new(chip: &str) -> Result<Self, GpioError> {
        GpiodHandle::open_chip(chip)?;
        Ok(Self {
            chip: chip.to_string(),
            pins: RwLock::new(FxHashMap::default()),
        })
    }

    fn make_line_settings(direction: Direction, pull: Pull) -> Result<line::Settings, GpioError> {
        let mut ls =
            line::Settings::new().map_err(|e| GpioError(format!("libgpiod settings: {e}")))?;

        match direction {
            Direction::Output => {
                ls.set_direction(line::Direction::Output)
                    .map_err(|e| GpioError(format!("set direction: {e}")))?;
                ls.set_drive(line::Drive::PushPull)
                    .map_err(|e| GpioError(format!("set drive: {e}")))?;
            }
            Direction::Input => {
                ls.set_direction(line::Direction::Input)
                    .map_err(|e| GpioError(format!("set direction: {e}")))?;
                let bias = match pull {
                    Pull::None => None,
                    Pull::PullUp => Some(line::Bias::PullUp),
                    Pull::PullDown => Some(line::Bias::PullDown),
                };
                ls.set_bias(bias)
                    .map_err(|e| GpioError(format!("set bias: {e}")))?;
            }
        }

        Ok(ls)
    }

    fn make_line_config(offset: u32, settings: line::Settings) -> Result<line::Config, GpioError> {
        let mut cfg = line::Config::new().map_err(|e| GpioError(format!("line config: {e}")))?;
        cfg.add_line_settings(&[offset], settings)
            .map_err(|e| GpioError(format!("line config add settings: {e}")))?;
        Ok(cfg)
    }
}

impl GpioBackend for LibgpiodBackend {
    fn setup(&self, pin: u32, direction: Direction, pull: Pull) -> Result<(), GpioError> {
        let offset = topology::board_to_chip(pin)
            .ok_or_else(|| GpioError(format!("board pin {pin} is not a GPIO")))?;
        let line_settings = Self::make_line_settings(direction, pull)?;
        let line_cfg = Self::make_line_config(offset, line_settings)?;

        let pins = self.pins.upgradable_read();
        if pins.contains_key(&pin) {
            let mut pins = RwLockUpgradableReadGuard::upgrade(pins);
            if let Some(handle) = pins.get_mut(&pin) {
                handle
                    .gpiod_handle
                    .lock()
                    .request
                    .reconfigure_lines(&line_cfg)
                    .map_err(|e| GpioError(format!("reconfigure lines: {e}")))?;
                handle.direction = direction;
            }
            return Ok(());
        }

        // the upgradable guard is exclusive, so the new request can be made before upgrading
        let gpiod_handle = FairMutex::new(GpiodHandle::new(&self.chip, &line_cfg)?);
        let mut pins = RwLockUpgradableReadGuard::upgrade(pins);
        pins.insert(
            pin,
            PinHandle {
                line: offset,
                direction,
                gpiod_handle,
            },
        );

        Ok(())
    }

    fn read(&self, pin: u32) -> Result<u8, GpioError> {
        let pins = self.pins.read();
        let handle = pins
            .get(&pin)
            .ok_or_else(|| GpioError(format!("pin {pin} has not been set up")))?;

        let value = handle
            .gpiod_handle
            .lock()
            .request
            .value(handle.line)
            .map_err(|e| GpioError(format!("get value: {e}")))?;
        Ok(match value {
            line::Value::InActive => Self::LOW,
            line::Value::Active => Self::HIGH,
        })
    }

    fn write(&self, pin: u32, level: Level) -> Result<(), GpioError> {
        let pins = self.pins.read();
        let handle = pins
            .get(&pin)
            .ok_or_else(|| GpioError(format!("pin {pin} has not been set up")))?;

        if handle.direction != Direction::Output {
            return Err(GpioError(format!("pin {pin} is not configured as an output")));
        }

        handle
            .gpiod_handle
            .lock()
            .request
            .set_value(
                handle.line,
                match level {
                    Level::Low => line::Value::InActive,
                    Level::High => line::Value::Active,
                },
            )
            .map_err(|e| GpioError(format!("set value: {e}")))?;
        Ok(())
    }
}
