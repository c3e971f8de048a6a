mod backend;
mod config;
mod error;
mod gpio;
mod routes;
pub mod topology;

pub use config::{AppConfig, HttpConfig};
pub use error::{AppError, GpioError};
pub use gpio::{
    ConfigurationResult, Direction, GpioBackend, Level, ModeResult, NumberingMode,
    PinConfiguration, PinController, PinDescriptor, PinStateResult, Pull,
};
pub use routes::AppState;

#[cfg(feature = "hardware-gpio")]
pub use backend::LibgpiodBackend;
pub use backend::MockGpioBackend;
