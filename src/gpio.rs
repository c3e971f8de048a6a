use std::fmt;
use std::num::IntErrorKind;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, GpioError};
use crate::topology;

/// Pin numbering scheme selected by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingMode {
    #[default]
    Unset,
    /// Chip GPIO numbers, e.g. 216.
    Chip,
    /// Physical header pin numbers, e.g. 7.
    Board,
}

impl NumberingMode {
    pub fn pin_label(&self) -> &'static str {
        match self {
            NumberingMode::Unset => "Pin number",
            NumberingMode::Chip => "Chip GPIO number",
            NumberingMode::Board => "Board pin number",
        }
    }

    fn accepts(&self, pin: u32) -> bool {
        match self {
            NumberingMode::Unset => false,
            NumberingMode::Chip => topology::is_valid_chip(pin),
            NumberingMode::Board => topology::is_valid_board(pin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "in")]
    Input,
    #[serde(rename = "out")]
    Output,
}

impl Direction {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "in" => Some(Direction::Input),
            "out" => Some(Direction::Output),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pull {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "up")]
    PullUp,
    #[serde(rename = "down")]
    PullDown,
}

impl Pull {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "up" => Some(Pull::PullUp),
            "down" => Some(Pull::PullDown),
            _ => None,
        }
    }
}

impl fmt::Display for Pull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pull::None => f.write_str("no pull resistor"),
            Pull::PullUp => f.write_str("a pull-up resistor"),
            Pull::PullDown => f.write_str("a pull-down resistor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Accepts the literal tokens `0`, `1`, `false` and `true`.
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "0" | "false" => Some(Level::Low),
            "1" | "true" => Some(Level::High),
            _ => None,
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level == Level::High
    }
}

/// Direction and pull last applied to a board pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinConfiguration {
    pub direction: Direction,
    pub pull: Pull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeResult {
    pub mode: NumberingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigurationResult {
    /// Board pin that was configured, even when addressed by chip number.
    pub configured: u32,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull: Option<Pull>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinStateResult {
    pub pin: u32,
    pub state: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinDescriptor {
    pub chip: u32,
    pub board: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<PinConfiguration>,
}

/// Physical pin access. Implementations receive board pin numbers from
/// `setup`; `read` and `write` receive the identifier as the client gave it.
pub trait GpioBackend: Send + Sync {
    /// Raw value `read` returns for a low pin.
    const LOW: u8 = 0;
    /// Raw value `read` returns for a high pin.
    const HIGH: u8 = 1;

    fn setup(&self, pin: u32, direction: Direction, pull: Pull) -> Result<(), GpioError>;
    fn read(&self, pin: u32) -> Result<u8, GpioError>;
    fn write(&self, pin: u32, level: Level) -> Result<(), GpioError>;
}

#[derive(Default)]
struct ControllerState {
    mode: NumberingMode,
    configurations: FxHashMap<u32, PinConfiguration>, // keyed by board pin
}

impl ControllerState {
    fn require_mode(&self) -> Result<NumberingMode, AppError> {
        match self.mode {
            NumberingMode::Unset => Err(AppError::ModeNotSet),
            mode => Ok(mode),
        }
    }

    fn valid_pin(&self, raw: &str) -> Option<u32> {
        match ParsedPin::from_raw(raw) {
            ParsedPin::Int(pin) => u32::try_from(pin)
                .ok()
                .filter(|&pin| self.mode.accepts(pin)),
            ParsedPin::OutOfRange | ParsedPin::NotInt => None,
        }
    }

    fn invalid_pin(&self, raw: &str) -> AppError {
        AppError::InvalidPin {
            mode: self.mode,
            pin: ParsedPin::display(raw),
        }
    }
}

/// Outcome of reading a pin identifier as an integer of any width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParsedPin {
    Int(i64),
    /// Well-formed integer wider than `i64`.
    OutOfRange,
    NotInt,
}

impl ParsedPin {
    fn from_raw(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(pin) => ParsedPin::Int(pin),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ParsedPin::OutOfRange,
                _ => ParsedPin::NotInt,
            },
        }
    }

    /// Identifier as echoed in error messages: the normalized number when it
    /// fits, the trimmed text otherwise.
    fn display(raw: &str) -> String {
        match ParsedPin::from_raw(raw) {
            ParsedPin::Int(pin) => pin.to_string(),
            ParsedPin::OutOfRange | ParsedPin::NotInt => raw.trim().to_string(),
        }
    }
}

/// Owns the numbering mode and the per-pin configuration records, and is the
/// only path from a request to the hardware backend.
///
/// Every operation holds the state lock from validation until the backend
/// call returns, so a mode change can never land between the two.
pub struct PinController<B: GpioBackend> {
    backend: Arc<B>,
    state: Mutex<ControllerState>,
}

impl<B: GpioBackend> PinController<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: Mutex::new(ControllerState::default()),
        }
    }

    pub fn mode(&self) -> NumberingMode {
        self.state.lock().mode
    }

    /// Selects the numbering scheme. Recorded pin configurations survive.
    pub fn set_mode(&self, scheme: &str) -> Result<NumberingMode, AppError> {
        let scheme = scheme.to_lowercase();
        let mode = match scheme.as_str() {
            "chip" => NumberingMode::Chip,
            "board" => NumberingMode::Board,
            _ => return Err(AppError::InvalidMode(scheme)),
        };

        self.state.lock().mode = mode;
        info!("Numbering mode set to {scheme}");

        Ok(mode)
    }

    /// True when `raw` is an integer that names a pin under the current mode.
    pub fn validate_pin(&self, raw: &str) -> bool {
        self.state.lock().valid_pin(raw).is_some()
    }

    pub fn configure(
        &self,
        raw_pin: &str,
        direction: &str,
        pull: Option<&str>,
    ) -> Result<ConfigurationResult, AppError> {
        let mut state = self.state.lock();
        let mode = state.require_mode()?;

        let requested_pull = match pull {
            Some(token) => Some(
                Pull::from_token(token).ok_or_else(|| AppError::InvalidPull(token.to_string()))?,
            ),
            None => None,
        };
        let direction = Direction::from_token(direction)
            .ok_or_else(|| AppError::InvalidDirection(direction.to_string()))?;
        if let (Direction::Output, Some(token)) = (direction, pull) {
            return Err(AppError::ConflictingArguments(token.to_string()));
        }

        if ParsedPin::from_raw(raw_pin) == ParsedPin::NotInt {
            return Err(AppError::NotAnInteger(raw_pin.to_string()));
        }
        let pin = state
            .valid_pin(raw_pin)
            .ok_or_else(|| state.invalid_pin(raw_pin))?;
        let board = match mode {
            NumberingMode::Chip => {
                topology::chip_to_board(pin).ok_or_else(|| AppError::InvalidPin {
                    mode,
                    pin: pin.to_string(),
                })?
            }
            _ => pin,
        };

        let pull = match (direction, requested_pull) {
            (Direction::Input, None) => Pull::PullUp,
            (Direction::Input, Some(pull)) => pull,
            (Direction::Output, _) => Pull::None,
        };

        info!("Configuring board pin {board} for {direction} with {pull}");
        self.backend
            .setup(board, direction, pull)
            .map_err(|source| {
                warn!("setup of board pin {board} failed: {source}");
                AppError::HardwareConfig {
                    pin: board,
                    direction,
                    source,
                }
            })?;

        state
            .configurations
            .insert(board, PinConfiguration { direction, pull });

        Ok(ConfigurationResult {
            configured: board,
            direction,
            pull: (direction == Direction::Input).then_some(pull),
        })
    }

    // Chip numbers are handed to the backend untranslated here, unlike
    // `configure`.
    pub fn read_pin(&self, raw_pin: &str) -> Result<PinStateResult, AppError> {
        let state = self.state.lock();
        state.require_mode()?;
        let pin = state
            .valid_pin(raw_pin)
            .ok_or_else(|| state.invalid_pin(raw_pin))?;

        let raw = self.backend.read(pin).map_err(|source| {
            warn!("read of pin {pin} failed: {source}");
            AppError::ReadFailed { pin, source }
        })?;
        let level = if raw == B::LOW {
            Level::Low
        } else if raw == B::HIGH {
            Level::High
        } else {
            return Err(AppError::UndefinedLevel { pin, raw });
        };
        debug!("pin {pin} read {level:?}");

        Ok(PinStateResult {
            pin,
            state: level.into(),
        })
    }

    pub fn write_pin(&self, raw_pin: &str, token: &str) -> Result<PinStateResult, AppError> {
        let state = self.state.lock();
        state.require_mode()?;
        let pin = state
            .valid_pin(raw_pin)
            .ok_or_else(|| state.invalid_pin(raw_pin))?;
        let level =
            Level::from_token(token).ok_or_else(|| AppError::InvalidState(token.to_string()))?;

        self.backend.write(pin, level).map_err(|source| {
            warn!("write of pin {pin} failed: {source}");
            AppError::WriteFailed { pin, source }
        })?;
        debug!("pin {pin} set {level:?}");

        Ok(PinStateResult {
            pin,
            state: level.into(),
        })
    }

    pub fn pin_configuration(&self, board: u32) -> Option<PinConfiguration> {
        self.state.lock().configurations.get(&board).copied()
    }

    /// Every header GPIO in board order with its recorded configuration.
    pub fn list_pins(&self) -> Vec<PinDescriptor> {
        let state = self.state.lock();
        topology::CHIP_TO_BOARD
            .iter()
            .map(|&(chip, board)| PinDescriptor {
                chip,
                board,
                configuration: state.configurations.get(&board).copied(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Setup(u32, Direction, Pull),
        Read(u32),
        Write(u32, Level),
    }

    #[derive(Default)]
    struct ScriptedBackend {
        calls: Mutex<Vec<Call>>,
        read_value: Mutex<u8>,
        failing: Mutex<bool>,
    }

    impl ScriptedBackend {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn outcome(&self) -> Result<(), GpioError> {
            if *self.failing.lock() {
                Err(GpioError("line busy".into()))
            } else {
                Ok(())
            }
        }
    }

    impl GpioBackend for ScriptedBackend {
        fn setup(&self, pin: u32, direction: Direction, pull: Pull) -> Result<(), GpioError> {
            self.calls.lock().push(Call::Setup(pin, direction, pull));
            self.outcome()
        }

        fn read(&self, pin: u32) -> Result<u8, GpioError> {
            self.calls.lock().push(Call::Read(pin));
            self.outcome()?;
            Ok(*self.read_value.lock())
        }

        fn write(&self, pin: u32, level: Level) -> Result<(), GpioError> {
            self.calls.lock().push(Call::Write(pin, level));
            self.outcome()
        }
    }

    fn controller() -> (Arc<ScriptedBackend>, PinController<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::default());
        let controller = PinController::new(backend.clone());
        (backend, controller)
    }

    #[test]
    fn validate_pin_follows_current_mode() {
        let (_, ctl) = controller();
        for pin in 0..=255u32 {
            assert!(!ctl.validate_pin(&pin.to_string()));
        }

        ctl.set_mode("chip").unwrap();
        for pin in 0..=255u32 {
            assert_eq!(
                ctl.validate_pin(&pin.to_string()),
                topology::is_valid_chip(pin)
            );
        }

        ctl.set_mode("board").unwrap();
        for pin in 0..=255u32 {
            assert_eq!(
                ctl.validate_pin(&pin.to_string()),
                topology::is_valid_board(pin)
            );
        }

        for raw in ["", "seven", "7.0", "-7", "99999999999999999999"] {
            assert!(!ctl.validate_pin(raw), "{raw}");
        }
    }

    #[test]
    fn set_mode_accepts_any_case_and_rejects_unknown() {
        let (_, ctl) = controller();
        assert_eq!(ctl.mode(), NumberingMode::Unset);
        assert_eq!(ctl.set_mode("BOARD").unwrap(), NumberingMode::Board);
        assert_eq!(ctl.set_mode("Chip").unwrap(), NumberingMode::Chip);

        let err = ctl.set_mode("BCM").unwrap_err();
        assert!(matches!(err, AppError::InvalidMode(ref t) if t == "bcm"));
        assert_eq!(err.to_string(), "Unrecognized mode, bcm.");
        assert_eq!(ctl.mode(), NumberingMode::Chip);
    }

    #[test]
    fn set_mode_again_keeps_configurations() {
        let (_, ctl) = controller();
        ctl.set_mode("board").unwrap();
        ctl.configure("11", "out", None).unwrap();

        assert_eq!(ctl.set_mode("board").unwrap(), NumberingMode::Board);
        assert_eq!(ctl.set_mode("board").unwrap(), NumberingMode::Board);
        assert_eq!(
            ctl.pin_configuration(11),
            Some(PinConfiguration {
                direction: Direction::Output,
                pull: Pull::None
            })
        );
    }

    #[test]
    fn configure_requires_mode() {
        let (backend, ctl) = controller();
        for pin in ["7", "216", "0", "abc"] {
            for direction in ["in", "out", "sideways"] {
                for pull in [None, Some("up"), Some("down"), Some("left")] {
                    let err = ctl.configure(pin, direction, pull).unwrap_err();
                    assert!(matches!(err, AppError::ModeNotSet));
                }
            }
        }
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn configure_input_defaults_to_pull_up() {
        let (backend, ctl) = controller();
        ctl.set_mode("board").unwrap();

        let result = ctl.configure("11", "in", None).unwrap();
        assert_eq!(
            result,
            ConfigurationResult {
                configured: 11,
                direction: Direction::Input,
                pull: Some(Pull::PullUp),
            }
        );
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            serde_json::json!({ "configured": 11, "direction": "in", "pull": "up" })
        );
        assert_eq!(
            backend.calls(),
            vec![Call::Setup(11, Direction::Input, Pull::PullUp)]
        );
        assert_eq!(
            ctl.pin_configuration(11),
            Some(PinConfiguration {
                direction: Direction::Input,
                pull: Pull::PullUp
            })
        );
    }

    #[test]
    fn configure_output_reports_no_pull() {
        let (backend, ctl) = controller();
        ctl.set_mode("board").unwrap();

        let result = ctl.configure("40", "out", None).unwrap();
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            serde_json::json!({ "configured": 40, "direction": "out" })
        );
        assert_eq!(
            backend.calls(),
            vec![Call::Setup(40, Direction::Output, Pull::None)]
        );
    }

    #[test]
    fn output_with_pull_conflicts_regardless_of_pin() {
        let (backend, ctl) = controller();
        for mode in ["chip", "board"] {
            ctl.set_mode(mode).unwrap();
            for pin in ["7", "216", "999", "abc"] {
                let err = ctl.configure(pin, "out", Some("up")).unwrap_err();
                assert!(matches!(err, AppError::ConflictingArguments(ref p) if p == "up"));
            }
        }
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn configure_checks_arguments_in_order() {
        let (_, ctl) = controller();
        ctl.set_mode("board").unwrap();

        assert!(matches!(
            ctl.configure("abc", "sideways", Some("left")),
            Err(AppError::InvalidPull(_))
        ));
        assert!(matches!(
            ctl.configure("abc", "sideways", Some("down")),
            Err(AppError::InvalidDirection(_))
        ));
        assert!(matches!(
            ctl.configure("abc", "in", None),
            Err(AppError::NotAnInteger(_))
        ));

        let err = ctl.configure("99", "in", None).unwrap_err();
        assert!(matches!(err, AppError::InvalidPin { .. }));
        assert_eq!(err.to_string(), "Board pin number 99 is not valid.");

        let err = ctl.configure("99999999999999999999", "in", None).unwrap_err();
        assert!(matches!(err, AppError::InvalidPin { .. }));
        assert_eq!(
            err.to_string(),
            "Board pin number 99999999999999999999 is not valid."
        );

        ctl.set_mode("chip").unwrap();
        let err = ctl.configure("7", "in", None).unwrap_err();
        assert_eq!(err.to_string(), "Chip GPIO number 7 is not valid.");
    }

    #[test]
    fn invalid_pin_message_is_the_same_for_every_operation() {
        let (_, ctl) = controller();
        ctl.set_mode("board").unwrap();

        for (raw, shown) in [
            ("+8", "8"),
            (" 8 ", "8"),
            ("-3", "-3"),
            ("99999999999999999999", "99999999999999999999"),
        ] {
            let expected = format!("Board pin number {shown} is not valid.");
            let errors = [
                ctl.configure(raw, "in", None).unwrap_err(),
                ctl.read_pin(raw).unwrap_err(),
                ctl.write_pin(raw, "1").unwrap_err(),
            ];
            for err in errors {
                assert!(matches!(err, AppError::InvalidPin { .. }), "{raw}");
                assert_eq!(err.to_string(), expected);
            }
        }

        let err = ctl.read_pin(" seven ").unwrap_err();
        assert_eq!(err.to_string(), "Board pin number seven is not valid.");
    }

    #[test]
    fn mode_changes_do_not_interleave_with_configure() {
        let (backend, ctl) = controller();
        ctl.set_mode("board").unwrap();
        let configured = std::sync::atomic::AtomicUsize::new(0);

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..500 {
                    ctl.set_mode(if i % 2 == 0 { "chip" } else { "board" })
                        .unwrap();
                }
            });
            s.spawn(|| {
                for i in 0..500 {
                    // 216 is chip for board pin 7; only one of the two is valid at a time
                    let raw = if i % 2 == 0 { "216" } else { "7" };
                    match ctl.configure(raw, "out", None) {
                        Ok(result) => {
                            assert_eq!(result.configured, 7);
                            configured.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                        Err(err) => assert!(matches!(err, AppError::InvalidPin { .. })),
                    }
                }
            });
        });

        let calls = backend.calls();
        assert_eq!(
            calls.len(),
            configured.load(std::sync::atomic::Ordering::Relaxed)
        );
        assert!(
            calls
                .iter()
                .all(|call| *call == Call::Setup(7, Direction::Output, Pull::None))
        );
    }

    #[test]
    fn chip_numbers_are_translated_for_configure() {
        let (backend, ctl) = controller();
        ctl.set_mode("chip").unwrap();

        let result = ctl.configure("216", "in", Some("down")).unwrap();
        assert_eq!(result.configured, 7);
        assert_eq!(result.pull, Some(Pull::PullDown));
        assert_eq!(
            backend.calls(),
            vec![Call::Setup(7, Direction::Input, Pull::PullDown)]
        );
        assert_eq!(ctl.pin_configuration(216), None);
        assert_eq!(
            ctl.pin_configuration(7),
            Some(PinConfiguration {
                direction: Direction::Input,
                pull: Pull::PullDown
            })
        );
    }

    #[test]
    fn mode_switch_keeps_board_records() {
        let (_, ctl) = controller();
        ctl.set_mode("chip").unwrap();
        ctl.configure("50", "out", None).unwrap();
        ctl.set_mode("board").unwrap();

        let pins = ctl.list_pins();
        assert_eq!(pins.len(), topology::PIN_COUNT);
        let pin = pins.iter().find(|d| d.board == 11).unwrap();
        assert_eq!(pin.chip, 50);
        assert_eq!(
            pin.configuration,
            Some(PinConfiguration {
                direction: Direction::Output,
                pull: Pull::None
            })
        );
        assert!(pins.iter().filter(|d| d.configuration.is_some()).count() == 1);
    }

    #[test]
    fn failed_setup_is_not_recorded() {
        let (backend, ctl) = controller();
        ctl.set_mode("board").unwrap();
        *backend.failing.lock() = true;

        let err = ctl.configure("12", "in", Some("up")).unwrap_err();
        assert!(matches!(
            err,
            AppError::HardwareConfig {
                pin: 12,
                direction: Direction::Input,
                ..
            }
        ));
        assert_eq!(ctl.pin_configuration(12), None);
    }

    #[test]
    fn read_does_not_require_configuration() {
        let (backend, ctl) = controller();
        assert!(matches!(ctl.read_pin("11"), Err(AppError::ModeNotSet)));

        ctl.set_mode("board").unwrap();
        *backend.read_value.lock() = 1;
        assert_eq!(
            ctl.read_pin("11").unwrap(),
            PinStateResult {
                pin: 11,
                state: true
            }
        );
        *backend.read_value.lock() = 0;
        assert!(!ctl.read_pin("11").unwrap().state);
        assert_eq!(backend.calls(), vec![Call::Read(11), Call::Read(11)]);
    }

    #[test]
    fn read_reports_undefined_and_failed_levels() {
        let (backend, ctl) = controller();
        ctl.set_mode("board").unwrap();

        *backend.read_value.lock() = 7;
        assert!(matches!(
            ctl.read_pin("13"),
            Err(AppError::UndefinedLevel { pin: 13, raw: 7 })
        ));

        *backend.failing.lock() = true;
        assert!(matches!(
            ctl.read_pin("13"),
            Err(AppError::ReadFailed { pin: 13, .. })
        ));

        assert!(matches!(
            ctl.read_pin("14"),
            Err(AppError::InvalidPin { .. })
        ));
    }

    #[test]
    fn read_and_write_pass_chip_numbers_through() {
        let (backend, ctl) = controller();
        ctl.set_mode("chip").unwrap();

        assert_eq!(ctl.read_pin("216").unwrap().pin, 216);
        ctl.write_pin("216", "1").unwrap();
        assert_eq!(
            backend.calls(),
            vec![Call::Read(216), Call::Write(216, Level::High)]
        );
    }

    #[test]
    fn write_tokens_map_to_levels() {
        let (backend, ctl) = controller();
        ctl.set_mode("board").unwrap();

        for (token, state) in [("1", true), ("true", true), ("0", false), ("false", false)] {
            assert_eq!(
                ctl.write_pin("7", token).unwrap(),
                PinStateResult { pin: 7, state }
            );
        }
        assert_eq!(
            backend.calls(),
            vec![
                Call::Write(7, Level::High),
                Call::Write(7, Level::High),
                Call::Write(7, Level::Low),
                Call::Write(7, Level::Low),
            ]
        );

        for token in ["on", "TRUE", "2", ""] {
            assert!(matches!(
                ctl.write_pin("7", token),
                Err(AppError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn write_checks_pin_before_state() {
        let (backend, ctl) = controller();
        assert!(matches!(ctl.write_pin("7", "on"), Err(AppError::ModeNotSet)));

        ctl.set_mode("board").unwrap();
        assert!(matches!(
            ctl.write_pin("8", "on"),
            Err(AppError::InvalidPin { .. })
        ));

        *backend.failing.lock() = true;
        assert!(matches!(
            ctl.write_pin("7", "0"),
            Err(AppError::WriteFailed { pin: 7, .. })
        ));
    }
}
