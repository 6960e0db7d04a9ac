use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, ParseDurationError};

/// GPIO numbers usable on the target board, ascending. 21 is not routed.
pub const GPIO_PINS: [u32; 25] = [
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 22, 23, 24, 25, 26, 27,
];

pub const DEFAULT_PIN: u32 = 18;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

const NANOS_PER_SEC: u128 = 1_000_000_000;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    #[default]
    Timer,
    Toggle,
}

impl ControlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlType::Timer => "timer",
            ControlType::Toggle => "toggle",
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated settings for a single controller run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlConfig {
    control_type: ControlType,
    pin: u32,
    delay: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            control_type: ControlType::default(),
            pin: DEFAULT_PIN,
            delay: DEFAULT_DELAY,
        }
    }
}

impl ControlConfig {
    pub fn control_type(&self) -> ControlType {
        self.control_type
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Time the pin is held high in timer mode.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Raw, unvalidated controller options.
///
/// Every field accepts the empty string as "use the default". Options can be
/// set one by one with the chained setters or deserialized from a JSON file,
/// and are validated together by [`ControlOptions::build`].
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ControlOptions {
    #[serde(rename = "type")]
    pub control_type: String,
    pub pin: String,
    pub delay: String,
    pub sysfs_root: Option<PathBuf>,
}

impl ControlOptions {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let contents = fs::read_to_string(&path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Invalid config json: {e}")))
    }

    pub fn control_type(mut self, control_type: impl Into<String>) -> Self {
        self.control_type = control_type.into();
        self
    }

    pub fn pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = pin.into();
        self
    }

    pub fn delay(mut self, delay: impl Into<String>) -> Self {
        self.delay = delay.into();
        self
    }

    pub fn sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = Some(root.into());
        self
    }

    /// Validates the options in order type, pin, delay. The first error wins.
    pub fn build(&self) -> Result<ControlConfig, AppError> {
        Ok(ControlConfig {
            control_type: parse_control_type(&self.control_type)?,
            pin: parse_pin(&self.pin)?,
            delay: parse_delay(&self.delay)?,
        })
    }
}

pub fn parse_control_type(control_type: &str) -> Result<ControlType, AppError> {
    match control_type.trim() {
        "" => Ok(ControlType::default()),
        "timer" => Ok(ControlType::Timer),
        "toggle" => Ok(ControlType::Toggle),
        _ => Err(AppError::InvalidControlType(control_type.to_string())),
    }
}

/// Accepts only the exact decimal form of a whitelisted pin.
pub fn parse_pin(pin: &str) -> Result<u32, AppError> {
    if pin.is_empty() {
        return Ok(DEFAULT_PIN);
    }
    GPIO_PINS
        .iter()
        .copied()
        .find(|p| p.to_string() == pin)
        .ok_or_else(|| AppError::InvalidPin {
            pin: pin.to_string(),
            valid: GPIO_PINS.to_vec(),
        })
}

pub fn parse_delay(delay: &str) -> Result<Duration, AppError> {
    if delay.is_empty() {
        return Ok(DEFAULT_DELAY);
    }
    parse_duration(delay).map_err(|source| AppError::InvalidDelay {
        input: delay.to_string(),
        source,
    })
}

/// Parses a sequence of `<number><unit>` terms such as `10ms`, `1.5s` or `1h30m`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare `0` needs no unit.
pub fn parse_duration(s: &str) -> Result<Duration, ParseDurationError> {
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(ParseDurationError::NoDigits(s.into()));
    }
    let mut nanos: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let n = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if n == 0 {
            return Err(ParseDurationError::NoDigits(s.into()));
        }
        let (num, tail) = rest.split_at(n);
        let u = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (units, tail) = tail.split_at(u);
        let scale = match units {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3600 * NANOS_PER_SEC,
            "" => return Err(ParseDurationError::MissingUnits(s.into())),
            _ => return Err(ParseDurationError::Units(s.into())),
        };
        nanos = nanos
            .checked_add(scale_term(s, num, scale)?)
            .ok_or_else(|| ParseDurationError::Overflow(s.into()))?;
        rest = tail;
    }
    let secs = u64::try_from(nanos / NANOS_PER_SEC)
        .map_err(|_| ParseDurationError::Overflow(s.into()))?;
    Ok(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

fn scale_term(s: &str, num: &str, scale: u128) -> Result<u128, ParseDurationError> {
    let (whole, frac) = num.split_once('.').unwrap_or((num, ""));
    if (whole.is_empty() && frac.is_empty()) || frac.contains('.') {
        return Err(ParseDurationError::Malformed(s.into()));
    }
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        // digits only, so this can only fail on overflow
        whole
            .parse()
            .map_err(|_| ParseDurationError::Overflow(s.into()))?
    };
    let mut nanos = whole
        .checked_mul(scale)
        .ok_or_else(|| ParseDurationError::Overflow(s.into()))?;
    let mut place = scale;
    for c in frac.chars() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| ParseDurationError::Malformed(s.into()))?;
        place /= 10;
        nanos = nanos
            .checked_add(u128::from(digit) * place)
            .ok_or_else(|| ParseDurationError::Overflow(s.into()))?;
    }
    Ok(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_use_defaults() {
        let cfg = ControlOptions::default().build().expect("defaults are valid");
        assert_eq!(cfg, ControlConfig::default());
        assert_eq!(cfg.control_type(), ControlType::Timer);
        assert_eq!(cfg.pin(), 18);
        assert_eq!(cfg.delay(), Duration::from_secs(2));
    }

    #[test]
    fn control_type() {
        assert_eq!(parse_control_type("toggle").unwrap(), ControlType::Toggle);
        assert_eq!(parse_control_type(" timer\n").unwrap(), ControlType::Timer);
        assert_eq!(parse_control_type("   ").unwrap(), ControlType::Timer);
        match parse_control_type("Toggle") {
            Err(AppError::InvalidControlType(v)) => assert_eq!(v, "Toggle"),
            other => panic!("unexpected result: {other:?}"),
        }
        let err = parse_control_type("pulse").unwrap_err();
        assert_eq!(err.to_string(), "Invalid control type: pulse");
    }

    #[test]
    fn whitelisted_pins_are_accepted() {
        for pin in GPIO_PINS {
            assert_eq!(parse_pin(&pin.to_string()).unwrap(), pin);
        }
    }

    #[test]
    fn other_pins_are_rejected() {
        for pin in ["21", "0", "1", "28", "04", " 4", "+4", "-4", "gpio4", "18 "] {
            match parse_pin(pin) {
                Err(AppError::InvalidPin { pin: p, valid }) => {
                    assert_eq!(p, pin);
                    assert_eq!(valid, GPIO_PINS.to_vec());
                }
                other => panic!("{pin:?} unexpectedly gave {other:?}"),
            }
        }
    }

    #[test]
    fn pin_error_lists_sorted_whitelist() {
        let msg = parse_pin("21").unwrap_err().to_string();
        assert!(msg.starts_with("Invalid GPIO pin number: 21"));
        assert!(msg.contains("[2, 3, 4, 5"));
        assert!(msg.ends_with("25, 26, 27]"));
        assert!(!msg.contains("20, 21"));
    }

    #[test]
    fn delay() {
        assert_eq!(parse_delay("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_delay("10ms").unwrap(), Duration::from_millis(10));
        assert_eq!(parse_delay("0").unwrap(), Duration::ZERO);
        let err = parse_delay("abc").unwrap_err();
        assert!(matches!(err, AppError::InvalidDelay { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid time delay format: abc (use 1ms, 1s, 1m, 1h)"
        );
    }

    #[test]
    fn duration() {
        assert_eq!(parse_duration("3us").unwrap(), Duration::from_micros(3));
        assert_eq!(parse_duration("3µs").unwrap(), Duration::from_micros(3));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration(".25s").unwrap(), Duration::from_millis(250));
        assert_eq!(
            parse_duration("1s500ms").unwrap(),
            Duration::from_millis(1500)
        );
        assert_eq!(
            parse_duration("abc").unwrap_err(),
            ParseDurationError::NoDigits("abc".to_string())
        );
        assert_eq!(
            parse_duration("-1s").unwrap_err(),
            ParseDurationError::NoDigits("-1s".to_string())
        );
        assert_eq!(
            parse_duration("5").unwrap_err(),
            ParseDurationError::MissingUnits("5".to_string())
        );
        assert_eq!(
            parse_duration("5d").unwrap_err(),
            ParseDurationError::Units("5d".to_string())
        );
        assert_eq!(
            parse_duration("1.2.3s").unwrap_err(),
            ParseDurationError::Malformed("1.2.3s".to_string())
        );
        assert_eq!(
            parse_duration(".s").unwrap_err(),
            ParseDurationError::Malformed(".s".to_string())
        );
        assert!(matches!(
            parse_duration("99999999999999999999999999h"),
            Err(ParseDurationError::Overflow(_))
        ));
        // whole part fits, the fraction pushes it past the limit
        assert!(matches!(
            parse_duration("340282366920938463463374607431768211.9us"),
            Err(ParseDurationError::Overflow(_))
        ));
    }

    #[test]
    fn first_error_wins() {
        let err = ControlOptions::default()
            .control_type("blink")
            .pin("21")
            .delay("abc")
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidControlType(_)));

        let err = ControlOptions::default()
            .pin("21")
            .delay("abc")
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPin { .. }));
    }

    #[test]
    fn options_from_json() {
        let opts: ControlOptions =
            serde_json::from_str(r#"{ "type": "toggle", "pin": "4" }"#).expect("valid json");
        assert_eq!(opts.sysfs_root, None);
        let cfg = opts.build().unwrap();
        assert_eq!(cfg.control_type(), ControlType::Toggle);
        assert_eq!(cfg.pin(), 4);
        assert_eq!(cfg.delay(), DEFAULT_DELAY);
    }
}
