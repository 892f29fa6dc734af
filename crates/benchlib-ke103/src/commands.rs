//! Pure command builders and response parsing for the KE103 load.
//!
//! The KE103 speaks plain SCPI, one LF-terminated command per line.
//! Setpoints carry a unit suffix on the wire (`:CURR 0.050A`), and
//! measurement replies echo one back (`0.10000V`); [`parse_value`]
//! strips it before numeric conversion.

use benchlib_core::error::{Error, Result};

/// Operating function of the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionMode {
    /// Constant voltage.
    ConstantVoltage,
    /// Constant current.
    ConstantCurrent,
    /// Constant resistance.
    ConstantResistance,
    /// Constant power.
    ConstantPower,
    /// Short-circuit test.
    Short,
}

impl FunctionMode {
    /// SCPI mnemonic for this function.
    pub fn mnemonic(self) -> &'static str {
        match self {
            FunctionMode::ConstantVoltage => "VOLT",
            FunctionMode::ConstantCurrent => "CURR",
            FunctionMode::ConstantResistance => "RES",
            FunctionMode::ConstantPower => "POW",
            FunctionMode::Short => "SHORT",
        }
    }

    /// Parse a `:FUNC?` reply.
    pub fn from_mnemonic(s: &str) -> Result<FunctionMode> {
        match s.trim() {
            "VOLT" => Ok(FunctionMode::ConstantVoltage),
            "CURR" => Ok(FunctionMode::ConstantCurrent),
            "RES" => Ok(FunctionMode::ConstantResistance),
            "POW" => Ok(FunctionMode::ConstantPower),
            "SHORT" => Ok(FunctionMode::Short),
            other => Err(Error::MalformedResponse {
                raw: other.as_bytes().to_vec(),
            }),
        }
    }
}

fn line(cmd: &str) -> Vec<u8> {
    let mut out = cmd.as_bytes().to_vec();
    out.push(b'\n');
    out
}

/// Setpoint command with a unit-suffixed decimal value, three decimals.
fn set_value(op: &str, value: f64, unit: &str) -> Vec<u8> {
    line(&format!("{} {:.3}{}", op, value, unit))
}

/// Query product identification.
pub fn cmd_identify() -> Vec<u8> {
    line("*IDN?")
}

/// Store the current unit state in a memory slot.
pub fn cmd_save(slot: u8) -> Vec<u8> {
    line(&format!("*SAV {}", slot))
}

/// Recall a stored unit state.
pub fn cmd_recall(slot: u8) -> Vec<u8> {
    line(&format!("*RCL {}", slot))
}

/// Simulate an external trigger.
pub fn cmd_trigger() -> Vec<u8> {
    line("*TRG")
}

/// Enable or disable the system beeper.
pub fn cmd_set_beep(on: bool) -> Vec<u8> {
    line(&format!(":SYST:BEEP {}", if on { 1 } else { 0 }))
}

/// Enable or disable the load input.
pub fn cmd_set_input(on: bool) -> Vec<u8> {
    line(&format!(":INP {}", if on { 1 } else { 0 }))
}

/// Query the load input state.
pub fn cmd_read_input() -> Vec<u8> {
    line(":INP?")
}

/// Select the operating function.
pub fn cmd_set_function(mode: FunctionMode) -> Vec<u8> {
    line(&format!(":FUNC {}", mode.mnemonic()))
}

/// Query the operating function.
pub fn cmd_read_function() -> Vec<u8> {
    line(":FUNC?")
}

/// Set the CV voltage setpoint.
pub fn cmd_set_voltage(volts: f64) -> Vec<u8> {
    set_value(":VOLT", volts, "V")
}

/// Set the CC current setpoint.
pub fn cmd_set_current(amps: f64) -> Vec<u8> {
    set_value(":CURR", amps, "A")
}

/// Set the CR resistance setpoint.
pub fn cmd_set_resistance(ohms: f64) -> Vec<u8> {
    set_value(":RES", ohms, "OHM")
}

/// Set the CW power setpoint.
pub fn cmd_set_power(watts: f64) -> Vec<u8> {
    set_value(":POW", watts, "W")
}

/// Query the CV voltage setpoint.
pub fn cmd_read_voltage() -> Vec<u8> {
    line(":VOLT?")
}

/// Query the CC current setpoint.
pub fn cmd_read_current() -> Vec<u8> {
    line(":CURR?")
}

/// Query the CR resistance setpoint.
pub fn cmd_read_resistance() -> Vec<u8> {
    line(":RES?")
}

/// Query the CW power setpoint.
pub fn cmd_read_power() -> Vec<u8> {
    line(":POW?")
}

/// Query the upper limit of a setpoint family (`:CURR:UPP?` etc).
pub fn cmd_read_upper_limit(op: &str) -> Vec<u8> {
    line(&format!("{}:UPP?", op))
}

/// Query the lower limit of a setpoint family (`:CURR:LOW?` etc).
pub fn cmd_read_lower_limit(op: &str) -> Vec<u8> {
    line(&format!("{}:LOW?", op))
}

/// Measure the voltage across the load terminals.
pub fn cmd_measure_voltage() -> Vec<u8> {
    line(":MEAS:VOLT?")
}

/// Measure the current through the load.
pub fn cmd_measure_current() -> Vec<u8> {
    line(":MEAS:CURR?")
}

/// Measure the power dissipated in the load.
pub fn cmd_measure_power() -> Vec<u8> {
    line(":MEAS:POW?")
}

/// Configure battery-discharge mode: discharge current, then the three
/// cutoff conditions (voltage, capacity, time).
pub fn cmd_set_battery(
    amps: f64,
    cutoff_volts: f64,
    cutoff_amp_hours: f64,
    cutoff_seconds: u32,
) -> Vec<u8> {
    line(&format!(
        ":BATT {:.3}A,{:.3}V,{:.3}AH,{}S",
        amps, cutoff_volts, cutoff_amp_hours, cutoff_seconds
    ))
}

/// Recall a stored battery-mode setup.
pub fn cmd_recall_battery(slot: u8) -> Vec<u8> {
    line(&format!(":RCL:BATT {}", slot))
}

/// Query the elapsed battery test time.
pub fn cmd_read_battery_time() -> Vec<u8> {
    line(":BATT:TIM?")
}

/// Query the accumulated battery test capacity.
pub fn cmd_read_battery_capacity() -> Vec<u8> {
    line(":BATT:CAP?")
}

/// Configure the dynamic (pulsed CC) test mode: two current levels with
/// their dwell times.
pub fn cmd_set_dynamic(
    level_a_amps: f64,
    dwell_a_seconds: f64,
    level_b_amps: f64,
    dwell_b_seconds: f64,
) -> Vec<u8> {
    line(&format!(
        ":DYN 1,{:.3}A,{:.3}S,{:.3}A,{:.3}S",
        level_a_amps, dwell_a_seconds, level_b_amps, dwell_b_seconds
    ))
}

/// Query the dynamic test mode setup.
pub fn cmd_read_dynamic() -> Vec<u8> {
    line(":DYN?")
}

/// Parse a unit-suffixed numeric reply such as `0.10000V` or `2.500OHM`.
///
/// Trailing ASCII letters and surrounding whitespace are stripped before
/// conversion; anything that does not then parse as a decimal number is
/// a malformed response.
pub fn parse_value(reply: &str) -> Result<f64> {
    let trimmed = reply.trim();
    let numeric = trimmed.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    numeric.parse::<f64>().map_err(|_| Error::MalformedResponse {
        raw: reply.as_bytes().to_vec(),
    })
}

/// Parse a `:INP?`-style boolean reply (`1`/`0`, `ON`/`OFF`).
pub fn parse_switch(reply: &str) -> Result<bool> {
    match reply.trim() {
        "1" | "ON" => Ok(true),
        "0" | "OFF" => Ok(false),
        _ => Err(Error::MalformedResponse {
            raw: reply.as_bytes().to_vec(),
        }),
    }
}
