//! PSG9080 command builders.
//!
//! This module provides functions to construct command byte sequences
//! for the documented function-code table (channel output, waveform,
//! frequency, amplitude, offset, duty, phase, modulation, sweep, burst,
//! measurement) and the enums for their coded parameters.
//!
//! All functions are pure -- they produce byte vectors without performing
//! any I/O. The caller is responsible for sending the bytes over a
//! transport and feeding received lines back into
//! [`crate::protocol::decode_response`].
//!
//! Function codes follow the vendor protocol PDF: `w10`..`w74` for
//! writes, the matching `r` codes for queries, plus `r81`/`r82` for the
//! measurement counter.

use benchlib_core::error::{Error, Result};
use benchlib_core::types::Channel;

use crate::protocol::encode_command;
use crate::units;

// ---------------------------------------------------------------
// Coded parameter enums
// ---------------------------------------------------------------

/// Output waveform selection for `w11`/`w12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Pulse,
    Triangle,
    Slope,
    Cmos,
    Dc,
    PartialSine,
    HalfWave,
    FullWave,
    PosLadder,
    NegLadder,
    PosTrapezoid,
    NegTrapezoid,
    Noise,
    ExpRise,
    ExpFall,
    LogRise,
    LogFall,
    SinkerPulse,
    MultiAudio,
    Lorenz,
    /// Arbitrary wave slot 1-99, sent as codes 101-199.
    Arbitrary(u8),
}

impl Waveform {
    /// The wire code for this waveform.
    pub fn code(&self) -> u16 {
        match self {
            Waveform::Sine => 0,
            Waveform::Square => 1,
            Waveform::Pulse => 2,
            Waveform::Triangle => 3,
            Waveform::Slope => 4,
            Waveform::Cmos => 5,
            Waveform::Dc => 6,
            Waveform::PartialSine => 7,
            Waveform::HalfWave => 8,
            Waveform::FullWave => 9,
            Waveform::PosLadder => 10,
            Waveform::NegLadder => 11,
            Waveform::PosTrapezoid => 12,
            Waveform::NegTrapezoid => 13,
            Waveform::Noise => 14,
            Waveform::ExpRise => 15,
            Waveform::ExpFall => 16,
            Waveform::LogRise => 17,
            Waveform::LogFall => 18,
            Waveform::SinkerPulse => 19,
            Waveform::MultiAudio => 20,
            Waveform::Lorenz => 21,
            Waveform::Arbitrary(slot) => 100 + *slot as u16,
        }
    }

    /// Look up a waveform from its wire code.
    pub fn from_code(code: u16) -> Result<Self> {
        Ok(match code {
            0 => Waveform::Sine,
            1 => Waveform::Square,
            2 => Waveform::Pulse,
            3 => Waveform::Triangle,
            4 => Waveform::Slope,
            5 => Waveform::Cmos,
            6 => Waveform::Dc,
            7 => Waveform::PartialSine,
            8 => Waveform::HalfWave,
            9 => Waveform::FullWave,
            10 => Waveform::PosLadder,
            11 => Waveform::NegLadder,
            12 => Waveform::PosTrapezoid,
            13 => Waveform::NegTrapezoid,
            14 => Waveform::Noise,
            15 => Waveform::ExpRise,
            16 => Waveform::ExpFall,
            17 => Waveform::LogRise,
            18 => Waveform::LogFall,
            19 => Waveform::SinkerPulse,
            20 => Waveform::MultiAudio,
            21 => Waveform::Lorenz,
            101..=199 => Waveform::Arbitrary((code - 100) as u8),
            other => {
                return Err(Error::InvalidParameter(format!(
                    "unknown waveform code {}",
                    other
                )))
            }
        })
    }

    /// Validate an arbitrary-wave slot (1-99).
    pub fn arbitrary(slot: u8) -> Result<Self> {
        if (1..=99).contains(&slot) {
            Ok(Waveform::Arbitrary(slot))
        } else {
            Err(Error::InvalidParameter(format!(
                "arbitrary wave slot {} out of range 1-99",
                slot
            )))
        }
    }
}

/// Modulation type for `w40`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationType {
    Am,
    Fm,
    Pm,
    Ask,
    Fsk,
    Psk,
    Pulse,
    Burst,
}

impl ModulationType {
    pub fn code(&self) -> u8 {
        match self {
            ModulationType::Am => 0,
            ModulationType::Fm => 1,
            ModulationType::Pm => 2,
            ModulationType::Ask => 3,
            ModulationType::Fsk => 4,
            ModulationType::Psk => 5,
            ModulationType::Pulse => 6,
            ModulationType::Burst => 7,
        }
    }
}

/// Built-in modulating wave for `w41`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulatingWave {
    Sine,
    Square,
    Triangle,
    RisingSaw,
    FallingSaw,
    Arb101,
    Arb102,
    Arb103,
    Arb104,
    Arb105,
}

impl ModulatingWave {
    pub fn code(&self) -> u8 {
        match self {
            ModulatingWave::Sine => 0,
            ModulatingWave::Square => 1,
            ModulatingWave::Triangle => 2,
            ModulatingWave::RisingSaw => 3,
            ModulatingWave::FallingSaw => 4,
            ModulatingWave::Arb101 => 5,
            ModulatingWave::Arb102 => 6,
            ModulatingWave::Arb103 => 7,
            ModulatingWave::Arb104 => 8,
            ModulatingWave::Arb105 => 9,
        }
    }
}

/// Trigger source for `w60`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Key,
    Internal,
    ExternalAc,
    ExternalDc,
}

impl TriggerSource {
    pub fn code(&self) -> u8 {
        match self {
            TriggerSource::Key => 0,
            TriggerSource::Internal => 1,
            TriggerSource::ExternalAc => 2,
            TriggerSource::ExternalDc => 3,
        }
    }
}

/// Sweep direction for `w64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    Increasing,
    Decreasing,
    BackAndForth,
}

impl SweepDirection {
    pub fn code(&self) -> u8 {
        match self {
            SweepDirection::Increasing => 0,
            SweepDirection::Decreasing => 1,
            SweepDirection::BackAndForth => 2,
        }
    }
}

/// Burst idle level for `w58`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstIdle {
    Zero,
    PositiveMax,
    NegativeMax,
}

impl BurstIdle {
    pub fn code(&self) -> u8 {
        match self {
            BurstIdle::Zero => 0,
            BurstIdle::PositiveMax => 1,
            BurstIdle::NegativeMax => 2,
        }
    }
}

/// Preset memory operation codes for `w26`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOp {
    Load,
    Save,
    ClearSlot,
    ClearAll,
}

impl MemoryOp {
    pub fn code(&self) -> u16 {
        match self {
            MemoryOp::Load => 111,
            MemoryOp::Save => 222,
            MemoryOp::ClearSlot => 333,
            MemoryOp::ClearAll => 444,
        }
    }
}

// ---------------------------------------------------------------
// Opcode selection helpers
// ---------------------------------------------------------------

fn bool_field(v: bool) -> &'static str {
    if v {
        "1"
    } else {
        "0"
    }
}

/// Pick the per-channel write opcode from a `(CH1, CH2)` pair.
fn ch_opcode(ch: Channel, ch1: &'static str, ch2: &'static str) -> &'static str {
    match ch {
        Channel::Ch1 => ch1,
        Channel::Ch2 => ch2,
    }
}

/// Build the query line for a read opcode (`:rNN=0.`).
fn query(opcode: &str) -> Vec<u8> {
    encode_command(opcode, &["0"])
}

// ---------------------------------------------------------------
// Channel output, waveform, and basic parameters (w10..w22)
// ---------------------------------------------------------------

/// Build a "set channel output enable" command (`w10`).
///
/// Both channels are set in one command; read the current state first
/// (via [`cmd_read_output`]) to toggle one channel without disturbing
/// the other.
pub fn cmd_set_output(ch1_on: bool, ch2_on: bool) -> Vec<u8> {
    encode_command("w10", &[bool_field(ch1_on), bool_field(ch2_on)])
}

/// Build a "read channel output enable" query (`r10`).
pub fn cmd_read_output() -> Vec<u8> {
    query("r10")
}

/// Build a "set waveform" command (`w11`/`w12`).
pub fn cmd_set_waveform(ch: Channel, wf: Waveform) -> Vec<u8> {
    encode_command(ch_opcode(ch, "w11", "w12"), &[&wf.code().to_string()])
}

/// Build a "read waveform" query (`r11`/`r12`).
pub fn cmd_read_waveform(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r11", "r12"))
}

/// Build a "set frequency" command (`w13`/`w14`).
///
/// The frequency is encoded as a `(scaled, unit_code)` pair by
/// [`units::encode_frequency`]; fails for negative or unrepresentable
/// frequencies.
pub fn cmd_set_frequency(ch: Channel, hz: f64) -> Result<Vec<u8>> {
    let (scaled, unit) = units::encode_frequency(hz)?;
    Ok(encode_command(
        ch_opcode(ch, "w13", "w14"),
        &[&scaled.to_string(), &unit.code().to_string()],
    ))
}

/// Build a "read frequency" query (`r13`/`r14`).
pub fn cmd_read_frequency(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r13", "r14"))
}

/// Build a "set amplitude" command (`w15`/`w16`), peak-to-peak volts.
pub fn cmd_set_amplitude(ch: Channel, vpp: f64) -> Vec<u8> {
    encode_command(
        ch_opcode(ch, "w15", "w16"),
        &[&units::encode_amplitude(vpp).to_string()],
    )
}

/// Build a "read amplitude" query (`r15`/`r16`).
pub fn cmd_read_amplitude(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r15", "r16"))
}

/// Build a "set offset" command (`w17`/`w18`) with the raw device code.
///
/// The offset field uses a device-specific integer scale (1000 is 0 V on
/// current firmware); the raw code is exposed rather than guessing a
/// volts mapping the manual does not document.
pub fn cmd_set_offset_raw(ch: Channel, code: i32) -> Vec<u8> {
    encode_command(ch_opcode(ch, "w17", "w18"), &[&code.to_string()])
}

/// Build a "read offset" query (`r17`/`r18`).
pub fn cmd_read_offset_raw(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r17", "r18"))
}

/// Build a "set duty cycle" command (`w19`/`w20`), percent.
pub fn cmd_set_duty(ch: Channel, percent: f64) -> Vec<u8> {
    encode_command(
        ch_opcode(ch, "w19", "w20"),
        &[&units::encode_duty(percent).to_string()],
    )
}

/// Build a "read duty cycle" query (`r19`/`r20`).
pub fn cmd_read_duty(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r19", "r20"))
}

/// Build a "set phase" command (`w21`/`w22`), degrees.
pub fn cmd_set_phase(ch: Channel, degrees: f64) -> Vec<u8> {
    encode_command(
        ch_opcode(ch, "w21", "w22"),
        &[&units::encode_phase(degrees).to_string()],
    )
}

/// Build a "read phase" query (`r21`/`r22`).
pub fn cmd_read_phase(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r21", "r22"))
}

// ---------------------------------------------------------------
// Sync, memory, and panel settings (w25..w33)
// ---------------------------------------------------------------

/// Build a "set channel sync" command (`w25`).
///
/// Selects which CH1 parameters are mirrored to CH2: waveform,
/// frequency, amplitude, offset, duty, plus external-signal sync.
pub fn cmd_set_sync(
    waveform: bool,
    frequency: bool,
    amplitude: bool,
    offset: bool,
    duty: bool,
    external: bool,
) -> Vec<u8> {
    encode_command(
        "w25",
        &[
            bool_field(waveform),
            bool_field(frequency),
            bool_field(amplitude),
            bool_field(offset),
            bool_field(duty),
            bool_field(external),
        ],
    )
}

/// Build a "read channel sync" query (`r25`).
pub fn cmd_read_sync() -> Vec<u8> {
    query("r25")
}

/// Build a preset memory command (`w26`): load/save/clear a slot.
pub fn cmd_memory(slot: u8, op: MemoryOp) -> Vec<u8> {
    encode_command("w26", &[&slot.to_string(), &op.code().to_string()])
}

/// Build a "set key sound" command (`w27`).
pub fn cmd_set_key_sound(on: bool) -> Vec<u8> {
    encode_command("w27", &[bool_field(on)])
}

/// Build a "set display brightness" command (`w28`), percent.
pub fn cmd_set_brightness(percent: u8) -> Vec<u8> {
    encode_command("w28", &[&percent.to_string()])
}

/// Build a "set menu language" command (`w29`); `true` selects Chinese.
pub fn cmd_set_language(chinese: bool) -> Vec<u8> {
    encode_command("w29", &[bool_field(chinese)])
}

// ---------------------------------------------------------------
// Modulation (w40..w52)
// ---------------------------------------------------------------

/// Build a "set modulation types" command (`w40`), one per channel.
pub fn cmd_set_modulation_types(ch1: ModulationType, ch2: ModulationType) -> Vec<u8> {
    encode_command(
        "w40",
        &[&ch1.code().to_string(), &ch2.code().to_string()],
    )
}

/// Build a "set built-in modulating wave" command (`w41`).
pub fn cmd_set_modulating_wave(ch1: ModulatingWave, ch2: ModulatingWave) -> Vec<u8> {
    encode_command(
        "w41",
        &[&ch1.code().to_string(), &ch2.code().to_string()],
    )
}

/// Build a "set modulation source" command (`w42`).
///
/// The wire sense is inverted: 0 selects the internal source.
pub fn cmd_set_modulation_source(ch1_internal: bool, ch2_internal: bool) -> Vec<u8> {
    encode_command(
        "w42",
        &[bool_field(!ch1_internal), bool_field(!ch2_internal)],
    )
}

/// Build a "set modulating frequency" command (`w43`/`w44`), hertz with
/// 3 implied decimals.
pub fn cmd_set_modulation_frequency(ch: Channel, hz: f64) -> Vec<u8> {
    let scaled = (hz * 1000.0).round() as i64;
    encode_command(ch_opcode(ch, "w43", "w44"), &[&scaled.to_string()])
}

/// Build a "set AM depth" command (`w45`/`w46`), percent in 0.1 steps.
pub fn cmd_set_am_depth(ch: Channel, percent: f64) -> Vec<u8> {
    let scaled = (percent * 10.0).round() as i64;
    encode_command(ch_opcode(ch, "w45", "w46"), &[&scaled.to_string()])
}

/// Build a "read AM depth" query (`r45`/`r46`).
pub fn cmd_read_am_depth(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r45", "r46"))
}

/// Build a "set FM deviation" command (`w47`/`w48`), hertz in 0.1 steps.
pub fn cmd_set_fm_deviation(ch: Channel, hz: f64) -> Vec<u8> {
    let scaled = (hz * 10.0).round() as i64;
    encode_command(ch_opcode(ch, "w47", "w48"), &[&scaled.to_string()])
}

/// Build a "read FM deviation" query (`r47`/`r48`).
pub fn cmd_read_fm_deviation(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r47", "r48"))
}

/// Build a "set FSK hop frequency" command (`w49`/`w50`), hertz in 0.1 steps.
pub fn cmd_set_fsk_frequency(ch: Channel, hz: f64) -> Vec<u8> {
    let scaled = (hz * 10.0).round() as i64;
    encode_command(ch_opcode(ch, "w49", "w50"), &[&scaled.to_string()])
}

/// Build a "set PM deviation" command (`w51`/`w52`), degrees in 0.1 steps.
pub fn cmd_set_pm_deviation(ch: Channel, degrees: f64) -> Vec<u8> {
    let scaled = (degrees * 10.0).round() as i64;
    encode_command(ch_opcode(ch, "w51", "w52"), &[&scaled.to_string()])
}

/// Build a "read PM deviation" query (`r51`/`r52`).
pub fn cmd_read_pm_deviation(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r51", "r52"))
}

// ---------------------------------------------------------------
// Pulse and burst (w53..w61)
// ---------------------------------------------------------------

/// Build a "set pulse width" command (`w53`/`w54`), microseconds with
/// 3 implied decimals.
pub fn cmd_set_pulse_width(ch: Channel, microseconds: f64) -> Vec<u8> {
    let scaled = (microseconds * 1000.0).round() as i64;
    encode_command(ch_opcode(ch, "w53", "w54"), &[&scaled.to_string()])
}

/// Build a "read pulse width" query (`r53`/`r54`).
pub fn cmd_read_pulse_width(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r53", "r54"))
}

/// Build a "set pulse period" command (`w55`/`w56`), microseconds in
/// 0.01 steps.
pub fn cmd_set_pulse_period(ch: Channel, microseconds: f64) -> Vec<u8> {
    let scaled = (microseconds * 100.0).round() as i64;
    encode_command(ch_opcode(ch, "w55", "w56"), &[&scaled.to_string()])
}

/// Build a "read pulse period" query (`r55`/`r56`).
pub fn cmd_read_pulse_period(ch: Channel) -> Vec<u8> {
    query(ch_opcode(ch, "r55", "r56"))
}

/// Build a "set pulse inversion" command (`w57`).
pub fn cmd_set_pulse_invert(ch1_invert: bool, ch2_invert: bool) -> Vec<u8> {
    encode_command("w57", &[bool_field(ch1_invert), bool_field(ch2_invert)])
}

/// Build a "set burst idle level" command (`w58`).
pub fn cmd_set_burst_idle(ch1: BurstIdle, ch2: BurstIdle) -> Vec<u8> {
    encode_command("w58", &[&ch1.code().to_string(), &ch2.code().to_string()])
}

/// Build a "set output polarity" command (`w59`); `true` is negative.
pub fn cmd_set_polarity(ch1_negative: bool, ch2_negative: bool) -> Vec<u8> {
    encode_command("w59", &[bool_field(ch1_negative), bool_field(ch2_negative)])
}

/// Build a "set trigger source" command (`w60`).
pub fn cmd_set_trigger_source(ch1: TriggerSource, ch2: TriggerSource) -> Vec<u8> {
    encode_command("w60", &[&ch1.code().to_string(), &ch2.code().to_string()])
}

/// Build a "set burst pulse count" command (`w61`).
pub fn cmd_set_burst_count(ch1: u32, ch2: u32) -> Vec<u8> {
    encode_command("w61", &[&ch1.to_string(), &ch2.to_string()])
}

/// Build a "read burst pulse count" query (`r61`).
///
/// The response carries both channels' counts in one payload.
pub fn cmd_read_burst_count() -> Vec<u8> {
    query("r61")
}

// ---------------------------------------------------------------
// Measurement (w62, w63, r81, r82)
// ---------------------------------------------------------------

/// Build a "configure measurement" command (`w62`).
pub fn cmd_set_measurement(coupling_ac: bool, gate_time_ms: u32, low_freq_mode: bool) -> Vec<u8> {
    encode_command(
        "w62",
        &[
            bool_field(!coupling_ac),
            &gate_time_ms.to_string(),
            bool_field(low_freq_mode),
        ],
    )
}

/// Build a "measurement/counter enable" command (`w63`).
pub fn cmd_set_measurement_switches(measure_on: bool, counter_on: bool) -> Vec<u8> {
    encode_command("w63", &[bool_field(measure_on), bool_field(counter_on)])
}

/// Build a "read measured frequency" query (`r81` high band, `r82` low).
pub fn cmd_read_measured_frequency(high_band: bool) -> Vec<u8> {
    query(if high_band { "r81" } else { "r82" })
}

// ---------------------------------------------------------------
// Sweep, VCO, and calibration (w64..w74)
// ---------------------------------------------------------------

/// Build a "configure sweep" command (`w64`).
pub fn cmd_set_sweep(
    ch: Channel,
    sweep_time_ms: u32,
    direction: SweepDirection,
    logarithmic: bool,
) -> Vec<u8> {
    let ch_field = match ch {
        Channel::Ch1 => "0",
        Channel::Ch2 => "1",
    };
    encode_command(
        "w64",
        &[
            ch_field,
            &sweep_time_ms.to_string(),
            &direction.code().to_string(),
            bool_field(logarithmic),
        ],
    )
}

/// Build a "sweep / VCO enable" command (`w65`).
pub fn cmd_set_sweep_enable(sweep_on: bool, vco_on: bool) -> Vec<u8> {
    encode_command("w65", &[bool_field(sweep_on), bool_field(vco_on)])
}

/// Build a "set sweep start frequency" command (`w66`).
///
/// The wire format takes a single scaled value with 3 implied decimals;
/// the unit code produced by the frequency codec is not transmitted, so
/// a start frequency that only fits in kHz or MHz loses its unit on the
/// wire. This matches the documented vendor protocol; see the crate
/// docs before relying on sweeps above ~2 MHz.
pub fn cmd_set_sweep_start_frequency(hz: f64) -> Result<Vec<u8>> {
    let (scaled, _unit) = units::encode_frequency(hz)?;
    Ok(encode_command("w66", &[&scaled.to_string()]))
}

/// Build a "set sweep end frequency" command (`w67`).
///
/// Same single-value wire format (and unit-code caveat) as
/// [`cmd_set_sweep_start_frequency`].
pub fn cmd_set_sweep_end_frequency(hz: f64) -> Result<Vec<u8>> {
    let (scaled, _unit) = units::encode_frequency(hz)?;
    Ok(encode_command("w67", &[&scaled.to_string()]))
}

/// Build a "set sweep start amplitude" command (`w68`), Vpp.
pub fn cmd_set_sweep_start_amplitude(vpp: f64) -> Vec<u8> {
    encode_command("w68", &[&units::encode_amplitude(vpp).to_string()])
}

/// Build a "set sweep end amplitude" command (`w69`), Vpp.
pub fn cmd_set_sweep_end_amplitude(vpp: f64) -> Vec<u8> {
    encode_command("w69", &[&units::encode_amplitude(vpp).to_string()])
}

/// Build a "set sweep start duty" command (`w70`), percent.
pub fn cmd_set_sweep_start_duty(percent: f64) -> Vec<u8> {
    encode_command("w70", &[&units::encode_duty(percent).to_string()])
}

/// Build a "set sweep end duty" command (`w71`), percent.
pub fn cmd_set_sweep_end_duty(percent: f64) -> Vec<u8> {
    encode_command("w71", &[&units::encode_duty(percent).to_string()])
}

/// Build a "set minimum output voltage calibration" command (`w72`).
pub fn cmd_set_min_voltage_cal(code: i32) -> Vec<u8> {
    encode_command("w72", &[&code.to_string()])
}

/// Build a "set maximum output voltage calibration" command (`w73`).
pub fn cmd_set_max_voltage_cal(code: i32) -> Vec<u8> {
    encode_command("w73", &[&code.to_string()])
}

/// Build a "manual trigger" command (`w74`), one flag per channel.
pub fn cmd_trigger(ch1: bool, ch2: bool) -> Vec<u8> {
    encode_command("w74", &[bool_field(ch1), bool_field(ch2)])
}
