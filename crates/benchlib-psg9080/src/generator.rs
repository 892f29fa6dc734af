//! Psg9080 -- the connected-instrument driver.
//!
//! This module ties the line protocol ([`crate::protocol`]), the command
//! builders ([`crate::commands`]), and the numeric codecs
//! ([`crate::units`]) to a [`Transport`] to produce a working PSG9080
//! backend.
//!
//! Write commands are fire-and-forget: the instrument does not produce a
//! reply the driver waits for. Queries send an `r`-opcode line and block
//! on one CRLF-terminated response, bounded by the configured timeout.
//! A single `Psg9080` owns its transport exclusively; drive it from one
//! task, or wrap it yourself if you need sharing.

use std::time::Duration;

use tracing::{debug, trace};

use benchlib_core::error::{Error, Result};
use benchlib_core::transport::{read_line, Transport};
use benchlib_core::types::Channel;

use crate::commands;
use crate::protocol::{self, DecodeResult};
use crate::units;
use crate::verify::VerifyPolicy;

/// A connected PSG9080 function/arbitrary waveform generator.
///
/// Constructed via [`Psg9080Builder`](crate::builder::Psg9080Builder).
/// All instrument communication goes through the [`Transport`] provided
/// at build time.
pub struct Psg9080 {
    transport: Box<dyn Transport>,
    command_timeout: Duration,
    pub(crate) verify_policy: VerifyPolicy,
}

impl Psg9080 {
    /// Create a new `Psg9080` from its constituent parts.
    ///
    /// This is called by [`Psg9080Builder`](crate::builder::Psg9080Builder);
    /// callers should use the builder API instead.
    pub(crate) fn new(transport: Box<dyn Transport>, command_timeout: Duration) -> Self {
        Psg9080 {
            transport,
            command_timeout,
            verify_policy: VerifyPolicy::default(),
        }
    }

    /// Send a write command. No response is expected.
    pub async fn execute_set(&mut self, cmd: &[u8]) -> Result<()> {
        trace!(cmd = %String::from_utf8_lossy(cmd).trim_end(), "PSG9080 set");
        self.transport.send(cmd).await
    }

    /// Send a query and decode the response payload into field strings.
    ///
    /// The response opcode must answer the query's function code: a
    /// `:r13=0.` query is answered by `:r13=...`; anything else is a
    /// malformed response. The returned fields have the payload's
    /// trailing `.` stripped and are split on commas.
    pub async fn execute_query(&mut self, cmd: &[u8]) -> Result<Vec<String>> {
        trace!(cmd = %String::from_utf8_lossy(cmd).trim_end(), "PSG9080 query");

        // Function code of the outgoing query, e.g. "13" from ":r13=0.".
        let expected_code = query_function_code(cmd)?;

        self.transport.send(cmd).await?;
        let line = read_line(self.transport.as_mut(), self.command_timeout).await?;

        match protocol::decode_response(&line) {
            DecodeResult::Response {
                opcode, payload, ..
            } => {
                if opcode[1..] != expected_code {
                    debug!(%opcode, %expected_code, "response opcode does not answer query");
                    return Err(Error::MalformedResponse { raw: line });
                }
                Ok(protocol::split_fields(&payload)
                    .into_iter()
                    .map(str::to_string)
                    .collect())
            }
            DecodeResult::Malformed(_) | DecodeResult::Incomplete => {
                Err(Error::MalformedResponse { raw: line })
            }
        }
    }

    /// Close the underlying transport. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Whether the underlying transport is open.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    // ---------------------------------------------------------------
    // Output, waveform, and basic parameters
    // ---------------------------------------------------------------

    /// Set both channel output switches in one command.
    pub async fn set_output(&mut self, ch1_on: bool, ch2_on: bool) -> Result<()> {
        self.execute_set(&commands::cmd_set_output(ch1_on, ch2_on)).await
    }

    /// Read both channel output switches.
    pub async fn get_output(&mut self) -> Result<(bool, bool)> {
        let fields = self.execute_query(&commands::cmd_read_output()).await?;
        if fields.len() != 2 {
            return Err(Error::MalformedResponse {
                raw: fields.join(",").into_bytes(),
            });
        }
        Ok((fields[0] == "1", fields[1] == "1"))
    }

    /// Enable or disable one channel's output without disturbing the other.
    ///
    /// The output switch command always carries both channels, so the
    /// other channel's current state is read back first.
    pub async fn set_channel_output(&mut self, ch: Channel, on: bool) -> Result<()> {
        let (ch1, ch2) = self.get_output().await?;
        match ch {
            Channel::Ch1 => self.set_output(on, ch2).await,
            Channel::Ch2 => self.set_output(ch1, on).await,
        }
    }

    /// Select the output waveform for a channel.
    pub async fn set_waveform(&mut self, ch: Channel, wf: commands::Waveform) -> Result<()> {
        self.execute_set(&commands::cmd_set_waveform(ch, wf)).await
    }

    /// Read the output waveform of a channel.
    pub async fn get_waveform(&mut self, ch: Channel) -> Result<commands::Waveform> {
        let fields = self.execute_query(&commands::cmd_read_waveform(ch)).await?;
        let code = parse_field::<u16>(&fields, 0)?;
        commands::Waveform::from_code(code)
    }

    /// Set a channel's frequency in hertz.
    pub async fn set_frequency(&mut self, ch: Channel, hz: f64) -> Result<()> {
        self.execute_set(&commands::cmd_set_frequency(ch, hz)?).await
    }

    /// Read a channel's frequency in hertz.
    pub async fn get_frequency(&mut self, ch: Channel) -> Result<f64> {
        let fields = self.execute_query(&commands::cmd_read_frequency(ch)).await?;
        if fields.len() != 2 {
            return Err(Error::MalformedResponse {
                raw: fields.join(",").into_bytes(),
            });
        }
        let scaled = parse_field::<i64>(&fields, 0)?;
        let unit_code = parse_field::<u8>(&fields, 1)?;
        units::decode_frequency(scaled, unit_code)
    }

    /// Set a channel's peak-to-peak amplitude in volts.
    pub async fn set_amplitude(&mut self, ch: Channel, vpp: f64) -> Result<()> {
        self.execute_set(&commands::cmd_set_amplitude(ch, vpp)).await
    }

    /// Read a channel's peak-to-peak amplitude in volts.
    pub async fn get_amplitude(&mut self, ch: Channel) -> Result<f64> {
        let fields = self.execute_query(&commands::cmd_read_amplitude(ch)).await?;
        Ok(units::decode_amplitude(parse_field::<i64>(&fields, 0)?))
    }

    /// Set a channel's DC offset with the raw device code.
    pub async fn set_offset_raw(&mut self, ch: Channel, code: i32) -> Result<()> {
        self.execute_set(&commands::cmd_set_offset_raw(ch, code)).await
    }

    /// Read a channel's DC offset as the raw device code.
    pub async fn get_offset_raw(&mut self, ch: Channel) -> Result<i32> {
        let fields = self.execute_query(&commands::cmd_read_offset_raw(ch)).await?;
        parse_field::<i32>(&fields, 0)
    }

    /// Set a channel's duty cycle in percent.
    pub async fn set_duty(&mut self, ch: Channel, percent: f64) -> Result<()> {
        self.execute_set(&commands::cmd_set_duty(ch, percent)).await
    }

    /// Read a channel's duty cycle in percent.
    pub async fn get_duty(&mut self, ch: Channel) -> Result<f64> {
        let fields = self.execute_query(&commands::cmd_read_duty(ch)).await?;
        Ok(units::decode_duty(parse_field::<i64>(&fields, 0)?))
    }

    /// Set a channel's phase in degrees.
    pub async fn set_phase(&mut self, ch: Channel, degrees: f64) -> Result<()> {
        self.execute_set(&commands::cmd_set_phase(ch, degrees)).await
    }

    /// Read a channel's phase in degrees.
    pub async fn get_phase(&mut self, ch: Channel) -> Result<f64> {
        let fields = self.execute_query(&commands::cmd_read_phase(ch)).await?;
        Ok(units::decode_phase(parse_field::<i64>(&fields, 0)?))
    }

    // ---------------------------------------------------------------
    // Modulation readbacks
    // ---------------------------------------------------------------

    /// Read a channel's AM depth in percent.
    pub async fn get_am_depth(&mut self, ch: Channel) -> Result<f64> {
        let fields = self.execute_query(&commands::cmd_read_am_depth(ch)).await?;
        Ok(parse_field::<i64>(&fields, 0)? as f64 / 10.0)
    }

    /// Read a channel's FM deviation in hertz.
    pub async fn get_fm_deviation(&mut self, ch: Channel) -> Result<f64> {
        let fields = self.execute_query(&commands::cmd_read_fm_deviation(ch)).await?;
        Ok(parse_field::<i64>(&fields, 0)? as f64 / 10.0)
    }

    /// Read a channel's burst pulse count.
    pub async fn get_burst_count(&mut self, ch: Channel) -> Result<u32> {
        let fields = self.execute_query(&commands::cmd_read_burst_count()).await?;
        if fields.len() != 2 {
            return Err(Error::MalformedResponse {
                raw: fields.join(",").into_bytes(),
            });
        }
        match ch {
            Channel::Ch1 => parse_field::<u32>(&fields, 0),
            Channel::Ch2 => parse_field::<u32>(&fields, 1),
        }
    }

    /// Read the measurement counter's frequency in hertz.
    ///
    /// The high band reports whole hertz; the low band reports
    /// millihertz-resolution counts.
    pub async fn get_measured_frequency(&mut self, high_band: bool) -> Result<f64> {
        let fields = self
            .execute_query(&commands::cmd_read_measured_frequency(high_band))
            .await?;
        let raw = parse_field::<i64>(&fields, 0)?;
        Ok(if high_band {
            raw as f64
        } else {
            raw as f64 / 1000.0
        })
    }

    // ---------------------------------------------------------------
    // Sweep
    // ---------------------------------------------------------------

    /// Configure the sweep engine: target channel, time, direction, scale.
    pub async fn set_sweep(
        &mut self,
        ch: Channel,
        sweep_time_ms: u32,
        direction: commands::SweepDirection,
        logarithmic: bool,
    ) -> Result<()> {
        self.execute_set(&commands::cmd_set_sweep(ch, sweep_time_ms, direction, logarithmic))
            .await
    }

    /// Enable or disable sweep and VCO input.
    pub async fn set_sweep_enable(&mut self, sweep_on: bool, vco_on: bool) -> Result<()> {
        self.execute_set(&commands::cmd_set_sweep_enable(sweep_on, vco_on)).await
    }

    /// Set the sweep start frequency in hertz.
    ///
    /// See [`commands::cmd_set_sweep_start_frequency`] for the wire
    /// format's unit-code caveat.
    pub async fn set_sweep_start_frequency(&mut self, hz: f64) -> Result<()> {
        self.execute_set(&commands::cmd_set_sweep_start_frequency(hz)?).await
    }

    /// Set the sweep end frequency in hertz.
    pub async fn set_sweep_end_frequency(&mut self, hz: f64) -> Result<()> {
        self.execute_set(&commands::cmd_set_sweep_end_frequency(hz)?).await
    }

    /// Fire a manual trigger on the selected channels.
    pub async fn trigger(&mut self, ch1: bool, ch2: bool) -> Result<()> {
        self.execute_set(&commands::cmd_trigger(ch1, ch2)).await
    }

    // ---------------------------------------------------------------
    // Convenience
    // ---------------------------------------------------------------

    /// Configure a channel with the common signal parameters and set its
    /// output switch, leaving the other channel's output untouched.
    pub async fn configure_basic(&mut self, ch: Channel, config: &ChannelConfig) -> Result<()> {
        self.set_waveform(ch, config.waveform).await?;
        self.set_frequency(ch, config.frequency_hz).await?;
        self.set_amplitude(ch, config.amplitude_vpp).await?;
        if let Some(code) = config.offset_raw {
            self.set_offset_raw(ch, code).await?;
        }
        if let Some(duty) = config.duty_percent {
            self.set_duty(ch, duty).await?;
        }
        if let Some(phase) = config.phase_deg {
            self.set_phase(ch, phase).await?;
        }
        self.set_channel_output(ch, config.output_on).await
    }
}

/// Common per-channel signal parameters for [`Psg9080::configure_basic`].
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub waveform: commands::Waveform,
    pub frequency_hz: f64,
    pub amplitude_vpp: f64,
    /// Raw device offset code; `None` leaves the current offset.
    pub offset_raw: Option<i32>,
    pub duty_percent: Option<f64>,
    pub phase_deg: Option<f64>,
    /// Final state of this channel's output switch.
    pub output_on: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            waveform: commands::Waveform::Sine,
            frequency_hz: 1000.0,
            amplitude_vpp: 1.0,
            offset_raw: None,
            duty_percent: None,
            phase_deg: None,
            output_on: true,
        }
    }
}

/// Extract the two-digit function code from an encoded query line.
fn query_function_code(cmd: &[u8]) -> Result<String> {
    if cmd.len() >= 4
        && cmd[0] == b':'
        && cmd[1] == b'r'
        && cmd[2].is_ascii_digit()
        && cmd[3].is_ascii_digit()
    {
        // Both bytes checked as ASCII digits above.
        Ok(String::from_utf8_lossy(&cmd[2..4]).into_owned())
    } else {
        Err(Error::InvalidParameter(format!(
            "not a query command: {:?}",
            String::from_utf8_lossy(cmd)
        )))
    }
}

/// Parse one response field as a number, mapping failure to a malformed
/// response carrying the offending field.
fn parse_field<T: std::str::FromStr>(fields: &[String], index: usize) -> Result<T> {
    fields
        .get(index)
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| Error::MalformedResponse {
            raw: fields.join(",").into_bytes(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Waveform;
    use benchlib_test_harness::MockTransport;

    fn generator(mock: MockTransport) -> Psg9080 {
        Psg9080::new(Box::new(mock), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn set_frequency_sends_encoded_pair() {
        let mut mock = MockTransport::new();
        mock.expect(b":w13=25786,0.\r\n", b"");
        let mut psg = generator(mock);

        psg.set_frequency(Channel::Ch1, 25.786).await.unwrap();
    }

    #[tokio::test]
    async fn get_frequency_decodes_pair() {
        let mut mock = MockTransport::new();
        mock.expect(b":r13=0.\r\n", b":r13=1000000,0.\r\n");
        let mut psg = generator(mock);

        let hz = psg.get_frequency(Channel::Ch1).await.unwrap();
        assert!((hz - 1000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn get_frequency_kilohertz_unit() {
        let mut mock = MockTransport::new();
        mock.expect(b":r14=0.\r\n", b":r14=3000000,1.\r\n");
        let mut psg = generator(mock);

        let hz = psg.get_frequency(Channel::Ch2).await.unwrap();
        assert!((hz - 3e6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn get_output_parses_both_flags() {
        let mut mock = MockTransport::new();
        mock.expect(b":r10=0.\r\n", b":r10=1,0.\r\n");
        let mut psg = generator(mock);

        assert_eq!(psg.get_output().await.unwrap(), (true, false));
    }

    #[tokio::test]
    async fn set_channel_output_preserves_other_channel() {
        let mut mock = MockTransport::new();
        // CH2 is currently on; enabling CH1 must keep it on.
        mock.expect(b":r10=0.\r\n", b":r10=0,1.\r\n");
        mock.expect(b":w10=1,1.\r\n", b"");
        let mut psg = generator(mock);

        psg.set_channel_output(Channel::Ch1, true).await.unwrap();
    }

    #[tokio::test]
    async fn get_amplitude_millivolts() {
        let mut mock = MockTransport::new();
        mock.expect(b":r15=0.\r\n", b":r15=2500.\r\n");
        let mut psg = generator(mock);

        let vpp = psg.get_amplitude(Channel::Ch1).await.unwrap();
        assert!((vpp - 2.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn get_waveform_decodes_code() {
        let mut mock = MockTransport::new();
        mock.expect(b":r12=0.\r\n", b":r12=107.\r\n");
        let mut psg = generator(mock);

        let wf = psg.get_waveform(Channel::Ch2).await.unwrap();
        assert_eq!(wf, Waveform::Arbitrary(7));
    }

    #[tokio::test]
    async fn query_rejects_mismatched_opcode() {
        let mut mock = MockTransport::new();
        // Device answers the wrong function code.
        mock.expect(b":r13=0.\r\n", b":r15=1000.\r\n");
        let mut psg = generator(mock);

        let result = psg.get_frequency(Channel::Ch1).await;
        assert!(matches!(result, Err(Error::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn query_rejects_garbage_line() {
        let mut mock = MockTransport::new();
        mock.expect(b":r13=0.\r\n", b"garbage\r\n");
        let mut psg = generator(mock);

        let result = psg.get_frequency(Channel::Ch1).await;
        assert!(matches!(result, Err(Error::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn query_times_out_as_no_response() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b":r13=0.\r\n");
        let mut psg = generator(mock);

        let result = psg.get_frequency(Channel::Ch1).await;
        assert!(matches!(result, Err(Error::NoResponse)));
    }

    #[tokio::test]
    async fn configure_basic_command_sequence() {
        let mut mock = MockTransport::new();
        mock.expect(b":w11=0.\r\n", b"");
        mock.expect(b":w13=10000000,0.\r\n", b"");
        mock.expect(b":w15=1000.\r\n", b"");
        mock.expect(b":r10=0.\r\n", b":r10=0,0.\r\n");
        mock.expect(b":w10=1,0.\r\n", b"");
        let mut psg = generator(mock);

        let config = ChannelConfig {
            frequency_hz: 10_000.0,
            ..Default::default()
        };
        psg.configure_basic(Channel::Ch1, &config).await.unwrap();
    }

    #[tokio::test]
    async fn configure_basic_optional_parameters() {
        let mut mock = MockTransport::new();
        mock.expect(b":w12=1.\r\n", b"");
        mock.expect(b":w14=1000000,0.\r\n", b"");
        mock.expect(b":w16=500.\r\n", b"");
        mock.expect(b":w18=1000.\r\n", b"");
        mock.expect(b":w20=2500.\r\n", b"");
        mock.expect(b":w22=9000.\r\n", b"");
        mock.expect(b":r10=0.\r\n", b":r10=1,0.\r\n");
        mock.expect(b":w10=1,1.\r\n", b"");
        let mut psg = generator(mock);

        let config = ChannelConfig {
            waveform: Waveform::Square,
            frequency_hz: 1000.0,
            amplitude_vpp: 0.5,
            offset_raw: Some(1000),
            duty_percent: Some(25.0),
            phase_deg: Some(90.0),
            output_on: true,
        };
        psg.configure_basic(Channel::Ch2, &config).await.unwrap();
    }

    #[tokio::test]
    async fn measured_frequency_band_scaling() {
        let mut mock = MockTransport::new();
        mock.expect(b":r81=0.\r\n", b":r81=1000000.\r\n");
        mock.expect(b":r82=0.\r\n", b":r82=1000000.\r\n");
        let mut psg = generator(mock);

        let high = psg.get_measured_frequency(true).await.unwrap();
        assert!((high - 1e6).abs() < 1e-9);

        let low = psg.get_measured_frequency(false).await.unwrap();
        assert!((low - 1e3).abs() < 1e-9);
    }
}
