//! Ke103 -- the connected-instrument driver.
//!
//! The KE103 hangs off a USB serial port and speaks LF-terminated SCPI.
//! Set commands produce no reply; queries read one line. A single
//! `Ke103` owns its transport exclusively; drive it from one task, or
//! wrap it yourself if you need sharing.

use std::time::Duration;

use tracing::{debug, trace};

use benchlib_core::error::Result;
use benchlib_core::transport::{read_line, Transport};
use benchlib_core::types::InstrumentInfo;

use crate::commands::{self, FunctionMode};

/// Factory default baud rate for the KE103's serial port.
const DEFAULT_BAUD_RATE: u32 = 115200;
/// Default timeout for query responses.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

/// A connected KE103 programmable DC electronic load.
pub struct Ke103 {
    transport: Box<dyn Transport>,
    command_timeout: Duration,
}

impl Ke103 {
    /// Wrap an already-connected transport.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Ke103 {
            transport,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Open the load on a serial port at the factory baud rate.
    pub async fn open(port: &str) -> Result<Self> {
        let transport = benchlib_transport::SerialTransport::open(port, DEFAULT_BAUD_RATE).await?;
        Ok(Self::with_transport(Box::new(transport)))
    }

    /// Override the timeout for query responses (default: 500 ms).
    pub fn set_command_timeout(&mut self, timeout: Duration) {
        self.command_timeout = timeout;
    }

    /// Close the underlying transport. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Whether the underlying transport is open.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Send a set command. No response is expected.
    pub async fn execute_set(&mut self, cmd: &[u8]) -> Result<()> {
        trace!(cmd = %String::from_utf8_lossy(cmd).trim_end(), "KE103 set");
        self.transport.send(cmd).await
    }

    /// Send a query and read one LF-terminated reply, trimmed.
    pub async fn execute_query(&mut self, cmd: &[u8]) -> Result<String> {
        trace!(cmd = %String::from_utf8_lossy(cmd).trim_end(), "KE103 query");
        self.transport.send(cmd).await?;
        let raw = read_line(self.transport.as_mut(), self.command_timeout).await?;
        Ok(String::from_utf8_lossy(&raw).trim_end().to_string())
    }

    async fn query_value(&mut self, cmd: &[u8]) -> Result<f64> {
        let reply = self.execute_query(cmd).await?;
        commands::parse_value(&reply)
    }

    /// Query `*IDN?` and parse the identification string.
    pub async fn identify(&mut self) -> Result<InstrumentInfo> {
        let idn = self.execute_query(&commands::cmd_identify()).await?;
        debug!(%idn, "KE103 identification");
        Ok(InstrumentInfo::parse(&idn))
    }

    /// Store the current unit state in a memory slot.
    pub async fn save(&mut self, slot: u8) -> Result<()> {
        self.execute_set(&commands::cmd_save(slot)).await
    }

    /// Recall a stored unit state.
    pub async fn recall(&mut self, slot: u8) -> Result<()> {
        self.execute_set(&commands::cmd_recall(slot)).await
    }

    /// Simulate an external trigger.
    pub async fn trigger(&mut self) -> Result<()> {
        self.execute_set(&commands::cmd_trigger()).await
    }

    /// Enable or disable the system beeper.
    pub async fn set_beep(&mut self, on: bool) -> Result<()> {
        self.execute_set(&commands::cmd_set_beep(on)).await
    }

    // ---------------------------------------------------------------
    // Input and function selection
    // ---------------------------------------------------------------

    /// Enable or disable the load input.
    pub async fn set_input(&mut self, on: bool) -> Result<()> {
        self.execute_set(&commands::cmd_set_input(on)).await
    }

    /// Query whether the load input is enabled.
    pub async fn input_enabled(&mut self) -> Result<bool> {
        let reply = self.execute_query(&commands::cmd_read_input()).await?;
        commands::parse_switch(&reply)
    }

    /// Select the operating function (CV, CC, CR, CW, short).
    pub async fn set_function(&mut self, mode: FunctionMode) -> Result<()> {
        self.execute_set(&commands::cmd_set_function(mode)).await
    }

    /// Query the operating function.
    pub async fn get_function(&mut self) -> Result<FunctionMode> {
        let reply = self.execute_query(&commands::cmd_read_function()).await?;
        FunctionMode::from_mnemonic(&reply)
    }

    // ---------------------------------------------------------------
    // Setpoints
    // ---------------------------------------------------------------

    /// Set the CV voltage setpoint, in volts.
    pub async fn set_voltage(&mut self, volts: f64) -> Result<()> {
        self.execute_set(&commands::cmd_set_voltage(volts)).await
    }

    /// Read the CV voltage setpoint, in volts.
    pub async fn get_voltage(&mut self) -> Result<f64> {
        self.query_value(&commands::cmd_read_voltage()).await
    }

    /// Set the CC current setpoint, in amperes.
    pub async fn set_current(&mut self, amps: f64) -> Result<()> {
        self.execute_set(&commands::cmd_set_current(amps)).await
    }

    /// Read the CC current setpoint, in amperes.
    pub async fn get_current(&mut self) -> Result<f64> {
        self.query_value(&commands::cmd_read_current()).await
    }

    /// Set the CR resistance setpoint, in ohms.
    pub async fn set_resistance(&mut self, ohms: f64) -> Result<()> {
        self.execute_set(&commands::cmd_set_resistance(ohms)).await
    }

    /// Read the CR resistance setpoint, in ohms.
    pub async fn get_resistance(&mut self) -> Result<f64> {
        self.query_value(&commands::cmd_read_resistance()).await
    }

    /// Set the CW power setpoint, in watts.
    pub async fn set_power(&mut self, watts: f64) -> Result<()> {
        self.execute_set(&commands::cmd_set_power(watts)).await
    }

    /// Read the CW power setpoint, in watts.
    pub async fn get_power(&mut self) -> Result<f64> {
        self.query_value(&commands::cmd_read_power()).await
    }

    /// Read the settable range of the current setpoint, `(min, max)`.
    pub async fn current_range(&mut self) -> Result<(f64, f64)> {
        self.limit_range(":CURR").await
    }

    /// Read the settable range of the voltage setpoint, `(min, max)`.
    pub async fn voltage_range(&mut self) -> Result<(f64, f64)> {
        self.limit_range(":VOLT").await
    }

    /// Read the settable range of the resistance setpoint, `(min, max)`.
    pub async fn resistance_range(&mut self) -> Result<(f64, f64)> {
        self.limit_range(":RES").await
    }

    /// Read the settable range of the power setpoint, `(min, max)`.
    pub async fn power_range(&mut self) -> Result<(f64, f64)> {
        self.limit_range(":POW").await
    }

    async fn limit_range(&mut self, op: &str) -> Result<(f64, f64)> {
        let low = self
            .query_value(&commands::cmd_read_lower_limit(op))
            .await?;
        let high = self
            .query_value(&commands::cmd_read_upper_limit(op))
            .await?;
        Ok((low, high))
    }

    // ---------------------------------------------------------------
    // Measurements
    // ---------------------------------------------------------------

    /// Measure the voltage across the load terminals, in volts.
    pub async fn measure_voltage(&mut self) -> Result<f64> {
        self.query_value(&commands::cmd_measure_voltage()).await
    }

    /// Measure the current through the load, in amperes.
    pub async fn measure_current(&mut self) -> Result<f64> {
        self.query_value(&commands::cmd_measure_current()).await
    }

    /// Measure the power dissipated in the load, in watts.
    pub async fn measure_power(&mut self) -> Result<f64> {
        self.query_value(&commands::cmd_measure_power()).await
    }

    // ---------------------------------------------------------------
    // Battery mode
    // ---------------------------------------------------------------

    /// Configure battery-discharge mode: discharge current plus voltage,
    /// capacity, and time cutoffs.
    pub async fn set_battery(
        &mut self,
        amps: f64,
        cutoff_volts: f64,
        cutoff_amp_hours: f64,
        cutoff_seconds: u32,
    ) -> Result<()> {
        self.execute_set(&commands::cmd_set_battery(
            amps,
            cutoff_volts,
            cutoff_amp_hours,
            cutoff_seconds,
        ))
        .await
    }

    /// Recall a stored battery-mode setup.
    pub async fn recall_battery(&mut self, slot: u8) -> Result<()> {
        self.execute_set(&commands::cmd_recall_battery(slot)).await
    }

    /// Elapsed battery test time, in seconds.
    pub async fn battery_time(&mut self) -> Result<f64> {
        self.query_value(&commands::cmd_read_battery_time()).await
    }

    /// Accumulated battery test capacity, in ampere-hours.
    pub async fn battery_capacity(&mut self) -> Result<f64> {
        self.query_value(&commands::cmd_read_battery_capacity())
            .await
    }

    /// Configure the dynamic (pulsed CC) test mode: two current levels
    /// with their dwell times.
    pub async fn set_dynamic(
        &mut self,
        level_a_amps: f64,
        dwell_a_seconds: f64,
        level_b_amps: f64,
        dwell_b_seconds: f64,
    ) -> Result<()> {
        self.execute_set(&commands::cmd_set_dynamic(
            level_a_amps,
            dwell_a_seconds,
            level_b_amps,
            dwell_b_seconds,
        ))
        .await
    }

    /// Query the dynamic test mode setup, returned as the instrument's
    /// raw reply string.
    pub async fn get_dynamic(&mut self) -> Result<String> {
        self.execute_query(&commands::cmd_read_dynamic()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchlib_core::error::Error;
    use benchlib_test_harness::MockTransport;

    fn load(mock: MockTransport) -> Ke103 {
        let mut load = Ke103::with_transport(Box::new(mock));
        load.set_command_timeout(Duration::from_millis(100));
        load
    }

    #[tokio::test]
    async fn identify_parses_idn_fields() {
        let mut mock = MockTransport::new();
        mock.expect(b"*IDN?\n", b"KORAD,KE103,27D10,V1.30\n");
        let mut el = load(mock);

        let info = el.identify().await.unwrap();
        assert_eq!(info.manufacturer, "KORAD");
        assert_eq!(info.model, "KE103");
        assert_eq!(info.firmware, "V1.30");
    }

    #[tokio::test]
    async fn current_profile_step_sequence() {
        // One step of a load sweep: set current, enable input, read back
        // voltage and current.
        let mut mock = MockTransport::new();
        mock.expect(b":CURR 0.050A\n", b"");
        mock.expect(b":INP 1\n", b"");
        mock.expect(b":MEAS:VOLT?\n", b"5.08312V\n");
        mock.expect(b":MEAS:CURR?\n", b"0.05013A\n");
        let mut el = load(mock);

        el.set_current(0.05).await.unwrap();
        el.set_input(true).await.unwrap();
        assert!((el.measure_voltage().await.unwrap() - 5.08312).abs() < 1e-9);
        assert!((el.measure_current().await.unwrap() - 0.05013).abs() < 1e-9);
    }

    #[tokio::test]
    async fn setpoint_queries_strip_units() {
        let mut mock = MockTransport::new();
        mock.expect(b":VOLT?\n", b"12.000V\n");
        mock.expect(b":RES?\n", b"47.500OHM\n");
        mock.expect(b":POW?\n", b"1.250W\n");
        let mut el = load(mock);

        assert_eq!(el.get_voltage().await.unwrap(), 12.0);
        assert_eq!(el.get_resistance().await.unwrap(), 47.5);
        assert_eq!(el.get_power().await.unwrap(), 1.25);
    }

    #[tokio::test]
    async fn current_range_reads_low_then_high() {
        let mut mock = MockTransport::new();
        mock.expect(b":CURR:LOW?\n", b"0.000A\n");
        mock.expect(b":CURR:UPP?\n", b"15.000A\n");
        let mut el = load(mock);

        assert_eq!(el.current_range().await.unwrap(), (0.0, 15.0));
    }

    #[tokio::test]
    async fn function_mode_round_trip() {
        let mut mock = MockTransport::new();
        mock.expect(b":FUNC CURR\n", b"");
        mock.expect(b":FUNC?\n", b"CURR\n");
        let mut el = load(mock);

        el.set_function(FunctionMode::ConstantCurrent).await.unwrap();
        assert_eq!(
            el.get_function().await.unwrap(),
            FunctionMode::ConstantCurrent
        );
    }

    #[tokio::test]
    async fn input_state_round_trip() {
        let mut mock = MockTransport::new();
        mock.expect(b":INP 0\n", b"");
        mock.expect(b":INP?\n", b"0\n");
        let mut el = load(mock);

        el.set_input(false).await.unwrap();
        assert!(!el.input_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn battery_setup_and_readouts() {
        let mut mock = MockTransport::new();
        mock.expect(b":BATT 2.000A,14.000V,2.000AH,3600S\n", b"");
        mock.expect(b":BATT:TIM?\n", b"3600S\n");
        mock.expect(b":BATT:CAP?\n", b"2.000AH\n");
        let mut el = load(mock);

        el.set_battery(2.0, 14.0, 2.0, 3600).await.unwrap();
        assert_eq!(el.battery_time().await.unwrap(), 3600.0);
        assert_eq!(el.battery_capacity().await.unwrap(), 2.0);
    }

    #[tokio::test]
    async fn dynamic_mode_round_trip() {
        let mut mock = MockTransport::new();
        mock.expect(b":DYN 1,0.500A,0.100S,1.500A,0.200S\n", b"");
        mock.expect(b":DYN?\n", b"1,0.500A,0.100S,1.500A,0.200S\n");
        let mut el = load(mock);

        el.set_dynamic(0.5, 0.1, 1.5, 0.2).await.unwrap();
        assert_eq!(
            el.get_dynamic().await.unwrap(),
            "1,0.500A,0.100S,1.500A,0.200S"
        );
    }

    #[tokio::test]
    async fn malformed_measurement_is_reported() {
        let mut mock = MockTransport::new();
        mock.expect(b":MEAS:VOLT?\n", b"OVERLOAD\n");
        let mut el = load(mock);

        assert!(matches!(
            el.measure_voltage().await,
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn silent_instrument_is_no_response() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b"*IDN?\n");
        let mut el = load(mock);

        assert!(matches!(el.identify().await, Err(Error::NoResponse)));
    }
}
