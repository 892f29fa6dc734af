//! SiglentScope -- the connected-instrument driver.
//!
//! Drives an SDS-series scope over its raw SCPI socket (port 5025) or
//! any other [`Transport`]. Set commands are newline-terminated and
//! produce no reply; text queries read one newline-terminated line;
//! waveform queries read a raw buffer and extract the definite-length
//! binary block from it.
//!
//! A single `SiglentScope` owns its transport exclusively; drive it from
//! one task, or wrap it yourself if you need sharing.

use std::time::Duration;

use tracing::{debug, trace};

use benchlib_core::error::{Error, Result};
use benchlib_core::transport::{read_line, read_raw, Transport};
use benchlib_core::types::InstrumentInfo;

use crate::block::read_block;
use crate::preamble::Preamble;
use crate::waveform;

/// Default timeout for text queries.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(500);
/// Default timeout for binary block reads (preamble and sample data).
const DEFAULT_BLOCK_TIMEOUT: Duration = Duration::from_secs(5);
/// Largest block response the driver will buffer: header plus samples
/// from the deepest WORD-mode capture the SDS812X supports.
const MAX_BLOCK_RESPONSE: usize = 64 * 1024 * 1024;
/// Trigger status polls before giving up.
const TRIGGER_POLL_LIMIT: u32 = 200;
/// Delay between trigger status polls.
const TRIGGER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Analog input channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeChannel {
    C1,
    C2,
    C3,
    C4,
}

impl ScopeChannel {
    /// SCPI mnemonic for this channel.
    pub fn mnemonic(self) -> &'static str {
        match self {
            ScopeChannel::C1 => "C1",
            ScopeChannel::C2 => "C2",
            ScopeChannel::C3 => "C3",
            ScopeChannel::C4 => "C4",
        }
    }
}

impl std::fmt::Display for ScopeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Trigger edge polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSlope {
    Positive,
    Negative,
}

impl TriggerSlope {
    fn mnemonic(self) -> &'static str {
        match self {
            TriggerSlope::Positive => "POSitive",
            TriggerSlope::Negative => "NEGative",
        }
    }
}

/// Sample width for waveform transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformWidth {
    /// One byte per sample, 8-bit codes.
    Byte,
    /// Two bytes per sample, big-endian, codes left-justified to the
    /// ADC resolution.
    Word,
}

impl WaveformWidth {
    fn mnemonic(self) -> &'static str {
        match self {
            WaveformWidth::Byte => "BYTE",
            WaveformWidth::Word => "WORD",
        }
    }
}

/// A captured trace: scaled voltages, the matching time axis, and the
/// preamble both were derived from.
#[derive(Debug, Clone)]
pub struct WaveformCapture {
    /// Sample voltages.
    pub volts: Vec<f64>,
    /// Sample timestamps in seconds, relative to the trigger.
    pub time: Vec<f64>,
    /// The preamble the samples were scaled with.
    pub preamble: Preamble,
}

/// A connected Siglent SDS-series oscilloscope.
pub struct SiglentScope {
    transport: Box<dyn Transport>,
    command_timeout: Duration,
    block_timeout: Duration,
    /// Timebase recorded by [`configure_acquisition`](Self::configure_acquisition),
    /// needed to place the left edge of the time axis.
    timebase: Option<f64>,
}

impl SiglentScope {
    /// Wrap an already-connected transport.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        SiglentScope {
            transport,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            block_timeout: DEFAULT_BLOCK_TIMEOUT,
            timebase: None,
        }
    }

    /// Connect to the scope's raw SCPI socket, e.g. `192.168.1.50:5025`.
    pub async fn connect(addr: &str) -> Result<Self> {
        let transport = benchlib_transport::TcpTransport::connect(addr).await?;
        Ok(Self::with_transport(Box::new(transport)))
    }

    /// Override the timeout for text queries (default: 500 ms).
    pub fn set_command_timeout(&mut self, timeout: Duration) {
        self.command_timeout = timeout;
    }

    /// Override the timeout for binary block transfers (default: 5 s).
    /// Deep WORD-mode captures can take several seconds to stream.
    pub fn set_block_timeout(&mut self, timeout: Duration) {
        self.block_timeout = timeout;
    }

    /// Close the underlying transport. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Whether the underlying transport is open.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Send a newline-terminated set command. No reply is expected.
    pub async fn execute_set(&mut self, cmd: &str) -> Result<()> {
        trace!(cmd, "scope set");
        let mut line = cmd.as_bytes().to_vec();
        line.push(b'\n');
        self.transport.send(&line).await
    }

    /// Send a query and read one newline-terminated text response,
    /// trimmed of its terminator.
    pub async fn execute_query(&mut self, cmd: &str) -> Result<String> {
        trace!(cmd, "scope query");
        let mut line = cmd.as_bytes().to_vec();
        line.push(b'\n');
        self.transport.send(&line).await?;

        let raw = read_line(self.transport.as_mut(), self.command_timeout).await?;
        Ok(String::from_utf8_lossy(&raw).trim_end().to_string())
    }

    /// Send a query and extract the binary block from the response.
    pub async fn execute_block_query(&mut self, cmd: &str) -> Result<Vec<u8>> {
        trace!(cmd, "scope block query");
        let mut line = cmd.as_bytes().to_vec();
        line.push(b'\n');
        self.transport.send(&line).await?;

        let raw = read_raw(self.transport.as_mut(), MAX_BLOCK_RESPONSE, self.block_timeout).await?;
        read_block(&raw).map(<[u8]>::to_vec)
    }

    /// Query `*IDN?` and parse the identification string.
    pub async fn identify(&mut self) -> Result<InstrumentInfo> {
        let idn = self.execute_query("*IDN?").await?;
        debug!(%idn, "scope identification");
        Ok(InstrumentInfo::parse(&idn))
    }

    // ---------------------------------------------------------------
    // Acquisition and trigger setup
    // ---------------------------------------------------------------

    /// Pin the sample rate and timebase for a capture.
    ///
    /// Switches acquisition memory management to fixed-sample-rate mode
    /// so the requested rate is honored at any timebase, then sets both.
    pub async fn configure_acquisition(&mut self, sample_rate: f64, timebase: f64) -> Result<()> {
        self.execute_set(":ACQuire:MMANagement FSRate").await?;
        self.execute_set(&format!(":ACQuire:SRATe {:.9E}", sample_rate))
            .await?;
        self.execute_set(&format!(":TIMebase:SCALe {:.9E}", timebase))
            .await?;
        self.timebase = Some(timebase);
        Ok(())
    }

    /// Arm a normal-mode edge trigger and start acquisition.
    pub async fn configure_edge_trigger(
        &mut self,
        source: ScopeChannel,
        level_volts: f64,
        slope: TriggerSlope,
    ) -> Result<()> {
        self.execute_set(":TRIGger:MODE NORMal").await?;
        self.execute_set(&format!(":TRIGger:EDGE:SOURce {}", source.mnemonic()))
            .await?;
        self.execute_set(&format!(":TRIGger:EDGE:SLOPe {}", slope.mnemonic()))
            .await?;
        self.execute_set(&format!(":TRIGger:LEVel {:.6}", level_volts))
            .await?;
        self.execute_set(":TRIGger:RUN").await
    }

    /// Poll the trigger status until the scope reports a completed
    /// acquisition (`Trig'd` or `Stop`).
    ///
    /// Gives up after ten seconds of polling with
    /// [`Error::NoResponse`].
    pub async fn wait_for_trigger(&mut self) -> Result<()> {
        for _ in 0..TRIGGER_POLL_LIMIT {
            let status = self.execute_query(":TRIGger:STATus?").await?;
            trace!(%status, "trigger status");
            if status == "Trig'd" || status == "Stop" {
                return Ok(());
            }
            tokio::time::sleep(TRIGGER_POLL_INTERVAL).await;
        }
        debug!("trigger never fired within the poll budget");
        Err(Error::NoResponse)
    }

    // ---------------------------------------------------------------
    // Waveform transfer
    // ---------------------------------------------------------------

    /// Select the channel subsequent waveform queries read from.
    pub async fn set_waveform_source(&mut self, ch: ScopeChannel) -> Result<()> {
        self.execute_set(&format!(":WAVeform:SOURce {}", ch.mnemonic()))
            .await
    }

    /// Select the sample width for waveform transfers.
    pub async fn set_waveform_width(&mut self, width: WaveformWidth) -> Result<()> {
        self.execute_set(&format!(":WAVeform:WIDTh {}", width.mnemonic()))
            .await
    }

    /// Limit the number of points transferred per waveform query.
    pub async fn set_waveform_points(&mut self, points: u32) -> Result<()> {
        self.execute_set(&format!(":WAVeform:POINt {}", points)).await
    }

    /// Fetch and decode the waveform preamble for the selected source.
    pub async fn fetch_preamble(&mut self) -> Result<Preamble> {
        let payload = self.execute_block_query(":WAVeform:PREamble?").await?;
        Preamble::decode(&payload)
    }

    /// Fetch the raw sample bytes for the selected source.
    pub async fn fetch_waveform_data(&mut self) -> Result<Vec<u8>> {
        self.execute_block_query(":WAVeform:DATA?").await
    }

    /// Fetch the preamble and sample data for the selected source,
    /// scale the samples into volts, and generate the matching time
    /// axis.
    ///
    /// Uses the timebase recorded by
    /// [`configure_acquisition`](Self::configure_acquisition); if the
    /// timebase was set out of band, it is queried from the instrument.
    pub async fn fetch_waveform(&mut self, width: WaveformWidth) -> Result<WaveformCapture> {
        let timebase = match self.timebase {
            Some(tb) => tb,
            None => self.query_timebase().await?,
        };

        let preamble = self.fetch_preamble().await?;
        let data = self.fetch_waveform_data().await?;
        let volts = match width {
            WaveformWidth::Word => waveform::words_to_volts(&data, &preamble)?,
            WaveformWidth::Byte => waveform::bytes_to_volts(&data, &preamble),
        };
        let time = waveform::time_axis(&preamble, volts.len(), timebase);
        debug!(
            samples = volts.len(),
            adc_bits = preamble.adc_bits,
            "waveform transferred"
        );
        Ok(WaveformCapture {
            volts,
            time,
            preamble,
        })
    }

    /// Query the current timebase from the instrument.
    async fn query_timebase(&mut self) -> Result<f64> {
        let reply = self.execute_query(":TIMebase:SCALe?").await?;
        let timebase = reply.parse::<f64>().map_err(|_| Error::MalformedResponse {
            raw: reply.clone().into_bytes(),
        })?;
        self.timebase = Some(timebase);
        Ok(timebase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchlib_test_harness::MockTransport;

    fn scope(mock: MockTransport) -> SiglentScope {
        let mut scope = SiglentScope::with_transport(Box::new(mock));
        scope.set_command_timeout(Duration::from_millis(100));
        scope.set_block_timeout(Duration::from_millis(100));
        scope
    }

    /// A 188-byte preamble block with the given scaling fields, framed
    /// as the instrument sends it.
    fn preamble_response(
        vdiv: f32,
        voffset: f32,
        code_per_div: f32,
        adc_bits: i16,
        dt: f32,
        delay: f64,
    ) -> Vec<u8> {
        let mut desc = vec![0u8; 188];
        desc[156..160].copy_from_slice(&vdiv.to_le_bytes());
        desc[160..164].copy_from_slice(&voffset.to_le_bytes());
        desc[164..168].copy_from_slice(&code_per_div.to_le_bytes());
        desc[172..174].copy_from_slice(&adc_bits.to_le_bytes());
        desc[176..180].copy_from_slice(&dt.to_le_bytes());
        desc[180..188].copy_from_slice(&delay.to_le_bytes());

        let mut resp = format!("#9{:09}", desc.len()).into_bytes();
        resp.extend_from_slice(&desc);
        resp.push(b'\n');
        resp
    }

    #[tokio::test]
    async fn identify_parses_idn_fields() {
        let mut mock = MockTransport::new();
        mock.expect(
            b"*IDN?\n",
            b"Siglent Technologies,SDS812X HD,SDS08A0C800319,3.8.12\n",
        );
        let mut scope = scope(mock);

        let info = scope.identify().await.unwrap();
        assert_eq!(info.manufacturer, "Siglent Technologies");
        assert_eq!(info.model, "SDS812X HD");
        assert_eq!(info.serial, "SDS08A0C800319");
        assert_eq!(info.firmware, "3.8.12");
    }

    #[tokio::test]
    async fn configure_acquisition_sends_fsrate_then_rate_and_timebase() {
        let mut mock = MockTransport::new();
        mock.expect(b":ACQuire:MMANagement FSRate\n", b"");
        mock.expect(b":ACQuire:SRATe 5.000000000E8\n", b"");
        mock.expect(b":TIMebase:SCALe 1.000000000E-3\n", b"");
        let mut scope = scope(mock);

        scope.configure_acquisition(5.0e8, 1.0e-3).await.unwrap();
    }

    #[tokio::test]
    async fn configure_edge_trigger_sends_full_sequence() {
        let mut mock = MockTransport::new();
        mock.expect(b":TRIGger:MODE NORMal\n", b"");
        mock.expect(b":TRIGger:EDGE:SOURce C1\n", b"");
        mock.expect(b":TRIGger:EDGE:SLOPe POSitive\n", b"");
        mock.expect(b":TRIGger:LEVel 0.250000\n", b"");
        mock.expect(b":TRIGger:RUN\n", b"");
        let mut scope = scope(mock);

        scope
            .configure_edge_trigger(ScopeChannel::C1, 0.25, TriggerSlope::Positive)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wait_for_trigger_polls_until_triggered() {
        let mut mock = MockTransport::new();
        mock.expect(b":TRIGger:STATus?\n", b"Arm\n");
        mock.expect(b":TRIGger:STATus?\n", b"Ready\n");
        mock.expect(b":TRIGger:STATus?\n", b"Trig'd\n");
        let mut scope = scope(mock);

        scope.wait_for_trigger().await.unwrap();
    }

    #[tokio::test]
    async fn wait_for_trigger_accepts_stop() {
        let mut mock = MockTransport::new();
        mock.expect(b":TRIGger:STATus?\n", b"Stop\n");
        let mut scope = scope(mock);

        scope.wait_for_trigger().await.unwrap();
    }

    #[tokio::test]
    async fn fetch_preamble_decodes_block() {
        let mut mock = MockTransport::new();
        mock.expect(
            b":WAVeform:PREamble?\n",
            &preamble_response(0.5, -0.125, 25.0, 12, 2.0e-9, 1.5e-6),
        );
        let mut scope = scope(mock);

        let pre = scope.fetch_preamble().await.unwrap();
        assert_eq!(pre.vdiv, 0.5);
        assert_eq!(pre.voffset, -0.125);
        assert_eq!(pre.code_per_div, 25.0);
        assert_eq!(pre.adc_bits, 12);
        assert_eq!(pre.dt, 2.0e-9);
        assert_eq!(pre.delay, 1.5e-6);
    }

    #[tokio::test]
    async fn fetch_waveform_scales_word_samples_and_builds_time_axis() {
        let mut mock = MockTransport::new();
        mock.expect(b":ACQuire:MMANagement FSRate\n", b"");
        mock.expect(b":ACQuire:SRATe 1.000000000E6\n", b"");
        mock.expect(b":TIMebase:SCALe 1.000000000E-3\n", b"");
        mock.expect(
            b":WAVeform:PREamble?\n",
            &preamble_response(0.5, 0.0, 25.0, 12, 1.0e-6, 0.0),
        );
        // Two WORD samples: codes 16 and -2048.
        mock.expect(b":WAVeform:DATA?\n", b"#14\x01\x00\x80\x00\n");
        let mut scope = scope(mock);

        scope.configure_acquisition(1.0e6, 1.0e-3).await.unwrap();
        let capture = scope.fetch_waveform(WaveformWidth::Word).await.unwrap();
        assert_eq!(capture.volts.len(), 2);
        assert!((capture.volts[0] - 16.0 * (0.5 / 25.0)).abs() < 1e-9);
        assert!((capture.volts[1] - (-2048.0 * (0.5 / 25.0))).abs() < 1e-9);
        // Left grid edge for a 1 ms/div timebase with no trigger delay.
        assert!((capture.time[0] - (-5.0e-3)).abs() < 1e-12);
        assert!((capture.time[1] - capture.time[0] - 1.0e-6).abs() < 1e-12);
    }

    #[tokio::test]
    async fn fetch_waveform_scales_byte_samples() {
        let mut mock = MockTransport::new();
        // Timebase not configured through the driver; it gets queried.
        mock.expect(b":TIMebase:SCALe?\n", b"2.00E-04\n");
        mock.expect(
            b":WAVeform:PREamble?\n",
            &preamble_response(1.0, 0.25, 25.0, 8, 1.0e-6, 0.0),
        );
        mock.expect(b":WAVeform:DATA?\n", b"#13\x00\x19\x80\n");
        let mut scope = scope(mock);

        let capture = scope.fetch_waveform(WaveformWidth::Byte).await.unwrap();
        let gain = 1.0 / 25.0;
        assert!((capture.volts[0] - (-0.25)).abs() < 1e-9);
        assert!((capture.volts[1] - (25.0 * gain - 0.25)).abs() < 1e-9);
        assert!((capture.volts[2] - (-128.0 * gain - 0.25)).abs() < 1e-9);
        assert!((capture.time[0] - (-1.0e-3)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn waveform_selection_commands() {
        let mut mock = MockTransport::new();
        mock.expect(b":WAVeform:SOURce C2\n", b"");
        mock.expect(b":WAVeform:WIDTh WORD\n", b"");
        mock.expect(b":WAVeform:POINt 7000\n", b"");
        let mut scope = scope(mock);

        scope.set_waveform_source(ScopeChannel::C2).await.unwrap();
        scope.set_waveform_width(WaveformWidth::Word).await.unwrap();
        scope.set_waveform_points(7000).await.unwrap();
    }

    #[tokio::test]
    async fn query_without_response_is_no_response() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b"*IDN?\n");
        let mut scope = scope(mock);

        assert!(matches!(
            scope.identify().await,
            Err(Error::NoResponse)
        ));
    }

    #[tokio::test]
    async fn response_without_block_is_missing_header() {
        let mut mock = MockTransport::new();
        mock.expect(b":WAVeform:PREamble?\n", b"WAVeform PREamble not ready\n");
        let mut scope = scope(mock);

        assert!(matches!(
            scope.fetch_preamble().await,
            Err(Error::MissingBlockHeader)
        ));
    }
}
