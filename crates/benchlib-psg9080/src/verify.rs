//! Readback verification with bounded retry.
//!
//! After configuring a channel, the instrument's firmware can take tens
//! of milliseconds to commit the new settings, and the first readback
//! may still report the old values. [`Psg9080::verify_output`] polls the
//! frequency and amplitude with a short backoff until both fall within
//! tolerance of the requested values or the attempt budget is spent.
//!
//! A tolerance miss is advisory, not fatal: the report carries the last
//! observed values and a flag, and transport-level failures are the only
//! errors that propagate.

use tracing::{debug, warn};

use benchlib_core::error::Result;
use benchlib_core::types::{BackoffSchedule, Channel, ToleranceSpec};

use crate::generator::Psg9080;

/// Default number of readback attempts.
const DEFAULT_ATTEMPTS: u32 = 3;

/// Tolerance and retry policy for [`Psg9080::verify_output`].
#[derive(Debug, Clone)]
pub struct VerifyPolicy {
    /// Frequency tolerance. Default: 1 Hz floor, 1% relative.
    pub frequency: ToleranceSpec,
    /// Amplitude tolerance. Default: 10 mV floor, 5% relative.
    pub amplitude: ToleranceSpec,
    /// Maximum readback attempts.
    pub attempts: u32,
    /// Delay before each attempt.
    pub backoff: BackoffSchedule,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        VerifyPolicy {
            frequency: ToleranceSpec::new(1.0, 0.01),
            amplitude: ToleranceSpec::new(0.01, 0.05),
            attempts: DEFAULT_ATTEMPTS,
            backoff: BackoffSchedule::default(),
        }
    }
}

/// Outcome of a readback verification.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadbackReport {
    /// Last frequency readback, in hertz.
    pub frequency_hz: f64,
    /// Last amplitude readback, in peak-to-peak volts.
    pub amplitude_vpp: f64,
    /// Whether both quantities were within tolerance on the final attempt.
    pub within_tolerance: bool,
    /// Number of readback attempts actually made.
    pub attempts: u32,
}

impl Psg9080 {
    /// Verify that a channel's frequency and amplitude settings took
    /// effect, using the policy configured at build time (the default
    /// tolerances and backoff unless the builder overrode them).
    pub async fn verify_output(
        &mut self,
        ch: Channel,
        target_hz: f64,
        target_vpp: f64,
    ) -> Result<ReadbackReport> {
        let policy = self.verify_policy.clone();
        self.verify_output_with(ch, target_hz, target_vpp, &policy)
            .await
    }

    /// Verify a channel's settings under a caller-supplied policy.
    ///
    /// Each attempt sleeps its backoff delay, then queries frequency and
    /// amplitude and tests both against the policy's tolerances. Stops
    /// at the first attempt where both pass; once the budget is spent,
    /// the last observed values are returned with `within_tolerance`
    /// false rather than an error. Transport and grammar errors still
    /// propagate immediately.
    pub async fn verify_output_with(
        &mut self,
        ch: Channel,
        target_hz: f64,
        target_vpp: f64,
        policy: &VerifyPolicy,
    ) -> Result<ReadbackReport> {
        let mut last_hz = f64::NAN;
        let mut last_vpp = f64::NAN;

        for attempt in 0..policy.attempts {
            tokio::time::sleep(policy.backoff.delay_for(attempt)).await;

            last_hz = self.get_frequency(ch).await?;
            last_vpp = self.get_amplitude(ch).await?;

            let freq_ok = policy.frequency.is_met(target_hz, last_hz);
            let ampl_ok = policy.amplitude.is_met(target_vpp, last_vpp);

            debug!(
                %ch,
                attempt = attempt + 1,
                readback_hz = last_hz,
                readback_vpp = last_vpp,
                freq_ok,
                ampl_ok,
                "readback verification attempt"
            );

            if freq_ok && ampl_ok {
                return Ok(ReadbackReport {
                    frequency_hz: last_hz,
                    amplitude_vpp: last_vpp,
                    within_tolerance: true,
                    attempts: attempt + 1,
                });
            }
        }

        warn!(
            %ch,
            target_hz,
            target_vpp,
            readback_hz = last_hz,
            readback_vpp = last_vpp,
            "readback never settled within tolerance"
        );

        Ok(ReadbackReport {
            frequency_hz: last_hz,
            amplitude_vpp: last_vpp,
            within_tolerance: false,
            attempts: policy.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Psg9080;
    use benchlib_test_harness::MockTransport;
    use std::time::Duration;

    fn fast_policy() -> VerifyPolicy {
        VerifyPolicy {
            backoff: BackoffSchedule {
                initial: Duration::from_millis(1),
                subsequent: Duration::from_millis(1),
            },
            ..Default::default()
        }
    }

    fn generator(mock: MockTransport) -> Psg9080 {
        Psg9080::new(Box::new(mock), Duration::from_millis(100))
    }

    /// Response bytes for one frequency + amplitude readback pair.
    fn expect_readback(mock: &mut MockTransport, scaled_hz: i64, millivolts: i64) {
        mock.expect(
            b":r13=0.\r\n",
            format!(":r13={},0.\r\n", scaled_hz).as_bytes(),
        );
        mock.expect(
            b":r15=0.\r\n",
            format!(":r15={}.\r\n", millivolts).as_bytes(),
        );
    }

    #[tokio::test]
    async fn succeeds_immediately_when_within_tolerance() {
        let mut mock = MockTransport::new();
        expect_readback(&mut mock, 10_000_000, 1000);
        let mut psg = generator(mock);

        let report = psg
            .verify_output_with(Channel::Ch1, 10_000.0, 1.0, &fast_policy())
            .await
            .unwrap();

        assert!(report.within_tolerance);
        assert_eq!(report.attempts, 1);
        assert!((report.frequency_hz - 10_000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn settles_on_second_attempt_and_stops_querying() {
        let mut mock = MockTransport::new();
        // First readback misses (10200 Hz is 200 Hz off, 1% band is 100 Hz);
        // second lands at 10050 Hz, within tolerance.
        expect_readback(&mut mock, 10_200_000, 1000);
        expect_readback(&mut mock, 10_050_000, 1000);
        let mut psg = generator(mock);

        let report = psg
            .verify_output_with(Channel::Ch1, 10_000.0, 1.0, &fast_policy())
            .await
            .unwrap();

        assert!(report.within_tolerance);
        assert_eq!(report.attempts, 2);
        assert!((report.frequency_hz - 10_050.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn exhausts_attempts_and_reports_advisory_miss() {
        let mut mock = MockTransport::new();
        for _ in 0..3 {
            expect_readback(&mut mock, 10_200_000, 1000);
        }
        let mut psg = generator(mock);

        let report = psg
            .verify_output_with(Channel::Ch1, 10_000.0, 1.0, &fast_policy())
            .await
            .unwrap();

        assert!(!report.within_tolerance);
        assert_eq!(report.attempts, 3);
        assert!((report.frequency_hz - 10_200.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn amplitude_tolerance_checked_independently() {
        let mut mock = MockTransport::new();
        for _ in 0..3 {
            // Frequency is exact but amplitude is 0.90 V against a 1.0 V
            // target (band: max(10 mV, 5%) = 50 mV).
            expect_readback(&mut mock, 10_000_000, 900);
        }
        let mut psg = generator(mock);

        let report = psg
            .verify_output_with(Channel::Ch1, 10_000.0, 1.0, &fast_policy())
            .await
            .unwrap();

        assert!(!report.within_tolerance);
        assert!((report.amplitude_vpp - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn small_amplitude_uses_absolute_floor() {
        let mut mock = MockTransport::new();
        // 50 mV target: the 10 mV floor dominates the 5% band (2.5 mV).
        expect_readback(&mut mock, 1_000_000, 58);
        let mut psg = generator(mock);

        let report = psg
            .verify_output_with(Channel::Ch1, 1000.0, 0.05, &fast_policy())
            .await
            .unwrap();

        assert!(report.within_tolerance);
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b":r13=0.\r\n");
        let mut psg = generator(mock);

        let result = psg
            .verify_output_with(Channel::Ch1, 10_000.0, 1.0, &fast_policy())
            .await;
        assert!(result.is_err());
    }
}
