//! Metrics derived from the raw simulator output.

use crate::simulator::{
    InvocationError, RawObservation, RX_BYTES_APPLICATION, RX_COUNT_PACKETS, RX_MS_LAST,
    TX_COUNT_PACKETS,
};

/// Simulated time before the data transfer can begin; the transfer
/// duration is measured from here to the last received byte.
pub const DEFAULT_START_OFFSET_MS: u64 = 10260;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    /// kB/s
    pub throughput: f64,
    /// Percentage of sent packets that arrived, for packet sweeps
    pub arrived: Option<f64>,
}

impl DerivedMetrics {
    /// Returns `None` if no data reached the receiver: such runs are
    /// discarded, not recorded. Errors if a required field is missing
    /// from the simulator output.
    pub fn from_observation(
        raw: &RawObservation,
        start_offset_ms: u64,
        packets: bool,
    ) -> Result<Option<Self>, InvocationError> {
        let rx_bytes = raw.get_u64(RX_BYTES_APPLICATION)?;
        if rx_bytes == 0 {
            return Ok(None);
        }
        let rx_ms_last = raw.get_u64(RX_MS_LAST)?;
        let time_taken = (rx_ms_last as f64 - start_offset_ms as f64) / 1000.;
        let data_transferred = rx_bytes as f64 / 1000.;
        let throughput = data_transferred / time_taken;

        let arrived = if packets {
            let rx_count = raw.get_u64(RX_COUNT_PACKETS)?;
            let tx_count = raw.get_u64(TX_COUNT_PACKETS)?;
            Some(rx_count as f64 / tx_count as f64 * 100.)
        } else {
            None
        };

        Ok(Some(Self {
            throughput,
            arrived,
        }))
    }

    /// False if the run ended at the start offset, or no packets were
    /// sent, which makes the metrics infinite or NaN (and JSON can't
    /// represent them).
    pub fn is_finite(&self) -> bool {
        self.throughput.is_finite() && self.arrived.map_or(true, f64::is_finite)
    }
}
