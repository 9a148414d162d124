//! CV lane sampling.
//!
//! The envelope parameters expect slowly varying voltages, so every lane is
//! run through a heavy running average before it reaches the resolver.

/// Number of CV lanes shared by all channels.
pub const CV_LANES: usize = 4;

/// Weight of the running average applied to each lane.
pub const CV_SMOOTHING: i32 = 16;

/// Nominal span of a 12-bit CV sample after offset removal. Values outside
/// this span are still accepted and saturate downstream.
pub const CV_NOMINAL_MIN: i32 = -2048;
pub const CV_NOMINAL_MAX: i32 = 2047;

/// One smoothed sample per lane.
pub type CvLanes = [i32; CV_LANES];

/// Running average: `v = (v * (N - 1) + x) / N`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmoothedValue<const N: i32> {
    value: i32,
}

impl<const N: i32> SmoothedValue<N> {
    pub fn push(&mut self, sample: i32) {
        let acc = i64::from(self.value) * i64::from(N - 1) + i64::from(sample);
        self.value = (acc / i64::from(N)) as i32;
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.value
    }
}

/// Smooths the four CV lanes once per tick.
#[derive(Debug, Clone, Default)]
pub struct CvSampler {
    lanes: [SmoothedValue<CV_SMOOTHING>; CV_LANES],
}

impl CvSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push this tick's raw samples and return the smoothed lanes.
    pub fn push(&mut self, raw: &CvLanes) -> CvLanes {
        for (lane, &sample) in self.lanes.iter_mut().zip(raw) {
            lane.push(sample);
        }
        self.values()
    }

    pub fn values(&self) -> CvLanes {
        let mut out = [0; CV_LANES];
        for (o, lane) in out.iter_mut().zip(&self.lanes) {
            *o = lane.value();
        }
        out
    }
}
