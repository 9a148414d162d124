use crate::io::cv::CvLanes;
use crate::settings::{ChannelConfig, CvMapping};

/// Largest Euclidean length after modulation.
pub const RESOLVED_LENGTH_MAX: i64 = 31;
/// Largest Euclidean fill or offset after modulation.
pub const RESOLVED_FILL_MAX: i64 = 32;

/// Working values for one tick, after CV modulation and saturation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedParams {
    /// Segment values, 16-bit.
    pub segments: [u16; 4],
    pub euclidean_length: u32,
    pub euclidean_fill: u32,
    pub euclidean_offset: u32,
    pub delay_ms: u16,
    pub amplitude: u16,
    pub max_loops: u16,
}

/// Stretch an 8-bit setting over the full 16-bit range.
#[inline]
pub fn scale8_16(value: i32) -> i64 {
    ((i64::from(value) + 1) << 8) - 1
}

#[inline]
fn segment_cv(cv: i32) -> i64 {
    (i64::from(cv) * 65_536) >> 12
}

#[inline]
fn saturate_u16(value: i64) -> u16 {
    value.clamp(0, i64::from(u16::MAX)) as u16
}

/// Combine stored settings with the four CV lanes.
///
/// Several lanes may target the same value; contributions add up before
/// anything is clamped.
pub fn resolve(config: &ChannelConfig, cvs: &CvLanes) -> ResolvedParams {
    let mut segments = [0i64; 4];
    for (n, seg) in segments.iter_mut().enumerate() {
        *seg = scale8_16(config.segment_value(n));
    }
    let mut length = i64::from(config.euclidean_length());
    let mut fill = i64::from(config.euclidean_fill());
    let mut offset = i64::from(config.euclidean_offset());
    let mut delay_ms = i64::from(config.delay_ms());
    let mut amplitude = i64::from(config.amplitude());
    let mut max_loops = i64::from(config.max_loops());

    for (lane, &cv) in cvs.iter().enumerate() {
        match config.cv_mapping(lane) {
            CvMapping::None => {}
            CvMapping::Seg1 => segments[0] += segment_cv(cv),
            CvMapping::Seg2 => segments[1] += segment_cv(cv),
            CvMapping::Seg3 => segments[2] += segment_cv(cv),
            CvMapping::Seg4 => segments[3] += segment_cv(cv),
            CvMapping::Adr => {
                let delta = segment_cv(cv);
                segments[0] += delta;
                segments[1] += delta;
                segments[3] += delta;
            }
            CvMapping::EuclideanLength => length += i64::from(cv >> 6),
            CvMapping::EuclideanFill => fill += i64::from(cv >> 6),
            CvMapping::EuclideanOffset => offset += i64::from(cv >> 6),
            CvMapping::DelayMs => delay_ms += i64::from(cv >> 2),
            CvMapping::Amplitude => amplitude += i64::from(cv) << 5,
            CvMapping::MaxLoops => max_loops += i64::from(cv) << 2,
        }
    }

    ResolvedParams {
        segments: segments.map(saturate_u16),
        euclidean_length: length.clamp(0, RESOLVED_LENGTH_MAX) as u32,
        euclidean_fill: fill.clamp(0, RESOLVED_FILL_MAX) as u32,
        euclidean_offset: offset.clamp(0, RESOLVED_FILL_MAX) as u32,
        delay_ms: saturate_u16(delay_ms),
        amplitude: saturate_u16(amplitude),
        max_loops: saturate_u16(max_loops),
    }
}
