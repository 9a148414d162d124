/*
Euclidean Gate Filter
=====================

Spreads `fill` pulses as evenly as possible over `length` steps and lets a
trigger through only when it lands on a pulse. Steps are counted per raw
trigger, so a dropped trigger still advances the pattern.

  length   Steps in one pattern cycle. 0 turns the filter off.
  fill     Pulses per cycle. 0 blocks everything, >= length passes
           everything.
  offset   Rotation. Counter value `offset` lines up with step 0.

The pattern is built with Bjorklund's algorithm: start with `fill` groups
"1" and `length - fill` groups "0", then keep appending one remainder group to
each leading group until at most one remainder is left. For (8, 3) that gives
`10010010`, i.e. steps {0, 3, 6}.
*/

/// Longest pattern the filter accepts.
pub const MAX_EUCLIDEAN_LENGTH: u32 = 32;

/// Bjorklund pattern as a bit mask; bit `n` is step `n`.
pub fn euclidean_pattern(length: u32, fill: u32) -> u32 {
    let length = length.min(MAX_EUCLIDEAN_LENGTH);
    if length == 0 || fill == 0 {
        return 0;
    }
    if fill >= length {
        return full_mask(length);
    }

    // Each group is a short bit string: (bits, len).
    let mut groups = [(0u32, 0u32); MAX_EUCLIDEAN_LENGTH as usize];
    for (i, group) in groups.iter_mut().enumerate().take(length as usize) {
        *group = if (i as u32) < fill { (1, 1) } else { (0, 1) };
    }

    let mut heads = fill as usize;
    let mut tails = (length - fill) as usize;
    while tails > 1 {
        let pairs = heads.min(tails);
        for i in 0..pairs {
            let (tail_bits, tail_len) = groups[heads + i];
            let (bits, len) = &mut groups[i];
            *bits |= tail_bits << *len;
            *len += tail_len;
        }
        if heads > tails {
            // Unpaired heads already sit right after the paired ones.
            tails = heads - pairs;
        } else {
            groups.copy_within(heads + pairs..heads + tails, pairs);
            tails -= pairs;
        }
        heads = pairs;
    }

    let mut mask = 0u32;
    let mut pos = 0u32;
    for &(bits, len) in groups.iter().take(heads + tails) {
        mask |= bits << pos;
        pos += len;
    }
    mask
}

#[inline]
fn full_mask(length: u32) -> u32 {
    if length >= 32 {
        u32::MAX
    } else {
        (1 << length) - 1
    }
}

/// Whether a trigger at absolute step `counter` passes the pattern.
pub fn euclidean_filter(length: u32, fill: u32, offset: u32, counter: u32) -> bool {
    if length == 0 {
        return true;
    }
    let length = length.min(MAX_EUCLIDEAN_LENGTH);
    let step = (counter % length + length - offset % length) % length;
    euclidean_pattern(length, fill) & (1 << step) != 0
}

/// Step counter and reset divider for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EuclideanState {
    counter: u32,
    reset_counter: u32,
}

impl EuclideanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps counted since the last realignment.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Count a raw trigger.
    #[inline]
    pub fn advance(&mut self) {
        self.counter = self.counter.wrapping_add(1);
    }

    /// Count a reset-input edge. After `div` of them both counters restart.
    pub fn reset_edge(&mut self, div: u32) {
        self.reset_counter += 1;
        if self.reset_counter >= div.max(1) {
            self.counter = 0;
            self.reset_counter = 0;
        }
    }

    /// Filter a trigger against the current step.
    pub fn accepts(&self, length: u32, fill: u32, offset: u32) -> bool {
        euclidean_filter(length, fill, offset, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(mask: u32, length: u32) -> Vec<u32> {
        (0..length).filter(|n| mask & (1 << n) != 0).collect()
    }

    #[test]
    fn classic_patterns() {
        assert_eq!(steps(euclidean_pattern(8, 3), 8), vec![0, 3, 6]);
        assert_eq!(steps(euclidean_pattern(8, 5), 8), vec![0, 2, 3, 5, 6]);
        assert_eq!(steps(euclidean_pattern(16, 4), 16), vec![0, 4, 8, 12]);
        assert_eq!(steps(euclidean_pattern(13, 5), 13).len(), 5);
    }

    #[test]
    fn every_pattern_has_fill_pulses() {
        for length in 1..=31 {
            for fill in 0..=32 {
                let pulses = euclidean_pattern(length, fill).count_ones();
                assert_eq!(pulses, fill.min(length), "E({fill}, {length})");
            }
        }
    }

    #[test]
    fn window_of_length_passes_exactly_fill() {
        for length in 1..=31u32 {
            for fill in 0..=length {
                for start in [0u32, 5, 17, 1000] {
                    let passed = (start..start + length)
                        .filter(|&c| euclidean_filter(length, fill, 0, c))
                        .count() as u32;
                    assert_eq!(passed, fill);
                }
            }
        }
    }

    #[test]
    fn disabled_filter_passes_everything() {
        assert!((0..100).all(|c| euclidean_filter(0, 0, 7, c)));
    }

    #[test]
    fn zero_fill_blocks_and_overfill_passes() {
        assert!((0..64).all(|c| !euclidean_filter(8, 0, 0, c)));
        assert!((0..64).all(|c| euclidean_filter(8, 12, 3, c)));
    }

    #[test]
    fn offset_rotates_and_wraps() {
        let base: Vec<bool> = (0..16).map(|c| euclidean_filter(8, 3, 0, c)).collect();
        let shifted: Vec<bool> = (0..16).map(|c| euclidean_filter(8, 3, 2, c + 2)).collect();
        assert_eq!(base, shifted);

        let wrapped: Vec<bool> = (0..16).map(|c| euclidean_filter(8, 3, 10, c)).collect();
        let plain: Vec<bool> = (0..16).map(|c| euclidean_filter(8, 3, 2, c)).collect();
        assert_eq!(wrapped, plain);
    }

    #[test]
    fn reset_realigns_after_div_edges() {
        let mut state = EuclideanState::new();
        for _ in 0..5 {
            state.advance();
        }
        state.reset_edge(2);
        assert_eq!(state.counter(), 5);
        state.reset_edge(2);
        assert_eq!(state.counter(), 0);

        state.advance();
        state.reset_edge(1);
        assert_eq!(state.counter(), 0);
    }
}
