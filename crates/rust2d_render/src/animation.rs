//! Frame animations
//!
//! An [`Animation`] cycles through texture regions, holding each one for a
//! number of ticks. It does not tick itself: whoever owns a copy advances it
//! from their own tick, so the frame rate follows the fixed simulation rate.

use thiserror::Error;

use crate::texture::TextureRegion;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnimationError {
    #[error("animation '{0}' has no frames")]
    NoFrames(String),
}

/// One frame and how many ticks it stays on screen
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub region: TextureRegion,
    pub ticks: u32,
}

/// A looping sequence of texture regions
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    name: String,
    frames: Vec<Frame>,
    current: usize,
    remaining: u32,
}

impl Animation {
    /// Build from `(region, ticks)` pairs; a duration of 0 counts as 1
    pub fn new(
        name: impl Into<String>,
        frames: impl IntoIterator<Item = (TextureRegion, u32)>,
    ) -> Result<Self, AnimationError> {
        let name = name.into();
        let frames: Vec<Frame> = frames
            .into_iter()
            .map(|(region, ticks)| Frame { region, ticks: ticks.max(1) })
            .collect();
        let Some(first) = frames.first() else {
            return Err(AnimationError::NoFrames(name));
        };
        let remaining = first.ticks;
        Ok(Self {
            name,
            frames,
            current: 0,
            remaining,
        })
    }

    /// Every frame shown for the same number of ticks
    pub fn uniform(
        name: impl Into<String>,
        regions: impl IntoIterator<Item = TextureRegion>,
        ticks: u32,
    ) -> Result<Self, AnimationError> {
        Self::new(name, regions.into_iter().map(|r| (r, ticks)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Advance one tick, wrapping to the first frame after the last
    pub fn tick(&mut self) {
        self.remaining -= 1;
        if self.remaining == 0 {
            self.current = (self.current + 1) % self.frames.len();
            self.remaining = self.frames[self.current].ticks;
        }
    }

    /// Back to the first frame
    pub fn reset(&mut self) {
        self.current = 0;
        self.remaining = self.frames[0].ticks;
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> &TextureRegion {
        &self.frames[self.current].region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::TextureId;

    fn region(x: f32) -> TextureRegion {
        TextureRegion::new(TextureId(1), x, 0.0, 0.25, 1.0)
    }

    #[test]
    fn test_no_frames_rejected() {
        let err = Animation::new("empty", Vec::new()).unwrap_err();
        assert_eq!(err, AnimationError::NoFrames("empty".to_string()));
    }

    #[test]
    fn test_frames_hold_for_their_duration_and_wrap() {
        let mut anim = Animation::new("walk", [(region(0.0), 2), (region(0.25), 1), (region(0.5), 3)]).unwrap();

        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(anim.current_index());
            anim.tick();
        }
        // 2 ticks on frame 0, 1 on frame 1, 3 on frame 2, then back to 0
        assert_eq!(seen, vec![0, 0, 1, 2, 2, 2, 0, 0]);
        assert_eq!(anim.current_frame().x, 0.25);
    }

    #[test]
    fn test_single_frame_stays_put() {
        let mut anim = Animation::uniform("still", [region(0.5)], 4).unwrap();
        for _ in 0..10 {
            anim.tick();
        }
        assert_eq!(anim.current_index(), 0);
    }

    #[test]
    fn test_zero_duration_counts_as_one() {
        let mut anim = Animation::uniform("fast", [region(0.0), region(0.25)], 0).unwrap();
        anim.tick();
        assert_eq!(anim.current_index(), 1);
        anim.tick();
        assert_eq!(anim.current_index(), 0);
    }

    #[test]
    fn test_reset() {
        let mut anim = Animation::uniform("blink", [region(0.0), region(0.25)], 1).unwrap();
        anim.tick();
        anim.reset();
        assert_eq!(anim.current_index(), 0);
        assert_eq!(anim.frames().len(), 2);
    }
}
