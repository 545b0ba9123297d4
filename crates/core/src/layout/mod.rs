//! Candle placement on the top face of the cake.
//!
//! Candles sit evenly spaced on an ellipse that approximates the cake's top
//! seen in perspective. Placements are always recomputed from the candle
//! count, never patched, so spacing stays even no matter how the count was
//! reached.

use std::{f32::consts::TAU, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{config::CandleConfig, CakeError, Result};

/// Ellipse in percent-of-cake coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub cx: f32,
    pub cy: f32,
    pub rx: f32,
    pub ry: f32,
}

impl Default for Ellipse {
    fn default() -> Self {
        // Flat ellipse so the ring reads as the top of the cake.
        Self {
            cx: 50.0,
            cy: 25.0,
            rx: 30.0,
            ry: 6.0,
        }
    }
}

impl Ellipse {
    pub fn validate(&self) -> Result<()> {
        let finite = [self.cx, self.cy, self.rx, self.ry]
            .iter()
            .all(|value| value.is_finite());
        if !finite || self.rx < 0.0 || self.ry < 0.0 {
            return Err(CakeError::config(format!(
                "candles.ellipse must be finite with non-negative radii, got {self:?}"
            )));
        }
        Ok(())
    }

    /// Point on the ellipse at `angle` radians.
    pub fn point_at(&self, angle: f32) -> (f32, f32) {
        (
            self.cx + self.rx * angle.cos(),
            self.cy + self.ry * angle.sin(),
        )
    }
}

/// Where one candle is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandlePlacement {
    pub index: usize,
    pub angle: f32,
    pub x: f32,
    pub y: f32,
    /// Larger values draw later, in front.
    pub depth_order: i32,
}

/// Evenly distributes `count` candles around `ellipse`.
pub fn layout(count: usize, ellipse: &Ellipse) -> Vec<CandlePlacement> {
    (0..count)
        .map(|index| {
            let angle = TAU * index as f32 / count as f32;
            let (x, y) = ellipse.point_at(angle);
            CandlePlacement {
                index,
                angle,
                x,
                y,
                depth_order: y.floor() as i32,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub id: u64,
    pub lit: bool,
    /// Tick at which the flame was blown out.
    pub extinguished_at: Option<Duration>,
}

/// Ordered candle collection plus its derived placements.
#[derive(Debug, Clone)]
pub struct CandleLayoutEngine {
    ellipse: Ellipse,
    max_candles: usize,
    candles: Vec<Candle>,
    placements: Vec<CandlePlacement>,
    next_id: u64,
}

impl CandleLayoutEngine {
    pub fn new(config: &CandleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ellipse: config.ellipse,
            max_candles: config.max_candles,
            candles: Vec::with_capacity(config.max_candles),
            placements: Vec::with_capacity(config.max_candles),
            next_id: 1,
        })
    }

    pub fn ellipse(&self) -> &Ellipse {
        &self.ellipse
    }

    pub fn max_candles(&self) -> usize {
        self.max_candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn placements(&self) -> &[CandlePlacement] {
        &self.placements
    }

    /// Appends a lit candle. Returns `false` when already at capacity.
    pub fn add_candle(&mut self) -> bool {
        if self.candles.len() >= self.max_candles {
            return false;
        }
        let candle = self.fresh_candle();
        self.candles.push(candle);
        self.relayout();
        true
    }

    /// Removes the most recently added candle. Returns `false` when empty.
    pub fn remove_candle(&mut self) -> bool {
        if self.candles.pop().is_none() {
            return false;
        }
        self.relayout();
        true
    }

    /// Replaces the collection with `count` lit candles, clamped to capacity.
    pub fn reset_to(&mut self, count: usize) {
        let count = count.min(self.max_candles);
        self.candles.clear();
        for _ in 0..count {
            let candle = self.fresh_candle();
            self.candles.push(candle);
        }
        self.relayout();
    }

    pub fn clear(&mut self) {
        self.reset_to(0);
    }

    /// Blows out every lit candle. Returns how many flames went out.
    pub fn extinguish_all(&mut self, now: Duration) -> usize {
        let mut extinguished = 0;
        for candle in self.candles.iter_mut().filter(|candle| candle.lit) {
            candle.lit = false;
            candle.extinguished_at = Some(now);
            extinguished += 1;
        }
        extinguished
    }

    pub fn lit_count(&self) -> usize {
        self.candles.iter().filter(|candle| candle.lit).count()
    }

    fn fresh_candle(&mut self) -> Candle {
        let id = self.next_id;
        self.next_id += 1;
        Candle {
            id,
            lit: true,
            extinguished_at: None,
        }
    }

    fn relayout(&mut self) {
        self.placements = layout(self.candles.len(), &self.ellipse);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> CandleLayoutEngine {
        CandleLayoutEngine::new(&CandleConfig::default()).unwrap()
    }

    #[test]
    fn empty_layout_for_zero_candles() {
        assert!(layout(0, &Ellipse::default()).is_empty());
    }

    #[test]
    fn angles_are_evenly_spaced() {
        let ellipse = Ellipse::default();
        for count in 1..=20 {
            let placements = layout(count, &ellipse);
            assert_eq!(placements.len(), count);

            let step = TAU / count as f32;
            for pair in placements.windows(2) {
                assert!((pair[1].angle - pair[0].angle - step).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn first_candle_sits_on_the_right_edge() {
        let placements = layout(4, &Ellipse::default());

        assert!((placements[0].x - 80.0).abs() < 1e-4);
        assert!((placements[0].y - 25.0).abs() < 1e-4);
        // quarter turn lands on the front of the cake
        assert!((placements[1].y - 31.0).abs() < 1e-4);
        assert_eq!(placements[1].depth_order, 31);
        assert!(placements[1].depth_order > placements[3].depth_order);
    }

    #[test]
    fn add_clamps_at_capacity() {
        let mut engine = engine();
        for _ in 0..25 {
            engine.add_candle();
        }

        assert_eq!(engine.len(), 20);
        assert_eq!(engine.placements().len(), 20);
        assert!(!engine.add_candle());
    }

    #[test]
    fn remove_on_empty_is_a_no_op() {
        let mut engine = engine();

        assert!(!engine.remove_candle());
        assert_eq!(engine.len(), 0);
        assert!(engine.placements().is_empty());
    }

    #[test]
    fn relayout_matches_fresh_layout_regardless_of_history() {
        let mut engine = engine();
        for _ in 0..7 {
            engine.add_candle();
        }
        engine.remove_candle();
        engine.remove_candle();

        assert_eq!(engine.placements(), layout(5, engine.ellipse()).as_slice());
    }

    #[test]
    fn extinguish_then_reset_relights() {
        let mut engine = engine();
        engine.reset_to(3);

        assert_eq!(engine.extinguish_all(Duration::from_secs(1)), 3);
        assert_eq!(engine.lit_count(), 0);
        assert_eq!(engine.extinguish_all(Duration::from_secs(2)), 0);

        engine.reset_to(3);
        assert_eq!(engine.lit_count(), 3);
        assert!(engine.candles().iter().all(|c| c.extinguished_at.is_none()));
    }

    #[test]
    fn candle_ids_are_unique() {
        let mut engine = engine();
        engine.add_candle();
        engine.remove_candle();
        engine.add_candle();
        engine.add_candle();

        let ids: Vec<u64> = engine.candles().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
