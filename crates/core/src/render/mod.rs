//! Draw commands handed to the render surface once per tick.
//!
//! Pixel drawing lives outside the core; a surface receives a full
//! [`RenderFrame`] every tick and draws it however it likes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    celebration::{Balloon, Particle},
    layout::{Candle, CandlePlacement},
    machine::{Hint, InteractionState},
    scene::{CakeStyle, FruitPosition},
    Result,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleDraw {
    pub id: u64,
    /// Percent of the cake width.
    pub x: f32,
    /// Percent of the cake height.
    pub y: f32,
    pub depth_order: i32,
    pub lit: bool,
    /// 1 while lit, fading to 0 after being blown out.
    pub flame_opacity: f32,
    pub smoking: bool,
}

impl CandleDraw {
    pub fn new(
        candle: &Candle,
        placement: &CandlePlacement,
        now: Duration,
        flame_fade: Duration,
        smoke: Duration,
    ) -> Self {
        let since = candle
            .extinguished_at
            .map(|at| now.saturating_sub(at));
        let flame_opacity = match since {
            None => 1.0,
            Some(_) if flame_fade.is_zero() => 0.0,
            Some(elapsed) => (1.0 - elapsed.as_secs_f32() / flame_fade.as_secs_f32()).max(0.0),
        };
        Self {
            id: candle.id,
            x: placement.x,
            y: placement.y,
            depth_order: placement.depth_order,
            lit: candle.lit,
            flame_opacity,
            smoking: since.map(|elapsed| elapsed < smoke).unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FruitDraw {
    pub x: f32,
    pub y: f32,
    pub depth_order: i32,
}

impl From<&FruitPosition> for FruitDraw {
    fn from(fruit: &FruitPosition) -> Self {
        Self {
            x: fruit.x,
            y: fruit.y,
            depth_order: fruit.depth_order(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalloonDraw {
    pub x: f32,
    /// Eased rise progress, 0 at the bottom edge and 1 off the top.
    pub progress: f32,
    pub color: String,
}

impl BalloonDraw {
    pub fn new(balloon: &Balloon, now: Duration) -> Self {
        Self {
            x: balloon.x,
            progress: balloon.progress(now),
            color: balloon.color.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleDraw {
    pub x: f32,
    pub y: f32,
    /// Degrees.
    pub rotation: f32,
    pub size: f32,
    pub color: String,
}

impl From<&Particle> for ParticleDraw {
    fn from(particle: &Particle) -> Self {
        Self {
            x: particle.x,
            y: particle.y,
            rotation: particle.rotation,
            size: particle.size,
            color: particle.color.to_string(),
        }
    }
}

/// Everything a surface needs to draw one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub time: Duration,
    pub state: InteractionState,
    pub hint: Hint,
    pub style: CakeStyle,
    pub candles: Vec<CandleDraw>,
    pub fruits: Vec<FruitDraw>,
    pub balloons: Vec<BalloonDraw>,
    pub particles: Vec<ParticleDraw>,
    pub effect_active: bool,
}

/// Something that can present frames.
pub trait RenderSurface {
    fn present(&mut self, frame: &RenderFrame) -> Result<()>;

    /// Called once after the last frame. Buffered surfaces must flush here
    /// and report any write failure.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Surface that keeps the most recent frame, for inspection and tests.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    last: Option<RenderFrame>,
    presented: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&RenderFrame> {
        self.last.as_ref()
    }

    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl RenderSurface for FrameBuffer {
    fn present(&mut self, frame: &RenderFrame) -> Result<()> {
        self.last = Some(frame.clone());
        self.presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement() -> CandlePlacement {
        CandlePlacement {
            index: 0,
            angle: 0.0,
            x: 80.0,
            y: 25.0,
            depth_order: 25,
        }
    }

    #[test]
    fn lit_candle_has_full_flame() {
        let candle = Candle {
            id: 1,
            lit: true,
            extinguished_at: None,
        };
        let draw = CandleDraw::new(
            &candle,
            &placement(),
            Duration::from_secs(5),
            Duration::from_millis(200),
            Duration::from_secs(1),
        );

        assert_eq!(draw.flame_opacity, 1.0);
        assert!(!draw.smoking);
    }

    #[test]
    fn blown_out_candle_fades_and_smokes() {
        let candle = Candle {
            id: 1,
            lit: false,
            extinguished_at: Some(Duration::from_secs(1)),
        };
        let fade = Duration::from_millis(200);
        let smoke = Duration::from_secs(1);

        let early = CandleDraw::new(&candle, &placement(), Duration::from_millis(1_100), fade, smoke);
        assert!((early.flame_opacity - 0.5).abs() < 1e-4);
        assert!(early.smoking);

        let late = CandleDraw::new(&candle, &placement(), Duration::from_millis(2_500), fade, smoke);
        assert_eq!(late.flame_opacity, 0.0);
        assert!(!late.smoking);
    }
}
