use serde::{Deserialize, Serialize};

use crate::{config::SceneConfig, CakeError, Result};

/// One of the selectable cake looks, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CakeStyle(pub u8);

impl Default for CakeStyle {
    fn default() -> Self {
        Self(1)
    }
}

/// Fixed fruit decoration, in percent-of-cake coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FruitPosition {
    pub x: f32,
    pub y: f32,
}

impl FruitPosition {
    pub fn defaults() -> Vec<Self> {
        [
            (42.0, 24.0),
            (58.0, 24.0),
            (50.0, 25.0),
            (38.0, 26.0),
            (62.0, 26.0),
            (50.0, 27.0),
        ]
        .into_iter()
        .map(|(x, y)| Self { x, y })
        .collect()
    }

    pub fn depth_order(&self) -> i32 {
        self.y.floor() as i32
    }
}

/// Static decoration of the cake: selected style and fruit toppings.
#[derive(Debug, Clone)]
pub struct CakeScene {
    style: CakeStyle,
    styles: u8,
    fruits: Vec<FruitPosition>,
}

impl CakeScene {
    pub fn new(config: &SceneConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            style: CakeStyle::default(),
            styles: config.styles,
            fruits: config.fruits.clone(),
        })
    }

    pub fn style(&self) -> CakeStyle {
        self.style
    }

    pub fn styles(&self) -> u8 {
        self.styles
    }

    pub fn fruits(&self) -> &[FruitPosition] {
        &self.fruits
    }

    pub fn switch(&mut self, style: CakeStyle) -> Result<()> {
        if style.0 == 0 || style.0 > self.styles {
            return Err(CakeError::InvalidInput("unknown cake style"));
        }
        self.style = style;
        Ok(())
    }
}
