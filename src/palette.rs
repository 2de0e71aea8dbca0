use crate::color::Color;
use crate::error::PaletteError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The MakeCode Arcade palette. Index 0 and 15 are both black.
pub const ARCADE_PALETTE: &str = "#000000,#ffffff,#ff2121,#ff93c4,\
                                  #ff8135,#fff609,#249ca3,#78dc52,\
                                  #003fad,#87f2ff,#8e2ec4,#a4839f,\
                                  #5c406c,#e5cdc4,#91463d,#000000";

/// Ordered, non-empty list of target colors.
///
/// A color's position is the token it is written as. Repeated colors are
/// allowed; lookups by color always answer the first position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

#[allow(clippy::len_without_is_empty)]
impl Palette {
    pub fn new(colors: Vec<Color>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        Ok(Self { colors })
    }

    pub fn arcade() -> Self {
        Self {
            colors: vec![
                Color::new(0x00, 0x00, 0x00),
                Color::new(0xff, 0xff, 0xff),
                Color::new(0xff, 0x21, 0x21),
                Color::new(0xff, 0x93, 0xc4),
                Color::new(0xff, 0x81, 0x35),
                Color::new(0xff, 0xf6, 0x09),
                Color::new(0x24, 0x9c, 0xa3),
                Color::new(0x78, 0xdc, 0x52),
                Color::new(0x00, 0x3f, 0xad),
                Color::new(0x87, 0xf2, 0xff),
                Color::new(0x8e, 0x2e, 0xc4),
                Color::new(0xa4, 0x83, 0x9f),
                Color::new(0x5c, 0x40, 0x6c),
                Color::new(0xe5, 0xcd, 0xc4),
                Color::new(0x91, 0x46, 0x3d),
                Color::new(0x00, 0x00, 0x00),
            ],
        }
    }

    #[inline(always)]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Never zero.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn get(&self, position: usize) -> Option<Color> {
        self.colors.get(position).copied()
    }

    /// First position holding `color`.
    pub fn position(&self, color: Color) -> Option<usize> {
        self.colors.iter().position(|&c| c == color)
    }

    /// Map from each distinct color to its first position.
    pub fn positions(&self) -> HashMap<Color, usize> {
        let mut positions = HashMap::with_capacity(self.len());
        for (i, &color) in self.colors.iter().enumerate() {
            positions.entry(color).or_insert(i);
        }
        positions
    }

    /// Number of hex digits every token is written with.
    pub fn token_width(&self) -> usize {
        let mut width = 1;
        let mut max = (self.len() - 1) >> 4;
        while max > 0 {
            width += 1;
            max >>= 4;
        }
        width
    }

    pub fn token(&self, position: usize) -> String {
        format!("{:0width$x}", position, width = self.token_width())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::arcade()
    }
}

impl FromStr for Palette {
    type Err = PaletteError;

    /// Parses a comma separated list of 6-digit hex colors, `#` optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(PaletteError::Empty);
        }
        let colors = s
            .split(',')
            .map(str::parse)
            .collect::<Result<Vec<Color>, _>>()?;
        Self::new(colors)
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, color) in self.colors.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{color}")?;
        }
        Ok(())
    }
}
