use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub type Screen = [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT];

/// The 64x32 monochrome frame buffer together with its "needs redraw" flag.
///
/// Sprites are XOR-composited. The sprite origin wraps around the screen, but
/// pixels running off the right or bottom edge are clipped, never wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    screen: Screen,
    redraw: bool,
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl Display {
    pub fn new() -> Self {
        Display {
            screen: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
            redraw: true,
        }
    }

    pub fn clear(&mut self) {
        self.screen = [[false; SCREEN_WIDTH]; SCREEN_HEIGHT];
        self.redraw = true;
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.screen[y % SCREEN_HEIGHT][x % SCREEN_WIDTH]
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Checks and clears the redraw flag
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    /// Draws one sprite row per byte. Returns true if any lit pixel was turned off.
    pub fn draw(&mut self, reg_x: u8, reg_y: u8, sprite: &[u8]) -> bool {
        let x = reg_x as usize % SCREEN_WIDTH;
        let y = reg_y as usize % SCREEN_HEIGHT;
        let mut collision = false;

        for (yo, data) in sprite.iter().enumerate() {
            let row = y + yo;
            if row >= SCREEN_HEIGHT {
                break;
            }

            for (xo, bit) in byte_to_bits(*data).iter().enumerate() {
                let col = x + xo;
                if col >= SCREEN_WIDTH {
                    break;
                }

                if *bit {
                    let pixel = &mut self.screen[row][col];
                    collision |= *pixel;
                    *pixel ^= true;
                }
            }
        }

        self.redraw = true;
        collision
    }
}

/// Bits from the most to least significant
fn byte_to_bits(b: u8) -> [bool; 8] {
    std::array::from_fn(|i| (b >> (7 - i)) & 1 == 1)
}
