//! 2D grids used at every assembly level: tiles into parts, parts into
//! sprites, meta-tiles into levels.

use crate::gfx::color::Color;

/// Palette-index pixels.
pub type PixelMatrix = Matrix<u8>;

/// Resolved pixels; `None` is transparent.
pub type ImageMatrix = Matrix<Option<Color>>;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Matrix<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> Matrix<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Matrix {
            width,
            height,
            cells: vec![T::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> T {
        self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.cells[y * self.width + x] = value;
    }

    /// Reverses every row in place.
    pub fn flip_horizontal(&mut self) {
        for row in self.cells.chunks_mut(self.width) {
            row.reverse();
        }
    }

    /// Reverses every column in place.
    pub fn flip_vertical(&mut self) {
        for y in 0..self.height / 2 {
            let (a, b) = (y * self.width, (self.height - 1 - y) * self.width);
            for x in 0..self.width {
                self.cells.swap(a + x, b + x);
            }
        }
    }

    /// Copies `src` into `self` with its top-left corner at `(x, y)`.
    /// Returns false without writing anything if the block does not fit.
    pub fn blit(&mut self, src: &Matrix<T>, x: usize, y: usize) -> bool {
        if x + src.width > self.width || y + src.height > self.height {
            return false;
        }
        for sy in 0..src.height {
            let dst = (y + sy) * self.width + x;
            let s = sy * src.width;
            self.cells[dst..dst + src.width].copy_from_slice(&src.cells[s..s + src.width]);
        }
        true
    }
}

impl ImageMatrix {
    /// Like [`Matrix::blit`] but transparent source pixels leave the
    /// destination untouched.
    pub fn overlay(&mut self, src: &ImageMatrix, x: usize, y: usize) -> bool {
        if x + src.width > self.width || y + src.height > self.height {
            return false;
        }
        for sy in 0..src.height {
            for sx in 0..src.width {
                if let Some(c) = src.get(sx, sy) {
                    self.set(x + sx, y + sy, Some(c));
                }
            }
        }
        true
    }
}
