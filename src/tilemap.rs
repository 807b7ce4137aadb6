use serde::{Deserialize, Serialize};

/// Offsets for the 8-connected neighborhood, clockwise from north.
pub const DX8: [i32; 8] = [0, 1, 1, 1, 0, -1, -1, -1];
pub const DY8: [i32; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];

/// A dense 2D grid stored row-major: cell `(x, y)` lives at index `y * width + x`.
///
/// The map does not wrap; neighbor queries stop at the edges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx % self.width, idx / self.width)
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Access by flat index.
    pub fn at(&self, idx: usize) -> &T {
        &self.data[idx]
    }

    pub fn at_mut(&mut self, idx: usize) -> &mut T {
        &mut self.data[idx]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Flat indices of the 4-connected neighbors (up, down, left, right).
    pub fn neighbors_4(&self, idx: usize) -> impl Iterator<Item = usize> {
        let (x, y) = self.coords(idx);
        let (w, h) = (self.width, self.height);
        let up = (y > 0).then(|| idx - w);
        let down = (y + 1 < h).then(|| idx + w);
        let left = (x > 0).then(|| idx - 1);
        let right = (x + 1 < w).then(|| idx + 1);
        [up, down, left, right].into_iter().flatten()
    }

    /// Flat indices of the 8-connected neighbors, clockwise from north.
    pub fn neighbors_8(&self, idx: usize) -> impl Iterator<Item = usize> {
        let (x, y) = self.coords(idx);
        let (w, h) = (self.width as i32, self.height as i32);
        (0..8).filter_map(move |d| {
            let nx = x as i32 + DX8[d];
            let ny = y as i32 + DY8[d];
            (nx >= 0 && nx < w && ny >= 0 && ny < h).then(|| (ny * w + nx) as usize)
        })
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }
}

impl Tilemap<f32> {
    /// Min-max normalize every value into `[0, 1]`. A flat map becomes all zeros.
    pub fn normalize(&mut self) {
        let (min, max) = self.range();
        let span = max - min;
        for v in self.data.iter_mut() {
            *v = if span > f32::EPSILON { (*v - min) / span } else { 0.0 };
        }
    }

    /// `(min, max)` over all cells.
    pub fn range(&self) -> (f32, f32) {
        self.data.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}
