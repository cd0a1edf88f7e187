//! Double-buffered frame targets and the adapter the pipeline writes through
//!
//! Pipeline coordinates are y-up (row 0 at the bottom). Storage is row-major
//! and top-down, so every access flips: stored row = height - y - 1.

use crate::error::{PipelineError, PipelineResult};
use crate::types::Color;

/// Depth value of an empty pixel (the far plane in NDC)
pub const DEPTH_CLEAR: f32 = 1.0;

/// A 2D surface with a displayed front copy and a written back copy
#[derive(Debug, Clone)]
pub struct DoubleBuffer<T> {
    width: usize,
    height: usize,
    front: Vec<T>,
    back: Vec<T>,
}

pub type ColorBuffer = DoubleBuffer<Color>;
pub type DepthBuffer = DoubleBuffer<f32>;

impl<T: Copy> DoubleBuffer<T> {
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self {
            width,
            height,
            front: vec![fill; width * height],
            back: vec![fill; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// The published surface, row-major top-down
    pub fn front(&self) -> &[T] {
        &self.front
    }

    /// The surface currently being rendered
    pub fn back(&self) -> &[T] {
        &self.back
    }

    pub fn back_mut(&mut self) -> &mut [T] {
        &mut self.back
    }

    /// Fill the back surface
    pub fn clear(&mut self, value: T) {
        self.back.fill(value);
    }

    /// Publish the back surface; the old front becomes the next back.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Read the front surface at pipeline (y-up) coordinates
    pub fn front_texel(&self, x: i32, y: i32) -> Option<T> {
        flip_index(x, y, self.width, self.height).map(|i| self.front[i])
    }

    /// Read the back surface at pipeline (y-up) coordinates
    pub fn back_texel(&self, x: i32, y: i32) -> Option<T> {
        flip_index(x, y, self.width, self.height).map(|i| self.back[i])
    }
}

impl DoubleBuffer<Color> {
    /// Front surface as packed RGBA8 bytes, ready for a blit
    pub fn front_rgba8(&self) -> Vec<u8> {
        self.front.iter().flat_map(|c| c.to_bytes()).collect()
    }
}

/// Storage index for pipeline coordinates, `None` when out of bounds
fn flip_index(x: i32, y: i32, width: usize, height: usize) -> Option<usize> {
    if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
        return None;
    }
    let row = height - y as usize - 1;
    Some(row * width + x as usize)
}

/// Borrowed attachments for one frame.
///
/// The adapter never owns its buffers; the borrows keep them alive and
/// exclusively held for as long as the frame is being drawn.
#[derive(Default)]
pub struct FrameAdapter<'a> {
    colors: Vec<&'a mut ColorBuffer>,
    depth: Option<&'a mut DepthBuffer>,
}

impl<'a> FrameAdapter<'a> {
    pub fn new() -> Self {
        Self { colors: Vec::new(), depth: None }
    }

    /// Attach a color buffer; returns its attachment index.
    pub fn bind_color(&mut self, buffer: &'a mut ColorBuffer) -> PipelineResult<usize> {
        self.check_size(buffer.size())?;
        self.colors.push(buffer);
        Ok(self.colors.len() - 1)
    }

    /// Attach the depth buffer, replacing any previous one.
    pub fn bind_depth(&mut self, buffer: &'a mut DepthBuffer) -> PipelineResult<()> {
        if !self.colors.is_empty() {
            self.check_size(buffer.size())?;
        }
        self.depth = Some(buffer);
        Ok(())
    }

    fn check_size(&self, size: (usize, usize)) -> PipelineResult<()> {
        match self.viewport() {
            Some(expected) if expected != size => Err(PipelineError::validation(format!(
                "attachment size {}x{} does not match bound size {}x{}",
                size.0, size.1, expected.0, expected.1
            ))),
            _ => Ok(()),
        }
    }

    /// Size of the first bound attachment (color first, then depth)
    pub fn viewport(&self) -> Option<(usize, usize)> {
        self.colors
            .first()
            .map(|c| c.size())
            .or_else(|| self.depth.as_ref().map(|d| d.size()))
    }

    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    pub fn read_depth(&self, x: i32, y: i32) -> f32 {
        self.depth
            .as_ref()
            .and_then(|d| d.back_texel(x, y))
            .unwrap_or(DEPTH_CLEAR)
    }

    pub fn write_depth(&mut self, x: i32, y: i32, value: f32) {
        if let Some(d) = self.depth.as_mut() {
            if let Some(i) = flip_index(x, y, d.width, d.height) {
                d.back[i] = value;
            }
        }
    }

    pub fn write_color(&mut self, index: usize, x: i32, y: i32, color: Color) {
        if let Some(c) = self.colors.get_mut(index) {
            if let Some(i) = flip_index(x, y, c.width, c.height) {
                c.back[i] = color;
            }
        }
    }

    /// Clear every color back buffer
    pub fn clear_color(&mut self, color: Color) {
        for c in &mut self.colors {
            c.clear(color);
        }
    }

    /// Reset the depth back buffer to the far plane
    pub fn clear_depth(&mut self) {
        if let Some(d) = self.depth.as_mut() {
            d.clear(DEPTH_CLEAR);
        }
    }

    /// Publish all attachments together. Taking `&mut self` means no region
    /// handed out by [`FrameAdapter::regions`] can still be alive.
    pub fn swap(&mut self) {
        for c in &mut self.colors {
            c.swap();
        }
        if let Some(d) = self.depth.as_mut() {
            d.swap();
        }
    }

    /// Split the back buffers into disjoint horizontal bands of `band_rows`
    /// stored rows each, ordered top to bottom.
    pub fn regions(&mut self, band_rows: usize) -> Vec<TargetRegion<'_>> {
        let Some((width, height)) = self.viewport() else {
            return Vec::new();
        };
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let band_rows = band_rows.clamp(1, height);
        let chunk = width * band_rows;

        let mut depth_chunks = self.depth.as_deref_mut().map(|d| d.back.chunks_mut(chunk));
        let mut color_chunks: Vec<_> = self
            .colors
            .iter_mut()
            .map(|c| c.back.chunks_mut(chunk))
            .collect();

        (0..height.div_ceil(band_rows))
            .map(|band| {
                let row_start = band * band_rows;
                TargetRegion {
                    width,
                    height,
                    row_start,
                    row_end: (row_start + band_rows).min(height),
                    depth: depth_chunks.as_mut().and_then(|it| it.next()),
                    colors: color_chunks.iter_mut().map(|it| it.next()).collect(),
                }
            })
            .collect()
    }
}

/// An exclusive window onto a band of stored rows of every attachment.
///
/// Addressed with the same pipeline coordinates as [`FrameAdapter`]; pixels
/// outside the band behave like pixels outside the frame.
pub struct TargetRegion<'r> {
    width: usize,
    height: usize,
    row_start: usize,
    row_end: usize,
    depth: Option<&'r mut [f32]>,
    colors: Vec<Option<&'r mut [Color]>>,
}

impl<'r> TargetRegion<'r> {
    /// Pipeline y range `[min, max)` covered by this band
    pub fn y_range(&self) -> (i32, i32) {
        ((self.height - self.row_end) as i32, (self.height - self.row_start) as i32)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.local_index(x, y).is_some()
    }

    fn local_index(&self, x: i32, y: i32) -> Option<usize> {
        let global = flip_index(x, y, self.width, self.height)?;
        let row = global / self.width;
        if row < self.row_start || row >= self.row_end {
            return None;
        }
        Some(global - self.row_start * self.width)
    }

    pub fn read_depth(&self, x: i32, y: i32) -> f32 {
        match (self.local_index(x, y), self.depth.as_deref()) {
            (Some(i), Some(d)) => d[i],
            _ => DEPTH_CLEAR,
        }
    }

    pub fn write_depth(&mut self, x: i32, y: i32, value: f32) {
        if let (Some(i), Some(d)) = (self.local_index(x, y), self.depth.as_deref_mut()) {
            d[i] = value;
        }
    }

    pub fn write_color(&mut self, index: usize, x: i32, y: i32, color: Color) {
        let Some(i) = self.local_index(x, y) else {
            return;
        };
        if let Some(Some(c)) = self.colors.get_mut(index) {
            c[i] = color;
        }
    }
}
