use snapcanvas_core::Rgba;

/// Raw export output: straight RGBA samples, row-major, 4 bytes per pixel.
///
/// Owns its bytes; nothing aliases the render target it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Returns `None` when `data` does not hold exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * 4;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some(Rgba::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_length() {
        assert!(PixelBuffer::new(2, 2, vec![0; 15]).is_none());
        assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn test_pixel_is_row_major() {
        let mut data = vec![0; 2 * 2 * 4];
        data[8..12].copy_from_slice(&[9, 8, 7, 6]);
        let buf = PixelBuffer::new(2, 2, data).unwrap();
        assert_eq!(buf.pixel(0, 1), Some(Rgba::new(9, 8, 7, 6)));
        assert_eq!(buf.pixel(2, 0), None);
    }
}
