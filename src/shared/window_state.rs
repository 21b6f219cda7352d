//! Window geometry shared by the window core, the platform layer and the
//! session.

/// Window geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Pixel count
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Self) -> Self {
        let left = self.x.min(other.x) as i64;
        let top = self.y.min(other.y) as i64;
        let right = (self.x as i64 + self.width as i64).max(other.x as i64 + other.width as i64);
        let bottom = (self.y as i64 + self.height as i64).max(other.y as i64 + other.height as i64);
        Self::new(
            left as i32,
            top as i32,
            (right - left).min(u32::MAX as i64) as u32,
            (bottom - top).min(u32::MAX as i64) as u32,
        )
    }

    /// Same size, origin at 0,0 (window-relative full region)
    pub fn local(&self) -> Self {
        Self::new(0, 0, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_does_not_overflow() {
        let geometry = Geometry::new(0, 0, u32::MAX, 2);
        assert_eq!(geometry.area(), u32::MAX as u64 * 2);
    }

    #[test]
    fn test_union_covers_both() {
        let a = Geometry::new(10, 10, 20, 20);
        let b = Geometry::new(-5, 25, 10, 30);
        assert_eq!(a.union(&b), Geometry::new(-5, 10, 35, 45));
        assert_eq!(a.union(&a), a);
    }

    #[test]
    fn test_local_drops_position() {
        let geometry = Geometry::new(10, 20, 300, 200);
        assert_eq!(geometry.local(), Geometry::new(0, 0, 300, 200));
    }
}
