use serde::{Deserialize, Serialize};

/// Pixel-space point. Layer and container points share this type.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rounds half toward positive infinity, like the browser's `Math.round`.
    pub fn round(self) -> Self {
        Self::new((self.x + 0.5).floor(), (self.y + 0.5).floor())
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Neg for Point {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// Viewport or surface size in whole pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size::new(0, 0);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_point(self) -> Point {
        Point::new(self.width as f64, self.height as f64)
    }

    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Size};

    #[test]
    fn point_add_sub_neg() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(-0.5, 4.0);
        assert_eq!(a + b, Point::new(0.5, 6.0));
        assert_eq!(a - b, Point::new(1.5, -2.0));
        assert_eq!(-a, Point::new(-1.0, -2.0));
    }

    #[test]
    fn point_round_half_up() {
        assert_eq!(Point::new(1.5, -2.4).round(), Point::new(2.0, -2.0));
        assert_eq!(Point::new(-2.5, 0.49).round(), Point::new(-2.0, 0.0));
    }

    #[test]
    fn size_area_and_point() {
        let s = Size::new(4, 3);
        assert_eq!(s.area(), 12);
        assert_eq!(s.as_point(), Point::new(4.0, 3.0));
        assert_eq!(Size::ZERO.area(), 0);
    }
}
