use serde::{Deserialize, Serialize};

/// Integer tile coordinate in world space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared euclidean distance in tiles
    pub fn distance_squared(self, other: TilePos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: TilePos) -> f32 {
        (self.distance_squared(other) as f32).sqrt()
    }
}

/// Whole tiles covered by `radius`, saturated to the `i32` coordinate range
pub fn tile_reach(radius: f32) -> i64 {
    if radius > 0.0 {
        radius.ceil().min(i32::MAX as f32) as i64
    } else {
        0
    }
}

/// Axis-aligned compute window in world tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub x1: i32,
    pub y1: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(x1: i32, y1: i32, width: u32, height: u32) -> Self {
        Self {
            x1,
            y1,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn x2(&self) -> i32 {
        self.x1 + self.width as i32
    }

    /// Exclusive bottom edge
    pub fn y2(&self) -> i32 {
        self.y1 + self.height as i32
    }

    pub fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        pos.x >= self.x1 && pos.x < self.x2() && pos.y >= self.y1 && pos.y < self.y2()
    }

    /// World position to viewport-local coordinates, if inside
    pub fn to_local(&self, pos: TilePos) -> Option<(u32, u32)> {
        if self.contains(pos) {
            Some(((pos.x - self.x1) as u32, (pos.y - self.y1) as u32))
        } else {
            None
        }
    }

    pub fn to_world(&self, local_x: u32, local_y: u32) -> TilePos {
        TilePos::new(self.x1 + local_x as i32, self.y1 + local_y as i32)
    }

    /// Grow the window by `margin` tiles on every side
    pub fn expanded(&self, margin: u32) -> Viewport {
        Viewport::new(
            self.x1.saturating_sub_unsigned(margin),
            self.y1.saturating_sub_unsigned(margin),
            self.width.saturating_add(margin.saturating_mul(2)),
            self.height.saturating_add(margin.saturating_mul(2)),
        )
    }

    /// Whether a circle of `radius` around `center` touches the window
    pub fn intersects_circle(&self, center: TilePos, radius: f32) -> bool {
        let r = tile_reach(radius);
        let (cx, cy) = (center.x as i64, center.y as i64);
        cx + r >= self.x1 as i64
            && cx - r < self.x2() as i64
            && cy + r >= self.y1 as i64
            && cy - r < self.y2() as i64
    }

    /// Inclusive corners of the square of `radius` around `center`, clipped
    /// to the window; `None` if they do not overlap
    pub fn clip_square(&self, center: TilePos, radius: f32) -> Option<(TilePos, TilePos)> {
        if self.is_empty() {
            return None;
        }
        let r = tile_reach(radius);
        let (cx, cy) = (center.x as i64, center.y as i64);
        let min_x = (cx - r).max(self.x1 as i64);
        let max_x = (cx + r).min(self.x2() as i64 - 1);
        let min_y = (cy - r).max(self.y1 as i64);
        let max_y = (cy + r).min(self.y2() as i64 - 1);
        if min_x > max_x || min_y > max_y {
            return None;
        }
        Some((
            TilePos::new(min_x as i32, min_y as i32),
            TilePos::new(max_x as i32, max_y as i32),
        ))
    }

    /// Iterate every world tile of the window in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        (self.y1..self.y2()).flat_map(move |y| (self.x1..self.x2()).map(move |x| TilePos::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_coordinates() {
        let viewport = Viewport::new(10, 20, 5, 4);
        assert_eq!(viewport.to_local(TilePos::new(10, 20)), Some((0, 0)));
        assert_eq!(viewport.to_local(TilePos::new(14, 23)), Some((4, 3)));
        assert_eq!(viewport.to_local(TilePos::new(15, 23)), None);
        assert_eq!(viewport.to_world(4, 3), TilePos::new(14, 23));
    }

    #[test]
    fn test_circle_intersection() {
        let viewport = Viewport::new(0, 0, 10, 10);
        assert!(viewport.intersects_circle(TilePos::new(-2, 5), 3.0));
        assert!(!viewport.intersects_circle(TilePos::new(-5, 5), 3.0));
        assert!(viewport.intersects_circle(TilePos::new(12, 12), 3.0));
    }

    #[test]
    fn test_huge_radius_does_not_overflow() {
        let viewport = Viewport::new(0, 0, 4, 4);
        let center = TilePos::new(i32::MAX - 1, 2);
        assert!(viewport.intersects_circle(center, 3.0e9));
        assert!(viewport.intersects_circle(TilePos::new(2, 2), f32::INFINITY));
        assert!(!viewport.intersects_circle(TilePos::new(9, 9), f32::NAN));
        assert_eq!(
            viewport.clip_square(TilePos::new(1, 1), 3.0e9),
            Some((TilePos::new(0, 0), TilePos::new(3, 3)))
        );
    }

    #[test]
    fn test_clip_square() {
        let viewport = Viewport::new(10, 10, 5, 5);
        assert_eq!(
            viewport.clip_square(TilePos::new(9, 12), 2.0),
            Some((TilePos::new(10, 10), TilePos::new(11, 14)))
        );
        assert_eq!(viewport.clip_square(TilePos::new(0, 0), 2.0), None);
        assert_eq!(Viewport::new(0, 0, 0, 3).clip_square(TilePos::new(0, 0), 5.0), None);
    }

    #[test]
    fn test_expanded_saturates() {
        let viewport = Viewport::new(i32::MIN + 1, 0, 2, 2).expanded(4);
        assert_eq!(viewport.x1, i32::MIN);
        assert_eq!(viewport.y1, -4);
        assert_eq!(viewport.width, 10);
        assert_eq!(Viewport::new(0, 0, 2, 2).expanded(u32::MAX).width, u32::MAX);
    }

    #[test]
    fn test_tiles_iteration_order() {
        let viewport = Viewport::new(1, 1, 2, 2);
        let tiles: Vec<_> = viewport.tiles().collect();
        assert_eq!(
            tiles,
            vec![
                TilePos::new(1, 1),
                TilePos::new(2, 1),
                TilePos::new(1, 2),
                TilePos::new(2, 2)
            ]
        );
    }
}
