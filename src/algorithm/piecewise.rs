use heapless::Vec;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Piecewise-linear interpolation over a small ordered set of control
/// points, clamped to the first/last point's y outside the covered range.
pub struct PiecewiseLinear<const N: usize> {
    points: Vec<Point, N>,
}

impl<const N: usize> PiecewiseLinear<N> {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Inserts a control point keeping x ascending. Silently ignored when
    /// the capacity is exhausted.
    pub fn add_point(&mut self, point: Point) {
        if self.points.push(point).is_err() {
            return;
        }
        let mut index = self.points.len() - 1;
        while index > 0 && self.points[index - 1].x > point.x {
            self.points.swap(index - 1, index);
            index -= 1;
        }
    }

    pub fn value(&self, x: f64) -> f64 {
        let mut last = match self.points.first() {
            Some(point) => *point,
            None => return 0.0,
        };
        if x <= last.x {
            return last.y;
        }
        for &point in self.points.iter().skip(1) {
            if x <= point.x {
                let ratio = (x - last.x) / (point.x - last.x);
                return last.y + ratio * (point.y - last.y);
            }
            last = point;
        }
        last.y
    }
}
