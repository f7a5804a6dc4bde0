use std::fmt;

use serde::Deserialize;
use typed_builder::TypedBuilder;

use crate::error::{SimError, SimResult};

/// Concrete coordinates. Only placed positions expose one of these.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn squared_distance(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Point3) -> f64 {
        self.squared_distance(other).sqrt()
    }

    /// Coordinate along the given axis (0 = x, 1 = y, anything else = z).
    pub fn axis(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Closed `[min, max]` ranges of the simulated area.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, TypedBuilder)]
#[serde(deny_unknown_fields)]
pub struct Dimensions {
    pub dim_x: [f64; 2],
    pub dim_y: [f64; 2],
    #[builder(default = [0.0, 0.0])]
    #[serde(default)]
    pub dim_z: [f64; 2],
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            dim_x: [0.0, 1000.0],
            dim_y: [0.0, 1000.0],
            dim_z: [0.0, 0.0],
        }
    }
}

impl Dimensions {
    pub fn width(&self) -> f64 {
        self.dim_x[1] - self.dim_x[0]
    }

    pub fn height(&self) -> f64 {
        self.dim_y[1] - self.dim_y[0]
    }

    pub fn depth(&self) -> f64 {
        self.dim_z[1] - self.dim_z[0]
    }

    pub fn center(&self) -> Point3 {
        Point3::new(
            self.dim_x[0] + self.width() / 2.0,
            self.dim_y[0] + self.height() / 2.0,
            self.dim_z[0] + self.depth() / 2.0,
        )
    }

    pub fn contains(&self, point: &Point3) -> bool {
        (self.dim_x[0]..=self.dim_x[1]).contains(&point.x)
            && (self.dim_y[0]..=self.dim_y[1]).contains(&point.y)
            && (self.dim_z[0]..=self.dim_z[1]).contains(&point.z)
    }

    pub fn is_three_dimensional(&self) -> bool {
        self.depth() > 0.0
    }
}

/// Location of a node. A node that has not been placed yet holds an inert position, on which
/// every coordinate-based operation fails.
#[derive(Debug, Default)]
pub enum Position {
    #[default]
    Inert,
    Placed(Point3),
}

impl From<Point3> for Position {
    fn from(point: Point3) -> Self {
        Position::Placed(point)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Inert => write!(f, "(inert)"),
            Position::Placed(point) => write!(f, "{}", point),
        }
    }
}

impl Position {
    pub fn inert() -> Self {
        Position::Inert
    }

    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Position::Placed(Point3::new(x, y, z))
    }

    pub fn is_inert(&self) -> bool {
        matches!(self, Position::Inert)
    }

    pub fn point(&self) -> SimResult<Point3> {
        self.placed("read")
    }

    pub fn copy(&self) -> SimResult<Position> {
        Ok(Position::Placed(self.placed("copy")?))
    }

    pub fn equals(&self, other: &Position) -> SimResult<bool> {
        Ok(self.placed("compare")? == other.placed("compare")?)
    }

    pub fn squared_distance(&self, other: &Position) -> SimResult<f64> {
        let this = self.placed("measure")?;
        Ok(this.squared_distance(&other.placed("measure")?))
    }

    pub fn euclidean_distance(&self, other: &Position) -> SimResult<f64> {
        Ok(self.squared_distance(other)?.sqrt())
    }

    /// Clamps the position into the given dimensions.
    pub fn crop(&self, dims: &Dimensions) -> SimResult<Position> {
        let point = self.placed("crop")?;
        Ok(Position::at(
            point.x.clamp(dims.dim_x[0], dims.dim_x[1]),
            point.y.clamp(dims.dim_y[0], dims.dim_y[1]),
            point.z.clamp(dims.dim_z[0], dims.dim_z[1]),
        ))
    }

    #[inline]
    fn placed(&self, op: &'static str) -> SimResult<Point3> {
        match self {
            Position::Inert => Err(SimError::InertPosition(op)),
            Position::Placed(point) => Ok(*point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_clamps_every_axis() {
        let dims = Dimensions::builder()
            .dim_x([0.0, 10.0])
            .dim_y([0.0, 10.0])
            .dim_z([0.0, 1.0])
            .build();
        let cropped = Position::at(-3.0, 12.0, 0.5).crop(&dims).unwrap();
        assert_eq!(cropped.point().unwrap(), Point3::new(0.0, 10.0, 0.5));
    }

    #[test]
    fn inert_refuses_arithmetic() {
        let inert = Position::inert();
        let placed = Position::at(1.0, 1.0, 0.0);
        assert_eq!(
            inert.euclidean_distance(&placed),
            Err(SimError::InertPosition("measure"))
        );
        assert!(placed.euclidean_distance(&inert).is_err());
        assert!(inert.copy().is_err());
        assert!(inert.equals(&placed).is_err());
        assert!(inert.crop(&Dimensions::default()).is_err());
    }
}
