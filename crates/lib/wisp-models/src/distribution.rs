use std::f64::consts::TAU;

use log::debug;
use rand_pcg::Pcg64Mcg;

use wisp_core::error::{SimError, SimResult};
use wisp_core::models::DistributionModel;
use wisp_core::position::{Dimensions, Position};
use wisp_core::registry::{ModelSettings, ParamSpec};

use crate::dist::seeded_rng;
use crate::mobility::uniform_in;
use crate::params::check_params;

fn not_initialized(model: &str) -> SimError {
    SimError::config(
        format!("{}.initialize", model),
        "positions requested before the distribution was initialized",
    )
}

/// Positions computed up front for a known number of nodes, handed out in order.
#[derive(Debug, Default)]
struct Prepared {
    positions: Option<Vec<Position>>,
    next: usize,
}

impl Prepared {
    fn new(positions: Vec<Position>) -> Self {
        Self {
            positions: Some(positions),
            next: 0,
        }
    }

    fn next_position(&mut self, model: &str) -> SimResult<Position> {
        let positions = self.positions.as_ref().ok_or_else(|| not_initialized(model))?;
        let position = positions.get(self.next).ok_or_else(|| {
            SimError::config(
                format!("{}.initialize", model),
                format!("only {} positions were prepared", positions.len()),
            )
        })?;
        self.next += 1;
        position.copy()
    }
}

/// Places nodes uniformly at random inside the area.
#[derive(Debug, Clone)]
pub struct Random {
    rng: Pcg64Mcg,
    dims: Option<Dimensions>,
}

impl Random {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: seeded_rng(seed, 0),
            dims: None,
        }
    }

    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, &[], &[])?;
        Ok(Self::new(settings.seed()))
    }
}

impl DistributionModel for Random {
    fn initialize(&mut self, _node_count: usize, dims: &Dimensions) -> SimResult<()> {
        self.dims = Some(*dims);
        Ok(())
    }

    fn next_position(&mut self) -> SimResult<Position> {
        let dims = self.dims.ok_or_else(|| not_initialized("random"))?;
        Ok(Position::at(
            uniform_in(dims.dim_x, &mut self.rng),
            uniform_in(dims.dim_y, &mut self.rng),
            uniform_in(dims.dim_z, &mut self.rng),
        ))
    }
}

/// Places nodes at the cell centres of the smallest square grid holding all of them, row by row.
#[derive(Debug, Default)]
pub struct Grid2D {
    prepared: Prepared,
}

impl Grid2D {
    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, &[], &[])?;
        Ok(Self::default())
    }
}

impl DistributionModel for Grid2D {
    fn initialize(&mut self, node_count: usize, dims: &Dimensions) -> SimResult<()> {
        let side = (node_count as f64).sqrt().ceil().max(1.0) as usize;
        let cell_x = dims.width() / side as f64;
        let cell_y = dims.height() / side as f64;
        let z = dims.center().z;
        let positions = (0..node_count)
            .map(|index| {
                let (row, column) = (index / side, index % side);
                Position::at(
                    dims.dim_x[0] + cell_x * (column as f64 + 0.5),
                    dims.dim_y[0] + cell_y * (row as f64 + 0.5),
                    z,
                )
            })
            .collect();
        self.prepared = Prepared::new(positions);
        debug!("Grid of {}x{} cells for {} nodes", side, side, node_count);
        Ok(())
    }

    fn next_position(&mut self) -> SimResult<Position> {
        self.prepared.next_position("grid2d")
    }
}

/// Places nodes evenly on a circle around the centre of the area. A radius of zero takes half
/// of the shorter side.
#[derive(Debug)]
pub struct Circle {
    pub radius: f64,
    prepared: Prepared,
}

impl Circle {
    pub const PARAMS: &'static [ParamSpec] = &[ParamSpec::optional("radius", 0.0, f64::MAX, 0.0)];

    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            prepared: Prepared::default(),
        }
    }

    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, Self::PARAMS, &[])?;
        Ok(Self::new(settings.value(&Self::PARAMS[0])?))
    }
}

impl DistributionModel for Circle {
    fn initialize(&mut self, node_count: usize, dims: &Dimensions) -> SimResult<()> {
        let radius = if self.radius > 0.0 {
            self.radius
        } else {
            dims.width().min(dims.height()) / 2.0
        };
        let center = dims.center();
        let step = TAU / node_count.max(1) as f64;
        let positions = (0..node_count)
            .map(|index| {
                let angle = step * index as f64;
                Position::at(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                    center.z,
                )
            })
            .collect();
        self.prepared = Prepared::new(positions);
        Ok(())
    }

    fn next_position(&mut self) -> SimResult<Position> {
        self.prepared.next_position("circle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> Dimensions {
        Dimensions::builder()
            .dim_x([0.0, 100.0])
            .dim_y([0.0, 100.0])
            .build()
    }

    #[test]
    fn grid_fills_rows_of_cell_centres() {
        let mut grid = Grid2D::default();
        grid.initialize(4, &dims()).unwrap();
        let first = grid.next_position().unwrap().point().unwrap();
        let second = grid.next_position().unwrap().point().unwrap();
        let third = grid.next_position().unwrap().point().unwrap();
        assert_eq!((first.x, first.y), (25.0, 25.0));
        assert_eq!((second.x, second.y), (75.0, 25.0));
        assert_eq!((third.x, third.y), (25.0, 75.0));
        grid.next_position().unwrap();
        assert!(grid.next_position().is_err());
    }

    #[test]
    fn circle_keeps_its_radius() {
        let mut circle = Circle::new(0.0);
        circle.initialize(8, &dims()).unwrap();
        let center = dims().center();
        for _ in 0..8 {
            let point = circle.next_position().unwrap().point().unwrap();
            assert!((point.distance(&center) - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn random_needs_the_area_first() {
        let mut random = Random::new(3);
        assert!(random.next_position().is_err());
        random.initialize(10, &dims()).unwrap();
        for _ in 0..10 {
            let point = random.next_position().unwrap().point().unwrap();
            assert!(dims().contains(&point));
        }
    }
}
