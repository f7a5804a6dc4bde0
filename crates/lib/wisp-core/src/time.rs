use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use serde::Deserialize;

/// Simulation time. In synchronous mode this is the round counter (1, 2, 3, ...), in
/// asynchronous mode it is continuous.
#[derive(Deserialize, Clone, Copy, Debug, Default)]
pub struct SimTime(pub f64);

impl Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SimTime {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let time = s.parse::<f64>()?;
        Ok(Self(time))
    }
}

impl From<f64> for SimTime {
    fn from(f: f64) -> Self {
        Self(f)
    }
}

impl From<u64> for SimTime {
    fn from(f: u64) -> Self {
        Self(f as f64)
    }
}

impl From<i32> for SimTime {
    fn from(f: i32) -> Self {
        Self(f as f64)
    }
}

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// The round in which this time is reached. Round `r` covers `(r - 1, r]`.
    pub fn as_round(&self) -> u64 {
        self.0.max(0.0).ceil() as u64
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add for SimTime {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Add<f64> for SimTime {
    type Output = Self;

    fn add(self, rhs: f64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl Sub for SimTime {
    type Output = f64;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

impl AddAssign for SimTime {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::SimTime;

    #[test]
    fn ordering_is_total() {
        let mut times = vec![SimTime(3.0), SimTime(1.5), SimTime(2.0)];
        times.sort();
        assert_eq!(times, vec![SimTime(1.5), SimTime(2.0), SimTime(3.0)]);
        assert_eq!(SimTime(4.2).as_round(), 5);
        assert_eq!(SimTime(4.0).as_round(), 4);
    }
}
