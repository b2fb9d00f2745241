//! 2D vectors in Cartesian or polar form
//!
//! Both forms describe the same quantity. Arithmetic between mixed forms
//! converts transparently and returns the form of the left operand.

use std::ops::{Add, Div, Mul, Neg, Sub};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// An immutable 2D vector
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Vector {
    Cartesian { x: f64, y: f64 },
    /// `length` may be negative, which points the vector along `angle + π`
    Polar { length: f64, angle: f64 },
}

impl Default for Vector {
    fn default() -> Self {
        Vector::ZERO
    }
}

impl Vector {
    pub const ZERO: Vector = Vector::Cartesian { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn cartesian(x: f64, y: f64) -> Self {
        Vector::Cartesian { x, y }
    }

    #[inline]
    pub const fn polar(length: f64, angle: f64) -> Self {
        Vector::Polar { length, angle }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        match *self {
            Vector::Cartesian { x, .. } => x,
            Vector::Polar { length, angle } => length * angle.cos(),
        }
    }

    #[inline]
    pub fn y(&self) -> f64 {
        match *self {
            Vector::Cartesian { y, .. } => y,
            Vector::Polar { length, angle } => length * angle.sin(),
        }
    }

    /// Magnitude, never negative
    #[inline]
    pub fn length(&self) -> f64 {
        match *self {
            Vector::Cartesian { x, y } => (x * x + y * y).sqrt(),
            Vector::Polar { length, .. } => length.abs(),
        }
    }

    /// Heading of the vector in (-π, π]
    pub fn angle(&self) -> f64 {
        self.y().atan2(self.x())
    }

    pub fn is_polar(&self) -> bool {
        matches!(self, Vector::Polar { .. })
    }

    pub fn is_finite(&self) -> bool {
        self.x().is_finite() && self.y().is_finite()
    }

    #[inline]
    pub fn to_dvec2(self) -> DVec2 {
        DVec2::new(self.x(), self.y())
    }

    pub fn to_cartesian(self) -> Self {
        Vector::Cartesian {
            x: self.x(),
            y: self.y(),
        }
    }

    /// Polar form with a non-negative length
    pub fn to_polar(self) -> Self {
        let (x, y) = (self.x(), self.y());
        Vector::Polar {
            length: (x * x + y * y).sqrt(),
            angle: y.atan2(x),
        }
    }

    /// Re-express `v` in the same form as `self`
    fn in_form_of(&self, v: DVec2) -> Self {
        match self {
            Vector::Cartesian { .. } => Vector::Cartesian { x: v.x, y: v.y },
            Vector::Polar { .. } => Vector::from(v).to_polar(),
        }
    }

    pub fn add(self, other: Vector) -> Self {
        self.in_form_of(self.to_dvec2() + other.to_dvec2())
    }

    pub fn subtract(self, other: Vector) -> Self {
        self.add(-other)
    }

    pub fn scale(self, s: f64) -> Self {
        match self {
            Vector::Cartesian { x, y } => Vector::Cartesian { x: x * s, y: y * s },
            Vector::Polar { length, angle } => Vector::Polar {
                length: length * s,
                angle,
            },
        }
    }

    pub fn divide(self, s: f64) -> Self {
        self.scale(1.0 / s)
    }

    /// Signed length of the component along `angle`
    #[inline]
    pub fn component_along(self, angle: f64) -> f64 {
        self.x() * angle.cos() + self.y() * angle.sin()
    }

    /// Component along `angle`, as a vector co-linear with that direction
    pub fn project_on_direction(self, angle: f64) -> Self {
        Vector::Polar {
            length: self.component_along(angle),
            angle,
        }
    }

    /// Equality of the described quantity, regardless of form
    pub fn approx_eq(&self, other: &Vector, eps: f64) -> bool {
        (self.to_dvec2() - other.to_dvec2()).length() <= eps
    }
}

impl From<DVec2> for Vector {
    fn from(v: DVec2) -> Self {
        Vector::Cartesian { x: v.x, y: v.y }
    }
}

impl From<Vector> for DVec2 {
    fn from(v: Vector) -> Self {
        v.to_dvec2()
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Vector {
        Vector::add(self, rhs)
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        self.subtract(rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        self.scale(-1.0)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, rhs: f64) -> Vector {
        self.scale(rhs)
    }
}

impl Div<f64> for Vector {
    type Output = Vector;
    fn div(self, rhs: f64) -> Vector {
        self.divide(rhs)
    }
}
