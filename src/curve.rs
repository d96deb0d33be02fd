// Copyright 2024 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Affine short Weierstrass curves y² = x³ + ax + b over Z/nZ.
//!
//! The modulus n is composite by intent, so the set of points is not
//! actually a group: the chord-tangent construction can fail when its
//! slope denominator shares a factor with n. That failure is the whole
//! point, and the denominator is reported back to the caller so that
//! gcd(denominator, n) can be inspected for a nontrivial factor.
//!
//! The group identity is an explicit tagged variant, never a sentinel
//! coordinate value, and points are immutable: every operation builds
//! a new point.

use crate::arith::ZmodN;
use crate::Uint;

/// Why a curve or a seed point was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CurveError {
    /// 4a³ + 27b² ≡ 0 mod n (or n < 2): the curve is singular.
    InvalidCurve,
    /// The point does not satisfy the curve equation.
    PointNotOnCurve,
}

/// A curve y² = x³ + ax + b with coefficients reduced modulo n.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Curve {
    zn: ZmodN,
    a: Uint,
    b: Uint,
}

/// A point on a curve, with canonically reduced coordinates.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Point {
    Affine { x: Uint, y: Uint },
    Infinity,
}

impl Point {
    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }

    /// Affine coordinates, or None for the identity.
    pub fn xy(&self) -> Option<(Uint, Uint)> {
        match self {
            Point::Affine { x, y } => Some((*x, *y)),
            Point::Infinity => None,
        }
    }
}

/// The slope of the chord or tangent used by a group operation.
///
/// An infinite slope means the denominator could not be inverted
/// modulo n. The denominator is carried along: gcd(denominator, n) is
/// a candidate factor of n whenever it is nontrivial. Additions
/// involving the identity carry a zero denominator (gcd n, never a
/// factor signal).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Slope {
    Finite(Uint),
    Infinite(Uint),
}

impl Curve {
    /// Builds a curve, rejecting n < 2 and singular parameters.
    pub fn new(a: Uint, b: Uint, n: Uint) -> Result<Curve, CurveError> {
        if n < Uint::from(2_u64) {
            return Err(CurveError::InvalidCurve);
        }
        let zn = ZmodN::new(n);
        let a = zn.from_int(a);
        let b = zn.from_int(b);
        // Discriminant condition: 4a³ + 27b² must not vanish mod n.
        let a3 = zn.mul(zn.mul(a, a), a);
        let b2 = zn.mul(b, b);
        let disc = zn.add(
            zn.mul(zn.from_int(Uint::from(4_u64)), a3),
            zn.mul(zn.from_int(Uint::from(27_u64)), b2),
        );
        if disc.is_zero() {
            return Err(CurveError::InvalidCurve);
        }
        Ok(Curve { zn, a, b })
    }

    pub fn n(&self) -> &Uint {
        &self.zn.n
    }

    pub fn a(&self) -> &Uint {
        &self.a
    }

    pub fn b(&self) -> &Uint {
        &self.b
    }

    /// A point with coordinates reduced mod n. Membership is not
    /// verified here: call [Curve::is_on_curve] (or use
    /// [Curve::checked_point]) when a guarantee is needed.
    pub fn point(&self, x: Uint, y: Uint) -> Point {
        Point::Affine {
            x: self.zn.from_int(x),
            y: self.zn.from_int(y),
        }
    }

    /// A point verified against the curve equation.
    pub fn checked_point(&self, x: Uint, y: Uint) -> Result<Point, CurveError> {
        let p = self.point(x, y);
        if self.is_on_curve(&p) {
            Ok(p)
        } else {
            Err(CurveError::PointNotOnCurve)
        }
    }

    /// Whether p satisfies y² ≡ x³ + ax + b mod n.
    /// The identity belongs to every curve.
    pub fn is_on_curve(&self, p: &Point) -> bool {
        let Point::Affine { x, y } = *p else {
            return true;
        };
        let zn = &self.zn;
        let y2 = zn.mul(y, y);
        let x3 = zn.mul(zn.mul(x, x), x);
        y2 == zn.add(zn.add(x3, zn.mul(self.a, x)), self.b)
    }

    /// Chord-tangent addition.
    ///
    /// Adding the identity is a no-op; adding a point to itself takes
    /// the tangent. When the slope denominator is not invertible mod n
    /// the result is the identity together with [Slope::Infinite]:
    /// a signal for the caller, not an error.
    pub fn add(&self, p: &Point, q: &Point) -> (Point, Slope) {
        let zn = &self.zn;
        let (Point::Affine { x: x1, y: y1 }, Point::Affine { x: x2, y: y2 }) = (*p, *q) else {
            // P + 0 = P and 0 + Q = Q.
            let r = if p.is_infinity() { *q } else { *p };
            return (r, Slope::Infinite(Uint::ZERO));
        };
        let (num, den) = if p == q {
            // Tangent: (3x² + a) / 2y.
            let xx = zn.mul(x1, x1);
            (
                zn.add(zn.add(zn.add(xx, xx), xx), self.a),
                zn.add(y1, y1),
            )
        } else {
            // Chord: (y₂ - y₁) / (x₂ - x₁).
            (zn.sub(y2, y1), zn.sub(x2, x1))
        };
        let s = match zn.inv(den) {
            Ok(dinv) => zn.mul(num, dinv),
            Err(_) => return (Point::Infinity, Slope::Infinite(den)),
        };
        let x = zn.sub(zn.sub(zn.mul(s, s), x1), x2);
        let y = zn.sub(zn.mul(s, zn.sub(x1, x)), y1);
        (Point::Affine { x, y }, Slope::Finite(s))
    }

    /// Doubling is self-addition.
    pub fn double(&self, p: &Point) -> (Point, Slope) {
        self.add(p, p)
    }
}

#[test]
fn test_singular_curve() {
    // a = b = 0 makes the discriminant vanish for every modulus.
    for n in [5_u64, 15, 5959] {
        let n = Uint::from(n);
        assert_eq!(
            Curve::new(Uint::ZERO, Uint::ZERO, n).err(),
            Some(CurveError::InvalidCurve)
        );
    }
    // 4a³ + 27b² = 4·27 + 27·4 = 216 = 8·27
    assert_eq!(
        Curve::new(Uint::from(3_u64), Uint::from(2_u64), Uint::from(27_u64)).err(),
        Some(CurveError::InvalidCurve)
    );
    assert_eq!(
        Curve::new(Uint::ONE, Uint::ONE, Uint::ONE).err(),
        Some(CurveError::InvalidCurve)
    );
}

#[test]
fn test_point_membership() {
    let c = Curve::new(Uint::from(4_u64), Uint::from(5947_u64), Uint::from(5959_u64)).unwrap();
    let g = c.checked_point(Uint::from(2_u64), Uint::from(2_u64)).unwrap();
    assert!(c.is_on_curve(&g));
    assert!(c.is_on_curve(&Point::Infinity));
    assert_eq!(
        c.checked_point(Uint::from(2_u64), Uint::from(3_u64)).err(),
        Some(CurveError::PointNotOnCurve)
    );
    // Coordinates are reduced before the membership check.
    let n = Uint::from(5959_u64);
    let g2 = c
        .checked_point(Uint::from(2_u64) + n, Uint::from(2_u64) + n)
        .unwrap();
    assert_eq!(g, g2);
}

#[test]
fn test_group_law() {
    let c = Curve::new(Uint::from(4_u64), Uint::from(5947_u64), Uint::from(5959_u64)).unwrap();
    let g = c.checked_point(Uint::from(2_u64), Uint::from(2_u64)).unwrap();

    // Identity is absorbed without touching the other operand.
    assert_eq!(c.add(&g, &Point::Infinity).0, g);
    assert_eq!(c.add(&Point::Infinity, &g).0, g);
    assert_eq!(c.add(&Point::Infinity, &Point::Infinity).0, Point::Infinity);

    // Doubling is self-addition and results stay on the curve.
    let (g2, s2) = c.double(&g);
    assert_eq!((g2, s2), c.add(&g, &g));
    assert!(c.is_on_curve(&g2));

    // Chord addition commutes.
    let (g3, s3) = c.add(&g, &g2);
    assert_eq!((g3, s3), c.add(&g2, &g));
    assert!(c.is_on_curve(&g3));
    assert!(matches!(s3, Slope::Finite(_)));
}

#[test]
fn test_opposite_points() {
    // P + (-P) degenerates with a zero denominator: the gcd is the
    // whole modulus, not a factor.
    let n = Uint::from(5959_u64);
    let c = Curve::new(Uint::from(4_u64), Uint::from(5947_u64), n).unwrap();
    let g = c.checked_point(Uint::from(2_u64), Uint::from(2_u64)).unwrap();
    let (x, y) = g.xy().unwrap();
    let neg = c.point(x, n - y);
    assert!(c.is_on_curve(&neg));
    let (r, s) = c.add(&g, &neg);
    assert_eq!(r, Point::Infinity);
    assert_eq!(s, Slope::Infinite(Uint::ZERO));
}
