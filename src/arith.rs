// Copyright 2024 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Arithmetic modulo an arbitrary integer n.
//!
//! Unlike a prime field, Z/nZ has nonzero elements without an inverse
//! whenever n is composite. Inversion therefore returns the offending
//! gcd instead of failing opaquely: Lenstra's method is built entirely
//! around provoking and harvesting that gcd.
//!
//! All representatives are kept canonically reduced in [0, n).

use bnum::cast::CastFrom;
use num_integer::Integer;
use num_traits::One;

use crate::{Int, Uint};

/// The ring Z/nZ for a fixed modulus n.
///
/// The modulus must fit in half an Uint so that plain double-width
/// products never overflow.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ZmodN {
    pub n: Uint,
}

impl ZmodN {
    pub fn new(n: Uint) -> Self {
        assert!(n.bits() < Uint::BITS / 2);
        ZmodN { n }
    }

    pub fn from_int(&self, x: Uint) -> Uint {
        x % self.n
    }

    pub fn add(&self, x: Uint, y: Uint) -> Uint {
        let sum = x + y;
        if sum >= self.n {
            sum - self.n
        } else {
            sum
        }
    }

    pub fn sub(&self, x: Uint, y: Uint) -> Uint {
        if x >= y {
            x - y
        } else {
            self.n + x - y
        }
    }

    pub fn mul(&self, x: Uint, y: Uint) -> Uint {
        (x * y) % self.n
    }

    pub fn pow(&self, x: Uint, k: Uint) -> Uint {
        pow_mod(x, k, self.n)
    }

    /// See [inv_mod].
    pub fn inv(&self, x: Uint) -> Result<Uint, Uint> {
        inv_mod(&x, &self.n)
    }
}

/// Modular exponentiation by repeated squaring.
pub fn pow_mod(x: Uint, k: Uint, n: Uint) -> Uint {
    assert!(2 * n.bits() < Uint::BITS);
    let mut res = Uint::ONE % n;
    let mut sq = x % n;
    let mut k = k;
    while !k.is_zero() {
        if k.bit(0) {
            res = (res * sq) % n;
        }
        sq = (sq * sq) % n;
        k >>= 1;
    }
    res
}

/// Modular inverse of x modulo n.
///
/// Returns Err(gcd(x, n)) when x is not invertible (the gcd is n itself
/// for x = 0). Callers treat a nontrivial gcd as a factorization event.
pub fn inv_mod(x: &Uint, n: &Uint) -> Result<Uint, Uint> {
    let x = x % n;
    if x.is_zero() {
        return Err(*n);
    }
    // Extended Euclid, keeping only the coefficient of x.
    // Bezout coefficients stay below n in absolute value so they fit
    // in a signed Int of the same width.
    let (mut r0, mut r1) = (*n, x);
    let (mut s0, mut s1) = (Int::ZERO, Int::ONE);
    while !r1.is_zero() {
        let (q, r) = r0.div_rem(&r1);
        (r0, r1) = (r1, r);
        (s0, s1) = (s1, s0 - Int::cast_from(q) * s1);
    }
    if !r0.is_one() {
        return Err(r0);
    }
    if s0.is_negative() {
        Ok(*n - s0.abs().to_bits() % n)
    } else {
        Ok(s0.to_bits() % n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow_mod() {
        let p = Uint::from(997_u64);
        for i in 2..997_u64 {
            assert_eq!(pow_mod(Uint::from(i), p - Uint::ONE, p), Uint::ONE);
        }
    }

    #[test]
    fn test_inv_mod_prime() {
        let p = Uint::from(997_u64);
        let zn = ZmodN::new(p);
        for i in 1..997_u64 {
            let x = Uint::from(i);
            let xinv = zn.inv(x).unwrap();
            assert_eq!(zn.mul(x, xinv), Uint::ONE);
        }
    }

    #[test]
    fn test_inv_mod_composite() {
        // 15 = 3 * 5: units invert, zero divisors reveal a factor.
        let n = Uint::from(15_u64);
        let zn = ZmodN::new(n);
        assert_eq!(zn.inv(Uint::ZERO), Err(n));
        assert_eq!(zn.inv(Uint::from(3_u64)), Err(Uint::from(3_u64)));
        assert_eq!(zn.inv(Uint::from(10_u64)), Err(Uint::from(5_u64)));
        for i in [1_u64, 2, 4, 7, 8, 11, 13, 14] {
            let x = Uint::from(i);
            let xinv = zn.inv(x).unwrap();
            assert_eq!(zn.mul(x, xinv), Uint::ONE);
        }
    }

    #[test]
    fn test_ring_ops() {
        let n = Uint::from(5959_u64);
        let zn = ZmodN::new(n);
        let x = Uint::from(5000_u64);
        let y = Uint::from(2000_u64);
        assert_eq!(zn.add(x, y), Uint::from(1041_u64));
        assert_eq!(zn.sub(y, x), Uint::from(2959_u64));
        assert_eq!(zn.mul(x, y), Uint::from(10000000_u64) % n);
    }
}
