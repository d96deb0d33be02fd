// Copyright 2024 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Prime number utilities: a small sieve for the scalar schedule and
//! a Miller-Rabin test used to gate inputs (a probable prime is not
//! worth throwing curves at).

use rand::Rng;

use crate::arith::ZmodN;
use crate::Uint;

/// The first n prime numbers, ascending.
pub fn primes(n: u32) -> Vec<u32> {
    if n == 0 {
        return vec![];
    }
    // The n-th prime is below n(ln n + ln ln n) for n >= 6,
    // and n * bit_length(n) overshoots that comfortably.
    let bound = std::cmp::max(64, n as usize * (32 - n.leading_zeros()) as usize);
    let mut composite = vec![false; bound];
    let mut ps = Vec::with_capacity(n as usize);
    for p in 2..bound {
        if composite[p] {
            continue;
        }
        ps.push(p as u32);
        if ps.len() == n as usize {
            break;
        }
        if p * p >= bound {
            continue;
        }
        let mut k = p * p;
        while k < bound {
            composite[k] = true;
            k += p;
        }
    }
    ps
}

/// Miller-Rabin primality test with uniformly random bases.
///
/// A composite survives one round with probability at most 1/4, so
/// 20 rounds make a wrong "probably prime" answer unrealistic. The
/// answer "composite" is always exact.
pub fn is_probably_prime(n: &Uint, rounds: usize) -> bool {
    let two = Uint::from(2_u64);
    if *n < two {
        return false;
    }
    if *n < Uint::from(4_u64) {
        // 2 and 3
        return true;
    }
    if !n.bit(0) {
        return false;
    }
    let zn = ZmodN::new(*n);
    // Write n-1 = d * 2^r with d odd.
    let nm1 = *n - Uint::ONE;
    let r = nm1.trailing_zeros();
    let d = nm1 >> r;
    let mut rng = rand::thread_rng();
    'rounds: for _ in 0..rounds {
        // A base in [2, n-2]; 64 bits of entropy are plenty for the
        // input sizes at hand.
        let a = two + Uint::from(rng.gen::<u64>()) % (*n - Uint::from(3_u64));
        let mut x = zn.pow(a, d);
        if x == Uint::ONE || x == nm1 {
            continue;
        }
        for _ in 1..r {
            x = zn.mul(x, x);
            if x == nm1 {
                continue 'rounds;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_primes() {
        assert_eq!(primes(0), vec![]);
        assert_eq!(primes(1), vec![2]);
        assert_eq!(primes(10), vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        let ps = primes(1000);
        assert_eq!(ps.len(), 1000);
        assert_eq!(ps[999], 7919);
    }

    #[test]
    fn test_is_probably_prime() {
        for p in [2_u64, 3, 5, 59, 101, 997, 1000003, 1000033] {
            assert!(is_probably_prime(&Uint::from(p), 30), "{p} is prime");
        }
        // 561 and 41041 are Carmichael numbers.
        for c in [1_u64, 4, 15, 561, 5959, 41041, 1000036000099] {
            assert!(!is_probably_prime(&Uint::from(c), 30), "{c} is not prime");
        }
        let p = Uint::from_str("1174273970803390465747303").unwrap();
        let q = Uint::from_str("607700066377545220515437").unwrap();
        assert!(is_probably_prime(&p, 30));
        assert!(is_probably_prime(&q, 30));
        assert!(!is_probably_prime(&(p * q), 30));
    }
}
