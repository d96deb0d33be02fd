// Copyright 2024 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Command line driver for Lenstra's elliptic curve method.
//!
//! Factors are printed on stdout, one per line; diagnostics go to
//! stderr. Inputs are gated before any curve is thrown at them: small
//! prime divisors are stripped by trial division and probable primes
//! are reported as-is, so the engine only ever sees odd composites.

use std::str::FromStr;

use num_traits::One;
use rand::{Rng, SeedableRng};

use yamalenstra::ecm::{self, Mode};
use yamalenstra::{fbase, Preferences, Uint, Verbosity};

fn main() {
    let arg = arguments::parse(std::env::args()).unwrap();
    if arg.orphans.len() != 1 {
        println!(
            "Usage: ymle [--mode primes|seq] [--bound B] [--curves N] [--threads N] [--v LEVEL] NUMBER"
        );
        return;
    }
    let mode = match arg.get::<String>("mode").unwrap_or("primes".into()).as_str() {
        "primes" => Mode::Primes,
        "seq" | "sequential" => Mode::Sequential,
        m => {
            eprintln!("Invalid mode {m:?}");
            return;
        }
    };
    let bound = arg.get::<usize>("bound");
    let curves = arg.get::<usize>("curves");
    let threads = arg.get::<usize>("threads");
    let verbosity = arg
        .get::<String>("v")
        .map(|s| Verbosity::from_str(&s).expect("invalid verbosity"))
        .unwrap_or(Verbosity::Info);
    let prefs = Preferences { verbosity, threads };

    let number = &arg.orphans[0];
    let n = Uint::from_str(number).expect("could not read decimal number");
    const MAXBITS: u32 = Uint::BITS / 2 - 1;
    if n.bits() > MAXBITS {
        panic!(
            "Number size ({} bits) exceeds {} bits limit",
            n.bits(),
            MAXBITS
        )
    }
    if prefs.verbose(Verbosity::Info) {
        eprintln!("Input number {n}");
    }

    // Strip small prime divisors; this also guarantees the modulus
    // handed to the curves is odd.
    let mut n = n;
    for p in fbase::primes(100) {
        let p = Uint::from(p as u64);
        while (n % p).is_zero() {
            n /= p;
            println!("{p}");
        }
    }
    if n.is_one() {
        return;
    }
    if fbase::is_probably_prime(&n, 20) {
        if prefs.verbose(Verbosity::Info) {
            eprintln!("{n} is probably prime");
        }
        println!("{n}");
        return;
    }

    let res = match threads {
        Some(t) if t > 1 => {
            // Independent curve trials parallelize trivially: each one
            // owns its engine, curve and working point.
            use rayon::prelude::*;
            if prefs.verbose(Verbosity::Info) {
                eprintln!("Using a pool of {t} threads");
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(t)
                .build()
                .expect("cannot create thread pool");
            let cs = curves.unwrap_or(64);
            let b = bound.unwrap_or(1000);
            let seed0: u64 = rand::thread_rng().gen();
            pool.install(|| {
                (0..cs as u64).into_par_iter().find_map_any(|i| {
                    let mut rng = rand::rngs::StdRng::seed_from_u64(seed0 ^ i);
                    ecm::lenstra_trials(&n, 1, b, mode, &prefs, &mut rng)
                })
            })
        }
        _ => {
            let mut rng = rand::thread_rng();
            match (curves, bound) {
                (None, None) => ecm::lenstra_auto(&n, &prefs, &mut rng),
                (cs, b) => ecm::lenstra_trials(
                    &n,
                    cs.unwrap_or(64),
                    b.unwrap_or(1000),
                    mode,
                    &prefs,
                    &mut rng,
                ),
            }
        }
    };
    match res {
        Some((p, q)) => {
            println!("{p}");
            println!("{q}");
        }
        None => {
            eprintln!("No factor found");
        }
    }
}
