// Copyright 2024 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

pub mod arith;
pub mod curve;
pub mod fbase;

// Implementation
pub mod ecm;

// We need to perform modular arithmetic modulo the input number.
pub type Int = bnum::types::I512;
pub type Uint = bnum::types::U512;

/// How noisy stderr diagnostics should be.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub enum Verbosity {
    Silent,
    #[default]
    Info,
    Verbose,
    Debug,
}

impl std::str::FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Verbosity, String> {
        match s {
            "silent" => Ok(Verbosity::Silent),
            "info" => Ok(Verbosity::Info),
            "verbose" => Ok(Verbosity::Verbose),
            "debug" => Ok(Verbosity::Debug),
            _ => Err(format!("invalid verbosity level {s}")),
        }
    }
}

/// User settings for a factoring run.
#[derive(Clone, Copy, Debug, Default)]
pub struct Preferences {
    pub verbosity: Verbosity,
    pub threads: Option<usize>,
}

impl Preferences {
    pub fn verbose(&self, v: Verbosity) -> bool {
        self.verbosity >= v
    }
}
