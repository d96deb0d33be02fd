use std::str::FromStr;
use std::time::Duration;

use brunch::Bench;
use yamalenstra::curve::Curve;
use yamalenstra::ecm::{Lenstra, Mode, SmoothBase};
use yamalenstra::{Uint, Verbosity};

fn main() {
    // 1000003 * 1000033
    let n = Uint::from_str("1000036000099").unwrap();
    // 1174273970803390465747303 * 607700066377545220515437
    let n159 = Uint::from_str("713606370002643984310910655247453147035052616411").unwrap();

    brunch::benches! {
        inline:
        {
            let c = Curve::new(Uint::from(2_u64), Uint::from(13_u64), n).unwrap();
            let g = c.checked_point(Uint::from(2_u64), Uint::from(5_u64)).unwrap();
            Bench::new("point double (40 bit n)")
                .with_timeout(Duration::from_secs(3))
                .run_seeded(g, |g| c.double(&g))
        },
        {
            let c = Curve::new(Uint::from(2_u64), Uint::from(13_u64), n).unwrap();
            let g = c.checked_point(Uint::from(2_u64), Uint::from(5_u64)).unwrap();
            let g2 = c.double(&g).0;
            Bench::new("point add (40 bit n)")
                .with_timeout(Duration::from_secs(3))
                .run_seeded((g, g2), |(g, g2)| c.add(&g, &g2))
        },
        {
            let c = Curve::new(Uint::from(2_u64), Uint::from(13_u64), n).unwrap();
            let g = c.checked_point(Uint::from(2_u64), Uint::from(5_u64)).unwrap();
            Bench::new("staged search 120 primes (40 bit n)")
                .with_timeout(Duration::from_secs(5))
                .run_seeded((), |_| {
                    let sb = SmoothBase::new(120, Mode::Primes);
                    let mut search =
                        Lenstra::new(c.clone(), g, sb, Verbosity::Silent).unwrap();
                    search.run()
                })
        },
        {
            // (3, 10) satisfies y² = x³ + 8x + 49 over Z, hence mod anything.
            let c = Curve::new(Uint::from(8_u64), Uint::from(49_u64), n159).unwrap();
            let g = c.checked_point(Uint::from(3_u64), Uint::from(10_u64)).unwrap();
            Bench::new("300 sequential scalars (159 bit n)")
                .with_timeout(Duration::from_secs(10))
                .run_seeded((), |_| {
                    let sb = SmoothBase::new(300, Mode::Sequential);
                    let mut search =
                        Lenstra::new(c.clone(), g, sb, Verbosity::Silent).unwrap();
                    search.run()
                })
        },
    }
}
