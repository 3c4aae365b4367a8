//! cargo run --example ring_halo -- [ranks] [points] [halo]
//!
//! Runs a threaded ring of ranks in one process: each rank fills its owned
//! cells with its rank id, exchanges halos and prints its buffer, then does
//! the same with cell-centre coordinates on the unit interval.

use mesh_halo::prelude::*;
use std::process;

fn arg(n: usize, default: i64) -> i64 {
    std::env::args()
        .nth(n)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn main() {
    let ranks = arg(1, 4);
    let points = arg(2, 12);
    let halo = arg(3, 2);

    let (Ok(ranks), Ok(domain), Ok(halo_width)) = (
        usize::try_from(ranks),
        GlobalDomain::try_from(points),
        usize::try_from(halo),
    ) else {
        eprintln!("ranks, points and halo must be non-negative");
        process::exit(2);
    };
    let cfg = DecompositionConfig {
        global_length: domain.length,
        halo_width,
        ..Default::default()
    };
    if let Err(e) = cfg.validate(ranks) {
        eprintln!("{e}");
        process::exit(2);
    }

    let dx = 1.0 / cfg.global_length as f64;
    let reports = ThreadComm::run(ranks, |comm| -> Result<String, HaloError> {
        let decomp = Decomposition::new(&comm, &cfg)?;
        let p = decomp.partition();
        let mut ids = decomp.allocate_field::<f64>()?;
        ids.fill_owned_with(|_| p.rank() as f64);
        decomp.exchange(&mut ids)?;

        let mut xc = decomp.allocate_field::<f64>()?;
        xc.fill_owned_with(|g| (g as f64 + 0.5) * dx);
        decomp.exchange(&mut xc)?;

        Ok(format!(
            "rank {:4} owns {:?}\n  ids = {:?}\n  xc  = {:.4?}",
            p.rank(),
            p.global_range(),
            ids.as_slice(),
            xc.as_slice()
        ))
    });

    let mut failed = false;
    for report in reports {
        match report {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("{e}");
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1);
    }
}
