//! cargo mpirun -n 4 --features mpi-support --example mpi_ring_halo
//!
//! Same scenario as `ring_halo`, one MPI process per rank.

#[cfg(feature = "mpi-support")]
fn main() {
    use mesh_halo::prelude::*;
    use std::process;

    let comm = MpiComm::new().expect("MPI initialization failed");
    let cfg = DecompositionConfig {
        global_length: 3 * comm.size(),
        halo_width: 2,
        ..Default::default()
    };
    println!(
        "I am rank {:4} of {} executing on {}",
        comm.rank(),
        comm.size(),
        comm.processor_name()
    );

    let run = || -> Result<HaloField<f64>, HaloError> {
        let decomp = Decomposition::new(&comm, &cfg)?;
        let mut field = decomp.allocate_field::<f64>()?;
        field.fill_owned_with(|_| comm.rank() as f64);
        decomp.exchange(&mut field)?;
        Ok(field)
    };
    match run() {
        Ok(field) => println!("Rank {:4} values = {:?}", comm.rank(), field.as_slice()),
        Err(e) => {
            // peers may be blocked on us; tear the whole job down
            eprintln!("[rank {}] {e}", comm.rank());
            process::exit(1);
        }
    }
}

#[cfg(not(feature = "mpi-support"))]
fn main() {
    eprintln!("build with --features mpi-support");
}
