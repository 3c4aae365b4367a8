#![allow(dead_code)]
use mesh_halo::algs::communicator::ThreadComm;
use mesh_halo::algs::decomposition::Decomposition;
use mesh_halo::config::DecompositionConfig;
use mesh_halo::data::halo_field::HaloField;
use mesh_halo::halo_error::HaloError;

pub fn cfg(global_length: usize, halo_width: usize) -> DecompositionConfig {
    DecompositionConfig {
        global_length,
        halo_width,
        ..Default::default()
    }
}

/// Decompose on `size` threaded ranks, fill each owned cell with `init(rank, global)`,
/// exchange once and return every rank's full buffer in rank order.
pub fn exchange_once<T, F>(
    size: usize,
    cfg: &DecompositionConfig,
    init: F,
) -> Vec<Result<Vec<T>, HaloError>>
where
    T: bytemuck::Pod + num_traits::Zero + Send,
    F: Fn(usize, usize) -> T + Sync,
{
    ThreadComm::run(size, |comm| -> Result<Vec<T>, HaloError> {
        let decomp = Decomposition::new(&comm, cfg)?;
        let rank = decomp.partition().rank();
        let mut field: HaloField<T> = decomp.allocate_field()?;
        field.fill_owned_with(|g| init(rank, g));
        decomp.exchange(&mut field)?;
        Ok(field.as_slice().to_vec())
    })
}
