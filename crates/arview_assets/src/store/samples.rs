//! Demo records backed by built-in primitives, so a fresh install has
//! something to show.

use super::record::NewModel;
use super::{AssetStore, StoreError};

const SAMPLE_SIZE: u64 = 50 * 1024;

pub fn sample_models() -> Vec<NewModel> {
    vec![
        NewModel::new("Simple Cube", "builtin:cube", SAMPLE_SIZE)
            .with_description("A basic cube for testing"),
        NewModel::new("Sphere", "builtin:sphere", SAMPLE_SIZE)
            .with_description("A smooth sphere"),
    ]
}

/// Inserts the samples when the store is empty.  Returns how many were added.
pub fn seed_samples(store: &dyn AssetStore) -> Result<usize, StoreError> {
    if !store.list()?.is_empty() {
        return Ok(0);
    }
    let samples = sample_models();
    let count = samples.len();
    for sample in samples {
        store.save(sample)?;
    }
    log::info!("seeded {count} sample models");
    Ok(count)
}
