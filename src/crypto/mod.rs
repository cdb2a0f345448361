pub mod ecc256;
pub mod keys;
pub mod suite;

#[cfg(test)]
pub(crate) mod mock;
