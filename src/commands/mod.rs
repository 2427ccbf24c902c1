pub mod market;
pub mod simulate;
