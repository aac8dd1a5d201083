//! Core logic: decode, infer, classify, store.

pub mod classifier;
pub mod dataset;
pub mod decoder;
pub mod model;
pub mod storage;
