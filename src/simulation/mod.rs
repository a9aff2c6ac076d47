//! Synthetic workloads for the engine.
