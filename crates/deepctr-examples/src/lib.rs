//! Example applications for DeepCTR-RS.
//!
//! - `demo_inputs` - builds the input pipeline for a feature configuration
//!   and pushes a random batch through it
//!
//! # Running Examples
//!
//! ```bash
//! # Built-in feature set
//! cargo run -p deepctr-examples --bin demo_inputs
//!
//! # Feature set from JSON
//! cargo run -p deepctr-examples --bin demo_inputs -- \
//!     --config crates/deepctr-examples/configs/features.json --seed 7
//! ```

// This crate is primarily for examples, no lib code needed.
