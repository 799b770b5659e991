// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums, and traits that define what an
// unlearning experiment IS: a labelled corpus with split masks,
// the named data splits, the evaluation result accumulator,
// the error taxonomy, and the seams other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Labelled documents plus train/val/test masks
pub mod corpus;

// Metric keys, evaluation result, checkpoint state machine
pub mod result;

// Typed failures surfaced by the harness
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
