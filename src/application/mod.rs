// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one command: fine-tune, run an unlearning experiment, or
// report a stored result.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Corpus → tokenizer → encoded splits → loaders
pub mod pipeline;

// The resumable restore/unlearn/evaluate state machine
pub mod experiment;

// Train the pretrained checkpoint
pub mod finetune_use_case;

// One unlearning experiment end to end
pub mod unlearn_use_case;

// Print a stored evaluation result
pub mod report_use_case;
