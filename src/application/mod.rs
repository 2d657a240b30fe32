// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal per
// command. No tensor math and no printing here; only workflow
// coordination.

/// The preprocessing pipeline and its configuration
pub mod prepare_use_case;

/// Read-back summary of a finished run
pub mod inspect_use_case;
