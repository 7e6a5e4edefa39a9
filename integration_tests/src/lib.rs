//! Cross-crate behaviour tests for the outbreak panel live under `tests/`.
