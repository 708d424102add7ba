//! Flutter bridge surface for the genogram engine.

pub mod api;
