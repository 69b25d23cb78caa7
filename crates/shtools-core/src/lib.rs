pub mod common;
pub mod domain;
pub mod expand;
pub mod numerics;
