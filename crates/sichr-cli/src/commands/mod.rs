//! CLI 서브커맨드 구현.

pub mod migrate;
pub mod probe;
