//! OLT governance node: genesis loading and block replay.

pub mod genesis;
pub mod replay;

pub use genesis::{GenesisAccount, GenesisConfig, GenesisValidator};
pub use replay::{load_blocks, parse_blocks, Block, Node, ReplayReport};
