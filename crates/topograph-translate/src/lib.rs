//! topograph-translate: renders placement graphs as scheduler config.
//!
//! # Components
//!
//! - **`compress`**: hostname range folding (`node[1-4]`) and its inverse
//! - **`output`**: tree (`SwitchName=`) and block (`BlockName=`) emission

pub mod compress;
pub mod error;
pub mod output;

pub use compress::{compress, expand, split};
pub use error::{TranslateError, TranslateResult};
pub use output::{parse_block_sizes, to_string, write, write_with_metrics};
