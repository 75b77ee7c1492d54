//! CLI command implementations.
//!
//! | Module  | Commands handled |
//! |---------|------------------|
//! | `serve` | `Serve`          |
//! | `init`  | `Init`           |

pub mod init;
pub mod serve;

pub use init::cmd_init;
pub use serve::cmd_serve;
