pub mod account;
pub mod features;
pub mod score;
pub mod error;

pub use account::*;
pub use features::*;
pub use score::*;
pub use error::*;
