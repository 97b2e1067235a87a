mod alphabet;
mod counter;
mod error;
#[cfg(feature = "futures")]
mod futures;
mod sleep;
mod time;
mod unique;

pub use crate::alphabet::*;
pub use crate::counter::*;
pub use crate::error::*;
#[cfg(feature = "futures")]
pub use crate::futures::*;
pub use crate::sleep::*;
pub use crate::time::*;
pub use crate::unique::*;
