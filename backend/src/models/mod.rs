//! Domain types: course identities, shift records and the clock.

pub mod course;
pub mod macros;
pub mod shift;
pub mod time;

pub use course::*;
pub use shift::*;
pub use time::*;
