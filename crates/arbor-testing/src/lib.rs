//! Testing utilities and harness for Arbor

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
