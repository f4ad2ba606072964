//! One module per supported site.

pub mod inkscan;
pub mod kagemaru;
pub mod paneltoon;

pub use inkscan::Inkscan;
pub use kagemaru::Kagemaru;
pub use paneltoon::Paneltoon;
