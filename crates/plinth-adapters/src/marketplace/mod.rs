//! Marketplace adapters.

mod builtin;

pub use builtin::BuiltinMarketplace;
