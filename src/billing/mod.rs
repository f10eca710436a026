// billing module: balance netting, defaulter classification and grouping.
// Pure computations; callers load the ledger and pass "now" explicitly.

pub mod aggregate;
pub mod balance;
pub mod classifier;
pub mod filter;
pub mod policy;

pub use aggregate::*;
pub use balance::*;
pub use classifier::*;
pub use filter::*;
pub use policy::*;
