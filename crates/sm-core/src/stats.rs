//! Group-wise means and pairwise correlation
//!
//! Both operations skip missing (`NaN`) values rather than failing on them;
//! they fail only when what remains cannot produce a defined statistic.

mod corr;
mod group;


pub use corr::{CorrelationMatrix, correlation_matrix, pearson};
pub use group::{GroupKey, group_mean};
