//! Named-region abstraction for inter-process frame exchange
//!
//! A region is a named byte block with an attached timestamp tag and
//! lock/wait/notify semantics. The contract lives in [`region::Region`];
//! [`region::SharedRegion`] plus [`hub::RegionHub`] form the
//! process-local reference implementation used by the pipeline and its
//! tests.

pub mod cancel;
pub mod error;
pub mod hub;
pub mod region;

pub use cancel::*;
pub use error::*;
pub use hub::*;
pub use region::*;
