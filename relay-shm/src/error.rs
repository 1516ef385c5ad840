//! Region failure taxonomy
//!
//! Both failures are fatal by design: a missing input region means the
//! producer is not running and waiting would starve silently, and a
//! failed output allocation leaves nothing to publish into.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("failed to attach to region '{0}': no such region (is the producer running?)")]
    Attach(String),
    #[error("failed to create region '{0}': name already in use")]
    Alloc(String),
}
