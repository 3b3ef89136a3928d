//! Data structures describing stream elements.
//!
//! Contains the MPEG audio and ADTS frame headers, the decoded frame format
//! reported to consumers and the candidate frame window used during
//! synchronization.

pub mod adts;
pub mod frame_info;
pub mod mpeg;
pub mod window;
