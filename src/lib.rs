//! # BADGE BASIC
//!
//! An interactive, line-numbered BASIC for badge-class hardware.
//!
//! On the badge the interpreter runs resident next to the network
//! transport; this crate ships a desktop terminal front-end so programs
//! can be written and tested away from the hardware. Start it and you
//! should see:
//! ```text
//! BADGE BASIC 0.3
//! READY.
//! ```
//!
//! Programs mix ordinary BASIC with device statements:
//! ```text
//! 10 FOR I=0 TO 7
//! 20 LED I, 1
//! 30 SLEEP 100
//! 40 NEXT I
//! RUN
//! ```

pub mod lang;
pub mod mach;
