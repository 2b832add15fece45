//! Runtime support for code generated by `amqp-gen`.
//!
//! Generated method codecs read their payloads through a [WireReader], write
//! outbound frames through a [WireWriter], and talk to the transport through
//! the [Connector] trait. Everything on the wire is big-endian, as in AMQP 0-9-1.
//!
//! ```
//! use amqp_gen_wire::*;
//!
//! let mut tx = WireWriter::new();
//! tx.write_frame_header(FrameType::Method, 1);
//! tx.write_method_header(50, 10);
//! tx.write_short_string("jobs").unwrap();
//! tx.update_frame_length();
//!
//! let frame = Frame::parse(tx.extent()).unwrap();
//! let (class_method, mut rx) = frame.method_header().unwrap();
//! assert_eq!(class_method, ClassMethod { class: 50, method: 10 });
//! assert_eq!(rx.read_short_string(), Ok("jobs"));
//! assert_eq!(rx.expect_eof(), Ok(()));
//! ```

pub mod buffer;
pub mod connector;
pub mod error;
pub mod frame;
pub mod table;

pub use buffer::*;
pub use connector::*;
pub use error::*;
pub use frame::*;
pub use table::*;

/// Re-exported so generated code can log without its own `tracing` dependency.
pub use tracing;

/// Terminates every frame.
pub const FRAME_END: u8 = 0xCE;

/// Frame type (1) + channel (2) + payload size (4).
pub const FRAME_HEADER_SIZE: usize = 7;

/// Class id (2) + method id (2).
pub const METHOD_HEADER_SIZE: usize = 4;
