pub mod channels;
pub mod codec;
pub mod packet;
pub mod rate_limiter;
pub mod registry;
pub mod server;

pub use codec::{FrameError, FrameReader, FrameWriter, MAX_PAYLOAD_LEN};
pub use packet::{PacketReader, PacketWriter};
pub use registry::{OpcodeSet, Registry};
