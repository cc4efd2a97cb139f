mod connection;
pub mod tls;

pub use self::connection::*;

use crate::common::*;

/// The async byte stream a session runs on, such as a TcpStream.
pub trait Io: Read + Write + Unpin + Sync + Send {}
impl<T> Io for T where T: Read + Write + Unpin + Sync + Send {}
