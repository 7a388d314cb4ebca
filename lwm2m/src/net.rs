use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Data that came from, or is going to, a network socket, tagged with the
/// peer's address.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct Addrd<T>(pub T, pub SocketAddr);

impl<T> Addrd<T> {
  /// Borrow the contents of this `Addrd`.
  pub fn as_ref(&self) -> Addrd<&T> {
    Addrd(self.data(), self.addr())
  }

  /// Discard the address and get the data.
  pub fn unwrap(self) -> T {
    self.0
  }

  /// Map the data, keeping the address.
  pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Addrd<R> {
    Addrd(f(self.0), self.1)
  }

  /// Borrow the contents.
  pub fn data(&self) -> &T {
    &self.0
  }

  /// Mutably borrow the contents.
  pub fn data_mut(&mut self) -> &mut T {
    &mut self.0
  }

  /// Copy the peer address.
  pub fn addr(&self) -> SocketAddr {
    self.1
  }
}

/// A two-phase non-blocking CoAP transport: callers initiate `send`/`recv`
/// and poll until the operation completes, matching the `nb` crate's
/// `WouldBlock` convention rather than blocking the caller's thread.
///
/// This mirrors the `embedded-nal` Udp traits used across the example pack,
/// generalized so `std::net::UdpSocket` and test doubles both implement it.
pub trait Socket: Sized {
  /// The error yielded by socket operations.
  type Error: core::fmt::Debug;

  /// The local address this socket is bound to.
  fn local_addr(&self) -> SocketAddr;

  /// Bind to a local address in non-blocking mode.
  fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, Self::Error>;

  /// Send a datagram to a remote address.
  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error>;

  /// Pull a buffered datagram from the socket, along with the sender's
  /// address. Like `std::net::UdpSocket`, bytes beyond the buffer's length
  /// are dropped rather than treated as an error.
  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error>;

  /// Poll the socket for a single datagram without blocking, returning
  /// `Ok(None)` rather than an error when nothing has arrived yet.
  fn poll(&self, buffer: &mut [u8]) -> Result<Option<Addrd<usize>>, Self::Error> {
    match self.recv(buffer) {
      | Ok(addrd) => Ok(Some(addrd)),
      | Err(nb::Error::WouldBlock) => Ok(None),
      | Err(nb::Error::Other(e)) => Err(e),
    }
  }
}

impl Socket for UdpSocket {
  type Error = std::io::Error;

  fn local_addr(&self) -> SocketAddr {
    UdpSocket::local_addr(self).expect("bound socket has a local address")
  }

  fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, Self::Error> {
    let sock = UdpSocket::bind(addr)?;
    sock.set_nonblocking(true)?;
    Ok(sock)
  }

  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error> {
    let Addrd(bytes, addr) = msg;
    self.send_to(bytes, addr).map(|_| ()).map_err(to_nb)
  }

  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error> {
    self.recv_from(buffer).map(|(n, addr)| Addrd(n, addr)).map_err(to_nb)
  }
}

fn to_nb(e: std::io::Error) -> nb::Error<std::io::Error> {
  if e.kind() == std::io::ErrorKind::WouldBlock {
    nb::Error::WouldBlock
  } else {
    nb::Error::Other(e)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn loopback_round_trip() {
    let a = UdpSocket::bind("127.0.0.1:0").unwrap();
    let b = UdpSocket::bind("127.0.0.1:0").unwrap();

    let addr_b = Socket::local_addr(&b);
    Socket::send(&a, Addrd(b"hello", addr_b)).unwrap();

    let mut buf = [0u8; 16];
    let mut received = None;
    for _ in 0..1000 {
      if let Some(addrd) = Socket::poll(&b, &mut buf).unwrap() {
        received = Some(addrd);
        break;
      }
    }

    let Addrd(n, _) = received.expect("datagram should eventually arrive");
    assert_eq!(&buf[..n], b"hello");
  }
}
