//! Fixed-capacity byte buffers with an explicit length.
//!
//! Every field of the client state lives in one of these. The capacity is part of
//! the type, the length never exceeds it, and the contents are wiped on drop.
//!
//! 带有显式长度的固定容量字节缓冲区。容量是类型的一部分，长度永远不会超过容量，
//! 内容在释放时被清零。

use crate::crypto::suite::BackendError;
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Returned when a byte string does not fit into a [`Bounded`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{len} bytes exceeds capacity of {max}")]
pub struct CapacityError {
    pub len: usize,
    pub max: usize,
}

/// A byte buffer holding at most `N` bytes.
#[derive(Clone)]
pub struct Bounded<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> Bounded<N> {
    pub const CAPACITY: usize = N;

    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self {
            bytes: [0u8; N],
            len: 0,
        }
    }

    /// Copies `src` into a new buffer, rejecting it if it is longer than `N`.
    pub fn try_from_slice(src: &[u8]) -> Result<Self, CapacityError> {
        if src.len() > N {
            return Err(CapacityError {
                len: src.len(),
                max: N,
            });
        }
        let mut buf = Self::new();
        buf.bytes[..src.len()].copy_from_slice(src);
        buf.len = src.len();
        Ok(buf)
    }

    /// Lets a backend operation write into a fresh buffer.
    ///
    /// `fill` receives the whole capacity and reports how many bytes it wrote.
    /// Nothing is returned unless `fill` succeeds with a length that fits.
    ///
    /// 让后端操作写入一个新的缓冲区。只有当 `fill` 成功并且长度合法时才会返回结果。
    pub fn filled_by<F>(fill: F) -> Result<Self, BackendError>
    where
        F: FnOnce(&mut [u8]) -> Result<usize, BackendError>,
    {
        let mut buf = Self::new();
        let len = fill(&mut buf.bytes)?;
        if len > N {
            return Err(BackendError);
        }
        buf.bytes[len..].zeroize();
        buf.len = len;
        Ok(buf)
    }

    /// Like [`filled_by`](Self::filled_by) for operations that produce two values
    /// at once, such as a key pair.
    pub fn filled_with_pair_by<const M: usize, F>(
        fill: F,
    ) -> Result<(Self, Bounded<M>), BackendError>
    where
        F: FnOnce(&mut [u8], &mut [u8]) -> Result<(usize, usize), BackendError>,
    {
        let mut first = Self::new();
        let mut second = Bounded::<M>::new();
        let (first_len, second_len) = fill(&mut first.bytes, &mut second.bytes)?;
        if first_len > N || second_len > M {
            return Err(BackendError);
        }
        first.bytes[first_len..].zeroize();
        first.len = first_len;
        second.bytes[second_len..].zeroize();
        second.len = second_len;
        Ok((first, second))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the contents, or `None` while nothing has been stored.
    pub fn non_empty(&self) -> Option<&[u8]> {
        (!self.is_empty()).then(|| self.as_slice())
    }
}

impl<const N: usize> Default for Bounded<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PartialEq for Bounded<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<const N: usize> Eq for Bounded<N> {}

impl<const N: usize> AsRef<[u8]> for Bounded<N> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

// Key material ends up in these buffers, so only the shape is printed.
impl<const N: usize> fmt::Debug for Bounded<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bounded")
            .field("len", &self.len)
            .field("capacity", &N)
            .finish()
    }
}

impl<const N: usize> Zeroize for Bounded<N> {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
        self.len = 0;
    }
}

impl<const N: usize> Drop for Bounded<N> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl<const N: usize> ZeroizeOnDrop for Bounded<N> {}
