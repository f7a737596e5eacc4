use slice_deque::SliceDeque;
use std::cmp::min;
use std::io;

type ByteDeque = SliceDeque<u8>;

// Buffer size set to be a multiple of the allocation granularity
const BUF_SIZE_INCREMENT: usize = 65536;

/// Read-side FIFO byte queue with a fixed reservation. Bytes are appended at
/// the tail as they arrive off the wire and consumed from the head once a
/// full message has been framed out of them.
pub struct Buffer {
    data: ByteDeque,
    size: usize,
}

impl Buffer {
    #[inline]
    pub fn new(size: usize) -> Buffer {
        if size % BUF_SIZE_INCREMENT != 0 {
            panic!(
                "Buffer size must be divisible by {}, got {}",
                BUF_SIZE_INCREMENT, size
            );
        }

        let mut data = ByteDeque::new();
        data.reserve(size);
        Buffer { data, size }
    }

    /// The number of bytes in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true in case the buffer is empty, false otherwise.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Advance the head, discarding consumed bytes.
    #[inline]
    pub fn move_head(&mut self, count: usize) {
        unsafe { self.data.move_head(count as isize) }
    }

    /// Slice containing data.
    #[inline]
    pub fn read_slice(&self) -> &[u8] {
        self.data.as_slice()
    }

    #[inline]
    pub fn clear(&mut self) {
        unsafe { self.data.move_head(self.len() as isize) };
    }

    /// Read at most `limit` bytes from the supplied reader into the buffer.
    /// Returns the number of bytes transferred; zero means the reader has
    /// reached the end of the stream.
    #[inline]
    pub fn ingress<R: io::Read>(&mut self, mut reader: R, limit: usize) -> io::Result<usize> {
        if self.data.len() >= self.size {
            return Err(io::Error::new(io::ErrorKind::Other, "Buffer overrun"));
        }

        unsafe {
            let free = self.data.tail_head_slice();
            let upper = min(limit, free.len());
            let read_count = reader.read(&mut free[..upper])?;

            self.data.move_tail(read_count as isize);

            Ok(read_count)
        }
    }
}
