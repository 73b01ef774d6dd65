//! A fixed-capacity ring buffer which overwrites its oldest element once
//! full.
//!
//! Storage is allocated once up front; pushing never allocates. Iteration is
//! always oldest to newest.

/// Fixed-capacity sequence of the most recent values.
#[derive(Clone, Debug)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    capacity: usize,
    head: usize,
    filled: bool,
}

impl<T: Copy> RingBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` values.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablet_filters::util::ring_buffer::RingBuffer;
    ///
    /// let mut buf = RingBuffer::new(3);
    /// for x in 1..=4 {
    ///     buf.push(x);
    /// }
    /// assert_eq!(buf.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    /// assert!(buf.is_filled());
    /// ```
    pub fn new(capacity: usize) -> RingBuffer<T> {
        RingBuffer {
            data: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            filled: false,
        }
    }

    /// Appends `value`, evicting the oldest value when the buffer is full.
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.data.len() < self.capacity {
            self.data.push(value);
        } else {
            self.data[self.head] = value;
        }
        self.head = (self.head + 1) % self.capacity;
        if self.head == 0 {
            self.filled = true;
        }
    }

    /// Empties the buffer. It has to be filled again before `is_filled`
    /// reports true.
    pub fn clear(&mut self) {
        self.data.clear();
        self.head = 0;
        self.filled = false;
    }

    /// Replaces the whole content with `capacity` copies of `value`.
    pub fn fill(&mut self, value: T) {
        self.clear();
        for _ in 0..self.capacity {
            self.push(value);
        }
    }

    /// True once `capacity` values were pushed since creation or the last
    /// `clear`. A zero-capacity buffer is never filled.
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates from the oldest to the newest value.
    pub fn iter(&self) -> impl Iterator<Item = &T> + Clone {
        let (newer, older) = self.data.split_at(self.oldest());
        older.iter().chain(newer.iter())
    }

    /// Mutable iteration from the oldest to the newest value.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        let oldest = self.oldest();
        let (newer, older) = self.data.split_at_mut(oldest);
        older.iter_mut().chain(newer.iter_mut())
    }

    fn oldest(&self) -> usize {
        if self.data.len() < self.capacity {
            0
        } else {
            self.head
        }
    }
}
