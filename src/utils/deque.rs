use alloc::boxed::Box;

/// Smallest capacity allocated once the deque starts growing
const MIN_CAPACITY: usize = 4;

/// A growable double-ended queue backed by a circular buffer
///
/// Unlike a count-based rolling window, a time window has no upper bound on the
/// number of elements it holds, so a full deque doubles its capacity instead of
/// overwriting the front element. Once fewer than a quarter of the slots are in
/// use after a pop, the capacity is halved, so a burst does not pin its peak
/// allocation. Capacity is kept across `reset` so that a warmed-up window does
/// not reallocate.
#[derive(Debug, Clone)]
pub struct Deque<T> {
    /// The buffer allocated on the heap
    buf: Box<[T]>,
    /// The index of the front element in the buffer
    front: usize,
    /// The current number of elements stored in the deque
    len: usize,
}

impl<T> Deque<T>
where
    T: Default + Clone,
{
    /// Creates a new `Deque` instance with the specified initial capacity.
    ///
    /// # Arguments
    ///
    /// * `cap` - The initial capacity of the deque, may be zero
    ///
    /// # Returns
    ///
    /// * `Self` - The `Deque` instance
    #[inline]
    pub fn new(cap: usize) -> Self {
        Self {
            buf: vec![T::default(); cap].into_boxed_slice(),
            front: 0,
            len: 0,
        }
    }

    /// Returns true if the deque is empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current number of elements stored in the deque
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of elements the deque can hold before growing
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Physical index of the `i`-th element from the front
    #[inline]
    fn physical(&self, i: usize) -> usize {
        (self.front + i) % self.buf.len()
    }

    /// Reallocates the buffer with `new_cap` slots, unrolling the
    /// elements so that the front lands at index zero
    fn relocate(&mut self, new_cap: usize) {
        let mut buf = vec![T::default(); new_cap].into_boxed_slice();
        for (i, slot) in buf.iter_mut().take(self.len).enumerate() {
            let idx = self.physical(i);
            *slot = core::mem::take(&mut self.buf[idx]);
        }
        self.buf = buf;
        self.front = 0;
    }

    /// Halves the capacity while at most a quarter of it is in use
    #[inline]
    fn shrink_if_sparse(&mut self) {
        let cap = self.capacity();
        if cap > MIN_CAPACITY && self.len < cap / 4 {
            self.relocate((cap / 2).max(MIN_CAPACITY));
        }
    }

    /// Clears the deque, keeping the allocated capacity
    #[inline]
    pub fn reset(&mut self) -> &mut Self {
        self.buf.fill(T::default());
        self.front = 0;
        self.len = 0;
        self
    }

    /// Pushes a new element to the back of the deque, growing it if full
    ///
    /// # Arguments
    ///
    /// * `value` - The value to push to the back of the deque
    #[inline]
    pub fn push_back(&mut self, value: T) {
        if self.len == self.capacity() {
            self.relocate((self.capacity() * 2).max(MIN_CAPACITY));
        }
        let idx = self.physical(self.len);
        self.buf[idx] = value;
        self.len += 1;
    }

    /// Pops the element from the back of the deque
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The element at the back of the deque, if it exists
    #[inline]
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.len -= 1;
        let idx = self.physical(self.len);
        let value = core::mem::take(&mut self.buf[idx]);
        self.shrink_if_sparse();
        Some(value)
    }

    /// Pops the element from the front of the deque
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The element at the front of the deque, if it exists
    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = core::mem::take(&mut self.buf[self.front]);
        self.front = (self.front + 1) % self.capacity();
        self.len -= 1;
        self.shrink_if_sparse();
        Some(value)
    }

    /// Returns a reference to the front element of the deque
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the back element of the deque
    #[inline]
    pub fn back(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            self.get(self.len - 1)
        }
    }

    /// Returns a reference to the element at the specified index from the front of the queue
    ///
    /// # Arguments
    ///
    /// * `i` - The index of the element to retrieve
    ///
    /// # Returns
    ///
    /// * `Option<&T>` - A reference to the element at the specified index, if it exists
    #[inline]
    pub fn get(&self, i: usize) -> Option<&T> {
        if i >= self.len {
            None
        } else {
            Some(&self.buf[self.physical(i)])
        }
    }

    /// Returns an iterator over the elements from front to back
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).map(move |i| &self.buf[self.physical(i)])
    }
}
