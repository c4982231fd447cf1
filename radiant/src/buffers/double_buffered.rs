use crate::{Bindable, DoubleBufferedBindable, UnmappedStorageBuffer};

/// Pair of resources where one is being read while the other is being
/// written, swapped after each write.
///
/// Which one is which is decided by a single index - there's no other state,
/// so a reader and a writer can never end up looking at the same item.
#[derive(Clone, Debug)]
pub struct DoubleBuffered<T> {
    items: [T; 2],
    read: usize,
}

impl<T> DoubleBuffered<T> {
    pub fn new(a: T, b: T) -> Self {
        Self {
            items: [a, b],
            read: 0,
        }
    }

    /// Index of the item that's currently being read from.
    pub fn read_index(&self) -> usize {
        self.read
    }

    pub fn write_index(&self) -> usize {
        1 - self.read
    }

    pub fn read(&self) -> &T {
        &self.items[self.read]
    }

    pub fn write(&self) -> &T {
        &self.items[self.write_index()]
    }

    /// Returns the item being read together with the item being written.
    pub fn split_mut(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.items;

        if self.read == 0 {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn items(&self) -> &[T; 2] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [T; 2] {
        &mut self.items
    }

    /// Makes the item that's just been written the one to read from.
    pub fn swap(&mut self) {
        self.read = self.write_index();
    }

    pub fn reset(&mut self) {
        self.read = 0;
    }
}

impl DoubleBuffered<UnmappedStorageBuffer> {
    /// Creates a double-buffered storage buffer.
    ///
    /// See: [`UnmappedStorageBuffer::new()`].
    pub fn new_storage(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: usize,
    ) -> Self {
        let label = label.as_ref();

        Self::new(
            UnmappedStorageBuffer::new(device, format!("{label}_a"), size),
            UnmappedStorageBuffer::new(device, format!("{label}_b"), size),
        )
    }

    /// Binds the item being read; bind group variant `n` sees item `n`.
    pub fn bind_readable(&self) -> impl DoubleBufferedBindable + '_ {
        DoubleBufferedBinder {
            a: self.items[0].bind_readable(),
            b: self.items[1].bind_readable(),
        }
    }

    /// Binds the item being written; bind group variant `n` sees item
    /// `1 - n`.
    pub fn bind_writable(&self) -> impl DoubleBufferedBindable + '_ {
        DoubleBufferedBinder {
            a: self.items[1].bind_writable(),
            b: self.items[0].bind_writable(),
        }
    }
}

pub struct DoubleBufferedBinder<T> {
    a: T,
    b: T,
}

impl<T> DoubleBufferedBindable for DoubleBufferedBinder<T>
where
    T: Bindable,
{
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])> {
        let entries_a = self.a.bind(binding);
        let entries_b = self.b.bind(binding);

        assert_eq!(entries_a.len(), entries_b.len());

        entries_a
            .into_iter()
            .zip(entries_b)
            .map(|((layout_a, resource_a), (layout_b, resource_b))| {
                assert_eq!(layout_a, layout_b);

                (layout_a, [resource_a, resource_b])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong() {
        let mut target = DoubleBuffered::new("a", "b");

        for i in 0..6 {
            if i % 2 == 0 {
                assert_eq!(("a", "b"), (*target.read(), *target.write()));
            } else {
                assert_eq!(("b", "a"), (*target.read(), *target.write()));
            }

            assert_ne!(target.read_index(), target.write_index());

            target.swap();
        }

        target.swap();
        target.reset();

        assert_eq!(0, target.read_index());
        assert_eq!("a", *target.read());
    }

    #[test]
    fn split_mut() {
        let mut target = DoubleBuffered::new(1, 2);

        let (read, write) = target.split_mut();

        *write = *read + 10;
        target.swap();

        assert_eq!(11, *target.read());

        let (read, write) = target.split_mut();

        *write = *read + 100;
        target.swap();

        assert_eq!(111, *target.read());
        assert_eq!(&[111, 11], target.items());
    }
}
