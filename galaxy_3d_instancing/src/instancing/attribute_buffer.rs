/// Per-slot attribute storage (instance matrices, colors, custom data).
///
/// A flat `f32` array of `capacity * item_size` values, uploaded as-is to
/// the GPU. Slot order is owned by the `ActiveSet`: it is the only writer,
/// so swaps stay in lockstep across every attribute of a mesh.

#[derive(Debug, Clone)]
pub struct AttributeBuffer {
    name: String,
    item_size: usize,
    data: Vec<f32>,
}

impl AttributeBuffer {
    pub(crate) fn new(name: impl Into<String>, item_size: usize, capacity: usize) -> Self {
        Self {
            name: name.into(),
            item_size,
            data: vec![0.0; item_size * capacity],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of `f32` per slot
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        if self.item_size == 0 { 0 } else { self.data.len() / self.item_size }
    }

    /// Values stored at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    pub fn item(&self, slot: usize) -> &[f32] {
        &self.data[slot * self.item_size..(slot + 1) * self.item_size]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Raw bytes of the whole buffer, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Raw bytes of the first `active_count` slots (what a draw call reads).
    pub fn active_bytes(&self, active_count: usize) -> &[u8] {
        let end = (active_count * self.item_size).min(self.data.len());
        bytemuck::cast_slice(&self.data[..end])
    }

    pub(crate) fn set_item(&mut self, slot: usize, values: &[f32]) {
        let start = slot * self.item_size;
        self.data[start..start + self.item_size].copy_from_slice(values);
    }

    pub(crate) fn swap_items(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let size = self.item_size;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.data.split_at_mut(hi * size);
        head[lo * size..(lo + 1) * size].swap_with_slice(&mut tail[..size]);
    }
}
