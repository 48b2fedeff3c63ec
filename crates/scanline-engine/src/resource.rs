//! Capability shared by GPU-owning wrappers.

/// A wrapper that exclusively owns GPU objects.
///
/// `free` releases everything the wrapper holds and must be safe to call any
/// number of times, including from `Drop` after an explicit `free`.
pub trait GpuResource {
    fn free(&mut self);

    /// Whether the wrapper currently holds live GPU objects.
    fn is_valid(&self) -> bool;
}
