use std::sync::{Mutex, OnceLock};

use lit_core::{Literal, Shape};
use log::debug;

use crate::error::FfiError;
use crate::types::LitHandle;

/// Object owned by the boundary on behalf of a foreign caller.
#[derive(Debug)]
pub enum Entry {
    Shape(Shape),
    Literal(Literal),
}

impl Entry {
    fn kind(&self) -> &'static str {
        match self {
            Entry::Shape(_) => "shape",
            Entry::Literal(_) => "literal",
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Maps handles to the shapes and literals they name.
///
/// A handle packs a slot index (low 32 bits, offset by one so 0 is never
/// issued) and the slot's generation (high 32 bits). Releasing an entry
/// bumps its slot's generation and queues the slot for reuse, so a stale
/// handle is reported as use-after-free while the table stays as large as
/// the peak number of live entries.
///
/// Every lookup is a checked downcast: the handle must be live and name an
/// entry of the requested kind.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

fn pack(index: u32, generation: u32) -> LitHandle {
    (u64::from(generation) << 32) | (u64::from(index) + 1)
}

fn unpack(handle: LitHandle) -> Option<(usize, u32)> {
    let low = (handle & u64::from(u32::MAX)) as usize;
    let index = low.checked_sub(1)?;
    Some((index, (handle >> 32) as u32))
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `entry` and return a fresh handle for it.
    pub fn insert(&mut self, entry: Entry) -> LitHandle {
        let kind = entry.kind();
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].entry = Some(entry);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                (self.slots.len() - 1) as u32
            }
        };
        let handle = pack(index, self.slots[index as usize].generation);
        debug!("issued {} handle {:#x}", kind, handle);
        handle
    }

    fn slot_mut(&mut self, handle: LitHandle) -> Result<&mut Slot, FfiError> {
        let (index, generation) = unpack(handle).ok_or(FfiError::InvalidHandle(handle))?;
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(FfiError::InvalidHandle(handle))?;
        if generation > slot.generation {
            return Err(FfiError::InvalidHandle(handle));
        }
        if generation < slot.generation || slot.entry.is_none() {
            return Err(FfiError::UseAfterFree(handle));
        }
        Ok(slot)
    }

    fn live(&self, handle: LitHandle) -> Result<&Entry, FfiError> {
        let (index, generation) = unpack(handle).ok_or(FfiError::InvalidHandle(handle))?;
        let slot = self.slots.get(index).ok_or(FfiError::InvalidHandle(handle))?;
        match &slot.entry {
            _ if generation > slot.generation => Err(FfiError::InvalidHandle(handle)),
            Some(entry) if generation == slot.generation => Ok(entry),
            _ => Err(FfiError::UseAfterFree(handle)),
        }
    }

    pub fn shape(&self, handle: LitHandle) -> Result<&Shape, FfiError> {
        match self.live(handle)? {
            Entry::Shape(shape) => Ok(shape),
            other => Err(wrong_kind(handle, "shape", other)),
        }
    }

    pub fn literal(&self, handle: LitHandle) -> Result<&Literal, FfiError> {
        match self.live(handle)? {
            Entry::Literal(literal) => Ok(literal),
            other => Err(wrong_kind(handle, "literal", other)),
        }
    }

    pub fn literal_mut(&mut self, handle: LitHandle) -> Result<&mut Literal, FfiError> {
        match self.slot_mut(handle)?.entry.as_mut() {
            Some(Entry::Literal(literal)) => Ok(literal),
            Some(other) => Err(wrong_kind(handle, "literal", other)),
            None => Err(FfiError::UseAfterFree(handle)),
        }
    }

    /// Empty the slot named by `handle` and queue it for reuse.
    ///
    /// The caller has already checked that the handle is live. A slot whose
    /// generation is exhausted is retired instead of reused.
    fn release(&mut self, handle: LitHandle) -> Result<Entry, FfiError> {
        let slot = self.slot_mut(handle)?;
        let entry = slot.entry.take().ok_or(FfiError::UseAfterFree(handle))?;
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            if let Some((index, _)) = unpack(handle) {
                self.free.push(index as u32);
            }
        } else {
            debug!("retired slot of handle {:#x}", handle);
        }
        debug!("released {} handle {:#x}", entry.kind(), handle);
        Ok(entry)
    }

    /// Remove the shape named by `handle`.
    pub fn release_shape(&mut self, handle: LitHandle) -> Result<Shape, FfiError> {
        self.shape(handle)?;
        match self.release(handle)? {
            Entry::Shape(shape) => Ok(shape),
            other => Err(wrong_kind(handle, "shape", &other)),
        }
    }

    /// Remove the literal named by `handle`.
    pub fn release_literal(&mut self, handle: LitHandle) -> Result<Literal, FfiError> {
        self.literal(handle)?;
        match self.release(handle)? {
            Entry::Literal(literal) => Ok(literal),
            other => Err(wrong_kind(handle, "literal", &other)),
        }
    }
}

fn wrong_kind(handle: LitHandle, expected: &'static str, found: &Entry) -> FfiError {
    FfiError::WrongKind {
        handle,
        expected,
        found: found.kind(),
    }
}

/// Run `f` against the process-wide registry while holding its lock.
///
/// Holding the lock for the whole call keeps a literal from being released
/// while another thread is reading or writing it.
pub fn with_registry<R>(
    f: impl FnOnce(&mut HandleRegistry) -> Result<R, FfiError>,
) -> Result<R, FfiError> {
    static REGISTRY: OnceLock<Mutex<HandleRegistry>> = OnceLock::new();
    let mut registry = REGISTRY
        .get_or_init(|| Mutex::new(HandleRegistry::new()))
        .lock()
        .map_err(|_| FfiError::Poisoned)?;
    f(&mut registry)
}
