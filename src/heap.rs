// minirt/src/heap.rs

//! Next-fit free-list allocator over a fixed arena.
//!
//! Blocks are addressed by header-unit index inside the arena. Each block
//! starts with an 8-byte header (next link, size in units); the payload
//! follows. Free blocks form a circular list sorted by address that starts
//! and ends at a sentinel living outside the arena.
//!
//! Callers must only hand back pointers this heap returned and has not
//! freed since. Nothing checks that: a double free or a foreign pointer
//! corrupts the free list.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use log::{debug, warn};
use nonmax::NonMaxU32;

use crate::error::{Error, Result};

/// Size of a block header, and the allocation granule.
pub const HEADER_SIZE: u32 = 8;
pub const DEFAULT_MIN_GROW_UNITS: u32 = 1024;

const NEXT_FIELD: usize = 0;
const SIZE_FIELD: usize = 4;
// How the sentinel is spelled inside a header's next field.
const SENTINEL_LINK: u32 = u32::MAX;

/// Free-list link. `None` is the sentinel.
type Link = Option<NonMaxU32>;

/// A payload handed out by [`Heap`]. Wraps the header-unit index of its block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HeapPtr(NonMaxU32);

impl HeapPtr {
    /// Byte offset of the payload from the start of the arena. Never 0.
    pub fn offset(self) -> u32 {
        (self.0.get() + 1) * HEADER_SIZE
    }
}

/// The byte range the heap carves blocks from, plus its bump cursor.
pub struct HeapArena {
    start: u32,
    memory: Box<[u8]>,
    brk: u32,
}

impl HeapArena {
    pub fn new(size: u32) -> Self {
        Self {
            start: 0,
            memory: vec![0; size as usize].into_boxed_slice(),
            brk: 0,
        }
    }

    /// Arena covering the linker-provided range `[start, end)`.
    pub fn from_bounds(start: u32, end: u32) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidArenaBounds { start, end });
        }
        Ok(Self {
            start,
            ..Self::new(end - start)
        })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.start + self.len()
    }

    pub fn len(&self) -> u32 {
        self.memory.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Bytes between the bump cursor and the end of the arena.
    pub fn free_space(&self) -> u32 {
        self.len() - self.brk
    }

    pub fn address_of(&self, ptr: HeapPtr) -> u32 {
        self.start + ptr.offset()
    }

    // Returns the old cursor, or `None` if the arena end would be passed.
    fn sbrk(&mut self, increment: u32) -> Option<u32> {
        let previous = self.brk;
        let next = previous.checked_add(increment)?;
        if next > self.len() {
            return None;
        }
        self.brk = next;
        Some(previous)
    }

    fn read_u32(&self, at: usize) -> u32 {
        let mut word = [0; 4];
        word.copy_from_slice(&self.memory[at..at + 4]);
        u32::from_le_bytes(word)
    }

    fn write_u32(&mut self, at: usize, value: u32) {
        self.memory[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    /// Smallest extent, in header units, carved from the bump cursor at once.
    pub min_grow_units: u32,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            min_grow_units: DEFAULT_MIN_GROW_UNITS,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapReport {
    pub free_list_bytes: u32,
    pub free_blocks: u32,
    pub largest_free_block: u32,
    /// Bytes never claimed from the arena. Same as `free_space_remaining`.
    pub unclaimed_bytes: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FreeList {
    Uninitialized,
    // Where the next search starts.
    Active { rover: Link },
}

pub struct Heap {
    arena: HeapArena,
    config: HeapConfig,
    sentinel_next: Link,
    free_list: FreeList,
}

fn header_field(block: NonMaxU32, field: usize) -> usize {
    block.get() as usize * HEADER_SIZE as usize + field
}

// The sentinel sorts below every block.
fn position(link: Link) -> i64 {
    link.map_or(-1, |block| block.get() as i64)
}

impl Heap {
    pub fn new(arena: HeapArena) -> Self {
        Self::with_config(arena, HeapConfig::default())
    }

    pub fn with_config(arena: HeapArena, config: HeapConfig) -> Self {
        Self {
            arena,
            config,
            sentinel_next: None,
            free_list: FreeList::Uninitialized,
        }
    }

    pub fn arena(&self) -> &HeapArena {
        &self.arena
    }

    pub fn config(&self) -> HeapConfig {
        self.config
    }

    /// Whether the free list has been set up by a first allocate or free.
    pub fn is_active(&self) -> bool {
        matches!(self.free_list, FreeList::Active { .. })
    }

    pub fn allocate(&mut self, size: u32) -> Option<HeapPtr> {
        // Payload rounded up to whole units, plus the header.
        let units = size.div_ceil(HEADER_SIZE) + 1;
        debug!("Heap::allocate({}) = {} units", size, units);

        let mut previous = self.rover();
        let mut current = self.next(previous);
        loop {
            if let Some(block) = current {
                let block_size = self.block_size(block);
                if block_size >= units {
                    let taken = if block_size == units {
                        let next = self.next(current);
                        self.set_next(previous, next);
                        debug!("exact fit: unit {}", block.get());
                        block
                    } else {
                        // Hand out the tail so the head keeps its list slot.
                        let remaining = block_size - units;
                        self.set_block_size(block, remaining);
                        let tail = NonMaxU32::new(block.get() + remaining)?;
                        self.set_block_size(tail, units);
                        debug!(
                            "split unit {}: {} units stay free, tail at unit {}",
                            block.get(),
                            remaining,
                            tail.get()
                        );
                        tail
                    };
                    self.set_rover(previous);
                    return Some(HeapPtr(taken));
                }
            }

            // Full lap without a fit.
            if current == self.rover() {
                current = self.grow(units)?;
            }
            previous = current;
            current = self.next(current);
        }
    }

    pub fn free<P>(&mut self, ptr: P)
    where
        P: Into<Option<HeapPtr>>,
    {
        let Some(HeapPtr(block)) = ptr.into() else {
            return;
        };
        let here = block.get() as i64;

        // Find the free block just below `block`.
        let mut before = self.rover();
        loop {
            let after = self.next(before);
            let (low, high) = (position(before), position(after));
            if here > low && here < high {
                break;
            }
            // `before` is the highest block; `block` goes at either end.
            if low >= high && (here > low || here < high) {
                break;
            }
            before = after;
        }

        let block_size = self.block_size(block);
        let after = self.next(before);
        match after {
            Some(after) if block.get() + block_size == after.get() => {
                let after_next = self.next(Some(after));
                self.set_block_size(block, block_size + self.block_size(after));
                self.set_next(Some(block), after_next);
                debug!("merged unit {} into freed unit {}", after.get(), block.get());
            }
            _ => self.set_next(Some(block), after),
        }

        match before {
            Some(below) if below.get() + self.block_size(below) == block.get() => {
                let merged = self.block_size(below) + self.block_size(block);
                let block_next = self.next(Some(block));
                self.set_block_size(below, merged);
                self.set_next(before, block_next);
                debug!("merged freed unit {} into unit {}", block.get(), below.get());
            }
            _ => self.set_next(before, Some(block)),
        }

        self.set_rover(before);
    }

    /// Moves the payload to a fresh block; never resizes in place.
    ///
    /// The old block is released even when the new allocation fails, in
    /// which case `None` is returned and the old contents are gone.
    pub fn reallocate<P>(&mut self, ptr: P, new_size: u32) -> Option<HeapPtr>
    where
        P: Into<Option<HeapPtr>>,
    {
        let Some(old) = ptr.into() else {
            return self.allocate(new_size);
        };
        if new_size == 0 {
            self.free(old);
            return None;
        }

        let old_size = self.usable_size(old);
        let new = self.allocate(new_size);
        if let Some(new) = new {
            let count = new_size.min(old_size) as usize;
            let source = old.offset() as usize;
            self.arena
                .memory
                .copy_within(source..source + count, new.offset() as usize);
        } else {
            warn!("reallocate({}) failed; old block released", new_size);
        }
        self.free(old);
        new
    }

    /// Zero-filled allocation of `count * size` bytes.
    ///
    /// The product wraps on overflow, so a huge request can come back as a
    /// small block. Callers must bound their inputs.
    pub fn zero_allocate(&mut self, count: u32, size: u32) -> Option<HeapPtr> {
        let total = count.wrapping_mul(size);
        let ptr = self.allocate(total)?;
        let start = ptr.offset() as usize;
        self.arena.memory[start..start + total as usize].fill(0);
        Some(ptr)
    }

    /// Bytes behind the bump cursor. Space on the free list is not counted.
    pub fn free_space_remaining(&self) -> u32 {
        self.arena.free_space()
    }

    pub fn usable_size(&self, ptr: HeapPtr) -> u32 {
        (self.block_size(ptr.0) - 1) * HEADER_SIZE
    }

    pub fn bytes(&self, ptr: HeapPtr) -> &[u8] {
        let start = ptr.offset() as usize;
        &self.arena.memory[start..start + self.usable_size(ptr) as usize]
    }

    pub fn bytes_mut(&mut self, ptr: HeapPtr) -> &mut [u8] {
        let start = ptr.offset() as usize;
        let end = start + self.usable_size(ptr) as usize;
        &mut self.arena.memory[start..end]
    }

    pub fn address_of(&self, ptr: HeapPtr) -> u32 {
        self.arena.address_of(ptr)
    }

    pub fn storage_report(&self) -> HeapReport {
        let mut report = HeapReport {
            unclaimed_bytes: self.free_space_remaining(),
            ..HeapReport::default()
        };
        if !self.is_active() {
            return report;
        }

        let mut link = self.sentinel_next;
        while let Some(block) = link {
            let bytes = self.block_size(block) * HEADER_SIZE;
            report.free_list_bytes += bytes;
            report.free_blocks += 1;
            report.largest_free_block = report.largest_free_block.max(bytes);
            link = self.next(link);
        }
        report
    }

    // Carves at least `units` from the bump cursor and frees it into the
    // list. Returns the new rover.
    fn grow(&mut self, units: u32) -> Option<Link> {
        let units = units.max(self.config.min_grow_units);
        let Some(offset) = units
            .checked_mul(HEADER_SIZE)
            .and_then(|bytes| self.arena.sbrk(bytes))
        else {
            warn!(
                "heap exhausted: {} units requested, {} bytes left",
                units,
                self.arena.free_space()
            );
            return None;
        };

        let block = NonMaxU32::new(offset / HEADER_SIZE)?;
        debug!("grew heap by {} units at unit {}", units, block.get());
        self.set_block_size(block, units);
        self.free(HeapPtr(block));
        Some(self.rover())
    }

    // Also performs the Uninitialized -> Active transition.
    fn rover(&mut self) -> Link {
        match self.free_list {
            FreeList::Active { rover } => rover,
            FreeList::Uninitialized => {
                self.sentinel_next = None;
                self.free_list = FreeList::Active { rover: None };
                None
            }
        }
    }

    fn set_rover(&mut self, rover: Link) {
        self.free_list = FreeList::Active { rover };
    }

    fn next(&self, link: Link) -> Link {
        match link {
            None => self.sentinel_next,
            Some(block) => NonMaxU32::new(self.arena.read_u32(header_field(block, NEXT_FIELD))),
        }
    }

    fn set_next(&mut self, link: Link, next: Link) {
        match link {
            None => self.sentinel_next = next,
            Some(block) => self.arena.write_u32(
                header_field(block, NEXT_FIELD),
                next.map_or(SENTINEL_LINK, |next| next.get()),
            ),
        }
    }

    fn block_size(&self, block: NonMaxU32) -> u32 {
        self.arena.read_u32(header_field(block, SIZE_FIELD))
    }

    fn set_block_size(&mut self, block: NonMaxU32, units: u32) {
        self.arena.write_u32(header_field(block, SIZE_FIELD), units);
    }
}

impl Debug for Heap {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.storage_report().fmt(f)
    }
}
