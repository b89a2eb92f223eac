//! # rheap - A Fixed-Arena First-Fit Heap
//!
//! This crate provides a small **first-fit heap allocator** with
//! malloc/free-style semantics over a single arena reserved once, up front,
//! with `mmap(2)`.
//!
//! ## Overview
//!
//! The arena is a run of 4-byte words. It is carved into blocks, each
//! starting with a one-word header, and the headers tile the arena with no
//! gaps:
//!
//! ```text
//!   Arena of C words:
//!
//!   ┌───┬──────────┬───┬────────────────┬───┬──────────────────────────┐
//!   │ H │  data    │ H │     data       │ H │          data            │
//!   └───┴──────────┴───┴────────────────┴───┴──────────────────────────┘
//!   0   1          k   k+1              m   m+1                        C
//!   └── allocated ─┘   └──── free ──────┘   └─────── allocated ────────┘
//!
//!   size(block at 0) + size(block at k) + size(block at m) == C
//! ```
//!
//! Each header packs the block size (in words, header included) and an
//! allocated flag into a single `u32`:
//!
//! ```text
//!   ┌───────────────────────┬──────────────────────────────┐
//!   │   Header (1 word)     │        Data (size - 1 words)  │
//!   │  ┌─────────────────┐  │                               │
//!   │  │ size: 30 bits   │  │                               │
//!   │  │ allocated: 1    │  │                               │
//!   │  │ reserved:  1    │  │                               │
//!   │  └─────────────────┘  │                               │
//!   └───────────────────────┴───────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rheap
//!   ├── align      - Byte to word rounding
//!   ├── arena      - mmap-backed word buffer (internal)
//!   ├── block      - Header codec and layout records
//!   ├── config     - HeapConfig
//!   ├── error      - HeapError
//!   ├── heap       - Heap: locator, allocate, release, coalesce
//!   └── observer   - HeapObserver hooks and LogObserver
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rheap::Heap;
//!
//! let mut heap = Heap::with_capacity(64).unwrap();
//!
//! let a = heap.allocate(8).unwrap();   // 2 data words + header
//! let b = heap.allocate(16).unwrap();  // 4 data words + header
//!
//! heap.release(b.as_ptr()).unwrap();
//! heap.release(a.as_ptr()).unwrap();
//!
//! let layout = heap.dump_layout();
//! assert_eq!(layout.len(), 1);
//! assert_eq!(layout[0].size, 64);
//! ```
//!
//! ## How It Works
//!
//! - **Allocation** rounds the request up to whole words, then walks the
//!   header chain from the start of the arena and takes the first free block
//!   with room for the data plus its header. If at least two words would be
//!   left over, the tail is split off as a new free block.
//! - **Release** checks that the pointer names an allocated block, marks it
//!   free, and merges it with the block right after it if that one is free.
//!   It never merges backwards; [`Heap::coalesce`] sweeps the whole chain
//!   when that matters.
//!
//! The chain is written lazily: a fresh arena is all zeroes, and the first
//! allocation formats it as one free block spanning the whole capacity.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `Heap` is neither `Send` nor `Sync`
//! - **Word alignment only**: pointers are 4-byte aligned
//! - **Fixed capacity**: the arena never grows
//! - **Linear search**: allocation cost grows with the number of blocks
//! - **Unix-only**: requires `libc` and `mmap`
//!
//! ## Logging
//!
//! Attach a [`LogObserver`] to route the heap's internal events through the
//! [`log`] facade.

pub mod align;
mod arena;
mod block;
mod config;
mod error;
mod heap;
pub mod observer;

pub use block::{BlockInfo, BlockState, Header, MAX_BLOCK_WORDS, WORD_SIZE};
pub use config::HeapConfig;
pub use error::HeapError;
pub use heap::{Heap, HeapStats};
pub use observer::{HeapObserver, LogObserver, NoopObserver};
