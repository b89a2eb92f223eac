use std::ptr::NonNull;

use proptest::prelude::*;
use rheap::{BlockState, Heap, HeapError};

const CAPACITY: u32 = 256;

#[derive(Clone, Debug)]
enum Op {
  Allocate(u32),
  Release(usize),
  Coalesce,
}

fn arb_op() -> impl Strategy<Value = Op> {
  prop_oneof![
    4 => (0u32..120).prop_map(Op::Allocate),
    3 => any::<usize>().prop_map(Op::Release),
    1 => Just(Op::Coalesce),
  ]
}

struct Live {
  ptr: NonNull<u8>,
  bytes: u32,
  tag: u8,
}

fn assert_chain(heap: &Heap) -> Result<(), TestCaseError> {
  prop_assert!(heap.check().is_ok());

  let layout = heap.dump_layout();
  if layout.is_empty() {
    prop_assert!(!heap.is_initialized());
    return Ok(());
  }

  prop_assert_eq!(layout[0].offset, 0);

  let mut expected_offset = 0;
  for block in &layout {
    prop_assert!(block.size >= 1);
    prop_assert_eq!(block.offset, expected_offset);
    expected_offset += block.size;
  }
  prop_assert_eq!(expected_offset, heap.capacity_words());

  Ok(())
}

fn assert_contents(live: &[Live]) -> Result<(), TestCaseError> {
  for entry in live {
    for i in 0..entry.bytes as usize {
      let byte = unsafe { *entry.ptr.as_ptr().add(i) };
      prop_assert_eq!(byte, entry.tag);
    }
  }

  Ok(())
}

proptest! {
  #[test]
  fn chain_tiles_arena_under_random_ops(ops in prop::collection::vec(arb_op(), 1..80)) {
    let mut heap = Heap::with_capacity(CAPACITY).unwrap();
    let mut live: Vec<Live> = Vec::new();

    for (step, op) in ops.into_iter().enumerate() {
      match op {
        Op::Allocate(bytes) => match heap.allocate(bytes) {
          Ok(ptr) => {
            let tag = step as u8;
            unsafe { std::ptr::write_bytes(ptr.as_ptr(), tag, bytes as usize) };
            live.push(Live { ptr, bytes, tag });
          }
          Err(error) => {
            prop_assert!(matches!(error, HeapError::OutOfMemory { .. }), "expected OutOfMemory, got {:?}", error);
          }
        },
        Op::Release(index) => {
          if !live.is_empty() {
            let entry = live.swap_remove(index % live.len());
            prop_assert_eq!(heap.release(entry.ptr.as_ptr()), Ok(()));
          }
        }
        Op::Coalesce => {
          prop_assert!(heap.coalesce().is_ok());
        }
      }

      assert_chain(&heap)?;
      assert_contents(&live)?;

      let allocated = heap
        .dump_layout()
        .iter()
        .filter(|block| block.state == BlockState::Allocated)
        .count();
      prop_assert_eq!(allocated, live.len());
    }

    for entry in live.drain(..) {
      prop_assert_eq!(heap.release(entry.ptr.as_ptr()), Ok(()));
    }
    prop_assert!(heap.coalesce().is_ok());

    if heap.is_initialized() {
      let layout = heap.dump_layout();
      prop_assert_eq!(layout.len(), 1);
      prop_assert_eq!(layout[0].size, CAPACITY);
      prop_assert_eq!(layout[0].state, BlockState::Free);
    }
  }

  #[test]
  fn allocate_then_release_restores_free_bytes(
    setup in prop::collection::vec(0u32..64, 0..12),
    holes in prop::collection::vec(any::<bool>(), 12),
    bytes in 0u32..200,
  ) {
    let mut heap = Heap::with_capacity(CAPACITY).unwrap();
    let mut kept = Vec::new();

    for (i, size) in setup.into_iter().enumerate() {
      if let Ok(ptr) = heap.allocate(size) {
        kept.push((ptr, holes[i]));
      }
    }
    for (ptr, hole) in &kept {
      if *hole {
        prop_assert_eq!(heap.release(ptr.as_ptr()), Ok(()));
      }
    }

    let before = heap.stats().free_bytes();

    if let Ok(ptr) = heap.allocate(bytes) {
      prop_assert!(heap.stats().free_bytes() < before);
      prop_assert_eq!(heap.release(ptr.as_ptr()), Ok(()));
    }

    prop_assert_eq!(heap.stats().free_bytes(), before);
    assert_chain(&heap)?;
  }

  #[test]
  fn adjacent_blocks_merge_in_either_order(
    a_bytes in 0u32..64,
    b_bytes in 0u32..64,
    b_first in any::<bool>(),
  ) {
    let mut heap = Heap::with_capacity(CAPACITY).unwrap();

    let a = heap.allocate(a_bytes).unwrap();
    let b = heap.allocate(b_bytes).unwrap();
    let _fence = heap.allocate(4).unwrap();

    let layout = heap.dump_layout();
    let (a_block, b_block) = (layout[0], layout[1]);

    if b_first {
      heap.release(b.as_ptr()).unwrap();
      heap.release(a.as_ptr()).unwrap();
    } else {
      heap.release(a.as_ptr()).unwrap();
      heap.release(b.as_ptr()).unwrap();
      heap.coalesce().unwrap();
    }

    let merged = heap.dump_layout()[0];
    prop_assert_eq!(merged.offset, a_block.offset);
    prop_assert_eq!(merged.size, a_block.size + b_block.size);
    prop_assert_eq!(merged.state, BlockState::Free);
  }

  #[test]
  fn split_leaves_exact_remainder(words in 0u32..(CAPACITY - 3)) {
    let mut heap = Heap::with_capacity(CAPACITY).unwrap();
    heap.allocate(words * 4).unwrap();

    let layout = heap.dump_layout();
    prop_assert_eq!(layout[0].size, words + 1);
    prop_assert_eq!(layout[1].offset, words + 1);
    prop_assert_eq!(layout[1].size, CAPACITY - words - 1);
  }
}

#[test]
fn release_twice_reports_double_free() {
  let mut heap = Heap::with_capacity(64).unwrap();
  let ptr = heap.allocate(8).unwrap();

  assert_eq!(heap.release(ptr.as_ptr()), Ok(()));
  assert_eq!(heap.release(ptr.as_ptr()), Err(HeapError::DoubleFree { offset: 0 }));
  assert_eq!(heap.last_error(), Some(HeapError::DoubleFree { offset: 0 }));
}

#[test]
fn release_null_changes_nothing() {
  let mut heap = Heap::with_capacity(64).unwrap();

  assert_eq!(heap.release(std::ptr::null_mut()), Ok(()));
  assert!(!heap.is_initialized());
  assert_eq!(heap.last_error(), None);
}

#[test]
fn remainder_too_small_is_absorbed() {
  let mut heap = Heap::with_capacity(64).unwrap();

  // 62 data words + header leaves a single spare word, which stays inside.
  heap.allocate(62 * 4).unwrap();
  let layout = heap.dump_layout();

  assert_eq!(layout.len(), 1);
  assert_eq!(layout[0].size, 64);
}

#[test]
fn heaps_are_independent() {
  let mut first = Heap::with_capacity(64).unwrap();
  let mut second = Heap::with_capacity(64).unwrap();

  let ptr = first.allocate(8).unwrap();
  second.allocate(16).unwrap();

  assert!(matches!(second.release(ptr.as_ptr()), Err(HeapError::InvalidPointer { .. })));
  assert_eq!(first.dump_layout()[0].size, 3);
  assert_eq!(second.dump_layout()[0].size, 5);
}
