use rheap::{Heap, HeapConfig, LogObserver};

/// Prints a labelled snapshot of the block chain.
fn print_layout(
  label: &str,
  heap: &Heap,
) {
  println!("\n[{}]", label);
  print!("{}", heap);

  let stats = heap.stats();
  println!(
    "  {} blocks, {} free words, largest free block {} words",
    stats.blocks, stats.free_words, stats.largest_free
  );
}

fn main() {
  // RUST_LOG=rheap=trace shows every header the locator visits.
  env_logger::init();

  let config = HeapConfig::new(64);
  println!("arena: {} words, {} bytes", config.capacity_words, config.capacity_bytes());

  let mut heap = match Heap::new(config) {
    Ok(heap) => heap.with_observer(LogObserver),
    Err(error) => {
      eprintln!("could not create heap: {}", error);
      std::process::exit(1);
    }
  };

  print_layout("start (arena untouched)", &heap);

  // --------------------------------------------------------------------
  // 1) 8 bytes = 2 data words, so the block spans 3 words with its header.
  // --------------------------------------------------------------------
  let Ok(first) = heap.allocate(8) else {
    eprintln!("allocate(8) failed: {:?}", heap.last_error());
    return;
  };
  println!("\n[1] allocate(8) -> {:?} (header at {:?})", first, first.as_ptr().wrapping_sub(4));
  unsafe { (first.as_ptr() as *mut u32).write(0xDEADBEEF) };
  print_layout("1", &heap);

  // --------------------------------------------------------------------
  // 2) 16 bytes = 4 data words, carved from the free remainder.
  // --------------------------------------------------------------------
  let Ok(second) = heap.allocate(16) else {
    eprintln!("allocate(16) failed: {:?}", heap.last_error());
    return;
  };
  println!("\n[2] allocate(16) -> {:?}", second);
  print_layout("2", &heap);

  // --------------------------------------------------------------------
  // 3) Free the first block. Its neighbour is in use, so nothing merges.
  // --------------------------------------------------------------------
  if let Err(error) = heap.release(first.as_ptr()) {
    eprintln!("release failed: {}", error);
  }
  print_layout("3 release first", &heap);

  // --------------------------------------------------------------------
  // 4) Freeing it again is reported, not fatal.
  // --------------------------------------------------------------------
  if let Err(error) = heap.release(first.as_ptr()) {
    println!("\n[4] second release rejected: {}", error);
  }

  // --------------------------------------------------------------------
  // 5) Free the second block. It merges forward with the tail but not back
  //    into the first block.
  // --------------------------------------------------------------------
  if let Err(error) = heap.release(second.as_ptr()) {
    eprintln!("release failed: {}", error);
  }
  print_layout("5 release second", &heap);

  // --------------------------------------------------------------------
  // 6) A full sweep joins what release left apart.
  // --------------------------------------------------------------------
  match heap.coalesce() {
    Ok(merges) => println!("\n[6] coalesce merged {} blocks", merges),
    Err(error) => eprintln!("coalesce failed: {}", error),
  }
  print_layout("6", &heap);

  // --------------------------------------------------------------------
  // 7) Ask for more than the arena holds.
  // --------------------------------------------------------------------
  if let Err(error) = heap.allocate(64 * 4) {
    println!("\n[7] allocate(256) rejected: {}", error);
  }
}
