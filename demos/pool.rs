use ballocator::{AllocError, HEADER_SIZE, PooledAllocator};

fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).init();

  let mut pool = PooledAllocator::new();
  println!(
    "pool geometry: {} bytes in {}-byte blocks",
    pool.capacity(),
    pool.block_size(),
  );

  // --------------------------------------------------------------------
  // 1) 100 payload bytes + 8 header bytes need two 64-byte blocks.
  // --------------------------------------------------------------------
  let first = pool.allocate(100).unwrap();
  println!("\n[1] allocate(100) -> {:?}", first);
  println!("[1] used blocks = {}, free blocks = {}", pool.used_blocks(), pool.free_blocks());

  unsafe { first.as_ptr().write_bytes(0xAB, 100) };

  // --------------------------------------------------------------------
  // 2) 62 free blocks hold 3968 bytes: a 4000-byte request must fail.
  // --------------------------------------------------------------------
  println!("\n[2] allocate(4000) -> {:?}", pool.allocate(4000));

  // --------------------------------------------------------------------
  // 3) Releasing the first region re-opens the left edge, and first-fit
  //    hands the same address out again.
  // --------------------------------------------------------------------
  pool.release(first.as_ptr()).unwrap();
  println!("\n[3] released {:?}, used blocks = {}", first, pool.used_blocks());

  let big = pool.allocate(4000).unwrap();
  println!(
    "[3] allocate(4000) -> {:?} (same address as before: {})",
    big,
    big == first,
  );

  pool.release(big.as_ptr()).unwrap();

  // --------------------------------------------------------------------
  // 4) A buggy caller that writes before its payload tramples the header;
  //    release reports the corruption and leaks the run instead of
  //    guessing at the occupancy.
  // --------------------------------------------------------------------
  let victim = pool.allocate(32).unwrap();
  unsafe { victim.as_ptr().sub(HEADER_SIZE).write_bytes(0x00, HEADER_SIZE) };

  let result = pool.release(victim.as_ptr());
  println!("\n[4] release after header overwrite -> {:?}", result);
  if let Err(error) = result {
    assert_eq!(error, AllocError::Corruption);
    println!("[4] reported: {error}");
  }
  println!("[4] leaked blocks stay used: used = {}", pool.used_blocks());

  println!("\n[5] End of demo.");
}
