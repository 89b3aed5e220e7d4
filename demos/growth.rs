use ballocator::{GrowthAllocator, TrackedAllocator};
use libc::sbrk;

/// Prints the current program break using `sbrk(0)`.
/// The program break is the upper boundary of the heap managed via brk/sbrk.
unsafe fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).init();

  let mut growth = GrowthAllocator::new();

  unsafe {
    print_program_break("start");

    // --------------------------------------------------------------------
    // 1) Reserve 4 bytes. The request is rounded up to 8, so the break
    //    moves by a full alignment granule.
    // --------------------------------------------------------------------
    let first = growth.allocate(4).unwrap();
    println!("\n[1] allocate(4) -> {:?}", first);
    print_program_break("after allocate(4)");

    let first_ptr = first.as_ptr() as *mut u32;
    first_ptr.write(0xCAFE_F00D);
    println!("[1] value written through first = 0x{:X}", first_ptr.read());

    // --------------------------------------------------------------------
    // 2) Reserve 21 bytes, an "odd" size: the break moves by 24.
    // --------------------------------------------------------------------
    let second = growth.allocate(21).unwrap();
    println!("\n[2] allocate(21) -> {:?}", second);
    println!(
      "[2] address % 8 = {}, reserved so far = {} bytes",
      second.as_ptr() as usize % 8,
      growth.reserved(),
    );
    print_program_break("after allocate(21)");

    // --------------------------------------------------------------------
    // 3) Zero-size requests are refused without moving the break.
    // --------------------------------------------------------------------
    println!("\n[3] allocate(0) -> {:?}", growth.allocate(0));
    print_program_break("after allocate(0)");

    // --------------------------------------------------------------------
    // 4) The tracked variant stamps a header behind every region.
    // --------------------------------------------------------------------
    let mut tracked = TrackedAllocator::new();

    let region = tracked.allocate(24).unwrap();
    let header = TrackedAllocator::header_of(region);
    println!("\n[4] tracked allocate(24) -> {:?}", region);
    println!(
      "[4] header behind the pointer: total_size = {}, tag = 0x{:X}, valid = {}",
      header.total_size,
      header.tag,
      header.is_valid(),
    );

    // --------------------------------------------------------------------
    // 5) End of demo. Neither design reclaims anything; the OS takes the
    //    whole heap back when the process exits.
    // --------------------------------------------------------------------
    println!("\n[5] End of demo.");
  }
}
