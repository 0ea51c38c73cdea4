//! # Kernel Entry Point
//!
//! Boots just far enough to prove the heap allocator works: bring up the
//! `#[global_allocator]` from `kernel-alloc`, drive it through a short
//! allocate/grow/free sequence with `Vec`/`Box`, and halt. No bootloader
//! ABI, page tables, or framebuffer handling lives here anymore — this
//! binary exists to exercise `kernel-alloc` end to end, not to boot real
//! hardware.

#![no_std]
#![no_main]
#![allow(unsafe_code)]

extern crate alloc;
// Bring in the global allocator.
extern crate kernel_alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::hint::spin_loop;
use core::panic::PanicInfo;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    log::error!("panic: {info}");
    loop {
        spin_loop();
    }
}

/// Entry point.
#[unsafe(no_mangle)]
pub extern "C" fn _start() -> ! {
    run_smoke_test();
    loop {
        spin_loop();
    }
}

/// Drive the allocator through a representative allocate/grow/free
/// sequence so the binary does something observable even without a
/// logger backend wired up.
fn run_smoke_test() {
    let boxed = Box::new(42u64);
    log::info!("boxed value: {}", *boxed);
    drop(boxed);

    let mut v = Vec::new();
    for i in 0..256u32 {
        v.push(i);
    }
    log::info!("vec len: {}, sum: {}", v.len(), v.iter().sum::<u32>());
    drop(v);

    let stats = kernel_alloc::ALLOCATOR.stats();
    log::info!(
        "heap: {} bytes in use, {} bytes free, {} extensions",
        stats.bytes_in_use,
        stats.bytes_free,
        stats.extend_count
    );
}
