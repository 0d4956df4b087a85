// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Wiping of GMP heap storage.
//!
//! Every secret in this crate (the private exponent, the sharing
//! polynomial's coefficients, each key share's `s_i`) is an
//! [`unknown_order::BigNumber`], and the gmp backend keeps the limbs of
//! those numbers in arrays on the C heap. GMP moves and reallocates limb
//! arrays behind Rust's back, so zeroizing the Rust values alone still
//! leaves stale copies inside malloc. GMP accepts custom allocation hooks
//! ([Custom Allocation](https://gmplib.org/manual/Custom-Allocation));
//! interposing on the two paths that release a buffer closes the gap.

use gmp_mpfr_sys::gmp;
use std::{ffi::c_void, ptr, sync::Once};
use zeroize::Zeroize;

static INSTALL: Once = Once::new();

// GMP's stock alloc and free, captured once before the wiping hooks
// replace them. The stock realloc is never needed: the wiping realloc
// below cannot delegate to it (a moved buffer would be left behind
// unwiped), so it is not captured.
static mut STOCK_ALLOC: gmp::allocate_function = None;
static mut STOCK_FREE: gmp::free_function = None;

/// Install allocation hooks that erase GMP buffers as they are released.
///
/// Call this once at startup, before any key material exists. The
/// installation is idempotent and thread safe; later calls are no-ops.
pub fn enable_wipe_on_free() {
    INSTALL.call_once(|| unsafe { install_hooks() });
}

unsafe fn install_hooks() {
    // SAFETY: C API documented at https://gmplib.org/manual/Custom-Allocation.
    // Passing NULL for the realloc slot means "do not report it".
    gmp::get_memory_functions(
        ptr::addr_of_mut!(STOCK_ALLOC),
        ptr::null_mut(),
        ptr::addr_of_mut!(STOCK_FREE),
    );
    assert!(
        STOCK_ALLOC.is_some() && STOCK_FREE.is_some(),
        "GMP did not report its allocation functions"
    );

    // Plain allocation stays stock; a fresh buffer holds no secrets yet.
    gmp::set_memory_functions(None, Some(wiping_realloc), Some(wiping_free));
}

/// Erase a GMP buffer before the allocator gets it back.
///
/// # Safety
/// `block` must be a live allocation of at least `size` bytes.
unsafe fn erase(block: *mut c_void, size: usize) {
    std::slice::from_raw_parts_mut(block.cast::<u8>(), size).zeroize();
}

extern "C" fn wiping_free(block: *mut c_void, size: usize) {
    // SAFETY: per the GMP manual, `block` is a live allocation of exactly
    // `size` bytes, and no hook can run before `install_hooks` has
    // captured the stock functions.
    unsafe {
        erase(block, size);
        match STOCK_FREE {
            Some(release) => release(block, size),
            None => unreachable!("hook ran before installation"),
        }
    }
}

extern "C" fn wiping_realloc(
    block: *mut c_void,
    old_size: usize,
    new_size: usize,
) -> *mut c_void {
    // The move is done by hand: allocate, copy, then erase and release
    // the original through the wiping free.
    //
    // SAFETY: same contract as `wiping_free`.
    unsafe {
        let fresh = match STOCK_ALLOC {
            Some(allocate) => allocate(new_size),
            None => unreachable!("hook ran before installation"),
        };
        ptr::copy_nonoverlapping(
            block.cast::<u8>(),
            fresh.cast::<u8>(),
            old_size.min(new_size),
        );
        wiping_free(block, old_size);
        fresh
    }
}
