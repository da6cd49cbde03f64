//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `knitcount_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("knitcount_core ping={}", knitcount_core::ping());
    println!("knitcount_core version={}", knitcount_core::core_version());
    println!(
        "knitcount_core data_version={}",
        knitcount_core::latest_data_version()
    );
}
