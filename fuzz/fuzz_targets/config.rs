#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = bootswitch_core::boot::config::BootConfig::get_boot_config(data);
});
