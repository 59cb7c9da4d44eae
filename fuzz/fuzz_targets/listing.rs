#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(table) = bootswitch_core::table::BootTable::parse(data) {
        // anything that parsed must render back into an equal table
        let rendered = table.to_string();
        assert_eq!(
            bootswitch_core::table::BootTable::parse(&rendered).ok(),
            Some(table)
        );
    }
});
