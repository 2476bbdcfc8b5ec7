#![no_main]

use libfuzzer_sys::fuzz_target;
use pescope::{headers::DATA_DIRECTORY_KEYS, PeData};

fuzz_target!(|data: &[u8]| {
    let Ok(pe) = PeData::from_mem(data.to_vec()) else {
        return;
    };
    let loader = pe.loader();

    for number in 1..=pe.section_table().len() {
        let _ = loader.load_section_by_number(number);
    }
    for key in DATA_DIRECTORY_KEYS {
        let _ = loader.directory_window(key);
        let _ = loader.load_section_for(key);
    }
    let _ = loader.entry_point_section();
    let _ = loader.load_export_section();
    let _ = loader.load_import_section();
    let _ = loader.load_resource_section();
});
