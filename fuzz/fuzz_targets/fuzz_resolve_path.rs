#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Use the first byte to determine the split point between path and JSON model.
    let split = data[0] as usize % data.len().max(1);
    let (path_bytes, model_bytes) = data.split_at(split.min(data.len()));

    let path = String::from_utf8_lossy(path_bytes);

    if let Ok(model) = serde_json::from_slice::<serde_json::Value>(model_bytes) {
        // Resolution must never panic or mutate, whatever the path looks like.
        let before = model.clone();
        let _ = fieldwise::path::resolve(&model, &path);
        assert_eq!(model, before);
    }
});
